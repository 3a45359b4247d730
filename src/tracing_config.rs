//! Tracing setup for the `patchref` binary.
//!
//! `PATCHREF_LOG` (or `RUST_LOG`) holds the filter directives and
//! `PATCHREF_LOG_FORMAT` picks `text`, `tree` or `json`. Nothing is installed
//! when no filter is set. Output goes to stderr; stdout carries diagnostics.

use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, Registry, fmt};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Text,
    /// Indented span tree, for following one call site through the backends.
    Tree,
    Json,
}

impl LogFormat {
    /// Unknown names fall back to `Text`.
    pub fn parse(value: &str) -> Self {
        match value.trim().to_lowercase().as_str() {
            "tree" => Self::Tree,
            "json" => Self::Json,
            _ => Self::Text,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TracingConfig {
    pub directives: Option<String>,
    pub format: LogFormat,
}

impl TracingConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        TracingConfig {
            directives: lookup("PATCHREF_LOG").or_else(|| lookup("RUST_LOG")),
            format: lookup("PATCHREF_LOG_FORMAT")
                .map(|value| LogFormat::parse(&value))
                .unwrap_or_default(),
        }
    }

    /// Installs the global subscriber; a no-op without filter directives.
    pub fn init(self) {
        let Some(directives) = self.directives else {
            return;
        };
        let filter = EnvFilter::builder().parse_lossy(directives);
        let registry = Registry::default().with(filter);
        match self.format {
            LogFormat::Tree => registry
                .with(tracing_tree::HierarchicalLayer::new(2).with_targets(true))
                .init(),
            LogFormat::Json => registry
                .with(fmt::layer().json().with_writer(std::io::stderr))
                .init(),
            LogFormat::Text => registry
                .with(fmt::layer().with_writer(std::io::stderr))
                .init(),
        }
    }
}

pub fn init_tracing() {
    TracingConfig::from_env().init();
}

#[cfg(test)]
#[path = "tests/tracing_config_tests.rs"]
mod tests;
