//! The JSON analysis manifest.
//!
//! A manifest carries everything one pass needs: referenced assemblies,
//! the symbols the host compiler bound, the call sites and coalesce chains
//! to check, and option overrides. Relative paths are resolved against the
//! manifest's directory.
//!
//! ```json
//! {
//!   "references": { "GameLib": "lib/GameLib.dll" },
//!   "probeDirectories": ["managed"],
//!   "options": { "cacheImages": "true", "maxBaseDepth": 32 },
//!   "symbols": [{ "assembly": "Mod", "name": "Mod.Plugin", "fields": [] }],
//!   "sites": [],
//!   "chains": []
//! }
//! ```

use anyhow::{Context, Result};
use patchref_checker::{CallSite, Compilation, EngineOptions, FallbackExpr};
use patchref_metadata::AssemblyLocator;
use patchref_symbols::{SymbolTable, TypeDeclaration};
use serde::{Deserialize, Deserializer};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Accepts both `true` and `"true"` (also `1/0`, `yes/no`, `on/off`).
fn deserialize_bool_or_string<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum BoolOrString {
        Bool(bool),
        String(String),
    }

    match Option::<BoolOrString>::deserialize(deserializer)? {
        None => Ok(None),
        Some(BoolOrString::Bool(b)) => Ok(Some(b)),
        Some(BoolOrString::String(s)) => match s.trim().to_lowercase().as_str() {
            "true" | "1" | "yes" | "on" => Ok(Some(true)),
            "false" | "0" | "no" | "off" => Ok(Some(false)),
            _ => Err(Error::custom(format!(
                "invalid boolean value: '{}'. Expected true, false, 'true', or 'false'",
                s
            ))),
        },
    }
}

/// Option overrides; unset fields keep the engine defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManifestOptions {
    #[serde(default, deserialize_with = "deserialize_bool_or_string")]
    pub cache_images: Option<bool>,
    #[serde(default)]
    pub max_base_depth: Option<u32>,
}

impl ManifestOptions {
    pub fn apply(&self, mut options: EngineOptions) -> EngineOptions {
        if let Some(cache_images) = self.cache_images {
            options.cache_images = cache_images;
        }
        if let Some(depth) = self.max_base_depth {
            options.max_base_depth = depth;
        }
        options
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Manifest {
    /// Assembly name to image path.
    #[serde(default)]
    pub references: BTreeMap<String, PathBuf>,
    #[serde(default)]
    pub probe_directories: Vec<PathBuf>,
    #[serde(default)]
    pub options: ManifestOptions,
    #[serde(default)]
    pub symbols: Vec<TypeDeclaration>,
    #[serde(default)]
    pub sites: Vec<CallSite>,
    #[serde(default)]
    pub chains: Vec<FallbackExpr>,
}

impl Manifest {
    pub fn parse(text: &str) -> Result<Self> {
        serde_json::from_str(text).context("failed to parse analysis manifest")
    }

    /// Reads a manifest and resolves its relative paths against the
    /// manifest's directory.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read manifest {}", path.display()))?;
        let mut manifest = Self::parse(&text)
            .with_context(|| format!("invalid manifest {}", path.display()))?;
        if let Some(base) = path.parent() {
            manifest.resolve_paths(base);
        }
        debug!(
            path = %path.display(),
            references = manifest.references.len(),
            symbols = manifest.symbols.len(),
            sites = manifest.sites.len(),
            chains = manifest.chains.len(),
            "manifest loaded"
        );
        Ok(manifest)
    }

    pub fn resolve_paths(&mut self, base: &Path) {
        for path in self.references.values_mut() {
            if path.is_relative() {
                *path = base.join(&*path);
            }
        }
        for dir in &mut self.probe_directories {
            if dir.is_relative() {
                *dir = base.join(&*dir);
            }
        }
    }

    /// Engine options: defaults, then the manifest's probe directories and
    /// overrides.
    pub fn engine_options(&self) -> EngineOptions {
        let mut options = self.options.apply(EngineOptions::default());
        options.probe_directories = self.probe_directories.clone();
        options
    }

    /// Builds the locator and links the symbol table.
    pub fn compilation(&self, options: &EngineOptions) -> Result<Compilation> {
        let mut locator = AssemblyLocator::new();
        for (name, path) in &self.references {
            if !path.is_file() {
                warn!(assembly = %name, path = %path.display(), "referenced assembly file does not exist");
            }
            locator.add_reference(name, path.clone());
        }
        let probed = options.apply_probe_directories(&mut locator);
        debug!(probed, assemblies = locator.len(), "assembly locator ready");

        let symbols = SymbolTable::from_declarations(&self.symbols)
            .context("failed to link symbol declarations")?;
        Ok(Compilation::new(locator, symbols))
    }
}

#[cfg(test)]
#[path = "tests/manifest_tests.rs"]
mod tests;
