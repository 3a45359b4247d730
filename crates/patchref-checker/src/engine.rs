//! The per-pass driver.
//!
//! An `Engine` checks standalone call sites and coalesce chains against one
//! `Compilation`. Chains are evaluated before standalone sites so a site that
//! belongs to a chain is reported (or suppressed) by the chain only.

use crate::call_site::CallSite;
use crate::cancel::CancellationToken;
use crate::chain::FallbackExpr;
use crate::consumed::ConsumedLocations;
use crate::dispatch::{Compilation, Dispatcher, Verdict};
use crate::shape::shape;
use patchref_common::Diagnostic;
use patchref_common::limits::DEFAULT_MAX_BASE_DEPTH;
use patchref_metadata::{AssemblyLocator, ImageCache};
use patchref_model::ResolutionOutcome;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::{debug, info, trace};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EngineOptions {
    /// Directories scanned for referenced assemblies.
    pub probe_directories: Vec<PathBuf>,
    /// Keep loaded images for the whole pass.
    pub cache_images: bool,
    pub max_base_depth: u32,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            probe_directories: Vec::new(),
            cache_images: true,
            max_base_depth: DEFAULT_MAX_BASE_DEPTH,
        }
    }
}

impl EngineOptions {
    /// Indexes the probe directories into `locator`. Returns the number of
    /// assembly files found.
    pub fn apply_probe_directories(&self, locator: &mut AssemblyLocator) -> usize {
        self.probe_directories
            .iter()
            .map(|dir| locator.add_probe_directory(dir))
            .sum()
    }
}

pub struct Engine<'a> {
    compilation: &'a Compilation,
    options: EngineOptions,
    cache: Option<ImageCache>,
    cancel: CancellationToken,
}

impl<'a> Engine<'a> {
    pub fn new(compilation: &'a Compilation, options: EngineOptions) -> Self {
        let cache = options.cache_images.then(ImageCache::new);
        Self {
            compilation,
            options,
            cache,
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    pub fn cache(&self) -> Option<&ImageCache> {
        self.cache.as_ref()
    }

    fn dispatcher(&self) -> Dispatcher<'_> {
        let dispatcher =
            Dispatcher::new(self.compilation).with_max_base_depth(self.options.max_base_depth);
        match &self.cache {
            Some(cache) => dispatcher.with_cache(cache),
            None => dispatcher,
        }
    }

    /// Verdict of one call site; `None` when the call is not a member lookup.
    pub fn evaluate(&self, site: &CallSite) -> Option<Verdict> {
        match shape(site) {
            Ok(Some(queries)) => Some(self.dispatcher().check_queries(&queries)),
            Ok(None) => None,
            Err(inconclusive) => {
                debug!(location = %site.location, %inconclusive, "call site abandoned");
                Some(Verdict::Inconclusive(inconclusive))
            }
        }
    }

    /// Checks a standalone call site. Sites consumed by a chain are skipped.
    pub fn check_site(&self, site: &CallSite, consumed: &ConsumedLocations) -> Vec<Diagnostic> {
        if self.cancel.is_cancelled() || consumed.is_consumed(&site.location) {
            return Vec::new();
        }
        match self.evaluate(site) {
            Some(Verdict::Failed(failures)) => report(site, &failures),
            _ => Vec::new(),
        }
    }

    /// Checks a coalesce chain: reports every failure only when no lookup in
    /// the chain succeeded or was inconclusive.
    pub fn check_chain(&self, chain: &FallbackExpr, consumed: &ConsumedLocations) -> Vec<Diagnostic> {
        let sites = chain.flatten();
        let claimed = consumed.claim_all(sites.iter().map(|site| &site.location));
        let mut failed = Vec::new();
        for (site, claimed) in sites.into_iter().zip(claimed) {
            if !claimed {
                continue;
            }
            if self.cancel.is_cancelled() {
                debug!(location = %site.location, "chain cancelled");
                return Vec::new();
            }
            match self.evaluate(site) {
                None => {}
                Some(Verdict::Failed(failures)) => failed.push((site, failures)),
                Some(_) => {
                    trace!(location = %site.location, "chain satisfied");
                    return Vec::new();
                }
            }
        }
        if self.cancel.is_cancelled() {
            return Vec::new();
        }
        failed
            .into_iter()
            .flat_map(|(site, failures)| report(site, &failures))
            .collect()
    }

    /// Runs one pass with a fresh consumed set.
    pub fn analyze(&self, sites: &[CallSite], chains: &[FallbackExpr]) -> Vec<Diagnostic> {
        self.analyze_with(sites, chains, &ConsumedLocations::new())
    }

    /// Runs one pass against an injected consumed set. Chains and sites are
    /// checked in parallel; the result is sorted by location.
    pub fn analyze_with(
        &self,
        sites: &[CallSite],
        chains: &[FallbackExpr],
        consumed: &ConsumedLocations,
    ) -> Vec<Diagnostic> {
        let mut diagnostics: Vec<Diagnostic> = chains
            .par_iter()
            .flat_map_iter(|chain| self.check_chain(chain, consumed))
            .collect();
        diagnostics.par_extend(
            sites
                .par_iter()
                .flat_map_iter(|site| self.check_site(site, consumed)),
        );
        if self.cancel.is_cancelled() {
            info!("analysis cancelled");
            return Vec::new();
        }
        diagnostics.sort_by(|a, b| {
            (&a.location, a.code, &a.message_text).cmp(&(&b.location, b.code, &b.message_text))
        });
        info!(
            sites = sites.len(),
            chains = chains.len(),
            diagnostics = diagnostics.len(),
            "analysis finished"
        );
        diagnostics
    }
}

fn report(site: &CallSite, failures: &[ResolutionOutcome]) -> Vec<Diagnostic> {
    failures
        .iter()
        .filter_map(|failure| failure.to_diagnostic(site.location.clone()))
        .collect()
}

#[cfg(test)]
#[path = "../tests/engine_tests.rs"]
mod tests;
