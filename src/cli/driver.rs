//! Runs one `check` invocation: manifest, options, engine.

use anyhow::Result;
use patchref_checker::{Engine, EngineOptions};
use patchref_common::Diagnostic;
use tracing::info;

use crate::cli::args::CheckArgs;
use crate::manifest::Manifest;

/// Manifest options with the command-line flags applied on top. Probe
/// directories from the command line are searched after the manifest's.
pub fn engine_options(manifest: &Manifest, args: &CheckArgs) -> EngineOptions {
    let mut options = manifest.engine_options();
    options.probe_directories.extend(args.probe.iter().cloned());
    if args.no_cache {
        options.cache_images = false;
    }
    if let Some(depth) = args.max_base_depth {
        options.max_base_depth = depth;
    }
    options
}

pub fn check(args: &CheckArgs) -> Result<Vec<Diagnostic>> {
    let manifest = Manifest::load(&args.manifest)?;
    let options = engine_options(&manifest, args);
    let compilation = manifest.compilation(&options)?;
    let engine = Engine::new(&compilation, options);
    let diagnostics = engine.analyze(&manifest.sites, &manifest.chains);
    if let Some(cache) = engine.cache() {
        info!(images = cache.len(), "assembly images loaded");
    }
    Ok(diagnostics)
}
