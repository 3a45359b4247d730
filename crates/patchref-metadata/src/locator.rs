//! Assembly locator: maps assembly names to files on disk.
//!
//! Explicit references win over files found in probe directories. Names are
//! compared case-insensitively, as the runtime binder does.

use patchref_common::limits::MAX_PROBE_DEPTH;
use rustc_hash::FxHashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, trace};
use walkdir::WalkDir;

#[derive(Clone, Debug, Default)]
pub struct AssemblyLocator {
    references: FxHashMap<String, PathBuf>,
    probed: FxHashMap<String, PathBuf>,
    /// Assembly names in registration order, references first.
    order: Vec<String>,
}

impl AssemblyLocator {
    pub fn new() -> Self {
        Self::default()
    }

    fn key(name: &str) -> String {
        name.to_ascii_lowercase()
    }

    /// Registers a referenced assembly file under its assembly name.
    pub fn add_reference(&mut self, name: &str, path: impl Into<PathBuf>) {
        let key = Self::key(name);
        let path = path.into();
        trace!(assembly = name, path = %path.display(), "registered reference");
        if self.references.insert(key.clone(), path).is_none() && !self.probed.contains_key(&key) {
            self.order.push(key);
        }
    }

    /// Indexes every `.dll` and `.exe` below `dir`, keyed by file stem.
    /// Returns the number of files indexed.
    pub fn add_probe_directory(&mut self, dir: &Path) -> usize {
        let mut found = 0;
        for entry in WalkDir::new(dir)
            .max_depth(MAX_PROBE_DEPTH)
            .into_iter()
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().is_file())
        {
            let path = entry.path();
            let is_assembly = path
                .extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| ext.eq_ignore_ascii_case("dll") || ext.eq_ignore_ascii_case("exe"));
            let Some(stem) = path.file_stem().and_then(|stem| stem.to_str()) else {
                continue;
            };
            if !is_assembly {
                continue;
            }
            let key = Self::key(stem);
            if self.references.contains_key(&key) || self.probed.contains_key(&key) {
                continue;
            }
            self.probed.insert(key.clone(), path.to_path_buf());
            self.order.push(key);
            found += 1;
        }
        debug!(dir = %dir.display(), found, "probed directory");
        found
    }

    /// Path of a readable file for `assembly`, if any.
    pub fn locate(&self, assembly: &str) -> Option<&Path> {
        let key = Self::key(assembly);
        let path = self
            .references
            .get(&key)
            .or_else(|| self.probed.get(&key))?;
        path.is_file().then_some(path.as_path())
    }

    pub fn is_known(&self, assembly: &str) -> bool {
        self.locate(assembly).is_some()
    }

    /// Readable assembly files, in registration order.
    pub fn files(&self) -> impl Iterator<Item = &Path> + '_ {
        self.order.iter().filter_map(|key| {
            self.references
                .get(key)
                .or_else(|| self.probed.get(key))
                .map(PathBuf::as_path)
                .filter(|path| path.is_file())
        })
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

#[cfg(test)]
#[path = "../tests/locator_tests.rs"]
mod tests;
