//! Per-pass image cache.
//!
//! Loading is done outside the map lock; when two threads race on the same
//! path the first inserted image wins and both observe it.

use crate::error::Result;
use crate::image::MetadataImage;
use dashmap::DashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::trace;

#[derive(Debug, Default)]
pub struct ImageCache {
    images: DashMap<PathBuf, Arc<MetadataImage>>,
}

impl ImageCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_or_load(&self, path: &Path) -> Result<Arc<MetadataImage>> {
        if let Some(image) = self.images.get(path) {
            trace!(path = %path.display(), "image cache hit");
            return Ok(Arc::clone(image.value()));
        }
        let image = Arc::new(MetadataImage::open(path)?);
        let entry = self
            .images
            .entry(path.to_path_buf())
            .or_insert(image);
        Ok(Arc::clone(entry.value()))
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    pub fn clear(&self) {
        self.images.clear();
    }
}

#[cfg(test)]
#[path = "../tests/cache_tests.rs"]
mod tests;
