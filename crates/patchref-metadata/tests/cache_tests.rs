use super::*;
use crate::testing::{AssemblyBuilder, Sig};
use rayon::prelude::*;

fn write_sample(dir: &Path) -> PathBuf {
    let mut asm = AssemblyBuilder::new("Cached");
    let ty = asm.type_def("Game", "Cached");
    asm.field(ty, "value", Sig::int32());
    asm.write_to(dir).unwrap()
}

#[test]
fn test_second_load_hits_cache() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_sample(dir.path());
    let cache = ImageCache::new();

    let first = cache.get_or_load(&path).unwrap();
    let second = cache.get_or_load(&path).unwrap();
    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(cache.len(), 1);

    cache.clear();
    assert!(cache.is_empty());
}

#[test]
fn test_failures_are_not_cached() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("Broken.dll");
    std::fs::write(&path, b"garbage").unwrap();
    let cache = ImageCache::new();

    assert!(cache.get_or_load(&path).is_err());
    assert!(cache.is_empty());
}

#[test]
fn test_concurrent_loads_share_one_image() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_sample(dir.path());
    let cache = ImageCache::new();

    let images: Vec<Arc<MetadataImage>> = (0..16)
        .into_par_iter()
        .map(|_| cache.get_or_load(&path).unwrap())
        .collect();
    assert_eq!(cache.len(), 1);
    let cached = cache.get_or_load(&path).unwrap();
    assert!(images.iter().all(|image| Arc::ptr_eq(image, &cached)));
}
