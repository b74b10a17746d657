//! Storage contract tests run against backends built through the registry

#![allow(clippy::unwrap_used, clippy::expect_used)]

use pagecast_cache::{
    BackendConfig, BackendRegistry, CacheEntry, CanonicalRequest, Error, LogConfig, Storage,
};
use std::path::Path;
use std::sync::Arc;
use std::thread;
use tempfile::TempDir;

fn filesystem(temp: &TempDir) -> Arc<dyn Storage> {
    let registry = BackendRegistry::with_builtin_backends();
    let config = BackendConfig::new("filesystem")
        .with_option(
            "directory",
            temp.path().join("cache").to_string_lossy().into_owned(),
        )
        .with_logging(LogConfig {
            trace_operations: true,
        });
    registry.create(&config).unwrap()
}

fn key_for(page: u32) -> String {
    CanonicalRequest::new(Path::new("/docs/manual.pdf"), page, "png")
        .param("dpi", 150)
        .param("quality", 90)
        .key()
}

#[test]
fn registry_rejects_missing_directory() {
    let registry = BackendRegistry::with_builtin_backends();
    let err = registry
        .create(&BackendConfig::new("filesystem"))
        .unwrap_err();
    assert!(matches!(err, Error::Configuration { .. }));
}

#[test]
fn registry_rejects_non_string_directory() {
    let registry = BackendRegistry::with_builtin_backends();
    let err = registry
        .create(&BackendConfig::new("filesystem").with_option("directory", true))
        .unwrap_err();
    assert!(err.to_string().contains("must be a string"));
}

#[test]
fn roundtrip_through_registry_backend() {
    let temp = TempDir::new().unwrap();
    let storage = filesystem(&temp);
    let key = key_for(1);

    assert!(storage.get(&key).unwrap_err().is_not_found());

    let entry = CacheEntry::new(key.clone(), vec![1, 2, 3], "manual.1.png");
    storage.set(&entry).unwrap();

    let fetched = storage.get(&key).unwrap();
    assert_eq!(fetched.data, entry.data);
    assert_eq!(fetched.filename, entry.filename);
    assert!(temp.path().join("cache").join(&key).join("manual.1.png").is_file());
}

#[test]
fn distinct_keys_are_independent_under_concurrency() {
    let temp = TempDir::new().unwrap();
    let storage = filesystem(&temp);

    let handles: Vec<_> = (1..=8u32)
        .map(|page| {
            let storage = Arc::clone(&storage);
            thread::spawn(move || {
                let key = key_for(page);
                let payload = vec![u8::try_from(page).unwrap(); 1024];
                storage
                    .set(&CacheEntry::new(key.clone(), payload.clone(), format!("manual.{page}.png")))
                    .unwrap();
                assert_eq!(storage.get(&key).unwrap().data, payload);
                storage.invalidate(&key).unwrap();
                assert!(storage.get(&key).unwrap_err().is_not_found());
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }
}

#[test]
fn clear_then_get_is_miss() {
    let temp = TempDir::new().unwrap();
    let storage = filesystem(&temp);
    for page in 1..=3 {
        storage
            .set(&CacheEntry::new(key_for(page), vec![0], format!("manual.{page}.png")))
            .unwrap();
    }

    storage.clear().unwrap();

    for page in 1..=3 {
        assert!(storage.get(&key_for(page)).unwrap_err().is_not_found());
    }
    assert!(temp.path().join("cache").is_dir());
}
