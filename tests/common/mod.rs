//! Shared fixtures for the reflection integration tests.

use php_static_reflection::finder::{CallbackFinder, Psr0Finder};
use php_static_reflection::reflect::ReflectionFactory;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

/// Factory populated from an in-memory buffer; finder lookups always miss.
pub fn source_factory(source: &str) -> ReflectionFactory {
    let factory = ReflectionFactory::new(CallbackFinder::new(|_| None));
    factory.parse_source(source).expect("source should parse");
    factory
}

/// Factory backed by a PSR-0 tree in a temp directory. Each entry is a
/// `(fully-qualified class name, source)` pair. The `TempDir` guard must
/// stay alive for the factory to keep finding files.
pub fn fixture_factory(files: &[(&str, &str)]) -> (TempDir, ReflectionFactory) {
    let dir = TempDir::new().expect("tempdir");
    for (class_name, source) in files {
        write_class_file(dir.path(), class_name, source);
    }
    let factory = ReflectionFactory::new(Psr0Finder::new(dir.path()));
    (dir, factory)
}

/// Writes one class file into a PSR-0 tree rooted at `base`.
pub fn write_class_file(base: &Path, class_name: &str, source: &str) {
    let path = base.join(format!("{}.php", class_name.replace('\\', "/")));
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("fixture dir");
    }
    fs::write(path, source).expect("fixture file");
}
