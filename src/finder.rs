use std::path::PathBuf;

/// Capability for mapping a fully-qualified class name to the source file
/// that defines it. The factory depends on nothing else.
pub trait ClassFinder {
    /// Path to the defining file, or `None` when the class is unknown.
    fn find_class_file(&self, class_name: &str) -> Option<PathBuf>;
}

/// PSR-0 path convention: namespace separators become directory separators
/// under a base directory, with a fixed source extension appended.
pub struct Psr0Finder {
    base_dir: PathBuf,
    extension: String,
}

impl Psr0Finder {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
            extension: "php".to_string(),
        }
    }

    pub fn with_extension(base_dir: impl Into<PathBuf>, extension: impl Into<String>) -> Self {
        Self {
            base_dir: base_dir.into(),
            extension: extension.into(),
        }
    }
}

impl ClassFinder for Psr0Finder {
    fn find_class_file(&self, class_name: &str) -> Option<PathBuf> {
        let class_name = class_name.trim_start_matches('\\');
        let class_path = class_name.replace('\\', "/");
        let filename = self
            .base_dir
            .join(format!("{}.{}", class_path, self.extension));
        filename.is_file().then_some(filename)
    }
}

/// Delegates lookups to a host-provided autoloader.
pub struct CallbackFinder {
    lookup: Box<dyn Fn(&str) -> Option<PathBuf>>,
}

impl CallbackFinder {
    pub fn new(lookup: impl Fn(&str) -> Option<PathBuf> + 'static) -> Self {
        Self {
            lookup: Box::new(lookup),
        }
    }
}

impl ClassFinder for CallbackFinder {
    fn find_class_file(&self, class_name: &str) -> Option<PathBuf> {
        (self.lookup)(class_name)
    }
}
