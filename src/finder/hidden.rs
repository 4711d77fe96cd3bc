//! Hidden-path detection strategies
//!
//! The traversal is platform-agnostic; the platform policy is selected
//! once at startup and injected into the locator. A path that cannot be
//! inspected is reported to the diagnostic channel and treated as
//! visible, never as a traversal failure.

use std::path::Path;

/// Decide whether a filesystem path is hidden by platform convention
pub trait HiddenPathFilter: Send + Sync {
    /// Pure predicate: must not fail for non-existent paths.
    fn is_hidden(&self, path: &Path) -> bool;
}

/// Unix convention: the final path component starts with a dot
pub struct NameConvention;

impl HiddenPathFilter for NameConvention {
    fn is_hidden(&self, path: &Path) -> bool {
        path.file_name()
            .map(|name| name.to_string_lossy().starts_with('.'))
            .unwrap_or(false)
    }
}

/// Windows convention: the FILE_ATTRIBUTE_HIDDEN bit is set
#[cfg(windows)]
pub struct FileAttributes;

#[cfg(windows)]
impl HiddenPathFilter for FileAttributes {
    fn is_hidden(&self, path: &Path) -> bool {
        use std::os::windows::fs::MetadataExt;

        const FILE_ATTRIBUTE_HIDDEN: u32 = 0x2;

        match std::fs::metadata(path) {
            Ok(meta) => meta.file_attributes() & FILE_ATTRIBUTE_HIDDEN != 0,
            Err(e) => {
                tracing::debug!(
                    path = %path.display(),
                    error = %e,
                    "Hidden check failed, treating path as visible"
                );
                false
            }
        }
    }
}

/// The hidden-path policy for the platform this binary was built for
pub fn platform_default() -> Box<dyn HiddenPathFilter> {
    #[cfg(windows)]
    {
        Box::new(FileAttributes)
    }
    #[cfg(not(windows))]
    {
        Box::new(NameConvention)
    }
}
