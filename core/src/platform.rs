use std::path::{Path, PathBuf};

/// Source of the directory that relative log paths are resolved against.
pub trait DirectoryProvider {
    fn default_dir(&self) -> Option<PathBuf>;

    /// Ask the platform for storage read/write access. Called once when a
    /// logger is constructed; platforms without a permission model do nothing.
    fn request_storage_access(&self) {}

    fn name(&self) -> &str;
}

/// App-data directory on Windows, the documents directory everywhere else.
#[derive(Debug, Default, Clone, Copy)]
pub struct PlatformDirs;

impl DirectoryProvider for PlatformDirs {
    fn default_dir(&self) -> Option<PathBuf> {
        let preferred = if cfg!(windows) {
            dirs::data_dir()
        } else {
            dirs::document_dir()
        };
        preferred
            .or_else(dirs::home_dir)
            .or_else(|| std::env::current_dir().ok())
    }

    fn name(&self) -> &str {
        if cfg!(windows) {
            "app-data"
        } else {
            "documents"
        }
    }
}

/// Always resolves against the same directory.
#[derive(Debug, Clone)]
pub struct FixedDir {
    dir: PathBuf,
}

impl FixedDir {
    pub fn new<P: Into<PathBuf>>(dir: P) -> Self {
        Self { dir: dir.into() }
    }
}

impl DirectoryProvider for FixedDir {
    fn default_dir(&self) -> Option<PathBuf> {
        Some(self.dir.clone())
    }

    fn name(&self) -> &str {
        "fixed"
    }
}

/// Absolute paths pass through; relative ones are joined onto the provider's
/// directory. `None` when the provider has no directory to offer.
pub fn resolve(path: &Path, provider: &dyn DirectoryProvider) -> Option<PathBuf> {
    if path.is_absolute() {
        return Some(path.to_path_buf());
    }
    provider.default_dir().map(|dir| dir.join(path))
}
