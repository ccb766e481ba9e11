use std::path::{Path, PathBuf};

/// The directory every `RUN` subprocess is launched in.
///
/// Owned by the executor, which is its only reader and writer, so no
/// synchronization is needed.
#[derive(Debug, Clone)]
pub struct WorkingDir {
    path: PathBuf,
}

impl WorkingDir {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Start in the invoking user's home directory.
    /// Falls back to the process working directory, then to the root.
    pub fn from_home() -> Self {
        let path = dirs::home_dir()
            .or_else(|| std::env::current_dir().ok())
            .unwrap_or_else(|| PathBuf::from(std::path::MAIN_SEPARATOR_STR));
        Self::new(path)
    }

    pub fn read(&self) -> &Path {
        &self.path
    }

    pub fn write(&mut self, path: impl Into<PathBuf>) {
        self.path = path.into();
    }
}
