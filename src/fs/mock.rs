// src/fs/mock.rs

use std::collections::HashMap;
use std::io::{Cursor, Read};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use anyhow::{Result, bail};

use super::FileSystem;

/// In-memory filesystem holding regular files only.
///
/// Any ancestor of a stored file counts as a directory.
#[derive(Debug, Clone, Default)]
pub struct MockFileSystem {
    files: Arc<Mutex<HashMap<PathBuf, Vec<u8>>>>,
}

impl MockFileSystem {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create or overwrite a file.
    pub fn add_file(&self, path: impl AsRef<Path>, content: impl Into<Vec<u8>>) {
        self.files()
            .insert(path.as_ref().to_path_buf(), content.into());
    }

    pub fn remove_file(&self, path: impl AsRef<Path>) {
        self.files().remove(path.as_ref());
    }

    fn files(&self) -> MutexGuard<'_, HashMap<PathBuf, Vec<u8>>> {
        // A panic while holding the lock leaves the map itself intact.
        self.files.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl FileSystem for MockFileSystem {
    fn open_read(&self, path: &Path) -> Result<Box<dyn Read + Send>> {
        let Some(content) = self.files().get(path).cloned() else {
            bail!("no such file in mock filesystem: {}", path.display());
        };
        Ok(Box::new(Cursor::new(content)))
    }

    fn is_file(&self, path: &Path) -> bool {
        self.files().contains_key(path)
    }

    fn is_dir(&self, path: &Path) -> bool {
        self.files()
            .keys()
            .any(|file| file != path && file.starts_with(path))
    }
}
