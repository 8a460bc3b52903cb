// src/watch/cache.rs

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::fs::FileSystem;
use crate::watch::hash::compute_file_hash;

/// Last forwarded content hash per file.
///
/// Used with `[watch].use_hash = true` to ignore change events that leave a
/// file's content untouched (e.g. a formatter rewriting an already formatted
/// file).
#[derive(Debug, Default)]
pub struct ContentCache {
    hashes: HashMap<PathBuf, String>,
}

impl ContentCache {
    pub fn new() -> Self {
        Self {
            hashes: HashMap::new(),
        }
    }

    /// Hash `path` and record it. Returns true if the content differs from
    /// the last recorded hash (or nothing was recorded yet).
    ///
    /// Unreadable files count as changed.
    pub fn has_changed(&mut self, fs: &dyn FileSystem, path: &Path) -> bool {
        let hash = match compute_file_hash(fs, path) {
            Ok(h) => h,
            Err(err) => {
                warn!(file = ?path, error = %err, "failed to hash file; treating as changed");
                self.hashes.remove(path);
                return true;
            }
        };

        match self.hashes.insert(path.to_path_buf(), hash.clone()) {
            Some(previous) if previous == hash => {
                debug!(file = ?path, "content hash unchanged");
                false
            }
            _ => true,
        }
    }

    pub fn len(&self) -> usize {
        self.hashes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hashes.is_empty()
    }
}
