// src/fs/mod.rs

//! The slice of the filesystem the watcher needs: checking what a path is,
//! and reading files for content hashing.

use std::fmt::Debug;
use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result};

pub mod mock;

pub trait FileSystem: Send + Sync + Debug {
    /// Open a regular file for reading.
    fn open_read(&self, path: &Path) -> Result<Box<dyn Read + Send>>;

    fn is_file(&self, path: &Path) -> bool;

    fn is_dir(&self, path: &Path) -> bool;
}

/// The host filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct RealFileSystem;

impl FileSystem for RealFileSystem {
    fn open_read(&self, path: &Path) -> Result<Box<dyn Read + Send>> {
        std::fs::File::open(path)
            .map(|file| Box::new(file) as Box<dyn Read + Send>)
            .with_context(|| format!("cannot open {}", path.display()))
    }

    fn is_file(&self, path: &Path) -> bool {
        path.is_file()
    }

    fn is_dir(&self, path: &Path) -> bool {
        path.is_dir()
    }
}
