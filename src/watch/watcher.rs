// src/watch/watcher.rs

use std::path::{Path, PathBuf};
use std::sync::Arc;

use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::engine::RuntimeEvent;
use crate::errors::{DevloopError, Result};
use crate::fs::{FileSystem, RealFileSystem};
use crate::watch::event_handler::EventForwarder;
use crate::watch::patterns::WatchFilter;

/// Handle for the filesystem watcher.
///
/// This exists mainly so the underlying `RecommendedWatcher` is kept alive for
/// as long as needed. Dropping this handle will stop file watching.
pub struct WatcherHandle {
    _inner: RecommendedWatcher,
}

impl std::fmt::Debug for WatcherHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WatcherHandle").finish()
    }
}

/// Where and how to watch.
#[derive(Debug, Clone)]
pub struct WatchOptions {
    /// Project root; forwarded paths are relative to it.
    pub root: PathBuf,
    /// Directory watched recursively (the source directory).
    pub watch_dir: PathBuf,
    pub filter: WatchFilter,
    pub use_hash: bool,
}

/// Fail unless `dir` is an existing directory.
///
/// Called before the initial pass so a misconfigured `source_dir` is
/// reported before any process is launched.
pub fn ensure_watch_dir(fs: &dyn FileSystem, dir: &Path) -> Result<()> {
    if fs.is_dir(dir) {
        return Ok(());
    }
    Err(DevloopError::ConfigError(format!(
        "source directory {:?} does not exist",
        dir
    )))
}

/// Watch `options.watch_dir` recursively and send
/// `RuntimeEvent::FileChanged` for every added or changed file.
pub fn spawn_watcher(
    options: WatchOptions,
    runtime_tx: mpsc::Sender<RuntimeEvent>,
) -> Result<WatcherHandle> {
    let fs: Arc<dyn FileSystem> = Arc::new(RealFileSystem);
    ensure_watch_dir(fs.as_ref(), &options.watch_dir)?;

    // Canonicalize once so we have a stable base path.
    let root = options
        .root
        .canonicalize()
        .unwrap_or_else(|_| options.root.clone());
    let watch_dir = options
        .watch_dir
        .canonicalize()
        .unwrap_or_else(|_| options.watch_dir.clone());

    // Channel from the blocking notify callback into the async world.
    let (event_tx, mut event_rx) = mpsc::unbounded_channel::<Event>();

    let mut watcher = RecommendedWatcher::new(
        move |res: notify::Result<Event>| match res {
            Ok(event) => {
                if let Err(err) = event_tx.send(event) {
                    warn!("failed to forward notify event: {err}");
                }
            }
            Err(err) => error!("file watch error: {err}"),
        },
        Config::default(),
    )?;

    watcher.watch(&watch_dir, RecursiveMode::Recursive)?;

    info!("file watcher started on {:?}", watch_dir);

    let mut forwarder =
        EventForwarder::new(root, options.filter, options.use_hash, fs, runtime_tx);

    tokio::spawn(async move {
        while let Some(event) = event_rx.recv().await {
            debug!(?event, "received notify event");
            if !forwarder.forward(event).await {
                break;
            }
        }
        debug!("watcher event loop finished");
    });

    Ok(WatcherHandle { _inner: watcher })
}
