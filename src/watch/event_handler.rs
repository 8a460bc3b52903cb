// src/watch/event_handler.rs

//! Turns raw `notify` events into `RuntimeEvent::FileChanged` triggers.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use notify::event::{CreateKind, ModifyKind};
use notify::{Event, EventKind};
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::engine::RuntimeEvent;
use crate::fs::FileSystem;
use crate::watch::cache::ContentCache;
use crate::watch::path_utils::trigger_path;
use crate::watch::patterns::WatchFilter;

/// Whether an event kind counts as "file added" or "file changed".
///
/// Removals, access and metadata-only changes never trigger a pass.
pub fn is_relevant_kind(kind: &EventKind) -> bool {
    match kind {
        EventKind::Create(CreateKind::Folder) => false,
        EventKind::Create(_) => true,
        EventKind::Modify(ModifyKind::Metadata(_)) => false,
        EventKind::Modify(_) => true,
        EventKind::Any => true,
        EventKind::Access(_) | EventKind::Remove(_) | EventKind::Other => false,
    }
}

/// Stateful filter between the watcher and the runtime.
///
/// For every relevant event path it:
/// 1. keeps regular files only
/// 2. relativizes the path against the project root
/// 3. applies `[watch].exclude`
/// 4. optionally drops content-identical changes (`use_hash`)
/// 5. sends the trigger to the runtime
#[derive(Debug)]
pub struct EventForwarder {
    root: PathBuf,
    filter: WatchFilter,
    cache: Option<ContentCache>,
    fs: Arc<dyn FileSystem>,
    runtime_tx: mpsc::Sender<RuntimeEvent>,
}

impl EventForwarder {
    pub fn new(
        root: impl Into<PathBuf>,
        filter: WatchFilter,
        use_hash: bool,
        fs: Arc<dyn FileSystem>,
        runtime_tx: mpsc::Sender<RuntimeEvent>,
    ) -> Self {
        Self {
            root: root.into(),
            filter,
            cache: use_hash.then(ContentCache::new),
            fs,
            runtime_tx,
        }
    }

    /// Forward every qualifying path of `event`.
    ///
    /// Returns false once the runtime has gone away and the watcher loop
    /// should stop.
    pub async fn forward(&mut self, event: Event) -> bool {
        if !is_relevant_kind(&event.kind) {
            return true;
        }

        for path in &event.paths {
            let Some(rel) = self.accept(path) else {
                continue;
            };

            debug!(path = %rel, "file change -> trigger");
            if let Err(err) = self.runtime_tx.send(RuntimeEvent::FileChanged(rel)).await {
                warn!("failed to send RuntimeEvent::FileChanged: {err}");
                return false;
            }
        }

        true
    }

    /// Relative path to forward for `path`, or `None` if it is filtered out.
    fn accept(&mut self, path: &Path) -> Option<String> {
        if !self.fs.is_file(path) {
            return None;
        }

        let Some(rel) = trigger_path(&self.root, path) else {
            warn!(
                "could not relativize path {:?} against root {:?}",
                path, self.root
            );
            return None;
        };

        if self.filter.is_excluded(&rel) {
            debug!(path = %rel, "excluded by [watch].exclude");
            return None;
        }

        if let Some(cache) = self.cache.as_mut() {
            if !cache.has_changed(self.fs.as_ref(), path) {
                println!("[devloop] Skipping '{rel}' (content unchanged)");
                return None;
            }
        }

        Some(rel)
    }
}
