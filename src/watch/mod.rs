// src/watch/mod.rs

//! File watching.
//!
//! This module is responsible for:
//! - Wiring up a cross-platform filesystem watcher (`notify`) on the source
//!   directory.
//! - Filtering raw events down to file add/change triggers, with optional
//!   exclude globs and content hashing.
//!
//! It knows nothing about stages; it only turns filesystem changes into
//! `RuntimeEvent::FileChanged`.

pub mod cache;
pub mod event_handler;
pub mod hash;
pub mod path_utils;
pub mod patterns;
pub mod watcher;

pub use cache::ContentCache;
pub use event_handler::{is_relevant_kind, EventForwarder};
pub use hash::compute_file_hash;
pub use path_utils::trigger_path;
pub use patterns::WatchFilter;
pub use watcher::{ensure_watch_dir, spawn_watcher, WatchOptions, WatcherHandle};
