// src/watch/path_utils.rs

use std::path::{Component, Path};

/// Path of `path` below `root` as a forward-slash string (`src/a/b.ts`).
///
/// Falls back to comparing canonical paths when the plain prefix check fails,
/// since watchers may report paths through a different (symlinked) prefix.
/// Returns `None` for paths outside `root`.
pub fn trigger_path(root: &Path, path: &Path) -> Option<String> {
    if let Ok(rel) = path.strip_prefix(root) {
        return Some(join_components(rel));
    }

    let root = root.canonicalize().ok()?;
    let path = path.canonicalize().ok()?;
    path.strip_prefix(&root).ok().map(join_components)
}

fn join_components(rel: &Path) -> String {
    rel.components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}
