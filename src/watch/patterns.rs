// src/watch/patterns.rs

use std::fmt;

use anyhow::Context;
use globset::{Glob, GlobSet, GlobSetBuilder};

use crate::config::ConfigFile;
use crate::errors::Result;

/// Compiled `[watch].exclude` globs.
///
/// Patterns are relative to the project root; the watcher passes relative
/// paths such as `"src/generated/api.ts"` into [`WatchFilter::is_excluded`].
#[derive(Clone, Default)]
pub struct WatchFilter {
    exclude_set: Option<GlobSet>,
}

impl fmt::Debug for WatchFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WatchFilter")
            .field("patterns", &self.exclude_set.as_ref().map_or(0, GlobSet::len))
            .finish()
    }
}

impl WatchFilter {
    pub fn new(exclude: &[String]) -> Result<Self> {
        if exclude.is_empty() {
            return Ok(Self::default());
        }
        let set = build_globset(exclude).context("building [watch].exclude globset")?;
        Ok(Self {
            exclude_set: Some(set),
        })
    }

    pub fn from_config(cfg: &ConfigFile) -> Result<Self> {
        Self::new(&cfg.watch.exclude)
    }

    pub fn is_excluded(&self, rel_path: &str) -> bool {
        self.exclude_set
            .as_ref()
            .is_some_and(|set| set.is_match(rel_path))
    }
}

/// Build a GlobSet from simple string patterns.
fn build_globset(patterns: &[String]) -> anyhow::Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pat in patterns {
        let glob = Glob::new(pat).with_context(|| format!("invalid glob pattern: {pat}"))?;
        builder.add(glob);
    }
    Ok(builder.build()?)
}
