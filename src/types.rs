// src/types.rs

//! Small value types shared by the pipeline, the engine and the CLI.

use std::fmt;

/// What started an orchestration pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Trigger {
    /// Start-up pass over the whole source tree.
    Initial,
    /// A file was added or changed.
    ///
    /// The path is relative to the project root and uses forward slashes,
    /// e.g. `src/foo.ts`.
    FileChanged(String),
}

impl Trigger {
    pub fn file(&self) -> Option<&str> {
        match self {
            Trigger::Initial => None,
            Trigger::FileChanged(path) => Some(path),
        }
    }

    pub fn is_initial(&self) -> bool {
        matches!(self, Trigger::Initial)
    }
}

impl fmt::Display for Trigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Trigger::Initial => f.write_str("initial"),
            Trigger::FileChanged(path) => write!(f, "file-changed({path})"),
        }
    }
}

/// Mode flags captured once at start-up from `--compile` / `--build`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Modes {
    /// Compile before running, and run from the build output.
    pub compile: bool,
    /// Compile only; the program is never launched.
    pub build: bool,
}

impl Modes {
    /// `build` implies `compile`.
    pub fn from_flags(compile: bool, build: bool) -> Self {
        Self {
            compile: compile || build,
            build,
        }
    }

    /// Whether the run stage is part of the pipeline at all.
    pub fn launches_program(&self) -> bool {
        !self.build
    }
}
