// src/engine/mod.rs

//! Orchestration engine for devloop.
//!
//! - [`orchestrator`] runs one pass per trigger against a process runner and
//!   owns the run state (busy flag, current program instance, modes).
//! - [`runtime`] is the async loop that feeds watch events into the
//!   orchestrator, dropping triggers while a pass is in flight.
//! - [`report`] describes what a pass did.

/// Events flowing into the runtime from the watcher and signal handlers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuntimeEvent {
    /// A file under the source directory was added or changed. The path is
    /// relative to the project root.
    FileChanged(String),
    /// Graceful shutdown requested (e.g. Ctrl-C).
    ShutdownRequested,
}

pub mod orchestrator;
pub mod report;
pub mod runtime;

pub use orchestrator::Orchestrator;
pub use report::{PassReport, PassResult, SkipReason, StageOutcome, StageRecord};
pub use runtime::{log_report, Runtime};
