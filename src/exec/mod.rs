// src/exec/mod.rs

//! Process execution layer.
//!
//! - [`runner`] defines the `ProcessRunner` trait the orchestrator depends
//!   on, together with invocations, outcomes and process handles.
//! - [`process`] provides `RealProcessRunner`, which spawns OS processes via
//!   `tokio::process::Command` with inherited output.
//! - [`delimiter`] formats the `<label>` / `</label>` console markers.

pub mod delimiter;
pub mod process;
pub mod runner;

pub use process::RealProcessRunner;
pub use runner::{
    Completion, Invocation, ProcessControl, ProcessOutcome, ProcessRunner, SpawnedProcess,
};
