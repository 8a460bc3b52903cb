// src/pipeline/stage.rs

//! Stage descriptors: the rows of the pipeline table.

use std::fmt;

use super::template::CommandTemplate;

/// The six pipeline stages, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum StageKind {
    Format,
    Lint,
    Test,
    Clean,
    Compile,
    Run,
}

impl StageKind {
    pub const ALL: [StageKind; 6] = [
        StageKind::Format,
        StageKind::Lint,
        StageKind::Test,
        StageKind::Clean,
        StageKind::Compile,
        StageKind::Run,
    ];

    pub fn name(self) -> &'static str {
        match self {
            StageKind::Format => "format",
            StageKind::Lint => "lint",
            StageKind::Test => "test",
            StageKind::Clean => "clean",
            StageKind::Compile => "compile",
            StageKind::Run => "run",
        }
    }

    /// Stages that only run once a pass gets past the run-stage gate
    /// (i.e. never for changes to test files).
    pub fn behind_run_gate(self) -> bool {
        matches!(self, StageKind::Clean | StageKind::Compile | StageKind::Run)
    }

    /// Whether `{target}` is meaningful for this stage.
    pub fn takes_target(self) -> bool {
        matches!(self, StageKind::Format | StageKind::Lint | StageKind::Test)
    }
}

impl fmt::Display for StageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// What happens to the rest of the pass when a stage fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailurePolicy {
    /// Log the failure and carry on with the next stage.
    #[default]
    Continue,
    /// Skip every later stage of this pass.
    AbortRemaining,
    /// The process is long-lived; its completion is never awaited and its
    /// failure never reaches the pass.
    Detached,
}

/// Applicability rule of a stage, evaluated against the trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gate {
    /// Initial trigger, or a changed file with one of the stage's extensions.
    Extension,
    /// Initial trigger, or a changed test file with one of the stage's
    /// extensions.
    TestFile,
    /// Initial trigger only.
    InitialOnly,
    /// Any trigger that reaches the stage.
    Always,
}

/// One row of the pipeline table.
#[derive(Debug, Clone)]
pub struct StageSpec {
    pub kind: StageKind,
    pub label: String,
    pub gate: Gate,
    /// Whether the current modes include this stage at all
    /// (clean/compile need compile mode, run is suppressed by build mode).
    pub enabled: bool,
    pub extensions: Vec<String>,
    pub command: CommandTemplate,
    pub policy: FailurePolicy,
    /// Whole-tree target used by the initial trigger; file triggers target
    /// the changed file. `None` for stages that take no target.
    pub tree_target: Option<String>,
}
