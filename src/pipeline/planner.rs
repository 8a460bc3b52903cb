// src/pipeline/planner.rs

//! Pure planning: which stages run for a trigger, with which command line.
//!
//! The planner does no IO. The orchestrator executes the resulting [`Plan`]
//! step by step against a process runner.

use std::path::PathBuf;

use crate::config::ConfigFile;
use crate::exec::Invocation;
use crate::types::{Modes, Trigger};

use super::extension::matches_extension;
use super::stage::{FailurePolicy, Gate, StageKind, StageSpec};
use super::template::TemplateVars;

/// Resolved project paths, all relative to `root` with forward slashes.
#[derive(Debug, Clone)]
pub struct ProjectLayout {
    pub root: PathBuf,
    pub source_dir: String,
    pub dist_dir: String,
    /// Entry file joined onto the source directory, e.g. `src/index.ts`.
    pub entry: String,
    pub test_marker: String,
}

/// One step of a plan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlanStep {
    /// Spawn the invocation and handle its outcome per `policy`.
    Execute {
        invocation: Invocation,
        policy: FailurePolicy,
    },
    /// The stage does not apply to this trigger.
    Skip { stage: StageKind, label: String },
    /// Terminate the previous program instance if it is still alive.
    CancelPrevious,
}

/// Ordered steps for one trigger.
#[derive(Debug, Clone)]
pub struct Plan {
    pub trigger: Trigger,
    pub steps: Vec<PlanStep>,
}

impl Plan {
    /// Stages that will be executed, in order.
    pub fn executed_stages(&self) -> Vec<StageKind> {
        self.steps
            .iter()
            .filter_map(|step| match step {
                PlanStep::Execute { invocation, .. } => Some(invocation.stage),
                _ => None,
            })
            .collect()
    }

    pub fn invocation(&self, stage: StageKind) -> Option<&Invocation> {
        self.steps.iter().find_map(|step| match step {
            PlanStep::Execute { invocation, .. } if invocation.stage == stage => Some(invocation),
            _ => None,
        })
    }

    pub fn cancels_previous(&self) -> bool {
        self.steps.contains(&PlanStep::CancelPrevious)
    }
}

/// The stage table plus the project layout it is rendered against.
#[derive(Debug, Clone)]
pub struct Pipeline {
    stages: Vec<StageSpec>,
    layout: ProjectLayout,
    modes: Modes,
}

impl Pipeline {
    /// Build the stage table from a validated config and the start-up modes.
    pub fn new(cfg: &ConfigFile, modes: Modes, root: impl Into<PathBuf>) -> Self {
        let project = &cfg.project;
        let layout = ProjectLayout {
            root: root.into(),
            source_dir: project.source_dir.clone(),
            dist_dir: project.dist_dir.clone(),
            entry: join_rel(&project.source_dir, &project.entry_file),
            test_marker: project.test_marker.clone(),
        };

        let policy_of = |abort: bool| {
            if abort {
                FailurePolicy::AbortRemaining
            } else {
                FailurePolicy::Continue
            }
        };

        let stages = vec![
            StageSpec {
                kind: StageKind::Format,
                label: cfg.format.label.clone(),
                gate: Gate::Extension,
                enabled: true,
                extensions: cfg.format.extensions.clone(),
                command: cfg.format.command.clone(),
                policy: policy_of(cfg.format.abort_on_failure),
                tree_target: Some(layout.source_dir.clone()),
            },
            StageSpec {
                kind: StageKind::Lint,
                label: cfg.lint.label.clone(),
                gate: Gate::Extension,
                enabled: true,
                extensions: cfg.lint.extensions.clone(),
                command: cfg.lint.command.clone(),
                policy: policy_of(cfg.lint.abort_on_failure),
                tree_target: Some(layout.source_dir.clone()),
            },
            StageSpec {
                kind: StageKind::Test,
                label: cfg.test.label.clone(),
                gate: Gate::TestFile,
                enabled: true,
                extensions: cfg.test.extensions.clone(),
                command: cfg.test.command.clone(),
                policy: policy_of(cfg.test.abort_on_failure),
                tree_target: Some(join_rel(&project.source_dir, &project.test_pattern)),
            },
            StageSpec {
                kind: StageKind::Clean,
                label: cfg.clean.label.clone(),
                gate: Gate::InitialOnly,
                enabled: modes.compile,
                extensions: Vec::new(),
                command: cfg.clean.command.clone(),
                policy: policy_of(cfg.clean.abort_on_failure),
                tree_target: None,
            },
            StageSpec {
                kind: StageKind::Compile,
                label: cfg.compile.label.clone(),
                gate: Gate::Always,
                enabled: modes.compile,
                extensions: Vec::new(),
                command: cfg.compile.command.clone(),
                policy: policy_of(cfg.compile.abort_on_failure),
                tree_target: None,
            },
            StageSpec {
                kind: StageKind::Run,
                label: cfg.run.label.clone(),
                gate: Gate::Always,
                enabled: modes.launches_program(),
                extensions: Vec::new(),
                command: if modes.compile {
                    cfg.run.compiled.clone()
                } else {
                    cfg.run.dev.clone()
                },
                policy: FailurePolicy::Detached,
                tree_target: None,
            },
        ];

        Self {
            stages,
            layout,
            modes,
        }
    }

    pub fn stages(&self) -> &[StageSpec] {
        &self.stages
    }

    pub fn layout(&self) -> &ProjectLayout {
        &self.layout
    }

    pub fn modes(&self) -> Modes {
        self.modes
    }

    pub fn is_test_file(&self, path: &str) -> bool {
        path.contains(self.layout.test_marker.as_str())
    }

    /// Test files never restart the program or recompile.
    pub fn reaches_run_gate(&self, trigger: &Trigger) -> bool {
        match trigger.file() {
            None => true,
            Some(path) => !self.is_test_file(path),
        }
    }

    /// Applicability predicate of a single stage.
    pub fn applies(&self, spec: &StageSpec, trigger: &Trigger) -> bool {
        if !spec.enabled {
            return false;
        }
        if spec.kind.behind_run_gate() && !self.reaches_run_gate(trigger) {
            return false;
        }

        match (spec.gate, trigger.file()) {
            (_, None) => true,
            (Gate::Extension, Some(path)) => matches_extension(path, &spec.extensions),
            (Gate::TestFile, Some(path)) => {
                self.is_test_file(path) && matches_extension(path, &spec.extensions)
            }
            (Gate::InitialOnly, Some(_)) => false,
            (Gate::Always, Some(_)) => true,
        }
    }

    /// Produce the ordered plan for `trigger`.
    ///
    /// A `CancelPrevious` step sits in front of the first stage behind the
    /// run-stage gate whenever the trigger reaches that gate, regardless of
    /// which of those stages apply.
    pub fn plan(&self, trigger: &Trigger) -> Plan {
        let mut steps = Vec::with_capacity(self.stages.len() + 1);
        let reaches_gate = self.reaches_run_gate(trigger);
        let mut gate_passed = false;

        for spec in &self.stages {
            if reaches_gate && !gate_passed && spec.kind.behind_run_gate() {
                steps.push(PlanStep::CancelPrevious);
                gate_passed = true;
            }

            let label = self.label_for(spec, trigger);
            if self.applies(spec, trigger) {
                steps.push(PlanStep::Execute {
                    invocation: self.invocation_for(spec, trigger, label),
                    policy: spec.policy,
                });
            } else {
                steps.push(PlanStep::Skip {
                    stage: spec.kind,
                    label,
                });
            }
        }

        Plan {
            trigger: trigger.clone(),
            steps,
        }
    }

    fn label_for(&self, spec: &StageSpec, trigger: &Trigger) -> String {
        match (&spec.tree_target, trigger.file()) {
            (Some(_), Some(path)) => format!("{}({})", spec.label, path),
            _ => spec.label.clone(),
        }
    }

    fn invocation_for(&self, spec: &StageSpec, trigger: &Trigger, label: String) -> Invocation {
        let target = spec
            .tree_target
            .as_deref()
            .map(|tree| trigger.file().unwrap_or(tree));

        let vars = TemplateVars {
            target,
            source_dir: &self.layout.source_dir,
            dist_dir: &self.layout.dist_dir,
            entry: &self.layout.entry,
        };

        Invocation {
            stage: spec.kind,
            label,
            program: spec.command.program.clone(),
            args: spec.command.render(&vars),
            cwd: self.layout.root.clone(),
        }
    }
}

/// Join a relative file name onto a relative directory using `/`.
fn join_rel(dir: &str, name: &str) -> String {
    let dir = dir.trim_end_matches('/');
    let name = name.trim_start_matches("./");
    if dir.is_empty() || dir == "." {
        name.to_string()
    } else {
        format!("{dir}/{name}")
    }
}
