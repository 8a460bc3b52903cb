// tests/pipeline_plan.rs

use std::path::PathBuf;

use devloop::pipeline::{FailurePolicy, PlanStep, StageKind};
use devloop::types::{Modes, Trigger};
use devloop_test_utils::builders::{default_pipeline, pipeline_for, ConfigFileBuilder};

fn file(path: &str) -> Trigger {
    Trigger::FileChanged(path.to_string())
}

fn dev() -> Modes {
    Modes::from_flags(false, false)
}

#[test]
fn initial_trigger_without_flags_checks_whole_tree_and_runs_dev_interpreter() {
    let plan = default_pipeline(dev()).plan(&Trigger::Initial);

    assert_eq!(
        plan.executed_stages(),
        vec![StageKind::Format, StageKind::Lint, StageKind::Test, StageKind::Run]
    );

    let format = plan.invocation(StageKind::Format).unwrap();
    assert_eq!(format.label, "format:prettier");
    assert_eq!(format.program, "npx");
    assert_eq!(format.args, vec!["prettier", "--write", "src"]);
    assert_eq!(format.cwd, PathBuf::from("/project"));

    let lint = plan.invocation(StageKind::Lint).unwrap();
    assert_eq!(lint.args, vec!["eslint", "--fix", "src"]);

    let test = plan.invocation(StageKind::Test).unwrap();
    assert_eq!(test.args, vec!["ava", "src/**/*.test.*"]);

    let run = plan.invocation(StageKind::Run).unwrap();
    assert_eq!(run.label, "run:node");
    assert_eq!(run.program, "node");
    assert_eq!(run.args, vec!["--inspect", "-r", "ts-node/register", "src/index.ts"]);

    assert!(plan.cancels_previous());
}

#[test]
fn source_file_change_targets_the_file_and_restarts_the_program() {
    let plan = default_pipeline(dev()).plan(&file("src/foo.ts"));

    assert_eq!(
        plan.executed_stages(),
        vec![StageKind::Format, StageKind::Lint, StageKind::Run]
    );

    let format = plan.invocation(StageKind::Format).unwrap();
    assert_eq!(format.label, "format:prettier(src/foo.ts)");
    assert_eq!(format.args, vec!["prettier", "--write", "src/foo.ts"]);

    let lint = plan.invocation(StageKind::Lint).unwrap();
    assert_eq!(lint.label, "lint:eslint(src/foo.ts)");
    assert_eq!(lint.args, vec!["eslint", "--fix", "src/foo.ts"]);

    assert!(plan.cancels_previous());
}

#[test]
fn test_file_change_runs_that_test_and_never_reaches_the_gate() {
    let plan = default_pipeline(dev()).plan(&file("src/foo.test.ts"));

    assert_eq!(
        plan.executed_stages(),
        vec![StageKind::Format, StageKind::Lint, StageKind::Test]
    );

    let test = plan.invocation(StageKind::Test).unwrap();
    assert_eq!(test.label, "test:ava(src/foo.test.ts)");
    assert_eq!(test.args, vec!["ava", "src/foo.test.ts"]);

    assert!(!plan.cancels_previous());
}

#[test]
fn build_mode_initial_cleans_and_compiles_without_running() {
    let plan = default_pipeline(Modes::from_flags(false, true)).plan(&Trigger::Initial);

    assert_eq!(
        plan.executed_stages(),
        vec![
            StageKind::Format,
            StageKind::Lint,
            StageKind::Test,
            StageKind::Clean,
            StageKind::Compile,
        ]
    );

    let clean = plan.invocation(StageKind::Clean).unwrap();
    assert_eq!(clean.label, "clean:rimraf");
    assert_eq!(clean.args, vec!["rimraf", "dist"]);

    let compile = plan.invocation(StageKind::Compile).unwrap();
    assert_eq!(compile.args, vec!["tsc"]);
}

#[test]
fn compile_mode_file_change_recompiles_without_cleaning_and_runs_compiled_output() {
    let plan = default_pipeline(Modes::from_flags(true, false)).plan(&file("src/foo.ts"));

    assert_eq!(
        plan.executed_stages(),
        vec![StageKind::Format, StageKind::Lint, StageKind::Compile, StageKind::Run]
    );

    let run = plan.invocation(StageKind::Run).unwrap();
    assert_eq!(run.args, vec!["--inspect", "."]);
}

#[test]
fn json_change_is_formatted_but_not_linted() {
    let plan = default_pipeline(dev()).plan(&file("src/config.json"));

    assert_eq!(plan.executed_stages(), vec![StageKind::Format, StageKind::Run]);
}

#[test]
fn unrelated_file_still_restarts_the_program() {
    let plan = default_pipeline(dev()).plan(&file("src/notes.md"));

    assert_eq!(plan.executed_stages(), vec![StageKind::Run]);
    assert!(plan.cancels_previous());
}

#[test]
fn test_marker_without_matching_extension_skips_everything() {
    let plan = default_pipeline(dev()).plan(&file("src/fixture.test.md"));

    assert!(plan.executed_stages().is_empty());
    assert!(!plan.cancels_previous());
}

#[test]
fn every_stage_appears_once_in_order_with_cancel_at_the_gate() {
    let plan = default_pipeline(dev()).plan(&file("src/foo.ts"));

    let shape: Vec<String> = plan
        .steps
        .iter()
        .map(|step| match step {
            PlanStep::Execute { invocation, .. } => format!("run:{}", invocation.stage),
            PlanStep::Skip { stage, .. } => format!("skip:{stage}"),
            PlanStep::CancelPrevious => "cancel".to_string(),
        })
        .collect();

    assert_eq!(
        shape,
        vec![
            "run:format",
            "run:lint",
            "skip:test",
            "cancel",
            "skip:clean",
            "skip:compile",
            "run:run",
        ]
    );
}

#[test]
fn run_stage_is_detached_and_tool_stages_continue_by_default() {
    let plan = default_pipeline(dev()).plan(&Trigger::Initial);

    for step in &plan.steps {
        if let PlanStep::Execute { invocation, policy } = step {
            let expected = if invocation.stage == StageKind::Run {
                FailurePolicy::Detached
            } else {
                FailurePolicy::Continue
            };
            assert_eq!(*policy, expected, "stage {}", invocation.stage);
        }
    }
}

#[test]
fn abort_on_failure_switches_the_lint_policy() {
    let cfg = ConfigFileBuilder::new()
        .abort_on_failure(StageKind::Lint)
        .build();
    let plan = pipeline_for(&cfg, dev()).plan(&Trigger::Initial);

    let lint_policy = plan.steps.iter().find_map(|step| match step {
        PlanStep::Execute { invocation, policy } if invocation.stage == StageKind::Lint => {
            Some(*policy)
        }
        _ => None,
    });
    assert_eq!(lint_policy, Some(FailurePolicy::AbortRemaining));
}

#[test]
fn custom_layout_and_commands_are_rendered() {
    let cfg = ConfigFileBuilder::new()
        .source_dir("lib")
        .entry_file("main.js")
        .dist_dir("out")
        .test_marker(".spec.")
        .stage_program(StageKind::Test, "node")
        .stage_args(StageKind::Test, &["--test", "{target}"])
        .stage_args(StageKind::Clean, &["rimraf", "{dist_dir}"])
        .run_dev_args(&["{entry}", "--src", "{source_dir}"])
        .build();
    let pipeline = pipeline_for(&cfg, dev());

    let initial = pipeline.plan(&Trigger::Initial);
    assert_eq!(
        initial.invocation(StageKind::Run).unwrap().args,
        vec!["lib/main.js", "--src", "lib"]
    );

    let spec_change = pipeline.plan(&file("lib/a.spec.js"));
    let test = spec_change.invocation(StageKind::Test).unwrap();
    assert_eq!(test.program, "node");
    assert_eq!(test.args, vec!["--test", "lib/a.spec.js"]);
    assert!(!spec_change.cancels_previous());

    // The default marker no longer means anything.
    let old_marker = pipeline.plan(&file("lib/a.test.js"));
    assert!(old_marker.cancels_previous());
    assert!(old_marker.invocation(StageKind::Test).is_none());
}
