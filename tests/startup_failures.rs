// tests/startup_failures.rs
//
// Drives `devloop::run` end to end; relies on `sh` being available.
#![cfg(unix)]

use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use tempfile::TempDir;

use devloop::cli::CliArgs;
use devloop_test_utils::{init_tracing, with_timeout};

/// Every stage leaves a marker file in the project root when it runs.
fn write_marking_config(dir: &TempDir, source_dir: &str) -> PathBuf {
    let mut contents = format!("[project]\nsource_dir = \"{source_dir}\"\n\n");
    for stage in ["format", "lint", "test"] {
        contents.push_str(&format!(
            "[{stage}]\nprogram = \"sh\"\nargs = [\"-c\", \"touch ran-{stage}\"]\n\n"
        ));
    }
    contents.push_str("[run]\nprogram = \"sh\"\ndev_args = [\"-c\", \"touch launched; sleep 30\"]\n");

    let path = dir.path().join("Devloop.toml");
    fs::write(&path, contents).unwrap();
    path
}

#[tokio::test]
async fn missing_source_dir_fails_before_anything_is_launched() {
    init_tracing();
    let dir = TempDir::new().unwrap();
    let config = write_marking_config(&dir, "missing_src");

    let args = CliArgs {
        config: Some(config.to_string_lossy().into_owned()),
        ..CliArgs::default()
    };
    let err = with_timeout(devloop::run(args)).await.unwrap_err();
    assert!(format!("{err:#}").contains("does not exist"), "got {err:#}");

    tokio::time::sleep(Duration::from_millis(100)).await;
    for marker in ["ran-format", "ran-lint", "ran-test", "launched"] {
        assert!(
            !dir.path().join(marker).exists(),
            "{marker} should not have been created"
        );
    }
}
