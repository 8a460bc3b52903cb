// src/config/validate.rs

use std::path::Path;

use globset::Glob;

use crate::config::model::{ConfigFile, ProjectSection, StageSettings};
use crate::errors::{DevloopError, Result};
use crate::pipeline::{CommandTemplate, StageKind, PLACEHOLDERS};

/// Run semantic validation against a configuration with defaults applied.
///
/// This checks:
/// - project paths are non-empty and relative
/// - every stage has a non-empty label and program
/// - argument templates only use known placeholders, and `{target}` only
///   where the stage has a target (format, lint, test)
/// - `[watch].exclude` globs compile
pub fn validate_config(cfg: &ConfigFile) -> Result<()> {
    validate_project(&cfg.project)?;

    for kind in StageKind::ALL {
        if let Some(stage) = cfg.stage(kind) {
            validate_stage(kind, stage)?;
        }
    }

    validate_run(cfg)?;
    validate_watch(cfg)?;
    Ok(())
}

fn config_error(msg: String) -> DevloopError {
    DevloopError::ConfigError(msg)
}

fn validate_project(project: &ProjectSection) -> Result<()> {
    for (field, value) in [
        ("source_dir", &project.source_dir),
        ("dist_dir", &project.dist_dir),
    ] {
        if value.trim().is_empty() {
            return Err(config_error(format!("[project].{field} must not be empty")));
        }
        if Path::new(value).is_absolute() {
            return Err(config_error(format!(
                "[project].{field} must be relative to the project root (got {value:?})"
            )));
        }
    }

    for (field, value) in [
        ("entry_file", &project.entry_file),
        ("test_marker", &project.test_marker),
        ("test_pattern", &project.test_pattern),
    ] {
        if value.is_empty() {
            return Err(config_error(format!("[project].{field} must not be empty")));
        }
    }

    Ok(())
}

fn validate_stage(kind: StageKind, stage: &StageSettings) -> Result<()> {
    if stage.label.trim().is_empty() {
        return Err(config_error(format!("[{kind}].label must not be empty")));
    }
    validate_template(&format!("[{kind}]"), &stage.command, kind.takes_target())
}

fn validate_run(cfg: &ConfigFile) -> Result<()> {
    if cfg.run.label.trim().is_empty() {
        return Err(config_error("[run].label must not be empty".to_string()));
    }
    validate_template("[run].dev_args", &cfg.run.dev, false)?;
    validate_template("[run].compiled_args", &cfg.run.compiled, false)
}

fn validate_template(section: &str, template: &CommandTemplate, allows_target: bool) -> Result<()> {
    if template.program.trim().is_empty() {
        return Err(config_error(format!("{section}: program must not be empty")));
    }

    for name in template.placeholders() {
        if !PLACEHOLDERS.contains(&name) {
            return Err(config_error(format!(
                "{section}: unknown placeholder {{{name}}} (expected one of {PLACEHOLDERS:?})"
            )));
        }
        if name == "target" && !allows_target {
            return Err(config_error(format!(
                "{section}: {{target}} is only available to format, lint and test"
            )));
        }
    }

    Ok(())
}

fn validate_watch(cfg: &ConfigFile) -> Result<()> {
    for pattern in &cfg.watch.exclude {
        Glob::new(pattern).map_err(|err| {
            config_error(format!("[watch].exclude: invalid glob {pattern:?}: {err}"))
        })?;
    }
    Ok(())
}
