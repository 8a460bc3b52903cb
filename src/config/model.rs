// src/config/model.rs

use serde::Deserialize;

use crate::errors::{DevloopError, Result};
use crate::pipeline::{CommandTemplate, StageKind};

use super::validate::validate_config;

/// Configuration as read from `Devloop.toml`.
///
/// Every section and field is optional; anything left out falls back to the
/// TypeScript toolchain defaults (prettier, eslint, ava, rimraf, tsc, node):
///
/// ```toml
/// [project]
/// source_dir = "src"
/// entry_file = "index.ts"
///
/// [lint]
/// args = ["eslint", "--fix", "{target}"]
/// abort_on_failure = true
///
/// [watch]
/// exclude = ["src/**/*.generated.ts"]
/// ```
#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawConfigFile {
    #[serde(default)]
    pub project: ProjectSection,

    #[serde(default)]
    pub format: RawStageSection,
    #[serde(default)]
    pub lint: RawStageSection,
    #[serde(default)]
    pub test: RawStageSection,
    #[serde(default)]
    pub clean: RawStageSection,
    #[serde(default)]
    pub compile: RawStageSection,

    #[serde(default)]
    pub run: RawRunSection,

    #[serde(default)]
    pub watch: WatchSection,
}

/// `[project]` section: where things live, relative to the project root.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ProjectSection {
    /// Directory that is watched and formatted/linted as a whole.
    pub source_dir: String,
    /// Program entry point, relative to `source_dir`.
    pub entry_file: String,
    /// Build output directory removed by the clean stage.
    pub dist_dir: String,
    /// Substring that marks a path as a test file.
    pub test_marker: String,
    /// Glob (relative to `source_dir`) handed to the test runner on the
    /// initial pass.
    pub test_pattern: String,
}

impl Default for ProjectSection {
    fn default() -> Self {
        Self {
            source_dir: "src".to_string(),
            entry_file: "index.ts".to_string(),
            dist_dir: "dist".to_string(),
            test_marker: ".test.".to_string(),
            test_pattern: "**/*.test.*".to_string(),
        }
    }
}

/// `[format]`, `[lint]`, `[test]`, `[clean]` and `[compile]` sections.
///
/// `extensions` only matters for format, lint and test.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawStageSection {
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub program: Option<String>,
    #[serde(default)]
    pub args: Option<Vec<String>>,
    #[serde(default)]
    pub extensions: Option<Vec<String>>,
    #[serde(default)]
    pub abort_on_failure: Option<bool>,
}

/// `[run]` section.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawRunSection {
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub program: Option<String>,
    /// Arguments used without `--compile` (development interpreter).
    #[serde(default)]
    pub dev_args: Option<Vec<String>>,
    /// Arguments used with `--compile` (compiled output).
    #[serde(default)]
    pub compiled_args: Option<Vec<String>>,
}

/// `[watch]` section.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Default)]
#[serde(default)]
pub struct WatchSection {
    /// Globs, relative to the project root, for paths that never trigger.
    pub exclude: Vec<String>,
    /// Only trigger when a file's content hash actually changed.
    pub use_hash: bool,
}

/// Effective settings of one tool stage.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StageSettings {
    pub label: String,
    pub command: CommandTemplate,
    pub extensions: Vec<String>,
    pub abort_on_failure: bool,
}

impl StageSettings {
    /// Built-in settings for a tool stage; `None` for the run stage.
    pub fn defaults_for(kind: StageKind) -> Option<Self> {
        let script_exts = ["ts", "js", "cjs", "mjs"];

        let (label, args, extensions): (&str, Vec<&str>, Vec<&str>) = match kind {
            StageKind::Format => (
                "format:prettier",
                vec!["prettier", "--write", "{target}"],
                vec!["ts", "js", "cjs", "mjs", "json"],
            ),
            StageKind::Lint => (
                "lint:eslint",
                vec!["eslint", "--fix", "{target}"],
                script_exts.to_vec(),
            ),
            StageKind::Test => ("test:ava", vec!["ava", "{target}"], script_exts.to_vec()),
            StageKind::Clean => ("clean:rimraf", vec!["rimraf", "{dist_dir}"], Vec::new()),
            StageKind::Compile => ("compile:tsc", vec!["tsc"], Vec::new()),
            StageKind::Run => return None,
        };

        Some(Self {
            label: label.to_string(),
            command: CommandTemplate::new("npx", args),
            extensions: extensions.into_iter().map(String::from).collect(),
            abort_on_failure: false,
        })
    }

    fn merged(kind: StageKind, raw: RawStageSection) -> Self {
        let mut settings = Self::defaults_for(kind).unwrap_or_default();

        if let Some(label) = raw.label {
            settings.label = label;
        }
        if let Some(program) = raw.program {
            settings.command.program = program;
        }
        if let Some(args) = raw.args {
            settings.command.args = args;
        }
        if let Some(extensions) = raw.extensions {
            settings.extensions = extensions;
        }
        if let Some(abort) = raw.abort_on_failure {
            settings.abort_on_failure = abort;
        }
        settings
    }
}

/// Effective settings of the run stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSettings {
    pub label: String,
    /// Development interpreter against the entry file.
    pub dev: CommandTemplate,
    /// Runtime against the compiled output.
    pub compiled: CommandTemplate,
}

impl Default for RunSettings {
    fn default() -> Self {
        Self {
            label: "run:node".to_string(),
            dev: CommandTemplate::new(
                "node",
                ["--inspect", "-r", "ts-node/register", "{entry}"],
            ),
            compiled: CommandTemplate::new("node", ["--inspect", "."]),
        }
    }
}

impl RunSettings {
    fn merged(raw: RawRunSection) -> Self {
        let mut settings = Self::default();
        if let Some(label) = raw.label {
            settings.label = label;
        }
        if let Some(program) = raw.program {
            settings.dev.program = program.clone();
            settings.compiled.program = program;
        }
        if let Some(args) = raw.dev_args {
            settings.dev.args = args;
        }
        if let Some(args) = raw.compiled_args {
            settings.compiled.args = args;
        }
        settings
    }
}

/// Validated configuration with all defaults applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigFile {
    pub project: ProjectSection,
    pub format: StageSettings,
    pub lint: StageSettings,
    pub test: StageSettings,
    pub clean: StageSettings,
    pub compile: StageSettings,
    pub run: RunSettings,
    pub watch: WatchSection,
}

impl ConfigFile {
    /// Settings of a tool stage; `None` for [`StageKind::Run`].
    pub fn stage(&self, kind: StageKind) -> Option<&StageSettings> {
        match kind {
            StageKind::Format => Some(&self.format),
            StageKind::Lint => Some(&self.lint),
            StageKind::Test => Some(&self.test),
            StageKind::Clean => Some(&self.clean),
            StageKind::Compile => Some(&self.compile),
            StageKind::Run => None,
        }
    }
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self::from_raw(RawConfigFile::default())
    }
}

impl ConfigFile {
    fn from_raw(raw: RawConfigFile) -> Self {
        Self {
            project: raw.project,
            format: StageSettings::merged(StageKind::Format, raw.format),
            lint: StageSettings::merged(StageKind::Lint, raw.lint),
            test: StageSettings::merged(StageKind::Test, raw.test),
            clean: StageSettings::merged(StageKind::Clean, raw.clean),
            compile: StageSettings::merged(StageKind::Compile, raw.compile),
            run: RunSettings::merged(raw.run),
            watch: raw.watch,
        }
    }
}

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = DevloopError;

    fn try_from(raw: RawConfigFile) -> Result<Self> {
        let config = Self::from_raw(raw);
        validate_config(&config)?;
        Ok(config)
    }
}
