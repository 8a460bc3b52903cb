#![allow(dead_code)]

use devloop::config::{ConfigFile, RawConfigFile, RawStageSection};
use devloop::errors::Result;
use devloop::pipeline::{Pipeline, StageKind};
use devloop::types::Modes;

/// Root every test pipeline is rendered against.
pub const TEST_ROOT: &str = "/project";

/// Builder for `ConfigFile` to simplify test setup.
///
/// Starts from the built-in defaults; every setter overrides one field the
/// same way a `Devloop.toml` would.
pub struct ConfigFileBuilder {
    config: RawConfigFile,
}

impl ConfigFileBuilder {
    pub fn new() -> Self {
        Self {
            config: RawConfigFile::default(),
        }
    }

    pub fn source_dir(mut self, dir: &str) -> Self {
        self.config.project.source_dir = dir.to_string();
        self
    }

    pub fn entry_file(mut self, file: &str) -> Self {
        self.config.project.entry_file = file.to_string();
        self
    }

    pub fn dist_dir(mut self, dir: &str) -> Self {
        self.config.project.dist_dir = dir.to_string();
        self
    }

    pub fn test_marker(mut self, marker: &str) -> Self {
        self.config.project.test_marker = marker.to_string();
        self
    }

    pub fn stage_label(mut self, kind: StageKind, label: &str) -> Self {
        self.section(kind).label = Some(label.to_string());
        self
    }

    pub fn stage_program(mut self, kind: StageKind, program: &str) -> Self {
        self.section(kind).program = Some(program.to_string());
        self
    }

    pub fn stage_args(mut self, kind: StageKind, args: &[&str]) -> Self {
        self.section(kind).args = Some(strings(args));
        self
    }

    pub fn stage_extensions(mut self, kind: StageKind, exts: &[&str]) -> Self {
        self.section(kind).extensions = Some(strings(exts));
        self
    }

    pub fn abort_on_failure(mut self, kind: StageKind) -> Self {
        self.section(kind).abort_on_failure = Some(true);
        self
    }

    pub fn run_program(mut self, program: &str) -> Self {
        self.config.run.program = Some(program.to_string());
        self
    }

    pub fn run_dev_args(mut self, args: &[&str]) -> Self {
        self.config.run.dev_args = Some(strings(args));
        self
    }

    pub fn run_compiled_args(mut self, args: &[&str]) -> Self {
        self.config.run.compiled_args = Some(strings(args));
        self
    }

    pub fn exclude(mut self, pattern: &str) -> Self {
        self.config.watch.exclude.push(pattern.to_string());
        self
    }

    pub fn use_hash(mut self, val: bool) -> Self {
        self.config.watch.use_hash = val;
        self
    }

    pub fn try_build(self) -> Result<ConfigFile> {
        ConfigFile::try_from(self.config)
    }

    pub fn build(self) -> ConfigFile {
        self.try_build()
            .expect("Failed to build valid config from builder")
    }

    fn section(&mut self, kind: StageKind) -> &mut RawStageSection {
        match kind {
            StageKind::Format => &mut self.config.format,
            StageKind::Lint => &mut self.config.lint,
            StageKind::Test => &mut self.config.test,
            StageKind::Clean => &mut self.config.clean,
            StageKind::Compile => &mut self.config.compile,
            StageKind::Run => panic!("the run stage is configured via run_* setters"),
        }
    }
}

impl Default for ConfigFileBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Pipeline over the default config rooted at [`TEST_ROOT`].
pub fn default_pipeline(modes: Modes) -> Pipeline {
    pipeline_for(&ConfigFile::default(), modes)
}

pub fn pipeline_for(cfg: &ConfigFile, modes: Modes) -> Pipeline {
    Pipeline::new(cfg, modes, TEST_ROOT)
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}
