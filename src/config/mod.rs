// src/config/mod.rs

//! Configuration loading and validation for devloop.
//!
//! Responsibilities:
//! - Define the TOML-backed data model (`model.rs`).
//! - Load a config file from disk (`loader.rs`).
//! - Validate paths, templates and globs (`validate.rs`).

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{default_config_path, load_and_validate, load_from_path, load_or_default};
pub use model::{
    ConfigFile, ProjectSection, RawConfigFile, RawRunSection, RawStageSection, RunSettings,
    StageSettings, WatchSection,
};
pub use validate::validate_config;
