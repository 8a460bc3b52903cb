// src/pipeline/mod.rs

//! The stage pipeline.
//!
//! - [`extension`] classifies changed files by extension.
//! - [`stage`] defines the stage table rows and failure policies.
//! - [`template`] renders command templates.
//! - [`planner`] turns a trigger into an ordered [`Plan`], without IO.

pub mod extension;
pub mod planner;
pub mod stage;
pub mod template;

pub use extension::matches_extension;
pub use planner::{Pipeline, Plan, PlanStep, ProjectLayout};
pub use stage::{FailurePolicy, Gate, StageKind, StageSpec};
pub use template::{CommandTemplate, TemplateVars, PLACEHOLDERS};
