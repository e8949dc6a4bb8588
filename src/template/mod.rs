//! Template engine for prompt placeholders.
//!
//! This module provides:
//!
//! - **Model**: `Variable` and `Template` (a prompt with its derived variable set)
//! - **Engine**: placeholder detection, preview rendering and execution gating
//! - **Execute**: the asynchronous generation step built on the engine
//!
//! # Template Syntax
//!
//! Placeholders are double-brace wrapped names; surrounding whitespace inside
//! the braces is ignored:
//!
//! ```text
//! Write a follow-up email to {{client_name}} about {{ topic }}.
//! ```
//!
//! A template's variable list always mirrors the distinct placeholder names in
//! its content, in order of first appearance.

mod engine;
mod execute;
mod model;

#[cfg(test)]
mod tests;

pub use engine::{
    TemplateError, VariableValues, can_execute, detect_variables, missing_required,
    placeholder_names, prefill_defaults, prepare, render_preview, resolve_value, validate_values,
    values,
};
pub use execute::{ExecutionResult, execute};
pub use model::{Template, TemplateDraft, Variable, VariablePatch};
