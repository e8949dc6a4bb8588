//! Placeholder detection and substitution.
//!
//! All functions here are pure and synchronous. Substitution is a single pass
//! over the template content, so a substituted value that itself contains
//! `{{...}}` is never expanded again.

use super::model::{Template, Variable};
use regex::{Captures, Regex};
use std::collections::{BTreeMap, HashSet};
use std::sync::LazyLock;
use thiserror::Error;

/// `{{` + one or more non-`}` characters + `}}`.
static PLACEHOLDER_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\{([^}]+)\}\}").expect("Invalid placeholder regex"));

/// User-supplied values keyed by variable name.
pub type VariableValues = BTreeMap<String, String>;

/// Error type for template validation failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TemplateError {
    /// A value was supplied for a name the template does not declare.
    #[error("unknown variable '{name}' (template declares: {declared})")]
    UnknownVariable { name: String, declared: String },

    /// One or more required variables have no non-blank value.
    #[error("missing value for required variable(s): {}", names.join(", "))]
    MissingRequired { names: Vec<String> },
}

/// Distinct trimmed placeholder names in order of first appearance.
pub fn placeholder_names(text: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut names = Vec::new();

    for caps in PLACEHOLDER_REGEX.captures_iter(text) {
        let name = caps[1].trim();
        if name.is_empty() {
            continue;
        }
        if seen.insert(name.to_string()) {
            names.push(name.to_string());
        }
    }

    names
}

/// Scan `text` for placeholders and build the new variable set.
///
/// Variables already present in `previous` keep their `example`,
/// `default_value` and `required` settings; new names start out required
/// with empty example/default. Names no longer in the text are dropped.
/// The returned set replaces the old one wholesale.
pub fn detect_variables(text: &str, previous: &[Variable]) -> Vec<Variable> {
    placeholder_names(text)
        .into_iter()
        .map(|name| {
            previous
                .iter()
                .find(|v| v.name == name)
                .cloned()
                .unwrap_or_else(|| Variable::new(name))
        })
        .collect()
}

fn has_text(value: &str) -> bool {
    !value.trim().is_empty()
}

/// Resolve the text that replaces a variable's placeholder.
///
/// Priority: explicit value, then `example`, then `default_value`, then the
/// visible marker `[name]`. Blank strings count as absent.
pub fn resolve_value(variable: &Variable, values: &VariableValues) -> String {
    if let Some(value) = values.get(&variable.name)
        && has_text(value)
    {
        return value.clone();
    }
    if has_text(&variable.example) {
        return variable.example.clone();
    }
    if has_text(&variable.default_value) {
        return variable.default_value.clone();
    }
    format!("[{}]", variable.name)
}

/// Render the template content with every placeholder substituted.
///
/// Every occurrence of a declared placeholder is replaced. Placeholders whose
/// name is not in `template.variables` are left untouched.
pub fn render_preview(template: &Template, values: &VariableValues) -> String {
    PLACEHOLDER_REGEX
        .replace_all(&template.content, |caps: &Captures| {
            let name = caps[1].trim();
            match template.variable(name) {
                Some(variable) => resolve_value(variable, values),
                None => caps[0].to_string(),
            }
        })
        .into_owned()
}

/// Names of required variables without a non-blank value, in template order.
pub fn missing_required(template: &Template, values: &VariableValues) -> Vec<String> {
    template
        .variables
        .iter()
        .filter(|v| v.required)
        .filter(|v| !values.get(&v.name).is_some_and(|value| has_text(value)))
        .map(|v| v.name.clone())
        .collect()
}

/// True iff every required variable has a non-blank value.
///
/// Optional variables never affect the result.
pub fn can_execute(template: &Template, values: &VariableValues) -> bool {
    missing_required(template, values).is_empty()
}

/// Starting values for an execution form: each variable's non-blank
/// `default_value`, overridden by `supplied`.
pub fn prefill_defaults(template: &Template, supplied: VariableValues) -> VariableValues {
    let mut values: VariableValues = template
        .variables
        .iter()
        .filter(|v| has_text(&v.default_value))
        .map(|v| (v.name.clone(), v.default_value.clone()))
        .collect();
    values.extend(supplied);
    values
}

/// Reject values for names the template does not declare.
pub fn validate_values(template: &Template, values: &VariableValues) -> Result<(), TemplateError> {
    for name in values.keys() {
        if template.variable(name).is_none() {
            let declared: Vec<&str> = template.variables.iter().map(|v| v.name.as_str()).collect();
            return Err(TemplateError::UnknownVariable {
                name: name.clone(),
                declared: if declared.is_empty() {
                    "none".to_string()
                } else {
                    declared.join(", ")
                },
            });
        }
    }
    Ok(())
}

/// Validate `values` and produce the final prompt text plus the resolved
/// value of every declared variable.
pub fn prepare(
    template: &Template,
    values: &VariableValues,
) -> Result<(String, VariableValues), TemplateError> {
    validate_values(template, values)?;

    let missing = missing_required(template, values);
    if !missing.is_empty() {
        return Err(TemplateError::MissingRequired { names: missing });
    }

    let resolved = template
        .variables
        .iter()
        .map(|v| (v.name.clone(), resolve_value(v, values)))
        .collect();

    Ok((render_preview(template, values), resolved))
}

/// Helper to create a values map from a list of key-value pairs.
pub fn values<I, K, V>(pairs: I) -> VariableValues
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<String>,
{
    pairs
        .into_iter()
        .map(|(k, v)| (k.into(), v.into()))
        .collect()
}
