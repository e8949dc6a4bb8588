//! Prompt template and variable definitions.

use super::engine::detect_variables;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A placeholder declared by a template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Variable {
    /// Trimmed placeholder name, unique within its template.
    pub name: String,

    /// Illustrative value, used as a rendering fallback.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub example: String,

    /// Fallback value, used after `example` when rendering.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub default_value: String,

    /// Execution is blocked until this variable has a non-blank value.
    #[serde(default = "default_true")]
    pub required: bool,
}

impl Variable {
    /// A freshly detected variable: required, no example, no default.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            example: String::new(),
            default_value: String::new(),
            required: true,
        }
    }

    pub fn with_example(mut self, example: impl Into<String>) -> Self {
        self.example = example.into();
        self
    }

    pub fn with_default(mut self, default_value: impl Into<String>) -> Self {
        self.default_value = default_value.into();
        self
    }

    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }
}

/// Partial update of a variable's settings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VariablePatch {
    pub example: Option<String>,
    pub default_value: Option<String>,
    pub required: Option<bool>,
}

/// A reusable prompt ("Prompt" in the product).
///
/// `variables` always equals the distinct placeholder names in `content`;
/// use [`Template::set_content`] rather than assigning `content` directly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Template {
    pub id: String,
    pub title: String,

    #[serde(default)]
    pub description: String,

    pub content: String,

    #[serde(default)]
    pub variables: Vec<Variable>,

    #[serde(default)]
    pub profession: String,

    #[serde(default)]
    pub category: String,

    #[serde(default)]
    pub tone: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<f32>,

    #[serde(default)]
    pub usage_count: u64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,

    /// Id of the user who created the prompt; `None` for built-in prompts.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner_id: Option<String>,

    #[serde(default)]
    pub is_personal: bool,

    #[serde(default = "default_true")]
    pub is_public: bool,

    pub created_at: DateTime<Utc>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

fn default_true() -> bool {
    true
}

/// Fields a user supplies when creating a prompt.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TemplateDraft {
    pub title: String,
    pub description: String,
    pub content: String,
    pub profession: String,
    pub category: String,
    pub tone: String,
    pub is_public: bool,
}

impl Template {
    /// Create a public template whose variables are derived from `content`.
    pub fn new(id: impl Into<String>, title: impl Into<String>, content: impl Into<String>) -> Self {
        let content = content.into();
        Self {
            id: id.into(),
            title: title.into(),
            description: String::new(),
            variables: detect_variables(&content, &[]),
            content,
            profession: String::new(),
            category: String::new(),
            tone: String::new(),
            rating: None,
            usage_count: 0,
            author: None,
            owner_id: None,
            is_personal: false,
            is_public: true,
            created_at: Utc::now(),
            updated_at: None,
        }
    }

    /// Replace the content and re-derive the variable set.
    ///
    /// Settings of variables that survive the edit are kept.
    pub fn set_content(&mut self, content: impl Into<String>) {
        let content = content.into();
        self.variables = detect_variables(&content, &self.variables);
        self.content = content;
    }

    /// Re-derive variables from the current content.
    ///
    /// Used after loading stored prompts whose variable list may be stale.
    pub fn sync_variables(&mut self) {
        self.variables = detect_variables(&self.content, &self.variables);
    }

    /// Look up a declared variable by name.
    pub fn variable(&self, name: &str) -> Option<&Variable> {
        self.variables.iter().find(|v| v.name == name)
    }

    /// Apply a patch to a declared variable. Returns false if no such variable.
    pub fn configure_variable(&mut self, name: &str, patch: VariablePatch) -> bool {
        let Some(variable) = self.variables.iter_mut().find(|v| v.name == name) else {
            return false;
        };
        if let Some(example) = patch.example {
            variable.example = example;
        }
        if let Some(default_value) = patch.default_value {
            variable.default_value = default_value;
        }
        if let Some(required) = patch.required {
            variable.required = required;
        }
        true
    }

    pub fn with_variable(mut self, variable: Variable) -> Self {
        if let Some(slot) = self.variables.iter_mut().find(|v| v.name == variable.name) {
            *slot = variable;
        }
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    pub fn with_profession(mut self, profession: impl Into<String>) -> Self {
        self.profession = profession.into();
        self
    }

    pub fn with_tone(mut self, tone: impl Into<String>) -> Self {
        self.tone = tone.into();
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// True if `user_id` may edit or delete this prompt.
    pub fn is_owned_by(&self, user_id: &str) -> bool {
        self.owner_id.as_deref() == Some(user_id)
    }
}
