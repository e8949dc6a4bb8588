//! Prompt library: templates stored one YAML file per prompt.
//!
//! Visibility: a prompt is listed for a viewer if it is public or the viewer
//! owns it. Only the owner may edit, configure or delete a prompt.

mod ids;
mod seed;


use crate::error::{PromptlyError, Result};
use crate::fs::{atomic_write_file, remove_if_exists};
use crate::identity::Profile;
use crate::template::{Template, TemplateDraft, VariablePatch};
use chrono::Utc;
use std::cmp::Ordering;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

pub use ids::{generate_prompt_id, slugify_title, validate_prompt_id};
pub use seed::starter_templates;

/// Listing filter. Empty fields match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PromptFilter {
    /// Case-insensitive match on title, description, content or profession.
    pub text: Option<String>,
    /// Case-insensitive category match.
    pub category: Option<String>,
    /// Only prompts owned by the viewer.
    pub mine: bool,
}

impl PromptFilter {
    fn matches(&self, template: &Template, viewer: Option<&str>) -> bool {
        if self.mine && !viewer.is_some_and(|id| template.is_owned_by(id)) {
            return false;
        }
        if let Some(category) = self.category.as_deref().map(str::trim)
            && !category.is_empty()
            && !template.category.eq_ignore_ascii_case(category)
        {
            return false;
        }
        if let Some(text) = self.text.as_deref().map(str::trim)
            && !text.is_empty()
        {
            let needle = text.to_lowercase();
            return [
                &template.title,
                &template.description,
                &template.content,
                &template.profession,
            ]
            .iter()
            .any(|field| field.to_lowercase().contains(&needle));
        }
        true
    }
}

/// Changes to an existing prompt; `None` leaves a field as is.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TemplateUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub content: Option<String>,
    pub profession: Option<String>,
    pub category: Option<String>,
    pub tone: Option<String>,
    pub is_public: Option<bool>,
}

#[derive(Debug, Clone)]
pub struct PromptLibrary {
    dir: PathBuf,
}

impl PromptLibrary {
    /// Open the library at `dir`, creating the directory if needed.
    pub fn open<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir).map_err(|e| {
            PromptlyError::StorageError(format!(
                "failed to create prompt directory '{}': {}",
                dir.display(),
                e
            ))
        })?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, id: &str) -> PathBuf {
        self.dir.join(ids::prompt_filename(id))
    }

    /// Write the starter prompts if the library is empty. Returns how many
    /// were written.
    pub fn seed(&self) -> Result<usize> {
        if !self.load_all()?.is_empty() {
            return Ok(0);
        }
        let starters = starter_templates();
        for template in &starters {
            self.save(template)?;
        }
        debug!(count = starters.len(), "seeded prompt library");
        Ok(starters.len())
    }

    /// Every stored prompt, unordered. Unreadable files are skipped.
    fn load_all(&self) -> Result<Vec<Template>> {
        let entries = fs::read_dir(&self.dir).map_err(|e| {
            PromptlyError::StorageError(format!(
                "failed to read prompt directory '{}': {}",
                self.dir.display(),
                e
            ))
        })?;

        let mut templates = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| {
                PromptlyError::StorageError(format!("failed to read directory entry: {}", e))
            })?;
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("yaml") {
                continue;
            }
            match load_file(&path) {
                Ok(template) => templates.push(template),
                Err(err) => warn!(path = %path.display(), error = %err, "skipping prompt file"),
            }
        }
        Ok(templates)
    }

    fn save(&self, template: &Template) -> Result<()> {
        let content = serde_yaml::to_string(template).map_err(|e| {
            PromptlyError::StorageError(format!("failed to serialize prompt '{}': {}", template.id, e))
        })?;
        atomic_write_file(self.path_for(&template.id), &content)
    }

    /// Prompts visible to `viewer`, most used first, then by title.
    pub fn list(&self, viewer: Option<&str>, filter: &PromptFilter) -> Result<Vec<Template>> {
        let mut templates: Vec<Template> = self
            .load_all()?
            .into_iter()
            .filter(|t| is_visible(t, viewer) && filter.matches(t, viewer))
            .collect();
        templates.sort_by(by_usage_then_title);
        Ok(templates)
    }

    /// Distinct categories of the prompts visible to `viewer`, sorted.
    pub fn categories(&self, viewer: Option<&str>) -> Result<Vec<String>> {
        let mut categories: Vec<String> = self
            .list(viewer, &PromptFilter::default())?
            .into_iter()
            .map(|t| t.category)
            .filter(|c| !c.is_empty())
            .collect();
        categories.sort();
        categories.dedup();
        Ok(categories)
    }

    /// A prompt visible to `viewer`. Private prompts of other users are
    /// reported as not found.
    pub fn get(&self, id: &str, viewer: Option<&str>) -> Result<Template> {
        let id = validate_prompt_id(id)?;
        let path = self.path_for(id);
        if !path.exists() {
            return Err(not_found(id));
        }
        let template = load_file(&path)?;
        if is_visible(&template, viewer) {
            Ok(template)
        } else {
            Err(not_found(id))
        }
    }

    /// Store a new prompt owned by `author`.
    ///
    /// New prompts are personal. PRO users choose whether to publish; prompts
    /// of free users are always public.
    pub fn create(&self, author: Option<&Profile>, draft: TemplateDraft) -> Result<Template> {
        let author = author.ok_or_else(|| {
            PromptlyError::AuthRequired("sign in or complete onboarding to create prompts".into())
        })?;
        if draft.title.trim().is_empty() {
            return Err(PromptlyError::ValidationError("title is required".into()));
        }
        if draft.content.trim().is_empty() {
            return Err(PromptlyError::ValidationError("content is required".into()));
        }

        let mut template = Template::new(
            generate_prompt_id(&draft.title),
            draft.title.trim(),
            draft.content,
        )
        .with_description(draft.description)
        .with_profession(if draft.profession.trim().is_empty() {
            author.profession.clone()
        } else {
            draft.profession
        })
        .with_category(draft.category)
        .with_tone(draft.tone);
        template.owner_id = Some(author.id.clone());
        template.author = Some(author.name.clone());
        template.is_personal = true;
        template.is_public = draft.is_public || !author.is_pro;

        self.save(&template)?;
        debug!(id = %template.id, public = template.is_public, "prompt created");
        Ok(template)
    }

    /// Apply `update` to a prompt owned by `owner`. Content edits re-derive
    /// the variables, keeping settings of names that survive.
    pub fn update(&self, id: &str, owner: &Profile, update: TemplateUpdate) -> Result<Template> {
        let mut template = self.owned(id, &owner.id)?;

        if let Some(title) = update.title {
            if title.trim().is_empty() {
                return Err(PromptlyError::ValidationError("title is required".into()));
            }
            template.title = title.trim().to_string();
        }
        if let Some(content) = update.content {
            if content.trim().is_empty() {
                return Err(PromptlyError::ValidationError("content is required".into()));
            }
            template.set_content(content);
        }
        if let Some(description) = update.description {
            template.description = description;
        }
        if let Some(profession) = update.profession {
            template.profession = profession;
        }
        if let Some(category) = update.category {
            template.category = category;
        }
        if let Some(tone) = update.tone {
            template.tone = tone;
        }
        if let Some(is_public) = update.is_public {
            if !is_public && !owner.is_pro {
                return Err(PromptlyError::ValidationError(
                    "only PRO users can keep prompts private".into(),
                ));
            }
            template.is_public = is_public;
        }

        template.updated_at = Some(Utc::now());
        self.save(&template)?;
        Ok(template)
    }

    /// Set example/default/required of one variable of an owned prompt.
    pub fn configure_variable(
        &self,
        id: &str,
        owner_id: &str,
        name: &str,
        patch: VariablePatch,
    ) -> Result<Template> {
        let mut template = self.owned(id, owner_id)?;
        if !template.configure_variable(name, patch) {
            let declared: Vec<&str> = template.variables.iter().map(|v| v.name.as_str()).collect();
            return Err(PromptlyError::UserError(format!(
                "prompt '{}' has no variable '{}' (declared: {})",
                id,
                name,
                if declared.is_empty() {
                    "none".to_string()
                } else {
                    declared.join(", ")
                }
            )));
        }
        template.updated_at = Some(Utc::now());
        self.save(&template)?;
        Ok(template)
    }

    pub fn delete(&self, id: &str, owner_id: &str) -> Result<()> {
        let template = self.owned(id, owner_id)?;
        remove_if_exists(self.path_for(&template.id))?;
        debug!(id = %template.id, "prompt deleted");
        Ok(())
    }

    /// Bump the usage counter of a prompt and return the new count.
    pub fn increment_usage(&self, id: &str) -> Result<u64> {
        let id = validate_prompt_id(id)?;
        let path = self.path_for(id);
        if !path.exists() {
            return Err(not_found(id));
        }
        let mut template = load_file(&path)?;
        template.usage_count = template.usage_count.saturating_add(1);
        self.save(&template)?;
        Ok(template.usage_count)
    }

    fn owned(&self, id: &str, owner_id: &str) -> Result<Template> {
        let template = self.get(id, Some(owner_id))?;
        if !template.is_owned_by(owner_id) {
            return Err(PromptlyError::UserError(format!(
                "prompt '{}' belongs to another user",
                id
            )));
        }
        Ok(template)
    }
}

fn not_found(id: &str) -> PromptlyError {
    PromptlyError::NotFound(format!("prompt '{}'", id))
}

fn is_visible(template: &Template, viewer: Option<&str>) -> bool {
    template.is_public || viewer.is_some_and(|id| template.is_owned_by(id))
}

fn by_usage_then_title(a: &Template, b: &Template) -> Ordering {
    b.usage_count
        .cmp(&a.usage_count)
        .then_with(|| a.title.to_lowercase().cmp(&b.title.to_lowercase()))
}

fn load_file(path: &Path) -> Result<Template> {
    let content = fs::read_to_string(path).map_err(|e| {
        PromptlyError::StorageError(format!("failed to read prompt '{}': {}", path.display(), e))
    })?;
    let mut template: Template = serde_yaml::from_str(&content).map_err(|e| {
        PromptlyError::StorageError(format!("failed to parse prompt '{}': {}", path.display(), e))
    })?;
    template.sync_variables();
    Ok(template)
}
