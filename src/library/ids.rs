//! Prompt ids and file names.

use crate::error::{PromptlyError, Result};
use regex::Regex;
use std::sync::LazyLock;

static PROMPT_ID_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-z0-9][a-z0-9-]{0,79}$").expect("Invalid prompt id regex")
});

/// Lowercase ASCII slug of a title, hyphen separated, at most 40 chars.
pub fn slugify_title(title: &str) -> String {
    let mut slug = String::new();
    let mut last_was_hyphen = false;

    for c in title.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
            last_was_hyphen = false;
        } else if !last_was_hyphen && !slug.is_empty() {
            slug.push('-');
            last_was_hyphen = true;
        }
    }

    while slug.ends_with('-') {
        slug.pop();
    }

    if slug.len() > 40 {
        match slug[..40].rfind('-') {
            Some(pos) => slug.truncate(pos),
            None => slug.truncate(40),
        }
    }

    if slug.is_empty() {
        slug = "prompt".to_string();
    }
    slug
}

/// `{slug}-{random8}` for a new prompt.
pub fn generate_prompt_id(title: &str) -> String {
    let suffix = uuid::Uuid::new_v4().simple().to_string();
    format!("{}-{}", slugify_title(title), &suffix[..8])
}

/// Check a user-supplied id before it is turned into a path.
pub fn validate_prompt_id(id: &str) -> Result<&str> {
    if PROMPT_ID_REGEX.is_match(id) {
        Ok(id)
    } else {
        Err(PromptlyError::ValidationError(format!(
            "invalid prompt id '{}': use lowercase letters, digits and hyphens",
            id
        )))
    }
}

pub fn prompt_filename(id: &str) -> String {
    format!("{}.yaml", id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slugify_title() {
        assert_eq!(slugify_title("Welcome Email for New Hires"), "welcome-email-for-new-hires");
        assert_eq!(slugify_title("  GDPR audit: full!  "), "gdpr-audit-full");
        assert_eq!(slugify_title("Rédiger"), "r-diger");
        assert_eq!(slugify_title("!!!"), "prompt");
    }

    #[test]
    fn test_slugify_title_length_limit() {
        let slug = slugify_title(&"word ".repeat(20));
        assert!(slug.len() <= 40);
        assert!(!slug.ends_with('-'));
    }

    #[test]
    fn test_generated_ids_are_valid_and_unique() {
        let a = generate_prompt_id("Sales pitch");
        let b = generate_prompt_id("Sales pitch");
        assert!(a.starts_with("sales-pitch-"));
        assert_ne!(a, b);
        assert!(validate_prompt_id(&a).is_ok());
    }

    #[test]
    fn test_validate_prompt_id_rejects_paths() {
        for bad in ["../etc", "a/b", "", ".hidden", "UPPER", "a\\b"] {
            assert!(validate_prompt_id(bad).is_err(), "{bad}");
        }
        assert!(validate_prompt_id("welcome-email").is_ok());
    }
}
