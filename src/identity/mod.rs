//! Identity and profile store.
//!
//! The session controller authenticates users and reads/writes their
//! profiles through the [`IdentityStore`] trait. Two implementations ship:
//!
//! - [`DemoIdentityStore`]: offline stand-in used when no backend is
//!   configured; accepts any credentials
//! - [`RemoteIdentityStore`]: REST client for a hosted auth + row store
//!
//! `get_profile` distinguishes "not found" (`Ok(None)`) from a store error
//! (`Err(IdentityError)`).

mod demo;
mod remote;

use crate::config::{Config, IdentityConfig};
use crate::error::Result;
use crate::persistence::DevicePersistence;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

pub use demo::DemoIdentityStore;
pub use remote::RemoteIdentityStore;

/// A user profile, local or remote.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub id: String,
    pub name: String,
    pub email: String,
    pub profession: String,
    #[serde(default)]
    pub is_pro: bool,
    #[serde(default)]
    pub prompts_used: u32,
    /// `None` means unlimited.
    #[serde(default)]
    pub prompts_limit: Option<u32>,
}

impl Profile {
    /// A free-tier profile with no usage yet.
    pub fn free(
        id: impl Into<String>,
        name: impl Into<String>,
        email: impl Into<String>,
        profession: impl Into<String>,
        limit: u32,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            email: email.into(),
            profession: profession.into(),
            is_pro: false,
            prompts_used: 0,
            prompts_limit: Some(limit),
        }
    }

    /// Prompt executions left, `None` when unlimited.
    pub fn remaining(&self) -> Option<u32> {
        self.prompts_limit
            .map(|limit| limit.saturating_sub(self.prompts_used))
    }

    pub fn can_run_prompt(&self) -> bool {
        self.remaining() != Some(0)
    }
}

/// Partial profile update; `None` fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfilePatch {
    pub name: Option<String>,
    pub email: Option<String>,
    pub profession: Option<String>,
    pub is_pro: Option<bool>,
    pub prompts_used: Option<u32>,
    /// `Some(None)` lifts the limit.
    pub prompts_limit: Option<Option<u32>>,
}

impl ProfilePatch {
    /// Upgrade to PRO with unlimited prompts.
    pub fn upgrade() -> Self {
        Self {
            is_pro: Some(true),
            prompts_limit: Some(None),
            ..Self::default()
        }
    }

    pub fn usage(prompts_used: u32) -> Self {
        Self {
            prompts_used: Some(prompts_used),
            ..Self::default()
        }
    }

    pub fn apply(&self, profile: &mut Profile) {
        if let Some(name) = &self.name {
            profile.name = name.clone();
        }
        if let Some(email) = &self.email {
            profile.email = email.clone();
        }
        if let Some(profession) = &self.profession {
            profile.profession = profession.clone();
        }
        if let Some(is_pro) = self.is_pro {
            profile.is_pro = is_pro;
        }
        if let Some(used) = self.prompts_used {
            profile.prompts_used = used;
        }
        if let Some(limit) = self.prompts_limit {
            profile.prompts_limit = limit;
        }
    }
}

/// Attributes collected at sign-up besides the credentials.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignUpAttributes {
    pub name: String,
    pub profession: String,
}

/// An authenticated identity as reported by the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    pub id: String,
}

/// Identity/profile backend.
#[async_trait]
pub trait IdentityStore: Send + Sync {
    /// Store name for logging.
    fn name(&self) -> &'static str;

    /// The currently authenticated user, if a valid session exists.
    async fn get_session(&self) -> Result<Option<AuthUser>>;

    /// Create an account and its profile.
    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        attrs: &SignUpAttributes,
    ) -> Result<AuthUser>;

    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthUser>;

    async fn sign_out(&self) -> Result<()>;

    /// `Ok(None)` when the profile does not exist.
    async fn get_profile(&self, id: &str) -> Result<Option<Profile>>;

    /// Apply `patch` and return the stored profile.
    async fn update_profile(&self, id: &str, patch: &ProfilePatch) -> Result<Profile>;
}

#[async_trait]
impl<T: IdentityStore + ?Sized> IdentityStore for Arc<T> {
    fn name(&self) -> &'static str {
        self.as_ref().name()
    }

    async fn get_session(&self) -> Result<Option<AuthUser>> {
        self.as_ref().get_session().await
    }

    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        attrs: &SignUpAttributes,
    ) -> Result<AuthUser> {
        self.as_ref().sign_up(email, password, attrs).await
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthUser> {
        self.as_ref().sign_in(email, password).await
    }

    async fn sign_out(&self) -> Result<()> {
        self.as_ref().sign_out().await
    }

    async fn get_profile(&self, id: &str) -> Result<Option<Profile>> {
        self.as_ref().get_profile(id).await
    }

    async fn update_profile(&self, id: &str, patch: &ProfilePatch) -> Result<Profile> {
        self.as_ref().update_profile(id, patch).await
    }
}

/// Pick the identity store for `config`: demo unless a real backend is set.
pub fn from_config(
    config: &Config,
    device: Arc<dyn DevicePersistence>,
) -> Result<Arc<dyn IdentityStore>> {
    let identity: &IdentityConfig = &config.identity;
    match (&identity.url, &identity.anon_key) {
        (Some(url), Some(key)) if !identity.is_demo() => {
            info!(url = %url, "using remote identity store");
            Ok(Arc::new(RemoteIdentityStore::new(
                url.clone(),
                key.clone(),
                config.free_prompt_limit,
                device,
            )?))
        }
        _ => {
            info!("demo mode: using offline identity store");
            Ok(Arc::new(DemoIdentityStore::new(
                device,
                config.free_prompt_limit,
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::MemoryStore;

    #[test]
    fn test_free_profile_quota() {
        let mut profile = Profile::free("u1", "Ana", "ana@example.com", "Lawyer", 10);
        assert_eq!(profile.remaining(), Some(10));
        assert!(profile.can_run_prompt());

        profile.prompts_used = 10;
        assert_eq!(profile.remaining(), Some(0));
        assert!(!profile.can_run_prompt());

        // Over-use never underflows.
        profile.prompts_used = 12;
        assert_eq!(profile.remaining(), Some(0));
    }

    #[test]
    fn test_upgrade_patch_lifts_limit() {
        let mut profile = Profile::free("u1", "Ana", "ana@example.com", "Lawyer", 10);
        profile.prompts_used = 10;
        ProfilePatch::upgrade().apply(&mut profile);
        assert!(profile.is_pro);
        assert_eq!(profile.prompts_limit, None);
        assert_eq!(profile.remaining(), None);
        assert!(profile.can_run_prompt());
        assert_eq!(profile.prompts_used, 10);
    }

    #[test]
    fn test_patch_leaves_unset_fields() {
        let mut profile = Profile::free("u1", "Ana", "ana@example.com", "Lawyer", 10);
        let patch = ProfilePatch {
            profession: Some("Coach".to_string()),
            ..Default::default()
        };
        patch.apply(&mut profile);
        assert_eq!(profile.profession, "Coach");
        assert_eq!(profile.name, "Ana");
        assert_eq!(profile.prompts_limit, Some(10));
    }

    #[test]
    fn test_profile_json_shape() {
        let profile = Profile::free("u1", "Ana", "ana@example.com", "Lawyer", 10);
        let json = serde_json::to_value(&profile).unwrap();
        assert_eq!(json["isPro"], false);
        assert_eq!(json["promptsUsed"], 0);
        assert_eq!(json["promptsLimit"], 10);
    }

    #[test]
    fn test_from_config_defaults_to_demo() {
        let store = from_config(&Config::default(), Arc::new(MemoryStore::new())).unwrap();
        assert_eq!(store.name(), "demo");
    }

    #[test]
    fn test_from_config_remote_when_configured() {
        let mut config = Config::default();
        config.identity.url = Some("https://abc.supabase.co".to_string());
        config.identity.anon_key = Some("anon".to_string());
        let store = from_config(&config, Arc::new(MemoryStore::new())).unwrap();
        assert_eq!(store.name(), "remote");
    }
}
