//! Offline identity store used when no backend is configured.
//!
//! Accepts any credentials. Accounts and the signed-in account id live in
//! device persistence, so a demo session survives restarts.

use super::{AuthUser, IdentityStore, Profile, ProfilePatch, SignUpAttributes};
use crate::error::{PromptlyError, Result};
use crate::persistence::{DevicePersistence, get_json, keys, set_json};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use tracing::debug;

/// Usage already recorded on accounts created implicitly at sign-in.
const SIGN_IN_PROMPTS_USED: u32 = 3;
const SIGN_IN_NAME: &str = "Demo User";
const SIGN_IN_PROFESSION: &str = "HR Manager";

type Accounts = BTreeMap<String, Profile>;

pub struct DemoIdentityStore {
    device: Arc<dyn DevicePersistence>,
    free_limit: u32,
    lock: Mutex<()>,
}

impl DemoIdentityStore {
    pub fn new(device: Arc<dyn DevicePersistence>, free_limit: u32) -> Self {
        Self {
            device,
            free_limit,
            lock: Mutex::new(()),
        }
    }

    fn accounts(&self) -> Result<Accounts> {
        Ok(get_json(self.device.as_ref(), keys::DEMO_ACCOUNTS)?.unwrap_or_default())
    }

    fn save_accounts(&self, accounts: &Accounts) -> Result<()> {
        set_json(self.device.as_ref(), keys::DEMO_ACCOUNTS, accounts)
    }

    fn start_session(&self, id: &str) -> Result<AuthUser> {
        self.device.set(keys::DEMO_SESSION, id)?;
        Ok(AuthUser { id: id.to_string() })
    }

    /// `demo-user-<millis>`, bumped until unused.
    fn next_id(accounts: &Accounts) -> String {
        let mut millis = chrono::Utc::now().timestamp_millis();
        loop {
            let id = format!("demo-user-{}", millis);
            if !accounts.contains_key(&id) {
                return id;
            }
            millis += 1;
        }
    }

    fn insert(&self, accounts: &mut Accounts, mut profile: Profile) -> Result<String> {
        let id = Self::next_id(accounts);
        profile.id = id.clone();
        accounts.insert(id.clone(), profile);
        self.save_accounts(accounts)?;
        Ok(id)
    }
}

fn find_by_email<'a>(accounts: &'a Accounts, email: &str) -> Option<&'a Profile> {
    accounts
        .values()
        .find(|p| p.email.eq_ignore_ascii_case(email.trim()))
}

#[async_trait]
impl IdentityStore for DemoIdentityStore {
    fn name(&self) -> &'static str {
        "demo"
    }

    async fn get_session(&self) -> Result<Option<AuthUser>> {
        let _guard = self.lock.lock().unwrap_or_else(|p| p.into_inner());
        let Some(id) = self.device.get(keys::DEMO_SESSION)? else {
            return Ok(None);
        };
        if self.accounts()?.contains_key(&id) {
            Ok(Some(AuthUser { id }))
        } else {
            debug!(id = %id, "dropping demo session for unknown account");
            self.device.remove(keys::DEMO_SESSION)?;
            Ok(None)
        }
    }

    async fn sign_up(
        &self,
        email: &str,
        _password: &str,
        attrs: &SignUpAttributes,
    ) -> Result<AuthUser> {
        let _guard = self.lock.lock().unwrap_or_else(|p| p.into_inner());
        let mut accounts = self.accounts()?;
        let profile = Profile::free(
            "",
            attrs.name.trim(),
            email.trim(),
            attrs.profession.trim(),
            self.free_limit,
        );
        let id = self.insert(&mut accounts, profile)?;
        debug!(id = %id, "demo account created");
        self.start_session(&id)
    }

    async fn sign_in(&self, email: &str, _password: &str) -> Result<AuthUser> {
        let _guard = self.lock.lock().unwrap_or_else(|p| p.into_inner());
        let mut accounts = self.accounts()?;
        if let Some(existing) = find_by_email(&accounts, email) {
            let id = existing.id.clone();
            return self.start_session(&id);
        }

        let mut profile = Profile::free(
            "",
            SIGN_IN_NAME,
            email.trim(),
            SIGN_IN_PROFESSION,
            self.free_limit,
        );
        profile.prompts_used = SIGN_IN_PROMPTS_USED;
        let id = self.insert(&mut accounts, profile)?;
        debug!(id = %id, "demo account created at sign-in");
        self.start_session(&id)
    }

    async fn sign_out(&self) -> Result<()> {
        self.device.remove(keys::DEMO_SESSION)
    }

    async fn get_profile(&self, id: &str) -> Result<Option<Profile>> {
        let _guard = self.lock.lock().unwrap_or_else(|p| p.into_inner());
        Ok(self.accounts()?.remove(id))
    }

    async fn update_profile(&self, id: &str, patch: &ProfilePatch) -> Result<Profile> {
        let _guard = self.lock.lock().unwrap_or_else(|p| p.into_inner());
        let mut accounts = self.accounts()?;
        let profile = accounts
            .get_mut(id)
            .ok_or_else(|| PromptlyError::IdentityError(format!("no profile for '{}'", id)))?;
        patch.apply(profile);
        let updated = profile.clone();
        self.save_accounts(&accounts)?;
        Ok(updated)
    }
}
