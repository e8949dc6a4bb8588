//! The session/navigation state machine.
//!
//! | Event                  | From                 | To           |
//! |------------------------|----------------------|--------------|
//! | onboarding completed   | NoUser               | LocalUser    |
//! | sign-up / sign-in      | NoUser, LocalUser    | RemoteUser   |
//! | session restored       | NoUser (startup)     | RemoteUser   |
//! | sign-out               | RemoteUser           | NoUser       |
//! | upgrade                | RemoteUser           | RemoteUser   |
//!
//! Every failed transition leaves the controller unchanged.

use super::model::{
    AuthPrompt, NavOutcome, NavigationState, OnboardingData, Phase, Screen, Session, SignInForm,
    SignUpForm, View,
};
use crate::config::Config;
use crate::error::{PromptlyError, Result};
use crate::identity::{AuthUser, IdentityStore, Profile, ProfilePatch, SignUpAttributes};
use crate::persistence::{DevicePersistence, get_json, keys, set_json};
use crate::template::Template;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Limits the controller enforces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionSettings {
    pub free_prompt_limit: u32,
    pub min_password_length: usize,
}

impl SessionSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            free_prompt_limit: config.free_prompt_limit,
            min_password_length: config.min_password_length,
        }
    }
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

/// What an upgrade request did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpgradeOutcome {
    Upgraded(Profile),
    /// Only signed-in users can upgrade; a sign-up prompt was opened.
    AuthPromptOpened,
}

/// Navigation state carried between processes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NavigationSnapshot {
    #[serde(flatten)]
    pub navigation: NavigationState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth_prompt: Option<AuthPrompt>,
}

pub struct SessionController {
    identity: Arc<dyn IdentityStore>,
    device: Arc<dyn DevicePersistence>,
    settings: SessionSettings,
    phase: Phase,
    session: Session,
    navigation: NavigationState,
    auth_prompt: Option<AuthPrompt>,
}

impl SessionController {
    /// A controller in the loading phase; call [`start`](Self::start).
    pub fn new(
        identity: Arc<dyn IdentityStore>,
        device: Arc<dyn DevicePersistence>,
        settings: SessionSettings,
    ) -> Self {
        Self {
            identity,
            device,
            settings,
            phase: Phase::Loading,
            session: Session::NoUser,
            navigation: NavigationState::default(),
            auth_prompt: None,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn profile(&self) -> Option<&Profile> {
        self.session.profile()
    }

    pub fn navigation(&self) -> &NavigationState {
        &self.navigation
    }

    pub fn current_screen(&self) -> Screen {
        self.navigation.current_screen
    }

    pub fn selected_template(&self) -> Option<&Template> {
        self.navigation.selected_template.as_ref()
    }

    pub fn auth_prompt(&self) -> Option<&AuthPrompt> {
        self.auth_prompt.as_ref()
    }

    pub fn view(&self) -> View {
        match (self.phase, &self.session, self.navigation.current_screen) {
            (Phase::Loading, _, _) => View::Loading,
            (Phase::Ready, Session::NoUser, Screen::Home) => View::Onboarding,
            (Phase::Ready, _, screen) => View::Screen(screen),
        }
    }

    // ========================================================================
    // Startup
    // ========================================================================

    /// Resolve the startup session: remote first, then the device's local
    /// profile, otherwise onboarding. Collaborator failures fall through to
    /// the next source.
    pub async fn start(&mut self) {
        if let Some(profile) = self.restore_remote().await {
            info!(id = %profile.id, "remote session restored");
            self.become_remote(profile);
        } else if let Some(profile) = self.restore_local() {
            info!(id = %profile.id, "resuming local profile");
            self.session = Session::LocalUser(profile);
            self.navigation = NavigationState::default();
        } else {
            debug!("no session found, starting onboarding");
            self.session = Session::NoUser;
            self.navigation = NavigationState::default();
        }
        self.phase = Phase::Ready;
    }

    async fn restore_remote(&self) -> Option<Profile> {
        let user = match self.identity.get_session().await {
            Ok(Some(user)) => user,
            Ok(None) => return None,
            Err(err) => {
                warn!(store = self.identity.name(), error = %err, "session restore failed");
                return None;
            }
        };
        match self.identity.get_profile(&user.id).await {
            Ok(Some(profile)) => Some(profile),
            Ok(None) => {
                warn!(id = %user.id, "session has no profile, ignoring it");
                None
            }
            Err(err) => {
                warn!(id = %user.id, error = %err, "profile lookup failed");
                None
            }
        }
    }

    fn restore_local(&self) -> Option<Profile> {
        let completed = match self.device.get(keys::ONBOARDING_COMPLETED) {
            Ok(value) => value.as_deref() == Some("true"),
            Err(err) => {
                warn!(error = %err, "failed to read onboarding flag");
                false
            }
        };
        if !completed {
            return None;
        }
        match get_json::<Profile>(self.device.as_ref(), keys::LOCAL_USER) {
            Ok(profile) => profile,
            Err(err) => {
                warn!(error = %err, "ignoring unreadable local profile");
                None
            }
        }
    }

    // ========================================================================
    // Onboarding and authentication
    // ========================================================================

    /// Create the device-local profile from onboarding answers.
    pub fn complete_onboarding(&mut self, data: &OnboardingData) -> Result<Profile> {
        self.ensure_ready()?;
        if !self.session.is_signed_out() {
            return Err(PromptlyError::UserError(
                "onboarding is already complete".to_string(),
            ));
        }
        data.validate()?;

        let id = format!("temp-user-{}", chrono::Utc::now().timestamp_millis());
        let profile = Profile::free(
            id,
            data.name.trim(),
            data.email.trim(),
            data.profession.trim(),
            self.settings.free_prompt_limit,
        );
        set_json(self.device.as_ref(), keys::LOCAL_USER, &profile)?;
        self.device.set(keys::ONBOARDING_COMPLETED, "true")?;

        info!(id = %profile.id, "onboarding completed");
        self.session = Session::LocalUser(profile.clone());
        self.navigation = NavigationState::default();
        self.auth_prompt = None;
        Ok(profile)
    }

    pub fn request_sign_in(&mut self) {
        self.auth_prompt = Some(AuthPrompt::sign_in());
    }

    pub fn request_sign_up(&mut self, prefill: Option<OnboardingData>) {
        self.auth_prompt = Some(AuthPrompt::sign_up(prefill));
    }

    pub fn dismiss_auth_prompt(&mut self) {
        self.auth_prompt = None;
    }

    pub async fn sign_up(&mut self, form: &SignUpForm) -> Result<Profile> {
        self.ensure_can_authenticate()?;
        form.validate(self.settings.min_password_length)?;

        let attrs = SignUpAttributes {
            name: form.name.trim().to_string(),
            profession: form.profession.trim().to_string(),
        };
        let user = self
            .identity
            .sign_up(form.email.trim(), &form.password, &attrs)
            .await?;
        let profile = self.fetch_profile(&user).await?;
        info!(id = %profile.id, "signed up");
        self.become_remote(profile.clone());
        Ok(profile)
    }

    pub async fn sign_in(&mut self, form: &SignInForm) -> Result<Profile> {
        self.ensure_can_authenticate()?;
        form.validate()?;

        let user = self
            .identity
            .sign_in(form.email.trim(), &form.password)
            .await?;
        let profile = self.fetch_profile(&user).await?;
        info!(id = %profile.id, "signed in");
        self.become_remote(profile.clone());
        Ok(profile)
    }

    pub async fn sign_out(&mut self) -> Result<()> {
        self.ensure_ready()?;
        if !self.session.is_remote() {
            return Err(PromptlyError::UserError("not signed in".to_string()));
        }
        self.identity.sign_out().await?;

        info!("signed out");
        self.session = Session::NoUser;
        self.navigation = NavigationState::default();
        self.auth_prompt = None;
        Ok(())
    }

    /// Upgrade the signed-in user to PRO. Other sessions get a sign-up
    /// prompt, pre-filled from the local profile when there is one.
    pub async fn upgrade(&mut self) -> Result<UpgradeOutcome> {
        self.ensure_ready()?;
        let id = match &self.session {
            Session::RemoteUser(profile) => profile.id.clone(),
            Session::LocalUser(profile) => {
                let prefill = OnboardingData {
                    name: profile.name.clone(),
                    email: profile.email.clone(),
                    profession: profile.profession.clone(),
                };
                self.auth_prompt = Some(AuthPrompt::sign_up(Some(prefill)));
                return Ok(UpgradeOutcome::AuthPromptOpened);
            }
            Session::NoUser => {
                self.auth_prompt = Some(AuthPrompt::sign_up(None));
                return Ok(UpgradeOutcome::AuthPromptOpened);
            }
        };

        let profile = self
            .identity
            .update_profile(&id, &ProfilePatch::upgrade())
            .await?;
        info!(id = %profile.id, "upgraded to PRO");
        self.session = Session::RemoteUser(profile.clone());
        Ok(UpgradeOutcome::Upgraded(profile))
    }

    async fn fetch_profile(&self, user: &AuthUser) -> Result<Profile> {
        self.identity.get_profile(&user.id).await?.ok_or_else(|| {
            PromptlyError::IdentityError(format!("no profile found for '{}'", user.id))
        })
    }

    /// Switch to `profile` as the remote user and forget the local one.
    fn become_remote(&mut self, profile: Profile) {
        for key in [keys::LOCAL_USER, keys::ONBOARDING_COMPLETED] {
            if let Err(err) = self.device.remove(key) {
                warn!(key, error = %err, "failed to clear local profile record");
            }
        }
        self.session = Session::RemoteUser(profile);
        self.navigation = NavigationState::default();
        self.auth_prompt = None;
    }

    fn ensure_ready(&self) -> Result<()> {
        match self.phase {
            Phase::Ready => Ok(()),
            Phase::Loading => Err(PromptlyError::UserError(
                "session is still loading".to_string(),
            )),
        }
    }

    fn ensure_can_authenticate(&self) -> Result<()> {
        self.ensure_ready()?;
        if self.session.is_remote() {
            return Err(PromptlyError::UserError("already signed in".to_string()));
        }
        Ok(())
    }

    // ========================================================================
    // Navigation
    // ========================================================================

    /// Go to `screen`, or open a sign-up prompt if a guest asks for a
    /// protected screen.
    pub fn navigate(&mut self, screen: Screen) -> NavOutcome {
        if self.blocks(screen) {
            debug!(%screen, "protected screen, asking guest to sign up");
            self.auth_prompt = Some(AuthPrompt::sign_up(None));
            return NavOutcome::AuthPromptOpened;
        }
        self.navigation.current_screen = screen;
        if screen != Screen::ExecutePrompt {
            self.navigation.selected_template = None;
        }
        NavOutcome::Navigated(screen)
    }

    /// Pick `template` for execution and show the execute screen. Guests
    /// get a sign-up prompt and stay where they are.
    pub fn select_prompt(&mut self, template: Template) -> NavOutcome {
        if self.session.is_signed_out() {
            debug!(template = %template.id, "guest selected a prompt, asking to sign up");
            self.auth_prompt = Some(AuthPrompt::sign_up(None));
            return NavOutcome::AuthPromptOpened;
        }
        self.navigation.selected_template = Some(template);
        self.navigation.current_screen = Screen::ExecutePrompt;
        NavOutcome::Navigated(Screen::ExecutePrompt)
    }

    fn blocks(&self, screen: Screen) -> bool {
        screen.is_protected() && self.session.is_signed_out()
    }

    pub fn snapshot(&self) -> NavigationSnapshot {
        NavigationSnapshot {
            navigation: self.navigation.clone(),
            auth_prompt: self.auth_prompt.clone(),
        }
    }

    /// Apply a snapshot. A protected screen the current session may not see
    /// is replaced by home.
    pub fn restore(&mut self, snapshot: NavigationSnapshot) {
        let mut navigation = snapshot.navigation;
        if self.blocks(navigation.current_screen) {
            navigation = NavigationState::default();
        }
        if navigation.current_screen != Screen::ExecutePrompt {
            navigation.selected_template = None;
        }
        self.navigation = navigation;
        self.auth_prompt = snapshot.auth_prompt;
    }

    pub fn save_navigation(&self) -> Result<()> {
        set_json(self.device.as_ref(), keys::NAVIGATION, &self.snapshot())
    }

    /// Restore the saved snapshot, if any. Unreadable snapshots are dropped.
    pub fn load_navigation(&mut self) {
        match get_json::<NavigationSnapshot>(self.device.as_ref(), keys::NAVIGATION) {
            Ok(Some(snapshot)) => self.restore(snapshot),
            Ok(None) => {}
            Err(err) => warn!(error = %err, "ignoring unreadable navigation snapshot"),
        }
    }

    // ========================================================================
    // Usage quota
    // ========================================================================

    /// Fail unless the current user may run one more prompt.
    pub fn ensure_can_run_prompt(&self) -> Result<()> {
        let profile = self.session.profile().ok_or_else(|| {
            PromptlyError::AuthRequired("complete onboarding or sign in to run prompts".to_string())
        })?;
        match profile.prompts_limit {
            Some(limit) if profile.prompts_used >= limit => Err(PromptlyError::QuotaExceeded {
                used: profile.prompts_used,
                limit,
            }),
            _ => Ok(()),
        }
    }

    /// Count one prompt execution against the current user.
    ///
    /// Failures are logged; the in-memory count is only advanced once the
    /// new value has been stored.
    pub async fn record_usage(&mut self) {
        match &self.session {
            Session::NoUser => {}
            Session::LocalUser(profile) => {
                let mut updated = profile.clone();
                updated.prompts_used = updated.prompts_used.saturating_add(1);
                match set_json(self.device.as_ref(), keys::LOCAL_USER, &updated) {
                    Ok(()) => self.session = Session::LocalUser(updated),
                    Err(err) => warn!(error = %err, "failed to record local usage"),
                }
            }
            Session::RemoteUser(profile) => {
                let patch = ProfilePatch::usage(profile.prompts_used.saturating_add(1));
                let id = profile.id.clone();
                match self.identity.update_profile(&id, &patch).await {
                    Ok(updated) => self.session = Session::RemoteUser(updated),
                    Err(err) => warn!(id = %id, error = %err, "failed to record usage"),
                }
            }
        }
    }
}
