//! Session and navigation state types.

use crate::error::{PromptlyError, Result};
use crate::identity::Profile;
use crate::template::Template;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Every screen of the client.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "kebab-case")]
pub enum Screen {
    #[default]
    Home,
    Library,
    CreatePrompt,
    ExecutePrompt,
    MyPrompts,
    Community,
    Account,
    Chat,
}

impl Screen {
    pub const ALL: [Screen; 8] = [
        Screen::Home,
        Screen::Library,
        Screen::CreatePrompt,
        Screen::ExecutePrompt,
        Screen::MyPrompts,
        Screen::Community,
        Screen::Account,
        Screen::Chat,
    ];

    /// Screens that need an onboarded or signed-in user.
    pub fn is_protected(self) -> bool {
        matches!(
            self,
            Screen::CreatePrompt | Screen::MyPrompts | Screen::Account | Screen::Chat
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Screen::Home => "home",
            Screen::Library => "library",
            Screen::CreatePrompt => "create-prompt",
            Screen::ExecutePrompt => "execute-prompt",
            Screen::MyPrompts => "my-prompts",
            Screen::Community => "community",
            Screen::Account => "account",
            Screen::Chat => "chat",
        }
    }
}

impl fmt::Display for Screen {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Who is using the client. Exactly one at a time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Session {
    #[default]
    NoUser,
    /// Anonymous profile created by onboarding, kept on this device.
    LocalUser(Profile),
    /// Authenticated profile backed by the identity store.
    RemoteUser(Profile),
}

impl Session {
    pub fn profile(&self) -> Option<&Profile> {
        match self {
            Session::NoUser => None,
            Session::LocalUser(p) | Session::RemoteUser(p) => Some(p),
        }
    }

    pub fn user_id(&self) -> Option<&str> {
        self.profile().map(|p| p.id.as_str())
    }

    pub fn is_signed_out(&self) -> bool {
        matches!(self, Session::NoUser)
    }

    pub fn is_remote(&self) -> bool {
        matches!(self, Session::RemoteUser(_))
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Session::NoUser => "none",
            Session::LocalUser(_) => "local",
            Session::RemoteUser(_) => "remote",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NavigationState {
    pub current_screen: Screen,
    /// Prompt picked for execution; cleared when leaving the execute screen.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected_template: Option<Template>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AuthMode {
    SignIn,
    SignUp,
}

/// An open request for the user to authenticate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthPrompt {
    pub mode: AuthMode,
    /// Onboarding answers to pre-fill the sign-up form with.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prefill: Option<OnboardingData>,
}

impl AuthPrompt {
    pub fn sign_in() -> Self {
        Self {
            mode: AuthMode::SignIn,
            prefill: None,
        }
    }

    pub fn sign_up(prefill: Option<OnboardingData>) -> Self {
        Self {
            mode: AuthMode::SignUp,
            prefill,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// The startup session check has not resolved yet.
    Loading,
    Ready,
}

/// What the client should display.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Loading,
    /// A guest on the home screen is shown onboarding.
    Onboarding,
    Screen(Screen),
}

/// Result of a navigation request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavOutcome {
    Navigated(Screen),
    /// The screen needs a user; a sign-up prompt was opened instead.
    AuthPromptOpened,
}

/// Answers collected by onboarding.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OnboardingData {
    pub name: String,
    #[serde(default)]
    pub email: String,
    pub profession: String,
}

impl OnboardingData {
    pub fn validate(&self) -> Result<()> {
        require_non_blank("name", &self.name)?;
        require_non_blank("profession", &self.profession)?;
        let email = self.email.trim();
        if !email.is_empty() && !is_plausible_email(email) {
            return Err(invalid(format!("'{}' is not a valid email address", email)));
        }
        Ok(())
    }
}

/// Sign-up form input.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SignUpForm {
    pub name: String,
    pub email: String,
    pub profession: String,
    pub password: String,
    pub confirm_password: String,
}

impl SignUpForm {
    pub fn validate(&self, min_password_length: usize) -> Result<()> {
        require_non_blank("name", &self.name)?;
        require_non_blank("profession", &self.profession)?;
        if !is_plausible_email(self.email.trim()) {
            return Err(invalid(format!(
                "'{}' is not a valid email address",
                self.email.trim()
            )));
        }
        if self.password.chars().count() < min_password_length {
            return Err(invalid(format!(
                "password must be at least {} characters",
                min_password_length
            )));
        }
        if self.password != self.confirm_password {
            return Err(invalid("passwords do not match"));
        }
        Ok(())
    }
}

/// Sign-in form input.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SignInForm {
    pub email: String,
    pub password: String,
}

impl SignInForm {
    pub fn validate(&self) -> Result<()> {
        require_non_blank("email", &self.email)?;
        if self.password.is_empty() {
            return Err(invalid("password is required"));
        }
        Ok(())
    }
}

fn invalid(message: impl Into<String>) -> PromptlyError {
    PromptlyError::ValidationError(message.into())
}

fn require_non_blank(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(invalid(format!("{} is required", field)));
    }
    Ok(())
}

/// Text on both sides of a single `@`.
fn is_plausible_email(email: &str) -> bool {
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty() && !domain.is_empty() && !domain.contains('@')
        }
        None => false,
    }
}
