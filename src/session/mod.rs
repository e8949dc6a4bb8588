//! Session and navigation controller.
//!
//! Tracks which user is active (none, device-local, or authenticated) and
//! which screen is displayed, and guards protected screens behind an
//! authentication prompt.

mod controller;
mod model;

#[cfg(test)]
mod tests;

pub use controller::{NavigationSnapshot, SessionController, SessionSettings, UpgradeOutcome};
pub use model::{
    AuthMode, AuthPrompt, NavOutcome, NavigationState, OnboardingData, Phase, Screen, Session,
    SignInForm, SignUpForm, View,
};
