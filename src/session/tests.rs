//! Tests for the session controller.

use super::*;
use crate::error::{PromptlyError, Result};
use crate::identity::{
    AuthUser, DemoIdentityStore, IdentityStore, Profile, ProfilePatch, SignUpAttributes,
};
use crate::persistence::{DevicePersistence, MemoryStore, get_json, keys, set_json};
use crate::template::Template;
use async_trait::async_trait;
use std::sync::{Arc, Mutex};

/// Identity store with scripted behavior.
#[derive(Default)]
struct ScriptedIdentity {
    session: Option<AuthUser>,
    profile: Option<Profile>,
    fail_auth: bool,
    fail_update: bool,
    fail_session: bool,
    calls: Mutex<Vec<&'static str>>,
}

impl ScriptedIdentity {
    fn with_profile(profile: Profile) -> Self {
        Self {
            profile: Some(profile),
            ..Self::default()
        }
    }

    fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: &'static str) {
        self.calls.lock().unwrap().push(call);
    }

    fn auth(&self) -> Result<AuthUser> {
        if self.fail_auth {
            return Err(PromptlyError::IdentityError("invalid credentials".into()));
        }
        let id = self
            .profile
            .as_ref()
            .map(|p| p.id.clone())
            .unwrap_or_else(|| "ghost".to_string());
        Ok(AuthUser { id })
    }
}

#[async_trait]
impl IdentityStore for ScriptedIdentity {
    fn name(&self) -> &'static str {
        "scripted"
    }

    async fn get_session(&self) -> Result<Option<AuthUser>> {
        self.record("get_session");
        if self.fail_session {
            return Err(PromptlyError::IdentityError("offline".into()));
        }
        Ok(self.session.clone())
    }

    async fn sign_up(&self, _: &str, _: &str, _: &SignUpAttributes) -> Result<AuthUser> {
        self.record("sign_up");
        self.auth()
    }

    async fn sign_in(&self, _: &str, _: &str) -> Result<AuthUser> {
        self.record("sign_in");
        self.auth()
    }

    async fn sign_out(&self) -> Result<()> {
        self.record("sign_out");
        if self.fail_auth {
            return Err(PromptlyError::IdentityError("offline".into()));
        }
        Ok(())
    }

    async fn get_profile(&self, id: &str) -> Result<Option<Profile>> {
        self.record("get_profile");
        Ok(self.profile.clone().filter(|p| p.id == id))
    }

    async fn update_profile(&self, _: &str, patch: &ProfilePatch) -> Result<Profile> {
        self.record("update_profile");
        if self.fail_update {
            return Err(PromptlyError::IdentityError("update rejected".into()));
        }
        let mut profile = self.profile.clone().unwrap();
        patch.apply(&mut profile);
        Ok(profile)
    }
}

fn remote_profile() -> Profile {
    Profile::free("u-remote", "Ana", "ana@example.com", "Lawyer", 10)
}

fn onboarding() -> OnboardingData {
    OnboardingData {
        name: "Ana".into(),
        email: "ana@example.com".into(),
        profession: "Lawyer".into(),
    }
}

fn sign_up_form() -> SignUpForm {
    SignUpForm {
        name: "Ana".into(),
        email: "ana@example.com".into(),
        profession: "Lawyer".into(),
        password: "secret1".into(),
        confirm_password: "secret1".into(),
    }
}

fn sign_in_form() -> SignInForm {
    SignInForm {
        email: "ana@example.com".into(),
        password: "secret1".into(),
    }
}

fn controller_with(
    identity: Arc<dyn IdentityStore>,
    device: Arc<MemoryStore>,
) -> SessionController {
    SessionController::new(identity, device, SessionSettings::default())
}

async fn started(identity: Arc<dyn IdentityStore>, device: Arc<MemoryStore>) -> SessionController {
    let mut controller = controller_with(identity, device);
    controller.start().await;
    controller
}

async fn demo_controller() -> (Arc<MemoryStore>, SessionController) {
    let device = Arc::new(MemoryStore::new());
    let identity = Arc::new(DemoIdentityStore::new(device.clone(), 10));
    let controller = started(identity, device.clone()).await;
    (device, controller)
}

// ============================================================================
// Startup
// ============================================================================

#[tokio::test]
async fn test_loading_until_started() {
    let device = Arc::new(MemoryStore::new());
    let mut controller = controller_with(Arc::new(ScriptedIdentity::default()), device);
    assert_eq!(controller.phase(), Phase::Loading);
    assert_eq!(controller.view(), View::Loading);
    assert!(controller.complete_onboarding(&onboarding()).is_err());

    controller.start().await;
    assert_eq!(controller.phase(), Phase::Ready);
    assert_eq!(controller.view(), View::Onboarding);
    assert_eq!(controller.session(), &Session::NoUser);
}

#[tokio::test]
async fn test_startup_restores_remote_session_and_clears_local() {
    let device = Arc::new(MemoryStore::new());
    set_json(&*device, keys::LOCAL_USER, &remote_profile()).unwrap();
    device.set(keys::ONBOARDING_COMPLETED, "true").unwrap();

    let identity = ScriptedIdentity {
        session: Some(AuthUser {
            id: "u-remote".into(),
        }),
        ..ScriptedIdentity::with_profile(remote_profile())
    };
    let controller = started(Arc::new(identity), device.clone()).await;

    assert!(controller.session().is_remote());
    assert_eq!(controller.view(), View::Screen(Screen::Home));
    assert!(!device.contains(keys::LOCAL_USER));
    assert!(!device.contains(keys::ONBOARDING_COMPLETED));
}

#[tokio::test]
async fn test_startup_resumes_local_user() {
    let device = Arc::new(MemoryStore::new());
    let local = Profile::free("temp-user-1", "Ana", "", "Lawyer", 10);
    set_json(&*device, keys::LOCAL_USER, &local).unwrap();
    device.set(keys::ONBOARDING_COMPLETED, "true").unwrap();

    let controller = started(Arc::new(ScriptedIdentity::default()), device).await;
    assert_eq!(controller.session(), &Session::LocalUser(local));
    assert_eq!(controller.view(), View::Screen(Screen::Home));
}

#[tokio::test]
async fn test_startup_local_profile_needs_completed_flag() {
    let device = Arc::new(MemoryStore::new());
    let local = Profile::free("temp-user-1", "Ana", "", "Lawyer", 10);
    set_json(&*device, keys::LOCAL_USER, &local).unwrap();

    let controller = started(Arc::new(ScriptedIdentity::default()), device).await;
    assert_eq!(controller.session(), &Session::NoUser);
}

#[tokio::test]
async fn test_startup_session_check_failure_falls_back_to_onboarding() {
    let identity = ScriptedIdentity {
        fail_session: true,
        ..ScriptedIdentity::default()
    };
    let controller = started(Arc::new(identity), Arc::new(MemoryStore::new())).await;
    assert_eq!(controller.phase(), Phase::Ready);
    assert_eq!(controller.session(), &Session::NoUser);
}

#[tokio::test]
async fn test_startup_session_without_profile_is_ignored() {
    let identity = ScriptedIdentity {
        session: Some(AuthUser { id: "orphan".into() }),
        ..ScriptedIdentity::default()
    };
    let controller = started(Arc::new(identity), Arc::new(MemoryStore::new())).await;
    assert_eq!(controller.session(), &Session::NoUser);
}

// ============================================================================
// Onboarding
// ============================================================================

#[tokio::test]
async fn test_onboarding_creates_persisted_local_user() {
    let (device, mut controller) = demo_controller().await;
    let profile = controller.complete_onboarding(&onboarding()).unwrap();

    assert!(profile.id.starts_with("temp-user-"));
    assert_eq!(profile.prompts_limit, Some(10));
    assert_eq!(controller.session(), &Session::LocalUser(profile.clone()));
    assert_eq!(controller.view(), View::Screen(Screen::Home));

    let stored: Option<Profile> = get_json(&*device, keys::LOCAL_USER).unwrap();
    assert_eq!(stored, Some(profile));
    assert_eq!(
        device.get(keys::ONBOARDING_COMPLETED).unwrap().as_deref(),
        Some("true")
    );
}

#[tokio::test]
async fn test_onboarding_requires_name_and_profession() {
    let (device, mut controller) = demo_controller().await;
    let data = OnboardingData {
        name: "  ".into(),
        ..onboarding()
    };
    let err = controller.complete_onboarding(&data).unwrap_err();
    assert!(matches!(err, PromptlyError::ValidationError(_)));
    assert_eq!(controller.session(), &Session::NoUser);
    assert!(!device.contains(keys::LOCAL_USER));
}

#[tokio::test]
async fn test_onboarding_twice_is_rejected() {
    let (_device, mut controller) = demo_controller().await;
    controller.complete_onboarding(&onboarding()).unwrap();
    assert!(matches!(
        controller.complete_onboarding(&onboarding()).unwrap_err(),
        PromptlyError::UserError(_)
    ));
}

// ============================================================================
// Authentication
// ============================================================================

#[tokio::test]
async fn test_sign_up_supersedes_local_user() {
    let (device, mut controller) = demo_controller().await;
    controller.complete_onboarding(&onboarding()).unwrap();
    controller.navigate(Screen::Library);
    controller.request_sign_up(Some(onboarding()));

    let profile = controller.sign_up(&sign_up_form()).await.unwrap();

    assert!(profile.id.starts_with("demo-user-"));
    assert_eq!(controller.session(), &Session::RemoteUser(profile));
    assert_eq!(controller.current_screen(), Screen::Home);
    assert!(controller.auth_prompt().is_none());
    assert!(!device.contains(keys::LOCAL_USER));
    assert!(!device.contains(keys::ONBOARDING_COMPLETED));
}

#[tokio::test]
async fn test_sign_in_from_no_user_resets_to_home() {
    let (_device, mut controller) = demo_controller().await;
    controller.navigate(Screen::Community);
    let profile = controller.sign_in(&sign_in_form()).await.unwrap();
    assert_eq!(profile.prompts_used, 3);
    assert_eq!(controller.current_screen(), Screen::Home);
    assert!(controller.session().is_remote());
}

#[tokio::test]
async fn test_invalid_sign_up_never_reaches_store() {
    let identity = Arc::new(ScriptedIdentity::with_profile(remote_profile()));
    let mut controller = started(identity.clone(), Arc::new(MemoryStore::new())).await;

    let cases = [
        SignUpForm {
            email: "no-at-sign".into(),
            ..sign_up_form()
        },
        SignUpForm {
            email: "@example.com".into(),
            ..sign_up_form()
        },
        SignUpForm {
            password: "short".into(),
            confirm_password: "short".into(),
            ..sign_up_form()
        },
        SignUpForm {
            confirm_password: "different".into(),
            ..sign_up_form()
        },
        SignUpForm {
            profession: "".into(),
            ..sign_up_form()
        },
    ];
    for form in cases {
        let err = controller.sign_up(&form).await.unwrap_err();
        assert!(matches!(err, PromptlyError::ValidationError(_)), "{:?}", form);
    }
    assert!(!identity.calls().contains(&"sign_up"));
    assert_eq!(controller.session(), &Session::NoUser);
}

#[tokio::test]
async fn test_sign_in_requires_fields() {
    let (_device, mut controller) = demo_controller().await;
    let err = controller
        .sign_in(&SignInForm {
            email: "ana@example.com".into(),
            password: String::new(),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, PromptlyError::ValidationError(_)));
}

#[tokio::test]
async fn test_failed_sign_in_keeps_local_user() {
    let device = Arc::new(MemoryStore::new());
    let identity = ScriptedIdentity {
        fail_auth: true,
        ..ScriptedIdentity::default()
    };
    let mut controller = started(Arc::new(identity), device.clone()).await;
    let local = controller.complete_onboarding(&onboarding()).unwrap();
    controller.request_sign_in();

    let err = controller.sign_in(&sign_in_form()).await.unwrap_err();
    assert!(matches!(err, PromptlyError::IdentityError(_)));
    assert_eq!(controller.session(), &Session::LocalUser(local));
    assert!(controller.auth_prompt().is_some());
    assert!(device.contains(keys::LOCAL_USER));
}

#[tokio::test]
async fn test_sign_up_without_profile_is_error() {
    let identity = Arc::new(ScriptedIdentity::default());
    let mut controller = started(identity, Arc::new(MemoryStore::new())).await;
    let err = controller.sign_up(&sign_up_form()).await.unwrap_err();
    assert!(matches!(err, PromptlyError::IdentityError(_)));
    assert_eq!(controller.session(), &Session::NoUser);
}

#[tokio::test]
async fn test_authenticating_twice_is_rejected() {
    let (_device, mut controller) = demo_controller().await;
    controller.sign_in(&sign_in_form()).await.unwrap();
    assert!(matches!(
        controller.sign_up(&sign_up_form()).await.unwrap_err(),
        PromptlyError::UserError(_)
    ));
}

#[tokio::test]
async fn test_sign_out_returns_to_no_user() {
    let (_device, mut controller) = demo_controller().await;
    controller.sign_in(&sign_in_form()).await.unwrap();
    controller.navigate(Screen::Account);

    controller.sign_out().await.unwrap();
    assert_eq!(controller.session(), &Session::NoUser);
    assert_eq!(controller.current_screen(), Screen::Home);
    assert_eq!(controller.view(), View::Onboarding);
}

#[tokio::test]
async fn test_sign_out_failure_keeps_session() {
    let identity = ScriptedIdentity {
        session: Some(AuthUser {
            id: "u-remote".into(),
        }),
        fail_auth: true,
        ..ScriptedIdentity::with_profile(remote_profile())
    };
    let mut controller = started(Arc::new(identity), Arc::new(MemoryStore::new())).await;
    assert!(controller.sign_out().await.is_err());
    assert!(controller.session().is_remote());
}

#[tokio::test]
async fn test_sign_out_requires_remote_user() {
    let (_device, mut controller) = demo_controller().await;
    controller.complete_onboarding(&onboarding()).unwrap();
    assert!(matches!(
        controller.sign_out().await.unwrap_err(),
        PromptlyError::UserError(_)
    ));
}

// ============================================================================
// Upgrade
// ============================================================================

#[tokio::test]
async fn test_upgrade_lifts_limit() {
    let (_device, mut controller) = demo_controller().await;
    controller.sign_in(&sign_in_form()).await.unwrap();

    let outcome = controller.upgrade().await.unwrap();
    let UpgradeOutcome::Upgraded(profile) = outcome else {
        panic!("expected upgrade");
    };
    assert!(profile.is_pro);
    assert_eq!(profile.prompts_limit, None);
    assert_eq!(controller.profile(), Some(&profile));
}

#[tokio::test]
async fn test_upgrade_failure_keeps_profile() {
    let identity = ScriptedIdentity {
        session: Some(AuthUser {
            id: "u-remote".into(),
        }),
        fail_update: true,
        ..ScriptedIdentity::with_profile(remote_profile())
    };
    let mut controller = started(Arc::new(identity), Arc::new(MemoryStore::new())).await;
    assert!(controller.upgrade().await.is_err());
    assert_eq!(controller.profile(), Some(&remote_profile()));
}

#[tokio::test]
async fn test_upgrade_from_local_user_opens_prefilled_sign_up() {
    let identity = Arc::new(ScriptedIdentity::default());
    let mut controller = started(identity.clone(), Arc::new(MemoryStore::new())).await;
    controller.complete_onboarding(&onboarding()).unwrap();

    assert_eq!(
        controller.upgrade().await.unwrap(),
        UpgradeOutcome::AuthPromptOpened
    );
    let prompt = controller.auth_prompt().unwrap();
    assert_eq!(prompt.mode, AuthMode::SignUp);
    assert_eq!(prompt.prefill.as_ref().map(|p| p.name.as_str()), Some("Ana"));
    assert!(!identity.calls().contains(&"update_profile"));
}

// ============================================================================
// Navigation
// ============================================================================

#[tokio::test]
async fn test_protected_screens_open_sign_up_for_guests() {
    let (_device, mut controller) = demo_controller().await;
    controller.navigate(Screen::Library);

    for screen in Screen::ALL.into_iter().filter(|s| s.is_protected()) {
        controller.dismiss_auth_prompt();
        assert_eq!(controller.navigate(screen), NavOutcome::AuthPromptOpened);
        assert_eq!(controller.current_screen(), Screen::Library);
        assert_eq!(controller.auth_prompt().unwrap().mode, AuthMode::SignUp);
    }
}

#[tokio::test]
async fn test_public_screens_open_for_guests() {
    let (_device, mut controller) = demo_controller().await;
    for screen in [Screen::Library, Screen::Community, Screen::Home] {
        assert_eq!(controller.navigate(screen), NavOutcome::Navigated(screen));
        assert_eq!(controller.current_screen(), screen);
    }
    assert!(controller.auth_prompt().is_none());
}

#[tokio::test]
async fn test_protected_screens_open_for_local_user() {
    let (_device, mut controller) = demo_controller().await;
    controller.complete_onboarding(&onboarding()).unwrap();
    assert_eq!(
        controller.navigate(Screen::Chat),
        NavOutcome::Navigated(Screen::Chat)
    );
    assert_eq!(controller.view(), View::Screen(Screen::Chat));
}

#[tokio::test]
async fn test_select_prompt_forces_execute_screen() {
    let (_device, mut controller) = demo_controller().await;
    controller.complete_onboarding(&onboarding()).unwrap();
    let template = Template::new("t1", "Greeting", "Hello {{name}}");
    assert_eq!(
        controller.select_prompt(template.clone()),
        NavOutcome::Navigated(Screen::ExecutePrompt)
    );
    assert_eq!(controller.selected_template(), Some(&template));

    // Leaving the execute screen clears the selection.
    controller.navigate(Screen::Library);
    assert_eq!(controller.selected_template(), None);
}

#[tokio::test]
async fn test_guest_select_prompt_opens_sign_up() {
    let (_device, mut controller) = demo_controller().await;
    controller.navigate(Screen::Library);

    let outcome = controller.select_prompt(Template::new("t1", "Greeting", "Hello {{name}}"));
    assert_eq!(outcome, NavOutcome::AuthPromptOpened);
    assert_eq!(controller.current_screen(), Screen::Library);
    assert_eq!(controller.selected_template(), None);
    assert_eq!(
        controller.auth_prompt().map(|prompt| prompt.mode),
        Some(AuthMode::SignUp)
    );
}

#[tokio::test]
async fn test_navigation_snapshot_round_trip() {
    let (device, mut controller) = demo_controller().await;
    controller.complete_onboarding(&onboarding()).unwrap();
    controller.select_prompt(Template::new("t1", "Greeting", "Hello {{name}}"));
    controller.save_navigation().unwrap();

    let identity = Arc::new(DemoIdentityStore::new(device.clone(), 10));
    let mut reopened = started(identity, device).await;
    reopened.load_navigation();
    assert_eq!(reopened.current_screen(), Screen::ExecutePrompt);
    assert_eq!(reopened.selected_template().map(|t| t.id.as_str()), Some("t1"));
}

#[tokio::test]
async fn test_restore_drops_protected_screen_for_guest() {
    let (_device, mut controller) = demo_controller().await;
    let snapshot = NavigationSnapshot {
        navigation: NavigationState {
            current_screen: Screen::Account,
            selected_template: None,
        },
        auth_prompt: None,
    };
    controller.restore(snapshot);
    assert_eq!(controller.current_screen(), Screen::Home);
}

#[test]
fn test_screen_names_are_kebab_case() {
    assert_eq!(Screen::CreatePrompt.to_string(), "create-prompt");
    assert_eq!(
        serde_json::to_string(&Screen::MyPrompts).unwrap(),
        "\"my-prompts\""
    );
    let names: Vec<&str> = Screen::ALL.iter().map(|s| s.as_str()).collect();
    assert_eq!(names.len(), 8);
}

// ============================================================================
// Usage quota
// ============================================================================

#[tokio::test]
async fn test_guest_cannot_run_prompts() {
    let (_device, controller) = demo_controller().await;
    assert!(matches!(
        controller.ensure_can_run_prompt().unwrap_err(),
        PromptlyError::AuthRequired(_)
    ));
}

#[tokio::test]
async fn test_local_usage_is_persisted_until_quota() {
    let device = Arc::new(MemoryStore::new());
    let identity = Arc::new(ScriptedIdentity::default());
    let mut controller = SessionController::new(
        identity,
        device.clone(),
        SessionSettings {
            free_prompt_limit: 2,
            min_password_length: 6,
        },
    );
    controller.start().await;
    controller.complete_onboarding(&onboarding()).unwrap();

    for _ in 0..2 {
        controller.ensure_can_run_prompt().unwrap();
        controller.record_usage().await;
    }
    let err = controller.ensure_can_run_prompt().unwrap_err();
    assert!(matches!(err, PromptlyError::QuotaExceeded { used: 2, limit: 2 }));

    let stored: Profile = get_json(&*device, keys::LOCAL_USER).unwrap().unwrap();
    assert_eq!(stored.prompts_used, 2);
}

#[tokio::test]
async fn test_remote_usage_goes_through_store() {
    let (_device, mut controller) = demo_controller().await;
    controller.sign_in(&sign_in_form()).await.unwrap();
    controller.record_usage().await;
    assert_eq!(controller.profile().unwrap().prompts_used, 4);
}

#[tokio::test]
async fn test_remote_usage_failure_is_not_fatal() {
    let identity = ScriptedIdentity {
        session: Some(AuthUser {
            id: "u-remote".into(),
        }),
        fail_update: true,
        ..ScriptedIdentity::with_profile(remote_profile())
    };
    let mut controller = started(Arc::new(identity), Arc::new(MemoryStore::new())).await;
    controller.record_usage().await;
    assert_eq!(controller.profile().unwrap().prompts_used, 0);
}

#[tokio::test]
async fn test_pro_user_has_no_quota() {
    let (_device, mut controller) = demo_controller().await;
    controller.sign_in(&sign_in_form()).await.unwrap();
    controller.upgrade().await.unwrap();
    for _ in 0..20 {
        controller.record_usage().await;
    }
    controller.ensure_can_run_prompt().unwrap();
}
