//! Account commands: onboarding, sign-up/in/out, upgrade and `whoami`.

use super::App;
use crate::cli::{OnboardArgs, SigninArgs, SignupArgs};
use promptly::error::{PromptlyError, Result};
use promptly::events::{Event, EventAction};
use promptly::identity::Profile;
use promptly::persistence::{DevicePersistence, keys};
use promptly::session::{OnboardingData, SignInForm, SignUpForm, UpgradeOutcome};
use serde_json::json;

/// Execute the `promptly onboard` command.
///
/// With `--sign-up` or `--sign-in` the answers are carried into an auth
/// prompt instead of creating a local profile.
pub fn cmd_onboard(app: &mut App, args: OnboardArgs) -> Result<()> {
    let data = OnboardingData {
        name: args.name,
        email: args.email,
        profession: args.profession,
    };

    if args.sign_in {
        app.session.request_sign_in();
        println!("Sign in with `promptly signin --email <email>`.");
        return Ok(());
    }
    if args.sign_up {
        data.validate()?;
        app.session.request_sign_up(Some(data));
        println!("Create your account with `promptly signup --email <email>`.");
        return Ok(());
    }

    let profile = app.session.complete_onboarding(&data)?;
    app.record(Event::new(EventAction::Onboard, Some(profile.id.as_str())));

    println!("Welcome, {}!", profile.name);
    println!();
    print_profile(&profile, "local");
    Ok(())
}

/// Execute the `promptly signup` command.
///
/// Name and profession fall back to the answers of an open sign-up prompt.
pub async fn cmd_signup(app: &mut App, args: SignupArgs) -> Result<()> {
    let prefill = app
        .session
        .auth_prompt()
        .and_then(|prompt| prompt.prefill.clone())
        .unwrap_or_default();

    let form = SignUpForm {
        name: args.name.unwrap_or(prefill.name),
        email: args.email,
        profession: args.profession.unwrap_or(prefill.profession),
        confirm_password: args.confirm_password.unwrap_or_else(|| args.password.clone()),
        password: args.password,
    };

    let profile = app.session.sign_up(&form).await?;
    app.record(Event::new(EventAction::SignUp, Some(profile.id.as_str())));

    println!("Account created for {}.", profile.email);
    println!();
    print_profile(&profile, "remote");
    Ok(())
}

/// Execute the `promptly signin` command.
pub async fn cmd_signin(app: &mut App, args: SigninArgs) -> Result<()> {
    let form = SignInForm {
        email: args.email,
        password: args.password,
    };
    let profile = app.session.sign_in(&form).await?;
    app.record(Event::new(EventAction::SignIn, Some(profile.id.as_str())));

    println!("Signed in as {}.", profile.email);
    println!();
    print_profile(&profile, "remote");
    Ok(())
}

/// Execute the `promptly signout` command.
pub async fn cmd_signout(app: &mut App) -> Result<()> {
    let user_id = app.user_id().map(str::to_string);
    app.session.sign_out().await?;
    // The conversation belongs to the account that just left.
    app.device.remove(keys::CHAT)?;
    app.record(Event::new(EventAction::SignOut, user_id.as_deref()));

    println!("Signed out.");
    Ok(())
}

/// Execute the `promptly upgrade` command.
pub async fn cmd_upgrade(app: &mut App) -> Result<()> {
    match app.session.upgrade().await? {
        UpgradeOutcome::Upgraded(profile) => {
            app.record(
                Event::new(EventAction::Upgrade, Some(profile.id.as_str()))
                    .with_details(json!({ "is_pro": profile.is_pro })),
            );
            println!("{} is now on PRO. Prompt runs are unlimited.", profile.email);
        }
        UpgradeOutcome::AuthPromptOpened => {
            println!("PRO needs an account.");
            println!("Create one with `promptly signup --email <email>`.");
        }
    }
    Ok(())
}

/// Execute the `promptly whoami` command.
pub fn cmd_whoami(app: &App) -> Result<()> {
    let session = app.session.session();
    match session.profile() {
        Some(profile) => {
            print_profile(profile, session.kind());
            Ok(())
        }
        None => Err(PromptlyError::AuthRequired(
            "no user on this device; run `promptly onboard` or `promptly signin`".to_string(),
        )),
    }
}

/// `used/limit`, or `unlimited` for PRO profiles.
pub(super) fn usage_line(profile: &Profile) -> String {
    match profile.prompts_limit {
        Some(limit) => format!("{}/{}", profile.prompts_used, limit),
        None => format!("{} (unlimited)", profile.prompts_used),
    }
}

fn print_profile(profile: &Profile, kind: &str) {
    println!("  id:         {}", profile.id);
    println!("  name:       {}", profile.name);
    if !profile.email.is_empty() {
        println!("  email:      {}", profile.email);
    }
    println!("  profession: {}", profile.profession);
    println!("  account:    {}{}", kind, if profile.is_pro { " (PRO)" } else { "" });
    println!("  prompts:    {}", usage_line(profile));
}
