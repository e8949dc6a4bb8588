//! REST client for a hosted auth + row store backend.
//!
//! Auth goes through `/auth/v1/*`; profiles are rows of the `users` table
//! under `/rest/v1/users`. The access token is kept in device persistence so
//! a later process can restore the session.

use super::{AuthUser, IdentityStore, Profile, ProfilePatch, SignUpAttributes};
use crate::error::{PromptlyError, Result};
use crate::persistence::{DevicePersistence, get_json, keys, set_json};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

const TIMEOUT_SECS: u64 = 30;

/// `prompts_limit` value the backend uses for "unlimited".
const UNLIMITED: i64 = -1;

pub struct RemoteIdentityStore {
    client: Client,
    base_url: String,
    anon_key: String,
    free_limit: u32,
    device: Arc<dyn DevicePersistence>,
}

/// Persisted under `keys::REMOTE_SESSION`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct StoredSession {
    access_token: String,
    user_id: String,
}

#[derive(Debug, Deserialize)]
struct AuthReply {
    #[serde(default)]
    access_token: Option<String>,
    #[serde(default)]
    user: Option<UserRef>,
    /// Sign-up without auto-confirm returns the user object itself.
    #[serde(default)]
    id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct UserRef {
    id: String,
}

/// Row of the `users` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct UserRow {
    id: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    email: String,
    #[serde(default)]
    profession: String,
    #[serde(default)]
    is_pro: bool,
    #[serde(default)]
    prompts_used: i64,
    #[serde(default)]
    prompts_limit: Option<i64>,
}

impl UserRow {
    fn from_profile(profile: &Profile) -> Self {
        Self {
            id: profile.id.clone(),
            name: profile.name.clone(),
            email: profile.email.clone(),
            profession: profile.profession.clone(),
            is_pro: profile.is_pro,
            prompts_used: i64::from(profile.prompts_used),
            prompts_limit: Some(limit_to_row(profile.prompts_limit)),
        }
    }

    fn into_profile(self) -> Profile {
        Profile {
            id: self.id,
            name: self.name,
            email: self.email,
            profession: self.profession,
            is_pro: self.is_pro,
            prompts_used: u32::try_from(self.prompts_used.max(0)).unwrap_or(u32::MAX),
            prompts_limit: match self.prompts_limit {
                Some(limit) if limit >= 0 => Some(u32::try_from(limit).unwrap_or(u32::MAX)),
                _ => None,
            },
        }
    }
}

fn limit_to_row(limit: Option<u32>) -> i64 {
    limit.map(i64::from).unwrap_or(UNLIMITED)
}

/// Column updates for a `ProfilePatch`; unset fields are omitted.
fn patch_body(patch: &ProfilePatch) -> serde_json::Value {
    let mut body = serde_json::Map::new();
    if let Some(name) = &patch.name {
        body.insert("name".into(), json!(name));
    }
    if let Some(email) = &patch.email {
        body.insert("email".into(), json!(email));
    }
    if let Some(profession) = &patch.profession {
        body.insert("profession".into(), json!(profession));
    }
    if let Some(is_pro) = patch.is_pro {
        body.insert("is_pro".into(), json!(is_pro));
    }
    if let Some(used) = patch.prompts_used {
        body.insert("prompts_used".into(), json!(used));
    }
    if let Some(limit) = patch.prompts_limit {
        body.insert("prompts_limit".into(), json!(limit_to_row(limit)));
    }
    serde_json::Value::Object(body)
}

fn identity_error(context: &str, err: impl std::fmt::Display) -> PromptlyError {
    PromptlyError::IdentityError(format!("{}: {}", context, err))
}

impl RemoteIdentityStore {
    pub fn new(
        base_url: String,
        anon_key: String,
        free_limit: u32,
        device: Arc<dyn DevicePersistence>,
    ) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(TIMEOUT_SECS))
            .build()
            .map_err(|e| identity_error("failed to build HTTP client", e))?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            anon_key,
            free_limit,
            device,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn stored_session(&self) -> Result<Option<StoredSession>> {
        get_json(self.device.as_ref(), keys::REMOTE_SESSION)
    }

    /// Bearer token for row access: the user's token when signed in.
    fn bearer(&self) -> Result<String> {
        Ok(self
            .stored_session()?
            .map(|s| s.access_token)
            .unwrap_or_else(|| self.anon_key.clone()))
    }

    fn authorized(&self, builder: RequestBuilder, token: &str) -> RequestBuilder {
        builder.header("apikey", &self.anon_key).bearer_auth(token)
    }

    async fn send(&self, builder: RequestBuilder, context: &str) -> Result<Response> {
        let response = builder
            .send()
            .await
            .map_err(|e| identity_error(context, e))?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        let detail = serde_json::from_str::<serde_json::Value>(&body)
            .ok()
            .and_then(|v| {
                ["error_description", "msg", "message", "error"]
                    .iter()
                    .find_map(|k| v.get(*k).and_then(|m| m.as_str()).map(str::to_string))
            })
            .unwrap_or_else(|| body.chars().take(200).collect());
        Err(PromptlyError::IdentityError(format!(
            "{} ({}): {}",
            context, status, detail
        )))
    }

    fn remember(&self, reply: AuthReply, context: &str) -> Result<AuthUser> {
        let id = reply
            .user
            .map(|u| u.id)
            .or(reply.id)
            .ok_or_else(|| identity_error(context, "reply has no user id"))?;
        match reply.access_token {
            Some(access_token) => set_json(
                self.device.as_ref(),
                keys::REMOTE_SESSION,
                &StoredSession {
                    access_token,
                    user_id: id.clone(),
                },
            )?,
            None => debug!(id = %id, "no access token returned, session not stored"),
        }
        Ok(AuthUser { id })
    }

    async fn insert_profile(&self, profile: &Profile) -> Result<()> {
        let token = self.bearer()?;
        let request = self
            .authorized(self.client.post(self.url("/rest/v1/users")), &token)
            .header("Prefer", "return=minimal")
            .json(&UserRow::from_profile(profile));
        self.send(request, "profile insert failed").await?;
        Ok(())
    }
}

#[async_trait]
impl IdentityStore for RemoteIdentityStore {
    fn name(&self) -> &'static str {
        "remote"
    }

    async fn get_session(&self) -> Result<Option<AuthUser>> {
        let Some(stored) = self.stored_session()? else {
            return Ok(None);
        };
        let request = self.authorized(
            self.client.get(self.url("/auth/v1/user")),
            &stored.access_token,
        );
        let response = request
            .send()
            .await
            .map_err(|e| identity_error("session check failed", e))?;

        if response.status() == reqwest::StatusCode::UNAUTHORIZED
            || response.status() == reqwest::StatusCode::FORBIDDEN
        {
            debug!("stored session rejected, clearing it");
            self.device.remove(keys::REMOTE_SESSION)?;
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(PromptlyError::IdentityError(format!(
                "session check failed ({})",
                response.status()
            )));
        }
        let user: UserRef = response
            .json()
            .await
            .map_err(|e| identity_error("invalid session reply", e))?;
        Ok(Some(AuthUser { id: user.id }))
    }

    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        attrs: &SignUpAttributes,
    ) -> Result<AuthUser> {
        let request = self
            .client
            .post(self.url("/auth/v1/signup"))
            .header("apikey", &self.anon_key)
            .json(&json!({
                "email": email,
                "password": password,
                "data": { "name": attrs.name, "profession": attrs.profession },
            }));
        let reply: AuthReply = self
            .send(request, "sign-up failed")
            .await?
            .json()
            .await
            .map_err(|e| identity_error("invalid sign-up reply", e))?;
        let user = self.remember(reply, "sign-up failed")?;

        let profile = Profile::free(
            user.id.clone(),
            attrs.name.clone(),
            email,
            attrs.profession.clone(),
            self.free_limit,
        );
        // The account exists either way; a missing row surfaces at get_profile.
        if let Err(err) = self.insert_profile(&profile).await {
            warn!(id = %user.id, error = %err, "failed to create profile row");
        }
        Ok(user)
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthUser> {
        let request = self
            .client
            .post(self.url("/auth/v1/token?grant_type=password"))
            .header("apikey", &self.anon_key)
            .json(&json!({ "email": email, "password": password }));
        let reply: AuthReply = self
            .send(request, "sign-in failed")
            .await?
            .json()
            .await
            .map_err(|e| identity_error("invalid sign-in reply", e))?;
        self.remember(reply, "sign-in failed")
    }

    async fn sign_out(&self) -> Result<()> {
        let Some(stored) = self.stored_session()? else {
            return Ok(());
        };
        let request = self.authorized(
            self.client.post(self.url("/auth/v1/logout")),
            &stored.access_token,
        );
        self.send(request, "sign-out failed").await?;
        self.device.remove(keys::REMOTE_SESSION)
    }

    async fn get_profile(&self, id: &str) -> Result<Option<Profile>> {
        let token = self.bearer()?;
        let request = self
            .authorized(self.client.get(self.url("/rest/v1/users")), &token)
            .query(&[("id", format!("eq.{}", id)), ("select", "*".to_string())]);
        let rows: Vec<UserRow> = self
            .send(request, "profile lookup failed")
            .await?
            .json()
            .await
            .map_err(|e| identity_error("invalid profile reply", e))?;
        Ok(rows.into_iter().next().map(UserRow::into_profile))
    }

    async fn update_profile(&self, id: &str, patch: &ProfilePatch) -> Result<Profile> {
        let token = self.bearer()?;
        let request = self
            .authorized(self.client.patch(self.url("/rest/v1/users")), &token)
            .query(&[("id", format!("eq.{}", id))])
            .header("Prefer", "return=representation")
            .json(&patch_body(patch));
        let rows: Vec<UserRow> = self
            .send(request, "profile update failed")
            .await?
            .json()
            .await
            .map_err(|e| identity_error("invalid profile reply", e))?;
        rows.into_iter()
            .next()
            .map(UserRow::into_profile)
            .ok_or_else(|| PromptlyError::IdentityError(format!("no profile for '{}'", id)))
    }
}
