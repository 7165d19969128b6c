//! GoTrue email/password authentication.

use std::sync::Arc;

use chrono::Utc;
use reqwest::Method;
use serde::Deserialize;
use serde_json::json;

use super::{AuthSession, SupabaseClient};
use crate::error::{GatewayError, IdentityError};
use crate::identity::{keyring_store, IdentityCallback, IdentityHub, IdentityProvider, Subscription, UserId};

const SIGNUP: &str = "auth/v1/signup";
const TOKEN: &str = "auth/v1/token";
const LOGOUT: &str = "auth/v1/logout";

const SESSION_KEY: &str = "supabase_session";

/// Result of a sign-up request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignUpOutcome {
    /// The project auto-confirms; the user is now signed in.
    SignedIn(UserId),
    /// The user must confirm their email before signing in.
    ConfirmationRequired(UserId),
}

#[derive(Deserialize)]
struct TokenUser {
    id: String,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    expires_at: Option<i64>,
    #[serde(default)]
    expires_in: Option<i64>,
    user: TokenUser,
}

impl TokenResponse {
    fn into_session(self) -> AuthSession {
        let expires_at = self
            .expires_at
            .or_else(|| self.expires_in.map(|secs| Utc::now().timestamp() + secs));
        AuthSession {
            access_token: self.access_token,
            refresh_token: self.refresh_token,
            expires_at,
            user_id: UserId::new(self.user.id),
        }
    }
}

/// Pull the human-readable message out of a GoTrue error body.
fn rejection(body: &str) -> IdentityError {
    let parsed: Option<serde_json::Value> = serde_json::from_str(body).ok();
    let message = parsed
        .as_ref()
        .and_then(|v| {
            ["error_description", "msg", "message", "error"]
                .iter()
                .find_map(|k| v.get(*k).and_then(|m| m.as_str()))
        })
        .map(str::to_string)
        .unwrap_or_else(|| body.to_string());
    IdentityError::Rejected(message)
}

/// Map 4xx answers to a rejection and everything else to a gateway error.
fn auth_error(err: GatewayError) -> IdentityError {
    match err {
        GatewayError::Status { status, ref body, .. } if (400..500).contains(&status) => {
            rejection(body)
        }
        other => IdentityError::Gateway(other),
    }
}

/// Identity provider backed by a Supabase project.
pub struct SupabaseAuth {
    client: Arc<SupabaseClient>,
    hub: IdentityHub,
    remember: bool,
}

impl SupabaseAuth {
    /// `remember` keeps the session in the OS keyring between runs.
    pub fn new(client: Arc<SupabaseClient>, remember: bool) -> Self {
        Self {
            client,
            hub: IdentityHub::new(),
            remember,
        }
    }

    pub fn session(&self) -> Option<AuthSession> {
        self.client.session()
    }

    fn install(&self, session: AuthSession) -> Result<UserId, IdentityError> {
        let user = session.user_id.clone();
        if self.remember {
            let raw = serde_json::to_string(&session)
                .map_err(|e| IdentityError::CredentialStore(e.to_string()))?;
            keyring_store::set(SESSION_KEY, &raw)?;
        }
        self.client.set_session(Some(session));
        self.hub.set(Some(user.clone()));
        Ok(user)
    }

    fn clear(&self) -> Result<(), IdentityError> {
        self.client.set_session(None);
        self.hub.set(None);
        if self.remember {
            keyring_store::delete(SESSION_KEY)?;
        }
        Ok(())
    }

    /// Create an account. `name` travels as user metadata so the backend
    /// can seed the profile row.
    pub async fn sign_up(
        &self,
        email: &str,
        password: &str,
        name: &str,
    ) -> Result<SignUpOutcome, IdentityError> {
        let url = self.client.endpoint(SIGNUP)?;
        let req = self.client.request(Method::POST, url).json(&json!({
            "email": email,
            "password": password,
            "data": { "name": name.trim() },
        }));
        let resp = self.client.send(req, SIGNUP).await.map_err(auth_error)?;
        let body: serde_json::Value = SupabaseClient::json(resp, SIGNUP).await?;

        if body.get("access_token").is_some() {
            let token: TokenResponse = serde_json::from_value(body).map_err(|e| {
                GatewayError::Decode {
                    endpoint: SIGNUP.to_string(),
                    message: e.to_string(),
                }
            })?;
            let user = self.install(token.into_session())?;
            tracing::info!(user = %user, "signed up");
            return Ok(SignUpOutcome::SignedIn(user));
        }

        let id = body
            .get("id")
            .or_else(|| body.get("user").and_then(|u| u.get("id")))
            .and_then(|v| v.as_str())
            .ok_or_else(|| GatewayError::Decode {
                endpoint: SIGNUP.to_string(),
                message: "sign-up response has no user id".to_string(),
            })?;
        tracing::info!(user = id, "sign-up awaiting email confirmation");
        Ok(SignUpOutcome::ConfirmationRequired(UserId::new(id)))
    }

    pub async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<UserId, IdentityError> {
        let mut url = self.client.endpoint(TOKEN)?;
        url.query_pairs_mut().append_pair("grant_type", "password");
        let req = self
            .client
            .request(Method::POST, url)
            .json(&json!({ "email": email, "password": password }));
        let resp = self.client.send(req, TOKEN).await.map_err(auth_error)?;
        let token: TokenResponse = SupabaseClient::json(resp, TOKEN).await?;
        let user = self.install(token.into_session())?;
        tracing::info!(user = %user, "signed in");
        Ok(user)
    }

    /// Exchange the refresh token for a fresh session.
    pub async fn refresh(&self) -> Result<UserId, IdentityError> {
        let refresh_token = self
            .session()
            .and_then(|s| s.refresh_token)
            .ok_or(IdentityError::NotSignedIn)?;
        let mut url = self.client.endpoint(TOKEN)?;
        url.query_pairs_mut().append_pair("grant_type", "refresh_token");
        let req = self
            .client
            .request(Method::POST, url)
            .json(&json!({ "refresh_token": refresh_token }));
        let resp = self.client.send(req, TOKEN).await.map_err(auth_error)?;
        let token: TokenResponse = SupabaseClient::json(resp, TOKEN).await?;
        self.install(token.into_session())
    }

    /// Revoke the session server-side and forget it locally.
    ///
    /// The local session is cleared even when the revoke call fails.
    pub async fn sign_out(&self) -> Result<(), IdentityError> {
        if self.session().is_some() {
            let url = self.client.endpoint(LOGOUT)?;
            let req = self.client.request(Method::POST, url);
            if let Err(e) = self.client.send(req, LOGOUT).await {
                tracing::warn!(error = %e, "logout request failed");
            }
        }
        self.clear()?;
        tracing::info!("signed out");
        Ok(())
    }

    /// Reinstate the session saved in the keyring, refreshing it if expired.
    pub async fn restore(&self) -> Result<Option<UserId>, IdentityError> {
        if !self.remember {
            return Ok(None);
        }
        let Some(raw) = keyring_store::get(SESSION_KEY)? else {
            return Ok(None);
        };
        let session: AuthSession = match serde_json::from_str(&raw) {
            Ok(s) => s,
            Err(e) => {
                tracing::warn!(error = %e, "discarding unreadable stored session");
                keyring_store::delete(SESSION_KEY)?;
                return Ok(None);
            }
        };

        if !session.is_expired(Utc::now().timestamp()) {
            return self.install(session).map(Some);
        }

        self.client.set_session(Some(session));
        match self.refresh().await {
            Ok(user) => Ok(Some(user)),
            Err(e) => {
                tracing::warn!(error = %e, "stored session could not be refreshed");
                self.clear()?;
                Ok(None)
            }
        }
    }
}

impl IdentityProvider for SupabaseAuth {
    fn current_user_id(&self) -> Option<UserId> {
        self.hub.current_user_id()
    }

    fn on_identity_change(&self, callback: IdentityCallback) -> Subscription {
        self.hub.on_identity_change(callback)
    }
}
