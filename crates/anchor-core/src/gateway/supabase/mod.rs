//! Hosted backend: a Supabase project.
//!
//! Tables are reached through PostgREST under `/rest/v1/`, identity through
//! GoTrue under `/auth/v1/`. Both share one [`SupabaseClient`] so requests
//! carry the signed-in user's access token once there is one.

use std::sync::RwLock;

use reqwest::{Client, Method, RequestBuilder, Response};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{ConfigError, CoreError, GatewayError};
use crate::identity::UserId;
use crate::storage::BackendConfig;

mod auth;
mod rest;

pub use auth::{SignUpOutcome, SupabaseAuth};
pub use rest::SupabaseGateway;

/// Tokens for a signed-in user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthSession {
    pub access_token: String,
    pub refresh_token: Option<String>,
    /// Unix timestamp
    pub expires_at: Option<i64>,
    pub user_id: UserId,
}

impl AuthSession {
    pub fn is_expired(&self, now: i64) -> bool {
        // Refresh a minute early so a request never races the expiry.
        self.expires_at.is_some_and(|at| at - 60 <= now)
    }
}

/// Shared HTTP plumbing for the REST and auth endpoints.
pub struct SupabaseClient {
    http: Client,
    base: Url,
    anon_key: String,
    session: RwLock<Option<AuthSession>>,
}

impl SupabaseClient {
    pub fn new(base_url: &str, anon_key: &str) -> Result<Self, GatewayError> {
        let mut base = Url::parse(base_url)?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        Ok(Self {
            http: Client::new(),
            base,
            anon_key: anon_key.to_string(),
            session: RwLock::new(None),
        })
    }

    pub fn from_config(config: &BackendConfig) -> Result<Self, CoreError> {
        if config.url.trim().is_empty() {
            return Err(ConfigError::MissingKey("backend.url".to_string()).into());
        }
        if config.anon_key.trim().is_empty() {
            return Err(ConfigError::MissingKey("backend.anon_key".to_string()).into());
        }
        Ok(Self::new(config.url.trim(), config.anon_key.trim())?)
    }

    pub fn session(&self) -> Option<AuthSession> {
        self.session
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub(crate) fn set_session(&self, session: Option<AuthSession>) {
        *self.session.write().unwrap_or_else(|e| e.into_inner()) = session;
    }

    pub(crate) fn endpoint(&self, path: &str) -> Result<Url, GatewayError> {
        Ok(self.base.join(path)?)
    }

    /// Request with the project key and the best available bearer token.
    pub(crate) fn request(&self, method: Method, url: Url) -> RequestBuilder {
        let bearer = self
            .session()
            .map(|s| s.access_token)
            .unwrap_or_else(|| self.anon_key.clone());
        self.http
            .request(method, url)
            .header("apikey", &self.anon_key)
            .bearer_auth(bearer)
    }

    /// Send and turn transport failures and non-2xx statuses into errors.
    pub(crate) async fn send(
        &self,
        builder: RequestBuilder,
        endpoint: &str,
    ) -> Result<Response, GatewayError> {
        let resp = builder.send().await.map_err(|source| GatewayError::Http {
            endpoint: endpoint.to_string(),
            source,
        })?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(GatewayError::Status {
                endpoint: endpoint.to_string(),
                status: status.as_u16(),
                body,
            });
        }
        Ok(resp)
    }

    pub(crate) async fn json<T: serde::de::DeserializeOwned>(
        resp: Response,
        endpoint: &str,
    ) -> Result<T, GatewayError> {
        resp.json().await.map_err(|e| GatewayError::Decode {
            endpoint: endpoint.to_string(),
            message: e.to_string(),
        })
    }
}
