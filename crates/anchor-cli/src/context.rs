//! Wires the configured backend into a session.

use std::sync::Arc;

use anchor_core::gateway::SupabaseClient;
use anchor_core::storage::BackendKind;
use anchor_core::{
    Config, CoreError, GamificationEngine, IdentityError, IdentityHub, IdentityProvider,
    LocalGateway, PersistenceGateway, Session, SupabaseAuth, SupabaseGateway, UserId,
};

pub struct Context {
    pub config: Config,
    pub gateway: Arc<dyn PersistenceGateway>,
    pub identity: Arc<dyn IdentityProvider>,
    /// Present only for the hosted backend
    pub auth: Option<Arc<SupabaseAuth>>,
}

impl Context {
    pub async fn connect() -> Result<Self, CoreError> {
        let config = Config::load()?.with_env_overrides()?;
        tracing::debug!(backend = ?config.backend.kind, "connecting");

        match config.backend.kind {
            BackendKind::Local => {
                let gateway = LocalGateway::open()?;
                let user = UserId::local();
                gateway.ensure_profile(&user, "")?;
                Ok(Self {
                    gateway: Arc::new(gateway),
                    identity: Arc::new(IdentityHub::signed_in(user)),
                    auth: None,
                    config,
                })
            }
            BackendKind::Supabase => {
                let client = Arc::new(SupabaseClient::from_config(&config.backend)?);
                let auth = Arc::new(SupabaseAuth::new(
                    client.clone(),
                    config.backend.remember_session,
                ));
                if let Err(e) = auth.restore().await {
                    tracing::warn!(error = %e, "could not restore saved session");
                }
                Ok(Self {
                    gateway: Arc::new(SupabaseGateway::new(client)),
                    identity: auth.clone(),
                    auth: Some(auth),
                    config,
                })
            }
        }
    }

    pub fn session(&self) -> Session {
        Session::new(
            self.gateway.clone(),
            self.identity.clone(),
            GamificationEngine::with_config(self.config.gamification.clone()),
        )
    }

    /// A session with the profile and history already fetched.
    pub async fn loaded_session(&self) -> Result<Session, CoreError> {
        if self.identity.current_user_id().is_none() {
            return Err(IdentityError::NotSignedIn.into());
        }
        let session = self.session();
        session.load().await?;
        Ok(session)
    }

    pub fn auth(&self) -> Result<&SupabaseAuth, Box<dyn std::error::Error>> {
        self.auth
            .as_deref()
            .ok_or_else(|| "accounts need the supabase backend (config set backend.kind supabase)".into())
    }
}
