//! Session state: who is signed in, their profile and check-in history.
//!
//! A [`Session`] is the single writer for the signed-in user's profile. It
//! runs the gamification engine on each submitted check-in and persists the
//! result through a [`PersistenceGateway`]. The cached state is cleared when
//! the identity provider reports a sign-out.

use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{Local, NaiveDate, Timelike, Utc};
use serde::Serialize;

use crate::checkin::{CheckIn, CheckInInput};
use crate::dashboard::Dashboard;
use crate::error::SessionError;
use crate::gamification::{Achievements, GamificationEngine, GamifyOutcome};
use crate::gateway::PersistenceGateway;
use crate::identity::{IdentityEvent, IdentityProvider, Subscription, UserId};
use crate::profile::{Profile, ProfileUpdate};

fn utc_today() -> NaiveDate {
    Utc::now().date_naive()
}

/// Snapshot of what the session currently knows.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SessionState {
    pub user: Option<UserId>,
    pub profile: Option<Profile>,
    /// Newest first
    pub history: Vec<CheckIn>,
}

/// Result of [`Session::submit_check_in`].
#[derive(Debug, Clone)]
pub enum SubmitOutcome {
    /// Nobody is signed in; nothing was recorded.
    NotSignedIn,
    Submitted(GamifyOutcome),
}

pub struct Session {
    gateway: Arc<dyn PersistenceGateway>,
    identity: Arc<dyn IdentityProvider>,
    engine: GamificationEngine,
    state: Arc<Mutex<SessionState>>,
    submitting: tokio::sync::Mutex<()>,
    today: fn() -> NaiveDate,
    _identity_sub: Subscription,
}

impl Session {
    pub fn new(
        gateway: Arc<dyn PersistenceGateway>,
        identity: Arc<dyn IdentityProvider>,
        engine: GamificationEngine,
    ) -> Self {
        let state = Arc::new(Mutex::new(SessionState::default()));
        let weak = Arc::downgrade(&state);
        let sub = identity.on_identity_change(Arc::new(move |event: &IdentityEvent| {
            let Some(state) = weak.upgrade() else {
                return;
            };
            let mut st = state.lock().unwrap_or_else(|e| e.into_inner());
            match event {
                IdentityEvent::SignedOut => *st = SessionState::default(),
                IdentityEvent::SignedIn(user) if st.user.as_ref() != Some(user) => {
                    *st = SessionState {
                        user: Some(user.clone()),
                        ..Default::default()
                    };
                }
                IdentityEvent::SignedIn(_) => {}
            }
        }));

        Self {
            gateway,
            identity,
            engine,
            state,
            submitting: tokio::sync::Mutex::new(()),
            today: utc_today,
            _identity_sub: sub,
        }
    }

    /// Override the date the engine treats as today.
    pub fn with_clock(mut self, today: fn() -> NaiveDate) -> Self {
        self.today = today;
        self
    }

    fn state(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn snapshot(&self) -> SessionState {
        self.state().clone()
    }

    pub fn profile(&self) -> Option<Profile> {
        self.state().profile.clone()
    }

    /// Fetch profile and history for the current user.
    ///
    /// Returns `Ok(None)` when nobody is signed in or the user has no
    /// profile row yet.
    pub async fn load(&self) -> Result<Option<Profile>, SessionError> {
        let Some(user) = self.identity.current_user_id() else {
            *self.state() = SessionState::default();
            return Ok(None);
        };

        let profile = self.gateway.fetch_profile(&user).await.map_err(|e| {
            tracing::error!(user = %user, error = %e, "failed to fetch profile");
            e
        })?;
        let history = self.gateway.list_check_ins(&user).await.map_err(|e| {
            tracing::error!(user = %user, error = %e, "failed to fetch check-in history");
            e
        })?;

        *self.state() = SessionState {
            user: Some(user),
            profile: profile.clone(),
            history,
        };
        Ok(profile)
    }

    /// Re-fetch the check-in history.
    pub async fn refresh_history(&self) -> Result<Vec<CheckIn>, SessionError> {
        let user = self
            .identity
            .current_user_id()
            .ok_or(SessionError::NotSignedIn)?;
        let history = self.gateway.list_check_ins(&user).await?;
        let mut st = self.state();
        if st.user.as_ref() == Some(&user) {
            st.history = history.clone();
        }
        Ok(history)
    }

    /// Record a check-in and advance the profile.
    ///
    /// The engine always runs against the profile as stored in the backend,
    /// not the cached copy, so a writer in another process is never
    /// overwritten. If the backend write fails the cached profile is left as
    /// it was. A profile that still needs onboarding is refused. Only one
    /// submission runs at a time per session; a concurrent call fails with
    /// [`SessionError::SubmissionInProgress`].
    pub async fn submit_check_in(
        &self,
        input: CheckInInput,
    ) -> Result<SubmitOutcome, SessionError> {
        let Some(user) = self.identity.current_user_id() else {
            tracing::warn!("check-in submitted with nobody signed in");
            return Ok(SubmitOutcome::NotSignedIn);
        };

        let _guard = self
            .submitting
            .try_lock()
            .map_err(|_| SessionError::SubmissionInProgress)?;

        let stored = self
            .gateway
            .fetch_profile(&user)
            .await?
            .ok_or_else(|| SessionError::ProfileMissing(user.to_string()))?;
        if stored.needs_onboarding() {
            return Err(SessionError::OnboardingRequired);
        }

        let recorded = self
            .gateway
            .record_check_in(&user, &input, &self.engine, (self.today)())
            .await;

        let history = match self.gateway.list_check_ins(&user).await {
            Ok(h) => Some(h),
            Err(e) => {
                tracing::warn!(user = %user, error = %e, "failed to refresh check-in history");
                None
            }
        };

        let mut st = self.state();
        if st.user.as_ref() != Some(&user) {
            tracing::debug!(user = %user, "identity changed during submission");
        } else if let Some(h) = history {
            st.history = h;
        }

        let outcome = match recorded {
            Ok(Some(outcome)) => outcome,
            Ok(None) => return Err(SessionError::ProfileMissing(user.to_string())),
            Err(e) => {
                tracing::error!(user = %user, error = %e, "failed to record check-in");
                return Err(e.into());
            }
        };

        if st.user.as_ref() == Some(&user) {
            st.profile = Some(outcome.profile.clone());
        }
        drop(st);

        tracing::info!(
            user = %user,
            streak = outcome.profile.streak,
            level = outcome.profile.level,
            new_badges = outcome.new_badges.len(),
            "check-in recorded"
        );
        Ok(SubmitOutcome::Submitted(outcome))
    }

    /// Store the display name chosen during onboarding.
    pub async fn complete_onboarding(&self, name: &str) -> Result<Profile, SessionError> {
        let user = self
            .identity
            .current_user_id()
            .ok_or(SessionError::NotSignedIn)?;
        let update = ProfileUpdate::name(name)?;

        self.gateway.update_profile(&user, &update).await.map_err(|e| {
            tracing::error!(user = %user, error = %e, "failed to save name");
            e
        })?;

        let cached = {
            let mut st = self.state();
            if st.user.as_ref() == Some(&user) {
                st.profile.as_mut().map(|p| {
                    update.apply_to(p);
                    p.clone()
                })
            } else {
                None
            }
        };
        match cached {
            Some(p) => Ok(p),
            None => self
                .load()
                .await?
                .ok_or_else(|| SessionError::ProfileMissing(user.to_string())),
        }
    }

    pub fn dashboard(&self, today: NaiveDate, hour: u32) -> Option<Dashboard> {
        let st = self.state();
        let profile = st.profile.as_ref()?;
        Some(Dashboard::build(profile, &st.history, today, hour))
    }

    /// Dashboard for the current moment: UTC date, local hour.
    pub fn dashboard_now(&self) -> Option<Dashboard> {
        self.dashboard((self.today)(), Local::now().hour())
    }

    pub fn achievements(&self) -> Option<Achievements> {
        self.state().profile.as_ref().map(Achievements::for_profile)
    }
}
