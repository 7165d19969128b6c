//! Persistence gateways.
//!
//! Every backend implements [`PersistenceGateway`]. Gateways are stateless
//! with respect to the profile: they fetch and store rows keyed by user id.
//! The engine is handed in by the session so a backend can run it against
//! the row it reads inside its own transaction.

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::checkin::{CheckIn, CheckInInput};
use crate::error::GatewayError;
use crate::gamification::{GamificationEngine, GamifyOutcome};
use crate::identity::UserId;
use crate::profile::{Profile, ProfileUpdate};

pub mod local;
pub mod supabase;

pub use local::LocalGateway;
pub use supabase::{AuthSession, SignUpOutcome, SupabaseAuth, SupabaseClient, SupabaseGateway};

/// Storage operations the session needs from a backend.
#[async_trait]
pub trait PersistenceGateway: Send + Sync {
    /// Fetch the profile row, or `None` if the user has none yet.
    async fn fetch_profile(&self, user: &UserId) -> Result<Option<Profile>, GatewayError>;

    /// Apply a partial update to the profile row.
    async fn update_profile(
        &self,
        user: &UserId,
        update: &ProfileUpdate,
    ) -> Result<(), GatewayError>;

    /// All check-ins for the user, newest first.
    async fn list_check_ins(&self, user: &UserId) -> Result<Vec<CheckIn>, GatewayError>;

    /// Record a check-in. The gateway stamps it with the current date.
    async fn insert_check_in(
        &self,
        user: &UserId,
        input: &CheckInInput,
    ) -> Result<(), GatewayError>;

    /// Record a check-in and advance the stored profile.
    ///
    /// The profile is read fresh from the backend, never from a caller's
    /// cache. Returns `None` when the user has no profile row. The default
    /// runs fetch, insert and update one after another; backends that can
    /// lock the profile row override it to make the three steps atomic.
    async fn record_check_in(
        &self,
        user: &UserId,
        input: &CheckInInput,
        engine: &GamificationEngine,
        today: NaiveDate,
    ) -> Result<Option<GamifyOutcome>, GatewayError> {
        let Some(current) = self.fetch_profile(user).await? else {
            return Ok(None);
        };
        let outcome = engine.apply(&current, input, today);
        self.insert_check_in(user, input).await?;
        self.update_profile(user, &ProfileUpdate::progress(&outcome.profile))
            .await?;
        Ok(Some(outcome))
    }
}
