//! # Anchor Core Library
//!
//! Core logic for the Anchor wellness tracker. Users submit a daily
//! mood / energy / stress check-in and earn streaks, experience, levels and
//! badges for it. Everything runs through the standalone `anchor-cli`
//! binary on top of this library.
//!
//! ## Architecture
//!
//! - **Gamification Engine**: pure `(profile, check-in, today) -> profile`
//!   update with a closed badge catalog
//! - **Gateway**: async persistence trait with a hosted Supabase backend and
//!   an offline SQLite backend
//! - **Identity**: current user plus sign-in / sign-out notifications
//! - **Session**: explicit state container that runs the engine and writes
//!   through the gateway
//! - **Storage**: SQLite database and TOML configuration
//!
//! ## Key Components
//!
//! - [`GamificationEngine`]: check-in to profile update
//! - [`PersistenceGateway`]: backend abstraction
//! - [`Session`]: submission flow and cached state
//! - [`Config`]: application configuration management

pub mod chat;
pub mod checkin;
pub mod dashboard;
pub mod error;
pub mod gamification;
pub mod gateway;
pub mod identity;
pub mod profile;
pub mod relaxation;
pub mod session;
pub mod storage;

pub use checkin::{CheckIn, CheckInInput, Rating, Scale};
pub use dashboard::{Dashboard, Greeting};
pub use error::{ConfigError, CoreError, GatewayError, IdentityError, SessionError, ValidationError};
pub use gamification::{
    gamify, gamify_now, Achievements, Badge, BadgeId, GamificationConfig, GamificationEngine,
    GamifyOutcome, LevelUpMode,
};
pub use gateway::{LocalGateway, PersistenceGateway, SupabaseAuth, SupabaseClient, SupabaseGateway};
pub use identity::{IdentityEvent, IdentityHub, IdentityProvider, Subscription, UserId};
pub use profile::{Profile, ProfileUpdate};
pub use session::{Session, SessionState, SubmitOutcome};
pub use storage::{Config, Database};
