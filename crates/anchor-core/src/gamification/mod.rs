//! Streaks, experience, levels and badges.

pub mod achievements;
pub mod badges;
pub mod engine;

pub use achievements::{Achievements, BadgeStatus};
pub use badges::{Badge, BadgeId, Milestone};
pub use engine::{
    gamify, gamify_now, GamificationConfig, GamificationEngine, GamifyOutcome, LevelUpMode,
    StreakChange, XP_PER_CHECK_IN,
};
