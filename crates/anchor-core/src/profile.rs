//! User profile: the gamification state that check-ins advance.

use std::collections::BTreeSet;

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::ValidationError;
use crate::gamification::{Badge, BadgeId};

/// Experience required per level; level `n` needs `n * XP_PER_LEVEL`.
pub const XP_PER_LEVEL: u32 = 100;

/// A user's gamification state.
///
/// Field names match the `user_profiles` table so rows deserialize
/// directly; unknown columns (`id`, timestamps) are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub streak: u32,
    #[serde(default)]
    pub total_check_ins: u32,
    #[serde(default = "default_level")]
    pub level: u32,
    #[serde(default)]
    pub experience: u32,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub badges: BTreeSet<BadgeId>,
    #[serde(default)]
    pub last_check_in: Option<NaiveDate>,
}

fn default_level() -> u32 {
    1
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<BTreeSet<BadgeId>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<BTreeSet<BadgeId>>::deserialize(deserializer)?.unwrap_or_default())
}

impl Profile {
    /// A fresh profile, as created by the backend on sign-up.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            streak: 0,
            total_check_ins: 0,
            level: 1,
            experience: 0,
            badges: BTreeSet::new(),
            last_check_in: None,
        }
    }

    /// A profile with no display name has not finished onboarding.
    pub fn needs_onboarding(&self) -> bool {
        self.name.trim().is_empty()
    }

    pub fn xp_for_next_level(&self) -> u32 {
        self.level.max(1).saturating_mul(XP_PER_LEVEL)
    }

    /// Progress through the current level in percent.
    pub fn xp_progress_percent(&self) -> f64 {
        self.experience as f64 / self.xp_for_next_level() as f64 * 100.0
    }

    pub fn has_badge(&self, badge: Badge) -> bool {
        self.badges.contains(&BadgeId::Known(badge))
    }

    /// Add a badge if absent. Returns true when it was newly added.
    pub fn award(&mut self, badge: Badge) -> bool {
        self.badges.insert(BadgeId::Known(badge))
    }
}

/// A partial profile update. `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ProfileUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub streak: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_check_ins: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub level: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub experience: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub badges: Option<BTreeSet<BadgeId>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_check_in: Option<NaiveDate>,
}

impl ProfileUpdate {
    /// Update carrying only a display name. Rejects blank names.
    pub fn name(name: &str) -> Result<Self, ValidationError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ValidationError::Empty("name"));
        }
        Ok(Self {
            name: Some(name.to_string()),
            ..Default::default()
        })
    }

    /// Update carrying the gamification fields of `profile`.
    pub fn progress(profile: &Profile) -> Self {
        Self {
            name: None,
            streak: Some(profile.streak),
            total_check_ins: Some(profile.total_check_ins),
            level: Some(profile.level),
            experience: Some(profile.experience),
            badges: Some(profile.badges.clone()),
            last_check_in: profile.last_check_in,
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Apply this update to an in-memory profile.
    pub fn apply_to(&self, profile: &mut Profile) {
        if let Some(name) = &self.name {
            profile.name = name.clone();
        }
        if let Some(v) = self.streak {
            profile.streak = v;
        }
        if let Some(v) = self.total_check_ins {
            profile.total_check_ins = v;
        }
        if let Some(v) = self.level {
            profile.level = v;
        }
        if let Some(v) = self.experience {
            profile.experience = v;
        }
        if let Some(badges) = &self.badges {
            profile.badges = badges.clone();
        }
        if let Some(d) = self.last_check_in {
            profile.last_check_in = Some(d);
        }
    }
}
