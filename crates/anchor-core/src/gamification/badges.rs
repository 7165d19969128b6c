//! Badge catalog.
//!
//! Badges are a closed set. Each variant carries its display metadata and,
//! where one exists, the milestone that awards it. The catalog is a superset
//! of what the engine can award: badges whose [`Badge::award_trigger`] is
//! `None` are listed as upcoming forever.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::profile::Profile;

/// A counter on the profile that a badge tracks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "target")]
pub enum Milestone {
    /// Consecutive-day streak length
    Streak(u32),
    /// Lifetime number of check-ins
    TotalCheckIns(u32),
}

impl Milestone {
    pub fn target(&self) -> u32 {
        match self {
            Milestone::Streak(n) | Milestone::TotalCheckIns(n) => *n,
        }
    }

    /// Current value of the tracked counter.
    pub fn current(&self, profile: &Profile) -> u32 {
        match self {
            Milestone::Streak(_) => profile.streak,
            Milestone::TotalCheckIns(_) => profile.total_check_ins,
        }
    }

    /// Exact-match test. A counter that skips over the target never hits it.
    pub fn hit_exactly(&self, profile: &Profile) -> bool {
        self.current(profile) == self.target()
    }

    fn unit(&self) -> &'static str {
        match self {
            Milestone::Streak(_) => "days",
            Milestone::TotalCheckIns(_) => "check-ins",
        }
    }
}

/// Every badge the app knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Badge {
    FirstStreak,
    WeekWarrior,
    Dedication,
    MonthMaster,
    EnergyBoost,
    ZenMaster,
}

impl Badge {
    /// Catalog order.
    pub const ALL: [Badge; 6] = [
        Badge::FirstStreak,
        Badge::WeekWarrior,
        Badge::Dedication,
        Badge::MonthMaster,
        Badge::EnergyBoost,
        Badge::ZenMaster,
    ];

    /// Stable token stored in the profile's badge list.
    pub fn id(&self) -> &'static str {
        match self {
            Badge::FirstStreak => "first-streak",
            Badge::WeekWarrior => "week-warrior",
            Badge::Dedication => "dedication",
            Badge::MonthMaster => "month-master",
            Badge::EnergyBoost => "energy-boost",
            Badge::ZenMaster => "zen-master",
        }
    }

    pub fn from_id(id: &str) -> Option<Badge> {
        Badge::ALL.into_iter().find(|b| b.id() == id)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Badge::FirstStreak => "First Steps",
            Badge::WeekWarrior => "Week Warrior",
            Badge::Dedication => "Dedicated Soul",
            Badge::MonthMaster => "Month Master",
            Badge::EnergyBoost => "Energy Boost",
            Badge::ZenMaster => "Zen Master",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Badge::FirstStreak => "Complete your first 3-day streak",
            Badge::WeekWarrior => "Maintain a 7-day check-in streak",
            Badge::Dedication => "Complete 10 total check-ins",
            Badge::MonthMaster => "Maintain a 30-day streak",
            Badge::EnergyBoost => "Report high energy 5 days in a row",
            Badge::ZenMaster => "Report low stress for a whole week",
        }
    }

    /// Milestone used for progress display.
    pub fn milestone(&self) -> Option<Milestone> {
        match self {
            Badge::FirstStreak => Some(Milestone::Streak(3)),
            Badge::WeekWarrior => Some(Milestone::Streak(7)),
            Badge::Dedication => Some(Milestone::TotalCheckIns(10)),
            Badge::MonthMaster => Some(Milestone::Streak(30)),
            Badge::EnergyBoost | Badge::ZenMaster => None,
        }
    }

    /// Milestone that makes the engine award this badge.
    ///
    /// `MonthMaster` has a progress milestone but no trigger; the mood-based
    /// badges have neither.
    pub fn award_trigger(&self) -> Option<Milestone> {
        match self {
            Badge::FirstStreak | Badge::WeekWarrior | Badge::Dedication => self.milestone(),
            Badge::MonthMaster | Badge::EnergyBoost | Badge::ZenMaster => None,
        }
    }

    pub fn is_awardable(&self) -> bool {
        self.award_trigger().is_some()
    }

    /// Progress toward this badge in percent, capped at 100.
    pub fn progress_percent(&self, profile: &Profile) -> f64 {
        match self.milestone() {
            Some(m) => {
                let pct = m.current(profile) as f64 / m.target() as f64 * 100.0;
                pct.min(100.0)
            }
            None => 0.0,
        }
    }

    /// Progress text such as `2/3 days`.
    pub fn progress_text(&self, profile: &Profile) -> String {
        match self.milestone() {
            Some(m) => format!(
                "{}/{} {}",
                m.current(profile).min(m.target()),
                m.target(),
                m.unit()
            ),
            None => "In progress...".to_string(),
        }
    }
}

impl fmt::Display for Badge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

/// A badge token as stored on a profile.
///
/// Tokens written by other clients that this build does not know are kept
/// verbatim so a profile update never drops them.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum BadgeId {
    Known(Badge),
    Unknown(String),
}

impl BadgeId {
    pub fn as_str(&self) -> &str {
        match self {
            BadgeId::Known(b) => b.id(),
            BadgeId::Unknown(s) => s,
        }
    }

    pub fn badge(&self) -> Option<Badge> {
        match self {
            BadgeId::Known(b) => Some(*b),
            BadgeId::Unknown(_) => None,
        }
    }
}

impl From<String> for BadgeId {
    fn from(s: String) -> Self {
        match Badge::from_id(&s) {
            Some(b) => BadgeId::Known(b),
            None => BadgeId::Unknown(s),
        }
    }
}

impl From<BadgeId> for String {
    fn from(id: BadgeId) -> Self {
        match id {
            BadgeId::Known(b) => b.id().to_string(),
            BadgeId::Unknown(s) => s,
        }
    }
}

impl From<Badge> for BadgeId {
    fn from(b: Badge) -> Self {
        BadgeId::Known(b)
    }
}

impl fmt::Display for BadgeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile(streak: u32, total: u32) -> Profile {
        Profile {
            streak,
            total_check_ins: total,
            ..Profile::new("Sam")
        }
    }

    #[test]
    fn ids_round_trip_through_from_id() {
        for badge in Badge::ALL {
            assert_eq!(Badge::from_id(badge.id()), Some(badge));
        }
        assert_eq!(Badge::from_id("nope"), None);
    }

    #[test]
    fn only_three_badges_are_awardable() {
        let awardable: Vec<_> = Badge::ALL.into_iter().filter(|b| b.is_awardable()).collect();
        assert_eq!(
            awardable,
            vec![Badge::FirstStreak, Badge::WeekWarrior, Badge::Dedication]
        );
        assert_eq!(Badge::MonthMaster.milestone(), Some(Milestone::Streak(30)));
        assert_eq!(Badge::MonthMaster.award_trigger(), None);
    }

    #[test]
    fn progress_is_capped() {
        let p = profile(12, 4);
        assert_eq!(Badge::FirstStreak.progress_percent(&p), 100.0);
        assert_eq!(Badge::FirstStreak.progress_text(&p), "3/3 days");
        assert_eq!(Badge::Dedication.progress_percent(&p), 40.0);
        assert_eq!(Badge::Dedication.progress_text(&p), "4/10 check-ins");
        assert_eq!(Badge::ZenMaster.progress_percent(&p), 0.0);
        assert_eq!(Badge::ZenMaster.progress_text(&p), "In progress...");
    }

    #[test]
    fn unknown_tokens_survive_serde() {
        let ids: Vec<BadgeId> =
            serde_json::from_str(r#"["week-warrior", "beta-tester"]"#).unwrap();
        assert_eq!(ids[0], BadgeId::Known(Badge::WeekWarrior));
        assert_eq!(ids[1], BadgeId::Unknown("beta-tester".to_string()));
        assert_eq!(
            serde_json::to_string(&ids).unwrap(),
            r#"["week-warrior","beta-tester"]"#
        );
    }
}
