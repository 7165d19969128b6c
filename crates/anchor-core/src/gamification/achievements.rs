//! Earned / upcoming badge overview for a profile.

use serde::Serialize;

use super::badges::{Badge, BadgeId};
use crate::profile::Profile;

/// One row of the achievements view.
#[derive(Debug, Clone, Serialize)]
pub struct BadgeStatus {
    pub id: String,
    pub name: String,
    pub description: String,
    pub progress_percent: f64,
    pub progress_text: String,
    /// False for catalog entries nothing can award yet
    pub awardable: bool,
}

impl BadgeStatus {
    fn from_badge(badge: Badge, profile: &Profile) -> Self {
        Self {
            id: badge.id().to_string(),
            name: badge.name().to_string(),
            description: badge.description().to_string(),
            progress_percent: badge.progress_percent(profile),
            progress_text: badge.progress_text(profile),
            awardable: badge.is_awardable(),
        }
    }

    fn unknown(id: &str) -> Self {
        Self {
            id: id.to_string(),
            name: id.to_string(),
            description: String::new(),
            progress_percent: 100.0,
            progress_text: String::new(),
            awardable: false,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Achievements {
    pub earned: Vec<BadgeStatus>,
    pub upcoming: Vec<BadgeStatus>,
    /// Share of the catalog earned, in percent
    pub overall_percent: f64,
}

impl Achievements {
    pub fn for_profile(profile: &Profile) -> Self {
        let earned: Vec<BadgeStatus> = profile
            .badges
            .iter()
            .map(|id| match id {
                BadgeId::Known(b) => BadgeStatus::from_badge(*b, profile),
                BadgeId::Unknown(s) => BadgeStatus::unknown(s),
            })
            .collect();

        let upcoming: Vec<BadgeStatus> = Badge::ALL
            .into_iter()
            .filter(|b| !profile.has_badge(*b))
            .map(|b| BadgeStatus::from_badge(b, profile))
            .collect();

        let known_earned = Badge::ALL
            .into_iter()
            .filter(|b| profile.has_badge(*b))
            .count();
        let overall_percent = known_earned as f64 / Badge::ALL.len() as f64 * 100.0;

        Self {
            earned,
            upcoming,
            overall_percent,
        }
    }

    pub fn earned_count(&self) -> usize {
        self.earned.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partitions_catalog() {
        let mut p = Profile::new("Sam");
        p.streak = 2;
        p.award(Badge::Dedication);
        p.award(Badge::FirstStreak);

        let a = Achievements::for_profile(&p);
        assert_eq!(a.earned_count(), 2);
        assert_eq!(a.upcoming.len(), 4);
        assert!(a.upcoming.iter().all(|s| s.id != "dedication"));
        assert!((a.overall_percent - 33.333).abs() < 0.01);

        let week = a.upcoming.iter().find(|s| s.id == "week-warrior").unwrap();
        assert_eq!(week.progress_text, "2/7 days");
        assert!(week.awardable);

        let zen = a.upcoming.iter().find(|s| s.id == "zen-master").unwrap();
        assert!(!zen.awardable);
    }

    #[test]
    fn unknown_badges_listed_but_not_counted() {
        let mut p = Profile::new("Sam");
        p.badges.insert(BadgeId::Unknown("beta-tester".into()));
        let a = Achievements::for_profile(&p);
        assert_eq!(a.earned_count(), 1);
        assert_eq!(a.earned[0].name, "beta-tester");
        assert_eq!(a.upcoming.len(), 6);
        assert_eq!(a.overall_percent, 0.0);
    }
}
