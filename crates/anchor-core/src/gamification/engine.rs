//! Gamification engine.
//!
//! Turns the current profile plus a freshly submitted check-in into the
//! next profile. The engine is pure: it owns no state and the only input
//! besides its arguments is the date it is told is "today".

use chrono::{Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::badges::Badge;
use crate::checkin::CheckInInput;
use crate::profile::{Profile, XP_PER_LEVEL};

/// Experience awarded per check-in.
pub const XP_PER_CHECK_IN: u32 = 10;

/// How experience overflow is converted into levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LevelUpMode {
    /// Keep levelling while experience covers the next threshold.
    #[default]
    Loop,
    /// At most one level per check-in.
    SingleStep,
}

/// Engine tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GamificationConfig {
    pub xp_per_check_in: u32,
    pub level_up: LevelUpMode,
}

impl Default for GamificationConfig {
    fn default() -> Self {
        Self {
            xp_per_check_in: XP_PER_CHECK_IN,
            level_up: LevelUpMode::Loop,
        }
    }
}

/// What happened to the streak on this check-in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StreakChange {
    /// First ever check-in or a check-in the day after the last one
    Extended,
    /// A gap day broke the streak; it restarts at 1
    Restarted,
    /// Another check-in on the same day
    Unchanged,
}

/// Result of applying one check-in.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GamifyOutcome {
    pub profile: Profile,
    pub streak_change: StreakChange,
    /// Number of levels gained
    pub levels_gained: u32,
    /// Badges newly awarded by this check-in, in catalog order
    pub new_badges: Vec<Badge>,
}

impl GamifyOutcome {
    pub fn leveled_up(&self) -> bool {
        self.levels_gained > 0
    }
}

/// Applies check-ins to profiles.
#[derive(Debug, Clone, Default)]
pub struct GamificationEngine {
    config: GamificationConfig,
}

impl GamificationEngine {
    /// Create an engine with default config.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an engine with custom config.
    pub fn with_config(config: GamificationConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &GamificationConfig {
        &self.config
    }

    /// Apply a check-in submitted on `today`.
    pub fn apply(&self, current: &Profile, input: &CheckInInput, today: NaiveDate) -> GamifyOutcome {
        tracing::trace!(
            mood = input.mood.get(),
            energy = input.energy.get(),
            stress = input.stress.get(),
            %today,
            "applying check-in"
        );

        let yesterday = today - Duration::days(1);
        let mut profile = current.clone();
        if profile.level == 0 {
            profile.level = 1;
        }

        profile.total_check_ins = profile.total_check_ins.saturating_add(1);
        profile.experience = profile
            .experience
            .saturating_add(self.config.xp_per_check_in);

        let streak_change = match profile.last_check_in {
            None => StreakChange::Extended,
            Some(last) if last == yesterday => StreakChange::Extended,
            Some(last) if last != today => StreakChange::Restarted,
            Some(_) => StreakChange::Unchanged,
        };
        match streak_change {
            StreakChange::Extended => profile.streak = profile.streak.saturating_add(1),
            StreakChange::Restarted => profile.streak = 1,
            StreakChange::Unchanged => {}
        }

        profile.last_check_in = Some(today);

        let levels_gained = self.level_up(&mut profile);

        let mut new_badges = Vec::new();
        for badge in Badge::ALL {
            let Some(trigger) = badge.award_trigger() else {
                continue;
            };
            if trigger.hit_exactly(&profile) && profile.award(badge) {
                new_badges.push(badge);
            }
        }

        GamifyOutcome {
            profile,
            streak_change,
            levels_gained,
            new_badges,
        }
    }

    /// Apply a check-in submitted on the current UTC date.
    pub fn apply_now(&self, current: &Profile, input: &CheckInInput) -> GamifyOutcome {
        self.apply(current, input, Utc::now().date_naive())
    }

    fn level_up(&self, profile: &mut Profile) -> u32 {
        let mut gained = 0;
        loop {
            let threshold = profile.level.saturating_mul(XP_PER_LEVEL);
            if profile.experience < threshold {
                break;
            }
            profile.experience -= threshold;
            profile.level += 1;
            gained += 1;
            if self.config.level_up == LevelUpMode::SingleStep {
                break;
            }
        }
        gained
    }
}

/// Apply a check-in with the default engine.
pub fn gamify(profile: &Profile, input: &CheckInInput, today: NaiveDate) -> Profile {
    GamificationEngine::new().apply(profile, input, today).profile
}

/// Apply a check-in with the default engine on the current UTC date.
pub fn gamify_now(profile: &Profile, input: &CheckInInput) -> Profile {
    GamificationEngine::new().apply_now(profile, input).profile
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gamification::BadgeId;
    use proptest::prelude::*;
    use std::collections::BTreeSet;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, 15).unwrap()
    }

    fn days_ago(n: i64) -> NaiveDate {
        today() - Duration::days(n)
    }

    fn input() -> CheckInInput {
        CheckInInput::new(4, 3, 2, None).unwrap()
    }

    fn profile(
        streak: u32,
        total: u32,
        level: u32,
        experience: u32,
        last: Option<NaiveDate>,
    ) -> Profile {
        Profile {
            streak,
            total_check_ins: total,
            level,
            experience,
            last_check_in: last,
            ..Profile::new("Sam")
        }
    }

    #[test]
    fn scenario_a_third_day_levels_up_and_awards_first_streak() {
        let p = profile(2, 2, 1, 90, Some(days_ago(1)));
        let out = GamificationEngine::new().apply(&p, &input(), today());

        assert_eq!(out.profile.streak, 3);
        assert_eq!(out.profile.experience, 0);
        assert_eq!(out.profile.level, 2);
        assert_eq!(out.profile.total_check_ins, 3);
        assert_eq!(out.profile.last_check_in, Some(today()));
        assert_eq!(out.new_badges, vec![Badge::FirstStreak]);
        assert!(out.leveled_up());
        assert_eq!(out.streak_change, StreakChange::Extended);
    }

    #[test]
    fn scenario_b_null_last_check_in_extends_and_awards_dedication() {
        let mut p = profile(9, 9, 1, 50, None);
        p.award(Badge::FirstStreak);
        p.award(Badge::WeekWarrior);

        let out = GamificationEngine::new().apply(&p, &input(), today());

        assert_eq!(out.profile.total_check_ins, 10);
        assert_eq!(out.profile.streak, 10);
        assert_eq!(out.profile.experience, 60);
        assert_eq!(out.new_badges, vec![Badge::Dedication]);
        assert_eq!(out.profile.badges.len(), 3);
    }

    #[test]
    fn scenario_c_same_day_resubmission_keeps_streak() {
        let p = profile(4, 4, 1, 40, Some(days_ago(1)));
        let first = gamify(&p, &input(), today());
        let second = gamify(&first, &input(), today());

        assert_eq!(first.streak, 5);
        assert_eq!(second.streak, 5);
        assert_eq!(second.total_check_ins, first.total_check_ins + 1);
        assert_eq!(second.experience, first.experience + XP_PER_CHECK_IN);
    }

    #[test]
    fn gap_day_restarts_streak() {
        let p = profile(6, 20, 3, 10, Some(days_ago(2)));
        let out = GamificationEngine::new().apply(&p, &input(), today());
        assert_eq!(out.profile.streak, 1);
        assert_eq!(out.streak_change, StreakChange::Restarted);
    }

    #[test]
    fn week_warrior_on_seventh_day() {
        let p = profile(6, 6, 1, 60, Some(days_ago(1)));
        let out = GamificationEngine::new().apply(&p, &input(), today());
        assert_eq!(out.new_badges, vec![Badge::WeekWarrior]);
    }

    #[test]
    fn streak_that_skips_three_never_awards_first_streak() {
        // Clock skew: last check-in lies in the future, so the streak restarts
        let p = profile(2, 2, 1, 0, Some(today() + Duration::days(3)));
        let out = GamificationEngine::new().apply(&p, &input(), today());
        assert_eq!(out.profile.streak, 1);
        assert!(out.new_badges.is_empty());
    }

    #[test]
    fn badges_already_held_are_not_reported_again() {
        let mut p = profile(2, 2, 1, 0, Some(days_ago(1)));
        p.award(Badge::FirstStreak);
        let out = GamificationEngine::new().apply(&p, &input(), today());
        assert!(out.new_badges.is_empty());
        assert!(out.profile.has_badge(Badge::FirstStreak));
    }

    #[test]
    fn unknown_badges_are_preserved() {
        let mut p = profile(0, 0, 1, 0, None);
        p.badges.insert(BadgeId::Unknown("beta-tester".into()));
        let next = gamify(&p, &input(), today());
        assert!(next.badges.contains(&BadgeId::Unknown("beta-tester".into())));
    }

    #[test]
    fn large_reward_loops_through_several_levels() {
        let engine = GamificationEngine::with_config(GamificationConfig {
            xp_per_check_in: 350,
            level_up: LevelUpMode::Loop,
        });
        let p = profile(0, 0, 1, 0, None);
        let out = engine.apply(&p, &input(), today());
        // 350 -> L2 (250 left) -> L3 (50 left)
        assert_eq!(out.profile.level, 3);
        assert_eq!(out.profile.experience, 50);
        assert_eq!(out.levels_gained, 2);
    }

    #[test]
    fn single_step_mode_gains_at_most_one_level() {
        let engine = GamificationEngine::with_config(GamificationConfig {
            xp_per_check_in: 350,
            level_up: LevelUpMode::SingleStep,
        });
        let p = profile(0, 0, 1, 0, None);
        let out = engine.apply(&p, &input(), today());
        assert_eq!(out.profile.level, 2);
        assert_eq!(out.profile.experience, 250);
    }

    #[test]
    fn zero_level_is_normalized() {
        let p = profile(0, 0, 0, 0, None);
        let next = gamify(&p, &input(), today());
        assert_eq!(next.level, 1);
        assert_eq!(next.experience, 10);
    }

    fn arb_profile() -> impl Strategy<Value = Profile> {
        (
            0u32..400,
            0u32..5000,
            1u32..50,
            proptest::option::of(-5i64..5),
            proptest::collection::btree_set(0usize..6, 0..6),
        )
            .prop_flat_map(|(streak, total, level, offset, badge_idx)| {
                (0..level * XP_PER_LEVEL).prop_map(move |experience| {
                    let badges: BTreeSet<BadgeId> = badge_idx
                        .iter()
                        .map(|i| BadgeId::Known(Badge::ALL[*i]))
                        .collect();
                    Profile {
                        name: "Prop".into(),
                        streak,
                        total_check_ins: total,
                        level,
                        experience,
                        badges,
                        last_check_in: offset.map(|o| today() - Duration::days(o)),
                    }
                })
            })
    }

    proptest! {
        #[test]
        fn total_increments_by_one(p in arb_profile()) {
            let next = gamify(&p, &input(), today());
            prop_assert_eq!(next.total_check_ins, p.total_check_ins + 1);
        }

        #[test]
        fn experience_stays_below_threshold(p in arb_profile()) {
            let next = gamify(&p, &input(), today());
            prop_assert!(next.experience < next.level * XP_PER_LEVEL);
        }

        #[test]
        fn streak_follows_last_check_in(p in arb_profile()) {
            let next = gamify(&p, &input(), today());
            match p.last_check_in {
                None => prop_assert_eq!(next.streak, p.streak + 1),
                Some(d) if d == days_ago(1) => prop_assert_eq!(next.streak, p.streak + 1),
                Some(d) if d == today() => prop_assert_eq!(next.streak, p.streak),
                Some(_) => prop_assert_eq!(next.streak, 1),
            }
            prop_assert_eq!(next.last_check_in, Some(today()));
        }

        #[test]
        fn badges_never_shrink(p in arb_profile(), days in 1usize..15) {
            let mut current = p;
            for day in 0..days {
                let date = today() + Duration::days(day as i64);
                let next = gamify(&current, &input(), date);
                prop_assert!(current.badges.is_subset(&next.badges));
                current = next;
            }
        }
    }
}
