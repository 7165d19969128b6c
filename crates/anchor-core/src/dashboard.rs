//! Home screen summary derived from the profile and check-in history.

use chrono::NaiveDate;
use serde::Serialize;

use crate::checkin::CheckIn;
use crate::profile::Profile;

/// How many recent check-ins feed the mood average.
pub const MOOD_WINDOW: usize = 7;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Greeting {
    Morning,
    Afternoon,
    Evening,
}

impl Greeting {
    pub fn for_hour(hour: u32) -> Self {
        match hour {
            0..=11 => Greeting::Morning,
            12..=16 => Greeting::Afternoon,
            _ => Greeting::Evening,
        }
    }

    pub fn text(&self) -> &'static str {
        match self {
            Greeting::Morning => "Good morning",
            Greeting::Afternoon => "Good afternoon",
            Greeting::Evening => "Good evening",
        }
    }
}

pub fn mood_emoji(average: f64) -> &'static str {
    if average >= 4.0 {
        "😊"
    } else if average >= 3.0 {
        "😐"
    } else {
        "😔"
    }
}

/// Mean mood of the newest [`MOOD_WINDOW`] entries of a newest-first
/// history. Zero for an empty history.
pub fn average_mood(history: &[CheckIn]) -> f64 {
    let recent = &history[..history.len().min(MOOD_WINDOW)];
    if recent.is_empty() {
        return 0.0;
    }
    let sum: u32 = recent.iter().map(|c| u32::from(c.mood.get())).sum();
    sum as f64 / recent.len() as f64
}

#[derive(Debug, Clone, Serialize)]
pub struct Dashboard {
    pub greeting: Greeting,
    pub name: String,
    pub has_checked_in_today: bool,
    pub streak: u32,
    pub level: u32,
    pub experience: u32,
    pub xp_for_next_level: u32,
    pub xp_progress_percent: f64,
    pub total_check_ins: u32,
    pub average_mood: f64,
    pub mood_emoji: &'static str,
    pub badge_count: usize,
}

impl Dashboard {
    pub fn build(profile: &Profile, history: &[CheckIn], today: NaiveDate, hour: u32) -> Self {
        let average = average_mood(history);
        Self {
            greeting: Greeting::for_hour(hour),
            name: profile.name.clone(),
            has_checked_in_today: history.iter().any(|c| c.date == today),
            streak: profile.streak,
            level: profile.level,
            experience: profile.experience,
            xp_for_next_level: profile.xp_for_next_level(),
            xp_progress_percent: profile.xp_progress_percent(),
            total_check_ins: profile.total_check_ins,
            average_mood: average,
            mood_emoji: mood_emoji(average),
            badge_count: profile.badges.len(),
        }
    }

    pub fn headline(&self) -> String {
        format!("{}, {}!", self.greeting.text(), self.name)
    }
}
