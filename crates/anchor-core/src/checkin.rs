//! Daily check-in records.
//!
//! A check-in is a single self-report of mood, energy and stress on a
//! 1..=5 scale plus an optional free-text note. Ratings are validated once
//! at construction through [`Rating`], so nothing downstream has to
//! re-check the range.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// A rating on the 1..=5 check-in scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "u8")]
pub struct Rating(u8);

impl Rating {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 5;

    /// Validate a raw value for the named field.
    pub fn new(field: &'static str, value: i64) -> Result<Self, ValidationError> {
        if (Self::MIN as i64..=Self::MAX as i64).contains(&value) {
            Ok(Self(value as u8))
        } else {
            Err(ValidationError::RatingOutOfRange { field, value })
        }
    }

    pub fn get(self) -> u8 {
        self.0
    }
}

/// Forms start every slider in the middle of the scale.
impl Default for Rating {
    fn default() -> Self {
        Self(3)
    }
}

impl TryFrom<i64> for Rating {
    type Error = ValidationError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Rating::new("rating", value)
    }
}

impl From<Rating> for u8 {
    fn from(r: Rating) -> Self {
        r.0
    }
}

/// The three scales a check-in reports on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Scale {
    Mood,
    Energy,
    Stress,
}

const MOOD_LABELS: [&str; 5] = ["😢", "😔", "😐", "😊", "😄"];
const ENERGY_LABELS: [&str; 5] = ["Exhausted", "Tired", "Okay", "Energized", "Pumped"];
const STRESS_LABELS: [&str; 5] = ["Zen", "Calm", "Mild", "Stressed", "Overwhelmed"];

impl Scale {
    pub fn field(&self) -> &'static str {
        match self {
            Scale::Mood => "mood",
            Scale::Energy => "energy",
            Scale::Stress => "stress",
        }
    }

    /// Display label for a rating on this scale.
    pub fn label(&self, rating: Rating) -> &'static str {
        let idx = (rating.get() - Rating::MIN) as usize;
        match self {
            Scale::Mood => MOOD_LABELS[idx],
            Scale::Energy => ENERGY_LABELS[idx],
            Scale::Stress => STRESS_LABELS[idx],
        }
    }

    /// Prompt shown for this step of the check-in flow.
    pub fn prompt(&self) -> &'static str {
        match self {
            Scale::Mood => "How are you feeling?",
            Scale::Energy => "What's your energy like?",
            Scale::Stress => "How stressed are you?",
        }
    }
}

/// A check-in as submitted by the user, before the backend assigns a date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckInInput {
    pub mood: Rating,
    pub energy: Rating,
    pub stress: Rating,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl CheckInInput {
    /// Build an input from raw form values.
    ///
    /// Blank notes are dropped so the backend stores `null` rather than an
    /// empty string.
    pub fn new(
        mood: i64,
        energy: i64,
        stress: i64,
        note: Option<String>,
    ) -> Result<Self, ValidationError> {
        Ok(Self {
            mood: Rating::new(Scale::Mood.field(), mood)?,
            energy: Rating::new(Scale::Energy.field(), energy)?,
            stress: Rating::new(Scale::Stress.field(), stress)?,
            note: note
                .map(|n| n.trim().to_string())
                .filter(|n| !n.is_empty()),
        })
    }

    pub fn rating(&self, scale: Scale) -> Rating {
        match scale {
            Scale::Mood => self.mood,
            Scale::Energy => self.energy,
            Scale::Stress => self.stress,
        }
    }
}

impl Default for CheckInInput {
    fn default() -> Self {
        Self {
            mood: Rating::default(),
            energy: Rating::default(),
            stress: Rating::default(),
            note: None,
        }
    }
}

/// A recorded check-in. Immutable once stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckIn {
    pub mood: Rating,
    pub energy: Rating,
    pub stress: Rating,
    #[serde(default)]
    pub note: Option<String>,
    pub date: NaiveDate,
}

impl CheckIn {
    pub fn from_input(input: &CheckInInput, date: NaiveDate) -> Self {
        Self {
            mood: input.mood,
            energy: input.energy,
            stress: input.stress,
            note: input.note.clone(),
            date,
        }
    }
}
