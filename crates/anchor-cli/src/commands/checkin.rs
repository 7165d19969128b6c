use clap::Subcommand;

use anchor_core::gamification::StreakChange;
use anchor_core::{CheckInInput, Scale, SubmitOutcome};

use crate::context::Context;

#[derive(Subcommand)]
pub enum CheckinAction {
    /// Record today's check-in
    Submit {
        /// Mood, 1 (very low) to 5 (great)
        #[arg(long, default_value_t = 3, allow_negative_numbers = true)]
        mood: i64,
        /// Energy, 1 (exhausted) to 5 (pumped)
        #[arg(long, default_value_t = 3, allow_negative_numbers = true)]
        energy: i64,
        /// Stress, 1 (zen) to 5 (overwhelmed)
        #[arg(long, default_value_t = 3, allow_negative_numbers = true)]
        stress: i64,
        /// Optional note
        #[arg(long)]
        note: Option<String>,
    },
    /// List past check-ins, newest first
    History {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

pub async fn run(action: CheckinAction) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        CheckinAction::Submit {
            mood,
            energy,
            stress,
            note,
        } => {
            // Validate before touching the backend.
            let input = CheckInInput::new(mood, energy, stress, note)?;
            let ctx = Context::connect().await?;
            let session = ctx.loaded_session().await?;

            match session.submit_check_in(input.clone()).await? {
                SubmitOutcome::NotSignedIn => return Err("not signed in".into()),
                SubmitOutcome::Submitted(outcome) => {
                    println!(
                        "Checked in: mood {} / energy {} / stress {}",
                        Scale::Mood.label(input.mood),
                        Scale::Energy.label(input.energy),
                        Scale::Stress.label(input.stress),
                    );
                    println!("+{} XP", ctx.config.gamification.xp_per_check_in);
                    match outcome.streak_change {
                        StreakChange::Extended => {
                            println!("Streak: {} days 🔥", outcome.profile.streak)
                        }
                        StreakChange::Restarted => println!("Streak restarted: 1 day"),
                        StreakChange::Unchanged => {
                            println!("Streak: {} days (already counted today)", outcome.profile.streak)
                        }
                    }
                    if outcome.leveled_up() {
                        println!("Level up! You are now level {} 🎉", outcome.profile.level);
                    }
                    for badge in &outcome.new_badges {
                        println!("New badge: {} - {}", badge.name(), badge.description());
                    }
                }
            }
        }
        CheckinAction::History { json } => {
            let ctx = Context::connect().await?;
            let session = ctx.loaded_session().await?;
            let history = session.snapshot().history;
            if json {
                println!("{}", serde_json::to_string_pretty(&history)?);
            } else if history.is_empty() {
                println!("No check-ins yet.");
            } else {
                for entry in &history {
                    println!(
                        "{}  mood {}  energy {}  stress {}{}",
                        entry.date,
                        Scale::Mood.label(entry.mood),
                        Scale::Energy.label(entry.energy),
                        Scale::Stress.label(entry.stress),
                        entry
                            .note
                            .as_deref()
                            .map(|n| format!("  \"{n}\""))
                            .unwrap_or_default(),
                    );
                }
            }
        }
    }
    Ok(())
}
