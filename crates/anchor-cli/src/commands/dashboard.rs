use crate::context::Context;

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let ctx = Context::connect().await?;
    let session = ctx.loaded_session().await?;
    if session.profile().is_some_and(|p| p.needs_onboarding()) {
        println!("Welcome to Anchor! Pick a name with `anchor-cli profile name <NAME>`.");
        return Ok(());
    }
    let dash = session.dashboard_now().ok_or("no profile found")?;

    println!("{}", dash.headline());
    if dash.has_checked_in_today {
        println!("Checked in today! ✅");
    } else {
        println!("Daily check-in waiting: `anchor-cli checkin submit`");
    }
    println!("Streak: {} days", dash.streak);
    println!(
        "Level {}: {}/{} XP ({:.0}%)",
        dash.level, dash.experience, dash.xp_for_next_level, dash.xp_progress_percent
    );
    println!("Total check-ins: {}", dash.total_check_ins);
    println!("Average mood: {:.1}/5 {}", dash.average_mood, dash.mood_emoji);
    println!("Badges: {}", dash.badge_count);
    Ok(())
}
