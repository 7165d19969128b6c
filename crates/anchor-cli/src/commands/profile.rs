use clap::Subcommand;

use crate::context::Context;

#[derive(Subcommand)]
pub enum ProfileAction {
    /// Show the profile
    Show,
    /// Set the display name (completes onboarding)
    Name {
        /// Display name
        name: String,
    },
}

pub async fn run(action: ProfileAction) -> Result<(), Box<dyn std::error::Error>> {
    let ctx = Context::connect().await?;
    let session = ctx.loaded_session().await?;

    match action {
        ProfileAction::Show => {
            let profile = session.profile().ok_or("no profile found")?;
            if profile.needs_onboarding() {
                eprintln!("Welcome to Anchor! Pick a name with `profile name <NAME>`.");
            }
            println!("{}", serde_json::to_string_pretty(&profile)?);
        }
        ProfileAction::Name { name } => {
            let profile = session.complete_onboarding(&name).await?;
            println!("Nice to meet you, {}!", profile.name);
        }
    }
    Ok(())
}
