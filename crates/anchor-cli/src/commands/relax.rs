use clap::Subcommand;

use anchor_core::relaxation;

#[derive(Subcommand)]
pub enum RelaxAction {
    /// List environments
    List,
    /// Show one environment
    Show {
        /// Environment ID (forest, ocean, mountain, clouds)
        id: String,
    },
}

pub fn run(action: RelaxAction) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        RelaxAction::List => {
            println!("{}", serde_json::to_string_pretty(relaxation::environments())?);
        }
        RelaxAction::Show { id } => {
            let env = relaxation::environment(&id)?;
            println!("{}", env.name);
            println!("{}", env.description);
            println!("Ambient sound: {}", env.ambient_sound);
            println!("{}", env.image_url);
        }
    }
    Ok(())
}
