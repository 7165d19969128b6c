use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;
mod context;

#[derive(Parser)]
#[command(name = "anchor-cli", version, about = "Anchor wellness tracker CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Account sign-up / sign-in (hosted backend)
    Auth {
        #[command(subcommand)]
        action: commands::auth::AuthAction,
    },
    /// Profile and onboarding
    Profile {
        #[command(subcommand)]
        action: commands::profile::ProfileAction,
    },
    /// Daily check-ins
    Checkin {
        #[command(subcommand)]
        action: commands::checkin::CheckinAction,
    },
    /// Today's summary
    Dashboard,
    /// Earned and upcoming badges
    Achievements,
    /// Relaxation environments
    Relax {
        #[command(subcommand)]
        action: commands::relax::RelaxAction,
    },
    /// Support chat rooms
    Chat {
        #[command(subcommand)]
        action: commands::chat::ChatAction,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("ANCHOR_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() {
    init_tracing();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Auth { action } => commands::auth::run(action).await,
        Commands::Profile { action } => commands::profile::run(action).await,
        Commands::Checkin { action } => commands::checkin::run(action).await,
        Commands::Dashboard => commands::dashboard::run().await,
        Commands::Achievements => commands::achievements::run().await,
        Commands::Relax { action } => commands::relax::run(action),
        Commands::Chat { action } => commands::chat::run(action).await,
        Commands::Config { action } => commands::config::run(action),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
