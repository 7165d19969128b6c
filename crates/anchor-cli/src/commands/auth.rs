use clap::Subcommand;

use anchor_core::gateway::SignUpOutcome;
use anchor_core::storage::BackendKind;

use crate::context::Context;

#[derive(Subcommand)]
pub enum AuthAction {
    /// Create an account
    Signup {
        #[arg(long)]
        email: String,
        #[arg(long, env = "ANCHOR_PASSWORD", hide_env_values = true)]
        password: String,
        /// Display name stored on the profile
        #[arg(long)]
        name: String,
    },
    /// Sign in with email and password
    Login {
        #[arg(long)]
        email: String,
        #[arg(long, env = "ANCHOR_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Sign out and forget the saved session
    Logout,
    /// Show who is signed in
    Status,
}

pub async fn run(action: AuthAction) -> Result<(), Box<dyn std::error::Error>> {
    let ctx = Context::connect().await?;
    match action {
        AuthAction::Signup {
            email,
            password,
            name,
        } => {
            if name.trim().is_empty() {
                return Err("name must not be empty".into());
            }
            match ctx.auth()?.sign_up(&email, &password, &name).await? {
                SignUpOutcome::SignedIn(user) => println!("Signed up and signed in as {user}"),
                SignUpOutcome::ConfirmationRequired(_) => {
                    println!("Check your email to confirm the account, then run `auth login`.")
                }
            }
        }
        AuthAction::Login { email, password } => {
            let user = ctx.auth()?.sign_in_with_password(&email, &password).await?;
            println!("Signed in as {user}");
        }
        AuthAction::Logout => {
            ctx.auth()?.sign_out().await?;
            println!("Signed out");
        }
        AuthAction::Status => {
            let backend = match ctx.config.backend.kind {
                BackendKind::Local => "local",
                BackendKind::Supabase => "supabase",
            };
            let status = serde_json::json!({
                "backend": backend,
                "signed_in": ctx.identity.current_user_id().is_some(),
                "user_id": ctx.identity.current_user_id(),
            });
            println!("{}", serde_json::to_string_pretty(&status)?);
        }
    }
    Ok(())
}
