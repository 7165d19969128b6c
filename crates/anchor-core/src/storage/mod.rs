mod config;
pub mod database;

pub use config::{BackendConfig, BackendKind, ChatConfig, Config};
pub use database::Database;

use std::path::PathBuf;

/// Returns `~/.config/anchor[-dev]/` based on ANCHOR_ENV.
///
/// Set ANCHOR_ENV=dev to use development data directory.
///
/// # Errors
/// Returns an error if creating the data directory fails.
pub fn data_dir() -> Result<PathBuf, std::io::Error> {
    let base_dir = dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config");

    let env = std::env::var("ANCHOR_ENV").unwrap_or_else(|_| "production".to_string());

    let dir = if env == "dev" {
        base_dir.join("anchor-dev")
    } else {
        base_dir.join("anchor")
    };

    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}
