//! TOML-based application configuration.
//!
//! Stores:
//! - Which backend to talk to (offline SQLite or a hosted Supabase project)
//! - Gamification tuning
//! - Chat mock timings
//!
//! Configuration is stored at `~/.config/anchor/config.toml`.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::data_dir;
use crate::error::ConfigError;
use crate::gamification::GamificationConfig;

/// Which persistence backend to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendKind {
    /// Single-user SQLite database in the data directory
    #[default]
    Local,
    /// Hosted Supabase project (PostgREST + GoTrue)
    Supabase,
}

/// Backend connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    #[serde(default)]
    pub kind: BackendKind,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub anon_key: String,
    /// Keep the auth session in the OS keyring between runs.
    #[serde(default = "default_true")]
    pub remember_session: bool,
}

/// Chat mock timings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatConfig {
    #[serde(default = "default_typing_delay_ms")]
    pub typing_delay_ms: u64,
    #[serde(default = "default_reply_delay_ms")]
    pub reply_delay_ms: u64,
}

/// Application configuration.
///
/// Serialized to/from TOML at `~/.config/anchor/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub backend: BackendConfig,
    #[serde(default)]
    pub gamification: GamificationConfig,
    #[serde(default)]
    pub chat: ChatConfig,
}

fn default_true() -> bool {
    true
}
fn default_typing_delay_ms() -> u64 {
    1000
}
fn default_reply_delay_ms() -> u64 {
    2000
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            kind: BackendKind::Local,
            url: String::new(),
            anon_key: String::new(),
            remember_session: true,
        }
    }
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            typing_delay_ms: default_typing_delay_ms(),
            reply_delay_ms: default_reply_delay_ms(),
        }
    }
}

impl Config {
    fn get_json_value_by_path<'a>(
        root: &'a serde_json::Value,
        key: &str,
    ) -> Option<&'a serde_json::Value> {
        if key.is_empty() {
            return None;
        }

        let mut current = root;
        for part in key.split('.') {
            current = current.get(part)?;
        }
        Some(current)
    }

    fn set_json_value_by_path(
        root: &mut serde_json::Value,
        key: &str,
        value: &str,
    ) -> Result<(), ConfigError> {
        let unknown = || ConfigError::UnknownKey(key.to_string());
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };

        let mut parts = key.split('.').peekable();
        if key.is_empty() {
            return Err(unknown());
        }

        let mut current = root;
        while let Some(part) = parts.next() {
            if parts.peek().is_none() {
                let obj = current.as_object_mut().ok_or_else(unknown)?;
                let existing = obj.get(part).ok_or_else(unknown)?;

                let new_value = match existing {
                    serde_json::Value::Bool(_) => serde_json::Value::Bool(
                        value.parse::<bool>().map_err(|e| invalid(e.to_string()))?,
                    ),
                    serde_json::Value::Number(_) => {
                        let n = value.parse::<u64>().map_err(|e| invalid(e.to_string()))?;
                        serde_json::Value::Number(n.into())
                    }
                    serde_json::Value::Object(_) | serde_json::Value::Array(_) => {
                        return Err(invalid("cannot set a whole section".to_string()));
                    }
                    _ => serde_json::Value::String(value.into()),
                };

                obj.insert(part.to_string(), new_value);
                return Ok(());
            }

            current = current.get_mut(part).ok_or_else(unknown)?;
        }

        Err(unknown())
    }

    pub fn path() -> Result<PathBuf, ConfigError> {
        let dir = data_dir().map_err(|e| ConfigError::LoadFailed {
            path: PathBuf::from("~/.config/anchor"),
            message: e.to_string(),
        })?;
        Ok(dir.join("config.toml"))
    }

    /// Load from disk or return default.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed,
    /// or if the default config cannot be written to disk.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::path()?)
    }

    /// Load from an explicit path, writing defaults there if it is missing.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).map_err(|e| ConfigError::LoadFailed {
                path: path.to_path_buf(),
                message: e.to_string(),
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let cfg = Self::default();
                cfg.save_to(path)?;
                Ok(cfg)
            }
            Err(e) => Err(ConfigError::LoadFailed {
                path: path.to_path_buf(),
                message: e.to_string(),
            }),
        }
    }

    /// Persist to disk.
    ///
    /// # Errors
    ///
    /// Returns an error if the config cannot be serialized or written to disk.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let save_failed = |message: String| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message,
        };
        let content = toml::to_string_pretty(self).map_err(|e| save_failed(e.to_string()))?;
        std::fs::write(path, content).map_err(|e| save_failed(e.to_string()))
    }

    /// Apply `ANCHOR_BACKEND`, `ANCHOR_SUPABASE_URL` and
    /// `ANCHOR_SUPABASE_ANON_KEY` on top of the file values.
    pub fn with_env_overrides(mut self) -> Result<Self, ConfigError> {
        if let Ok(kind) = std::env::var("ANCHOR_BACKEND") {
            self.backend.kind = serde_json::from_value(serde_json::Value::String(kind.clone()))
                .map_err(|_| ConfigError::InvalidValue {
                    key: "backend.kind".to_string(),
                    message: format!("unknown backend '{kind}'"),
                })?;
        }
        if let Ok(url) = std::env::var("ANCHOR_SUPABASE_URL") {
            self.backend.url = url;
        }
        if let Ok(key) = std::env::var("ANCHOR_SUPABASE_ANON_KEY") {
            self.backend.anon_key = key;
        }
        Ok(self)
    }

    /// Get a config value as string by dot-separated key.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        let val = Self::get_json_value_by_path(&json, key)?;
        match val {
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Set a config value by key without saving.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown or the value does not fit
    /// the field's type.
    pub fn set_value(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let mut json = serde_json::to_value(&*self).map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        *self = serde_json::from_value(json).map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        Ok(())
    }

    /// Set a config value by key and save.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        self.set_value(key, value)?;
        self.save()
    }

    /// Load from disk, returning default on error.
    /// This is a convenience method that never fails.
    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gamification::LevelUpMode;

    #[test]
    fn default_config_roundtrip() {
        let cfg = Config::default();
        let toml_str = toml::to_string_pretty(&cfg).unwrap();
        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.backend.kind, BackendKind::Local);
        assert_eq!(parsed.gamification.xp_per_check_in, 10);
        assert_eq!(parsed.chat.reply_delay_ms, 2000);
    }

    #[test]
    fn partial_file_fills_defaults() {
        let parsed: Config = toml::from_str(
            "[backend]\nkind = \"supabase\"\nurl = \"https://x.supabase.co\"\n",
        )
        .unwrap();
        assert_eq!(parsed.backend.kind, BackendKind::Supabase);
        assert!(parsed.backend.remember_session);
        assert_eq!(parsed.gamification.level_up, LevelUpMode::Loop);
        assert_eq!(parsed.chat.typing_delay_ms, 1000);
    }

    #[test]
    fn get_supports_dot_path_keys() {
        let cfg = Config::default();
        assert_eq!(cfg.get("backend.kind").as_deref(), Some("local"));
        assert_eq!(cfg.get("gamification.xp_per_check_in").as_deref(), Some("10"));
        assert!(cfg.get("backend.missing_key").is_none());
    }

    #[test]
    fn set_value_updates_enum_and_number() {
        let mut cfg = Config::default();
        cfg.set_value("backend.kind", "supabase").unwrap();
        cfg.set_value("gamification.level_up", "single_step").unwrap();
        cfg.set_value("chat.reply_delay_ms", "0").unwrap();
        assert_eq!(cfg.backend.kind, BackendKind::Supabase);
        assert_eq!(cfg.gamification.level_up, LevelUpMode::SingleStep);
        assert_eq!(cfg.chat.reply_delay_ms, 0);
    }

    #[test]
    fn set_value_rejects_unknown_key_and_bad_values() {
        let mut cfg = Config::default();
        assert!(matches!(
            cfg.set_value("backend.nope", "x"),
            Err(ConfigError::UnknownKey(_))
        ));
        assert!(cfg.set_value("backend.kind", "firebase").is_err());
        assert!(cfg.set_value("backend.remember_session", "maybe").is_err());
        assert!(cfg.set_value("chat", "1").is_err());
        assert_eq!(cfg.backend.kind, BackendKind::Local);
    }

    #[test]
    fn load_from_missing_path_writes_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let cfg = Config::load_from(&path).unwrap();
        assert_eq!(cfg.backend.kind, BackendKind::Local);
        assert!(path.exists());
    }

    #[test]
    fn load_from_rejects_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "backend = 3").unwrap();
        assert!(matches!(
            Config::load_from(&path),
            Err(ConfigError::LoadFailed { .. })
        ));
    }
}
