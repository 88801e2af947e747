pub mod config;
pub mod database;
mod migrations;

pub use config::AppConfig;
pub use database::SqliteStore;

use std::path::PathBuf;

use crate::error::ConfigError;

/// Returns `~/.config/focusroom[-dev]/` based on FOCUSROOM_ENV.
///
/// Set FOCUSROOM_ENV=dev to use the development data directory, or
/// FOCUSROOM_DATA_DIR to point somewhere else entirely.
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> Result<PathBuf, ConfigError> {
    let dir = match std::env::var_os("FOCUSROOM_DATA_DIR") {
        Some(dir) if !dir.is_empty() => PathBuf::from(dir),
        _ => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");
            let env = std::env::var("FOCUSROOM_ENV").unwrap_or_else(|_| "production".to_string());
            if env == "dev" {
                base_dir.join("focusroom-dev")
            } else {
                base_dir.join("focusroom")
            }
        }
    };

    std::fs::create_dir_all(&dir).map_err(|e| ConfigError::DataDir(format!("{}: {e}", dir.display())))?;
    Ok(dir)
}
