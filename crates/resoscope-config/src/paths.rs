//! Platform-specific paths for configuration and recordings.
//!
//! # Directory Structure
//!
//! - **User config**: `~/.config/resoscope/` (Linux), `~/Library/Application Support/resoscope/` (macOS), `%APPDATA%\resoscope\` (Windows)
//! - **Recordings**: `~/.local/share/resoscope/recordings/` (Linux), `~/Library/Application Support/resoscope/recordings/` (macOS), `%APPDATA%\resoscope\recordings\` (Windows)

use std::path::PathBuf;

/// Application name used for directory paths.
const APP_NAME: &str = "resoscope";

/// Name of the configuration file inside [`user_config_dir`].
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Subdirectory name for recordings.
const RECORDINGS_SUBDIR: &str = "recordings";

/// Returns the user-specific configuration directory.
///
/// Returns a fallback path if the config directory cannot be determined.
pub fn user_config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_NAME)
}

/// Returns the default configuration file path.
pub fn default_config_file() -> PathBuf {
    user_config_dir().join(CONFIG_FILE_NAME)
}

/// Returns the directory recordings are written to when no output path is
/// given.
///
/// Returns a fallback path if the data directory cannot be determined.
pub fn recordings_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_NAME)
        .join(RECORDINGS_SUBDIR)
}

/// Ensures the user configuration directory exists.
pub fn ensure_user_config_dir() -> std::io::Result<PathBuf> {
    let dir = user_config_dir();
    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paths_end_with_app_name() {
        assert!(user_config_dir().ends_with(APP_NAME));
        assert!(default_config_file().ends_with("resoscope/config.toml"));
        assert!(recordings_dir().ends_with("resoscope/recordings"));
    }
}
