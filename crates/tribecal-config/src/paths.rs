//! Platform-specific configuration paths.
//!
//! - **User config**: `~/.config/tribecal/` (Linux),
//!   `~/Library/Application Support/tribecal/` (macOS), `%APPDATA%\tribecal\` (Windows)
//!
//! ```rust,no_run
//! use tribecal_config::paths;
//!
//! println!("Config file: {:?}", paths::default_config_file());
//! ```

use std::path::PathBuf;

/// Application name used for directory paths.
const APP_NAME: &str = "tribecal";

/// File name of the user configuration.
pub const CONFIG_FILE_NAME: &str = "tribecal.toml";

/// Returns the user-specific configuration directory.
///
/// Falls back to the current directory if the platform config directory
/// cannot be determined.
pub fn user_config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_NAME)
}

/// Returns the path of the user configuration file.
pub fn default_config_file() -> PathBuf {
    user_config_dir().join(CONFIG_FILE_NAME)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_file_under_app_dir() {
        let file = default_config_file();
        assert!(file.ends_with("tribecal/tribecal.toml"));
        assert!(file.starts_with(user_config_dir()));
    }
}
