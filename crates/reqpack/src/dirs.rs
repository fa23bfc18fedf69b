use std::path::PathBuf;

use etcetera::{BaseStrategy, choose_base_strategy};

/// Per-user configuration directory (`$XDG_CONFIG_HOME/reqpack` on Unix, `%APPDATA%\reqpack` on
/// Windows). `None` when no home directory can be determined.
pub fn user_config_dir() -> Option<PathBuf> {
    choose_base_strategy()
        .ok()
        .map(|strategy| strategy.config_dir().join("reqpack"))
}

/// Path of the user-level config file, whether or not it exists
pub fn user_config_file() -> Option<PathBuf> {
    user_config_dir().map(|dir| dir.join(crate::config::CONFIG_FILE_NAME))
}
