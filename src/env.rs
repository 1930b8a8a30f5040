use std::env;
use std::path::PathBuf;

/// Returns the root directory holding the launcher configuration and the cached index.
pub fn default_app_dir() -> PathBuf {
    let base = match env::consts::OS {
        "windows" => env::var_os("APPDATA")
            .or_else(|| env::var_os("LOCALAPPDATA"))
            .map(PathBuf::from),
        "macos" => env::var_os("HOME")
            .map(PathBuf::from)
            .map(|home| home.join("Library").join("Application Support")),
        _ => env::var_os("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .or_else(|| env::var_os("HOME").map(|home| PathBuf::from(home).join(".config"))),
    }
    .unwrap_or_else(|| PathBuf::from("."));

    base.join("distro-sync")
}

pub fn config_file() -> PathBuf {
    default_app_dir().join("config.json")
}

pub fn distribution_file() -> PathBuf {
    default_app_dir().join("distribution.json")
}
