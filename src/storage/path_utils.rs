use std::path::PathBuf;

/// Environment variable overriding the data directory (tests, portable installs).
pub const DATA_DIR_ENV: &str = "SETTINGS_STORE_DATA_DIR";

/// Centralized cross-platform data directory.
/// Linux: ~/.config/settings-store/
/// macOS: ~/Library/Application Support/settings-store/
/// Windows: %APPDATA%/settings-store/
pub fn data_dir() -> PathBuf {
    if let Ok(dir) = std::env::var(DATA_DIR_ENV) {
        if !dir.is_empty() {
            return PathBuf::from(expand_tilde(&dir));
        }
    }
    let base = dirs::config_dir().unwrap_or_else(|| {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".config")
    });
    base.join("settings-store")
}

/// {data_dir}/store_config.json
pub fn store_config_path() -> PathBuf {
    data_dir().join("store_config.json")
}

/// {data_dir}/settings-store.log
pub fn log_path() -> PathBuf {
    data_dir().join("settings-store.log")
}

/// {data_dir}/backups/
pub fn backups_dir() -> PathBuf {
    data_dir().join("backups")
}

/// XDG autostart directory: ~/.config/autostart/
pub fn autostart_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| {
            dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config")
        })
        .join("autostart")
}

/// Resolve a configured path: absolute paths are kept, relative ones land in the data dir.
pub fn resolve_in_data_dir(path: &str) -> PathBuf {
    let expanded = PathBuf::from(expand_tilde(path));
    if expanded.is_absolute() {
        expanded
    } else {
        data_dir().join(expanded)
    }
}

/// Expand ~ to home directory in paths.
pub fn expand_tilde(path: &str) -> String {
    if path.starts_with("~/") || path == "~" {
        if let Some(home) = dirs::home_dir() {
            return path.replacen('~', &home.to_string_lossy(), 1);
        }
    }
    path.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absolute_paths_are_kept() {
        let abs = if cfg!(windows) { "C:\\data\\s.sqlite" } else { "/var/data/s.sqlite" };
        assert_eq!(resolve_in_data_dir(abs), PathBuf::from(abs));
    }

    #[test]
    fn test_relative_paths_land_in_data_dir() {
        let resolved = resolve_in_data_dir("settings.sqlite");
        assert!(resolved.ends_with("settings.sqlite"));
        assert!(resolved.starts_with(data_dir()));
    }

    #[test]
    fn test_expand_tilde_leaves_plain_paths() {
        assert_eq!(expand_tilde("relative/dir"), "relative/dir");
    }
}
