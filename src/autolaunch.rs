//! OS "launch at login" registration.
//!
//! The manager only talks to the `AutoLauncher` trait. `DesktopEntryLauncher`
//! registers through an XDG autostart `.desktop` file and is only picked on
//! Linux. `NoopLauncher` is used elsewhere and when auto-launch is turned off
//! in the store config.

use std::path::{Path, PathBuf};

use crate::constants::HIDDEN_LAUNCH_ARG;
use crate::storage::path_utils;
use crate::StoreResult;

pub trait AutoLauncher: Send + Sync {
    /// Whether the app is currently registered to start at login.
    fn is_enabled(&self) -> StoreResult<bool>;
    /// Register (or re-register) the app. `hidden` starts it without a window.
    fn enable(&self, hidden: bool) -> StoreResult<()>;
    fn disable(&self) -> StoreResult<()>;
}

/// Does nothing and reports "not registered".
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopLauncher;

impl AutoLauncher for NoopLauncher {
    fn is_enabled(&self) -> StoreResult<bool> {
        Ok(false)
    }

    fn enable(&self, _hidden: bool) -> StoreResult<()> {
        Ok(())
    }

    fn disable(&self) -> StoreResult<()> {
        Ok(())
    }
}

/// XDG autostart entry at `{autostart_dir}/{app_name}.desktop`.
#[derive(Debug, Clone)]
pub struct DesktopEntryLauncher {
    app_name: String,
    exec_path: PathBuf,
    autostart_dir: PathBuf,
}

impl DesktopEntryLauncher {
    pub fn new(app_name: impl Into<String>, exec_path: impl Into<PathBuf>, autostart_dir: impl Into<PathBuf>) -> Self {
        Self {
            app_name: app_name.into(),
            exec_path: exec_path.into(),
            autostart_dir: autostart_dir.into(),
        }
    }

    /// Entry for the running executable in the user's autostart dir.
    pub fn for_current_exe(app_name: impl Into<String>) -> Self {
        let exec_path = std::env::current_exe().unwrap_or_else(|_| PathBuf::from("settings-store"));
        Self::new(app_name, exec_path, path_utils::autostart_dir())
    }

    pub fn entry_path(&self) -> PathBuf {
        self.autostart_dir.join(format!("{}.desktop", self.app_name))
    }

    fn render(&self, hidden: bool) -> String {
        let mut exec = quote_exec(&self.exec_path);
        if hidden {
            exec.push(' ');
            exec.push_str(HIDDEN_LAUNCH_ARG);
        }
        format!(
            "[Desktop Entry]\nType=Application\nVersion=1.0\nName={name}\nComment={name} startup script\nExec={exec}\nStartupNotify=false\nTerminal=false\nX-GNOME-Autostart-enabled=true\n",
            name = self.app_name,
            exec = exec,
        )
    }
}

fn quote_exec(path: &Path) -> String {
    let raw = path.to_string_lossy();
    if raw.contains(' ') {
        format!("\"{}\"", raw)
    } else {
        raw.into_owned()
    }
}

impl AutoLauncher for DesktopEntryLauncher {
    fn is_enabled(&self) -> StoreResult<bool> {
        Ok(self.entry_path().exists())
    }

    fn enable(&self, hidden: bool) -> StoreResult<()> {
        std::fs::create_dir_all(&self.autostart_dir)?;
        let path = self.entry_path();
        std::fs::write(&path, self.render(hidden))?;
        tracing::info!(path = %path.display(), hidden = hidden, "Autostart entry written");
        Ok(())
    }

    fn disable(&self) -> StoreResult<()> {
        let path = self.entry_path();
        if path.exists() {
            std::fs::remove_file(&path)?;
            tracing::info!(path = %path.display(), "Autostart entry removed");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn launcher(dir: &Path) -> DesktopEntryLauncher {
        DesktopEntryLauncher::new("notes", "/opt/notes/bin/notes", dir.join("autostart"))
    }

    #[test]
    fn test_enable_writes_entry() {
        let dir = tempfile::tempdir().unwrap();
        let l = launcher(dir.path());
        assert!(!l.is_enabled().unwrap());

        l.enable(false).unwrap();
        assert!(l.is_enabled().unwrap());
        let content = std::fs::read_to_string(l.entry_path()).unwrap();
        assert!(content.contains("Exec=/opt/notes/bin/notes\n"));
        assert!(content.contains("Name=notes"));
    }

    #[test]
    fn test_hidden_adds_argument() {
        let dir = tempfile::tempdir().unwrap();
        let l = launcher(dir.path());
        l.enable(true).unwrap();
        let content = std::fs::read_to_string(l.entry_path()).unwrap();
        assert!(content.contains("Exec=/opt/notes/bin/notes --hidden\n"));

        // Re-registering without hidden rewrites the entry
        l.enable(false).unwrap();
        let content = std::fs::read_to_string(l.entry_path()).unwrap();
        assert!(!content.contains("--hidden"));
    }

    #[test]
    fn test_disable_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let l = launcher(dir.path());
        l.disable().unwrap();
        l.enable(false).unwrap();
        l.disable().unwrap();
        assert!(!l.is_enabled().unwrap());
    }

    #[test]
    fn test_exec_path_with_spaces_is_quoted() {
        assert_eq!(quote_exec(Path::new("/Apps/My App/app")), "\"/Apps/My App/app\"");
        assert_eq!(quote_exec(Path::new("/usr/bin/app")), "/usr/bin/app");
    }

    #[test]
    fn test_noop_reports_disabled() {
        let l = NoopLauncher;
        l.enable(true).unwrap();
        assert!(!l.is_enabled().unwrap());
    }
}
