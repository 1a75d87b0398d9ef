//! OS side effects of settings changes.
//!
//! `diff` is pure: it compares two documents and lists the calls to make.
//! `apply` performs them and absorbs every failure.

use crate::autolaunch::AutoLauncher;
use crate::settings::SettingsDocument;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SideEffect {
    /// `startWithSystem` changed.
    SetAutoLaunch { enabled: bool, hidden: bool },
    /// `startInTray` changed while start-with-system stays on: re-register with the new flag.
    RefreshAutoLaunch { hidden: bool },
}

pub fn diff(old: &SettingsDocument, new: &SettingsDocument) -> Vec<SideEffect> {
    let (old_sys, new_sys) = (&old.system, &new.system);
    let mut effects = Vec::new();

    if old_sys.start_with_system != new_sys.start_with_system {
        effects.push(SideEffect::SetAutoLaunch {
            enabled: new_sys.start_with_system,
            hidden: new_sys.start_in_tray,
        });
    } else if new_sys.start_with_system && old_sys.start_in_tray != new_sys.start_in_tray {
        effects.push(SideEffect::RefreshAutoLaunch {
            hidden: new_sys.start_in_tray,
        });
    }

    effects
}

/// Run each effect. Returns how many failed (already logged).
pub fn apply(launcher: &dyn AutoLauncher, effects: &[SideEffect]) -> usize {
    let mut failed = 0;
    for effect in effects {
        let result = match *effect {
            SideEffect::SetAutoLaunch { enabled: true, hidden } => launcher.enable(hidden),
            SideEffect::SetAutoLaunch { enabled: false, .. } => launcher.disable(),
            SideEffect::RefreshAutoLaunch { hidden } => launcher.enable(hidden),
        };
        match result {
            Ok(()) => tracing::info!(effect = ?effect, "Side effect applied"),
            Err(e) => {
                tracing::warn!(effect = ?effect, error = %e, "Side effect failed (ignored)");
                failed += 1;
            }
        }
    }
    failed
}

/// Startup check: bring the launcher registration in line with `doc`.
pub fn reconcile(launcher: &dyn AutoLauncher, doc: &SettingsDocument) {
    let registered = match launcher.is_enabled() {
        Ok(registered) => registered,
        Err(e) => {
            tracing::warn!(error = %e, "Cannot query autostart state, skipping reconciliation");
            return;
        }
    };

    let wanted = doc.system.start_with_system;
    if registered == wanted {
        return;
    }

    tracing::info!(registered = registered, wanted = wanted, "Autostart out of sync, reconciling");
    apply(
        launcher,
        &[SideEffect::SetAutoLaunch {
            enabled: wanted,
            hidden: doc.system.start_in_tray,
        }],
    );
}
