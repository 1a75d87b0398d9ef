// === SQLite Tuning ===
pub const SQLITE_BUSY_TIMEOUT_MS: u32 = 5_000;

// === Settings singleton ===
/// Primary key of the only settings row (enforced by a CHECK constraint).
pub const SETTINGS_ROW_ID: i64 = 1;

// === Options ===
pub const OPTION_KEY_MAX_LEN: usize = 255;

// === Backups ===
pub const AUTO_BACKUP_PREFIX: &str = "settings-auto-backup-";
pub const DEFAULT_BACKUP_RETENTION: usize = 5;

// === Auto-launch ===
/// Argument appended to the launch command when the app should start hidden in the tray.
pub const HIDDEN_LAUNCH_ARG: &str = "--hidden";
