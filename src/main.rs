mod cli;

use clap::{ArgAction, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "settings-store", version, about = "Settings Store: inspect and edit app settings and options")]
struct App {
    /// Database file (overrides store_config.json)
    #[arg(long, global = true)]
    db: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Read or change the settings document
    Settings {
        #[command(subcommand)]
        action: SettingsAction,
    },
    /// Read or change free-form options
    Options {
        #[command(subcommand)]
        action: OptionsAction,
    },
    /// Export, import or auto-backup the settings
    Backup {
        #[command(subcommand)]
        action: BackupAction,
    },
    /// Apply pending migrations and print the ledger
    Migrate,
}

#[derive(Subcommand)]
enum SettingsAction {
    /// Display the full settings document
    Show,
    /// Get a value (dot notation: theme.type)
    Get {
        key: String,
    },
    /// Set a value (dot notation: system.startInTray)
    Set {
        key: String,
        /// Value (JSON: true, false, "dark"; bare words are strings)
        value: String,
    },
    /// Restore every setting to its default
    Reset,
}

#[derive(Subcommand)]
enum OptionsAction {
    /// Get an option; with --default a missing key is created
    Get {
        key: String,
        #[arg(long)]
        default: Option<String>,
    },
    Set {
        key: String,
        value: String,
    },
    Delete {
        key: String,
    },
    Has {
        key: String,
    },
    /// List every option with a value
    List,
    GetBool {
        key: String,
        #[arg(long, default_value_t = false, action = ArgAction::Set)]
        default: bool,
    },
    SetBool {
        key: String,
        #[arg(action = ArgAction::Set)]
        value: bool,
    },
    GetNumber {
        key: String,
        #[arg(long, default_value_t = 0.0, allow_hyphen_values = true)]
        default: f64,
    },
    SetNumber {
        key: String,
        #[arg(allow_hyphen_values = true)]
        value: f64,
    },
}

#[derive(Subcommand)]
enum BackupAction {
    /// Export settings to a JSON file (default: backups dir)
    Export {
        path: Option<String>,
    },
    /// Import settings from an export file
    Import {
        path: String,
    },
    /// Write an auto-backup and apply retention
    Auto,
}

fn main() {
    let app = App::parse();
    settings_store::tracing_init::init_stderr_tracing();
    let db = app.db.as_deref();

    let result = match app.command {
        Commands::Settings { action } => match action {
            SettingsAction::Show => cli::settings::run_show(db),
            SettingsAction::Get { key } => cli::settings::run_get(db, &key),
            SettingsAction::Set { key, value } => cli::settings::run_set(db, &key, &value),
            SettingsAction::Reset => cli::settings::run_reset(db),
        },
        Commands::Options { action } => match action {
            OptionsAction::Get { key, default } => cli::options::run_get(db, &key, default.as_deref()),
            OptionsAction::Set { key, value } => cli::options::run_set(db, &key, &value),
            OptionsAction::Delete { key } => cli::options::run_delete(db, &key),
            OptionsAction::Has { key } => cli::options::run_has(db, &key),
            OptionsAction::List => cli::options::run_list(db),
            OptionsAction::GetBool { key, default } => cli::options::run_get_bool(db, &key, default),
            OptionsAction::SetBool { key, value } => cli::options::run_set_bool(db, &key, value),
            OptionsAction::GetNumber { key, default } => cli::options::run_get_number(db, &key, default),
            OptionsAction::SetNumber { key, value } => cli::options::run_set_number(db, &key, value),
        },
        Commands::Backup { action } => match action {
            BackupAction::Export { path } => cli::backup::run_export(db, path.as_deref()),
            BackupAction::Import { path } => cli::backup::run_import(db, &path),
            BackupAction::Auto => cli::backup::run_auto(db),
        },
        Commands::Migrate => cli::migrate::run(db),
    };

    if let Err(e) = result {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}
