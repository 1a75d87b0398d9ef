use anyhow::{Context, Result};

use settings_store::storage::{database, migrations};

use super::load_config;

/// `migrate`: run pending steps on the configured database, then print the ledger.
pub fn run(db: Option<&str>) -> Result<()> {
    let config = load_config(db);
    let path = config.database_path();
    let conn = database::open_connection(&path)
        .with_context(|| format!("Failed to open {}", path.display()))?;

    let ran = migrations::run_migrations(&conn)?;
    if ran.is_empty() {
        println!("Schema up to date ({})", path.display());
    } else {
        for name in &ran {
            println!("Applied {}", name);
        }
    }

    println!("\nLedger:");
    for name in migrations::applied_migrations(&conn)? {
        println!("  {}", name);
    }
    Ok(())
}
