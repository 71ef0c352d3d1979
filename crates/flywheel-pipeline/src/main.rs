//! Nightly job entry point: open the database, run the four phases, print
//! the run report as JSON.

use std::env;
use std::path::PathBuf;

use anyhow::Context;

use flywheel_core::config::Settings;
use flywheel_pipeline::{observability, run_nightly};
use flywheel_storage::StorageEngine;

fn main() -> anyhow::Result<()> {
    observability::init_tracing();

    let db_path = env::var("FLYWHEEL_DB_PATH")
        .map(PathBuf::from)
        .context("FLYWHEEL_DB_PATH must point at the event-store database")?;
    let settings = Settings::from_env();

    let engine = StorageEngine::open(&db_path)
        .with_context(|| format!("opening database at {}", db_path.display()))?;
    let report = run_nightly(&engine, &settings)?;

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
