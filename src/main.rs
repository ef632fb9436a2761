//! `LinkLedger` service binary.
//!
//! Initializes tracing, loads configuration, prepares the database, seeds
//! the admin settings, and runs the periodic expired-link sweep. Request
//! handling (HTTP routing, auth) lives in a separate layer that calls into
//! the `linkledger` library.

use dotenvy::dotenv;
use linkledger::{
    config::{database, seed},
    core::link,
    errors::Result,
};
use std::time::Duration;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

/// How often expired links are swept.
const SWEEP_INTERVAL: Duration = Duration::from_secs(10 * 60);

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Initialize tracing (as early as possible)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // 2. Load .env file; env vars can also be set externally
    dotenv().ok();
    info!("Attempted to load .env file.");

    // 3. Connect and prepare the database
    let db = database::create_connection()
        .await
        .inspect(|_| info!("Database connection established."))
        .inspect_err(|e| error!("Failed to connect to database: {e}"))?;
    database::create_tables(&db).await?;

    // 4. Seed settings that do not exist yet; a missing config.toml falls
    //    back to built-in defaults
    let seed_config = seed::load_default_config().unwrap_or_else(|e| {
        warn!("Could not load config.toml ({e}); using default seed settings");
        seed::SeedConfig::default()
    });
    seed::seed_database(&db, &seed_config)
        .await
        .inspect(|()| info!("Settings seeded."))
        .inspect_err(|e| error!("Failed to seed settings: {e}"))?;

    // 5. Run the expired-link sweep on an interval
    let mut interval = tokio::time::interval(SWEEP_INTERVAL);
    loop {
        interval.tick().await;
        match link::sweep_expired_links(&db).await {
            Ok(0) => {}
            Ok(flipped) => info!(flipped, "Expired link sweep flipped links"),
            Err(e) => error!("Expired link sweep failed: {e}"),
        }
    }
}
