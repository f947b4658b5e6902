//! Service entrypoint: connects to the store, ensures the schema, and runs
//! the expiry sweep loop until shutdown. Interactive operations live in the
//! library crate and are invoked by the transport layer, which is out of
//! scope here.

use dotenvy::dotenv;
use fireline::clock::{Clock, SystemClock};
use fireline::config::{database, settings};
use fireline::core::sweep::run_sweep_loop;
use fireline::errors::Result;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Initialize tracing (as early as possible)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // 2. Load .env file (non-fatal, env vars can be set externally)
    dotenv().ok();
    info!("Attempted to load .env file.");

    // 3. Load service settings
    let config = settings::load_default_settings()
        .inspect_err(|e| error!("Failed to load configuration: {e}"))?;
    info!(
        default_delay_seconds = config.service.default_delay_seconds,
        sweep_interval_seconds = config.service.sweep_interval_seconds,
        "Loaded service settings."
    );

    // 4. Initialize database
    let db = database::create_connection(&config.database)
        .await
        .inspect(|_| info!("Database connection established."))
        .inspect_err(|e| error!("Failed to connect to database: {e}"))?;
    database::create_tables(&db).await?;

    // 5. Run the expiry sweep until shutdown
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let period = Duration::from_secs(config.service.sweep_interval_seconds);
    let sweep = tokio::spawn(run_sweep_loop(db, clock, period));

    tokio::signal::ctrl_c().await?;
    info!("Shutdown signal received, stopping expiry sweep.");
    sweep.abort();

    Ok(())
}
