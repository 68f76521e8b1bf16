//! launchpad server.
//!
//! Starts the HTTP surface over the publish-and-serve core:
//! - Storage: Sled KV (users + project registry)
//! - Publishing: staged artifact writes, atomic swap into the projects tree
//! - Serving: path-safe static resolution under `/{username}/{project}`
//!
//! Usage:
//!   cargo run --bin seed_demo    # populate a demo user + project
//!   cargo run --bin launchpad    # start server
//!   # Then drive it with launchpad-cli (see README for curl examples)

use std::path::Path;
use tokio::net::TcpListener;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

use launchpad::config::AppConfig;
use launchpad::publish::Publisher;
use launchpad::rest::create_router;
use launchpad::storage::Storage;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;
    // The guard must outlive the server; dropping it stops the log writer.
    let _log_guard = init_tracing(config.log_dir.as_deref());

    tracing::info!("🚀 launchpad starting");
    if config.uses_dev_secret() {
        tracing::warn!("LAUNCHPAD_SESSION_SECRET not set; using the development fallback");
    }

    std::fs::create_dir_all(&config.projects_root)?;
    let storage = Storage::open(&config.data_dir)?;
    let publisher = Publisher::new(config.projects_root.clone());

    let addr = config.bind_addr;
    let app = create_router(storage, publisher, config);

    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, "listening");
    axum::serve(listener, app.into_make_service()).await?;

    Ok(())
}

/// Env-filtered fmt subscriber; with a log directory configured, output rolls
/// into daily files instead of stdout.
fn init_tracing(log_dir: Option<&Path>) -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    match log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "launchpad.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(writer)
                .with_ansi(false)
                .init();
            Some(guard)
        }
        None => {
            tracing_subscriber::fmt().with_env_filter(filter).init();
            None
        }
    }
}
