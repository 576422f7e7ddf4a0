//! lode demo binary
//!
//! Loads a small catalog into SQLite and prints it through batched
//! accessors.
//!
//! # Usage
//!
//! ```bash
//! # Defaults: in-memory database, info logging
//! lode-demo
//!
//! # With config file
//! lode-demo --config lode.yaml
//!
//! # Show every batched query
//! RUST_LOG=lode_core=debug,lode_sqlx=debug lode-demo
//! ```

use clap::Parser;
use tracing::info;

use lode_core::metrics::register_loader_metrics;
use lode_core::Engine;
use lode_demo::catalog::{load_authors, load_books, prepare};
use lode_demo::{init_logging, render_catalog, DemoConfig, LoggingConfig};
use lode_sqlx::BoundPool;

/// Prints authors, books and chapters loaded in batches
#[derive(Parser, Debug)]
#[command(name = "lode-demo")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to configuration file (YAML)
    #[arg(short, long)]
    config: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let config = if let Some(config_path) = args.config {
        DemoConfig::load(&config_path)?
    } else {
        DemoConfig::from_env()?
    };

    init_logging(LoggingConfig::from(&config.logging));
    register_loader_metrics();
    info!(
        version = env!("CARGO_PKG_VERSION"),
        batch_size = config.engine.batch_size,
        "Starting lode demo"
    );

    let engine = Engine::with_config(config.engine.clone());
    let db = BoundPool::connect(&config.database.pool_config(), engine).await?;
    prepare(&db).await?;

    let authors = load_authors(&db).await?;
    let books = load_books(&db).await?;
    for line in render_catalog(&db, &authors, &books).await? {
        println!("{line}");
    }

    db.pool().close().await;
    Ok(())
}
