//! Vetclinic operator CLI
//!
//! Runs criteria queries, writes and free-text searches against the clinic
//! store and search index, and rebuilds the index from the store.

mod commands;
mod config;

use clap::Parser;
use tracing::info;
use vetclinic_persistence::clinic::Clinic;

use crate::config::CliConfig;

/// Initializes the tracing subscriber for logging.
///
/// `RUST_LOG` takes precedence over the configured level. Logs go to stderr
/// so command output on stdout stays parseable.
fn init_logging(level: &str) {
    use tracing_subscriber::{EnvFilter, fmt, prelude::*};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!("vetclinic={level},vetclinic_persistence={level}"))
    });

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = CliConfig::parse();
    init_logging(&config.log_level);

    if let Err(errors) = config.validate() {
        for error in &errors {
            eprintln!("Configuration error: {}", error);
        }
        std::process::exit(1);
    }

    info!(
        database = %config.database_url,
        index = %config.index_url,
        mirror_mode = ?config.mirror_mode,
        "Opening clinic"
    );

    let clinic = Clinic::open(&config.clinic_config())?;
    let outcome = commands::run(&clinic, &config).await?;
    println!("{}", outcome.output);

    if !outcome.success {
        std::process::exit(1);
    }

    Ok(())
}

#[cfg(not(feature = "sqlite"))]
compile_error!("At least one database backend feature must be enabled");
