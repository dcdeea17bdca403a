//! Populate empty reference tables and exit.
//!
//! Reads the same `config.yml` and environment as the server. Exits with
//! status 1 on any failure.

use anyhow::Result;
use std::path::Path;
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use civicare::{
    config::Config,
    db::{self, Storage},
    services::seed,
};

async fn run() -> Result<()> {
    let config = Config::load_with_env(Path::new("config.yml"))?;

    let pool = db::create_pool(&config.database).await?;
    db::migrations::run_migrations(&pool).await?;

    let result = seed::run(&Storage::from_pool(pool.clone())).await;
    pool.close().await;

    let report = result?;
    tracing::info!(
        hospitals = report.hospitals,
        specialties = report.specialties,
        news = report.news,
        "Seed finished"
    );
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "civicare=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("Error seeding database: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
