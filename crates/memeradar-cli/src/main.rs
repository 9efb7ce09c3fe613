mod analyze;
mod query;

use anyhow::Context;
use clap::{Parser, Subcommand};
use memeradar_core::{AppConfig, WatchlistStatus};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "memeradar")]
#[command(about = "Meme and trend detection over collected social content")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Apply pending database migrations
    Migrate,
    /// Run one analysis cycle over the current bucket
    Analyze {
        /// Print the full cycle report as JSON
        #[arg(long)]
        json: bool,
    },
    /// List recent trend candidates, highest score first
    Trends {
        /// How far back to look, in hours
        #[arg(long, default_value_t = 24)]
        hours: u32,

        #[arg(long, default_value_t = 20)]
        limit: usize,
    },
    /// List lowkey creators on the watchlist
    Watchlist {
        /// Filter by status (active or dropped); shows top active creators when unset
        #[arg(long)]
        status: Option<WatchlistStatus>,

        #[arg(long, default_value_t = 20)]
        limit: usize,
    },
    /// List comment phrases repeated across hot videos
    Phrases {
        /// Minimum number of videos a phrase must appear on
        #[arg(long, default_value_t = 2)]
        min_videos: i64,

        #[arg(long, default_value_t = 20)]
        limit: usize,
    },
}

fn init_tracing(config: &AppConfig) -> anyhow::Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    let Some(command) = cli.command else {
        println!("memeradar ready; run `memeradar --help` for commands");
        return Ok(());
    };

    let config = memeradar_core::load_app_config().context("failed to load configuration")?;
    init_tracing(&config)?;

    let pool = memeradar_db::connect_pool(
        &config.database_url,
        memeradar_db::PoolConfig::from_app_config(&config),
    )
    .await
    .context("failed to connect to database")?;

    match command {
        Commands::Migrate => {
            let applied = memeradar_db::run_migrations(&pool)
                .await
                .context("failed to run migrations")?;
            println!("migrations applied: {applied}");
        }
        Commands::Analyze { json } => analyze::run_analyze(pool, &config, json).await?,
        Commands::Trends { hours, limit } => query::run_trends(pool, hours, limit).await?,
        Commands::Watchlist { status, limit } => {
            query::run_watchlist(pool, &config, status, limit).await?;
        }
        Commands::Phrases { min_videos, limit } => {
            query::run_phrases(pool, min_videos, limit).await?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests;
