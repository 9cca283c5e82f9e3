mod content;
mod runs;

use std::sync::Arc;
use std::time::Duration;

use cfactory_core::AppConfig;
use cfactory_pipeline::{PipelineContext, Worker, WorkerConfig};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::content::ContentCommands;
use crate::runs::RunsCommands;

#[derive(Debug, Parser)]
#[command(name = "cfactory-cli")]
#[command(about = "Content factory command line interface")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Database maintenance
    Db {
        #[command(subcommand)]
        command: DbCommands,
    },
    /// Submit, execute and inspect pipeline runs
    Runs {
        #[command(subcommand)]
        command: RunsCommands,
    },
    /// Review harvested content
    Content {
        #[command(subcommand)]
        command: ContentCommands,
    },
    /// Process queued runs until interrupted
    Worker {
        /// Claim one batch of jobs, wait for it, then exit
        #[arg(long)]
        once: bool,
    },
    /// Fail runs whose worker stopped making progress and release their claims
    Recover {
        /// Override the configured staleness window, in seconds
        #[arg(long)]
        stale_after_secs: Option<u64>,
    },
}

#[derive(Debug, Subcommand)]
enum DbCommands {
    /// Check that the database answers
    Ping,
    /// Apply pending migrations
    Migrate,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let Some(command) = cli.command else {
        println!("cfactory-cli ready; run with --help for commands");
        return Ok(());
    };

    let config = cfactory_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let pool = cfactory_db::connect_pool(
        &config.database_url,
        cfactory_db::PoolConfig::from_app_config(&config),
    )
    .await?;

    match command {
        Commands::Db { command } => run_db(&pool, command).await,
        Commands::Runs { command } => runs::run_runs(pool, &config, command).await,
        Commands::Content { command } => content::run_content(&pool, command).await,
        Commands::Worker { once } => run_worker(pool, &config, once).await,
        Commands::Recover { stale_after_secs } => {
            let stale_after =
                Duration::from_secs(stale_after_secs.unwrap_or(config.stale_run_after_secs));
            run_recover(&pool, stale_after).await
        }
    }
}

async fn run_db(pool: &sqlx::PgPool, command: DbCommands) -> anyhow::Result<()> {
    match command {
        DbCommands::Ping => {
            cfactory_db::health_check(pool).await?;
            println!("database ok");
        }
        DbCommands::Migrate => {
            let applied = cfactory_db::run_migrations(pool).await?;
            println!("applied {applied} migration(s)");
        }
    }
    Ok(())
}

async fn run_worker(pool: sqlx::PgPool, config: &AppConfig, once: bool) -> anyhow::Result<()> {
    let ctx = Arc::new(PipelineContext::from_app_config(pool, config)?);
    let worker = Worker::new(ctx, WorkerConfig::from_app_config(config));

    if once {
        let processed = worker.run_once().await?;
        println!("{} processed {processed} job(s)", worker.worker_id());
        return Ok(());
    }

    let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("received ctrl-c, draining in-flight jobs");
            let _ = shutdown_tx.send(true);
        }
    });
    worker.run(shutdown_rx).await;
    Ok(())
}

async fn run_recover(pool: &sqlx::PgPool, stale_after: Duration) -> anyhow::Result<()> {
    let report = cfactory_pipeline::recover_interrupted(pool, stale_after).await?;
    if report.is_empty() {
        println!("nothing to recover");
    } else {
        println!(
            "failed {} run(s), {} job(s); deleted {} draft plan(s); released {} item(s)",
            report.failed_runs.len(),
            report.failed_jobs,
            report.deleted_plans,
            report.released_items
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests;
