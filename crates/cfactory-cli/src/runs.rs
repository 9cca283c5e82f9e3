//! Run submission and ledger commands.
//!
//! `submit` only queues work for a worker; `exec` records a run and executes
//! it in this process without going through the job queue.

use cfactory_core::{AppConfig, RunKind, TriggerSource};
use cfactory_pipeline::PipelineContext;
use clap::Subcommand;

/// Sub-commands available under `runs`.
#[derive(Debug, Subcommand)]
pub enum RunsCommands {
    /// Queue a run for the worker pool
    Submit {
        /// Run kind: discovery, harvest, scoring or generation
        kind: String,
        /// Run parameters as a JSON object
        #[arg(long, default_value = "{}")]
        config: String,
    },
    /// Record a run and execute it immediately in this process
    Exec {
        kind: String,
        #[arg(long, default_value = "{}")]
        config: String,
    },
    /// Show the most recent runs
    List {
        #[arg(long, default_value = "20")]
        limit: i64,
    },
}

pub(crate) fn parse_config(raw: &str) -> anyhow::Result<serde_json::Value> {
    let value: serde_json::Value = serde_json::from_str(raw)
        .map_err(|e| anyhow::anyhow!("--config is not valid JSON: {e}"))?;
    if !value.is_object() {
        anyhow::bail!("--config must be a JSON object");
    }
    Ok(value)
}

/// Dispatch a `runs` sub-command.
///
/// # Errors
///
/// Returns an error if the config is malformed, the kind is unknown, or a
/// database write fails.
pub(crate) async fn run_runs(
    pool: sqlx::PgPool,
    config: &AppConfig,
    command: RunsCommands,
) -> anyhow::Result<()> {
    match command {
        RunsCommands::Submit { kind, config: raw } => {
            let params = parse_config(&raw)?;
            let run =
                cfactory_pipeline::submit_run(&pool, &kind, &params, TriggerSource::Cli).await?;
            println!("queued {} run {}", run.kind, run.public_id);
        }
        RunsCommands::Exec { kind, config: raw } => {
            let params = parse_config(&raw)?;
            let kind: RunKind = kind.parse()?;
            let run = cfactory_db::create_run(
                &pool,
                kind.as_str(),
                &params,
                TriggerSource::Cli.as_str(),
            )
            .await?;

            let ctx = PipelineContext::from_app_config(pool.clone(), config)?;
            let status = cfactory_pipeline::execute_run(&ctx, run.id).await?;
            let finished = cfactory_db::get_run(&pool, run.id).await?;
            println!("{} run {} finished {status}", finished.kind, finished.public_id);
            if let Some(stats) = &finished.stats {
                println!("stats: {stats}");
            }
            if let Some(message) = &finished.error_message {
                println!("error: {message}");
            }
        }
        RunsCommands::List { limit } => print_runs(&pool, limit).await?,
    }
    Ok(())
}

async fn print_runs(pool: &sqlx::PgPool, limit: i64) -> anyhow::Result<()> {
    let runs = cfactory_db::list_runs(pool, limit.clamp(1, 200)).await?;
    if runs.is_empty() {
        println!("no runs recorded yet");
        return Ok(());
    }

    println!("{:<38}{:<12}{:<11}{:<10}CREATED", "RUN", "KIND", "STATUS", "TRIGGER");
    for run in &runs {
        println!(
            "{:<38}{:<12}{:<11}{:<10}{}",
            run.public_id,
            run.kind,
            run.status,
            run.trigger_source,
            run.created_at.format("%Y-%m-%d %H:%M:%S")
        );
    }
    Ok(())
}
