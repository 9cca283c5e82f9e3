//! Content review commands.

use cfactory_core::{ContentStatus, TriggerSource};
use clap::Subcommand;

/// Sub-commands available under `content`.
#[derive(Debug, Subcommand)]
pub enum ContentCommands {
    /// List items, highest score first
    List {
        /// Filter by status (pending, scoring, scored, approved, completed, archived)
        #[arg(long)]
        status: Option<String>,
        #[arg(long, default_value = "20")]
        limit: i64,
    },
    /// Approve an item and queue carousel generation for it
    Approve {
        id: i64,
        /// Slide theme: dark or light
        #[arg(long)]
        theme: Option<String>,
    },
    /// Archive an item
    Archive { id: i64 },
}

/// Dispatch a `content` sub-command.
///
/// # Errors
///
/// Returns an error if the item does not exist, cannot move to the requested
/// status, or a database query fails.
pub(crate) async fn run_content(
    pool: &sqlx::PgPool,
    command: ContentCommands,
) -> anyhow::Result<()> {
    match command {
        ContentCommands::List { status, limit } => {
            if let Some(status) = status.as_deref() {
                status.parse::<ContentStatus>()?;
            }
            let items =
                cfactory_db::list_content_items(pool, status.as_deref(), limit.clamp(1, 200))
                    .await?;
            if items.is_empty() {
                println!("no content items found");
                return Ok(());
            }
            println!("{:<8}{:<11}{:<7}URL", "ID", "STATUS", "SCORE");
            for item in &items {
                let score = item
                    .score
                    .map_or_else(|| "-".to_string(), |s| format!("{s:.0}"));
                println!("{:<8}{:<11}{:<7}{}", item.id, item.status, score, item.url);
            }
        }
        ContentCommands::Approve { id, theme } => {
            let run =
                cfactory_pipeline::approve_content(pool, id, theme.as_deref(), TriggerSource::Cli)
                    .await?;
            println!("approved item {id}; queued generation run {}", run.public_id);
        }
        ContentCommands::Archive { id } => {
            let item = cfactory_db::archive_content_item(pool, id).await?;
            println!("item {} is now {}", item.id, item.status);
        }
    }
    Ok(())
}
