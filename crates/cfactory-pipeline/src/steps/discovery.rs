//! Finds candidate source accounts by keyword search.

use cfactory_db::NewAccount;
use serde_json::json;

use crate::context::PipelineContext;
use crate::error::PipelineError;
use crate::params::{parse_params, DiscoveryParams};
use crate::runner::StepOutcome;

const CANDIDATE_CATEGORY: &str = "candidate";

pub(crate) async fn run(
    ctx: &PipelineContext,
    config: &serde_json::Value,
) -> Result<StepOutcome, PipelineError> {
    let params: DiscoveryParams = parse_params(config)?;

    // Every query is fetched before anything is written, so an upstream
    // failure leaves no partial batch behind.
    let mut profiles = Vec::new();
    for query in &params.queries {
        let found = ctx
            .scraper
            .discover_profiles(&params.actor_id, query, params.limit_per_query)
            .await?;
        tracing::debug!(query = %query, found = found.len(), "discovery query returned");
        profiles.extend(found);
    }

    let found = profiles.len();
    let mut saved = 0_usize;
    for profile in &profiles {
        let Some(username) = profile.username.as_deref() else {
            continue;
        };
        let followers = profile.followers.and_then(|n| i32::try_from(n).ok());
        let inserted = cfactory_db::insert_account_if_absent(
            &ctx.pool,
            &NewAccount {
                platform: &params.platform,
                username,
                followers,
                category: Some(CANDIDATE_CATEGORY),
            },
        )
        .await?;
        if inserted.is_some() {
            saved += 1;
        }
    }

    tracing::info!(found, saved, "discovery finished");
    Ok(StepOutcome::Completed(json!({ "found": found, "saved": saved })))
}
