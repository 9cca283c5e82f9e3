//! Scores a batch of pending content items.

use serde_json::json;

use super::sql_limit;
use crate::context::PipelineContext;
use crate::error::PipelineError;
use crate::params::{parse_params, ScoringParams};
use crate::runner::StepOutcome;

pub(crate) async fn run(
    ctx: &PipelineContext,
    config: &serde_json::Value,
) -> Result<StepOutcome, PipelineError> {
    let params: ScoringParams = parse_params(config)?;

    let items =
        cfactory_db::claim_pending_for_scoring(&ctx.pool, sql_limit(params.batch_size)).await?;
    let claimed = items.len();

    let mut scored = 0_usize;
    for item in &items {
        let score = ctx.analyzer.score_relevance(item.view()).await;
        match cfactory_db::record_score(&ctx.pool, item.id, score).await {
            Ok(()) => scored += 1,
            Err(e) => {
                tracing::error!(item_id = item.id, error = %e, "failed to record score");
                if let Err(release_err) =
                    cfactory_db::release_scoring_claim(&ctx.pool, item.id).await
                {
                    tracing::error!(
                        item_id = item.id,
                        error = %release_err,
                        "failed to release scoring claim"
                    );
                }
            }
        }
    }

    tracing::info!(claimed, scored, "scoring finished");
    Ok(StepOutcome::Completed(json!({ "scored": scored, "claimed": claimed })))
}
