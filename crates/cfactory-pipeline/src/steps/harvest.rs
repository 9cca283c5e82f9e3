//! Pulls recent posts from the least recently harvested accounts, or from
//! hashtag search when the run names hashtags.

use std::collections::HashSet;

use cfactory_db::NewContentItem;
use cfactory_scraper::HarvestedPost;
use serde_json::json;

use super::sql_limit;
use crate::context::PipelineContext;
use crate::error::PipelineError;
use crate::params::{parse_params, HarvestParams};
use crate::runner::StepOutcome;

pub(crate) async fn run(
    ctx: &PipelineContext,
    config: &serde_json::Value,
) -> Result<StepOutcome, PipelineError> {
    let params: HarvestParams = parse_params(config)?;
    if !params.hashtags.is_empty() {
        return run_hashtags(ctx, &params).await;
    }

    let accounts =
        cfactory_db::list_harvest_targets(&ctx.pool, sql_limit(params.accounts_limit)).await?;
    if accounts.is_empty() {
        tracing::info!("no active accounts to harvest");
        return Ok(StepOutcome::Completed(json!({
            "found": 0,
            "saved": 0,
            "message": "no active accounts to harvest",
        })));
    }

    let usernames: Vec<String> = accounts.iter().map(|a| a.username.clone()).collect();
    let posts = ctx
        .scraper
        .fetch_posts(&params.actor_id, &usernames, params.posts_per_profile)
        .await?;

    let found = posts.len();
    let saved = save_posts(ctx, &posts).await?;

    let account_ids: Vec<i64> = accounts.iter().map(|a| a.id).collect();
    cfactory_db::mark_accounts_harvested(&ctx.pool, &account_ids).await?;

    tracing::info!(accounts = accounts.len(), found, saved, "harvest finished");
    Ok(StepOutcome::Completed(json!({
        "found": found,
        "saved": saved,
        "accounts": accounts.len(),
    })))
}

/// Only reels and albums are kept; single photos make poor carousels.
async fn run_hashtags(
    ctx: &PipelineContext,
    params: &HarvestParams,
) -> Result<StepOutcome, PipelineError> {
    let hashtags = params.normalized_hashtags();
    if hashtags.is_empty() {
        return Err(PipelineError::Validation(
            "hashtags must contain at least one non-blank tag".to_string(),
        ));
    }

    let posts = ctx
        .scraper
        .fetch_hashtag_posts(&params.hashtag_actor_id, &hashtags, params.posts_per_hashtag)
        .await?;

    let found = posts.len();
    let kept: Vec<HarvestedPost> = posts
        .into_iter()
        .filter(HarvestedPost::is_reel_or_album)
        .collect();
    let saved = save_posts(ctx, &kept).await?;

    tracing::info!(
        hashtags = hashtags.len(),
        found,
        kept = kept.len(),
        saved,
        "hashtag harvest finished"
    );
    Ok(StepOutcome::Completed(json!({
        "found": found,
        "kept": kept.len(),
        "saved": saved,
        "hashtags": hashtags,
    })))
}

/// Inserts posts with a URL, once per URL. Returns how many rows were new.
async fn save_posts(ctx: &PipelineContext, posts: &[HarvestedPost]) -> Result<usize, PipelineError> {
    let mut seen = HashSet::new();
    let mut saved = 0_usize;
    for post in posts {
        let Some(url) = post.url.as_deref() else {
            continue;
        };
        if !seen.insert(url) {
            continue;
        }
        let inserted = cfactory_db::insert_content_item_if_absent(
            &ctx.pool,
            &NewContentItem {
                url,
                platform: &post.platform,
                caption: post.caption.as_deref(),
                metadata: &post.metadata,
            },
        )
        .await?;
        if inserted {
            saved += 1;
        }
    }
    Ok(saved)
}
