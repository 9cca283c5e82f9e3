//! Turns one content item into a rendered, uploaded carousel.
//!
//! Plan, render, upload, finalize. The plan row is written as a draft first;
//! if anything after that fails the draft is deleted again, and local render
//! artifacts are removed whether or not the run succeeds.

use cfactory_core::{ContentStatus, PlanStructure, Theme};
use cfactory_db::{DbError, FinalizeGeneration, NewPlan};
use cfactory_renderer::{package_carousel, PackagedCarousel, RenderError, SlideRenderer};
use cfactory_storage::carousel_object_key;
use serde_json::json;

use crate::context::PipelineContext;
use crate::error::PipelineError;
use crate::params::{parse_params, GenerationParams};
use crate::runner::StepOutcome;

pub(crate) async fn run(
    ctx: &PipelineContext,
    run_id: i64,
    config: &serde_json::Value,
) -> Result<StepOutcome, PipelineError> {
    let params: GenerationParams = parse_params(config)?;

    let item = cfactory_db::get_content_item(&ctx.pool, params.content_id)
        .await
        .map_err(|e| match e {
            DbError::NotFound => {
                PipelineError::NotFound(format!("content item {}", params.content_id))
            }
            other => PipelineError::Persistence(other),
        })?;
    if item.status == ContentStatus::Archived.as_str() {
        return Err(PipelineError::Validation(format!(
            "content item {} is archived",
            item.id
        )));
    }

    let plan = ctx.analyzer.generate_plan(item.view()).await.ok_or_else(|| {
        PipelineError::Upstream(format!("no carousel plan generated for content item {}", item.id))
    })?;
    let theme = Theme::from_name(&params.theme);

    let structure = serde_json::to_value(&plan)
        .map_err(|e| PipelineError::Validation(format!("plan is not serializable: {e}")))?;
    let draft = cfactory_db::insert_draft_plan(
        &ctx.pool,
        &NewPlan {
            source_id: item.id,
            run_id,
            title: &plan.title,
            description: plan.description.as_deref(),
            structure: &structure,
            theme: theme.as_str(),
        },
    )
    .await?;
    tracing::info!(run_id, plan_id = draft.id, item_id = item.id, "draft plan stored");

    let result = render_and_publish(ctx, run_id, item.id, draft.id, plan, theme).await;
    if result.is_err() {
        match cfactory_db::delete_draft_plan(&ctx.pool, draft.id).await {
            Ok(_) => tracing::debug!(plan_id = draft.id, "draft plan discarded"),
            Err(e) => tracing::error!(
                plan_id = draft.id,
                error = %e,
                "failed to discard draft plan"
            ),
        }
    }
    result
}

async fn render_and_publish(
    ctx: &PipelineContext,
    run_id: i64,
    content_id: i64,
    plan_id: i64,
    plan: PlanStructure,
    theme: Theme,
) -> Result<StepOutcome, PipelineError> {
    let packaged = render(ctx, plan, theme).await?;
    let result = publish(ctx, run_id, content_id, plan_id, &packaged).await;
    packaged.cleanup();
    result
}

/// Renders on a blocking thread; slide drawing and zip writing are CPU and
/// filesystem bound.
async fn render(
    ctx: &PipelineContext,
    plan: PlanStructure,
    theme: Theme,
) -> Result<PackagedCarousel, PipelineError> {
    let fonts = ctx.fonts.clone();
    let output_dir = ctx.output_dir.clone();

    let packaged = tokio::task::spawn_blocking(move || {
        let renderer = SlideRenderer::new(theme, fonts);
        package_carousel(&plan, &renderer, &output_dir)
    })
    .await
    .map_err(|e| {
        RenderError::Io(std::io::Error::other(format!("render task failed: {e}")))
    })??;

    Ok(packaged)
}

async fn publish(
    ctx: &PipelineContext,
    run_id: i64,
    content_id: i64,
    plan_id: i64,
    packaged: &PackagedCarousel,
) -> Result<StepOutcome, PipelineError> {
    let object_key = carousel_object_key(plan_id);
    ctx.store.upload(&packaged.zip_path, &object_key).await?;

    let slide_count = i32::try_from(packaged.slide_count).map_err(|_| {
        PipelineError::Validation(format!("plan has too many slides: {}", packaged.slide_count))
    })?;
    let stats = json!({
        "plan_id": plan_id,
        "slides": packaged.slide_count,
        "object_key": object_key,
    });

    let carousel = cfactory_db::finalize_generation(
        &ctx.pool,
        &FinalizeGeneration {
            run_id,
            plan_id,
            content_id,
            object_key: &object_key,
            slide_count,
            stats: &stats,
        },
    )
    .await?;

    tracing::info!(
        run_id,
        plan_id,
        carousel_id = carousel.id,
        slides = slide_count,
        key = %object_key,
        "carousel published"
    );
    Ok(StepOutcome::Finalized)
}
