//! Prompt construction and response parsing for scoring and planning.

use std::sync::LazyLock;

use cfactory_core::{ContentView, PlanStructure};
use regex::Regex;

use crate::error::AnalyzerError;

/// Characters of caption included in a scoring prompt.
pub const SCORE_CAPTION_CHARS: usize = 300;

static FIRST_INTEGER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"-?\d+").expect("valid integer regex"));

/// Returns at most `max_chars` characters of `text`, never splitting a char.
#[must_use]
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => &text[..byte_idx],
        None => text,
    }
}

#[must_use]
pub fn score_prompt(item: &ContentView<'_>) -> String {
    let caption = item
        .caption
        .map_or("No caption", |c| truncate_chars(c, SCORE_CAPTION_CHARS));

    format!(
        "Оцени релевантность этого поста для селлеров Wildberries и инвесторов в маркетплейсы.\n\
         Ответь только одним целым числом от 0 до 100.\n\
         \n\
         Caption: {caption}\n\
         Likes: {likes}\n\
         Views: {views}\n\
         Author: {author}\n",
        likes = item.metric("likes"),
        views = item.metric("views"),
        author = item.author(),
    )
}

#[must_use]
pub fn plan_prompt(item: &ContentView<'_>) -> String {
    let source = item.caption.unwrap_or("No caption");

    format!(
        "Ты редактор экспертного контента для селлеров и менеджеров Wildberries.\n\
         На основе материала ниже составь карусель для Instagram из 8-10 слайдов:\n\
         обложка, основные слайды и финальный призыв к действию.\n\
         \n\
         Материал:\n{source}\n\
         \n\
         Верни только JSON вида:\n\
         {{\"title\": \"...\", \"description\": \"...\", \"slides\": [{{\"number\": 1, \
         \"type\": \"cover\", \"headline\": \"...\", \"body_text\": \"...\", \
         \"visual_hint\": \"...\"}}], \"cta_final\": {{\"text\": \"...\", \"link\": \"...\"}}}}\n"
    )
}

/// Parses the first integer in a model reply into a score in `[0, 100]`.
///
/// Replies with no integer score `0`. Integers of any length saturate at
/// the nearest bound.
#[must_use]
pub fn parse_score(reply: &str) -> f64 {
    FIRST_INTEGER
        .find(reply)
        .and_then(|m| m.as_str().parse::<f64>().ok())
        .map_or(0.0, |n| n.clamp(0.0, 100.0))
}

/// Parses a JSON-mode reply into a plan.
///
/// # Errors
///
/// Returns [`AnalyzerError::Deserialize`] for non-JSON or mistyped fields,
/// and [`AnalyzerError::InvalidPlan`] when the plan has no slides.
pub fn parse_plan(reply: &str) -> Result<PlanStructure, AnalyzerError> {
    let plan = serde_json::from_str::<PlanStructure>(reply).map_err(|e| {
        AnalyzerError::Deserialize {
            context: "carousel plan".to_string(),
            source: e,
        }
    })?;

    if plan.slides.is_empty() {
        return Err(AnalyzerError::InvalidPlan("plan has no slides".to_string()));
    }

    Ok(plan.normalized())
}

#[cfg(test)]
#[path = "prompt_test.rs"]
mod tests;
