use super::*;
use serde_json::json;

fn view<'a>(caption: Option<&'a str>, metadata: &'a serde_json::Value) -> ContentView<'a> {
    ContentView {
        url: "https://www.instagram.com/p/t/",
        caption,
        metadata,
    }
}

#[test]
fn parse_score_takes_first_integer() {
    assert!((parse_score("85") - 85.0).abs() < f64::EPSILON);
    assert!((parse_score("Score: 72/100") - 72.0).abs() < f64::EPSILON);
    assert!((parse_score(" 40 points, maybe 90") - 40.0).abs() < f64::EPSILON);
}

#[test]
fn parse_score_clamps_out_of_range_values() {
    assert!((parse_score("150") - 100.0).abs() < f64::EPSILON);
    assert!(parse_score("-20").abs() < f64::EPSILON);
}

#[test]
fn parse_score_saturates_integers_wider_than_i64() {
    assert!((parse_score("Score: 99999999999999999999") - 100.0).abs() < f64::EPSILON);
    assert!(parse_score("-99999999999999999999").abs() < f64::EPSILON);
    assert!((parse_score(&"9".repeat(400)) - 100.0).abs() < f64::EPSILON);
}

#[test]
fn parse_score_without_digits_is_zero() {
    assert!(parse_score("not relevant").abs() < f64::EPSILON);
    assert!(parse_score("").abs() < f64::EPSILON);
}

#[test]
fn truncate_chars_respects_multibyte_boundaries() {
    let text = "бизнес на вб";
    assert_eq!(truncate_chars(text, 6), "бизнес");
    assert_eq!(truncate_chars(text, 100), text);
    assert_eq!(truncate_chars("", 3), "");
}

#[test]
fn score_prompt_includes_truncated_caption_and_metrics() {
    let caption = "я".repeat(400);
    let metadata = json!({ "likes": 12, "views": 3400, "author": "wb_pro" });
    let prompt = score_prompt(&view(Some(&caption), &metadata));

    assert!(prompt.contains(&"я".repeat(SCORE_CAPTION_CHARS)));
    assert!(!prompt.contains(&"я".repeat(SCORE_CAPTION_CHARS + 1)));
    assert!(prompt.contains("Likes: 12"));
    assert!(prompt.contains("Views: 3400"));
    assert!(prompt.contains("Author: wb_pro"));
}

#[test]
fn score_prompt_handles_missing_caption_and_author() {
    let metadata = json!({});
    let prompt = score_prompt(&view(None, &metadata));
    assert!(prompt.contains("Caption: No caption"));
    assert!(prompt.contains("Author: unknown"));
    assert!(prompt.contains("Likes: 0"));
}

#[test]
fn plan_prompt_embeds_full_caption() {
    let caption = "x".repeat(500);
    let metadata = json!({});
    let prompt = plan_prompt(&view(Some(&caption), &metadata));
    assert!(prompt.contains(&caption));
    assert!(prompt.contains("8-10"));
}

#[test]
fn parse_plan_accepts_model_json_and_numbers_slides() {
    let reply = json!({
        "title": "5 ошибок новичка",
        "slides": [
            { "type": "cover", "headline": "Ошибки" },
            { "number": 2, "type": "body", "headline": "Цена", "body_text": "..." },
        ],
        "cta_final": { "text": "Подписывайся" },
        "hashtags": ["#wb"],
    })
    .to_string();

    let plan = parse_plan(&reply).expect("valid plan");

    assert_eq!(plan.slides.len(), 2);
    assert_eq!(plan.slides[0].number, 1);
    assert_eq!(plan.slides[1].number, 2);
    assert_eq!(plan.extra["hashtags"], json!(["#wb"]));
}

#[test]
fn parse_plan_tolerates_loosely_typed_slides() {
    let reply = r#"{"title":"Guide","slides":[{"number":"1","type":"cover","headline":null},{"number":"2","headline":"Цена"}]}"#;

    let plan = parse_plan(reply).expect("loose slides accepted");

    assert_eq!(plan.slides.len(), 2);
    assert_eq!(plan.slides[0].number, 1);
    assert_eq!(plan.slides[0].headline, "");
    assert_eq!(plan.slides[1].number, 2);
}

#[test]
fn parse_plan_rejects_empty_slides() {
    let err = parse_plan(r#"{"title": "Empty", "slides": []}"#).expect_err("no slides");
    assert!(matches!(err, AnalyzerError::InvalidPlan(_)));
}

#[test]
fn parse_plan_rejects_non_json() {
    let err = parse_plan("Sure! Here is your carousel:").expect_err("not json");
    assert!(matches!(err, AnalyzerError::Deserialize { .. }));
}
