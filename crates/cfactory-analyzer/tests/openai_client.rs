//! Integration tests for `OpenAiClient` against a local `wiremock` server.

use cfactory_analyzer::{AnalyzerError, ContentAnalyzer, OpenAiClient};
use cfactory_core::ContentView;
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn test_client(server: &MockServer) -> OpenAiClient {
    OpenAiClient::with_base_url("sk-test", "gpt-test", 5, &server.uri())
        .expect("failed to build test OpenAiClient")
}

fn completion(content: &str) -> serde_json::Value {
    json!({
        "id": "chatcmpl-1",
        "object": "chat.completion",
        "choices": [{
            "index": 0,
            "message": { "role": "assistant", "content": content },
            "finish_reason": "stop"
        }]
    })
}

fn item_metadata() -> serde_json::Value {
    json!({ "likes": 10, "views": 250, "author": "wb_seller" })
}

#[tokio::test]
async fn score_relevance_parses_model_reply() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(header("authorization", "Bearer sk-test"))
        .and(body_partial_json(json!({ "model": "gpt-test", "max_tokens": 10 })))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion(" 87 ")))
        .expect(1)
        .mount(&server)
        .await;

    let metadata = item_metadata();
    let item = ContentView {
        url: "https://www.instagram.com/p/1/",
        caption: Some("Как поднять карточку в выдаче"),
        metadata: &metadata,
    };

    let score = test_client(&server).score_relevance(item).await;
    assert!((score - 87.0).abs() < f64::EPSILON);
}

#[tokio::test]
async fn score_relevance_degrades_to_zero_on_server_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500).set_body_string("overloaded"))
        .mount(&server)
        .await;

    let metadata = item_metadata();
    let item = ContentView {
        url: "https://www.instagram.com/p/2/",
        caption: None,
        metadata: &metadata,
    };

    let client = test_client(&server);
    assert!(client.score_relevance(item).await.abs() < f64::EPSILON);

    let err = client.try_score(&item).await.expect_err("500 must fail");
    match err {
        AnalyzerError::Api { status, message } => {
            assert_eq!(status, 500);
            assert_eq!(message, "overloaded");
        }
        other => panic!("expected Api error, got: {other:?}"),
    }
}

#[tokio::test]
async fn score_relevance_with_no_choices_is_zero() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "choices": [] })))
        .mount(&server)
        .await;

    let metadata = item_metadata();
    let item = ContentView {
        url: "https://www.instagram.com/p/3/",
        caption: Some("text"),
        metadata: &metadata,
    };

    let client = test_client(&server);
    let err = client.try_score(&item).await.expect_err("no choices");
    assert!(matches!(err, AnalyzerError::EmptyResponse));
    assert!(client.score_relevance(item).await.abs() < f64::EPSILON);
}

#[tokio::test]
async fn generate_plan_requests_json_mode_and_parses_slides() {
    let server = MockServer::start().await;

    let plan = json!({
        "title": "Как выйти в топ",
        "description": "Пошаговый разбор",
        "slides": [
            { "number": 1, "type": "cover", "headline": "Выход в топ" },
            { "number": 2, "type": "body", "headline": "Шаг 1", "body_text": "SEO карточки" },
            { "number": 3, "type": "cta", "headline": "Итог" }
        ],
        "cta_final": { "text": "Подписывайся", "link": null }
    });

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(body_partial_json(json!({
            "response_format": { "type": "json_object" }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion(&plan.to_string())))
        .expect(1)
        .mount(&server)
        .await;

    let metadata = item_metadata();
    let item = ContentView {
        url: "https://www.instagram.com/p/4/",
        caption: Some("source"),
        metadata: &metadata,
    };

    let plan = test_client(&server)
        .generate_plan(item)
        .await
        .expect("plan");

    assert_eq!(plan.title, "Как выйти в топ");
    assert_eq!(plan.slides.len(), 3);
    assert_eq!(plan.slides[1].body_text.as_deref(), Some("SEO карточки"));
    assert_eq!(
        plan.cta_final.as_ref().map(|c| c.text.as_str()),
        Some("Подписывайся")
    );
}

#[tokio::test]
async fn generate_plan_returns_none_for_prose_reply() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(completion("I cannot help with that.")),
        )
        .mount(&server)
        .await;

    let metadata = item_metadata();
    let item = ContentView {
        url: "https://www.instagram.com/p/5/",
        caption: Some("source"),
        metadata: &metadata,
    };

    assert!(test_client(&server).generate_plan(item).await.is_none());
}
