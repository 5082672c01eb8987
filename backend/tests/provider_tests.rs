//! Provider contract tests
//!
//! Checks the request shapes sent to the forecast, imagery catalog and
//! language-model APIs and the mapping of their replies and failures.

mod common;

use std::time::Duration;

use chrono::{TimeZone, Utc};
use common::open_meteo_body;
use ndvi_monitor_backend::external::{
    GeminiClient, ImageryClient, ImageryError, ImagerySettings, LlmError, OpenAiClient,
    WeatherClient, WeatherError,
};
use proptest::prelude::*;
use shared::WeatherCondition;
use tokio_test::{assert_err, assert_ok};
use wiremock::matchers::{body_string_contains, header, method, path, query_param};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

/// Matches when the decoded query parameter contains `needle`
fn query_contains(
    name: &'static str,
    needle: &'static str,
) -> impl Fn(&Request) -> bool + Send + Sync + 'static {
    move |req: &Request| {
        req.url
            .query_pairs()
            .any(|(k, v)| k == name && v.contains(needle))
    }
}

// ============================================================================
// Weather
// ============================================================================

#[tokio::test]
async fn test_weather_request_and_conversion() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/forecast"))
        .and(query_param("latitude", "55.75"))
        .and(query_param("longitude", "37.62"))
        .and(query_param("daily", "precipitation_sum"))
        .and(query_param("past_days", "14"))
        .and(query_param("forecast_days", "1"))
        .and(query_param(
            "current",
            "temperature_2m,relative_humidity_2m,wind_speed_10m,weather_code",
        ))
        .respond_with(ResponseTemplate::new(200).set_body_json(open_meteo_body()))
        .expect(1)
        .mount(&server)
        .await;

    let client = WeatherClient::new(server.uri(), Duration::from_secs(2)).unwrap();
    let snapshot = assert_ok!(client.get_current_weather(55.75, 37.62).await);

    assert_eq!(snapshot.temperature_celsius, 28.0);
    assert_eq!(snapshot.condition, WeatherCondition::Rain);
    assert_eq!(snapshot.wind_speed_mps, 5.0);
    // today's 12 mm is outside the trailing window
    assert_eq!(snapshot.rain_14d_mm, 2.0);
}

#[tokio::test]
async fn test_weather_error_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/forecast"))
        .respond_with(ResponseTemplate::new(429).set_body_string("rate limited"))
        .mount(&server)
        .await;

    let client = WeatherClient::new(server.uri(), Duration::from_secs(2)).unwrap();
    let err = assert_err!(client.get_current_weather(10.0, 10.0).await);
    assert!(matches!(err, WeatherError::Status { status: 429, .. }));
}

#[tokio::test]
async fn test_weather_missing_current_block() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/forecast"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "daily": { "time": [], "precipitation_sum": [] }
        })))
        .mount(&server)
        .await;

    let client = WeatherClient::new(server.uri(), Duration::from_secs(2)).unwrap();
    let err = assert_err!(client.get_current_weather(10.0, 10.0).await);
    assert!(matches!(err, WeatherError::MissingCurrent));
}

// ============================================================================
// Imagery catalog
// ============================================================================

fn imagery(server: &MockServer) -> ImageryClient {
    ImageryClient::new(
        ImagerySettings {
            token_url: format!("{}/token", server.uri()),
            catalog_url: server.uri(),
            client_id: "cdse-public".to_string(),
            collection: "SENTINEL-2".to_string(),
            username: "agronomist".to_string(),
            password: "hunter2".to_string(),
            default_window_start: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
        },
        Duration::from_secs(2),
    )
    .unwrap()
}

async fn mount_token(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/token"))
        .and(body_string_contains("grant_type=password"))
        .and(body_string_contains("client_id=cdse-public"))
        .and(body_string_contains("username=agronomist"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({ "access_token": "abc", "expires_in": 600 })),
        )
        .expect(1)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_catalog_search_shape_and_download_fallback() {
    let server = MockServer::start().await;
    mount_token(&server).await;
    Mock::given(method("GET"))
        .and(path("/Products"))
        .and(header("authorization", "Bearer abc"))
        .and(query_param("$orderby", "ContentDate/Start desc"))
        .and(query_param("$top", "1"))
        .and(query_param("$expand", "Assets"))
        .and(query_contains("$filter", "POINT(37.62 55.75)"))
        .and(query_contains("$filter", "Collection/Name eq 'SENTINEL-2'"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "value": [{
                "Id": "0f1e",
                "Name": "S2A_MSIL1C_20240512",
                "ContentDate": { "Start": "2024-05-12T09:05:59.024Z", "End": "2024-05-12T09:05:59.024Z" },
                "Assets": []
            }]
        })))
        .mount(&server)
        .await;

    let scene = assert_ok!(imagery(&server).find_latest_scene(55.75, 37.62, None, None).await);
    assert_eq!(scene.product_id, "S2A_MSIL1C_20240512");
    assert_eq!(scene.map_url, format!("{}/Products(0f1e)/$value", server.uri()));
    assert_eq!(
        scene.acquired_at,
        Utc.with_ymd_and_hms(2024, 5, 12, 9, 5, 59).unwrap() + chrono::Duration::milliseconds(24)
    );
}

#[tokio::test]
async fn test_empty_catalog_result_is_no_scenes() {
    let server = MockServer::start().await;
    mount_token(&server).await;
    Mock::given(method("GET"))
        .and(path("/Products"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "value": [] })))
        .mount(&server)
        .await;

    let err = assert_err!(imagery(&server).find_latest_scene(1.0, 2.0, None, None).await);
    assert!(matches!(err, ImageryError::NoScenes));
    assert_eq!(err.kind(), "no_scenes");
}

#[tokio::test]
async fn test_rejected_credentials_are_auth_errors() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(401).set_body_string("invalid_grant"))
        .mount(&server)
        .await;

    let err = assert_err!(imagery(&server).find_latest_scene(1.0, 2.0, None, None).await);
    assert_eq!(err.kind(), "auth");
}

// ============================================================================
// Language models
// ============================================================================

#[tokio::test]
async fn test_openai_chat_request() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(header("authorization", "Bearer sk-test"))
        .and(body_string_contains("\"model\":\"gpt-4o-mini\""))
        .and(body_string_contains("\"role\":\"system\""))
        .and(body_string_contains("\"temperature\":0.4"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "choices": [{ "message": { "role": "assistant", "content": "{\"status\":\"ok\"}" } }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = OpenAiClient::new(
        server.uri(),
        "sk-test".to_string(),
        "gpt-4o-mini".to_string(),
        Duration::from_secs(2),
    )
    .unwrap();
    let reply = assert_ok!(client.complete("system", "prompt").await);
    assert_eq!(reply, "{\"status\":\"ok\"}");
}

#[tokio::test]
async fn test_openai_without_choices_is_empty_reply() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "choices": [] })))
        .mount(&server)
        .await;

    let client = OpenAiClient::new(
        server.uri(),
        "sk-test".to_string(),
        "gpt-4o-mini".to_string(),
        Duration::from_secs(2),
    )
    .unwrap();
    let err = assert_err!(client.complete("system", "prompt").await);
    assert!(matches!(err, LlmError::EmptyReply));
}

#[tokio::test]
async fn test_gemini_generate_content_request() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/models/gemini-1.5-flash:generateContent"))
        .and(query_param("key", "g-test"))
        .and(body_string_contains("systemInstruction"))
        .and(body_string_contains("generationConfig"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "candidates": [{
                "content": { "role": "model", "parts": [{ "text": "{\"status\":" }, { "text": "\"ok\"}" }] }
            }]
        })))
        .mount(&server)
        .await;

    let client = GeminiClient::new(
        server.uri(),
        "g-test".to_string(),
        "gemini-1.5-flash".to_string(),
        Duration::from_secs(2),
    )
    .unwrap();
    let reply = assert_ok!(client.complete("system", "prompt").await);
    assert_eq!(reply, "{\"status\":\"ok\"}");
}

#[tokio::test]
async fn test_gemini_error_status() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(403).set_body_string("API key not valid"))
        .mount(&server)
        .await;

    let client = GeminiClient::new(
        server.uri(),
        "bad".to_string(),
        "gemini-1.5-flash".to_string(),
        Duration::from_secs(2),
    )
    .unwrap();
    let err = assert_err!(client.complete("system", "prompt").await);
    assert!(matches!(err, LlmError::Status { status: 403, .. }));
}

// ============================================================================
// Property Tests
// ============================================================================

proptest! {
    /// The catalog filter always carries the point in longitude-latitude order
    #[test]
    fn prop_search_filter_point_order(lat in -90.0f64..=90.0, lon in -180.0f64..=180.0) {
        let from = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let to = Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap();
        let filter = ndvi_monitor_backend::external::imagery::search_filter("SENTINEL-2", lat, lon, from, to);
        let expected = format!("POINT({} {})", lon, lat);
        prop_assert!(filter.contains(&expected));
    }
}
