//! HTTP contract tests for `HttpGateway`
//!
//! Each test stands up a mock gateway and checks the method, path and body
//! shape the client sends, plus how it reads the response.

use std::time::Duration;

use pretty_assertions::assert_eq;
use tokio_test::assert_ok;
use wiremock::matchers::{body_json, body_string_contains, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use inkframe_core::{
    Alignment, ContentGateway, GatewayError, HttpGateway, StagedContent, TextOptions, UploadFile,
};

async fn setup() -> (MockServer, HttpGateway) {
    let server = MockServer::start().await;
    let gateway = HttpGateway::new(&server.uri()).unwrap();
    (server, gateway)
}

// =============================================================================
// /latest
// =============================================================================

#[tokio::test]
async fn latest_text_record() {
    let (server, gateway) = setup().await;
    Mock::given(method("GET"))
        .and(path("/latest"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "type": "text",
            "message": "<b>Happy Birthday</b>"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let latest = gateway.latest().await.unwrap();
    assert_eq!(
        latest,
        Some(StagedContent::Text {
            message: "<b>Happy Birthday</b>".to_string()
        })
    );
}

#[tokio::test]
async fn latest_image_path_is_resolved_against_base() {
    let (server, gateway) = setup().await;
    Mock::given(method("GET"))
        .and(path("/latest"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "type": "image",
            "image_url": "/static/uploads/cat.png"
        })))
        .mount(&server)
        .await;

    match gateway.latest().await.unwrap() {
        Some(StagedContent::Image { image }) => {
            assert_eq!(image.url, format!("{}/static/uploads/cat.png", server.uri()));
            assert_eq!(image.filename(), "cat.png");
        }
        other => panic!("expected image, got {other:?}"),
    }
}

#[tokio::test]
async fn latest_empty_body_means_nothing_active() {
    let (server, gateway) = setup().await;
    Mock::given(method("GET"))
        .and(path("/latest"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    assert_eq!(gateway.latest().await.unwrap(), None);
}

#[tokio::test]
async fn latest_null_and_unknown_type_mean_nothing_active() {
    let (server, gateway) = setup().await;
    Mock::given(method("GET"))
        .and(path("/latest"))
        .respond_with(ResponseTemplate::new(200).set_body_string("null"))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/latest"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({ "type": "video" })),
        )
        .mount(&server)
        .await;

    assert_eq!(gateway.latest().await.unwrap(), None);
    assert_eq!(gateway.latest().await.unwrap(), None);
}

#[tokio::test]
async fn latest_server_error_is_status() {
    let (server, gateway) = setup().await;
    Mock::given(method("GET"))
        .and(path("/latest"))
        .respond_with(ResponseTemplate::new(502))
        .mount(&server)
        .await;

    let err = gateway.latest().await.unwrap_err();
    assert_eq!(err.status(), Some(502));
}

#[tokio::test]
async fn latest_garbage_is_decode_error() {
    let (server, gateway) = setup().await;
    Mock::given(method("GET"))
        .and(path("/latest"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
        .mount(&server)
        .await;

    assert!(matches!(
        gateway.latest().await,
        Err(GatewayError::Decode { .. })
    ));
}

// =============================================================================
// Idle art
// =============================================================================

#[tokio::test]
async fn idle_art_list_keeps_gateway_order() {
    let (server, gateway) = setup().await;
    Mock::given(method("GET"))
        .and(path("/idle_art_list"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "images": ["/static/idle_art/b.png", "/static/idle_art/a.png"]
        })))
        .mount(&server)
        .await;

    let list = gateway.idle_art_list().await.unwrap();
    let names: Vec<_> = list.iter().map(|i| i.filename()).collect();
    assert_eq!(names, vec!["b.png", "a.png"]);
}

#[tokio::test]
async fn delete_idle_art_sends_filename_query() {
    let (server, gateway) = setup().await;
    Mock::given(method("DELETE"))
        .and(path("/idle_art"))
        .and(query_param("filename", "old sunset.png"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    assert_ok!(gateway.delete_idle_art("old sunset.png").await);
}

#[tokio::test]
async fn upload_idle_art_sends_file_part() {
    let (server, gateway) = setup().await;
    Mock::given(method("POST"))
        .and(path("/upload_idle_art"))
        .and(body_string_contains("name=\"file\""))
        .and(body_string_contains("filename=\"beach.png\""))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let file = UploadFile::new("beach.png", vec![1, 2, 3]);
    assert_ok!(gateway.upload_idle_art(&file).await);
}

// =============================================================================
// Staging
// =============================================================================

#[tokio::test]
async fn send_text_form_fields() {
    let (server, gateway) = setup().await;
    Mock::given(method("POST"))
        .and(path("/send_text"))
        .and(body_string_contains("name=\"text\""))
        .and(body_string_contains("Happy Birthday"))
        .and(body_string_contains("name=\"alignment\""))
        .and(body_string_contains("center"))
        .and(body_string_contains("name=\"temp_msg\""))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let options = TextOptions::default()
        .with_alignment(Alignment::Center)
        .temporary();
    assert_ok!(gateway.send_text("Happy Birthday", &options).await);
}

#[tokio::test]
async fn send_image_without_temp_flag_omits_field() {
    let (server, gateway) = setup().await;
    Mock::given(method("POST"))
        .and(path("/send_image"))
        .and(body_string_contains("filename=\"cat.jpg\""))
        .and(body_string_contains("image/jpeg"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let file = UploadFile::new("cat.jpg", vec![0xFF, 0xD8, 0xFF]);
    assert_ok!(gateway.send_image(&file, false).await);

    let requests = server.received_requests().await.unwrap();
    let body = String::from_utf8_lossy(&requests[0].body);
    assert!(!body.contains("temp_msg"));
}

#[tokio::test]
async fn bare_posts() {
    let (server, gateway) = setup().await;
    for endpoint in ["/display", "/clear_display", "/request_update", "/send_weather"] {
        Mock::given(method("POST"))
            .and(path(endpoint))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;
    }

    assert_ok!(gateway.display().await);
    assert_ok!(gateway.clear_display().await);
    assert_ok!(gateway.request_update().await);
    assert_ok!(gateway.send_weather().await);
}

#[tokio::test]
async fn display_with_nothing_staged_is_status_error() {
    let (server, gateway) = setup().await;
    Mock::given(method("POST"))
        .and(path("/display"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    assert_eq!(gateway.display().await.unwrap_err().status(), Some(404));
}

// =============================================================================
// Generated and museum content
// =============================================================================

#[tokio::test]
async fn generate_ai_image_posts_prompt_json() {
    let (server, gateway) = setup().await;
    Mock::given(method("POST"))
        .and(path("/generate_ai_image"))
        .and(body_json(serde_json::json!({ "prompt": "a fox in snow" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "image_url": "/static/generated/fox.png"
        })))
        .mount(&server)
        .await;

    let image = gateway.generate_ai_image("a fox in snow").await.unwrap();
    assert_eq!(image.url, format!("{}/static/generated/fox.png", server.uri()));
}

#[tokio::test]
async fn random_met_art_reads_metadata() {
    let (server, gateway) = setup().await;
    Mock::given(method("GET"))
        .and(path("/random_met_art"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "status": "success",
            "image_url": "/static/met/irises.jpg",
            "title": "Irises",
            "artist": "Vincent van Gogh"
        })))
        .mount(&server)
        .await;

    let art = gateway.random_met_art().await.unwrap();
    assert_eq!(art.title, "Irises");
    assert_eq!(art.artist, "Vincent van Gogh");
    assert_eq!(art.image.filename(), "irises.jpg");
}

#[tokio::test]
async fn random_met_art_error_status_is_rejected() {
    let (server, gateway) = setup().await;
    Mock::given(method("GET"))
        .and(path("/random_met_art"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "status": "error",
            "message": "museum offline"
        })))
        .mount(&server)
        .await;

    assert!(matches!(
        gateway.random_met_art().await,
        Err(GatewayError::Decode { .. })
    ));
}

// =============================================================================
// Transport
// =============================================================================

#[tokio::test]
async fn base_path_prefix_is_kept() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/inkframe/api/idle_art_list"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "images": ["/static/idle_art/a.png"]
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/inkframe/api/display"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let gateway = HttpGateway::new(&format!("{}/inkframe/api", server.uri())).unwrap();

    let list = gateway.idle_art_list().await.unwrap();
    assert_eq!(
        list[0].url,
        format!("{}/inkframe/api/static/idle_art/a.png", server.uri())
    );
    assert_ok!(gateway.display().await);
}

#[tokio::test]
async fn configured_timeout_applies() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/latest"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(5)))
        .mount(&server)
        .await;

    let gateway =
        HttpGateway::with_timeout(&server.uri(), Some(Duration::from_millis(100))).unwrap();
    assert!(matches!(
        gateway.latest().await,
        Err(GatewayError::Transport { .. })
    ));
}
