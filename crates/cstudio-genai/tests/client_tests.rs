//! HTTP-level tests for the Gemini client against a mock server.

use serde_json::json;
use wiremock::matchers::{body_partial_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use cstudio_genai::{
    GeminiClient, GenAiConfig, GenAiError, GenerativeProvider, ImageRequest, TextRequest,
    VideoOperation, VideoRequest,
};
use cstudio_models::{AspectRatio, InlineMedia, Resolution};

async fn client_for(server: &MockServer) -> GeminiClient {
    let config = GenAiConfig::default()
        .with_api_key("test-key")
        .with_base_url(server.uri());
    GeminiClient::new(config).unwrap()
}

#[tokio::test]
async fn test_generate_text_with_schema() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/models/gemini-2.5-flash:generateContent"))
        .and(query_param("key", "test-key"))
        .and(body_partial_json(json!({
            "generationConfig": {"responseMimeType": "application/json"}
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [{"content": {"role": "model", "parts": [
                {"text": "[{\"title\":\"a\","},
                {"text": "\"description\":\"b\"}]"}
            ]}}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    let text = client
        .generate_text(TextRequest::new("ideas").with_schema(json!({"type": "ARRAY"})))
        .await
        .unwrap();

    assert_eq!(text, r#"[{"title":"a","description":"b"}]"#);
}

#[tokio::test]
async fn test_generate_text_multimodal_sends_media_first() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/models/gemini-2.5-flash:generateContent"))
        .and(body_partial_json(json!({
            "contents": [{"parts": [
                {"inlineData": {"mimeType": "video/mp4", "data": "AAAA"}},
                {"text": "analyze"}
            ]}]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [{"content": {"parts": [{"text": "analysis"}]}}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    let text = client
        .generate_text(TextRequest::new("analyze").with_media(InlineMedia::new("video/mp4", "AAAA")))
        .await
        .unwrap();
    assert_eq!(text, "analysis");
}

#[tokio::test]
async fn test_generate_image_returns_first_inline_image() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/models/gemini-2.5-flash-image:generateContent"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [{"content": {"parts": [
                {"text": "Here is your image"},
                {"inlineData": {"mimeType": "image/png", "data": "iVBORw0KGgo="}}
            ]}}]
        })))
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    let image = client
        .generate_image(ImageRequest {
            prompt: "on a vanity".into(),
            reference: Some(InlineMedia::new("image/jpeg", "AAAA")),
        })
        .await
        .unwrap();

    assert_eq!(image.mime_type, "image/png");
    assert_eq!(image.data, "iVBORw0KGgo=");
}

#[tokio::test]
async fn test_generate_image_without_image_part() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/models/gemini-2.5-flash-image:generateContent"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [{"content": {"parts": [{"text": "I can't do that"}]}}]
        })))
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    let err = client
        .generate_image(ImageRequest {
            prompt: "x".into(),
            reference: None,
        })
        .await
        .unwrap_err();
    assert!(matches!(err, GenAiError::NoImageData));
}

#[tokio::test]
async fn test_api_error_status() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503).set_body_string("overloaded"))
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    let err = client.generate_text(TextRequest::new("x")).await.unwrap_err();
    match err {
        GenAiError::Api { status, body } => {
            assert_eq!(status, 503);
            assert_eq!(body, "overloaded");
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

#[tokio::test]
async fn test_blocked_prompt() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "promptFeedback": {"blockReason": "SAFETY"}
        })))
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    let err = client.generate_text(TextRequest::new("x")).await.unwrap_err();
    assert!(matches!(err, GenAiError::Blocked(reason) if reason == "SAFETY"));
}

#[tokio::test]
async fn test_video_operation_lifecycle() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/models/veo-3.1-fast-generate-preview:predictLongRunning"))
        .and(body_partial_json(json!({
            "instances": [{
                "prompt": "slow dolly in",
                "image": {"bytesBase64Encoded": "AAAA", "mimeType": "image/png"}
            }],
            "parameters": {"aspectRatio": "9:16", "resolution": "720p", "sampleCount": 1}
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "name": "models/veo-3.1-fast-generate-preview/operations/op123"
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/models/veo-3.1-fast-generate-preview/operations/op123"))
        .and(query_param("key", "test-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "name": "models/veo-3.1-fast-generate-preview/operations/op123",
            "done": true,
            "response": {"generateVideoResponse": {"generatedSamples": [
                {"video": {"uri": "https://files.example/v1/files/vid:download?alt=media"}}
            ]}}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    let op = client
        .start_video(VideoRequest {
            prompt: "slow dolly in".into(),
            image: InlineMedia::new("image/png", "AAAA"),
            aspect_ratio: AspectRatio::Portrait,
            resolution: Resolution::Hd,
        })
        .await
        .unwrap();
    assert_eq!(
        op,
        VideoOperation::pending("models/veo-3.1-fast-generate-preview/operations/op123")
    );

    let done = client.poll_video(&op).await.unwrap();
    assert!(done.done);
    let uri = done.video_uri.unwrap();
    assert_eq!(
        client.authorize_video_uri(&uri),
        "https://files.example/v1/files/vid:download?alt=media&key=test-key"
    );
}

#[tokio::test]
async fn test_video_operation_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "name": "operations/bad",
            "done": true,
            "error": {"code": 3, "message": "image rejected"}
        })))
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    let op = client
        .poll_video(&VideoOperation::pending("operations/bad"))
        .await
        .unwrap();
    assert!(op.done);
    assert!(op.video_uri.is_none());
    assert_eq!(op.error.unwrap().message, "image rejected");
}
