//! Wire-level tests for the Gemini client against a mock HTTP server

use base64::{engine::general_purpose::STANDARD, Engine};
use serde_json::json;
use wiremock::matchers::{body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use nano_banana_api::config::GeminiConfig;
use nano_banana_api::model::{GeminiClient, ImageModel, ImagePart, ModelRequest};

fn client_for(server: &MockServer) -> GeminiClient {
    let config = GeminiConfig {
        api_key: "test-key".to_string(),
        base_url: server.uri(),
        model: "test-model".to_string(),
        ..Default::default()
    };
    GeminiClient::new(&config).unwrap()
}

fn request_with_one_image() -> ModelRequest {
    ModelRequest {
        images: vec![ImagePart {
            data: b"input-image".to_vec(),
            mime_type: "image/jpeg".to_string(),
        }],
        prompt: "a cat wearing a tiny hat".to_string(),
    }
}

#[tokio::test]
async fn first_inline_image_part_wins() {
    let server = MockServer::start().await;

    let response = json!({
        "candidates": [{
            "content": {
                "parts": [
                    { "text": "Here is your image" },
                    { "inlineData": { "mimeType": "image/png", "data": STANDARD.encode(b"first") } },
                    { "inlineData": { "mimeType": "image/png", "data": STANDARD.encode(b"second") } }
                ]
            }
        }]
    });

    Mock::given(method("POST"))
        .and(path("/v1beta/models/test-model:generateContent"))
        .and(header("x-goog-api-key", "test-key"))
        .and(body_string_contains("a cat wearing a tiny hat"))
        .and(body_string_contains("inlineData"))
        .and(body_string_contains("responseModalities"))
        .respond_with(ResponseTemplate::new(200).set_body_json(response))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let result = client.generate(request_with_one_image()).await.unwrap();

    // Trailing image parts are discarded
    assert_eq!(result.unwrap(), b"first");
}

#[tokio::test]
async fn text_only_response_is_a_silent_miss() {
    let server = MockServer::start().await;

    let response = json!({
        "candidates": [{
            "content": { "parts": [{ "text": "I cannot draw that" }] }
        }]
    });

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(response))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let result = client.generate(request_with_one_image()).await.unwrap();
    assert!(result.is_none());
}

#[tokio::test]
async fn empty_candidates_is_a_silent_miss() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "candidates": [] })))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let result = client.generate(request_with_one_image()).await.unwrap();
    assert!(result.is_none());
}

#[tokio::test]
async fn api_error_status_propagates_as_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(429).set_body_string("quota exhausted"))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let err = client
        .generate(request_with_one_image())
        .await
        .unwrap_err();
    assert!(err.to_string().contains("429"));
}

#[tokio::test]
async fn invalid_base64_payload_is_an_error() {
    let server = MockServer::start().await;

    let response = json!({
        "candidates": [{
            "content": {
                "parts": [{ "inlineData": { "mimeType": "image/png", "data": "!!not-base64!!" } }]
            }
        }]
    });

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(response))
        .mount(&server)
        .await;

    let client = client_for(&server);
    assert!(client.generate(request_with_one_image()).await.is_err());
}

#[tokio::test]
async fn input_images_are_sent_base64_encoded() {
    let server = MockServer::start().await;

    let response = json!({
        "candidates": [{
            "content": {
                "parts": [{ "inlineData": { "mimeType": "image/png", "data": STANDARD.encode(b"out") } }]
            }
        }]
    });

    Mock::given(method("POST"))
        .and(body_string_contains(STANDARD.encode(b"input-image")))
        .and(body_string_contains("image/jpeg"))
        .respond_with(ResponseTemplate::new(200).set_body_json(response))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    client.generate(request_with_one_image()).await.unwrap();
}
