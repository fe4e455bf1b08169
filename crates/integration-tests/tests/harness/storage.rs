//! Mock Cloudinary upload API

use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const UPLOAD_PATH: &str = "/v1_1/demo/image/upload";
const DESTROY_PATH: &str = "/v1_1/demo/image/destroy";

/// Object store double answering on Cloudinary's paths
pub struct MockStorage {
    server: MockServer,
}

impl MockStorage {
    /// Start a store that accepts every upload and deletion
    pub async fn accepting() -> Self {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path(UPLOAD_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "public_id": "uploads/cat",
                "secure_url": "https://res.example.com/demo/image/upload/uploads/cat.png",
                "bytes": 2_097_152,
                "format": "png"
            })))
            .mount(&server)
            .await;

        Mock::given(method("POST"))
            .and(path(DESTROY_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "result": "ok" })))
            .mount(&server)
            .await;

        Self { server }
    }

    /// Start a store that rejects every request
    pub async fn failing() -> Self {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500).set_body_json(json!({
                "error": { "message": "storage unavailable" }
            })))
            .mount(&server)
            .await;

        Self { server }
    }

    pub fn uri(&self) -> String {
        self.server.uri()
    }

    /// Number of upload calls the store has received
    pub async fn upload_count(&self) -> usize {
        self.server
            .received_requests()
            .await
            .unwrap_or_default()
            .iter()
            .filter(|request| request.url.path() == UPLOAD_PATH)
            .count()
    }
}
