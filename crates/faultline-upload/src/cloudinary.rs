use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use faultline_config::StorageConfig;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use sha2::{Digest, Sha256};
use url::Url;

use crate::store::{ObjectStore, RemoteAsset, RemoteStoreError, UploadOptions};

const DEFAULT_API_URL: &str = "https://api.cloudinary.com/";

/// Image storage on Cloudinary's upload API
///
/// Requests are signed with SHA-256 over the sorted parameters followed by
/// the API secret.
#[derive(Clone)]
pub struct CloudinaryStore {
    http: reqwest::Client,
    base_url: Url,
    cloud_name: String,
    api_key: String,
    api_secret: SecretString,
}

#[derive(Deserialize)]
struct UploadResponse {
    public_id: String,
    secure_url: String,
    #[serde(default)]
    bytes: u64,
    format: Option<String>,
}

#[derive(Deserialize)]
struct DestroyResponse {
    result: String,
}

#[derive(Deserialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

impl CloudinaryStore {
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built
    pub fn new(
        base_url: Option<Url>,
        cloud_name: String,
        api_key: String,
        api_secret: SecretString,
    ) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .map_err(|e| anyhow::anyhow!("failed to build storage client: {e}"))?;

        let mut base_url = match base_url {
            Some(url) => url,
            None => Url::parse(DEFAULT_API_URL)?,
        };
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        Ok(Self {
            http,
            base_url,
            cloud_name,
            api_key,
            api_secret,
        })
    }

    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built
    pub fn from_config(config: &StorageConfig) -> anyhow::Result<Self> {
        Self::new(
            config.base_url.clone(),
            config.cloud_name.clone(),
            config.api_key.clone(),
            config.api_secret.clone(),
        )
    }

    fn endpoint(&self, action: &str) -> Result<Url, url::ParseError> {
        self.base_url
            .join(&format!("v1_1/{}/image/{action}", self.cloud_name))
    }

    /// Signed parameter set; `params` must not include the key or signature
    fn signed(&self, mut params: BTreeMap<&'static str, String>) -> BTreeMap<&'static str, String> {
        params.insert("timestamp", chrono::Utc::now().timestamp().to_string());
        let signature = sign(&params, &self.api_secret);

        params.insert("api_key", self.api_key.clone());
        params.insert("signature", signature);
        params.insert("signature_algorithm", "sha256".to_owned());
        params
    }
}

#[async_trait]
impl ObjectStore for CloudinaryStore {
    async fn upload(&self, path: &Path, options: &UploadOptions) -> Result<RemoteAsset, RemoteStoreError> {
        let url = self.endpoint("upload")?;
        let contents = tokio::fs::read(path).await?;

        tracing::debug!(bytes = contents.len(), folder = %options.folder, "uploading asset");

        let params = self.signed(BTreeMap::from([("folder", options.folder.clone())]));
        let mut form = reqwest::multipart::Form::new().part(
            "file",
            reqwest::multipart::Part::bytes(contents).file_name(options.file_name.clone()),
        );
        for (name, value) in params {
            form = form.text(name, value);
        }

        let response = self.http.post(url).multipart(form).send().await?;
        let response = check(response).await?;

        let body: UploadResponse = response.json().await?;
        Ok(RemoteAsset {
            public_id: body.public_id,
            url: body.secure_url,
            bytes: body.bytes,
            format: body.format,
        })
    }

    async fn destroy(&self, public_id: &str) -> Result<(), RemoteStoreError> {
        let url = self.endpoint("destroy")?;
        let params = self.signed(BTreeMap::from([("public_id", public_id.to_owned())]));

        let response = self.http.post(url).form(&params).send().await?;
        let response = check(response).await?;

        let body: DestroyResponse = response.json().await?;
        match body.result.as_str() {
            "ok" => Ok(()),
            "not found" => {
                tracing::debug!(public_id, "asset already absent");
                Ok(())
            }
            other => Err(RemoteStoreError::Rejected {
                status: 200,
                message: format!("unexpected destroy result `{other}`"),
            }),
        }
    }
}

async fn check(response: reqwest::Response) -> Result<reqwest::Response, RemoteStoreError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let text = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorResponse>(&text).map_or(text, |body| body.error.message);

    tracing::warn!(status = status.as_u16(), error = %message, "object store rejected request");

    Err(RemoteStoreError::Rejected {
        status: status.as_u16(),
        message,
    })
}

/// `sha256(k1=v1&k2=v2...<secret>)` as lowercase hex, keys in sorted order
fn sign(params: &BTreeMap<&'static str, String>, secret: &SecretString) -> String {
    let mut payload = params
        .iter()
        .map(|(key, value)| format!("{key}={value}"))
        .collect::<Vec<_>>()
        .join("&");
    payload.push_str(secret.expose_secret());

    let digest = Sha256::digest(payload.as_bytes());
    let mut hex = String::with_capacity(64);
    for byte in digest {
        // Writing hex to a String is infallible
        let _ = write!(hex, "{byte:02x}");
    }
    hex
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use wiremock::matchers::{body_string_contains, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn store(base_url: &str) -> CloudinaryStore {
        CloudinaryStore::new(
            Some(Url::parse(base_url).unwrap()),
            "demo".to_owned(),
            "key-123".to_owned(),
            SecretString::from("shh".to_owned()),
        )
        .unwrap()
    }

    fn options() -> UploadOptions {
        UploadOptions {
            folder: "uploads".to_owned(),
            file_name: "cat.png".to_owned(),
        }
    }

    #[test]
    fn signature_is_sorted_sha256() {
        let params = BTreeMap::from([("timestamp", "1315060510".to_owned()), ("folder", "uploads".to_owned())]);
        let expected = Sha256::digest(b"folder=uploads&timestamp=1315060510shh");
        let expected: String = expected.iter().map(|b| format!("{b:02x}")).collect();

        assert_eq!(sign(&params, &SecretString::from("shh".to_owned())), expected);
    }

    #[tokio::test]
    async fn upload_returns_descriptor() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1_1/demo/image/upload"))
            .and(body_string_contains("key-123"))
            .and(body_string_contains("uploads"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "public_id": "uploads/cat",
                "secure_url": "https://res.example.com/demo/image/upload/uploads/cat.png",
                "bytes": 4,
                "format": "png"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"\x89PNG").unwrap();

        let asset = store(&server.uri()).upload(file.path(), &options()).await.unwrap();
        assert_eq!(asset.public_id, "uploads/cat");
        assert_eq!(asset.url, "https://res.example.com/demo/image/upload/uploads/cat.png");
        assert_eq!(asset.bytes, 4);
        assert_eq!(asset.format.as_deref(), Some("png"));
    }

    #[tokio::test]
    async fn upload_surfaces_store_message() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1_1/demo/image/upload"))
            .respond_with(ResponseTemplate::new(401).set_body_json(serde_json::json!({
                "error": { "message": "Invalid Signature" }
            })))
            .mount(&server)
            .await;

        let file = tempfile::NamedTempFile::new().unwrap();
        let err = store(&server.uri()).upload(file.path(), &options()).await.unwrap_err();

        match err {
            RemoteStoreError::Rejected { status, message } => {
                assert_eq!(status, 401);
                assert_eq!(message, "Invalid Signature");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn upload_of_missing_file_is_io_error() {
        let server = MockServer::start().await;
        let dir = tempfile::tempdir().unwrap();

        let err = store(&server.uri())
            .upload(&dir.path().join("gone.png"), &options())
            .await
            .unwrap_err();
        assert!(matches!(err, RemoteStoreError::Io(_)));
    }

    #[tokio::test]
    async fn destroy_tolerates_missing_asset() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1_1/demo/image/destroy"))
            .and(body_string_contains("public_id=uploads%2Fcat"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "result": "not found" })))
            .expect(1)
            .mount(&server)
            .await;

        store(&server.uri()).destroy("uploads/cat").await.unwrap();
    }

    #[tokio::test]
    async fn destroy_failure_is_reported() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1_1/demo/image/destroy"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;

        let err = store(&server.uri()).destroy("uploads/cat").await.unwrap_err();
        assert!(matches!(err, RemoteStoreError::Rejected { status: 500, .. }));
    }

    #[test]
    fn base_url_with_path_keeps_prefix() {
        let store = store("http://127.0.0.1:9/mock");
        assert_eq!(
            store.endpoint("upload").unwrap().as_str(),
            "http://127.0.0.1:9/mock/v1_1/demo/image/upload"
        );
    }
}
