use std::path::Path;

use faultline_config::UploadConfig;
use faultline_core::UploadError;

/// File extensions accepted, compared case-insensitively
pub const ALLOWED_EXTENSIONS: &[&str] = &["jpeg", "jpg", "png", "avif"];

/// Declared content types accepted
pub const ALLOWED_MIME_TYPES: &[&str] = &["image/jpeg", "image/jpg", "image/png", "image/avif"];

/// What an incoming file must satisfy before it is staged
#[derive(Debug, Clone)]
pub struct AcceptancePolicy {
    field: String,
    max_file_bytes: u64,
}

impl AcceptancePolicy {
    pub fn new(field: impl Into<String>, max_file_bytes: u64) -> Self {
        Self {
            field: field.into(),
            max_file_bytes,
        }
    }

    pub fn from_config(config: &UploadConfig) -> Self {
        Self::new(config.field.clone(), config.max_file_bytes)
    }

    /// Multipart field the file must arrive under
    pub fn field(&self) -> &str {
        &self.field
    }

    pub const fn max_file_bytes(&self) -> u64 {
        self.max_file_bytes
    }

    /// Both the extension and the declared content type must be allowed
    ///
    /// # Errors
    ///
    /// Returns an upload failure naming what was received and what is allowed
    pub fn check_type(&self, file_name: &str, content_type: Option<&str>) -> Result<(), UploadError> {
        let extension_ok = Path::new(file_name)
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ALLOWED_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()));

        let mime_ok = content_type
            .map(|ct| ct.split(';').next().unwrap_or_default().trim().to_ascii_lowercase())
            .is_some_and(|essence| ALLOWED_MIME_TYPES.contains(&essence.as_str()));

        if extension_ok && mime_ok {
            return Ok(());
        }

        let received = content_type.filter(|ct| !ct.is_empty()).unwrap_or(file_name);
        Err(UploadError::other(
            Some(self.field.clone()),
            format!("File type/MIME {received} not allowed. Allowed types: JPEG, PNG, and AVIF."),
        ))
    }

    /// # Errors
    ///
    /// Returns a file-too-large failure once `received` exceeds the cap
    pub fn check_size(&self, received: u64) -> Result<(), UploadError> {
        if received > self.max_file_bytes {
            Err(UploadError::file_too_large(self.field.clone(), self.max_file_bytes))
        } else {
            Ok(())
        }
    }
}

/// Reduce a client-supplied file name to a safe final path component
///
/// Directory parts are dropped and anything outside `[A-Za-z0-9._-]` becomes
/// `_`. Never returns an empty string or a dot-only name.
pub fn sanitize_file_name(raw: &str) -> String {
    let base = raw.rsplit(['/', '\\']).next().unwrap_or_default();

    let cleaned: String = base
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') { c } else { '_' })
        .take(100)
        .collect();

    if cleaned.chars().all(|c| c == '.') {
        "file".to_owned()
    } else {
        cleaned
    }
}

#[cfg(test)]
mod tests {
    use faultline_core::{UploadErrorCode, classify};
    use http::StatusCode;

    use super::*;

    fn policy() -> AcceptancePolicy {
        AcceptancePolicy::new("image", 5 * 1024 * 1024)
    }

    #[test]
    fn accepts_allowed_pairs() {
        let policy = policy();
        assert!(policy.check_type("photo.JPG", Some("image/jpeg")).is_ok());
        assert!(policy.check_type("a.png", Some("image/png")).is_ok());
        assert!(policy.check_type("a.avif", Some("image/avif")).is_ok());
        assert!(policy.check_type("a.jpeg", Some("Image/JPEG; charset=binary")).is_ok());
    }

    #[test]
    fn extension_and_mime_must_both_pass() {
        let policy = policy();
        assert!(policy.check_type("a.gif", Some("image/png")).is_err());
        assert!(policy.check_type("a.png", Some("image/gif")).is_err());
        assert!(policy.check_type("noext", Some("image/png")).is_err());
        assert!(policy.check_type("a.png", None).is_err());
    }

    #[test]
    fn rejection_names_received_type() {
        let err = policy().check_type("a.gif", Some("image/gif")).unwrap_err();
        assert_eq!(err.code(), UploadErrorCode::Other);
        assert_eq!(err.field(), Some("image"));

        let carrier = classify(err.into());
        assert_eq!(carrier.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            carrier.message(),
            "File type/MIME image/gif not allowed. Allowed types: JPEG, PNG, and AVIF."
        );
    }

    #[test]
    fn rejection_falls_back_to_file_name() {
        let err = policy().check_type("notes.txt", None).unwrap_err();
        assert!(err.message().contains("notes.txt"));
    }

    #[test]
    fn size_cap() {
        let policy = AcceptancePolicy::new("image", 10);
        assert!(policy.check_size(10).is_ok());
        let err = policy.check_size(11).unwrap_err();
        assert_eq!(err.code(), UploadErrorCode::FileTooLarge);
    }

    #[test]
    fn file_name_hygiene() {
        assert_eq!(sanitize_file_name("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_file_name("C:\\Users\\me\\cat pic.png"), "cat_pic.png");
        assert_eq!(sanitize_file_name(".."), "file");
        assert_eq!(sanitize_file_name(""), "file");
        assert_eq!(sanitize_file_name("ok-name_1.jpg"), "ok-name_1.jpg");
    }
}
