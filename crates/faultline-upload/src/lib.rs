//! Upload pipeline for Faultline
//!
//! A multipart file is checked against the [`AcceptancePolicy`], streamed to
//! a staging directory, handed to an [`ObjectStore`] and removed locally on
//! every exit path.

mod cloudinary;
mod multipart;
mod pipeline;
mod policy;
mod staging;
mod store;

pub use cloudinary::CloudinaryStore;
pub use pipeline::UploadPipeline;
pub use policy::{ALLOWED_EXTENSIONS, ALLOWED_MIME_TYPES, AcceptancePolicy, sanitize_file_name};
pub use staging::{StagedUpload, Staging};
pub use store::{ObjectStore, RemoteAsset, RemoteStoreError, UploadOptions};
