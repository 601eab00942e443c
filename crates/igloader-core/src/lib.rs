//! Upload conformance resources from an HL7 FHIR Implementation Guide pack
//! (`.tgz`) to a FHIR server's REST API.
//!
//! Every regular file in the pack is inspected; files that are JSON objects
//! with a `resourceType` are sent as-is, `PUT [base]/[type]/[id]` when they
//! carry an id and `POST [base]/[type]` otherwise. The bytes on the wire are
//! the bytes in the archive.
//!
//! ```ignore
//! use igloader_core::{upload, UploadOptions};
//!
//! let options = UploadOptions::new().with_access_token(std::env::var("ACCESS_TOKEN").ok());
//! let summary = upload("us-core-package.tgz", "http://localhost:8080/r4", options).await?;
//! assert!(summary.is_success());
//! ```

pub mod archive;
pub mod client;
pub mod error;
pub mod options;
pub mod resource;
pub mod summary;
pub mod uploader;

use std::path::Path;

pub use archive::{IgPack, PackEntry};
pub use client::{Accepted, FailureKind, FhirClient};
pub use error::{Result, UploadError};
pub use options::UploadOptions;
pub use resource::{CONFORMANCE_RESOURCE_TYPES, ResourceRoute, UploadMethod, is_conformance_type};
pub use summary::{UploadFailure, UploadSummary};
pub use uploader::{
    NoProgress, PlannedUpload, ResourceReport, SkipReason, UploadPlan, UploadProgress, Uploader,
};

/// Upload every resource in the pack at `archive_path` to `target`.
///
/// Fails only when the target is unusable or the pack cannot be read; both
/// are checked before any request is sent.
pub async fn upload(
    archive_path: impl AsRef<Path>,
    target: &str,
    options: UploadOptions,
) -> Result<UploadSummary> {
    let uploader = Uploader::new(target, options)?;
    uploader.upload_pack(archive_path, &mut NoProgress).await
}
