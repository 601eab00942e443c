use std::path::PathBuf;

use thiserror::Error;

/// Errors that abort an upload run.
///
/// Failures of individual resources are not errors; they are recorded in the
/// [`UploadSummary`](crate::UploadSummary) and the run continues.
#[derive(Debug, Error)]
pub enum UploadError {
    #[error("Unable to open IG pack {path}: {source}")]
    ArchiveOpen {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Unable to read IG pack {path}: {source}")]
    ArchiveRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid target URL: {0}")]
    InvalidTarget(#[from] url::ParseError),

    #[error("Unsupported target URL scheme '{0}' (expected http or https)")]
    UnsupportedScheme(String),

    #[error("Target URL cannot be used as a FHIR base: {0}")]
    NotABase(String),

    #[error("Failed to build HTTP client: {0}")]
    HttpClient(#[source] reqwest::Error),
}

impl UploadError {
    pub fn archive_open(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::ArchiveOpen {
            path: path.into(),
            source,
        }
    }

    pub fn archive_read(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::ArchiveRead {
            path: path.into(),
            source,
        }
    }

    /// Whether the error comes from the pack rather than the target server setup.
    pub fn is_archive_error(&self) -> bool {
        matches!(self, Self::ArchiveOpen { .. } | Self::ArchiveRead { .. })
    }
}

/// Convenience result type for upload operations
pub type Result<T> = std::result::Result<T, UploadError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_archive_error_display() {
        let err = UploadError::archive_open(
            "missing.tgz",
            std::io::Error::new(std::io::ErrorKind::NotFound, "no such file"),
        );
        assert_eq!(
            err.to_string(),
            "Unable to open IG pack missing.tgz: no such file"
        );
        assert!(err.is_archive_error());
    }

    #[test]
    fn test_scheme_error_is_not_archive_error() {
        let err = UploadError::UnsupportedScheme("ftp".into());
        assert!(!err.is_archive_error());
        assert!(err.to_string().contains("ftp"));
    }
}
