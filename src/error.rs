//! Error types for mdpress library.

use std::io;
use thiserror::Error;

/// Result type alias for mdpress operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur while rendering or exporting documents.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error when reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The input is not recognized as Markdown text.
    #[error("Unknown file format: not a Markdown document")]
    UnknownFormat,

    /// The named visual tree is not mounted on the surface.
    #[error("Source tree not found: {0}")]
    SourceNotFound(String),

    /// A page failed to rasterize.
    #[error("Failed to capture page {page}: {reason}")]
    CaptureFailure {
        /// 1-indexed page number
        page: u32,
        /// Underlying failure
        reason: String,
    },

    /// The document could not be assembled from the captured pages.
    #[error("Document assembly failed: {0}")]
    AssemblyFailure(String),

    /// Page geometry leaves no usable content area.
    #[error("Invalid page geometry: {0}")]
    InvalidGeometry(String),

    /// A diagram block could not be rendered.
    #[error("Diagram error: {0}")]
    Diagram(String),

    /// An embedded image could not be loaded or decoded.
    #[error("Image error: {0}")]
    Image(String),

    /// Error during block layout.
    #[error("Rendering error: {0}")]
    Render(String),

    /// Generic error with message.
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Build a capture failure for the given page.
    pub fn capture(page: u32, reason: impl Into<String>) -> Self {
        Error::CaptureFailure {
            page,
            reason: reason.into(),
        }
    }

    /// Check if this error aborted an export after staging was attached.
    pub fn is_pipeline_failure(&self) -> bool {
        matches!(
            self,
            Error::CaptureFailure { .. } | Error::AssemblyFailure(_)
        )
    }
}

impl From<image::ImageError> for Error {
    fn from(err: image::ImageError) -> Self {
        Error::Image(err.to_string())
    }
}

impl From<usvg::Error> for Error {
    fn from(err: usvg::Error) -> Self {
        Error::Diagram(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Other(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::SourceNotFound("markdown-preview-content".to_string());
        assert_eq!(
            err.to_string(),
            "Source tree not found: markdown-preview-content"
        );

        let err = Error::capture(3, "pixmap allocation failed");
        assert_eq!(
            err.to_string(),
            "Failed to capture page 3: pixmap allocation failed"
        );
    }

    #[test]
    fn test_pipeline_failure_classification() {
        assert!(Error::capture(1, "x").is_pipeline_failure());
        assert!(Error::AssemblyFailure("empty".into()).is_pipeline_failure());
        assert!(!Error::SourceNotFound("a".into()).is_pipeline_failure());
        assert!(!Error::UnknownFormat.is_pipeline_failure());
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
    }
}
