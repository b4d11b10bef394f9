//! Error taxonomy for the archival pipeline.
//!
//! Errors fall in two scopes:
//! - **run-scoped**: the collection summary or a listing page could not be loaded, or the
//!   output directory could not be created. These abort the whole run.
//! - **item-scoped**: anything that goes wrong for one concrete item (a single item or one
//!   sequence member). These are caught at the item boundary and become one error row in
//!   the ledger; traversal continues with the next item.
//!
//! The scope is decided by the caller, not by the variant: a `NavigationFailed` on a listing
//! page is fatal, the same variant on an item page is recorded and skipped.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for archival operations
pub type Result<T> = std::result::Result<T, ArchiveError>;

#[derive(Debug, Error)]
pub enum ArchiveError {
    /// A page did not load, or loaded with a non-success status.
    #[error("{}: unable to navigate to {url}", status_label(.status))]
    NavigationFailed {
        url: String,
        /// HTTP status when a response was received at all
        status: Option<u16>,
    },

    /// The item declares no media category the archiver knows how to handle.
    #[error("unrecognized item format")]
    FormatUnrecognized,

    /// No download option matched the acceptable media types for the item format.
    #[error("unable to find suitable downloadable file with \"{format}\" format")]
    NoSuitableArtifact { format: String },

    /// A control the pipeline depends on was missing or unreadable.
    #[error("extraction failed: {0}")]
    ExtractionFailed(String),

    /// The collection argument does not name a collection.
    #[error("invalid collection reference: {0}")]
    InvalidCollection(String),

    /// The sequence manifest could not be fetched or decoded.
    #[error("manifest {url} could not be loaded: {reason}")]
    ManifestFailed { url: String, reason: String },

    /// Streaming an artifact to disk failed.
    #[error("download of {url} failed: {reason}")]
    DownloadFailed { url: String, reason: String },

    /// A CSS selector from the configuration does not parse.
    #[error("invalid selector {selector:?}: {reason}")]
    Selector { selector: String, reason: String },

    /// Writing the ledger workbook failed.
    #[error("failed to export ledger to {}: {reason}", .path.display())]
    Export { path: PathBuf, reason: String },

    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

fn status_label(status: &Option<u16>) -> String {
    match status {
        Some(code) => code.to_string(),
        None => "no response".to_string(),
    }
}

impl ArchiveError {
    pub fn navigation(url: impl Into<String>, status: Option<u16>) -> Self {
        ArchiveError::NavigationFailed {
            url: url.into(),
            status,
        }
    }

    pub fn extraction(message: impl Into<String>) -> Self {
        ArchiveError::ExtractionFailed(message.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn navigation_message_includes_status() {
        let err = ArchiveError::navigation("https://www.loc.gov/item/1/", Some(404));
        assert_eq!(
            err.to_string(),
            "404: unable to navigate to https://www.loc.gov/item/1/"
        );

        let err = ArchiveError::navigation("https://www.loc.gov/item/1/", None);
        assert!(err.to_string().starts_with("no response"));
    }

    #[test]
    fn no_suitable_artifact_names_format() {
        let err = ArchiveError::NoSuitableArtifact {
            format: "image".into(),
        };
        assert_eq!(
            err.to_string(),
            "unable to find suitable downloadable file with \"image\" format"
        );
    }
}
