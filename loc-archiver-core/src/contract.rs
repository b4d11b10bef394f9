//! # contract: collaborator interfaces of the archival pipeline
//!
//! The pipeline talks to the outside world through three seams:
//! - [`PageFetcher`]: one navigable browsing session. Loads a URL, reports whether it
//!   loaded, and answers CSS queries against the current page.
//! - [`ArtifactTransport`]: plain HTTP for the sequence manifest and for streaming
//!   artifacts to disk.
//! - [`TableWriter`]: persists the ledger's sheets to the export artifact.
//!
//! Concrete implementations live in [`crate::fetch`], [`crate::transport`] and
//! [`crate::ledger`]. All traits are annotated for `mockall` so tests can script them.
//!
//! `PageFetcher::navigate` takes `&mut self`: the session is exclusively owned by the
//! traversal loop and nothing else may move it to another page.

use std::collections::HashMap;
use std::path::Path;

use async_trait::async_trait;
use mockall::automock;
use serde::Deserialize;

use crate::error::Result;

/// Outcome of loading a page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Navigation {
    pub ok: bool,
    pub status: u16,
}

impl Navigation {
    pub fn from_status(status: u16) -> Self {
        Self {
            ok: (200..300).contains(&status),
            status,
        }
    }
}

/// Owned snapshot of one DOM element matched by a query.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Element {
    pub text: String,
    pub inner_html: String,
    pub attributes: HashMap<String, String>,
    pub visible: bool,
}

impl Element {
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }
}

/// A browser-like session over remote pages.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Load `url` and make it the current page.
    async fn navigate(&mut self, url: &str) -> Result<Navigation>;

    /// Every element of the current page matching `selector`, in document order.
    async fn query_all(&self, selector: &str) -> Result<Vec<Element>>;
}

/// IIIF presentation manifest, reduced to the fields the archiver reads.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct Manifest {
    #[serde(default)]
    pub sequences: Vec<ManifestSequence>,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct ManifestSequence {
    #[serde(default)]
    pub canvases: Vec<Canvas>,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct Canvas {
    #[serde(default)]
    pub metadata: Vec<MetadataEntry>,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct MetadataEntry {
    #[serde(default)]
    pub value: Option<serde_json::Value>,
}

impl Canvas {
    /// The item URL carried by the first metadata entry, if it is a string.
    pub fn item_url(&self) -> Option<&str> {
        self.metadata
            .first()
            .and_then(|entry| entry.value.as_ref())
            .and_then(|value| value.as_str())
            .map(str::trim)
            .filter(|url| !url.is_empty())
    }
}

impl Manifest {
    /// Member URLs of the first sequence, in canvas order.
    pub fn member_urls(&self) -> Vec<String> {
        self.sequences
            .first()
            .map(|sequence| {
                sequence
                    .canvases
                    .iter()
                    .filter_map(Canvas::item_url)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// HTTP access outside the browsing session.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait ArtifactTransport: Send + Sync {
    async fn fetch_manifest(&self, url: &str) -> Result<Manifest>;

    /// Stream `url` into `dest`, returning the number of bytes written.
    async fn download(&self, url: &str, dest: &Path) -> Result<u64>;
}

/// One named table: a header row followed by data rows.
#[derive(Debug, Clone, PartialEq)]
pub struct Sheet {
    pub name: String,
    pub header: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

/// Persists sheets into a single tabular artifact, replacing any previous one.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
pub trait TableWriter: Send + Sync {
    fn write(&self, path: &Path, sheets: &[Sheet]) -> Result<()>;
}
