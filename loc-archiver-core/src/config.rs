use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info};

pub const DEFAULT_BASE_URL: &str = "https://www.loc.gov";
pub const DEFAULT_PAGE_SIZE: usize = 500;
pub const DEFAULT_PACING_MS: u64 = 1_000;
pub const DEFAULT_USER_AGENT: &str = concat!("loc-archiver/", env!("CARGO_PKG_VERSION"));
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 120;

/// Tunables for one archival run. Every field has a default, so an empty
/// config file (or none at all) is valid.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ArchiveConfig {
    /// Scheme and host every collection URL is built on.
    pub base_url: String,
    /// Items requested per listing page.
    pub page_size: usize,
    /// Pause before every item or sequence member navigation.
    pub pacing_ms: u64,
    pub user_agent: String,
    pub request_timeout_secs: u64,
    /// Accept `pdf` as an item category when no image, audio or video is declared.
    pub recognize_pdf: bool,
    pub locators: Locators,
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            page_size: DEFAULT_PAGE_SIZE,
            pacing_ms: DEFAULT_PACING_MS,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            recognize_pdf: false,
            locators: Locators::default(),
        }
    }
}

impl ArchiveConfig {
    pub fn pacing(&self) -> Duration {
        Duration::from_millis(self.pacing_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn trace_loaded(&self) {
        info!(
            base_url = %self.base_url,
            page_size = self.page_size,
            pacing_ms = self.pacing_ms,
            recognize_pdf = self.recognize_pdf,
            "Loaded ArchiveConfig"
        );
        debug!(?self, "ArchiveConfig loaded (full debug)");
    }
}

/// CSS selectors for every control the pipeline reads.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Locators {
    pub about_article: String,
    pub collection_name: String,
    pub pagination_summary: String,
    pub collection_results: String,
    pub item_downloads: String,
    pub item_sequence_downloads: String,
    pub item_format_list: String,
    pub item_formats: String,
    pub item_call_number: String,
    pub item_manifest: String,
    pub item_name_list: String,
    pub item_names: String,
    pub item_note_list: String,
    pub item_notes: String,
    pub item_other_title: String,
    pub item_summary: String,
    pub item_title: String,
    pub item_preview_caption: String,
    pub item_preview_link: String,
}

impl Default for Locators {
    fn default() -> Self {
        Self {
            about_article: "#article".into(),
            collection_name: "#page-title h1 span".into(),
            pagination_summary: "#results .results-summary".into(),
            collection_results: "#results li div.description a".into(),
            item_downloads: "#select-resource0 option".into(),
            item_sequence_downloads: "#download option".into(),
            item_format_list: "#item-online_format + ul".into(),
            item_formats: "#item-online_format + ul li".into(),
            item_call_number: "#item-call_number + ul".into(),
            item_manifest: "#item-iiif-presentation-manifest + ul a".into(),
            item_name_list: "#item-contributor_names + ul".into(),
            item_names: "#item-contributor_names + ul li".into(),
            item_note_list: "#item-notes + ul".into(),
            item_notes: "#item-notes + ul li".into(),
            item_other_title: "#item-other_title + ul".into(),
            item_summary: "#item-summary + ul".into(),
            item_title: "#item-title + ul".into(),
            item_preview_caption: "#item-preview .preview-caption".into(),
            item_preview_link: "#item-preview a".into(),
        }
    }
}
