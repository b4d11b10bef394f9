//! Artifact selection: which download option of an item gets archived, and under what name.
//!
//! Selection is a pure function of the declared categories and the candidate list. The
//! candidates are ranked by an explicit sort key, so the result never depends on the order
//! the options appear on the page.

use std::cmp::Ordering;
use std::fmt;
use std::sync::OnceLock;

use regex::Regex;
use url::Url;

use crate::contract::Element;
use crate::error::{ArchiveError, Result};

/// Matches e.g. `(24.1 MB)` or `(300x300 px)`.
fn size_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"\((?<size>[\d.x]+)\s*(?<unit>\w+)\)").expect("size pattern is valid")
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SizeKind {
    Bytes,
    Area,
}

/// A comparable magnitude parsed from a download option label.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SizeValue {
    pub kind: SizeKind,
    pub value: f64,
}

impl SizeValue {
    pub const ZERO: SizeValue = SizeValue {
        kind: SizeKind::Bytes,
        value: 0.0,
    };

    /// Parse the size out of an option label. Never fails: anything unreadable is zero.
    pub fn parse(label: &str) -> SizeValue {
        let Some(captures) = size_pattern().captures(label) else {
            return SizeValue::ZERO;
        };
        let size = &captures["size"];
        let unit = captures["unit"].to_ascii_lowercase();

        let bytes = |multiplier: f64| match size.parse::<f64>() {
            Ok(value) if value.is_finite() => SizeValue {
                kind: SizeKind::Bytes,
                value: value * multiplier,
            },
            _ => SizeValue::ZERO,
        };

        match unit.as_str() {
            "kb" => bytes(1_024.0),
            "mb" => bytes(1_048_576.0),
            "gb" => bytes(1_073_741_824.0),
            "px" => {
                let mut dims = size.split('x').map(str::parse::<f64>);
                match (dims.next(), dims.next(), dims.next()) {
                    (Some(Ok(width)), Some(Ok(height)), None) => SizeValue {
                        kind: SizeKind::Area,
                        value: width * height,
                    },
                    _ => SizeValue::ZERO,
                }
            }
            _ => bytes(1.0),
        }
    }

    /// Normalised magnitude used for ranking.
    pub fn magnitude(&self) -> u64 {
        if self.value.is_finite() && self.value > 0.0 {
            self.value as u64
        } else {
            0
        }
    }
}

/// One downloadable option for an item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactCandidate {
    pub media_type: String,
    pub source_url: String,
    pub size_bytes: u64,
}

impl ArtifactCandidate {
    /// Read a candidate from a download `<option>`. Options without a type or URL are skipped.
    pub fn from_option(option: &Element) -> Option<Self> {
        let media_type = option.attribute("data-file-download")?.trim().to_lowercase();
        let source_url = option.attribute("value")?.trim().to_string();
        if media_type.is_empty() || source_url.is_empty() {
            return None;
        }
        Some(Self {
            media_type,
            source_url,
            size_bytes: SizeValue::parse(option.text()).magnitude(),
        })
    }
}

/// The dominant media format of an item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaFormat {
    Video,
    Audio,
    Image,
    Pdf,
}

impl MediaFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaFormat::Video => "video",
            MediaFormat::Audio => "audio",
            MediaFormat::Image => "image",
            MediaFormat::Pdf => "pdf",
        }
    }

    /// Acceptable media-type tokens, most preferred first.
    pub fn acceptable_types(&self) -> &'static [&'static str] {
        match self {
            MediaFormat::Video => &["video"],
            MediaFormat::Audio => &["audio"],
            MediaFormat::Image => &["tiff", "jpeg"],
            MediaFormat::Pdf => &["pdf"],
        }
    }

    /// Infer the format from the item's declared categories.
    /// Video beats audio beats image; pdf only counts when enabled and nothing else matched.
    pub fn infer<S: AsRef<str>>(categories: &[S], recognize_pdf: bool) -> Result<Self> {
        let has = |wanted: &str| {
            categories
                .iter()
                .any(|category| category.as_ref().trim().eq_ignore_ascii_case(wanted))
        };
        if has("video") {
            Ok(MediaFormat::Video)
        } else if has("audio") {
            Ok(MediaFormat::Audio)
        } else if has("image") {
            Ok(MediaFormat::Image)
        } else if recognize_pdf && has("pdf") {
            Ok(MediaFormat::Pdf)
        } else {
            Err(ArchiveError::FormatUnrecognized)
        }
    }
}

impl fmt::Display for MediaFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ordered media-type preference for one selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionPolicy {
    preferred: Vec<String>,
}

impl SelectionPolicy {
    pub fn new<I, S>(preferred: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            preferred: preferred.into_iter().map(Into::into).collect(),
        }
    }

    pub fn for_format(format: MediaFormat) -> Self {
        Self::new(format.acceptable_types().iter().copied())
    }

    pub fn rank(&self, media_type: &str) -> Option<usize> {
        self.preferred.iter().position(|t| t == media_type)
    }

    /// Lowest policy rank wins, then the largest size, then the smallest URL.
    pub fn select<'a>(&self, candidates: &'a [ArtifactCandidate]) -> Option<&'a ArtifactCandidate> {
        candidates
            .iter()
            .filter_map(|c| self.rank(&c.media_type).map(|rank| (rank, c)))
            .min_by(|(rank_a, a), (rank_b, b)| {
                rank_a
                    .cmp(rank_b)
                    .then_with(|| b.size_bytes.cmp(&a.size_bytes))
                    .then_with(|| a.source_url.cmp(&b.source_url))
            })
            .map(|(_, candidate)| candidate)
    }
}

/// The chosen artifact for one item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    pub format: MediaFormat,
    pub candidate: ArtifactCandidate,
}

/// Pick the artifact to archive for an item.
pub fn select_artifact<S: AsRef<str>>(
    categories: &[S],
    candidates: &[ArtifactCandidate],
    recognize_pdf: bool,
) -> Result<Selection> {
    let format = MediaFormat::infer(categories, recognize_pdf)?;
    let policy = SelectionPolicy::for_format(format);
    let candidate = policy
        .select(candidates)
        .cloned()
        .ok_or_else(|| ArchiveError::NoSuitableArtifact {
            format: format.to_string(),
        })?;
    Ok(Selection { format, candidate })
}

/// Position of an item inside a sequence, used for naming.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SequenceSlot {
    pub name: String,
    /// 1-based
    pub index: usize,
}

fn url_file_name(source_url: &str) -> String {
    let path = match Url::parse(source_url) {
        Ok(url) => url.path().to_string(),
        Err(_) => source_url
            .split(['?', '#'])
            .next()
            .unwrap_or_default()
            .to_string(),
    };
    path.rsplit('/').next().unwrap_or_default().to_string()
}

/// Extension of the URL's last path segment, including the dot (`.jpg`), or empty.
pub fn url_extension(source_url: &str) -> String {
    let name = url_file_name(source_url);
    match name.rfind('.') {
        Some(0) | None => String::new(),
        Some(dot) => name[dot..].to_string(),
    }
}

/// `{sequence}-{index}{ext}` for sequence members, the URL's own base name otherwise.
pub fn artifact_file_name(source_url: &str, slot: Option<&SequenceSlot>) -> String {
    match slot {
        Some(slot) => format!("{}-{}{}", slot.name, slot.index, url_extension(source_url)),
        None => url_file_name(source_url),
    }
}

impl PartialOrd for SizeValue {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        if self.kind != other.kind {
            return None;
        }
        self.value.partial_cmp(&other.value)
    }
}
