//! Single-vs-sequence classification of a navigated item page.
//!
//! Two signals can mark an item as a multi-page sequence:
//! - a IIIF presentation manifest link, which lists every member exactly;
//! - a preview caption such as `"24 images in sequence"`, from which member URLs are
//!   synthesised by numbering the `sp` query parameter of the first preview link.
//!
//! Both are checked and the manifest always wins; caption text alone undercounts
//! manifests whose caption is non-standard. Either way the result is normalised into a
//! [`SequenceDescriptor`] before anything downstream looks at it.

use std::sync::OnceLock;

use regex::Regex;
use tracing::{debug, info, warn};
use url::Url;

use crate::config::Locators;
use crate::contract::{ArtifactTransport, PageFetcher};
use crate::error::Result;

/// Query parameter carrying the page number of a sequence member.
pub const PAGE_PARAM: &str = "sp";

fn caption_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?i)(\d[\d,]*)\s+images?\s+in\s+sequence").expect("caption pattern is valid")
    })
}

/// Where the members of a sequence come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SequenceSource {
    /// Exact member URLs, in manifest order.
    Manifest(Vec<String>),
    /// `count` numbered sub-pages of `template_url`.
    PageCount { count: usize, template_url: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SequenceDescriptor {
    pub name: String,
    pub member_count: usize,
    pub members: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemKind {
    Single,
    Sequence(SequenceDescriptor),
}

impl SequenceSource {
    pub fn into_descriptor(self, name: impl Into<String>) -> SequenceDescriptor {
        let members = match self {
            SequenceSource::Manifest(members) => members,
            SequenceSource::PageCount {
                count,
                template_url,
            } => (1..=count)
                .map(|page| with_page_number(&template_url, page))
                .collect(),
        };
        SequenceDescriptor {
            name: name.into(),
            member_count: members.len(),
            members,
        }
    }
}

/// Sequence member count from a caption, if the caption describes a sequence.
pub fn parse_sequence_caption(caption: &str) -> Option<usize> {
    let captures = caption_pattern().captures(caption)?;
    captures[1]
        .replace(',', "")
        .parse()
        .ok()
        .filter(|count| *count > 0)
}

/// `url` with its page-number parameter set to `page`; other parameters are kept in order.
pub fn with_page_number(url: &str, page: usize) -> String {
    match Url::parse(url) {
        Ok(mut parsed) => {
            let kept: Vec<(String, String)> = parsed
                .query_pairs()
                .filter(|(key, _)| key != PAGE_PARAM)
                .map(|(key, value)| (key.into_owned(), value.into_owned()))
                .collect();
            parsed.set_query(None);
            {
                let mut query = parsed.query_pairs_mut();
                for (key, value) in &kept {
                    query.append_pair(key, value);
                }
                query.append_pair(PAGE_PARAM, &page.to_string());
            }
            parsed.to_string()
        }
        Err(_) => {
            let separator = if url.contains('?') { '&' } else { '?' };
            format!("{url}{separator}{PAGE_PARAM}={page}")
        }
    }
}

/// Name of the sequence: the last non-empty path segment of the item URL.
pub fn sequence_name(item_url: &str) -> String {
    let path = Url::parse(item_url)
        .map(|url| url.path().to_string())
        .unwrap_or_else(|_| item_url.to_string());
    path.split('/')
        .filter(|segment| !segment.is_empty())
        .last()
        .unwrap_or("sequence")
        .to_string()
}

/// Resolve a possibly relative `href` against the page it appeared on.
pub(crate) fn resolve_href(base: &str, href: &str) -> String {
    Url::parse(base)
        .and_then(|base| base.join(href))
        .map(|url| url.to_string())
        .unwrap_or_else(|_| href.to_string())
}

/// Classify the current page of `fetcher`, which must already show `item_url`.
pub async fn resolve<F, T>(
    fetcher: &F,
    transport: &T,
    item_url: &str,
    locators: &Locators,
) -> Result<ItemKind>
where
    F: PageFetcher + ?Sized,
    T: ArtifactTransport + ?Sized,
{
    let name = sequence_name(item_url);

    let manifest_href = fetcher
        .query_all(&locators.item_manifest)
        .await?
        .into_iter()
        .filter(|el| el.is_visible())
        .find_map(|el| el.attribute("href").map(str::to_string));

    if let Some(href) = manifest_href {
        let manifest_url = resolve_href(item_url, &href);
        let members = transport.fetch_manifest(&manifest_url).await?.member_urls();
        if !members.is_empty() {
            info!(item = item_url, members = members.len(), "Resolved sequence from manifest");
            return Ok(ItemKind::Sequence(
                SequenceSource::Manifest(members).into_descriptor(name),
            ));
        }
        warn!(item = item_url, manifest = %manifest_url, "Manifest lists no canvases, checking caption");
    }

    let count = fetcher
        .query_all(&locators.item_preview_caption)
        .await?
        .iter()
        .find_map(|el| parse_sequence_caption(el.text()));

    if let Some(count) = count {
        let template_url = fetcher
            .query_all(&locators.item_preview_link)
            .await?
            .into_iter()
            .find_map(|el| el.attribute("href").map(|href| resolve_href(item_url, href)))
            .unwrap_or_else(|| item_url.to_string());
        info!(item = item_url, count, "Resolved sequence from caption");
        return Ok(ItemKind::Sequence(
            SequenceSource::PageCount {
                count,
                template_url,
            }
            .into_descriptor(name),
        ));
    }

    debug!(item = item_url, "Item is a single artifact");
    Ok(ItemKind::Single)
}
