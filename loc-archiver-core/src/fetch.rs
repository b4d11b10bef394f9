//! HTTP-backed [`PageFetcher`] and the CSS query engine behind it.
//!
//! Pages are fetched with `reqwest` and kept as raw HTML; every query parses the current
//! body with `scraper` and returns owned [`Element`] snapshots, so no parsed DOM is ever
//! held across an await point.

use std::collections::HashMap;

use async_trait::async_trait;
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, warn};

use crate::config::ArchiveConfig;
use crate::contract::{Element, Navigation, PageFetcher};
use crate::error::{ArchiveError, Result};
use crate::transport::http_client;

const BLOCK_TAGS: &[&str] = &[
    "address", "article", "br", "dd", "div", "dl", "dt", "figcaption", "footer", "h1", "h2",
    "h3", "h4", "h5", "h6", "header", "li", "ol", "p", "section", "table", "tr", "ul",
];

/// Evaluate `selector` against an HTML document.
pub fn query_document(html: &str, selector: &str) -> Result<Vec<Element>> {
    let parsed = Selector::parse(selector).map_err(|e| ArchiveError::Selector {
        selector: selector.to_string(),
        reason: format!("{e:?}"),
    })?;
    let document = Html::parse_document(html);
    Ok(document.select(&parsed).map(snapshot).collect())
}

fn snapshot(element: ElementRef<'_>) -> Element {
    let attributes = element
        .value()
        .attrs()
        .map(|(name, value)| (name.to_string(), value.to_string()))
        .collect::<HashMap<_, _>>();
    Element {
        text: inner_text(element),
        inner_html: element.inner_html(),
        attributes,
        visible: is_visible(element),
    }
}

/// Approximates rendered inner text: block boundaries become line breaks,
/// runs of whitespace collapse to one space, blank lines are dropped.
fn inner_text(element: ElementRef<'_>) -> String {
    let mut raw = String::new();
    push_text(element, &mut raw);
    raw.lines()
        .map(|line| line.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

fn push_text(element: ElementRef<'_>, out: &mut String) {
    for child in element.children() {
        if let Some(text) = child.value().as_text() {
            out.push_str(text);
        } else if let Some(child_element) = ElementRef::wrap(child) {
            let name = child_element.value().name();
            if matches!(name, "script" | "style" | "template") {
                continue;
            }
            let block = BLOCK_TAGS.contains(&name);
            if block {
                out.push('\n');
            }
            push_text(child_element, out);
            if block {
                out.push('\n');
            }
        }
    }
}

fn is_visible(element: ElementRef<'_>) -> bool {
    std::iter::once(element)
        .chain(element.ancestors().filter_map(ElementRef::wrap))
        .all(|el| !is_hidden(el.value()))
}

fn is_hidden(element: &scraper::node::Element) -> bool {
    if element.attr("hidden").is_some() {
        return true;
    }
    element
        .attr("style")
        .map(|style| {
            style
                .chars()
                .filter(|c| !c.is_whitespace())
                .collect::<String>()
                .to_ascii_lowercase()
                .contains("display:none")
        })
        .unwrap_or(false)
}

struct LoadedPage {
    url: String,
    body: String,
}

/// A page session over plain HTTP. Holds the body of the last navigated page.
pub struct HttpPageFetcher {
    client: reqwest::Client,
    current: Option<LoadedPage>,
}

impl HttpPageFetcher {
    pub fn new(config: &ArchiveConfig) -> Result<Self> {
        Ok(Self::with_client(http_client(config)?))
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self {
            client,
            current: None,
        }
    }

    pub fn current_url(&self) -> Option<&str> {
        self.current.as_ref().map(|page| page.url.as_str())
    }
}

#[async_trait]
impl PageFetcher for HttpPageFetcher {
    async fn navigate(&mut self, url: &str) -> Result<Navigation> {
        self.current = None;
        let response = match self.client.get(url).send().await {
            Ok(response) => response,
            Err(e) => {
                warn!(error = %e, url, "Request failed before a response was received");
                return Err(ArchiveError::navigation(url, None));
            }
        };
        let navigation = Navigation::from_status(response.status().as_u16());
        let body = response.text().await.map_err(|e| {
            warn!(error = %e, url, "Failed to read response body");
            ArchiveError::navigation(url, Some(navigation.status))
        })?;
        debug!(url, status = navigation.status, bytes = body.len(), "Navigated");
        self.current = Some(LoadedPage {
            url: url.to_string(),
            body,
        });
        Ok(navigation)
    }

    async fn query_all(&self, selector: &str) -> Result<Vec<Element>> {
        match &self.current {
            Some(page) => query_document(&page.body, selector),
            None => Ok(Vec::new()),
        }
    }
}
