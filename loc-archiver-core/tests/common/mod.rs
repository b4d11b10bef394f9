#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use async_trait::async_trait;
use tokio::sync::oneshot;

use loc_archiver_core::config::ArchiveConfig;
use loc_archiver_core::contract::{
    ArtifactTransport, Element, Manifest, Navigation, PageFetcher, Sheet, TableWriter,
};
use loc_archiver_core::error::{ArchiveError, Result};
use loc_archiver_core::fetch::query_document;
use loc_archiver_core::progress::Progress;

/// In-memory site: URL -> (status, html). Unknown URLs answer 404 with an empty body.
#[derive(Default)]
pub struct FixtureSite {
    pages: HashMap<String, (u16, String)>,
    current: Option<String>,
    stall: Option<(String, Option<oneshot::Sender<()>>)>,
    pub visited: Vec<String>,
}

impl FixtureSite {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page(mut self, url: impl Into<String>, html: impl Into<String>) -> Self {
        self.pages.insert(url.into(), (200, html.into()));
        self
    }

    pub fn status(mut self, url: impl Into<String>, status: u16) -> Self {
        self.pages.insert(url.into(), (status, String::new()));
        self
    }

    /// Navigating to `url` signals `tx` and then never completes.
    pub fn stall_at(mut self, url: impl Into<String>, tx: oneshot::Sender<()>) -> Self {
        self.stall = Some((url.into(), Some(tx)));
        self
    }
}

#[async_trait]
impl PageFetcher for FixtureSite {
    async fn navigate(&mut self, url: &str) -> Result<Navigation> {
        self.visited.push(url.to_string());
        if let Some((stall_url, tx)) = &mut self.stall {
            if stall_url.as_str() == url {
                if let Some(tx) = tx.take() {
                    let _ = tx.send(());
                }
                std::future::pending::<()>().await;
            }
        }
        let status = self.pages.get(url).map(|(status, _)| *status).unwrap_or(404);
        self.current = Some(url.to_string());
        Ok(Navigation::from_status(status))
    }

    async fn query_all(&self, selector: &str) -> Result<Vec<Element>> {
        match self.current.as_ref().and_then(|url| self.pages.get(url)) {
            Some((_, html)) => query_document(html, selector),
            None => Ok(Vec::new()),
        }
    }
}

/// Serves manifests from memory and writes a small placeholder body for each download.
#[derive(Default)]
pub struct RecordingTransport {
    manifests: HashMap<String, Manifest>,
    failing: HashSet<String>,
    pub downloads: Mutex<Vec<(String, PathBuf)>>,
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn manifest(mut self, url: impl Into<String>, member_urls: &[&str]) -> Self {
        let canvases: Vec<_> = member_urls
            .iter()
            .map(|member| serde_json::json!({ "metadata": [{ "label": "item", "value": member }] }))
            .collect();
        let manifest: Manifest =
            serde_json::from_value(serde_json::json!({ "sequences": [{ "canvases": canvases }] }))
                .unwrap();
        self.manifests.insert(url.into(), manifest);
        self
    }

    pub fn failing(mut self, url: impl Into<String>) -> Self {
        self.failing.insert(url.into());
        self
    }

    pub fn downloaded(&self) -> Vec<(String, PathBuf)> {
        self.downloads.lock().unwrap().clone()
    }
}

#[async_trait]
impl ArtifactTransport for RecordingTransport {
    async fn fetch_manifest(&self, url: &str) -> Result<Manifest> {
        self.manifests
            .get(url)
            .cloned()
            .ok_or_else(|| ArchiveError::ManifestFailed {
                url: url.to_string(),
                reason: "status 404 Not Found".into(),
            })
    }

    async fn download(&self, url: &str, dest: &Path) -> Result<u64> {
        if self.failing.contains(url) {
            return Err(ArchiveError::DownloadFailed {
                url: url.to_string(),
                reason: "status 500 Internal Server Error".into(),
            });
        }
        if let Some(parent) = dest.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let body = format!("contents of {url}");
        std::fs::write(dest, &body)?;
        self.downloads
            .lock()
            .unwrap()
            .push((url.to_string(), dest.to_path_buf()));
        Ok(body.len() as u64)
    }
}

/// Keeps every flushed workbook in memory.
#[derive(Default)]
pub struct CapturingWriter {
    pub writes: Mutex<Vec<(PathBuf, Vec<Sheet>)>>,
}

impl CapturingWriter {
    pub fn last(&self) -> Option<(PathBuf, Vec<Sheet>)> {
        self.writes.lock().unwrap().last().cloned()
    }

    pub fn count(&self) -> usize {
        self.writes.lock().unwrap().len()
    }
}

impl TableWriter for CapturingWriter {
    fn write(&self, path: &Path, sheets: &[Sheet]) -> Result<()> {
        self.writes
            .lock()
            .unwrap()
            .push((path.to_path_buf(), sheets.to_vec()));
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct CountingProgress {
    pub total: usize,
    pub done: Vec<String>,
    pub failed: Vec<String>,
    pub finished: bool,
}

impl Progress for CountingProgress {
    fn begin(&mut self, total: usize) {
        self.total = total;
    }

    fn item_done(&mut self, url: &str) {
        self.done.push(url.to_string());
    }

    fn item_failed(&mut self, url: &str, _message: &str) {
        self.failed.push(url.to_string());
    }

    fn finish(&mut self) {
        self.finished = true;
    }
}

pub fn test_config(page_size: usize) -> ArchiveConfig {
    ArchiveConfig {
        page_size,
        pacing_ms: 0,
        ..ArchiveConfig::default()
    }
}

pub fn summary_page(name: &str, item_count: &str) -> String {
    format!(
        r#"<html><body>
          <div id="page-title"><h1><span>{name}</span></h1></div>
          <div id="results"><span class="results-summary">1 - 1 of {item_count}</span></div>
        </body></html>"#
    )
}

pub fn listing_page(hrefs: &[&str]) -> String {
    let results: String = hrefs
        .iter()
        .map(|href| {
            format!(r#"<li><div class="description"><a href="{href}">Result</a></div></li>"#)
        })
        .collect();
    format!(r#"<html><body><div id="results"><ul>{results}</ul></div></body></html>"#)
}

pub fn about_page(article: &str) -> String {
    format!(r#"<html><body><div id="article">{article}</div></body></html>"#)
}

/// Item page builder; only the sections that were set are rendered.
#[derive(Default)]
pub struct ItemPage {
    title: String,
    formats: Vec<String>,
    names: Vec<String>,
    call_number: Option<String>,
    options: Vec<(String, String, String)>,
    sequence_options: Vec<(String, String, String)>,
    manifest: Option<String>,
    caption: Option<(String, Option<String>)>,
}

impl ItemPage {
    pub fn titled(title: &str) -> Self {
        Self {
            title: title.to_string(),
            ..Self::default()
        }
    }

    pub fn format(mut self, format: &str) -> Self {
        self.formats.push(format.to_string());
        self
    }

    pub fn name(mut self, name: &str) -> Self {
        self.names.push(name.to_string());
        self
    }

    pub fn call_number(mut self, call_number: &str) -> Self {
        self.call_number = Some(call_number.to_string());
        self
    }

    pub fn option(mut self, media_type: &str, url: &str, label: &str) -> Self {
        self.options
            .push((media_type.to_string(), url.to_string(), label.to_string()));
        self
    }

    pub fn sequence_option(mut self, media_type: &str, url: &str, label: &str) -> Self {
        self.sequence_options
            .push((media_type.to_string(), url.to_string(), label.to_string()));
        self
    }

    pub fn manifest(mut self, href: &str) -> Self {
        self.manifest = Some(href.to_string());
        self
    }

    pub fn caption(mut self, caption: &str, preview_href: Option<&str>) -> Self {
        self.caption = Some((caption.to_string(), preview_href.map(str::to_string)));
        self
    }

    pub fn render(&self) -> String {
        let mut html = String::from("<html><body>");
        html.push_str(&format!(
            r#"<h3 id="item-title">Title</h3><ul><li>{}</li></ul>"#,
            self.title
        ));
        if !self.formats.is_empty() {
            html.push_str(&section("item-online_format", "Online Format", &self.formats));
        }
        if !self.names.is_empty() {
            html.push_str(&section("item-contributor_names", "Names", &self.names));
        }
        if let Some(call_number) = &self.call_number {
            html.push_str(&section(
                "item-call_number",
                "Call Number",
                std::slice::from_ref(call_number),
            ));
        }
        if let Some(href) = &self.manifest {
            html.push_str(&format!(
                r#"<h3 id="item-iiif-presentation-manifest">IIIF Presentation Manifest</h3><ul><li><a href="{href}">Manifest (JSON/LD)</a></li></ul>"#
            ));
        }
        if let Some((caption, href)) = &self.caption {
            html.push_str(r#"<div id="item-preview">"#);
            if let Some(href) = href {
                html.push_str(&format!(r#"<a href="{href}"><img src="preview.jpg"></a>"#));
            }
            html.push_str(&format!(r#"<p class="preview-caption">{caption}</p></div>"#));
        }
        html.push_str(&select("select-resource0", &self.options));
        html.push_str(&select("download", &self.sequence_options));
        html.push_str("</body></html>");
        html
    }
}

fn section(id: &str, heading: &str, values: &[String]) -> String {
    let items: String = values.iter().map(|v| format!("<li>{v}</li>")).collect();
    format!(r#"<h3 id="{id}">{heading}</h3><ul>{items}</ul>"#)
}

fn select(id: &str, options: &[(String, String, String)]) -> String {
    if options.is_empty() {
        return String::new();
    }
    let items: String = options
        .iter()
        .map(|(media_type, url, label)| {
            format!(r#"<option data-file-download="{media_type}" value="{url}">{label}</option>"#)
        })
        .collect();
    format!(r#"<select id="{id}">{items}</select>"#)
}
