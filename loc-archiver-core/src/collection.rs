//! Collection identity, URL building and the collection-level pages (summary and about).

use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use tracing::{debug, info, warn};
use url::Url;

use crate::config::Locators;
use crate::contract::PageFetcher;
use crate::error::{ArchiveError, Result};

const COLLECTIONS_PATH: &str = "collections";
const ABOUT_SUBPAGE: &str = "about-this-collection/";

/// Identifies a remote collection by its slug, e.g. `ansel-adams-manzanar`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionReference {
    slug: String,
}

impl CollectionReference {
    /// Accepts either a bare slug or a full collection URL
    /// (`https://www.loc.gov/collections/{slug}/?...`).
    pub fn parse(arg: &str) -> Result<Self> {
        let arg = arg.trim();
        let slug = match Url::parse(arg) {
            Ok(url) => url
                .path_segments()
                .and_then(|mut segments| segments.nth(1))
                .unwrap_or_default()
                .to_string(),
            Err(_) => arg.to_string(),
        };
        Self::new(slug)
    }

    pub fn new(slug: impl Into<String>) -> Result<Self> {
        let slug = slug.into();
        if slug.is_empty() || slug == "." || slug == ".." || slug.contains(['/', '\\']) {
            return Err(ArchiveError::InvalidCollection(format!(
                "{slug:?} is not a collection slug"
            )));
        }
        Ok(Self { slug })
    }

    pub fn slug(&self) -> &str {
        &self.slug
    }

    /// `{dest}/{slug}`: root of everything this run writes.
    pub fn output_dir(&self, dest: &Path) -> PathBuf {
        dest.join(&self.slug)
    }

    /// `{dest}/{slug}/{slug}.xlsx`
    pub fn ledger_path(&self, dest: &Path) -> PathBuf {
        self.output_dir(dest).join(format!("{}.xlsx", self.slug))
    }
}

/// URLs of one collection's pages on a given site.
#[derive(Debug, Clone)]
pub struct CollectionUrls {
    collection: Url,
}

impl CollectionUrls {
    pub fn new(base_url: &str, collection: &CollectionReference) -> Result<Self> {
        let invalid = |reason: String| ArchiveError::InvalidCollection(reason);
        let base = Url::parse(base_url).map_err(|e| invalid(format!("base url {base_url}: {e}")))?;
        let collection = base
            .join(&format!("/{COLLECTIONS_PATH}/{}/", collection.slug()))
            .map_err(|e| invalid(e.to_string()))?;
        Ok(Self { collection })
    }

    pub fn collection_url(&self) -> String {
        self.collection.to_string()
    }

    /// Listing with a single result per page; its pagination summary carries the total.
    pub fn summary_url(&self) -> String {
        self.with_query(&[("st", "list".to_string()), ("c", "1".to_string())])
    }

    /// Listing page `page` (1-based) with `page_size` results per page.
    pub fn listing_url(&self, page_size: usize, page: usize) -> String {
        self.with_query(&[
            ("st", "list".to_string()),
            ("c", page_size.to_string()),
            ("sp", page.to_string()),
        ])
    }

    pub fn about_url(&self) -> String {
        match self.collection.join(ABOUT_SUBPAGE) {
            Ok(url) => url.to_string(),
            Err(_) => format!("{}{ABOUT_SUBPAGE}", self.collection),
        }
    }

    fn with_query(&self, pairs: &[(&str, String)]) -> String {
        let mut url = self.collection.clone();
        url.set_query(None);
        {
            let mut query = url.query_pairs_mut();
            for (key, value) in pairs {
                query.append_pair(key, value);
            }
        }
        url.to_string()
    }
}

/// What the collection summary page tells us before traversal starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionSummary {
    pub name: String,
    pub item_count: usize,
}

/// Total item count from pagination text such as `"1 - 25 of 1,203"`.
pub fn parse_item_count(text: &str) -> Option<usize> {
    text.split_whitespace()
        .last()?
        .replace(',', "")
        .parse()
        .ok()
}

/// Load the summary page and read the collection name and total item count.
/// Any failure here is fatal to the run.
pub async fn fetch_summary<F>(
    fetcher: &mut F,
    urls: &CollectionUrls,
    locators: &Locators,
) -> Result<CollectionSummary>
where
    F: PageFetcher + ?Sized,
{
    let url = urls.summary_url();
    info!(url = %url, "Navigating to collection");
    let navigation = fetcher.navigate(&url).await?;
    if !navigation.ok {
        return Err(ArchiveError::navigation(url, Some(navigation.status)));
    }

    let summary_text = fetcher
        .query_all(&locators.pagination_summary)
        .await?
        .into_iter()
        .next()
        .map(|el| el.text)
        .ok_or_else(|| ArchiveError::extraction("pagination summary not found"))?;
    let item_count = parse_item_count(&summary_text).ok_or_else(|| {
        ArchiveError::extraction(format!("unable to read item count from {summary_text:?}"))
    })?;

    let name = fetcher
        .query_all(&locators.collection_name)
        .await?
        .into_iter()
        .next()
        .map(|el| el.text)
        .unwrap_or_default();

    debug!(name = %name, item_count, "Read collection summary");
    Ok(CollectionSummary { name, item_count })
}

/// Markdown/HTML description of the collection written next to the ledger.
pub fn render_about(
    name: &str,
    collection_url: &str,
    article: Option<&str>,
    now: DateTime<Local>,
) -> String {
    let meta = format!(
        "<h1>{name}</h1>\n\
         <ul>\n  \
           <li>\n    \
             Original collection url: <a href=\"{collection_url}\">{collection_url}</a>\n  \
           </li>\n  \
           <li>\n    \
             Downloaded on:\n    \
             <time datetime=\"{}\">{}</time>\n  \
           </li>\n\
         </ul>",
        now.to_rfc3339(),
        now.format("%Y-%m-%d"),
    );
    match article {
        Some(article) => format!("{meta}\n<article>\n  {}\n</article>\n", article.trim()),
        None => format!("{meta}\n"),
    }
}

/// Write `about.md` into `dir`. A missing about page only drops the article body.
pub async fn write_about_page<F>(
    fetcher: &mut F,
    urls: &CollectionUrls,
    locators: &Locators,
    name: &str,
    dir: &Path,
) -> Result<PathBuf>
where
    F: PageFetcher + ?Sized,
{
    let about_url = urls.about_url();
    let article = match fetcher.navigate(&about_url).await {
        Ok(navigation) if navigation.ok => fetcher
            .query_all(&locators.about_article)
            .await?
            .into_iter()
            .next()
            .map(|el| el.inner_html),
        Ok(navigation) => {
            warn!(url = %about_url, status = navigation.status, "About page unavailable");
            None
        }
        Err(e) => {
            warn!(url = %about_url, error = %e, "About page unavailable");
            None
        }
    };

    let path = dir.join("about.md");
    let contents = render_about(name, &urls.collection_url(), article.as_deref(), Local::now());
    tokio::fs::write(&path, contents).await?;
    info!(path = %path.display(), "Saved collection about page");
    Ok(path)
}
