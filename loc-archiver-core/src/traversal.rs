use tracing::{debug, info};
use url::Url;

use crate::collection::CollectionUrls;
use crate::config::Locators;
use crate::contract::PageFetcher;
use crate::error::{ArchiveError, Result};

/// Number of listing pages needed for `item_count` items.
pub fn page_count(item_count: usize, page_size: usize) -> usize {
    item_count.div_ceil(page_size.max(1))
}

/// Absolute URL of `href` if it points at an item page (first path segment `item`).
/// Web pages, articles and the collection itself are filtered out here.
pub fn item_url(page_url: &str, href: &str) -> Option<String> {
    let url = Url::parse(page_url).ok()?.join(href.trim()).ok()?;
    if !matches!(url.scheme(), "http" | "https") {
        return None;
    }
    let first_segment = url.path_segments()?.next()?;
    (first_segment == "item").then(|| url.to_string())
}

/// Enumerate every item URL of the collection, page by page, in listing order.
///
/// A listing page that fails to load aborts the traversal; nothing is retried.
pub async fn collect_item_urls<F>(
    fetcher: &mut F,
    urls: &CollectionUrls,
    locators: &Locators,
    item_count: usize,
    page_size: usize,
) -> Result<Vec<String>>
where
    F: PageFetcher + ?Sized,
{
    let pages = page_count(item_count, page_size);
    let page_size = page_size.max(1);
    info!(item_count, page_size, pages, "Collecting collection item urls");

    // item_count comes from the remote summary page; never size an allocation from it
    let mut items = Vec::new();
    for page in 1..=pages {
        let listing_url = urls.listing_url(page_size, page);
        let navigation = fetcher.navigate(&listing_url).await?;
        if !navigation.ok {
            return Err(ArchiveError::navigation(listing_url, Some(navigation.status)));
        }

        let before = items.len();
        for link in fetcher.query_all(&locators.collection_results).await? {
            if let Some(href) = link.attribute("href") {
                if let Some(url) = item_url(&listing_url, href) {
                    items.push(url);
                }
            }
        }
        debug!(page, found = items.len() - before, "Collected listing page");
    }

    info!(items = items.len(), "Collected collection item urls");
    Ok(items)
}
