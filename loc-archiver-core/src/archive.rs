//! High-level pipeline: orchestrates summary → traversal → per-item archiving → ledger flush.
//!
//! This module provides the top-level orchestration for archiving one collection. It:
//!   - Reads the collection summary (name, total item count) and writes `about.md`
//!   - Enumerates every item URL through the paginated listing
//!   - For each item, classifies it as single or sequence and archives every concrete
//!     item it maps to, recording one ledger row per success and per failure
//!   - Flushes the ledger at the end, or as soon as the shutdown future resolves
//!
//! # Error Handling
//! Failures before the item loop starts (summary, listing pages, output directory) are
//! fatal and returned as `Err`. Failures scoped to one item are recorded in the ledger and
//! the loop moves on; they never make the run fail.
//!
//! # Concurrency
//! Strictly sequential: one browsing session, one item at a time, sequence members in
//! order. A fixed pause precedes every navigation after the first to bound request rate.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::{info, warn};

use crate::collection::{fetch_summary, write_about_page, CollectionReference, CollectionUrls};
use crate::config::ArchiveConfig;
use crate::contract::{ArtifactTransport, PageFetcher, TableWriter};
use crate::error::{ArchiveError, Result};
use crate::extract::{extract_current, extract_item};
use crate::ledger::{ArchivalLedger, LedgerReport};
use crate::progress::Progress;
use crate::select::SequenceSlot;
use crate::sequence::{self, ItemKind};
use crate::traversal::collect_item_urls;

/// What to archive and where.
#[derive(Debug, Clone)]
pub struct ArchiveOptions {
    pub collection: CollectionReference,
    pub dest: PathBuf,
    pub config: ArchiveConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveOutcome {
    Completed,
    Interrupted,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveReport {
    pub outcome: ArchiveOutcome,
    pub collection_name: String,
    pub items_discovered: usize,
    pub ledger: LedgerReport,
}

#[derive(Debug, Default)]
struct RunState {
    collection_name: String,
    items_discovered: usize,
}

/// Archive a whole collection.
///
/// The ledger is owned here and lent to the item loop. If `shutdown` resolves first, the
/// loop is dropped where it stands and whatever was accumulated is flushed; a partially
/// downloaded file may remain on disk but never appears in the ledger.
pub async fn archive_collection<F, T, S>(
    options: &ArchiveOptions,
    fetcher: &mut F,
    transport: &T,
    writer: &dyn TableWriter,
    progress: &mut dyn Progress,
    shutdown: S,
) -> Result<ArchiveReport>
where
    F: PageFetcher + ?Sized,
    T: ArtifactTransport + ?Sized,
    S: Future<Output = ()>,
{
    let mut ledger = ArchivalLedger::new(options.collection.ledger_path(&options.dest));
    let mut state = RunState::default();

    let outcome = {
        let run = run_pipeline(options, fetcher, transport, &mut ledger, &mut *progress, &mut state);
        tokio::pin!(run);
        tokio::select! {
            result = &mut run => {
                result?;
                ArchiveOutcome::Completed
            }
            _ = shutdown => {
                warn!(collection = options.collection.slug(), "[ARCHIVE] Interrupted, saving ledger");
                ArchiveOutcome::Interrupted
            }
        }
    };

    progress.finish();
    let ledger_report = ledger.flush(writer)?;

    match outcome {
        ArchiveOutcome::Completed if ledger.has_errors() => warn!(
            errors = ledger_report.errors,
            path = %ledger_report.path.display(),
            "[ARCHIVE] Collection archival complete with errors, see the Errors sheet"
        ),
        ArchiveOutcome::Completed => info!(
            records = ledger_report.records,
            path = %ledger_report.path.display(),
            "[ARCHIVE] Collection archival complete"
        ),
        ArchiveOutcome::Interrupted => info!(
            records = ledger_report.records,
            errors = ledger_report.errors,
            "[ARCHIVE] Partial ledger saved"
        ),
    }

    Ok(ArchiveReport {
        outcome,
        collection_name: state.collection_name,
        items_discovered: state.items_discovered,
        ledger: ledger_report,
    })
}

async fn run_pipeline<F, T>(
    options: &ArchiveOptions,
    fetcher: &mut F,
    transport: &T,
    ledger: &mut ArchivalLedger,
    progress: &mut dyn Progress,
    state: &mut RunState,
) -> Result<()>
where
    F: PageFetcher + ?Sized,
    T: ArtifactTransport + ?Sized,
{
    let config = &options.config;
    let urls = CollectionUrls::new(&config.base_url, &options.collection)?;

    let summary = fetch_summary(fetcher, &urls, &config.locators).await?;
    state.collection_name = summary.name.clone();

    let dir = options.collection.output_dir(&options.dest);
    tokio::fs::create_dir_all(&dir).await?;
    write_about_page(fetcher, &urls, &config.locators, &summary.name, &dir).await?;

    let items = collect_item_urls(
        fetcher,
        &urls,
        &config.locators,
        summary.item_count,
        config.page_size,
    )
    .await?;
    state.items_discovered = items.len();
    info!(
        items = items.len(),
        collection = %summary.name,
        "[ARCHIVE] Archiving items from the collection"
    );

    archive_items(fetcher, transport, &items, &dir, config, ledger, progress).await;
    Ok(())
}

async fn pause(delay: Duration) {
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }
}

fn record_failure(
    ledger: &mut ArchivalLedger,
    progress: &mut dyn Progress,
    url: &str,
    err: &ArchiveError,
) {
    let message = err.to_string();
    warn!(url, error = %message, "[ARCHIVE] Item failed");
    progress.item_failed(url, &message);
    ledger.record_error(url, message);
}

/// Archive `items` in order into `dir`, recording every outcome in `ledger`.
///
/// Never fails: each concrete item's error becomes exactly one ledger error row.
pub async fn archive_items<F, T>(
    fetcher: &mut F,
    transport: &T,
    items: &[String],
    dir: &Path,
    config: &ArchiveConfig,
    ledger: &mut ArchivalLedger,
    progress: &mut dyn Progress,
) where
    F: PageFetcher + ?Sized,
    T: ArtifactTransport + ?Sized,
{
    progress.begin(items.len());
    for (index, item_url) in items.iter().enumerate() {
        if index > 0 {
            pause(config.pacing()).await;
        }
        archive_item(fetcher, transport, item_url, dir, config, ledger, progress).await;
        progress.item_done(item_url);
    }
}

async fn archive_item<F, T>(
    fetcher: &mut F,
    transport: &T,
    item_url: &str,
    dir: &Path,
    config: &ArchiveConfig,
    ledger: &mut ArchivalLedger,
    progress: &mut dyn Progress,
) where
    F: PageFetcher + ?Sized,
    T: ArtifactTransport + ?Sized,
{
    let kind = match classify(fetcher, transport, item_url, config).await {
        Ok(kind) => kind,
        Err(e) => return record_failure(ledger, progress, item_url, &e),
    };

    match kind {
        ItemKind::Single => {
            match extract_current(&*fetcher, transport, item_url, None, dir, config).await {
                Ok(record) => ledger.record_success(record),
                Err(e) => record_failure(ledger, progress, item_url, &e),
            }
        }
        ItemKind::Sequence(descriptor) => {
            info!(
                item = item_url,
                sequence = %descriptor.name,
                members = descriptor.member_count,
                "[ARCHIVE] Archiving sequence"
            );
            for (index, member_url) in descriptor.members.iter().enumerate() {
                pause(config.pacing()).await;
                let slot = SequenceSlot {
                    name: descriptor.name.clone(),
                    index: index + 1,
                };
                match extract_item(fetcher, transport, member_url, Some(&slot), dir, config).await {
                    Ok(record) => ledger.record_success(record),
                    Err(e) => record_failure(ledger, progress, member_url, &e),
                }
            }
        }
    }
}

async fn classify<F, T>(
    fetcher: &mut F,
    transport: &T,
    item_url: &str,
    config: &ArchiveConfig,
) -> Result<ItemKind>
where
    F: PageFetcher + ?Sized,
    T: ArtifactTransport + ?Sized,
{
    let navigation = fetcher.navigate(item_url).await?;
    if !navigation.ok {
        return Err(ArchiveError::navigation(item_url, Some(navigation.status)));
    }
    sequence::resolve(&*fetcher, transport, item_url, &config.locators).await
}
