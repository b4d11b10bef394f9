//! Metadata extraction and artifact download for one concrete item page.

use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::config::{ArchiveConfig, Locators};
use crate::contract::{ArtifactTransport, PageFetcher};
use crate::error::{ArchiveError, Result};
use crate::ledger::ArchivalRecord;
use crate::select::{artifact_file_name, select_artifact, ArtifactCandidate, SequenceSlot};
use crate::sequence::resolve_href;

/// Descriptive fields of an item page. Absent fields are empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ItemMetadata {
    pub title: String,
    pub alternate_title: String,
    pub summary: String,
    pub call_number: String,
    pub contributor_names: Vec<String>,
    pub notes: Vec<String>,
}

/// The artifact saved for an item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedArtifact {
    pub media_type: String,
    pub file_name: String,
    pub path: PathBuf,
    pub bytes: u64,
}

async fn slot_text<F>(fetcher: &F, selector: &str) -> Result<String>
where
    F: PageFetcher + ?Sized,
{
    Ok(fetcher
        .query_all(selector)
        .await?
        .into_iter()
        .next()
        .filter(|el| el.is_visible())
        .map(|el| el.text)
        .unwrap_or_default())
}

async fn list_texts<F>(fetcher: &F, list_selector: &str, item_selector: &str) -> Result<Vec<String>>
where
    F: PageFetcher + ?Sized,
{
    let list_visible = fetcher
        .query_all(list_selector)
        .await?
        .first()
        .map(|el| el.is_visible())
        .unwrap_or(false);
    if !list_visible {
        return Ok(Vec::new());
    }
    Ok(fetcher
        .query_all(item_selector)
        .await?
        .into_iter()
        .map(|el| el.text)
        .collect())
}

/// Read the descriptive metadata of the current page.
pub async fn extract_metadata<F>(fetcher: &F, locators: &Locators) -> Result<ItemMetadata>
where
    F: PageFetcher + ?Sized,
{
    Ok(ItemMetadata {
        title: slot_text(fetcher, &locators.item_title).await?,
        alternate_title: slot_text(fetcher, &locators.item_other_title).await?,
        summary: slot_text(fetcher, &locators.item_summary).await?,
        call_number: slot_text(fetcher, &locators.item_call_number).await?,
        contributor_names: list_texts(fetcher, &locators.item_name_list, &locators.item_names)
            .await?,
        notes: list_texts(fetcher, &locators.item_note_list, &locators.item_notes).await?,
    })
}

/// Choose the best download option of the current page and stream it into `dir`.
///
/// Sequence members read their options from the sequence download control and are
/// saved as `{dir}/{sequence}/{sequence}-{index}{ext}`.
pub async fn download_artifact<F, T>(
    fetcher: &F,
    transport: &T,
    item_url: &str,
    slot: Option<&SequenceSlot>,
    dir: &Path,
    config: &ArchiveConfig,
) -> Result<SavedArtifact>
where
    F: PageFetcher + ?Sized,
    T: ArtifactTransport + ?Sized,
{
    let locators = &config.locators;
    let format_list_visible = fetcher
        .query_all(&locators.item_format_list)
        .await?
        .first()
        .map(|el| el.is_visible())
        .unwrap_or(false);
    if !format_list_visible {
        return Err(ArchiveError::extraction("unable to determine format"));
    }
    let categories: Vec<String> = fetcher
        .query_all(&locators.item_formats)
        .await?
        .into_iter()
        .map(|el| el.text)
        .collect();

    let options_selector = match slot {
        Some(_) => &locators.item_sequence_downloads,
        None => &locators.item_downloads,
    };
    let candidates: Vec<ArtifactCandidate> = fetcher
        .query_all(options_selector)
        .await?
        .iter()
        .filter_map(ArtifactCandidate::from_option)
        .map(|mut candidate| {
            candidate.source_url = resolve_href(item_url, &candidate.source_url);
            candidate
        })
        .collect();
    debug!(
        item = item_url,
        ?categories,
        candidates = candidates.len(),
        "Selecting artifact"
    );

    let selection = select_artifact(&categories, &candidates, config.recognize_pdf)?;
    let file_name = artifact_file_name(&selection.candidate.source_url, slot);
    let target_dir = match slot {
        Some(slot) => dir.join(&slot.name),
        None => dir.to_path_buf(),
    };
    let path = target_dir.join(&file_name);

    let bytes = transport
        .download(&selection.candidate.source_url, &path)
        .await?;
    info!(
        item = item_url,
        format = %selection.format,
        media_type = %selection.candidate.media_type,
        file = %file_name,
        "Saved item artifact"
    );

    Ok(SavedArtifact {
        media_type: selection.format.to_string(),
        file_name,
        path,
        bytes,
    })
}

/// Extract and download the item the fetcher currently shows.
pub async fn extract_current<F, T>(
    fetcher: &F,
    transport: &T,
    item_url: &str,
    slot: Option<&SequenceSlot>,
    dir: &Path,
    config: &ArchiveConfig,
) -> Result<ArchivalRecord>
where
    F: PageFetcher + ?Sized,
    T: ArtifactTransport + ?Sized,
{
    let metadata = extract_metadata(fetcher, &config.locators).await?;
    let artifact = download_artifact(fetcher, transport, item_url, slot, dir, config).await?;
    Ok(ArchivalRecord {
        title: metadata.title,
        alternate_title: metadata.alternate_title,
        summary: metadata.summary,
        contributor_names: metadata.contributor_names.join("\n"),
        notes: metadata.notes.join("\n"),
        call_number: metadata.call_number,
        media_type: artifact.media_type,
        file_name: artifact.file_name,
    })
}

/// Navigate to `item_url`, then extract and download it.
pub async fn extract_item<F, T>(
    fetcher: &mut F,
    transport: &T,
    item_url: &str,
    slot: Option<&SequenceSlot>,
    dir: &Path,
    config: &ArchiveConfig,
) -> Result<ArchivalRecord>
where
    F: PageFetcher + ?Sized,
    T: ArtifactTransport + ?Sized,
{
    let navigation = fetcher.navigate(item_url).await?;
    if !navigation.ok {
        return Err(ArchiveError::navigation(item_url, Some(navigation.status)));
    }
    extract_current(&*fetcher, transport, item_url, slot, dir, config).await
}
