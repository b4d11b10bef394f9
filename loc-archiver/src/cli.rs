/// # loc-archiver CLI Interface (Module)
///
/// Command parsing, configuration merging and wiring of the HTTP collaborators. All
/// archival logic lives in the `loc-archiver-core` crate; this module only decides
/// which collaborators run and with which settings.
///
/// ## How To Use
/// - For command-line users: use the installed `loc-archiver` binary with `--help`.
/// - For programmatic/integration use: call [`run`] with a constructed [`Cli`] and a
///   shutdown future.
use crate::load_config::{load_config, CliConfig};
use anyhow::Result;
use clap::{Parser, Subcommand};
use loc_archiver_core::archive::{archive_collection, ArchiveOptions, ArchiveReport};
use loc_archiver_core::collection::CollectionReference;
use loc_archiver_core::fetch::HttpPageFetcher;
use loc_archiver_core::ledger::XlsxTableWriter;
use loc_archiver_core::progress::LogProgress;
use loc_archiver_core::transport::HttpTransport;
use std::future::Future;
use std::path::PathBuf;

/// CLI for loc-archiver: archive Library of Congress digital collections.
#[derive(Parser, Debug)]
#[clap(
    name = "loc-archiver",
    version,
    about = "Archive a Library of Congress digital collection: files, metadata ledger and about page"
)]
pub struct Cli {
    #[clap(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Archive every item of a collection into DEST/<collection>/
    Archive {
        /// Collection slug or URL, e.g. `ansel-adams-manzanar`
        collection: String,
        /// Destination directory [default: current directory]
        #[clap(long)]
        dest: Option<PathBuf>,
        /// Path to a YAML config file
        #[clap(long, env = "LOC_ARCHIVER_CONFIG")]
        config: Option<PathBuf>,
        /// Items per listing page
        #[clap(long)]
        page_size: Option<usize>,
        /// Pause before each item navigation, in milliseconds
        #[clap(long)]
        pacing_ms: Option<u64>,
    },
}

/// Async CLI entrypoint for integration tests and main(). `shutdown` interrupts the run.
pub async fn run<S>(cli: Cli, shutdown: S) -> Result<ArchiveReport>
where
    S: Future<Output = ()>,
{
    match cli.command {
        Commands::Archive {
            collection,
            dest,
            config,
            page_size,
            pacing_ms,
        } => {
            let file_config = match config {
                Some(path) => load_config(path)?,
                None => CliConfig::default(),
            };
            let mut archive_config = file_config.archive;
            if let Some(page_size) = page_size {
                archive_config.page_size = page_size;
            }
            if let Some(pacing_ms) = pacing_ms {
                archive_config.pacing_ms = pacing_ms;
            }
            if archive_config.page_size == 0 {
                anyhow::bail!("page size must be at least 1");
            }

            let collection = CollectionReference::parse(&collection)?;
            let dest = dest
                .or(file_config.dest)
                .unwrap_or_else(|| PathBuf::from("."));
            tracing::info!(
                command = "archive",
                collection = collection.slug(),
                dest = %dest.display(),
                "Starting collection archival"
            );

            let mut fetcher = HttpPageFetcher::new(&archive_config)?;
            let transport = HttpTransport::new(&archive_config)?;
            let mut progress = LogProgress::new();
            let options = ArchiveOptions {
                collection,
                dest,
                config: archive_config,
            };

            let report = archive_collection(
                &options,
                &mut fetcher,
                &transport,
                &XlsxTableWriter::new(),
                &mut progress,
                shutdown,
            )
            .await?;
            tracing::info!(command = "archive", ?report, "Archival finished");
            Ok(report)
        }
    }
}
