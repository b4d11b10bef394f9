use clap::Parser;
use loc_archiver::cli::{run, Cli};
use loc_archiver::signal::wait_for_signal;
use loc_archiver_core::archive::ArchiveOutcome;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

const EXIT_INTERRUPTED: u8 = 130;

#[tokio::main]
async fn main() -> ExitCode {
    // Load environment
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    match run(cli, wait_for_signal()).await {
        Ok(report) => match report.outcome {
            ArchiveOutcome::Completed => {
                if report.ledger.errors > 0 {
                    println!(
                        "Archived {} items with {} errors; see the Errors sheet in {}",
                        report.ledger.records,
                        report.ledger.errors,
                        report.ledger.path.display()
                    );
                } else {
                    println!(
                        "Archived {} items into {}",
                        report.ledger.records,
                        report.ledger.path.display()
                    );
                }
                tracing::info!("CLI completed successfully");
                ExitCode::SUCCESS
            }
            ArchiveOutcome::Interrupted => {
                eprintln!(
                    "Interrupted; partial ledger saved to {}",
                    report.ledger.path.display()
                );
                tracing::warn!("CLI interrupted");
                ExitCode::from(EXIT_INTERRUPTED)
            }
        },
        Err(e) => {
            tracing::error!(error = %e, "CLI exited with error");
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}
