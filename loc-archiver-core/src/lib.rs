#![doc = "loc-archiver-core: core pipeline for loc-archiver."]

//! This crate holds every piece of the archival pipeline: collection traversal, sequence
//! resolution, item extraction, artifact selection and the archival ledger, together with
//! the collaborator contracts they depend on and the HTTP-backed implementations of them.
//! Command-line parsing and process wiring live in the `loc-archiver` crate.
//!
//! # Usage
//! Build an [`archive::ArchiveOptions`], pick collaborators (for example
//! [`fetch::HttpPageFetcher`], [`transport::HttpTransport`], [`ledger::XlsxTableWriter`])
//! and call [`archive::archive_collection`].

pub mod archive;
pub mod collection;
pub mod config;
pub mod contract;
pub mod error;
pub mod extract;
pub mod fetch;
pub mod ledger;
pub mod progress;
pub mod select;
pub mod sequence;
pub mod transport;
pub mod traversal;

pub use archive::{archive_collection, ArchiveOptions, ArchiveOutcome, ArchiveReport};
pub use error::{ArchiveError, Result};
