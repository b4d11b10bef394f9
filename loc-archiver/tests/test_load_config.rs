use clap::Parser;
use loc_archiver::cli::{run, Cli, Commands};
use loc_archiver::load_config::load_config;
use loc_archiver_core::config::{ArchiveConfig, DEFAULT_BASE_URL};
use serial_test::serial;
use std::env;
use std::fs::write;
use std::path::PathBuf;
use tempfile::NamedTempFile;

#[test]
fn full_config_overrides_defaults() {
    let config_yaml = r##"
dest: ./tmp/archives
archive:
  page_size: 100
  pacing_ms: 1500
  recognize_pdf: true
  locators:
    item_title: "#title-override + ul"
"##;
    let config_file = NamedTempFile::new().expect("temp file");
    write(config_file.path(), config_yaml).unwrap();

    let config = load_config(config_file.path()).expect("Config should load");

    assert_eq!(config.dest, Some(PathBuf::from("./tmp/archives")));
    assert_eq!(config.archive.page_size, 100);
    assert_eq!(config.archive.pacing_ms, 1500);
    assert!(config.archive.recognize_pdf);
    assert_eq!(config.archive.locators.item_title, "#title-override + ul");
    // Untouched keys keep their defaults
    assert_eq!(config.archive.base_url, DEFAULT_BASE_URL);
    assert_eq!(
        config.archive.locators.item_downloads,
        ArchiveConfig::default().locators.item_downloads
    );
}

#[test]
fn empty_config_yields_defaults() {
    let config_file = NamedTempFile::new().expect("temp file");
    write(config_file.path(), "\n").unwrap();

    let config = load_config(config_file.path()).expect("Empty config should load");
    assert_eq!(config.dest, None);
    assert_eq!(config.archive, ArchiveConfig::default());
}

#[test]
fn unknown_top_level_key_is_rejected() {
    let config_file = NamedTempFile::new().expect("temp file");
    write(config_file.path(), "destination: ./out\n").unwrap();

    let err = load_config(config_file.path()).unwrap_err();
    assert!(err.to_string().contains("Failed to parse config YAML"));
}

#[test]
fn archive_arguments_parse() {
    let cli = Cli::try_parse_from([
        "loc-archiver",
        "archive",
        "https://www.loc.gov/collections/ansel-adams-manzanar/",
        "--dest",
        "/tmp/out",
        "--page-size",
        "25",
        "--pacing-ms",
        "0",
    ])
    .unwrap();

    match cli.command {
        Commands::Archive {
            collection,
            dest,
            page_size,
            pacing_ms,
            ..
        } => {
            assert_eq!(collection, "https://www.loc.gov/collections/ansel-adams-manzanar/");
            assert_eq!(dest, Some(PathBuf::from("/tmp/out")));
            assert_eq!(page_size, Some(25));
            assert_eq!(pacing_ms, Some(0));
        }
    }
}

#[tokio::test]
#[serial]
async fn config_path_is_read_from_environment() {
    env::set_var("LOC_ARCHIVER_CONFIG", "/nonexistent/from-env.yaml");
    let cli = Cli::try_parse_from(["loc-archiver", "archive", "ansel-adams-manzanar"]).unwrap();
    env::remove_var("LOC_ARCHIVER_CONFIG");

    match &cli.command {
        Commands::Archive { config, .. } => {
            assert_eq!(config, &Some(PathBuf::from("/nonexistent/from-env.yaml")));
        }
    }

    let err = run(cli, std::future::pending::<()>()).await.unwrap_err();
    assert!(err.to_string().contains("Failed to read config file"));
}
