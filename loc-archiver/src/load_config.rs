/// `load_config` module: reads the optional YAML run configuration of the CLI.
///
/// This is the only place where user-supplied YAML is parsed. Every key is optional: an
/// empty file yields the built-in defaults of [`ArchiveConfig`].
///
/// ```yaml
/// dest: ./archives
/// archive:
///   page_size: 100
///   pacing_ms: 1500
///   recognize_pdf: true
///   locators:
///     item_title: "#item-title + ul"
/// ```
///
/// # Errors
/// Unreadable or malformed files fail with an `anyhow::Error` naming the file, surfaced at
/// the CLI boundary.
use anyhow::Result;
use loc_archiver_core::config::ArchiveConfig;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{error, info};

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CliConfig {
    /// Destination directory; the collection folder is created inside it.
    pub dest: Option<PathBuf>,
    pub archive: ArchiveConfig,
}

/// Loads the YAML config at `path`.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<CliConfig> {
    let path_ref = path.as_ref();
    info!(config_path = ?path_ref, "Loading configuration from file");

    let config_content = match fs::read_to_string(path_ref) {
        Ok(content) => content,
        Err(e) => {
            error!(error = ?e, config_path = ?path_ref, "Failed to read config file");
            return Err(anyhow::anyhow!(
                "Failed to read config file {:?}: {}",
                path_ref,
                e
            ));
        }
    };

    if config_content.trim().is_empty() {
        info!(config_path = ?path_ref, "Config file is empty, using defaults");
        return Ok(CliConfig::default());
    }

    let config: CliConfig = match serde_yaml::from_str(&config_content) {
        Ok(conf) => conf,
        Err(e) => {
            error!(error = ?e, config_path = ?path_ref, "Failed to parse config YAML");
            return Err(anyhow::anyhow!("Failed to parse config YAML: {e}"));
        }
    };
    info!(config_path = ?path_ref, "Parsed config YAML successfully");
    config.archive.trace_loaded();

    Ok(config)
}
