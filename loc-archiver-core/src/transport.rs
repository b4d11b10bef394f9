use std::path::Path;

use async_trait::async_trait;
use futures::StreamExt;
use tokio::io::AsyncWriteExt;
use tracing::{debug, error, info};

use crate::config::ArchiveConfig;
use crate::contract::{ArtifactTransport, Manifest};
use crate::error::{ArchiveError, Result};

/// Shared `reqwest` client carrying the configured user agent and timeout.
pub fn http_client(config: &ArchiveConfig) -> Result<reqwest::Client> {
    let client = reqwest::Client::builder()
        .user_agent(config.user_agent.clone())
        .timeout(config.request_timeout())
        .build()?;
    Ok(client)
}

/// Manifest fetch and artifact download over HTTP.
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new(config: &ArchiveConfig) -> Result<Self> {
        Ok(Self::with_client(http_client(config)?))
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ArtifactTransport for HttpTransport {
    async fn fetch_manifest(&self, url: &str) -> Result<Manifest> {
        let failed = |reason: String| ArchiveError::ManifestFailed {
            url: url.to_string(),
            reason,
        };

        info!(url, "Fetching sequence manifest");
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| failed(e.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            error!(url, status = %status, "Manifest request returned error status");
            return Err(failed(format!("status {status}")));
        }
        let manifest = response
            .json::<Manifest>()
            .await
            .map_err(|e| failed(e.to_string()))?;
        debug!(
            url,
            sequences = manifest.sequences.len(),
            "Decoded sequence manifest"
        );
        Ok(manifest)
    }

    async fn download(&self, url: &str, dest: &Path) -> Result<u64> {
        let failed = |reason: String| ArchiveError::DownloadFailed {
            url: url.to_string(),
            reason,
        };

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| failed(e.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            error!(url, status = %status, "Artifact request returned error status");
            return Err(failed(format!("status {status}")));
        }

        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| failed(e.to_string()))?;
        }
        let mut file = tokio::fs::File::create(dest)
            .await
            .map_err(|e| failed(format!("create {}: {e}", dest.display())))?;

        let mut written: u64 = 0;
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| failed(e.to_string()))?;
            file.write_all(&chunk)
                .await
                .map_err(|e| failed(format!("write {}: {e}", dest.display())))?;
            written += chunk.len() as u64;
        }
        file.flush()
            .await
            .map_err(|e| failed(format!("flush {}: {e}", dest.display())))?;

        info!(url, path = %dest.display(), bytes = written, "Downloaded artifact");
        Ok(written)
    }
}
