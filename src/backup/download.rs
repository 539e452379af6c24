// paragres/src/backup/download.rs
use async_trait::async_trait;
use reqwest::Client;
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;
use tracing::info;

use crate::errors::{AppError, Result};

/// Fetches a URL into a local file.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Writes the body byte-for-byte to `destination` and returns the byte count.
    async fn fetch_to_file(&self, url: &str, destination: &Path) -> Result<u64>;
}

/// Plain HTTP(S) GET. No retries: any failure ends the run.
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("paragres/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch_to_file(&self, url: &str, destination: &Path) -> Result<u64> {
        info!("Downloading to file '{}' from URL '{}'", destination.display(), url);

        let mut response = self.client.get(url).send().await?;
        if !response.status().is_success() {
            return Err(AppError::Download {
                url: url.to_string(),
                message: format!("server responded with status {}", response.status()),
            });
        }

        // Staged next to the target so a failed transfer never leaves a partial dump behind.
        let parent = destination
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        let mut staged = NamedTempFile::new_in(parent)?;

        let mut total_bytes_downloaded: u64 = 0;
        while let Some(chunk) = response.chunk().await? {
            staged.write_all(&chunk)?;
            total_bytes_downloaded += chunk.len() as u64;
        }
        staged.flush()?;
        staged.persist(destination).map_err(|e| AppError::Io(e.error))?;

        info!("File downloaded ({} bytes)", total_bytes_downloaded);
        Ok(total_bytes_downloaded)
    }
}
