//! Obtaining a local dump file from the requested source.

pub(crate) mod archive;
pub(crate) mod db_dump;
pub(crate) mod download;

use chrono::{DateTime, Local};
use std::path::{Path, PathBuf};
use tracing::info;
use url::Url;

use crate::errors::Result;
use crate::replace::endpoint::DatabaseEndpoint;
use crate::utils::command::CommandExecutor;
use download::Fetcher;

pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d-%H%M";

/// `<label>-backup-<YYYY-MM-DD-HHMM>.sql`
pub fn file_name_at(label: &str, now: &DateTime<Local>) -> String {
    format!("{}-backup-{}.sql", label, now.format(TIMESTAMP_FORMAT))
}

pub fn create_file_name(label: &str) -> String {
    file_name_at(label, &Local::now())
}

/// Label for a download: the URL's `host[:port]` with dots replaced by underscores.
pub fn url_label(url: &str) -> Result<String> {
    let parsed = Url::parse(url)?;
    let mut netloc = parsed.host_str().unwrap_or_default().to_string();
    if let Some(port) = parsed.port() {
        netloc.push_str(&format!(":{}", port));
    }
    Ok(netloc.replace('.', "_"))
}

/// Where the dump for a direct database destination comes from.
#[derive(Debug, Clone, Copy)]
pub enum ArtifactSource<'a> {
    /// Download; `app` names the file after the Heroku app the URL belongs to.
    Url { url: &'a str, app: Option<&'a str> },
    Database(&'a DatabaseEndpoint),
    File(&'a Path),
}

pub struct Acquirer<'a> {
    pub executor: &'a dyn CommandExecutor,
    pub fetcher: &'a dyn Fetcher,
    /// Directory for generated files; `None` writes bare names into the current directory.
    pub work_dir: Option<&'a Path>,
}

impl Acquirer<'_> {
    fn output_path(&self, label: &str) -> PathBuf {
        let name = create_file_name(label);
        match self.work_dir {
            Some(dir) => dir.join(name),
            None => PathBuf::from(name),
        }
    }

    /// Produces a local dump file path. The file is left in place after the run.
    pub async fn acquire(&self, source: ArtifactSource<'_>) -> Result<PathBuf> {
        match source {
            ArtifactSource::Url { url, app } => {
                info!("Sourcing data from online backup file '{}'", url);
                let label = match app {
                    Some(app) => app.to_string(),
                    None => url_label(url)?,
                };
                let path = self.output_path(&label);
                self.fetcher.fetch_to_file(url, &path).await?;
                Ok(path)
            }
            ArtifactSource::Database(endpoint) => {
                info!(
                    "Sourcing data from database '{}'",
                    endpoint.name().unwrap_or_default()
                );
                let label = endpoint.name().unwrap_or_default();
                let path = self.output_path(label);
                db_dump::dump_database(self.executor, endpoint, &path).await?;
                Ok(path)
            }
            ArtifactSource::File(path) => {
                info!("Sourcing data from local backup file {}", path.display());
                Ok(path.to_path_buf())
            }
        }
    }
}
