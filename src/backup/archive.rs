// paragres/src/backup/archive.rs
use std::path::{Path, PathBuf};
use tracing::info;

use crate::errors::Result;
use crate::utils::command::{CommandExecutor, ExternalCommand};

pub const GZIP_SUFFIX: &str = ".gz";

/// The name with `.gz` stripped, or `None` when the file is not compressed.
pub fn decompressed_name(path: &Path) -> Option<PathBuf> {
    path.to_string_lossy()
        .strip_suffix(GZIP_SUFFIX)
        .map(PathBuf::from)
}

pub fn gunzip_command(path: &Path) -> ExternalCommand {
    ExternalCommand::new("gunzip")
        .arg("--force")
        .arg(path.to_string_lossy())
}

/// Decompresses `.gz` artifacts in place and returns the path to use from now on.
pub async fn decompress_if_necessary(executor: &dyn CommandExecutor, path: &Path) -> Result<PathBuf> {
    match decompressed_name(path) {
        Some(stripped) => {
            info!("Decompressing '{}'", path.display());
            executor.run(&gunzip_command(path)).await?;
            Ok(stripped)
        }
        None => Ok(path.to_path_buf()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::testing::RecordingExecutor;

    #[tokio::test]
    async fn test_not_compressed_is_passed_through() -> anyhow::Result<()> {
        let executor = RecordingExecutor::new();

        let result = decompress_if_necessary(&executor, Path::new("db.sql")).await?;

        assert_eq!(result, PathBuf::from("db.sql"));
        assert!(executor.argvs().is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_compressed_is_gunzipped_and_suffix_stripped() -> anyhow::Result<()> {
        let executor = RecordingExecutor::new();

        let result = decompress_if_necessary(&executor, Path::new("db.sql.gz")).await?;

        assert_eq!(result, PathBuf::from("db.sql"));
        assert_eq!(executor.argvs(), vec![vec!["gunzip", "--force", "db.sql.gz"]]);
        Ok(())
    }

    #[tokio::test]
    async fn test_stripped_name_is_not_decompressed_again() -> anyhow::Result<()> {
        let executor = RecordingExecutor::new();

        let once = decompress_if_necessary(&executor, Path::new("db.sql.gz")).await?;
        let twice = decompress_if_necessary(&executor, &once).await?;

        assert_eq!(twice, PathBuf::from("db.sql"));
        assert_eq!(executor.argvs().len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_failed_decompression_fails() {
        let executor = RecordingExecutor::new().failing_on("gunzip");
        assert!(decompress_if_necessary(&executor, Path::new("db.sql.gz")).await.is_err());
    }

    #[test]
    fn test_only_exact_suffix_counts() {
        assert_eq!(decompressed_name(Path::new("db.gzip")), None);
        assert_eq!(decompressed_name(Path::new("db.tar.gz")), Some(PathBuf::from("db.tar")));
    }
}
