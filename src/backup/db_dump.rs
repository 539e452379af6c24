// paragres/src/backup/db_dump.rs
use std::path::Path;
use tracing::info;

use crate::errors::{AppError, Result};
use crate::replace::endpoint::DatabaseEndpoint;
use crate::utils::command::{CommandExecutor, ExternalCommand};

/// `pg_dump -Fc --no-acl --no-owner --dbname=<name> --file=<file> [args...]`
pub fn dump_command(source: &DatabaseEndpoint, name: &str, file: &Path) -> ExternalCommand {
    ExternalCommand::new("pg_dump")
        .args(["-Fc", "--no-acl", "--no-owner"])
        .arg(format!("--dbname={}", name))
        .arg(format!("--file={}", file.display()))
        .args(source.args.iter().cloned())
        .with_password(source.password())
}

/// Dumps the source database in custom format to `file`.
pub async fn dump_database(
    executor: &dyn CommandExecutor,
    source: &DatabaseEndpoint,
    file: &Path,
) -> Result<()> {
    let name = source
        .name()
        .ok_or_else(|| AppError::Config("Source database name is not set".to_string()))?;

    info!("Dumping postgres database '{}' to file '{}'", name, file.display());
    executor.run(&dump_command(source, name, file)).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::testing::RecordingExecutor;

    #[tokio::test]
    async fn test_dump_database_no_extra_args() -> anyhow::Result<()> {
        let executor = RecordingExecutor::new();
        let source = DatabaseEndpoint::named(Some("sourcedb".into()));

        dump_database(&executor, &source, Path::new("sourcedb-backup-2015-01-25-1734.sql")).await?;

        let commands = executor.commands();
        assert_eq!(
            commands[0].argv(),
            vec![
                "pg_dump",
                "-Fc",
                "--no-acl",
                "--no-owner",
                "--dbname=sourcedb",
                "--file=sourcedb-backup-2015-01-25-1734.sql"
            ]
        );
        assert_eq!(commands[0].password, None);
        Ok(())
    }

    #[tokio::test]
    async fn test_dump_database_with_extra_args() -> anyhow::Result<()> {
        let executor = RecordingExecutor::new();
        let source = DatabaseEndpoint {
            name: Some("sourcedb".into()),
            args: vec!["--user=username".into()],
            password: Some("password".into()),
        };

        dump_database(&executor, &source, Path::new("out.sql")).await?;

        let commands = executor.commands();
        assert_eq!(
            commands[0].argv(),
            vec!["pg_dump", "-Fc", "--no-acl", "--no-owner", "--dbname=sourcedb", "--file=out.sql", "--user=username"]
        );
        assert_eq!(commands[0].password.as_deref(), Some("password"));
        Ok(())
    }

    #[tokio::test]
    async fn test_dump_without_name_fails_fast() {
        let executor = RecordingExecutor::new();

        let result = dump_database(&executor, &DatabaseEndpoint::default(), Path::new("x.sql")).await;

        assert!(matches!(result, Err(AppError::Config(_))));
        assert!(executor.argvs().is_empty());
    }
}
