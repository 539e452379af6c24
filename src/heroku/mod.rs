//! Heroku CLI command shapes.
//!
//! Two vocabularies are supported: the current `pg:backups` commands and the
//! deprecated `pgbackups` add-on, selected with `--use-pgbackups`.

use tracing::{info, warn};

use crate::errors::{AppError, Result};
use crate::utils::command::{CommandExecutor, ExternalCommand};

pub const HEROKU_BIN: &str = "heroku";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HerokuCli {
    pub binary: String,
    pub use_pgbackups: bool,
}

impl HerokuCli {
    pub fn new(use_pgbackups: bool) -> Self {
        Self {
            binary: HEROKU_BIN.to_string(),
            use_pgbackups,
        }
    }

    fn command(&self) -> ExternalCommand {
        ExternalCommand::new(self.binary.clone())
    }

    pub fn capture_command(&self, app: &str) -> ExternalCommand {
        if self.use_pgbackups {
            self.command()
                .arg("pgbackups:capture")
                .arg(format!("--app={}", app))
                .arg("--expire")
        } else {
            self.command()
                .arg("pg:backups:capture")
                .arg(format!("--app={}", app))
        }
    }

    pub fn backup_url_command(&self, app: &str) -> ExternalCommand {
        let subcommand = if self.use_pgbackups {
            "pgbackups:url"
        } else {
            "pg:backups:url"
        };
        self.command().arg(subcommand).arg(format!("--app={}", app))
    }

    pub fn reset_command(&self, app: &str) -> ExternalCommand {
        self.command()
            .arg("pg:reset")
            .arg(format!("--app={}", app))
            .arg("DATABASE_URL")
    }

    pub fn restore_command(&self, app: &str, url: &str) -> ExternalCommand {
        if self.use_pgbackups {
            self.command()
                .arg("pgbackups:restore")
                .arg(format!("--app={}", app))
                .args(["DATABASE_URL", "--confirm", app, url])
        } else {
            self.command()
                .arg("pg:backups:restore")
                .arg(url)
                .arg(format!("--app={}", app))
                .args(["DATABASE", "--confirm", app])
        }
    }

    pub fn push_command(&self, source_name: &str, app: &str) -> ExternalCommand {
        self.command()
            .arg("pg:push")
            .arg(source_name)
            .arg("DATABASE_URL")
            .arg(format!("--app={}", app))
    }

    pub async fn capture(&self, executor: &dyn CommandExecutor, app: &str) -> Result<()> {
        info!("Capturing database backup for app '{}'", app);
        executor.run(&self.capture_command(app)).await
    }

    /// Asks Heroku for the download URL of the app's latest backup.
    pub async fn backup_url(&self, executor: &dyn CommandExecutor, app: &str) -> Result<String> {
        info!("Getting backup url for Heroku app '{}'", app);
        let url = executor
            .output(&self.backup_url_command(app))
            .await?
            .trim()
            .to_string();

        if url.is_empty() {
            return Err(AppError::InvalidInput(format!(
                "Heroku returned no backup URL for app '{}'",
                app
            )));
        }
        Ok(url)
    }

    /// Destructive: wipes the app's database with no undo.
    pub async fn reset(&self, executor: &dyn CommandExecutor, app: &str) -> Result<()> {
        info!("Resetting database for app '{}'", app);
        executor.run(&self.reset_command(app)).await
    }

    pub async fn restore(&self, executor: &dyn CommandExecutor, app: &str, url: &str) -> Result<()> {
        info!("Restoring from URL '{}'", url);
        executor.run(&self.restore_command(app, url)).await
    }

    /// `pg:push` does its own authentication; resolved settings are not forwarded.
    pub async fn push(&self, executor: &dyn CommandExecutor, source_name: &str, app: &str) -> Result<()> {
        info!("Pushing data from database '{}'", source_name);
        warn!(
            "Any postgres authentication settings you passed to paragres will be ignored. \
             If desired, you can export PG* variables. You will be prompted for your psql password."
        );
        executor.run(&self.push_command(source_name, app)).await
    }
}
