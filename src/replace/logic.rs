// paragres/src/replace/logic.rs
use std::path::Path;
use tracing::{debug, info};

use crate::backup::archive;
use crate::backup::download::Fetcher;
use crate::backup::{Acquirer, ArtifactSource};
use crate::config::{Destination, ReplacementRequest, Source};
use crate::errors::{AppError, Result};
use crate::heroku::HerokuCli;
use crate::replace::endpoint::DatabaseEndpoint;
use crate::restore::db_restore;
use crate::settings;
use crate::utils::command::CommandExecutor;

/// What a Heroku destination is filled from.
enum HerokuFill<'r> {
    Restore(&'r str),
    Push(&'r str),
}

/// Drives one replacement run. Every step runs to completion before the next;
/// the first failure ends the run and nothing already done is rolled back.
pub struct Replacer<'a> {
    request: &'a ReplacementRequest,
    executor: &'a dyn CommandExecutor,
    fetcher: &'a dyn Fetcher,
    heroku: HerokuCli,
    source: DatabaseEndpoint,
    destination: DatabaseEndpoint,
}

impl<'a> Replacer<'a> {
    pub fn new(
        request: &'a ReplacementRequest,
        executor: &'a dyn CommandExecutor,
        fetcher: &'a dyn Fetcher,
    ) -> Self {
        let source_name = match &request.source {
            Source::Database { name } => name.clone(),
            _ => None,
        };
        let destination_name = match &request.destination {
            Some(Destination::Database { name }) => name.clone(),
            _ => None,
        };

        Self {
            request,
            executor,
            fetcher,
            heroku: HerokuCli::new(request.use_pgbackups),
            source: DatabaseEndpoint::named(source_name),
            destination: DatabaseEndpoint::named(destination_name),
        }
    }

    /// Replaces the destination database with the data from the requested source.
    pub async fn run(mut self) -> Result<()> {
        info!("Beginning database replacement process.");

        self.resolve_settings()?;
        self.check_endpoints()?;

        if self.request.capture {
            let app = self.source_app().ok_or_else(|| {
                AppError::Config("Heroku backup capture requires a source Heroku app (-s)".to_string())
            })?;
            self.heroku.capture(self.executor, app).await?;
        }

        match &self.request.destination {
            Some(Destination::App(app)) => {
                let file_url = self.file_url().await?;
                self.replace_heroku_db(app, file_url.as_deref()).await?;
            }
            Some(Destination::Database { .. }) => {
                let file_url = self.file_url().await?;
                self.replace_postgres_db(file_url.as_deref()).await?;
            }
            None => info!("No destination given; backup captured only."),
        }

        info!("Done.");
        info!("Don't forget to update the Django Site entry if necessary!");
        Ok(())
    }

    fn resolve_settings(&mut self) -> Result<()> {
        if let Some(reference) = &self.request.source_settings {
            let params = settings::resolve_settings(reference)?;
            self.source.initialize(&params, "source");
        }
        if let Some(reference) = &self.request.destination_settings {
            let params = settings::resolve_settings(reference)?;
            self.destination.initialize(&params, "destination");
        }
        Ok(())
    }

    // Database endpoints need a name from the flags or their settings before anything runs.
    fn check_endpoints(&self) -> Result<()> {
        if matches!(self.request.source, Source::Database { .. }) && self.source.name().is_none() {
            return Err(AppError::Config(
                "A postgres source requires either a database name (-b) or a settings file containing one (-o)"
                    .to_string(),
            ));
        }
        if matches!(self.request.destination, Some(Destination::Database { .. }))
            && self.destination.name().is_none()
        {
            return Err(AppError::Config(
                "A postgres destination requires either a database name (-n) or a settings file containing one (-t)"
                    .to_string(),
            ));
        }
        Ok(())
    }

    fn source_app(&self) -> Option<&'a str> {
        match &self.request.source {
            Source::App(app) => Some(app.as_str()),
            _ => None,
        }
    }

    /// The backup URL to restore from: the source app's latest backup, or the given URL.
    async fn file_url(&self) -> Result<Option<String>> {
        match &self.request.source {
            Source::App(app) => {
                info!("Sourcing data from backup for Heroku app '{}'", app);
                Ok(Some(self.heroku.backup_url(self.executor, app).await?))
            }
            Source::Url(url) => Ok(Some(url.clone())),
            _ => Ok(None),
        }
    }

    async fn replace_heroku_db(&self, app: &str, file_url: Option<&str>) -> Result<()> {
        info!("Replacing database for Heroku app '{}'", app);

        // Decided before the reset, which cannot be undone.
        let fill = match (file_url, self.source.name()) {
            (Some(url), _) => HerokuFill::Restore(url),
            (None, Some(name)) => HerokuFill::Push(name),
            (None, None) => {
                return Err(AppError::Config(
                    "A Heroku app destination requires a single source, one of url (-u), \
                     Heroku app (-s), db name (-b) or db settings (-o)"
                        .to_string(),
                ));
            }
        };

        self.heroku.reset(self.executor, app).await?;

        match fill {
            HerokuFill::Restore(url) => self.heroku.restore(self.executor, app, url).await,
            HerokuFill::Push(name) => self.heroku.push(self.executor, name, app).await,
        }
    }

    async fn replace_postgres_db(&self, file_url: Option<&str>) -> Result<()> {
        info!("Replacing postgres database");

        let acquirer = Acquirer {
            executor: self.executor,
            fetcher: self.fetcher,
            work_dir: self.request.work_dir.as_deref(),
        };
        let artifact_source = match (file_url, &self.request.source) {
            (Some(url), _) => ArtifactSource::Url {
                url,
                app: self.source_app(),
            },
            (None, Source::Database { .. }) => ArtifactSource::Database(&self.source),
            (None, Source::File(path)) => ArtifactSource::File(path),
            (None, other) => {
                return Err(AppError::Config(format!(
                    "No dump can be produced from source {:?}",
                    other
                )));
            }
        };
        let source_file = acquirer.acquire(artifact_source).await?;

        db_restore::drop_database(self.executor, &self.destination).await?;
        db_restore::create_database(self.executor, &self.destination).await?;

        let source_file = archive::decompress_if_necessary(self.executor, &source_file).await?;
        self.restore(&source_file).await
    }

    async fn restore(&self, source_file: &Path) -> Result<()> {
        debug!("Restoring {} with {} connection argument(s)", source_file.display(), self.destination.args.len());
        db_restore::restore_database(self.executor, &self.destination, source_file).await
    }
}
