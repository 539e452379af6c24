// paragres/src/config/mod.rs
use std::path::PathBuf;

use crate::cli::Args;
use crate::errors::{AppError, Result};
use crate::settings::SettingsRef;

const CAPTURE_NEEDS_APP: &str = "Heroku backup capture requires a source Heroku app (-s)";
const POSTGRES_NEEDS_NAME: &str =
    "A postgres destination requires either a database name (-n) or a settings file containing one (-t)";
const HEROKU_SINGLE_SOURCE: &str = "A Heroku app destination requires a single source, one of url (-u), \
     Heroku app (-s), db name (-b) or db settings (-o)";
const POSTGRES_SINGLE_SOURCE: &str = "A postgres destination requires a single source, one of file (-f), \
     url (-u), Heroku app (-s), db name (-b) or db settings (-o)";

/// Where the data comes from. Exactly one per request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    File(PathBuf),
    Url(String),
    /// A Heroku app's latest (or freshly captured) backup.
    App(String),
    /// A Postgres database; the name may instead come from the source settings.
    Database { name: Option<String> },
}

/// Where the data goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Destination {
    /// A Postgres database; the name may instead come from the destination settings.
    Database { name: Option<String> },
    App(String),
}

impl Destination {
    pub fn is_app(&self) -> bool {
        matches!(self, Destination::App(_))
    }
}

/// A validated, immutable description of one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplacementRequest {
    pub source: Source,
    /// `None` only for a capture-only run.
    pub destination: Option<Destination>,
    pub capture: bool,
    pub use_pgbackups: bool,
    pub source_settings: Option<SettingsRef>,
    pub destination_settings: Option<SettingsRef>,
    pub verbosity: u8,
    pub work_dir: Option<PathBuf>,
}

fn present(value: &Option<String>) -> Option<String> {
    value.as_ref().filter(|v| !v.trim().is_empty()).cloned()
}

impl ReplacementRequest {
    /// Checks flag combinations and builds the request.
    ///
    /// A Heroku destination (`-d`) takes precedence over `-n`/`-t`, which are then ignored.
    pub fn from_args(args: &Args) -> Result<Self> {
        let source_app = present(&args.source_app);
        let destination_app = present(&args.destination_app);
        let dbname = present(&args.dbname);
        let destination_settings = present(&args.settings);
        let source_dbname = present(&args.source_dbname);
        let source_settings = present(&args.source_settings);
        let url = present(&args.url);
        let file = args.file.clone().filter(|f| !f.as_os_str().is_empty());

        if args.capture && source_app.is_none() {
            return Err(AppError::Config(CAPTURE_NEEDS_APP.to_string()));
        }

        let destination = match (&destination_app, &dbname, &destination_settings) {
            (Some(app), _, _) => Some(Destination::App(app.clone())),
            (None, Some(_), _) | (None, None, Some(_)) => Some(Destination::Database {
                name: dbname.clone(),
            }),
            // Capturing needs no destination.
            (None, None, None) if args.capture => None,
            (None, None, None) => return Err(AppError::Config(POSTGRES_NEEDS_NAME.to_string())),
        };
        let to_heroku = destination.as_ref().is_some_and(Destination::is_app);
        let single_source_error = || {
            let message = if to_heroku {
                HEROKU_SINGLE_SOURCE
            } else {
                POSTGRES_SINGLE_SOURCE
            };
            AppError::Config(message.to_string())
        };

        let mut sources = Vec::new();
        if let Some(file) = file {
            if to_heroku {
                return Err(single_source_error());
            }
            sources.push(Source::File(file));
        }
        if let Some(url) = url {
            sources.push(Source::Url(url));
        }
        if let Some(app) = source_app {
            sources.push(Source::App(app));
        }
        if source_dbname.is_some() || source_settings.is_some() {
            sources.push(Source::Database {
                name: source_dbname,
            });
        }
        if sources.len() != 1 {
            return Err(single_source_error());
        }
        let source = sources.remove(0);

        Ok(Self {
            source,
            destination_settings: match destination {
                Some(Destination::Database { .. }) => {
                    destination_settings.as_deref().map(SettingsRef::parse)
                }
                _ => None,
            },
            destination,
            capture: args.capture,
            use_pgbackups: args.use_pgbackups,
            source_settings: source_settings.as_deref().map(SettingsRef::parse),
            verbosity: args.verbosity,
            work_dir: args.work_dir.clone(),
        })
    }

    /// `-n`/`-t` given alongside a Heroku destination.
    pub fn ignored_destination_flags(args: &Args) -> bool {
        present(&args.destination_app).is_some()
            && (present(&args.dbname).is_some() || present(&args.settings).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn request(argv: &[&str]) -> Result<ReplacementRequest> {
        let args = Args::try_parse_from(std::iter::once("paragres").chain(argv.iter().copied()))
            .expect("argv parses");
        ReplacementRequest::from_args(&args)
    }

    fn config_message(result: Result<ReplacementRequest>) -> String {
        match result {
            Err(AppError::Config(message)) => message,
            other => panic!("expected a configuration error, got {:?}", other),
        }
    }

    #[test]
    fn test_no_destination() {
        assert_eq!(config_message(request(&[])), POSTGRES_NEEDS_NAME);
    }

    #[test]
    fn test_capture_without_source_app() {
        assert_eq!(config_message(request(&["-c"])), CAPTURE_NEEDS_APP);
    }

    #[test]
    fn test_capture_only() -> anyhow::Result<()> {
        let req = request(&["-c", "-s", "app1"])?;
        assert_eq!(req.source, Source::App("app1".into()));
        assert_eq!(req.destination, None);
        assert!(req.capture);
        Ok(())
    }

    #[test]
    fn test_correct_single_source() -> anyhow::Result<()> {
        let req = request(&["-n", "destdb", "-s", "app1"])?;
        assert_eq!(req.source, Source::App("app1".into()));
        assert_eq!(
            req.destination,
            Some(Destination::Database { name: Some("destdb".into()) })
        );
        Ok(())
    }

    #[test]
    fn test_too_many_sources() {
        assert_eq!(
            config_message(request(&["-n", "destdb", "-s", "app1", "-b", "sourcedb"])),
            POSTGRES_SINGLE_SOURCE
        );
    }

    #[test]
    fn test_heroku_destination_single_source() -> anyhow::Result<()> {
        let req = request(&["-n", "destdb", "-b", "sourcedb", "-d", "app2"])?;
        assert_eq!(req.source, Source::Database { name: Some("sourcedb".into()) });
        assert_eq!(req.destination, Some(Destination::App("app2".into())));
        Ok(())
    }

    #[test]
    fn test_heroku_destination_too_many_sources() {
        assert_eq!(
            config_message(request(&["-n", "destdb", "-s", "app1", "-b", "srcedb", "-d", "app2"])),
            HEROKU_SINGLE_SOURCE
        );
    }

    #[test]
    fn test_heroku_destination_rejects_file() {
        assert_eq!(
            config_message(request(&["-f", "db.sql", "-d", "app2"])),
            HEROKU_SINGLE_SOURCE
        );
    }

    #[test]
    fn test_dbname_and_settings_are_one_source() -> anyhow::Result<()> {
        let req = request(&["-b", "sourcedb", "-o", "settings.py", "-t", "DJANGO_SETTINGS_MODULE"])?;

        assert_eq!(req.source, Source::Database { name: Some("sourcedb".into()) });
        assert_eq!(req.source_settings, Some(SettingsRef::File("settings.py".into())));
        assert_eq!(req.destination, Some(Destination::Database { name: None }));
        assert_eq!(req.destination_settings, Some(SettingsRef::SettingsModule));
        Ok(())
    }

    #[test]
    fn test_empty_values_count_as_absent() {
        assert_eq!(config_message(request(&["-n", "", "-b", "sourcedb"])), POSTGRES_NEEDS_NAME);
    }

    #[test]
    fn test_ignored_destination_flags() {
        let args = Args::try_parse_from(["paragres", "-b", "src", "-d", "app2", "-n", "destdb"]).unwrap();
        assert!(ReplacementRequest::ignored_destination_flags(&args));
    }
}
