//! CLI definition and parsing.
//!
//! Flags only describe the request; `config::ReplacementRequest::from_args`
//! decides whether the combination is valid.

use clap::{CommandFactory, Parser, ValueHint};
use std::path::PathBuf;

const ABOUT: &str = "Copy a PostgreSQL database from one location to another.";

const LONG_ABOUT: &str = "Copy a PostgreSQL database from one location to another.

Any Heroku apps must have the Heroku Postgres and PG Backups add-ons.
Specify a Heroku app destination with -d or omit to use postgres directly.

A single source is required, one of (-u, -s, -b, -o) for a Heroku destination
or one of (-f, -u, -s, -b, -o) for a postgres destination.
You may specify that a new Heroku backup be captured (-c), otherwise the most recent backup will be used.

A postgres source requires either a settings file (-o) or a database name (-b).
A postgres destination also requires either a settings file (-t) or a database name (-n).
If authentication parameters are not supplied in a settings file, standard PostgreSQL authentication will apply.";

#[derive(Parser, Debug, Clone, Default)]
#[command(name = "paragres", version, about = ABOUT, long_about = LONG_ABOUT)]
pub struct Args {
    /// PostgreSQL dump file to use as a data source
    #[arg(short = 'f', long, value_hint = ValueHint::FilePath)]
    pub file: Option<PathBuf>,

    /// Public URL from which to pull db file
    #[arg(short = 'u', long, value_hint = ValueHint::Url)]
    pub url: Option<String>,

    /// Heroku app from which to pull db
    #[arg(short = 's', long)]
    pub source_app: Option<String>,

    /// Capture a new Heroku backup
    #[arg(short = 'c', long)]
    pub capture: bool,

    /// Django-style settings file with connection information for the source database
    /// (or 'DJANGO_SETTINGS_MODULE' to use that environment variable's value)
    #[arg(short = 'o', long, value_hint = ValueHint::FilePath)]
    pub source_settings: Option<String>,

    /// Source database name (overrides value in source settings if both are specified)
    #[arg(short = 'b', long)]
    pub source_dbname: Option<String>,

    /// Heroku app for which to replace db
    #[arg(short = 'd', long)]
    pub destination_app: Option<String>,

    /// Django-style settings file with connection information for the destination database
    /// (or 'DJANGO_SETTINGS_MODULE' to use that environment variable's value)
    #[arg(short = 't', long, value_hint = ValueHint::FilePath)]
    pub settings: Option<String>,

    /// Destination database name (overrides value in settings if both are specified)
    #[arg(short = 'n', long)]
    pub dbname: Option<String>,

    /// Verbosity level: 0=minimal output, 1=normal output, 2=debug output
    #[arg(short = 'v', long, default_value_t = 1)]
    pub verbosity: u8,

    /// Use the deprecated pgbackups addon rather than Heroku pg:backups
    #[arg(long)]
    pub use_pgbackups: bool,

    /// Directory for downloaded and dumped files (default: current directory)
    #[arg(long, value_hint = ValueHint::DirPath)]
    pub work_dir: Option<PathBuf>,
}

pub fn parse() -> Args {
    Args::parse()
}

/// Full help text, printed before request validation errors.
pub fn render_help() -> String {
    Args::command().render_help().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_flags() {
        let args = Args::try_parse_from([
            "paragres", "-c", "-s", "app1", "-d", "app2", "-v", "2", "--use-pgbackups",
        ])
        .unwrap();

        assert!(args.capture);
        assert_eq!(args.source_app.as_deref(), Some("app1"));
        assert_eq!(args.destination_app.as_deref(), Some("app2"));
        assert_eq!(args.verbosity, 2);
        assert!(args.use_pgbackups);
    }

    #[test]
    fn test_defaults() {
        let args = Args::try_parse_from(["paragres"]).unwrap();
        assert_eq!(args.verbosity, 1);
        assert!(!args.capture);
        assert!(args.file.is_none());
        assert!(args.work_dir.is_none());
    }

    #[test]
    fn test_help_mentions_sources() {
        assert!(render_help().contains("--source-settings"));
    }

    #[test]
    fn test_cli_definition_is_consistent() {
        Args::command().debug_assert();
    }
}
