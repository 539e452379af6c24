use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Missing key or value for: {missing_key}\nSettings must be of the form: {expected}")]
    Settings {
        missing_key: String,
        expected: &'static str,
    },

    #[error("Could not read DATABASES from settings file {}: {message}", path.display())]
    SettingsSyntax { path: PathBuf, message: String },

    #[error("Settings file {} assigns DATABASES {count} times at top level; expected exactly one", path.display())]
    DuplicateSettings { path: PathBuf, count: usize },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Environment variable error: {name}: {source}")]
    EnvVar {
        name: &'static str,
        #[source]
        source: std::env::VarError,
    },

    #[error("URL parsing error: {0}")]
    UrlParse(#[from] url::ParseError),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Download from {url} failed: {message}")]
    Download { url: String, message: String },

    #[error("{program} executable not found in PATH. Please ensure it is installed and in your PATH.")]
    ExecutableNotFound { program: String },

    #[error("Command `{command}` failed with status {status}")]
    Command {
        command: String,
        status: String,
    },

    #[error("UTF-8 conversion error: {0}")]
    Utf8Error(#[from] std::string::FromUtf8Error),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

pub type Result<T> = std::result::Result<T, AppError>;
