//! Connection settings resolution.
//!
//! Reads the `default` profile of a Django-style `DATABASES` setting, either from
//! a settings file given by path or from the module named in
//! `DJANGO_SETTINGS_MODULE`. Files ending in `.json` hold the same structure as
//! a plain JSON document.

pub(crate) mod literal;

use std::env::{self, VarError};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::errors::{AppError, Result};
use literal::{AssignmentError, Literal};

pub const SETTINGS_MODULE_VAR: &str = "DJANGO_SETTINGS_MODULE";

pub const SETTINGS_FORMAT: &str = r#"
    DATABASES = {
        'default': {
            'ENGINE': 'django.db.backends.postgresql_psycopg2',
            'NAME': '<db_name>',
            'USER': '<username>',
            'PASSWORD': '<password>',
            'HOST': '<host>',
            'PORT': '<port>',
        }
    }"#;

const DATABASES: &str = "DATABASES";
const DEFAULT_PROFILE: &str = "default";

/// Where to read connection settings from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SettingsRef {
    File(PathBuf),
    /// Indirection through the `DJANGO_SETTINGS_MODULE` environment variable.
    SettingsModule,
}

impl SettingsRef {
    pub fn parse(reference: &str) -> Self {
        if reference == SETTINGS_MODULE_VAR {
            SettingsRef::SettingsModule
        } else {
            SettingsRef::File(PathBuf::from(reference))
        }
    }

    /// Resolves the reference to a concrete settings file path.
    pub fn resolve_path(&self) -> Result<PathBuf> {
        match self {
            SettingsRef::File(path) => Ok(path.clone()),
            SettingsRef::SettingsModule => settings_module_path(env::var(SETTINGS_MODULE_VAR)),
        }
    }
}

fn settings_module_path(value: std::result::Result<String, VarError>) -> Result<PathBuf> {
    let module = value.map_err(|source| AppError::EnvVar {
        name: SETTINGS_MODULE_VAR,
        source,
    })?;
    info!("Getting settings file from {}={}", SETTINGS_MODULE_VAR, module);
    module_to_path(&module)
}

/// `proj.settings.local` -> `proj/settings/local.py`
pub fn module_to_path(module: &str) -> Result<PathBuf> {
    let pieces: Vec<&str> = module.trim().split('.').collect();
    if pieces.iter().any(|p| p.is_empty()) {
        return Err(AppError::Config(format!(
            "{}='{}' is not a dotted module path",
            SETTINGS_MODULE_VAR, module
        )));
    }

    let (last, parents) = pieces.split_last().ok_or_else(|| {
        AppError::Config(format!("{} is empty", SETTINGS_MODULE_VAR))
    })?;
    let mut path: PathBuf = parents.iter().collect();
    path.push(format!("{}.py", last));
    Ok(path)
}

/// Flat connection settings of one profile. Any key may be absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConnectionParameters {
    pub name: Option<String>,
    pub user: Option<String>,
    pub password: Option<String>,
    pub host: Option<String>,
    pub port: Option<String>,
}

impl ConnectionParameters {
    fn from_profile(profile: &Literal) -> Self {
        let field = |key: &str| profile.get(key).and_then(Literal::as_setting);
        Self {
            name: field("NAME"),
            user: field("USER"),
            password: field("PASSWORD"),
            host: field("HOST"),
            port: field("PORT"),
        }
    }
}

/// Reads the settings source and extracts its `default` profile.
pub fn resolve_settings(reference: &SettingsRef) -> Result<ConnectionParameters> {
    let path = reference.resolve_path()?;
    info!("Parsing settings from settings file '{}'", path.display());

    let source = fs::read_to_string(&path)?;
    parse_settings_source(&path, &source)
}

pub fn parse_settings_source(path: &Path, source: &str) -> Result<ConnectionParameters> {
    let databases = if path.extension().is_some_and(|ext| ext == "json") {
        json_databases(path, source)?
    } else {
        top_level_assignment_for(path, source)?
    };

    let databases = databases
        .filter(Literal::is_dict)
        .ok_or_else(|| missing_key(DATABASES))?;
    let profile = databases
        .get(DEFAULT_PROFILE)
        .filter(|p| p.is_dict())
        .ok_or_else(|| missing_key(DEFAULT_PROFILE))?;

    Ok(ConnectionParameters::from_profile(profile))
}

fn top_level_assignment_for(path: &Path, source: &str) -> Result<Option<Literal>> {
    literal::top_level_assignment(source, DATABASES).map_err(|e| match e {
        AssignmentError::Duplicate(count) => AppError::DuplicateSettings {
            path: path.to_path_buf(),
            count,
        },
        AssignmentError::Syntax(message) => AppError::SettingsSyntax {
            path: path.to_path_buf(),
            message,
        },
    })
}

fn json_databases(path: &Path, source: &str) -> Result<Option<Literal>> {
    let document: serde_json::Value =
        serde_json::from_str(source).map_err(|e| AppError::SettingsSyntax {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
    Ok(document.get(DATABASES).map(Literal::from_json))
}

fn missing_key(key: &str) -> AppError {
    AppError::Settings {
        missing_key: key.to_string(),
        expected: SETTINGS_FORMAT,
    }
}
