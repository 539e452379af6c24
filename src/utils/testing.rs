// Test doubles for the executor and fetcher seams.
use async_trait::async_trait;
use std::collections::VecDeque;
use std::path::Path;
use std::sync::Mutex;

use crate::backup::download::Fetcher;
use crate::errors::{AppError, Result};
use crate::utils::command::{CommandExecutor, ExternalCommand};

/// A Django settings module with every connection key set.
pub const SETTINGS_PY: &str = r#"
import os

BASE_DIR = os.path.dirname(os.path.dirname(__file__))
SECRET_KEY = 'not-a-secret'

DATABASES = {
    'default': {
        'ENGINE': 'django.db.backends.postgresql_psycopg2',
        'NAME': 'dbname',
        'USER': 'username',
        'PASSWORD': 'password',
        'HOST': 'host',
        'PORT': 'port',
    }
}

INSTALLED_APPS = (
    'django.contrib.admin',
)
"#;

/// Records every command; fails the first one whose argv contains `fail_on`.
#[derive(Default)]
pub struct RecordingExecutor {
    pub calls: Mutex<Vec<ExternalCommand>>,
    outputs: Mutex<VecDeque<String>>,
    fail_on: Option<String>,
}

impl RecordingExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_output(self, output: &str) -> Self {
        self.outputs
            .lock()
            .expect("outputs lock")
            .push_back(output.to_string());
        self
    }

    pub fn failing_on(mut self, needle: &str) -> Self {
        self.fail_on = Some(needle.to_string());
        self
    }

    pub fn argvs(&self) -> Vec<Vec<String>> {
        self.calls
            .lock()
            .expect("calls lock")
            .iter()
            .map(ExternalCommand::argv)
            .collect()
    }

    pub fn commands(&self) -> Vec<ExternalCommand> {
        self.calls.lock().expect("calls lock").clone()
    }

    fn record(&self, command: &ExternalCommand) -> Result<()> {
        self.calls.lock().expect("calls lock").push(command.clone());
        match &self.fail_on {
            Some(needle) if command.argv().iter().any(|a| a == needle) => Err(AppError::Command {
                command: command.to_string(),
                status: "exit status: 1".to_string(),
            }),
            _ => Ok(()),
        }
    }
}

#[async_trait]
impl CommandExecutor for RecordingExecutor {
    async fn run(&self, command: &ExternalCommand) -> Result<()> {
        self.record(command)
    }

    async fn output(&self, command: &ExternalCommand) -> Result<String> {
        self.record(command)?;
        Ok(self
            .outputs
            .lock()
            .expect("outputs lock")
            .pop_front()
            .unwrap_or_default())
    }
}

/// Writes a fixed body for every URL, or fails every fetch.
pub struct FakeFetcher {
    pub body: Vec<u8>,
    pub fail: bool,
    pub requested: Mutex<Vec<String>>,
}

impl FakeFetcher {
    pub fn serving(body: &[u8]) -> Self {
        Self {
            body: body.to_vec(),
            fail: false,
            requested: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            body: Vec::new(),
            fail: true,
            requested: Mutex::new(Vec::new()),
        }
    }

    pub fn urls(&self) -> Vec<String> {
        self.requested.lock().expect("requested lock").clone()
    }
}

#[async_trait]
impl Fetcher for FakeFetcher {
    async fn fetch_to_file(&self, url: &str, destination: &Path) -> Result<u64> {
        self.requested
            .lock()
            .expect("requested lock")
            .push(url.to_string());
        if self.fail {
            return Err(AppError::Download {
                url: url.to_string(),
                message: "connection refused".to_string(),
            });
        }
        std::fs::write(destination, &self.body)?;
        Ok(self.body.len() as u64)
    }
}
