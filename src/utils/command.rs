// paragres/src/utils/command.rs
use async_trait::async_trait;
use std::fmt;
use std::process::Stdio;
use tokio::process::Command;
use tracing::debug;
use which::which;

use crate::errors::{AppError, Result};

/// Environment variable libpq reads the password from.
pub const PGPASSWORD: &str = "PGPASSWORD";

/// One external program invocation: argv plus the password to inject for that child only.
#[derive(Clone, PartialEq, Eq)]
pub struct ExternalCommand {
    pub program: String,
    pub args: Vec<String>,
    pub password: Option<String>,
}

impl ExternalCommand {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            password: None,
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Empty passwords are not exported.
    pub fn with_password(mut self, password: Option<&str>) -> Self {
        self.password = password.filter(|p| !p.is_empty()).map(str::to_string);
        self
    }

    /// Full argv, program first.
    pub fn argv(&self) -> Vec<String> {
        std::iter::once(self.program.clone())
            .chain(self.args.iter().cloned())
            .collect()
    }
}

impl fmt::Display for ExternalCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.argv().join(" "))
    }
}

impl fmt::Debug for ExternalCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExternalCommand")
            .field("program", &self.program)
            .field("args", &self.args)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Runs external commands to completion. Any nonzero exit is an error.
#[async_trait]
pub trait CommandExecutor: Send + Sync {
    /// Runs with inherited stdio so interactive prompts reach the operator.
    async fn run(&self, command: &ExternalCommand) -> Result<()>;

    /// Runs with captured stdout and returns it.
    async fn output(&self, command: &ExternalCommand) -> Result<String>;
}

/// Spawns real child processes.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessExecutor;

impl ProcessExecutor {
    fn prepare(command: &ExternalCommand) -> Result<Command> {
        let path = which(&command.program).map_err(|_| AppError::ExecutableNotFound {
            program: command.program.clone(),
        })?;

        let mut child = Command::new(path);
        child.args(&command.args);
        if let Some(password) = &command.password {
            debug!("Exporting {} for {}", PGPASSWORD, command.program);
            child.env(PGPASSWORD, password);
        }
        Ok(child)
    }
}

#[async_trait]
impl CommandExecutor for ProcessExecutor {
    async fn run(&self, command: &ExternalCommand) -> Result<()> {
        debug!("Running: {}", command);
        let status = Self::prepare(command)?.status().await?;

        if !status.success() {
            return Err(AppError::Command {
                command: command.to_string(),
                status: status.to_string(),
            });
        }
        Ok(())
    }

    async fn output(&self, command: &ExternalCommand) -> Result<String> {
        debug!("Running (captured): {}", command);
        // Only stdout is captured; prompts on stderr must reach the operator.
        let output = Self::prepare(command)?
            .stdin(Stdio::inherit())
            .stderr(Stdio::inherit())
            .output()
            .await?;

        if !output.status.success() {
            return Err(AppError::Command {
                command: command.to_string(),
                status: output.status.to_string(),
            });
        }
        Ok(String::from_utf8(output.stdout)?)
    }
}
