// paragres/src/restore/db_restore.rs
use std::path::Path;
use tracing::info;

use crate::errors::{AppError, Result};
use crate::replace::endpoint::DatabaseEndpoint;
use crate::utils::command::{CommandExecutor, ExternalCommand};

fn destination_name(destination: &DatabaseEndpoint) -> Result<&str> {
    destination
        .name()
        .ok_or_else(|| AppError::Config("Destination database name is not set".to_string()))
}

/// `dropdb --if-exists <name> [args...]`
pub fn drop_command(destination: &DatabaseEndpoint, name: &str) -> ExternalCommand {
    ExternalCommand::new("dropdb")
        .arg("--if-exists")
        .arg(name)
        .args(destination.args.iter().cloned())
        .with_password(destination.password())
}

/// `createdb <name> [args...] [--owner=<user>]`
pub fn create_command(destination: &DatabaseEndpoint, name: &str) -> ExternalCommand {
    let command = ExternalCommand::new("createdb")
        .arg(name)
        .args(destination.args.iter().cloned())
        .with_password(destination.password());
    match destination.user() {
        Some(user) => command.arg(format!("--owner={}", user)),
        None => command,
    }
}

/// `pg_restore --no-acl --no-owner --dbname=<name> <file> [args...]`
pub fn restore_command(destination: &DatabaseEndpoint, name: &str, file: &Path) -> ExternalCommand {
    ExternalCommand::new("pg_restore")
        .args(["--no-acl", "--no-owner"])
        .arg(format!("--dbname={}", name))
        .arg(file.to_string_lossy())
        .args(destination.args.iter().cloned())
        .with_password(destination.password())
}

/// Drops the destination database. A missing database is not an error.
pub async fn drop_database(executor: &dyn CommandExecutor, destination: &DatabaseEndpoint) -> Result<()> {
    let name = destination_name(destination)?;
    info!("Dropping database '{}'", name);
    executor.run(&drop_command(destination, name)).await
}

/// Creates the destination database, owned by the configured user if any.
/// Fails if the database already exists.
pub async fn create_database(executor: &dyn CommandExecutor, destination: &DatabaseEndpoint) -> Result<()> {
    let name = destination_name(destination)?;
    info!("Creating database '{}'", name);
    executor.run(&create_command(destination, name)).await
}

pub async fn restore_database(
    executor: &dyn CommandExecutor,
    destination: &DatabaseEndpoint,
    file: &Path,
) -> Result<()> {
    let name = destination_name(destination)?;
    info!("Importing '{}' into database '{}'", file.display(), name);
    executor.run(&restore_command(destination, name, file)).await
}
