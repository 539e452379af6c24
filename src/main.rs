//! paragres: copy a PostgreSQL database from a dump file, URL, database or
//! Heroku app into a Postgres database or a Heroku app.

// paragres/src/main.rs
mod backup;
mod cli;
mod config;
mod errors;
mod heroku;
mod logging;
mod replace;
mod restore;
mod settings;
mod utils;

use anyhow::{Context, Result};
use std::process::ExitCode;
use tracing::warn;

use config::ReplacementRequest;
use errors::AppError;

#[tokio::main]
async fn main() -> ExitCode {
    dotenv::dotenv().ok();
    let args = cli::parse();
    logging::init(args.verbosity);

    let request = match ReplacementRequest::from_args(&args) {
        Ok(request) => request,
        Err(AppError::Config(message)) => {
            eprintln!("{}", cli::render_help());
            eprintln!("\nERROR: {}", message);
            return ExitCode::FAILURE;
        }
        Err(e) => {
            eprintln!("❌ Error: {}", e);
            return ExitCode::FAILURE;
        }
    };
    if ReplacementRequest::ignored_destination_flags(&args) {
        warn!("A Heroku destination (-d) was given; ignoring destination database flags (-n/-t)");
    }

    match run_app(&request).await {
        Ok(_) => {
            println!("✅ Database replacement completed successfully.");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("❌ Error: {:?}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run_app(request: &ReplacementRequest) -> Result<()> {
    replace::run_replace_flow(request)
        .await
        .context("Database replacement failed")
}
