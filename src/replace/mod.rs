// paragres/src/replace/mod.rs
pub(crate) mod endpoint;
pub(crate) mod logic;

use crate::backup::download::HttpFetcher;
use crate::config::ReplacementRequest;
use crate::errors::Result;
use crate::utils::command::ProcessExecutor;

/// Public entry point for the replacement process, run against real processes and HTTP.
pub async fn run_replace_flow(request: &ReplacementRequest) -> Result<()> {
    let executor = ProcessExecutor;
    let fetcher = HttpFetcher::new()?;

    logic::Replacer::new(request, &executor, &fetcher).run().await
}
