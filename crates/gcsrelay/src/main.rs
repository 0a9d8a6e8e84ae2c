use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use gcsrelay::cli::App;
use gcsrelay::{outputs, pipeline};
use gcsrelay_fetch::{Fetcher, ReqwestTransport};
use gcsrelay_store::GcsStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let app = App::parse();
    let plan = app.into_plan().context("invalid transfer options")?;

    let transport = ReqwestTransport::new().context("failed to build HTTP transport")?;
    let fetcher = Fetcher::new(transport);
    let store = GcsStore::from_env().context("failed to build storage client")?;

    let outcome = pipeline::run(&fetcher, &store, plan)
        .await
        .context("transfer failed")?;
    outputs::print(&outcome);
    Ok(())
}
