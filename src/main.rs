mod analysis;
mod auth;
mod cli;
mod config;
mod error;
mod insights;
mod model;
mod output;
mod providers;
mod session;
mod store;

use anyhow::Result;
use clap::Parser;
use cli::Cli;
use log::info;

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    output::print_banner();

    let cli = Cli::parse();
    info!("Starting pipemon");
    cli.execute().await?;

    Ok(())
}
