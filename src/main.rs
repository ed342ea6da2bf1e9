use anyhow::Result;
use clap::Parser;
use dealboard::cli::Cli;
use log::info;

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    info!("Starting DealBoard - CRM Pipeline Board");
    cli.execute().await?;

    Ok(())
}
