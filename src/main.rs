use anyhow::Result;
use clap::Parser;

use quant_universe::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = quant_universe::app_init().await?;
    quant_universe::run(cli, config).await
}
