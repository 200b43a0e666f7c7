use anyhow::Result;
use clap::Parser;
use codelens::cli::{self, Cli};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    cli::init_tracing(&cli)?;
    cli::run(cli).await
}
