use anyhow::Context;
use clap::Parser;
use cutout::cli::Cli;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    cutout::run(cli).context("cutout exited with an error")?;
    Ok(())
}
