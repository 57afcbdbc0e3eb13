use anyhow::Result;
use clap::Parser;
use kasa::cli::Cli;

fn main() -> Result<()> {
    let cli = Cli::parse();
    cli.run()
}
