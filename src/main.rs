use clap::Parser;
use miette::Result;
use tilecomp::cli::{Cli, Commands};

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Compose(args) => tilecomp::cli::compose::run(args)?,
        Commands::Completions(args) => tilecomp::cli::completions::run(args)?,
    }

    Ok(())
}
