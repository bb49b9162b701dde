pub mod completions;
pub mod compose;

use clap::{Parser, Subcommand};

/// tilecomp - Tileset compositing pipeline
#[derive(Parser, Debug)]
#[command(name = "tilecomp")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Compose a tileset source tree into packed tilesheets
    Compose(compose::ComposeArgs),

    /// Generate shell completions
    Completions(completions::CompletionsArgs),
}
