//! Compose command implementation.
//!
//! Walks a tileset source tree, packs the sprites into tilesheet atlases
//! and merges the tile entry descriptors into one configuration document.

use std::path::PathBuf;

use clap::{Args, ValueEnum};

use crate::atlas::ImageBackend;
use crate::compose::Composer;
use crate::config::ComposeOptions;
use crate::diagnostics::{Reporter, Severity};
use crate::error::{ComposeError, Result};
use crate::output::{plural, Printer};

/// Compose a tileset source tree into packed tilesheets
#[derive(Args, Debug)]
pub struct ComposeArgs {
    /// Tileset source files directory path
    pub source_dir: PathBuf,

    /// Output directory path (defaults to the source directory)
    pub output_dir: Option<PathBuf>,

    /// Add unused images with id being their basename
    #[arg(long)]
    pub use_all: bool,

    /// Warn about obsoleted fillers
    #[arg(long)]
    pub obsolete_fillers: bool,

    /// Quantize all tilesheets to 8bit colormaps
    #[arg(long)]
    pub palette: bool,

    /// Produce copies of tilesheets quantized to 8bit colormaps
    #[arg(long)]
    pub palette_copies: bool,

    /// Format the merged configuration document
    #[arg(long)]
    pub format_json: bool,

    /// Only output the merged configuration document, no tilesheets
    #[arg(long)]
    pub only_json: bool,

    /// Abort on the first error instead of collecting diagnostics
    #[arg(long)]
    pub fail_fast: bool,

    /// Minimum severity of diagnostics to print
    #[arg(long, value_enum, default_value_t = LogLevel::Warning)]
    pub loglevel: LogLevel,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Info,
    Warning,
    Error,
}

impl From<LogLevel> for Severity {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Info => Severity::Info,
            LogLevel::Warning => Severity::Warning,
            LogLevel::Error => Severity::Error,
        }
    }
}

pub fn run(args: ComposeArgs) -> Result<()> {
    let output_dir = args.output_dir.unwrap_or_else(|| args.source_dir.clone());

    let mut options = ComposeOptions::new(args.source_dir, output_dir);
    options.use_all = args.use_all;
    options.obsolete_fillers = args.obsolete_fillers;
    options.palette = args.palette;
    options.palette_copies = args.palette_copies;
    options.format_json = args.format_json;
    options.only_json = args.only_json;

    let mut reporter = Reporter::new(args.loglevel.into(), args.fail_fast);
    let backend = ImageBackend;

    let summary = Composer::new(&options, &backend).run(&mut reporter)?;

    let printer = Printer::new();
    printer.status(
        "Composed",
        &format!(
            "{} ({}) -> {}",
            plural(summary.sheet_count, "sheet", "sheets"),
            plural(summary.sprite_count, "sprite", "sprites"),
            summary.document_path.display()
        ),
    );

    if reporter.has_errors() {
        return Err(ComposeError::CompletedWithErrors {
            errors: reporter.error_count(),
        });
    }
    Ok(())
}
