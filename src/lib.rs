//! tilecomp - Tileset compositing pipeline
//!
//! A library for packing directories of individual sprite images into
//! tilesheet atlases and merging their tile entry descriptors into a single
//! tileset configuration document.

pub mod atlas;
pub mod cli;
pub mod compose;
pub mod config;
pub mod diagnostics;
pub mod entry;
pub mod error;
pub mod output;
pub mod registry;
pub mod sheet;

pub use atlas::{join_grid, AtlasBackend, AtlasEncoding, ImageBackend, SpriteGrid};
pub use compose::{Composer, OutputDocument, RunSummary};
pub use config::{ComposeOptions, SheetConfig, SheetSpecs, TileInfo, TilesetInfo};
pub use diagnostics::{Reporter, Severity};
pub use entry::{EntryNormalizer, NormalizedEntry, RawTileEntry};
pub use error::{ComposeError, Result};
pub use registry::{SpriteCategory, SpriteRegistry};
pub use sheet::{Sheet, SheetEntry};
