//! The composition pipeline and final document assembly.
//!
//! A run is a strictly sequential four-phase pipeline: registry
//! initialization, per-sheet discovery and atlas composition (in configured
//! order), per-sheet entry normalization with the unreferenced-sprite
//! passes woven in, then serialization. Later phases depend on earlier
//! phases' completed state; index ranges are final before any entry is
//! normalized.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::Number;

use crate::atlas::AtlasBackend;
use crate::config::{determine_conffile, ComposeOptions, TilesetInfo};
use crate::diagnostics::Reporter;
use crate::entry::{EntryNormalizer, NormalizedEntry};
use crate::error::{ComposeError, Result};
use crate::registry::{SpriteCategory, SpriteRegistry};
use crate::sheet::Sheet;

/// External pretty-printer consulted for `--format-json` output; the
/// built-in formatter is used when it is not present.
const EXTERNAL_FORMATTER: &str = "tools/format/json_formatter.cgi";

/// Default fallback atlas name when no fallback sheet is configured.
const DEFAULT_FALLBACK_FILE: &str = "fallback.png";

/// The merged configuration document.
#[derive(Debug, Serialize)]
pub struct OutputDocument {
    pub tile_info: Vec<TileInfoBlock>,
    #[serde(rename = "tiles-new")]
    pub tiles_new: Vec<SheetRecord>,
}

/// Global metadata block.
#[derive(Debug, Serialize)]
pub struct TileInfoBlock {
    pub pixelscale: Number,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum SheetRecord {
    Sheet(SheetBlock),
    Fallback(FallbackBlock),
}

/// One per-sheet block of the document.
#[derive(Debug, Serialize)]
pub struct SheetBlock {
    pub file: String,
    /// Human-readable index-range annotation.
    #[serde(rename = "//")]
    pub comment: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sprite_width: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sprite_height: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sprite_offset_x: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sprite_offset_y: Option<i32>,
    pub tiles: Vec<NormalizedEntry>,
}

/// The trailing synthetic block describing text-glyph rendering for
/// consumers with no tileset support.
#[derive(Debug, Serialize)]
pub struct FallbackBlock {
    pub file: String,
    pub tiles: Vec<NormalizedEntry>,
    pub ascii: Vec<AsciiGlyph>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AsciiGlyph {
    pub offset: u32,
    pub bold: bool,
    pub color: &'static str,
}

/// The fixed 16-region ASCII color ramp, 256 glyphs per region.
pub fn fallback_ascii() -> Vec<AsciiGlyph> {
    const RAMP: [(bool, &str); 16] = [
        (false, "BLACK"),
        (true, "WHITE"),
        (false, "WHITE"),
        (true, "BLACK"),
        (false, "RED"),
        (false, "GREEN"),
        (false, "BLUE"),
        (false, "CYAN"),
        (false, "MAGENTA"),
        (false, "YELLOW"),
        (true, "RED"),
        (true, "GREEN"),
        (true, "BLUE"),
        (true, "CYAN"),
        (true, "MAGENTA"),
        (true, "YELLOW"),
    ];
    RAMP.iter()
        .enumerate()
        .map(|(region, &(bold, color))| AsciiGlyph {
            offset: region as u32 * 256,
            bold,
            color,
        })
        .collect()
}

/// What a successful run produced, for the CLI's closing status line.
#[derive(Debug)]
pub struct RunSummary {
    pub document_path: PathBuf,
    pub sheet_count: usize,
    pub sprite_count: usize,
}

/// Drives one composition run over an [`AtlasBackend`].
pub struct Composer<'a, B: AtlasBackend> {
    options: &'a ComposeOptions,
    backend: &'a B,
}

impl<'a, B: AtlasBackend> Composer<'a, B> {
    pub fn new(options: &'a ComposeOptions, backend: &'a B) -> Self {
        Self { options, backend }
    }

    pub fn run(&self, reporter: &mut Reporter) -> Result<RunSummary> {
        if !self.options.source_dir.is_dir() {
            return Err(ComposeError::Config {
                message: format!(
                    "cannot open directory {}",
                    self.options.source_dir.display()
                ),
                help: None,
            });
        }

        let info = TilesetInfo::load(&self.options.source_dir)?;
        let mut registry = SpriteRegistry::new(&info.tile_info);

        fs::create_dir_all(&self.options.output_dir).map_err(|e| ComposeError::Io {
            path: self.options.output_dir.clone(),
            message: format!("Failed to create output directory: {}", e),
        })?;
        let conf_file = determine_conffile(&self.options.source_dir, &self.options.output_dir)?;

        // Phase 1: discover sprites and write atlases, sheet by sheet, so
        // every sheet's index range is final before the next begins.
        let mut main_sheets = Vec::new();
        let mut filler_sheets = Vec::new();
        let mut fallback_sheets = Vec::new();
        let mut sprite_count = 0;

        for (position, config) in info.sheets.iter().enumerate() {
            let mut sheet = Sheet::new(config, &registry, self.options);
            if position == 0 {
                sheet.insert_sentinel();
            }

            let kind = if sheet.is_fallback {
                "fallback"
            } else if sheet.is_filler {
                "filler"
            } else {
                "main"
            };
            reporter.info(&format!("parsing {} tilesheet {}", kind, sheet.name));

            if sheet.is_fallback {
                fallback_sheets.push(sheet);
                continue;
            }

            sheet.discover(&mut registry, self.options, self.backend, reporter)?;
            if !sheet.compose_atlas(&mut registry, self.options, self.backend)? {
                // Nothing discovered: the sheet contributes no block
                continue;
            }
            sprite_count += sheet.sprite_count();

            if sheet.is_filler {
                filler_sheets.push(sheet);
            } else {
                main_sheets.push(sheet);
            }
        }

        // Phase 2: normalize entries in document order (main, filler,
        // fallback), draining unreferenced main sprites just before the
        // first filler sheet.
        let ordered = main_sheets
            .into_iter()
            .chain(filler_sheets)
            .chain(fallback_sheets);

        let mut blocks: Vec<(u32, SheetBlock)> = Vec::new();
        let mut fallback_file = DEFAULT_FALLBACK_FILE.to_string();
        let mut main_finished = false;

        for sheet in ordered {
            if sheet.is_fallback {
                fallback_file = sheet.name.clone();
                continue;
            }
            if sheet.is_filler && !main_finished {
                self.synthesize_unreferenced(
                    SpriteCategory::Main,
                    &mut registry,
                    &mut blocks,
                    reporter,
                    &conf_file,
                )?;
                main_finished = true;
            }

            let mut tiles = Vec::new();
            let mut normalizer =
                EntryNormalizer::new(&mut registry, self.options, &conf_file, sheet.is_filler);
            for sheet_entry in &sheet.tile_entries {
                if let Some(entry) =
                    normalizer.convert(&sheet_entry.entry, &sheet_entry.source, reporter)?
                {
                    tiles.push(entry);
                }
            }

            let standard = sheet.is_standard(&registry);
            let block = SheetBlock {
                file: sheet.name.clone(),
                comment: format!("range {} to {}", sheet.first_index, sheet.max_index()),
                sprite_width: (!standard).then_some(sheet.sprite_width),
                sprite_height: (!standard).then_some(sheet.sprite_height),
                sprite_offset_x: (!standard).then_some(sheet.offset_x),
                sprite_offset_y: (!standard).then_some(sheet.offset_y),
                tiles,
            };
            blocks.push((sheet.max_index(), block));
        }

        // Phase 3: remaining unreferenced passes.
        if !main_finished {
            self.synthesize_unreferenced(
                SpriteCategory::Main,
                &mut registry,
                &mut blocks,
                reporter,
                &conf_file,
            )?;
        }
        self.synthesize_unreferenced(
            SpriteCategory::Filler,
            &mut registry,
            &mut blocks,
            reporter,
            &conf_file,
        )?;

        // Phase 4: assemble and serialize.
        let sheet_count = blocks.len();
        let mut tiles_new: Vec<SheetRecord> = blocks
            .into_iter()
            .map(|(_, block)| SheetRecord::Sheet(block))
            .collect();
        tiles_new.push(SheetRecord::Fallback(FallbackBlock {
            file: fallback_file,
            tiles: Vec::new(),
            ascii: fallback_ascii(),
        }));

        let document = OutputDocument {
            tile_info: vec![TileInfoBlock {
                pixelscale: registry.pixelscale.clone(),
                width: registry.sprite_width,
                height: registry.sprite_height,
            }],
            tiles_new,
        };

        let document_path = self.options.output_dir.join(&conf_file);
        self.write_document(&document, &document_path, reporter)?;

        Ok(RunSummary {
            document_path,
            sheet_count,
            sprite_count,
        })
    }

    /// Drain one unreferenced-sprite list. With `use_all`, each remaining
    /// name becomes an identity entry attributed to the sheet block whose
    /// index range contains the sprite.
    fn synthesize_unreferenced(
        &self,
        category: SpriteCategory,
        registry: &mut SpriteRegistry,
        blocks: &mut [(u32, SheetBlock)],
        reporter: &mut Reporter,
        conf_file: &str,
    ) -> Result<()> {
        let names =
            registry.drain_unreferenced(category, self.options.use_all, reporter, conf_file)?;
        let fillers = category == SpriteCategory::Filler;

        for name in names {
            if registry.is_processed(&name) {
                if !fillers {
                    reporter.warning(&format!(
                        "{name} sprite was not mentioned in any tile entry \
                         but there is a tile entry for the {name} ID"
                    ));
                } else if self.options.obsolete_fillers {
                    reporter.warning(&format!(
                        "there is a tile entry for {name} in a non-filler sheet"
                    ));
                }
                continue;
            }

            let index = registry.resolve(&name);
            let mut range_start = 0;
            for (max_index, block) in blocks.iter_mut() {
                if range_start < index && index <= *max_index {
                    block.tiles.push(NormalizedEntry::identity(&name, index));
                    registry.mark_processed(&name);
                    break;
                }
                range_start = *max_index;
            }
        }
        Ok(())
    }

    /// Serialize the document, delegating to the external formatter for
    /// pretty output when it is available.
    fn write_document(
        &self,
        document: &OutputDocument,
        path: &Path,
        reporter: &mut Reporter,
    ) -> Result<()> {
        let serialized = if self.options.format_json {
            serde_json::to_string_pretty(document)
        } else {
            serde_json::to_string(document)
        }
        .map_err(|e| ComposeError::Build {
            message: format!("Failed to serialize {}: {}", path.display(), e),
            help: None,
        })?;

        fs::write(path, serialized).map_err(|e| ComposeError::Io {
            path: path.to_path_buf(),
            message: format!("Failed to write document: {}", e),
        })?;

        if !self.options.format_json {
            return Ok(());
        }

        let formatter = Path::new(EXTERNAL_FORMATTER);
        if formatter.is_file() {
            let status = std::process::Command::new(formatter).arg(path).status();
            if let Err(e) = status {
                reporter.warning(&format!(
                    "failed to run {}: {}",
                    formatter.display(),
                    e
                ));
            }
        } else {
            reporter.warning(&format!(
                "{} not found, built-in formatter was used",
                formatter.display()
            ));
        }
        Ok(())
    }
}
