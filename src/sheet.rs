//! Per-sheet discovery and atlas composition.
//!
//! A [`Sheet`] owns one output tilesheet: it walks its
//! `pngs_{root}_{W}x{H}` source sub-tree in a fixed deterministic order,
//! registers every sprite image with the run's [`SpriteRegistry`], collects
//! raw tile entries from descriptor files, and finally grid-joins the
//! sprites into the packed atlas.
//!
//! Index ranges are finalized sheet by sheet: discovery assigns indexes and
//! [`Sheet::compose_atlas`] consumes the trailing padding slots before the
//! next sheet starts, so every sheet owns the contiguous range
//! `[first_index, max_index]`.

use std::fs;
use std::path::{Path, PathBuf};

use image::RgbaImage;
use walkdir::WalkDir;

use crate::atlas::{AtlasBackend, AtlasEncoding, SpriteGrid};
use crate::config::{ComposeOptions, SheetConfig};
use crate::diagnostics::Reporter;
use crate::entry::RawTileEntry;
use crate::error::{ComposeError, Result};
use crate::output::display_path;
use crate::registry::{SpriteCategory, SpriteRegistry};

/// A raw tile entry together with its descriptor file, for diagnostics.
#[derive(Debug, Clone)]
pub struct SheetEntry {
    pub source: PathBuf,
    pub entry: RawTileEntry,
}

/// One configured tilesheet being built.
#[derive(Debug)]
pub struct Sheet {
    /// Output file name, e.g. `tiles.png`.
    pub name: String,
    pub sprite_width: u32,
    pub sprite_height: u32,
    pub offset_x: i32,
    pub offset_y: i32,
    pub sprites_across: u32,
    pub is_fallback: bool,
    pub is_filler: bool,
    /// First sprite index this sheet owns.
    pub first_index: u32,

    subdir_path: PathBuf,
    output_path: PathBuf,
    excluded_paths: Vec<PathBuf>,

    /// Decoded sprites in discovery order; `None` for index-only
    /// placeholders and sprites that failed to decode. Released after the
    /// atlas is written.
    sprites: Vec<Option<RgbaImage>>,
    sprite_count: usize,

    pub tile_entries: Vec<SheetEntry>,
}

impl Sheet {
    pub fn new(config: &SheetConfig, registry: &SpriteRegistry, options: &ComposeOptions) -> Self {
        let specs = &config.specs;
        let sprite_width = specs.sprite_width.unwrap_or(registry.sprite_width);
        let sprite_height = specs.sprite_height.unwrap_or(registry.sprite_height);

        // "tiles.png" -> "pngs_tiles_32x32"
        let root = config.name.split(".png").next().unwrap_or(&config.name);
        let subdir_path = options
            .source_dir
            .join(format!("pngs_{root}_{sprite_width}x{sprite_height}"));
        let excluded_paths = specs
            .exclude
            .iter()
            .map(|ignored| subdir_path.join(ignored))
            .collect();

        Self {
            name: config.name.clone(),
            sprite_width,
            sprite_height,
            offset_x: specs.sprite_offset_x,
            offset_y: specs.sprite_offset_y,
            sprites_across: specs.sprites_across,
            is_fallback: specs.fallback,
            is_filler: !specs.fallback && specs.filler,
            first_index: registry.next_index(),
            subdir_path,
            output_path: options.output_dir.join(&config.name),
            excluded_paths,
            sprites: Vec::new(),
            sprite_count: 0,
            tile_entries: Vec::new(),
        }
    }

    pub fn category(&self) -> SpriteCategory {
        if self.is_filler {
            SpriteCategory::Filler
        } else {
            SpriteCategory::Main
        }
    }

    /// Claim index 0 for the run's sentinel sprite. Applied to the first
    /// sheet only; the sentinel occupies a grid slot but has no name file.
    pub fn insert_sentinel(&mut self) {
        self.sprites
            .insert(0, Some(RgbaImage::new(self.sprite_width, self.sprite_height)));
        self.sprite_count += 1;
        self.first_index = 0;
    }

    /// Unused slots at the end of the last grid row.
    pub fn padding(&self) -> u32 {
        let remainder = self.sprite_count as u32 % self.sprites_across;
        (self.sprites_across - remainder) % self.sprites_across
    }

    /// Index of the last slot this sheet owns, padding included.
    /// Meaningful only once at least one sprite was discovered.
    pub fn max_index(&self) -> u32 {
        self.first_index + self.sprite_count as u32 - 1 + self.padding()
    }

    /// Whether the sheet can omit size/offset fields in the document.
    pub fn is_standard(&self, registry: &SpriteRegistry) -> bool {
        self.offset_x == 0
            && self.offset_y == 0
            && self.sprite_width == registry.sprite_width
            && self.sprite_height == registry.sprite_height
    }

    /// Walk the sheet's source sub-tree and process every sprite image and
    /// descriptor file.
    ///
    /// Directories and files are visited in lexicographic order with
    /// excluded sub-paths pruned before descent, so index assignment is
    /// deterministic. Only single-suffix `.png`/`.json` files participate.
    pub fn discover<B: AtlasBackend>(
        &mut self,
        registry: &mut SpriteRegistry,
        options: &ComposeOptions,
        backend: &B,
        reporter: &mut Reporter,
    ) -> Result<()> {
        if !self.subdir_path.is_dir() {
            return Ok(());
        }

        let excluded_paths = std::mem::take(&mut self.excluded_paths);
        let walker = WalkDir::new(&self.subdir_path)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| !excluded_paths.iter().any(|p| entry.path() == p));

        for entry in walker.filter_map(|e| e.ok()) {
            let path = entry.path();
            if path.is_dir() {
                continue;
            }
            match single_suffix(path) {
                Some("png") => self.process_png(path, registry, options, backend, reporter)?,
                Some("json") => self.process_json(path)?,
                _ => {}
            }
        }
        Ok(())
    }

    /// Register one sprite image, verifying its root name is unique and its
    /// dimensions match the sheet.
    fn process_png<B: AtlasBackend>(
        &mut self,
        path: &Path,
        registry: &mut SpriteRegistry,
        options: &ComposeOptions,
        backend: &B,
        reporter: &mut Reporter,
    ) -> Result<()> {
        let stem = match path.file_stem().and_then(|s| s.to_str()) {
            Some(stem) => stem,
            None => return Ok(()),
        };

        if registry.register(stem, self.category()).is_err() {
            if !self.is_filler {
                reporter.error(&format!(
                    "duplicate root name {}: {}",
                    stem,
                    display_path(path)
                ))?;
            } else if options.obsolete_fillers {
                reporter.warning(&format!(
                    "root name {} is already present in a non-filler sheet: {}",
                    stem,
                    display_path(path)
                ));
            }
            return Ok(());
        }

        let payload = if options.only_json {
            None
        } else {
            match backend.decode(path) {
                Ok(image) => {
                    if image.width() != self.sprite_width || image.height() != self.sprite_height {
                        reporter.error(&format!(
                            "{} is {}x{}, but {} sheet sprites have to be {}x{}",
                            display_path(path),
                            image.width(),
                            image.height(),
                            self.name,
                            self.sprite_width,
                            self.sprite_height
                        ))?;
                    }
                    Some(image)
                }
                Err(error) => {
                    // Unreadable sprite: keep its index slot, leave the
                    // grid cell transparent
                    reporter.error(&error.to_string())?;
                    None
                }
            }
        };

        self.sprites.push(payload);
        self.sprite_count += 1;
        Ok(())
    }

    /// Parse a descriptor file into raw tile entries. A bare object is a
    /// one-element list; a malformed file aborts the run.
    fn process_json(&mut self, path: &Path) -> Result<()> {
        let content = fs::read_to_string(path).map_err(|e| ComposeError::Io {
            path: path.to_path_buf(),
            message: format!("Failed to read descriptor: {}", e),
        })?;

        let value: serde_json::Value =
            serde_json::from_str(&content).map_err(|e| ComposeError::Parse {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;

        let entries: Vec<RawTileEntry> = match value {
            serde_json::Value::Array(_) => {
                serde_json::from_value(value).map_err(|e| ComposeError::Parse {
                    path: path.to_path_buf(),
                    message: e.to_string(),
                })?
            }
            object => vec![
                serde_json::from_value(object).map_err(|e| ComposeError::Parse {
                    path: path.to_path_buf(),
                    message: e.to_string(),
                })?,
            ],
        };

        for entry in entries {
            self.tile_entries.push(SheetEntry {
                source: path.to_path_buf(),
                entry,
            });
        }
        Ok(())
    }

    /// Grid-join the discovered sprites and write the atlas.
    ///
    /// Returns false when the sheet discovered nothing (the sheet is then
    /// dropped from the document). Padding consumes registry index space
    /// even in index-only mode, so later sheets start on a fresh row
    /// boundary.
    pub fn compose_atlas<B: AtlasBackend>(
        &mut self,
        registry: &mut SpriteRegistry,
        options: &ComposeOptions,
        backend: &B,
    ) -> Result<bool> {
        if self.sprite_count == 0 {
            return Ok(false);
        }

        registry.reserve_padding(self.padding());

        if options.only_json {
            self.sprites = Vec::new();
            return Ok(true);
        }

        let grid = SpriteGrid {
            cell_width: self.sprite_width,
            cell_height: self.sprite_height,
            across: self.sprites_across,
            cells: &self.sprites,
        };

        let encoding = if options.palette {
            AtlasEncoding::Indexed
        } else {
            AtlasEncoding::Rgba
        };
        backend.write_atlas(&grid, &self.output_path, encoding)?;

        if options.palette_copies && !options.palette {
            let quantized_name = format!("{}8", self.name);
            let quantized_path = self.output_path.with_file_name(quantized_name);
            backend.write_atlas(&grid, &quantized_path, AtlasEncoding::Indexed)?;
        }

        // Sprites are sheet-scoped; release them once written
        self.sprites = Vec::new();
        Ok(true)
    }

    pub fn sprite_count(&self) -> usize {
        self.sprite_count
    }
}

/// The file's extension, but only when it is the sole suffix: `a.png`
/// matches, `a.b.png` does not.
fn single_suffix(path: &Path) -> Option<&str> {
    let stem = path.file_stem()?.to_str()?;
    if stem.contains('.') {
        return None;
    }
    path.extension()?.to_str()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::atlas::fake::FakeBackend;
    use crate::config::{SheetSpecs, TileInfo};
    use crate::diagnostics::Severity;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::fs;
    use tempfile::{tempdir, TempDir};

    fn registry() -> SpriteRegistry {
        SpriteRegistry::new(&TileInfo::default())
    }

    fn reporter() -> Reporter {
        Reporter::new(Severity::Error, false)
    }

    fn sheet_config(name: &str, specs: SheetSpecs) -> SheetConfig {
        SheetConfig {
            name: name.to_string(),
            specs,
        }
    }

    /// Source tree with a pngs_tiles_16x16 sheet directory.
    fn source_tree() -> (TempDir, PathBuf) {
        let dir = tempdir().unwrap();
        let sheet_dir = dir.path().join("pngs_tiles_16x16");
        fs::create_dir_all(&sheet_dir).unwrap();
        (dir, sheet_dir)
    }

    fn options_for(dir: &TempDir) -> ComposeOptions {
        ComposeOptions::new(dir.path(), dir.path().join("out"))
    }

    fn touch(path: &Path) {
        fs::write(path, b"").unwrap();
    }

    #[test]
    fn test_subdir_naming_convention() {
        let registry = registry();
        let options = ComposeOptions::new("/src", "/out");
        let config = sheet_config(
            "tiles.png",
            SheetSpecs {
                sprite_width: Some(32),
                sprite_height: Some(32),
                ..Default::default()
            },
        );
        let sheet = Sheet::new(&config, &registry, &options);
        assert_eq!(sheet.subdir_path, PathBuf::from("/src/pngs_tiles_32x32"));
        assert_eq!(sheet.output_path, PathBuf::from("/out/tiles.png"));
    }

    #[test]
    fn test_discovery_is_lexicographic() {
        let (dir, sheet_dir) = source_tree();
        touch(&sheet_dir.join("b.png"));
        touch(&sheet_dir.join("a.png"));
        fs::create_dir_all(sheet_dir.join("sub")).unwrap();
        touch(&sheet_dir.join("sub/c.png"));

        let backend = FakeBackend::default()
            .with_sprite(sheet_dir.join("a.png"), 16, 16)
            .with_sprite(sheet_dir.join("b.png"), 16, 16)
            .with_sprite(sheet_dir.join("sub/c.png"), 16, 16);

        let mut registry = registry();
        let options = options_for(&dir);
        let config = sheet_config("tiles.png", SheetSpecs::default());
        let mut sheet = Sheet::new(&config, &registry, &options);
        let mut reporter = reporter();

        sheet
            .discover(&mut registry, &options, &backend, &mut reporter)
            .unwrap();

        assert_eq!(registry.resolve("a"), 1);
        assert_eq!(registry.resolve("b"), 2);
        assert_eq!(registry.resolve("c"), 3);
        assert_eq!(sheet.sprite_count(), 3);
        assert_eq!(reporter.max_severity(), None);
    }

    #[test]
    fn test_subdir_is_visited_at_its_sorted_position() {
        // A subdirectory sorting before a sibling file is descended into
        // at that position, so its sprites index between the siblings
        let (dir, sheet_dir) = source_tree();
        touch(&sheet_dir.join("ab.png"));
        touch(&sheet_dir.join("ax.png"));
        fs::create_dir_all(sheet_dir.join("ad")).unwrap();
        touch(&sheet_dir.join("ad/z.png"));

        let backend = FakeBackend::default()
            .with_sprite(sheet_dir.join("ab.png"), 16, 16)
            .with_sprite(sheet_dir.join("ax.png"), 16, 16)
            .with_sprite(sheet_dir.join("ad/z.png"), 16, 16);

        let mut registry = registry();
        let options = options_for(&dir);
        let config = sheet_config("tiles.png", SheetSpecs::default());
        let mut sheet = Sheet::new(&config, &registry, &options);
        let mut reporter = reporter();

        sheet
            .discover(&mut registry, &options, &backend, &mut reporter)
            .unwrap();

        assert_eq!(registry.resolve("ab"), 1);
        assert_eq!(registry.resolve("z"), 2);
        assert_eq!(registry.resolve("ax"), 3);
    }

    #[test]
    fn test_excluded_subpaths_are_pruned() {
        let (dir, sheet_dir) = source_tree();
        touch(&sheet_dir.join("keep.png"));
        fs::create_dir_all(sheet_dir.join("wip")).unwrap();
        touch(&sheet_dir.join("wip/skip.png"));

        let backend = FakeBackend::default().with_sprite(sheet_dir.join("keep.png"), 16, 16);

        let mut registry = registry();
        let options = options_for(&dir);
        let config = sheet_config(
            "tiles.png",
            SheetSpecs {
                exclude: vec!["wip".to_string()],
                ..Default::default()
            },
        );
        let mut sheet = Sheet::new(&config, &registry, &options);
        let mut reporter = reporter();

        sheet
            .discover(&mut registry, &options, &backend, &mut reporter)
            .unwrap();

        assert_eq!(registry.resolve("keep"), 1);
        assert_eq!(registry.resolve("skip"), 0);
    }

    #[test]
    fn test_multi_suffix_files_are_ignored() {
        let (dir, sheet_dir) = source_tree();
        touch(&sheet_dir.join("real.png"));
        touch(&sheet_dir.join("backup.old.png"));
        touch(&sheet_dir.join("notes.txt"));

        let backend = FakeBackend::default().with_sprite(sheet_dir.join("real.png"), 16, 16);

        let mut registry = registry();
        let options = options_for(&dir);
        let config = sheet_config("tiles.png", SheetSpecs::default());
        let mut sheet = Sheet::new(&config, &registry, &options);
        let mut reporter = reporter();

        sheet
            .discover(&mut registry, &options, &backend, &mut reporter)
            .unwrap();

        assert_eq!(sheet.sprite_count(), 1);
        assert_eq!(registry.resolve("real"), 1);
    }

    #[test]
    fn test_dimension_mismatch_is_error_but_sprite_kept() {
        let (dir, sheet_dir) = source_tree();
        touch(&sheet_dir.join("wrong.png"));

        let backend = FakeBackend::default().with_sprite(sheet_dir.join("wrong.png"), 8, 8);

        let mut registry = registry();
        let options = options_for(&dir);
        let config = sheet_config("tiles.png", SheetSpecs::default());
        let mut sheet = Sheet::new(&config, &registry, &options);
        let mut reporter = reporter();

        sheet
            .discover(&mut registry, &options, &backend, &mut reporter)
            .unwrap();

        assert_eq!(reporter.error_count(), 1);
        assert_eq!(registry.resolve("wrong"), 1);
        assert_eq!(sheet.sprite_count(), 1);
    }

    #[test]
    fn test_undecodable_sprite_is_error_but_registered() {
        let (dir, sheet_dir) = source_tree();
        touch(&sheet_dir.join("corrupt.png"));

        // Not present in the fake backend, so decode fails
        let backend = FakeBackend::default();

        let mut registry = registry();
        let options = options_for(&dir);
        let config = sheet_config("tiles.png", SheetSpecs::default());
        let mut sheet = Sheet::new(&config, &registry, &options);
        let mut reporter = reporter();

        sheet
            .discover(&mut registry, &options, &backend, &mut reporter)
            .unwrap();

        assert_eq!(reporter.error_count(), 1);
        assert_eq!(registry.resolve("corrupt"), 1);
        assert_eq!(sheet.sprite_count(), 1);
    }

    #[test]
    fn test_duplicate_sprite_severity() {
        let (dir, sheet_dir) = source_tree();
        let filler_dir = dir.path().join("pngs_filler_16x16");
        fs::create_dir_all(&filler_dir).unwrap();
        touch(&sheet_dir.join("wall.png"));
        touch(&filler_dir.join("wall.png"));

        let backend = FakeBackend::default()
            .with_sprite(sheet_dir.join("wall.png"), 16, 16)
            .with_sprite(filler_dir.join("wall.png"), 16, 16);

        let mut registry = registry();
        let mut options = options_for(&dir);
        let mut reporter = reporter();

        let main_config = sheet_config("tiles.png", SheetSpecs::default());
        let mut main_sheet = Sheet::new(&main_config, &registry, &options);
        main_sheet
            .discover(&mut registry, &options, &backend, &mut reporter)
            .unwrap();

        // Filler duplicate: silent without obsolete_fillers
        let filler_config = sheet_config(
            "filler.png",
            SheetSpecs {
                filler: true,
                ..Default::default()
            },
        );
        let mut filler_sheet = Sheet::new(&filler_config, &registry, &options);
        filler_sheet
            .discover(&mut registry, &options, &backend, &mut reporter)
            .unwrap();
        assert_eq!(reporter.warning_count(), 0);
        assert_eq!(reporter.error_count(), 0);
        assert_eq!(filler_sheet.sprite_count(), 0);

        // With obsolete_fillers the same collision warns
        options.obsolete_fillers = true;
        let mut filler_sheet = Sheet::new(&filler_config, &registry, &options);
        filler_sheet
            .discover(&mut registry, &options, &backend, &mut reporter)
            .unwrap();
        assert_eq!(reporter.warning_count(), 1);

        // A duplicate in a non-filler sheet is an error
        let dup_config = sheet_config("tiles2.png", SheetSpecs::default());
        let dup_dir = dir.path().join("pngs_tiles2_16x16");
        fs::create_dir_all(&dup_dir).unwrap();
        touch(&dup_dir.join("wall.png"));
        let backend = FakeBackend::default().with_sprite(dup_dir.join("wall.png"), 16, 16);
        let mut dup_sheet = Sheet::new(&dup_config, &registry, &options);
        dup_sheet
            .discover(&mut registry, &options, &backend, &mut reporter)
            .unwrap();
        assert_eq!(reporter.error_count(), 1);

        // The first registration keeps its index
        assert_eq!(registry.resolve("wall"), 1);
    }

    #[test]
    fn test_descriptor_bare_object_is_one_entry() {
        let (dir, sheet_dir) = source_tree();
        fs::write(
            sheet_dir.join("wall.json"),
            json!({"id": "t_wall", "fg": "wall"}).to_string(),
        )
        .unwrap();
        fs::write(
            sheet_dir.join("floors.json"),
            json!([
                {"id": "t_floor", "fg": "floor"},
                {"id": "t_dirt", "fg": "dirt"}
            ])
            .to_string(),
        )
        .unwrap();

        let mut registry = registry();
        let options = options_for(&dir);
        let config = sheet_config("tiles.png", SheetSpecs::default());
        let mut sheet = Sheet::new(&config, &registry, &options);
        let mut reporter = reporter();

        sheet
            .discover(&mut registry, &options, &FakeBackend::default(), &mut reporter)
            .unwrap();

        assert_eq!(sheet.tile_entries.len(), 3);
        // floors.json sorts before wall.json
        assert!(sheet.tile_entries[0]
            .source
            .to_string_lossy()
            .contains("floors.json"));
    }

    #[test]
    fn test_malformed_descriptor_is_fatal() {
        let (dir, sheet_dir) = source_tree();
        fs::write(sheet_dir.join("bad.json"), "{not json").unwrap();

        let mut registry = registry();
        let options = options_for(&dir);
        let config = sheet_config("tiles.png", SheetSpecs::default());
        let mut sheet = Sheet::new(&config, &registry, &options);
        let mut reporter = reporter();

        let err = sheet
            .discover(&mut registry, &options, &FakeBackend::default(), &mut reporter)
            .unwrap_err();
        assert!(matches!(err, ComposeError::Parse { .. }));
    }

    #[test]
    fn test_padding_invariant() {
        for (count, across, expected) in [(0, 16, 0), (1, 16, 15), (16, 16, 0), (17, 16, 15), (5, 4, 3)] {
            let registry = registry();
            let options = ComposeOptions::new("/src", "/out");
            let config = sheet_config(
                "tiles.png",
                SheetSpecs {
                    sprites_across: across,
                    ..Default::default()
                },
            );
            let mut sheet = Sheet::new(&config, &registry, &options);
            sheet.sprite_count = count;
            assert_eq!(sheet.padding(), expected, "count={count} across={across}");
            if count > 0 {
                assert_eq!((sheet.max_index() - sheet.first_index + 1) % across, 0);
            }
        }
    }

    #[test]
    fn test_compose_atlas_skips_empty_sheet() {
        let registry_info = registry();
        let options = ComposeOptions::new("/src", "/out");
        let config = sheet_config("tiles.png", SheetSpecs::default());
        let mut sheet = Sheet::new(&config, &registry_info, &options);

        let mut registry = registry();
        let backend = FakeBackend::default();
        let written = sheet
            .compose_atlas(&mut registry, &options, &backend)
            .unwrap();
        assert!(!written);
        assert!(backend.written.borrow().is_empty());
    }

    #[test]
    fn test_compose_atlas_reserves_padding_in_index_only_mode() {
        let (dir, sheet_dir) = source_tree();
        touch(&sheet_dir.join("a.png"));
        touch(&sheet_dir.join("b.png"));

        let mut registry = registry();
        let mut options = options_for(&dir);
        options.only_json = true;
        let config = sheet_config("tiles.png", SheetSpecs::default());
        let mut sheet = Sheet::new(&config, &registry, &options);
        let mut reporter = reporter();
        let backend = FakeBackend::default();

        sheet
            .discover(&mut registry, &options, &backend, &mut reporter)
            .unwrap();
        let written = sheet
            .compose_atlas(&mut registry, &options, &backend)
            .unwrap();

        assert!(written);
        assert!(backend.written.borrow().is_empty());
        // 2 sprites + 14 padding slots
        assert_eq!(registry.counter(), 16);
        assert_eq!(sheet.max_index(), 16);
        assert_eq!(reporter.max_severity(), None);
    }

    #[test]
    fn test_compose_atlas_writes_quantized_copy() {
        let (dir, sheet_dir) = source_tree();
        touch(&sheet_dir.join("a.png"));

        let backend = FakeBackend::default().with_sprite(sheet_dir.join("a.png"), 16, 16);
        let mut registry = registry();
        let mut options = options_for(&dir);
        options.palette_copies = true;
        let config = sheet_config("tiles.png", SheetSpecs::default());
        let mut sheet = Sheet::new(&config, &registry, &options);
        let mut reporter = reporter();

        sheet
            .discover(&mut registry, &options, &backend, &mut reporter)
            .unwrap();
        sheet
            .compose_atlas(&mut registry, &options, &backend)
            .unwrap();

        let written = backend.written.borrow();
        assert_eq!(written.len(), 2);
        assert_eq!(written[0].0, dir.path().join("out/tiles.png"));
        assert_eq!(written[0].3, AtlasEncoding::Rgba);
        assert_eq!(written[1].0, dir.path().join("out/tiles.png8"));
        assert_eq!(written[1].3, AtlasEncoding::Indexed);
    }

    #[test]
    fn test_sentinel_occupies_index_zero() {
        let (dir, sheet_dir) = source_tree();
        touch(&sheet_dir.join("a.png"));
        touch(&sheet_dir.join("b.png"));

        let backend = FakeBackend::default()
            .with_sprite(sheet_dir.join("a.png"), 16, 16)
            .with_sprite(sheet_dir.join("b.png"), 16, 16);
        let mut registry = registry();
        let options = options_for(&dir);
        let config = sheet_config("tiles.png", SheetSpecs::default());
        let mut sheet = Sheet::new(&config, &registry, &options);
        let mut reporter = reporter();

        sheet.insert_sentinel();
        sheet
            .discover(&mut registry, &options, &backend, &mut reporter)
            .unwrap();
        sheet
            .compose_atlas(&mut registry, &options, &backend)
            .unwrap();

        assert_eq!(sheet.first_index, 0);
        // sentinel + a + b + 13 padding slots
        assert_eq!(sheet.max_index(), 15);
        assert_eq!(registry.resolve("a"), 1);
        assert_eq!(registry.resolve("b"), 2);
        assert_eq!(registry.counter(), 15);
    }

    #[test]
    fn test_is_standard() {
        let registry = registry();
        let options = ComposeOptions::new("/src", "/out");

        let standard = Sheet::new(
            &sheet_config("a.png", SheetSpecs::default()),
            &registry,
            &options,
        );
        assert!(standard.is_standard(&registry));

        let resized = Sheet::new(
            &sheet_config(
                "b.png",
                SheetSpecs {
                    sprite_width: Some(32),
                    ..Default::default()
                },
            ),
            &registry,
            &options,
        );
        assert!(!resized.is_standard(&registry));

        let offset = Sheet::new(
            &sheet_config(
                "c.png",
                SheetSpecs {
                    sprite_offset_y: -8,
                    ..Default::default()
                },
            ),
            &registry,
            &options,
        );
        assert!(!offset.is_standard(&registry));
    }
}
