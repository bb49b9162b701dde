//! Tileset configuration loading.
//!
//! A compositing tileset directory carries two configuration files:
//!
//! * `tile_info.json` is an array whose first element holds the global
//!   sprite size and pixel scale, followed by one single-key object per
//!   sheet (`{"tiles.png": {"sprite_width": 32, ...}}`) in output order.
//! * `tileset.txt` holds plain `key: value` properties; its `JSON` key
//!   names the merged configuration document to write.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use serde_json::Number;

use crate::error::{ComposeError, Result};

/// File holding the global sprite metadata and sheet list.
pub const INFO_FILENAME: &str = "tile_info.json";

/// Properties file naming the output document.
pub const PROPERTIES_FILENAME: &str = "tileset.txt";

/// Global sprite metadata from the first element of `tile_info.json`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TileInfo {
    pub width: u32,
    pub height: u32,
    /// Kept as a raw JSON number so the output round-trips exactly.
    pub pixelscale: Number,
}

impl Default for TileInfo {
    fn default() -> Self {
        Self {
            width: 16,
            height: 16,
            pixelscale: Number::from(1),
        }
    }
}

/// Per-sheet configuration from `tile_info.json`.
#[derive(Debug, Clone)]
pub struct SheetConfig {
    /// Output file name of the sheet, e.g. `tiles.png`.
    pub name: String,
    pub specs: SheetSpecs,
}

/// The value half of a sheet's `tile_info.json` object.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SheetSpecs {
    pub sprite_width: Option<u32>,
    pub sprite_height: Option<u32>,
    pub sprite_offset_x: i32,
    pub sprite_offset_y: i32,
    #[serde(default = "default_sprites_across")]
    pub sprites_across: u32,
    /// Sub-paths (relative to the sheet directory) pruned before descent.
    pub exclude: Vec<String>,
    pub fallback: bool,
    pub filler: bool,
}

fn default_sprites_across() -> u32 {
    16
}

impl Default for SheetSpecs {
    fn default() -> Self {
        Self {
            sprite_width: None,
            sprite_height: None,
            sprite_offset_x: 0,
            sprite_offset_y: 0,
            sprites_across: default_sprites_across(),
            exclude: Vec::new(),
            fallback: false,
            filler: false,
        }
    }
}

/// `tile_info.json` contents: global metadata plus the ordered sheet list.
#[derive(Debug, Clone)]
pub struct TilesetInfo {
    pub tile_info: TileInfo,
    pub sheets: Vec<SheetConfig>,
}

impl TilesetInfo {
    /// Load and validate `tile_info.json` from the source directory.
    pub fn load(source_dir: &Path) -> Result<Self> {
        let path = source_dir.join(INFO_FILENAME);
        let content = fs::read_to_string(&path).map_err(|e| ComposeError::Config {
            message: format!("cannot open {}: {}", path.display(), e),
            help: Some("the source directory must contain tile_info.json".to_string()),
        })?;

        let elements: Vec<serde_json::Value> =
            serde_json::from_str(&content).map_err(|e| ComposeError::Parse {
                path: path.clone(),
                message: e.to_string(),
            })?;

        let mut iter = elements.into_iter();
        let first = iter.next().ok_or_else(|| ComposeError::Config {
            message: format!("{} is an empty array", path.display()),
            help: Some("the first element must hold width, height and pixelscale".to_string()),
        })?;

        let tile_info: TileInfo =
            serde_json::from_value(first).map_err(|e| ComposeError::Parse {
                path: path.clone(),
                message: format!("invalid tile info block: {}", e),
            })?;

        let mut sheets = Vec::new();
        for element in iter {
            sheets.push(parse_sheet_config(element, &path)?);
        }

        Ok(Self { tile_info, sheets })
    }
}

/// Parse one `{"name.png": {...}}` sheet element.
fn parse_sheet_config(element: serde_json::Value, path: &Path) -> Result<SheetConfig> {
    let object = match element {
        serde_json::Value::Object(object) => object,
        other => {
            return Err(ComposeError::Parse {
                path: path.to_path_buf(),
                message: format!("expected a sheet object, found {}", other),
            })
        }
    };

    let mut entries = object.into_iter();
    let (name, specs_value) = entries.next().ok_or_else(|| ComposeError::Parse {
        path: path.to_path_buf(),
        message: "sheet object has no name key".to_string(),
    })?;
    if entries.next().is_some() {
        return Err(ComposeError::Parse {
            path: path.to_path_buf(),
            message: format!("sheet object for {} has more than one key", name),
        });
    }

    let specs: SheetSpecs = serde_json::from_value(specs_value).map_err(|e| ComposeError::Parse {
        path: path.to_path_buf(),
        message: format!("invalid sheet config for {}: {}", name, e),
    })?;

    Ok(SheetConfig { name, specs })
}

/// Read a `tileset.txt` properties file into key/value pairs.
///
/// Blank lines and `#` comments are skipped; the first `:` splits key from
/// value.
pub fn read_properties(path: &Path) -> Result<Vec<(String, String)>> {
    let content = fs::read_to_string(path).map_err(|e| ComposeError::Io {
        path: path.to_path_buf(),
        message: format!("Failed to read properties: {}", e),
    })?;

    let mut pairs = Vec::new();
    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let (key, value) = line.split_once(':').ok_or_else(|| ComposeError::Parse {
            path: path.to_path_buf(),
            message: format!("line without ':' separator: {}", line),
        })?;
        pairs.push((key.trim().to_string(), value.trim().to_string()));
    }
    Ok(pairs)
}

/// Determine the output document file name from `tileset.txt`.
///
/// The properties file is searched in the source directory first, then the
/// output directory.
pub fn determine_conffile(source_dir: &Path, output_dir: &Path) -> Result<String> {
    for candidate in [source_dir, output_dir] {
        let path = candidate.join(PROPERTIES_FILENAME);
        if !path.is_file() {
            continue;
        }
        let properties = read_properties(&path)?;
        if properties.is_empty() {
            continue;
        }
        return properties
            .into_iter()
            .find(|(key, _)| key == "JSON")
            .map(|(_, value)| value)
            .ok_or_else(|| ComposeError::Config {
                message: format!("no JSON key found in {}", path.display()),
                help: Some("add a line like 'JSON: tile_config.json'".to_string()),
            });
    }

    Err(ComposeError::Config {
        message: format!("no valid {} found", PROPERTIES_FILENAME),
        help: Some("create tileset.txt with a 'JSON: <filename>' line".to_string()),
    })
}

/// Options for one composition run, supplied by the CLI layer.
#[derive(Debug, Clone)]
pub struct ComposeOptions {
    pub source_dir: PathBuf,
    pub output_dir: PathBuf,
    /// Synthesize entries for unreferenced sprites instead of warning.
    pub use_all: bool,
    /// Relax duplicate/unused severity for filler sheets.
    pub obsolete_fillers: bool,
    /// Quantize all tilesheets to 8-bit colormaps.
    pub palette: bool,
    /// Also write an 8-bit quantized copy of each tilesheet.
    pub palette_copies: bool,
    /// Pretty-print the output document.
    pub format_json: bool,
    /// Skip atlas composition; still reserve index space.
    pub only_json: bool,
}

impl ComposeOptions {
    pub fn new(source_dir: impl Into<PathBuf>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            source_dir: source_dir.into(),
            output_dir: output_dir.into(),
            use_all: false,
            obsolete_fillers: false,
            palette: false,
            palette_copies: false,
            format_json: false,
            only_json: false,
        }
    }
}
