//! Global sprite index registry.
//!
//! One [`SpriteRegistry`] spans a whole composition run. It is the single
//! authority for index assignment: every discovered sprite name gets the
//! next counter value, exactly once, in discovery order. Index 0 is
//! permanently reserved for the synthetic null sprite.
//!
//! The registry also owns the run-wide identifier set used for tile-entry
//! deduplication and the per-category lists of sprites that have not been
//! referenced by any entry yet.

use std::collections::{HashMap, HashSet};
use std::fmt;

use serde_json::Number;

use crate::config::TileInfo;
use crate::diagnostics::Reporter;
use crate::error::Result;

/// Name of the reserved index-0 sentinel sprite.
pub const NULL_SPRITE_NAME: &str = "null_image";

/// Which unreferenced list a sheet's sprites belong to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpriteCategory {
    Main,
    Filler,
}

impl fmt::Display for SpriteCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SpriteCategory::Main => write!(f, "main"),
            SpriteCategory::Filler => write!(f, "filler"),
        }
    }
}

/// Signal that a sprite name was registered twice.
///
/// The caller decides the severity; it depends on the sheet category and
/// the obsolete-fillers option.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DuplicateSprite {
    pub name: String,
}

/// Name-to-index table and shared per-run state.
#[derive(Debug)]
pub struct SpriteRegistry {
    /// Global sprite dimensions from `tile_info.json`.
    pub sprite_width: u32,
    pub sprite_height: u32,
    pub pixelscale: Number,

    name_to_index: HashMap<String, u32>,
    counter: u32,
    processed_ids: HashSet<String>,
    unreferenced_main: Vec<String>,
    unreferenced_filler: Vec<String>,
}

impl SpriteRegistry {
    pub fn new(tile_info: &TileInfo) -> Self {
        let mut name_to_index = HashMap::new();
        name_to_index.insert(NULL_SPRITE_NAME.to_string(), 0);
        Self {
            sprite_width: tile_info.width,
            sprite_height: tile_info.height,
            pixelscale: tile_info.pixelscale.clone(),
            name_to_index,
            counter: 0,
            processed_ids: HashSet::new(),
            unreferenced_main: Vec::new(),
            unreferenced_filler: Vec::new(),
        }
    }

    /// Assign the next index to `name` and record it as unreferenced.
    pub fn register(
        &mut self,
        name: &str,
        category: SpriteCategory,
    ) -> std::result::Result<u32, DuplicateSprite> {
        if self.name_to_index.contains_key(name) {
            return Err(DuplicateSprite {
                name: name.to_string(),
            });
        }
        self.counter += 1;
        self.name_to_index.insert(name.to_string(), self.counter);
        self.unreferenced_mut(category).push(name.to_string());
        Ok(self.counter)
    }

    /// Resolve a sprite name to its index, 0 when unknown.
    pub fn resolve(&self, name: &str) -> u32 {
        self.name_to_index.get(name).copied().unwrap_or(0)
    }

    /// Remove `name` from the unreferenced lists. Idempotent.
    pub fn mark_referenced(&mut self, name: &str) {
        self.unreferenced_main.retain(|n| n != name);
        self.unreferenced_filler.retain(|n| n != name);
    }

    /// Current value of the running index counter.
    pub fn counter(&self) -> u32 {
        self.counter
    }

    /// Index the next registered sprite would receive.
    pub fn next_index(&self) -> u32 {
        self.counter + 1
    }

    /// Consume index space for a sheet's trailing padding slots.
    pub fn reserve_padding(&mut self, slots: u32) {
        self.counter += slots;
    }

    /// Record a fully-qualified identifier. Returns false if it was already
    /// emitted somewhere in this run.
    pub fn mark_processed(&mut self, id: &str) -> bool {
        self.processed_ids.insert(id.to_string())
    }

    pub fn is_processed(&self, id: &str) -> bool {
        self.processed_ids.contains(id)
    }

    /// Drain the unreferenced list for one category.
    ///
    /// With `synthesize`, the remaining names are handed back so the caller
    /// can create identity entries for them. Without it, each name is
    /// reported (error when a tile entry exists elsewhere for the same
    /// identifier, warning otherwise) and the result is empty.
    pub fn drain_unreferenced(
        &mut self,
        category: SpriteCategory,
        synthesize: bool,
        reporter: &mut Reporter,
        conf_file: &str,
    ) -> Result<Vec<String>> {
        let names = std::mem::take(self.unreferenced_mut(category));
        if synthesize {
            return Ok(names);
        }

        for name in &names {
            if self.processed_ids.contains(name) {
                reporter.error(&format!(
                    "{name}.png not used when {name} ID is mentioned in a tile entry"
                ))?;
            } else {
                reporter.warning(&format!(
                    "sprite filename {name} was not used in any {category} {conf_file} entries"
                ));
            }
        }
        Ok(Vec::new())
    }

    fn unreferenced_mut(&mut self, category: SpriteCategory) -> &mut Vec<String> {
        match category {
            SpriteCategory::Main => &mut self.unreferenced_main,
            SpriteCategory::Filler => &mut self.unreferenced_filler,
        }
    }
}
