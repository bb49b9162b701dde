//! Tile-entry parsing and normalization.
//!
//! Raw tile entries arrive as JSON objects mapping one or more identifiers
//! to foreground/background sprite *names*. Normalization resolves every
//! name to its registry index, recursing into `additional_tiles`, and
//! deduplicates identifiers across the whole run. The polymorphic layer
//! shapes (bare name, list of names, weighted variants with rotation
//! frames) are decoded once into closed unions at the serde boundary and
//! handled exhaustively after that.

use std::path::Path;

use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};

use crate::config::ComposeOptions;
use crate::diagnostics::Reporter;
use crate::error::Result;
use crate::output::display_path;
use crate::registry::SpriteRegistry;

/// One identifier or several; a single-element list collapses to the bare
/// form on output.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum IdList {
    One(String),
    Many(Vec<String>),
}

impl IdList {
    pub fn into_vec(self) -> Vec<String> {
        match self {
            IdList::One(id) => vec![id],
            IdList::Many(ids) => ids,
        }
    }

    /// Compact form: exactly one identifier becomes a bare scalar.
    pub fn from_vec(mut ids: Vec<String>) -> Self {
        if ids.len() == 1 {
            IdList::One(ids.remove(0))
        } else {
            IdList::Many(ids)
        }
    }
}

/// A foreground or background specification as authored.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum LayerSpec {
    /// `"bg": "t_grass"`
    Name(String),
    /// `"fg": ["f_fridge_S", {"weight": 2, "sprite": "f_fridge_alt"}]`
    Parts(Vec<LayerPart>),
}

impl LayerSpec {
    /// An empty string or empty list counts as no layer at all.
    pub fn is_blank(&self) -> bool {
        match self {
            LayerSpec::Name(name) => name.is_empty(),
            LayerSpec::Parts(parts) => parts.is_empty(),
        }
    }
}

/// One element of a layer list.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum LayerPart {
    Name(String),
    Variant(WeightedVariant),
}

/// A weighted random variant; `sprite` may carry an ordered list of fixed
/// rotation frames.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct WeightedVariant {
    #[serde(default)]
    pub sprite: Option<SpriteNames>,
    /// Remaining keys (`weight`, ...) pass through untouched.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum SpriteNames {
    One(String),
    Rotations(Vec<String>),
}

/// A tile entry as read from a descriptor file, before index resolution.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct RawTileEntry {
    #[serde(default)]
    pub id: Option<IdList>,
    #[serde(default)]
    pub fg: Option<LayerSpec>,
    #[serde(default)]
    pub bg: Option<LayerSpec>,
    #[serde(default)]
    pub additional_tiles: Option<Vec<RawTileEntry>>,
    /// Unknown keys are preserved and re-emitted as-is.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A resolved fg/bg layer. Serializes a single element bare, several as an
/// ordered list; an empty layer (every reference unresolved) stays an empty
/// list.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedLayer(pub Vec<ResolvedPart>);

impl Serialize for ResolvedLayer {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self.0.as_slice() {
            [single] => single.serialize(serializer),
            parts => parts.serialize(serializer),
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(untagged)]
pub enum ResolvedPart {
    Index(u32),
    Variant(ResolvedVariant),
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ResolvedVariant {
    pub sprite: SpriteIndexes,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Resolved rotation frames. Order is load-bearing; never reordered or
/// deduplicated.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(untagged)]
pub enum SpriteIndexes {
    One(u32),
    Rotations(Vec<u32>),
}

impl SpriteIndexes {
    fn from_vec(mut indexes: Vec<u32>) -> Self {
        if indexes.len() == 1 {
            SpriteIndexes::One(indexes.remove(0))
        } else {
            SpriteIndexes::Rotations(indexes)
        }
    }
}

/// An index-resolved, deduplicated tile entry ready for the document.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct NormalizedEntry {
    pub id: IdList,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fg: Option<ResolvedLayer>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bg: Option<ResolvedLayer>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub additional_tiles: Option<Vec<NormalizedEntry>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl NormalizedEntry {
    /// Identity entry for an unreferenced sprite: `{"id": name, "fg": index}`.
    pub fn identity(name: &str, index: u32) -> Self {
        Self {
            id: IdList::One(name.to_string()),
            fg: Some(ResolvedLayer(vec![ResolvedPart::Index(index)])),
            bg: None,
            additional_tiles: None,
            extra: Map::new(),
        }
    }
}

/// Converts raw entries for one sheet, consulting the shared registry.
pub struct EntryNormalizer<'a> {
    registry: &'a mut SpriteRegistry,
    options: &'a ComposeOptions,
    /// Output document name, used in unresolved-reference messages.
    conf_file: &'a str,
    is_filler: bool,
}

impl<'a> EntryNormalizer<'a> {
    pub fn new(
        registry: &'a mut SpriteRegistry,
        options: &'a ComposeOptions,
        conf_file: &'a str,
        is_filler: bool,
    ) -> Self {
        Self {
            registry,
            options,
            conf_file,
            is_filler,
        }
    }

    /// Convert one raw entry. `None` means the entry was dropped.
    pub fn convert(
        &mut self,
        entry: &RawTileEntry,
        source: &Path,
        reporter: &mut Reporter,
    ) -> Result<Option<NormalizedEntry>> {
        self.convert_with_prefix(entry, "", source, reporter)
    }

    fn convert_with_prefix(
        &mut self,
        entry: &RawTileEntry,
        id_prefix: &str,
        source: &Path,
        reporter: &mut Reporter,
    ) -> Result<Option<NormalizedEntry>> {
        let ids = entry
            .id
            .clone()
            .map(IdList::into_vec)
            .unwrap_or_default();

        let fg_present = entry.fg.as_ref().is_some_and(|layer| !layer.is_blank());
        let bg_present = entry.bg.as_ref().is_some_and(|layer| !layer.is_blank());

        if ids.is_empty() || (!fg_present && !bg_present) {
            let id_note = if ids.is_empty() {
                String::new()
            } else {
                format!(" with IDs {}{}", id_prefix, ids.join(", "))
            };
            reporter.warning(&format!(
                "skipping empty entry in {}{}",
                display_path(source),
                id_note
            ));
            return Ok(None);
        }

        let fg = if fg_present {
            Some(self.convert_layer(entry.fg.as_ref().unwrap(), source, reporter)?)
        } else {
            None
        };
        let bg = if bg_present {
            Some(self.convert_layer(entry.bg.as_ref().unwrap(), source, reporter)?)
        } else {
            None
        };

        // Nested identifiers are qualified by the first parent identifier,
        // taken before deduplication.
        let additional_tiles = match &entry.additional_tiles {
            Some(children) => {
                let child_prefix = format!("{}_", ids[0]);
                let mut converted = Vec::new();
                for child in children {
                    if let Some(entry) =
                        self.convert_with_prefix(child, &child_prefix, source, reporter)?
                    {
                        converted.push(entry);
                    }
                }
                Some(converted)
            }
            None => None,
        };

        // Run-wide identifier dedup; the entry survives as long as one
        // identifier remains.
        let mut kept = Vec::new();
        for id in ids {
            let full_id = format!("{}{}", id_prefix, id);
            if self.registry.mark_processed(&full_id) {
                kept.push(id);
            } else if self.is_filler {
                if self.options.obsolete_fillers {
                    reporter.warning(&format!(
                        "skipping filler for {} from {}",
                        full_id,
                        display_path(source)
                    ));
                }
            } else {
                reporter.error(&format!(
                    "{} encountered more than once, last time in {}",
                    full_id,
                    display_path(source)
                ))?;
            }
        }

        if kept.is_empty() {
            return Ok(None);
        }

        Ok(Some(NormalizedEntry {
            id: IdList::from_vec(kept),
            fg,
            bg,
            additional_tiles,
            extra: entry.extra.clone(),
        }))
    }

    fn convert_layer(
        &mut self,
        layer: &LayerSpec,
        source: &Path,
        reporter: &mut Reporter,
    ) -> Result<ResolvedLayer> {
        let mut resolved = Vec::new();
        match layer {
            LayerSpec::Name(name) => {
                self.append_sprite(name, &mut resolved, source, reporter)?;
            }
            LayerSpec::Parts(parts) => {
                for part in parts {
                    match part {
                        LayerPart::Name(name) => {
                            self.append_sprite(name, &mut resolved, source, reporter)?;
                        }
                        LayerPart::Variant(variant) => {
                            if let Some(converted) =
                                self.convert_variant(variant, source, reporter)?
                            {
                                resolved.push(ResolvedPart::Variant(converted));
                            }
                        }
                    }
                }
            }
        }
        Ok(ResolvedLayer(resolved))
    }

    /// A variant is kept only when at least one of its names resolved.
    fn convert_variant(
        &mut self,
        variant: &WeightedVariant,
        source: &Path,
        reporter: &mut Reporter,
    ) -> Result<Option<ResolvedVariant>> {
        let names: Vec<&str> = match &variant.sprite {
            Some(SpriteNames::One(name)) => vec![name.as_str()],
            Some(SpriteNames::Rotations(names)) => names.iter().map(String::as_str).collect(),
            None => Vec::new(),
        };

        let mut indexes = Vec::new();
        for name in names {
            if let Some(index) = self.resolve_sprite(name, source, reporter)? {
                indexes.push(index);
            }
        }

        if indexes.is_empty() {
            return Ok(None);
        }
        Ok(Some(ResolvedVariant {
            sprite: SpriteIndexes::from_vec(indexes),
            extra: variant.extra.clone(),
        }))
    }

    fn append_sprite(
        &mut self,
        name: &str,
        resolved: &mut Vec<ResolvedPart>,
        source: &Path,
        reporter: &mut Reporter,
    ) -> Result<()> {
        if let Some(index) = self.resolve_sprite(name, source, reporter)? {
            resolved.push(ResolvedPart::Index(index));
        }
        Ok(())
    }

    /// Resolve a name via the registry, marking it referenced on success.
    /// An unresolved name drops just that one reference.
    fn resolve_sprite(
        &mut self,
        name: &str,
        source: &Path,
        reporter: &mut Reporter,
    ) -> Result<Option<u32>> {
        if name.is_empty() {
            return Ok(None);
        }
        let index = self.registry.resolve(name);
        if index != 0 {
            self.registry.mark_referenced(name);
            return Ok(Some(index));
        }
        reporter.error(&format!(
            "{name}.png file for {name} value from {path} was not found. \
             It will not be added to {conf}",
            path = display_path(source),
            conf = self.conf_file,
        ))?;
        Ok(None)
    }
}
