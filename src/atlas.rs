//! Atlas image operations.
//!
//! The packing and indexing logic never touches pixels directly; everything
//! image-shaped goes through the [`AtlasBackend`] trait so the pipeline can
//! be exercised with a fake backend in tests. The real backend decodes with
//! the `image` crate and writes atlases as PNG, optionally quantized to an
//! 8-bit colormap (`color_quant` + indexed `png` output).

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use color_quant::NeuQuant;
use image::{ImageFormat, RgbaImage};

use crate::error::{ComposeError, Result};

/// Sample factor for the NeuQuant quantizer. 1 is the slowest, highest
/// quality setting; tilesheets are small enough that speed does not matter.
const QUANT_SAMPLE_FACTOR: i32 = 1;

/// How an atlas file is encoded on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AtlasEncoding {
    /// 32-bit RGBA PNG.
    Rgba,
    /// 8-bit indexed PNG with a quantized colormap.
    Indexed,
}

/// A sheet's sprites arranged for grid joining.
///
/// Cells are fixed at the sheet's sprite size. `None` cells (index-only
/// placeholders or sprites that failed to decode) render as transparent.
pub struct SpriteGrid<'a> {
    pub cell_width: u32,
    pub cell_height: u32,
    pub across: u32,
    pub cells: &'a [Option<RgbaImage>],
}

impl SpriteGrid<'_> {
    /// Number of rows the grid occupies.
    pub fn rows(&self) -> u32 {
        (self.cells.len() as u32).div_ceil(self.across)
    }

    /// Number of columns: a single short row stays short.
    pub fn columns(&self) -> u32 {
        (self.cells.len() as u32).min(self.across)
    }
}

/// Narrow capability interface over external image operations.
pub trait AtlasBackend {
    /// Decode a sprite image, normalized to RGBA8.
    fn decode(&self, path: &Path) -> Result<RgbaImage>;

    /// Grid-join the sprites and persist the atlas at `path`.
    fn write_atlas(&self, grid: &SpriteGrid<'_>, path: &Path, encoding: AtlasEncoding)
        -> Result<()>;
}

/// Production backend over the `image` crate.
#[derive(Debug, Default)]
pub struct ImageBackend;

impl AtlasBackend for ImageBackend {
    fn decode(&self, path: &Path) -> Result<RgbaImage> {
        let image = image::open(path).map_err(|e| ComposeError::Image {
            path: path.to_path_buf(),
            message: format!("cannot load: {}", e),
        })?;
        Ok(image.to_rgba8())
    }

    fn write_atlas(
        &self,
        grid: &SpriteGrid<'_>,
        path: &Path,
        encoding: AtlasEncoding,
    ) -> Result<()> {
        let joined = join_grid(grid);
        match encoding {
            AtlasEncoding::Rgba => joined
                .save_with_format(path, ImageFormat::Png)
                .map_err(|e| ComposeError::Image {
                    path: path.to_path_buf(),
                    message: format!("failed to write atlas: {}", e),
                }),
            AtlasEncoding::Indexed => write_indexed_png(&joined, path),
        }
    }
}

/// Compose sprites into a row-major grid image in slice order.
///
/// The canvas starts fully transparent, so padding slots in the last row
/// hold no pixel data. Oversized sprites are clipped to their cell; a
/// dimension mismatch was already reported during discovery.
pub fn join_grid(grid: &SpriteGrid<'_>) -> RgbaImage {
    if grid.cells.is_empty() {
        return RgbaImage::new(0, 0);
    }

    let mut canvas = RgbaImage::new(
        grid.columns() * grid.cell_width,
        grid.rows() * grid.cell_height,
    );

    for (slot, cell) in grid.cells.iter().enumerate() {
        let Some(sprite) = cell else { continue };
        let origin_x = (slot as u32 % grid.across) * grid.cell_width;
        let origin_y = (slot as u32 / grid.across) * grid.cell_height;

        let copy_width = sprite.width().min(grid.cell_width);
        let copy_height = sprite.height().min(grid.cell_height);
        for y in 0..copy_height {
            for x in 0..copy_width {
                canvas.put_pixel(origin_x + x, origin_y + y, *sprite.get_pixel(x, y));
            }
        }
    }

    canvas
}

/// Quantize to at most 256 colors and write an indexed PNG.
fn write_indexed_png(image: &RgbaImage, path: &Path) -> Result<()> {
    let quantizer = NeuQuant::new(QUANT_SAMPLE_FACTOR, 256, image.as_raw());

    let mut palette = Vec::with_capacity(256 * 3);
    let mut transparency = Vec::with_capacity(256);
    for entry in quantizer.color_map_rgba().chunks_exact(4) {
        palette.extend_from_slice(&entry[..3]);
        transparency.push(entry[3]);
    }

    let indexes: Vec<u8> = image
        .pixels()
        .map(|pixel| quantizer.index_of(&pixel.0) as u8)
        .collect();

    let io_error = |e: String| ComposeError::Image {
        path: path.to_path_buf(),
        message: format!("failed to write indexed atlas: {}", e),
    };

    let file = File::create(path).map_err(|e| io_error(e.to_string()))?;
    let mut encoder = png::Encoder::new(BufWriter::new(file), image.width(), image.height());
    encoder.set_color(png::ColorType::Indexed);
    encoder.set_depth(png::BitDepth::Eight);
    encoder.set_palette(palette);
    encoder.set_trns(transparency);
    encoder.set_compression(png::Compression::Best);

    let mut writer = encoder.write_header().map_err(|e| io_error(e.to_string()))?;
    writer
        .write_image_data(&indexes)
        .map_err(|e| io_error(e.to_string()))?;
    writer.finish().map_err(|e| io_error(e.to_string()))
}
