//! Tile partition and stitch primitives.
//!
//! Tiles are stacked along the frame axis: frame `t` of the source becomes
//! frames `t * n .. (t + 1) * n` of the tiled image, one per tile in
//! row-major order. Samples outside the source image are zero.

use tracing::debug;

use crate::image_pipeline::common::error::{PipelineError, Result};
use crate::image_pipeline::hyperstack::{Dimensions, Image};
use crate::image_pipeline::tiling::geometry::TileGeometry;

pub fn tile(image: &Image, geometry: &TileGeometry) -> Result<Image> {
    let source = image.dims();
    if source.width != geometry.full_width || source.height != geometry.full_height {
        return Err(PipelineError::ShapeMismatch(format!(
            "image is {}x{} but the tile geometry covers {}x{}",
            source.width, source.height, geometry.full_width, geometry.full_height
        )));
    }

    let count = geometry.tile_count();
    let tiled = Dimensions::new(
        source.channels,
        geometry.tile_width,
        geometry.tile_height,
        source.slices,
        source.frames * count,
    );
    debug!(
        x_tiles = geometry.x_tiles,
        y_tiles = geometry.y_tiles,
        tiled = %tiled,
        "Tiling image"
    );

    let pixels = image.pixels().gather(tiled.len(), |i| {
        let (c, x, y, z, frame) = tiled.position(i);
        let (t, tile) = (frame / count, frame % count);
        let (xi, yi) = geometry.tile_position(tile);
        let (ox, oy) = geometry.tile_origin(xi, yi);
        let (sx, sy) = (ox + x, oy + y);
        (sx < source.width && sy < source.height).then(|| source.index(c, sx, sy, z, t))
    });

    Image::new(image.name(), tiled, pixels)
}

/// Inverse of [`tile`]. Each output pixel is copied from the tile that owns
/// it; seams sit in the middle of each overlap band.
pub fn stitch(tiled: &Image, geometry: &TileGeometry, name: &str) -> Result<Image> {
    let source = tiled.dims();
    let count = geometry.tile_count();
    if source.width != geometry.tile_width || source.height != geometry.tile_height {
        return Err(PipelineError::ShapeMismatch(format!(
            "tiles are {}x{} but the tile geometry expects {}x{}",
            source.width, source.height, geometry.tile_width, geometry.tile_height
        )));
    }
    if source.frames % count != 0 {
        return Err(PipelineError::ShapeMismatch(format!(
            "{} tiled frames are not a multiple of {} tiles",
            source.frames, count
        )));
    }

    let stitched = Dimensions::new(
        source.channels,
        geometry.full_width,
        geometry.full_height,
        source.slices,
        source.frames / count,
    );
    debug!(stitched = %stitched, tiles = count, "Stitching tiles");

    let pixels = tiled.pixels().gather(stitched.len(), |i| {
        let (c, x, y, z, t) = stitched.position(i);
        let (xi, lx) = geometry.owner_x(x);
        let (yi, ly) = geometry.owner_y(y);
        let frame = t * count + geometry.tile_index(xi, yi);
        Some(source.index(c, lx, ly, z, frame))
    });

    Image::new(name, stitched, pixels)
}
