use crate::image_pipeline::common::error::{PipelineError, Result};

/// Minimum number of tiles of `tile` pixels, overlapping by `overlap`, that
/// cover `full` pixels: the smallest `n >= 1` with
/// `n * (tile - overlap) + overlap >= full`.
///
/// Requires `tile > overlap`.
pub fn tile_count(full: usize, overlap: usize, tile: usize) -> usize {
    debug_assert!(tile > overlap);
    if full <= tile {
        return 1;
    }
    let step = tile - overlap;
    (full - overlap).div_ceil(step)
}

/// Tile arrangement over one full-size image.
///
/// Built once when tiling and reused unchanged when stitching.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileGeometry {
    pub full_width: usize,
    pub full_height: usize,
    pub tile_width: usize,
    pub tile_height: usize,
    pub overlap: usize,
    pub x_tiles: usize,
    pub y_tiles: usize,
}

impl TileGeometry {
    pub fn new(
        full_width: usize,
        full_height: usize,
        tile_width: usize,
        tile_height: usize,
        overlap: usize,
    ) -> Result<Self> {
        for tile in [tile_width, tile_height] {
            if overlap >= tile {
                return Err(PipelineError::InvalidOverlap { overlap, tile });
            }
        }
        Ok(Self {
            full_width,
            full_height,
            tile_width,
            tile_height,
            overlap,
            x_tiles: tile_count(full_width, overlap, tile_width),
            y_tiles: tile_count(full_height, overlap, tile_height),
        })
    }

    pub fn tile_count(&self) -> usize {
        self.x_tiles * self.y_tiles
    }

    pub fn step_x(&self) -> usize {
        self.tile_width - self.overlap
    }

    pub fn step_y(&self) -> usize {
        self.tile_height - self.overlap
    }

    /// Row-major tile number, x fastest.
    pub fn tile_index(&self, xi: usize, yi: usize) -> usize {
        yi * self.x_tiles + xi
    }

    /// Tile column and row of a tile number.
    pub fn tile_position(&self, index: usize) -> (usize, usize) {
        (index % self.x_tiles, index / self.x_tiles)
    }

    /// Top-left corner of a tile in full-image coordinates.
    pub fn tile_origin(&self, xi: usize, yi: usize) -> (usize, usize) {
        (xi * self.step_x(), yi * self.step_y())
    }

    /// Column of the tile a stitched full-image column is taken from, with
    /// the column's offset inside that tile.
    pub fn owner_x(&self, x: usize) -> (usize, usize) {
        owner(x, self.step_x(), self.overlap, self.x_tiles)
    }

    /// Row counterpart of [`TileGeometry::owner_x`].
    pub fn owner_y(&self, y: usize) -> (usize, usize) {
        owner(y, self.step_y(), self.overlap, self.y_tiles)
    }
}

// Seams sit half an overlap into the later tile.
fn owner(position: usize, step: usize, overlap: usize, count: usize) -> (usize, usize) {
    let tile = (position.saturating_sub(overlap / 2) / step).min(count - 1);
    (tile, position - tile * step)
}
