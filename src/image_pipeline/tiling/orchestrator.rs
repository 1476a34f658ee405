use tracing::{debug, warn};

use crate::image_pipeline::common::error::Result;
use crate::image_pipeline::hyperstack::Image;
use crate::image_pipeline::model::TensorShape;
use crate::image_pipeline::tiling::geometry::TileGeometry;
use crate::image_pipeline::tiling::tiler;

/// How the input is presented to the model.
#[derive(Debug)]
pub enum TilePlan<'a> {
    /// The input was partitioned; every tile is a frame of `image`.
    Tiled { image: Image, geometry: TileGeometry },
    /// The input is already tile-sized and is used unchanged.
    PassThrough(&'a Image),
}

impl TilePlan<'_> {
    pub fn image(&self) -> &Image {
        match self {
            TilePlan::Tiled { image, .. } => image,
            TilePlan::PassThrough(image) => image,
        }
    }

    pub fn geometry(&self) -> Option<&TileGeometry> {
        match self {
            TilePlan::Tiled { geometry, .. } => Some(geometry),
            TilePlan::PassThrough(_) => None,
        }
    }
}

/// Decides whether an image must be tiled to fit the model input.
#[derive(Debug, Clone, Copy)]
pub struct TileOrchestrator {
    overlap: usize,
}

impl TileOrchestrator {
    pub fn new(overlap: usize) -> Self {
        Self { overlap }
    }

    /// Tiles `image` if it is wider or taller than the model input, passes it
    /// through if one side already matches, and returns `None` (with a
    /// warning) if it is smaller on both axes.
    pub fn plan<'a>(&self, image: &'a Image, input: &TensorShape) -> Result<Option<TilePlan<'a>>> {
        let (width, height) = (image.width(), image.height());

        if width > input.width || height > input.height {
            let geometry =
                TileGeometry::new(width, height, input.width, input.height, self.overlap)?;
            let tiled = tiler::tile(image, &geometry)?;
            return Ok(Some(TilePlan::Tiled {
                image: tiled,
                geometry,
            }));
        }

        if width == input.width || height == input.height {
            debug!(width, height, "Input already matches the model tile size");
            return Ok(Some(TilePlan::PassThrough(image)));
        }

        warn!(
            "Input image smaller than minimum size of width = {}px and height = {}px",
            input.width, input.height
        );
        Ok(None)
    }
}
