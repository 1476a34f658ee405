use crate::image_pipeline::common::error::Result;
use crate::image_pipeline::hyperstack::Image;
use crate::image_pipeline::tiling::geometry::TileGeometry;
use crate::image_pipeline::tiling::tiler;

/// Reassembles a per-tile output stack into the final image.
///
/// `geometry` is the arrangement the input was tiled with, or `None` when the
/// input was passed through untiled, in which case the stack is already the
/// final image.
pub fn stitch_output(stack: Image, geometry: Option<&TileGeometry>, name: &str) -> Result<Image> {
    match geometry {
        Some(geometry) => tiler::stitch(&stack, geometry, name),
        None => Ok(stack.with_name(name)),
    }
}
