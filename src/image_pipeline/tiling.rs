//! Tiling module
//!
//! Partitions images larger than the model input into overlapping tiles and
//! stitches per-tile results back to full resolution.

mod orchestrator;
mod stitcher;
pub mod geometry;
pub mod tiler;

pub use geometry::{TileGeometry, tile_count};
pub use orchestrator::{TileOrchestrator, TilePlan};
pub use stitcher::stitch_output;
