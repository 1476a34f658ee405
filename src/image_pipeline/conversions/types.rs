//! Inference run configuration types

use crate::image_pipeline::codec::ClassSelection;
use crate::image_pipeline::hyperstack::BitDepth;
use crate::image_pipeline::model::{DEFAULT_INPUT_TENSOR, DEFAULT_OUTPUT_TENSOR};
use crate::image_pipeline::tiff::{StackHints, TiffCompression};

/// Default tile overlap in pixels.
pub const DEFAULT_TILE_OVERLAP: usize = 64;

/// Configuration for running a model over an image
#[derive(Debug, Clone)]
pub struct InferenceConfig {
    /// Name given to the stitched output image
    pub output_name: String,
    /// Sample precision of the output probability map
    pub bit_depth: BitDepth,
    /// Pixels shared between neighbouring tiles, used for tiling and stitching
    pub tile_overlap: usize,
    /// Output classes to keep, in output order; all classes when `None`
    pub class_selection: Option<ClassSelection>,
    /// Name of the model's input tensor
    pub input_tensor: String,
    /// Name of the model's output tensor
    pub output_tensor: String,
    /// Compression for TIFF output
    pub compression: TiffCompression,
    /// Axis sizes for TIFF input without an ImageJ description
    pub stack_hints: StackHints,
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            output_name: "Output".to_string(),
            bit_depth: BitDepth::ThirtyTwo,
            tile_overlap: DEFAULT_TILE_OVERLAP,
            class_selection: None,
            input_tensor: DEFAULT_INPUT_TENSOR.to_string(),
            output_tensor: DEFAULT_OUTPUT_TENSOR.to_string(),
            compression: TiffCompression::None,
            stack_hints: StackHints::default(),
        }
    }
}

impl InferenceConfig {
    pub fn builder() -> InferenceConfigBuilder {
        InferenceConfigBuilder::default()
    }
}

/// Builder for InferenceConfig
#[derive(Default)]
pub struct InferenceConfigBuilder {
    output_name: Option<String>,
    bit_depth: Option<BitDepth>,
    tile_overlap: Option<usize>,
    class_selection: Option<Option<ClassSelection>>,
    input_tensor: Option<String>,
    output_tensor: Option<String>,
    compression: Option<TiffCompression>,
    stack_hints: Option<StackHints>,
}

impl InferenceConfigBuilder {
    pub fn output_name(mut self, name: impl Into<String>) -> Self {
        self.output_name = Some(name.into());
        self
    }

    pub fn bit_depth(mut self, bit_depth: BitDepth) -> Self {
        self.bit_depth = Some(bit_depth);
        self
    }

    pub fn tile_overlap(mut self, overlap: usize) -> Self {
        self.tile_overlap = Some(overlap);
        self
    }

    pub fn class_selection(mut self, selection: Option<ClassSelection>) -> Self {
        self.class_selection = Some(selection);
        self
    }

    pub fn input_tensor(mut self, name: impl Into<String>) -> Self {
        self.input_tensor = Some(name.into());
        self
    }

    pub fn output_tensor(mut self, name: impl Into<String>) -> Self {
        self.output_tensor = Some(name.into());
        self
    }

    pub fn compression(mut self, compression: TiffCompression) -> Self {
        self.compression = Some(compression);
        self
    }

    pub fn stack_hints(mut self, hints: StackHints) -> Self {
        self.stack_hints = Some(hints);
        self
    }

    pub fn build(self) -> InferenceConfig {
        let default = InferenceConfig::default();
        InferenceConfig {
            output_name: self.output_name.unwrap_or(default.output_name),
            bit_depth: self.bit_depth.unwrap_or(default.bit_depth),
            tile_overlap: self.tile_overlap.unwrap_or(default.tile_overlap),
            class_selection: self.class_selection.unwrap_or(default.class_selection),
            input_tensor: self.input_tensor.unwrap_or(default.input_tensor),
            output_tensor: self.output_tensor.unwrap_or(default.output_tensor),
            compression: self.compression.unwrap_or(default.compression),
            stack_hints: self.stack_hints.unwrap_or(default.stack_hints),
        }
    }
}
