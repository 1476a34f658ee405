//! Image inference pipeline module
//!
//! This module runs fixed-resolution ONNX image models over hyperstacks of
//! any size, with separate modules for the image container, model access,
//! tensor conversion, tiling, the per-slice inference loop, TIFF I/O and
//! run orchestration.

pub mod codec;
pub mod common;
pub mod conversions;
pub mod hyperstack;
pub mod inference;
pub mod model;
pub mod tiff;
pub mod tiling;

pub use common::{
    PipelineError,
    PipelineTimings,
    Result,
};

pub use hyperstack::{
    BitDepth,
    Dimensions,
    Image,
    PixelBuffer,
};

pub use model::{
    InferenceSession,
    ModelShape,
    OrtSession,
    TensorShape,
};

pub use codec::ClassSelection;

pub use tiling::{
    TileGeometry,
    TileOrchestrator,
    TilePlan,
};

pub use inference::SliceInferenceLoop;

pub use tiff::{
    StackHints,
    StackReader,
    StandardTiffReader,
    StandardTiffWriter,
    TiffCompression,
    TiffWriter,
};

pub use conversions::{
    InferenceConfig,
    InferenceConfigBuilder,
    OnnxModelPipeline,
    run_model,
};
