use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Model introspection failed: {0}")]
    ModelIntrospection(String),

    #[error("Shape mismatch: {0}")]
    ShapeMismatch(String),

    #[error("Inference failed: {0}")]
    Inference(String),

    #[error("Invalid class selection: {0}")]
    InvalidClassSelection(String),

    #[error("Unsupported output bit depth: {0} (expected 8, 16 or 32)")]
    InvalidBitDepth(u32),

    #[error("Tile overlap {overlap}px must be smaller than tile size {tile}px")]
    InvalidOverlap { overlap: usize, tile: usize },

    #[error("Invalid image dimensions: {0}")]
    InvalidDimensions(String),

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("Run cancelled after {completed} of {total} positions")]
    Cancelled { completed: usize, total: usize },

    #[error("Failed to read input file: {0}")]
    InputReadError(String),

    #[error("Failed to write output file: {0}")]
    OutputWriteError(String),

    #[error("Failed to decode TIFF image: {0}")]
    DecodeError(String),

    #[error("Failed to encode TIFF image: {0}")]
    EncodeError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl From<ort::Error> for PipelineError {
    fn from(err: ort::Error) -> Self {
        PipelineError::Inference(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;
