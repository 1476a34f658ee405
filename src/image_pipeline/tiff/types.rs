//! TIFF hyperstack I/O configuration types

use std::str::FromStr;

use crate::image_pipeline::common::error::PipelineError;

/// TIFF compression methods
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TiffCompression {
    /// No compression (fastest, largest file)
    #[default]
    None,
    /// LZW compression (slow, good compression)
    Lzw,
    /// Deflate compression - fast level (good speed/size balance)
    DeflateFast,
    /// Deflate compression - best compression (slower)
    DeflateBest,
    /// Deflate compression - balanced
    DeflateBalanced,
}

impl FromStr for TiffCompression {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "none" => Ok(TiffCompression::None),
            "lzw" => Ok(TiffCompression::Lzw),
            "deflate-fast" => Ok(TiffCompression::DeflateFast),
            "deflate" | "deflate-balanced" => Ok(TiffCompression::DeflateBalanced),
            "deflate-best" => Ok(TiffCompression::DeflateBest),
            other => Err(PipelineError::UnsupportedFormat(format!(
                "unknown TIFF compression '{other}'"
            ))),
        }
    }
}

/// Axis sizes to assume when a TIFF carries no ImageJ hyperstack description.
///
/// Unset axes are derived from the page count: one channel and one frame,
/// with every remaining page treated as a depth slice.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StackHints {
    pub channels: Option<usize>,
    pub slices: Option<usize>,
    pub frames: Option<usize>,
}

impl StackHints {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn channels(mut self, channels: usize) -> Self {
        self.channels = Some(channels);
        self
    }

    pub fn slices(mut self, slices: usize) -> Self {
        self.slices = Some(slices);
        self
    }

    pub fn frames(mut self, frames: usize) -> Self {
        self.frames = Some(frames);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_none() && self.slices.is_none() && self.frames.is_none()
    }

    /// Resolves (channels, slices, frames) for `pages` planes.
    pub fn resolve(&self, pages: usize) -> Result<(usize, usize, usize), PipelineError> {
        let channels = self.channels.unwrap_or(1);
        let frames = self.frames.unwrap_or(1);
        let slices = match self.slices {
            Some(slices) => slices,
            None if channels * frames > 0 => pages / (channels * frames),
            None => 0,
        };
        if channels * slices * frames != pages || pages == 0 {
            return Err(PipelineError::InvalidDimensions(format!(
                "{pages} pages cannot be arranged as {channels} channels x {slices} slices x {frames} frames"
            )));
        }
        Ok((channels, slices, frames))
    }
}
