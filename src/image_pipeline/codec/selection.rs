use std::fmt;
use std::str::FromStr;

use crate::image_pipeline::common::error::{PipelineError, Result};

/// Ordered subset of a model's output channels, as 1-based indices.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassSelection(Vec<usize>);

impl ClassSelection {
    pub fn new(indices: Vec<usize>) -> Result<Self> {
        if indices.is_empty() {
            return Err(PipelineError::InvalidClassSelection(
                "at least one class is required".to_string(),
            ));
        }
        if let Some(&zero) = indices.iter().find(|&&i| i == 0) {
            return Err(PipelineError::InvalidClassSelection(format!(
                "class {zero} is out of range, classes are numbered from 1"
            )));
        }
        Ok(Self(indices))
    }

    pub fn indices(&self) -> &[usize] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Zero-based tensor channel for each emitted output channel.
    pub fn tensor_channels(&self) -> impl Iterator<Item = usize> + '_ {
        self.0.iter().map(|&i| i - 1)
    }

    /// Checks every index against a model with `channel_count` output channels.
    pub fn validate(&self, channel_count: usize) -> Result<()> {
        match self.0.iter().find(|&&i| i > channel_count) {
            Some(i) => Err(PipelineError::InvalidClassSelection(format!(
                "class {i} requested but the model only outputs {channel_count} classes"
            ))),
            None => Ok(()),
        }
    }
}

/// Channel count of the emitted image for an optional selection.
pub fn selected_channel_count(selection: Option<&ClassSelection>, native_channels: usize) -> usize {
    selection.map_or(native_channels, ClassSelection::len)
}

impl FromStr for ClassSelection {
    type Err = PipelineError;

    /// Parses a comma separated list such as `"3, 1"`.
    fn from_str(s: &str) -> Result<Self> {
        let indices = s
            .trim()
            .split(',')
            .map(|part| {
                let part = part.trim();
                part.parse::<usize>().map_err(|_| {
                    PipelineError::InvalidClassSelection(format!("'{part}' is not a class number"))
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Self::new(indices)
    }
}

impl fmt::Display for ClassSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.0.iter().map(|i| i.to_string()).collect();
        write!(f, "{}", parts.join(","))
    }
}
