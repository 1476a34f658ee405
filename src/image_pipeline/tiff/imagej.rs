//! ImageJ hyperstack `ImageDescription` tag

use crate::image_pipeline::hyperstack::Dimensions;

const IMAGEJ_VERSION: &str = "1.54f";

/// Builds the description ImageJ uses to recognise a hyperstack.
pub fn describe(dims: &Dimensions) -> String {
    format!(
        "ImageJ={IMAGEJ_VERSION}\nimages={}\nchannels={}\nslices={}\nframes={}\nhyperstack=true\nmode=grayscale\n",
        dims.plane_count(),
        dims.channels,
        dims.slices,
        dims.frames
    )
}

/// Reads (channels, slices, frames) from an ImageJ description.
///
/// Returns `None` for descriptions not written by ImageJ. Missing axes
/// default to 1.
pub fn parse(description: &str) -> Option<(usize, usize, usize)> {
    if !description.starts_with("ImageJ=") {
        return None;
    }
    let field = |key: &str| -> usize {
        description
            .lines()
            .filter_map(|line| line.split_once('='))
            .find(|(k, _)| k.trim() == key)
            .and_then(|(_, v)| v.trim().parse().ok())
            .unwrap_or(1)
    };
    Some((field("channels"), field("slices"), field("frames")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_description_round_trips() {
        let dims = Dimensions::new(3, 64, 32, 5, 2);
        assert_eq!(parse(&describe(&dims)), Some((3, 5, 2)));
    }

    #[test]
    fn test_missing_axes_default_to_one() {
        assert_eq!(parse("ImageJ=1.53t\nimages=4\nslices=4\n"), Some((1, 4, 1)));
    }

    #[test]
    fn test_foreign_description_is_ignored() {
        assert_eq!(parse("Scanned by some microscope"), None);
    }
}
