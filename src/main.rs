use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};

use onnx_tiler_rs::image_pipeline::{
    BitDepth, ClassSelection, InferenceConfig, OnnxModelPipeline, StackHints, TiffCompression,
    conversions::DEFAULT_TILE_OVERLAP,
};
use onnx_tiler_rs::logger;

/// Run a fixed-resolution ONNX image model over a TIFF hyperstack of any size
#[derive(Parser, Debug)]
#[command(name = "onnx-tiler", version, about)]
struct Args {
    /// Input TIFF hyperstack
    input: PathBuf,

    /// Output TIFF path for the probability map
    output: PathBuf,

    /// ONNX model file
    #[arg(short, long)]
    model: PathBuf,

    /// Output bit depth (8, 16 or 32)
    #[arg(short, long, default_value = "32")]
    bit_depth: BitDepth,

    /// Pixels shared between neighbouring tiles
    #[arg(long, default_value_t = DEFAULT_TILE_OVERLAP)]
    overlap: usize,

    /// 1-based output classes to keep, in order, e.g. "3,1"
    #[arg(short, long)]
    classes: Option<ClassSelection>,

    /// Channel count, for input without an ImageJ description
    #[arg(long)]
    channels: Option<usize>,

    /// Slice count, for input without an ImageJ description
    #[arg(long)]
    slices: Option<usize>,

    /// Frame count, for input without an ImageJ description
    #[arg(long)]
    frames: Option<usize>,

    /// Name of the model's input tensor
    #[arg(long, default_value = "input")]
    input_tensor: String,

    /// Name of the model's output tensor
    #[arg(long, default_value = "target")]
    output_tensor: String,

    /// Output compression: none, lzw, deflate, deflate-fast, deflate-best
    #[arg(long, default_value = "none")]
    compression: TiffCompression,

    /// Inference sessions to run in parallel
    #[arg(short = 'j', long, default_value_t = 1)]
    threads: usize,

    /// Enable debug logging and stage timings
    #[arg(short, long)]
    verbose: bool,
}

impl Args {
    fn stack_hints(&self) -> StackHints {
        let mut hints = StackHints::new();
        if let Some(channels) = self.channels {
            hints = hints.channels(channels);
        }
        if let Some(slices) = self.slices {
            hints = hints.slices(slices);
        }
        if let Some(frames) = self.frames {
            hints = hints.frames(frames);
        }
        hints
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    logger::init(if args.verbose { "debug" } else { "info" });

    info!("Starting onnx-tiler...");

    let config = InferenceConfig::builder()
        .bit_depth(args.bit_depth)
        .tile_overlap(args.overlap)
        .class_selection(args.classes.clone())
        .input_tensor(args.input_tensor.as_str())
        .output_tensor(args.output_tensor.as_str())
        .compression(args.compression)
        .stack_hints(args.stack_hints())
        .build();

    let mut pipeline = OnnxModelPipeline::with_workers(&args.model, config, args.threads)
        .with_context(|| format!("failed to load model {}", args.model.display()))?;

    info!("Model pipeline initialized with {} session(s)", pipeline.sessions().len());
    if let Some(session) = pipeline.sessions().first() {
        info!("Tensors: {} -> {}", session.input_name(), session.output_name());
    }
    info!("Output bit depth: {}", pipeline.config().bit_depth);
    info!("Compression: {:?}", pipeline.config().compression);
    if let Some(classes) = &pipeline.config().class_selection {
        info!("Classes: {}", classes);
    }

    let produced = pipeline
        .convert_file(&args.input, &args.output, |completed, total| {
            info!("Processed {}/{} positions", completed, total);
        })
        .with_context(|| format!("failed to process {}", args.input.display()))?;

    if produced {
        info!("Wrote {}", args.output.display());
    } else {
        warn!("Input too small for the model, no output written");
    }

    Ok(())
}
