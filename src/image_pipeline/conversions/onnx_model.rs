use std::io::Write;
use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};

use tracing::{info, info_span, instrument};

use crate::image_pipeline::{
    common::error::{PipelineError, Result},
    common::timing::{PipelineTimings, Timer},
    conversions::types::InferenceConfig,
    hyperstack::Image,
    inference::SliceInferenceLoop,
    model::{InferenceSession, ModelShape, OrtSession},
    tiff::{StackReader, StandardTiffReader, StandardTiffWriter, TiffWriter},
    tiling::{TileOrchestrator, stitch_output},
};

/// Runs an image model over hyperstacks of any size.
///
/// Images larger than the model input are tiled, every (slice, frame) is run
/// through the model and the per-tile probability maps are stitched back to
/// full resolution. With more than one session the slices are spread over a
/// worker pool, one worker per session.
pub struct OnnxModelPipeline<S, R = StandardTiffReader, W = StandardTiffWriter>
where
    S: InferenceSession,
    R: StackReader,
    W: TiffWriter,
{
    sessions: Vec<S>,
    reader: R,
    writer: W,
    config: InferenceConfig,
    cancel: Arc<AtomicBool>,
}

impl OnnxModelPipeline<OrtSession> {
    /// Loads the model at `model_path` into a single ONNX Runtime session.
    pub fn new<P: AsRef<Path>>(model_path: P, config: InferenceConfig) -> Result<Self> {
        Self::with_workers(model_path, config, 1)
    }

    /// Loads `workers` independent sessions of the same model. Slices are
    /// processed in parallel when `workers > 1`.
    pub fn with_workers<P: AsRef<Path>>(
        model_path: P,
        config: InferenceConfig,
        workers: usize,
    ) -> Result<Self> {
        let model_path = model_path.as_ref();
        let sessions = (0..workers.max(1))
            .map(|_| OrtSession::open(model_path, &config.input_tensor, &config.output_tensor))
            .collect::<Result<Vec<_>>>()?;
        Self::with_custom(sessions, StandardTiffReader, StandardTiffWriter, config)
    }
}

impl<S: InferenceSession> OnnxModelPipeline<S> {
    pub fn with_session(session: S, config: InferenceConfig) -> Self {
        Self {
            sessions: vec![session],
            reader: StandardTiffReader,
            writer: StandardTiffWriter,
            config,
            cancel: Arc::new(AtomicBool::new(false)),
        }
    }
}

impl<S, R, W> OnnxModelPipeline<S, R, W>
where
    S: InferenceSession + Send,
    R: StackReader,
    W: TiffWriter,
{
    pub fn with_custom(sessions: Vec<S>, reader: R, writer: W, config: InferenceConfig) -> Result<Self> {
        if sessions.is_empty() {
            return Err(PipelineError::Inference(
                "pipeline needs at least one inference session".to_string(),
            ));
        }
        Ok(Self {
            sessions,
            reader,
            writer,
            config,
            cancel: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Runs the model over `input`.
    ///
    /// `progress(completed, total)` is called after each (slice, frame)
    /// position. Returns `Ok(None)` when the image is smaller than the model
    /// input on both axes.
    pub fn run<F>(&mut self, input: &Image, progress: F) -> Result<Option<Image>>
    where
        F: FnMut(usize, usize) + Send,
    {
        self.run_with_timings(input, progress).map(|(output, _)| output)
    }

    #[instrument(skip_all, fields(image = input.name(), dims = %input.dims()))]
    pub fn run_with_timings<F>(
        &mut self,
        input: &Image,
        mut progress: F,
    ) -> Result<(Option<Image>, PipelineTimings)>
    where
        F: FnMut(usize, usize) + Send,
    {
        let mut timings = PipelineTimings::new();
        info!("Starting model inference");

        let timer = Timer::start("inspect_model");
        let shape = {
            let _span = info_span!("inspect_model").entered();
            ModelShape::inspect(&self.sessions[0])?
        };
        if let Some(selection) = &self.config.class_selection {
            selection.validate(shape.output.channels)?;
        }
        timings.record(timer);
        info!(input = %shape.input, output = %shape.output, "Model shape");

        let timer = Timer::start("tile");
        let plan = {
            let _span = info_span!("tile", overlap = self.config.tile_overlap).entered();
            TileOrchestrator::new(self.config.tile_overlap).plan(input, &shape.input)?
        };
        timings.record(timer);
        let Some(plan) = plan else {
            return Ok((None, timings));
        };

        let timer = Timer::start("inference");
        let slice_loop = SliceInferenceLoop::new(
            shape,
            self.config.bit_depth,
            self.config.class_selection.as_ref(),
        )
        .with_cancellation(&self.cancel);
        let stack = if self.sessions.len() == 1 {
            slice_loop.run(&mut self.sessions[0], plan.image(), &mut progress)?
        } else {
            let progress = Mutex::new(&mut progress);
            slice_loop.run_parallel(&mut self.sessions, plan.image(), |completed, total| {
                if let Ok(mut report) = progress.lock() {
                    (**report)(completed, total);
                }
            })?
        };
        timings.record(timer);

        let timer = Timer::start("stitch");
        let output = {
            let _span = info_span!("stitch").entered();
            stitch_output(stack, plan.geometry(), &self.config.output_name)?
        };
        timings.record(timer);

        info!(
            name = output.name(),
            dims = %output.dims(),
            ms = timings.total_duration().as_secs_f64() * 1000.0,
            "Inference complete"
        );
        timings.log_summary();
        Ok((Some(output), timings))
    }

    /// Decodes a TIFF hyperstack from `input_data`, runs the model and
    /// encodes the result to `output`. Returns `false` without writing
    /// anything when the image is too small for the model.
    #[instrument(skip_all, fields(input_size = input_data.len()))]
    pub fn convert<F>(
        &mut self,
        name: &str,
        input_data: &[u8],
        output: &mut dyn Write,
        progress: F,
    ) -> Result<bool>
    where
        F: FnMut(usize, usize) + Send,
    {
        let image = self.read(name, input_data)?;
        match self.run(&image, progress)? {
            Some(result) => {
                self.write(&result, output)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// File counterpart of [`OnnxModelPipeline::convert`]. The output file
    /// is only created once inference has produced an image.
    #[instrument(skip(self, input_path, output_path, progress))]
    pub fn convert_file<P, Q, F>(&mut self, input_path: P, output_path: Q, progress: F) -> Result<bool>
    where
        P: AsRef<Path>,
        Q: AsRef<Path>,
        F: FnMut(usize, usize) + Send,
    {
        let input_path = input_path.as_ref();
        let output_path = output_path.as_ref();

        info!(
            input = %input_path.display(),
            output = %output_path.display(),
            "Converting file"
        );

        let input_data = {
            let _span = info_span!("read_input_file").entered();
            std::fs::read(input_path).map_err(|e| {
                PipelineError::InputReadError(format!("{}: {}", input_path.display(), e))
            })?
        };
        let name = input_path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| input_path.display().to_string());

        let image = self.read(&name, &input_data)?;
        let Some(result) = self.run(&image, progress)? else {
            return Ok(false);
        };

        let mut output_file = {
            let _span = info_span!("create_output_file").entered();
            std::fs::File::create(output_path).map_err(|e| {
                PipelineError::OutputWriteError(format!("{}: {}", output_path.display(), e))
            })?
        };
        self.write(&result, &mut output_file)?;

        Ok(true)
    }

    fn read(&self, name: &str, data: &[u8]) -> Result<Image> {
        let _span = info_span!("decode_tiff").entered();
        self.reader.read_stack(name, data, &self.config.stack_hints)
    }

    fn write(&self, image: &Image, output: &mut dyn Write) -> Result<()> {
        let _span = info_span!("encode_tiff").entered();
        self.writer.write_stack(image, output, self.config.compression)
    }

    /// Flag that stops a run before its next (slice, frame) position once
    /// set. It stays set until the caller clears it.
    pub fn cancellation_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancel)
    }

    pub fn sessions(&self) -> &[S] {
        &self.sessions
    }

    pub fn config(&self) -> &InferenceConfig {
        &self.config
    }

    pub fn set_config(&mut self, config: InferenceConfig) {
        self.config = config;
    }
}

/// Loads the model at `model_path` and runs it once over `input`.
///
/// Returns `Ok(None)` when the image is smaller than the model input on both
/// axes.
pub fn run_model<P, F>(
    input: &Image,
    model_path: P,
    config: &InferenceConfig,
    progress: F,
) -> Result<Option<Image>>
where
    P: AsRef<Path>,
    F: FnMut(usize, usize) + Send,
{
    let mut pipeline = OnnxModelPipeline::new(model_path, config.clone())?;
    pipeline.run(input, progress)
}
