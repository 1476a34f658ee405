//! Per-coordinate inference over a (possibly tiled) hyperstack.
//!
//! Every (slice, frame) coordinate is encoded, run through the model once,
//! decoded and copied into its own region of a preallocated output stack.
//! Regions never overlap, so the parallel variant writes them without
//! synchronization.

use std::sync::{Mutex, MutexGuard};
use std::sync::atomic::{AtomicBool, Ordering};

use ndarray::Array4;
use rayon::prelude::*;
use tracing::{debug, info, instrument};

use crate::image_pipeline::codec::{ClassSelection, decode_output, encode_slice, selected_channel_count};
use crate::image_pipeline::common::error::{PipelineError, Result};
use crate::image_pipeline::hyperstack::{BitDepth, Dimensions, Image, PixelBuffer};
use crate::image_pipeline::model::{InferenceSession, ModelShape};

const STACK_NAME: &str = "Tiled output";

pub struct SliceInferenceLoop<'a> {
    shape: ModelShape,
    bit_depth: BitDepth,
    selection: Option<&'a ClassSelection>,
    cancel: Option<&'a AtomicBool>,
}

impl<'a> SliceInferenceLoop<'a> {
    pub fn new(shape: ModelShape, bit_depth: BitDepth, selection: Option<&'a ClassSelection>) -> Self {
        Self {
            shape,
            bit_depth,
            selection,
            cancel: None,
        }
    }

    /// Stops the loop before the next coordinate once `flag` is set.
    pub fn with_cancellation(mut self, flag: &'a AtomicBool) -> Self {
        self.cancel = Some(flag);
        self
    }

    /// Dimensions of the output stack for `input`.
    pub fn stack_dims(&self, input: &Image) -> Dimensions {
        let output = &self.shape.output;
        Dimensions::new(
            selected_channel_count(self.selection, output.channels),
            output.width,
            output.height,
            input.slices(),
            input.frames(),
        )
    }

    /// Runs the model once per coordinate, slices outer and frames inner,
    /// reporting `(completed, total)` after each.
    #[instrument(skip_all, fields(slices = input.slices(), frames = input.frames()))]
    pub fn run<S, F>(&self, session: &mut S, input: &Image, mut progress: F) -> Result<Image>
    where
        S: InferenceSession + ?Sized,
        F: FnMut(usize, usize),
    {
        let dims = input.dims();
        let total = dims.coordinate_count();
        let mut stack = Image::zeros(STACK_NAME, self.stack_dims(input), self.bit_depth)?;
        info!(total, "Running inference");

        {
            let mut regions = stack.coordinate_regions_mut();
            let mut completed = 0;
            for z in 0..dims.slices {
                for t in 0..dims.frames {
                    self.check_cancelled(completed, total)?;

                    let tensor = self.encode(input, z, t)?;
                    let output = session.run(tensor)?;
                    let pixels = self.decode(&output)?;
                    regions[dims.coordinate_index(z, t)].copy_from(&pixels)?;

                    completed += 1;
                    debug!(z, t, completed, total, "Slice processed");
                    progress(completed, total);
                }
            }
        }

        Ok(stack)
    }

    /// Parallel counterpart of [`SliceInferenceLoop::run`] with one worker
    /// thread per session. `progress` is never called concurrently and sees
    /// completed counts 1, 2, .. in order, whichever worker finished.
    #[instrument(skip_all, fields(workers = sessions.len()))]
    pub fn run_parallel<S, F>(&self, sessions: &mut [S], input: &Image, progress: F) -> Result<Image>
    where
        S: InferenceSession + Send,
        F: Fn(usize, usize) + Sync,
    {
        if sessions.is_empty() {
            return Err(PipelineError::Inference(
                "parallel inference needs at least one session".to_string(),
            ));
        }

        let dims = input.dims();
        let total = dims.coordinate_count();
        let mut stack = Image::zeros(STACK_NAME, self.stack_dims(input), self.bit_depth)?;
        info!(total, "Running inference");

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(sessions.len())
            .build()
            .map_err(|e| PipelineError::Inference(format!("failed to start workers: {e}")))?;
        let sessions: Vec<Mutex<&mut S>> = sessions.iter_mut().map(Mutex::new).collect();
        let completed = Mutex::new(0usize);

        let regions = stack.coordinate_regions_mut();
        pool.install(|| {
            regions
                .into_par_iter()
                .enumerate()
                .try_for_each(|(index, mut region)| -> Result<()> {
                    self.check_cancelled(*lock(&completed)?, total)?;

                    let (z, t) = (index % dims.slices, index / dims.slices);
                    let tensor = self.encode(input, z, t)?;
                    let worker = rayon::current_thread_index().unwrap_or(0) % sessions.len();
                    let output = {
                        let mut session = lock(&sessions[worker])?;
                        session.run(tensor)?
                    };
                    let pixels = self.decode(&output)?;
                    region.copy_from(&pixels)?;

                    // Counting and reporting under one lock keeps reports in order.
                    let mut done = lock(&completed)?;
                    *done += 1;
                    debug!(z, t, completed = *done, total, "Slice processed");
                    progress(*done, total);
                    Ok(())
                })
        })?;

        Ok(stack)
    }

    fn check_cancelled(&self, completed: usize, total: usize) -> Result<()> {
        match self.cancel {
            Some(flag) if flag.load(Ordering::SeqCst) => {
                Err(PipelineError::Cancelled { completed, total })
            }
            _ => Ok(()),
        }
    }

    fn encode(&self, input: &Image, z: usize, t: usize) -> Result<Array4<f32>> {
        let slice = input.extract_slice(z, t)?;
        encode_slice(&slice, &self.shape.input)
    }

    fn decode(&self, output: &Array4<f32>) -> Result<PixelBuffer> {
        let (_, _, width, height) = output.dim();
        if width != self.shape.output.width || height != self.shape.output.height {
            return Err(PipelineError::ShapeMismatch(format!(
                "model returned {width}x{height} but declares {}x{}",
                self.shape.output.width, self.shape.output.height
            )));
        }
        let decoded = decode_output(STACK_NAME, output, self.bit_depth, self.selection)?;
        Ok(decoded.into_pixels())
    }
}

fn lock<T>(mutex: &Mutex<T>) -> Result<MutexGuard<'_, T>> {
    mutex
        .lock()
        .map_err(|_| PipelineError::Inference("inference worker lock poisoned".to_string()))
}
