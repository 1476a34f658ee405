#[cfg(test)]
mod tests {
    use std::io::{Cursor, Write};
    use std::sync::atomic::Ordering;
    use std::sync::{Arc, Mutex};

    use crate::image_pipeline::codec::ClassSelection;
    use crate::image_pipeline::common::error::{PipelineError, Result};
    use crate::image_pipeline::conversions::{InferenceConfig, OnnxModelPipeline};
    use crate::image_pipeline::hyperstack::{BitDepth, Dimensions, Image, PixelBuffer};
    use crate::image_pipeline::model::TensorShape;
    use crate::image_pipeline::model::mock::{BrokenSession, MockSession};
    use crate::image_pipeline::tiff::{
        StackHints, StackReader, StandardTiffReader, StandardTiffWriter, TiffCompression, TiffWriter,
    };

    struct MockReader {
        should_fail: bool,
        image: Image,
    }

    impl StackReader for MockReader {
        fn read_stack(&self, name: &str, _data: &[u8], _hints: &StackHints) -> Result<Image> {
            if self.should_fail {
                return Err(PipelineError::DecodeError("Mock decode error".to_string()));
            }
            Ok(self.image.clone().with_name(name))
        }
    }

    struct MockWriter {
        written: Arc<Mutex<Vec<(Image, TiffCompression)>>>,
    }

    impl TiffWriter for MockWriter {
        fn write_stack(&self, image: &Image, output: &mut dyn Write, compression: TiffCompression) -> Result<()> {
            output.write_all(b"mock tiff")?;
            self.written.lock().unwrap().push((image.clone(), compression));
            Ok(())
        }
    }

    fn gradient(dims: Dimensions) -> Image {
        Image::from_fn("input", dims, |c, x, y, z, t| {
            (c + z + t) as f32 * 0.1 + (x * 7 + y * 13) as f32 * 0.0001
        })
        .unwrap()
    }

    fn constant(dims: Dimensions, value: f32) -> Image {
        Image::from_fn("input", dims, |_, _, _, _, _| value).unwrap()
    }

    #[test]
    fn test_config_defaults() {
        let config = InferenceConfig::default();

        assert_eq!(config.output_name, "Output");
        assert_eq!(config.bit_depth, BitDepth::ThirtyTwo);
        assert_eq!(config.tile_overlap, 64);
        assert!(config.class_selection.is_none());
        assert_eq!(config.input_tensor, "input");
        assert_eq!(config.output_tensor, "target");
        assert_eq!(config.compression, TiffCompression::None);
    }

    #[test]
    fn test_config_builder() {
        let config = InferenceConfig::builder()
            .output_name("Probabilities")
            .bit_depth(BitDepth::Sixteen)
            .tile_overlap(32)
            .class_selection(Some("2,1".parse().unwrap()))
            .output_tensor("probs")
            .compression(TiffCompression::Lzw)
            .build();

        assert_eq!(config.output_name, "Probabilities");
        assert_eq!(config.bit_depth, BitDepth::Sixteen);
        assert_eq!(config.tile_overlap, 32);
        assert_eq!(config.class_selection.unwrap().indices(), &[2, 1]);
        assert_eq!(config.input_tensor, "input");
        assert_eq!(config.output_tensor, "probs");
        assert_eq!(config.compression, TiffCompression::Lzw);
    }

    #[test]
    fn test_large_image_is_tiled_and_stitched() {
        let input = gradient(Dimensions::planar(1, 512, 512));
        let mut pipeline =
            OnnxModelPipeline::with_session(MockSession::identity(1, 256, 256), InferenceConfig::default());
        let mut reports = Vec::new();

        let output = pipeline
            .run(&input, |done, total| reports.push((done, total)))
            .unwrap()
            .unwrap();

        assert_eq!(pipeline.sessions()[0].calls, 9);
        assert_eq!(reports.last(), Some(&(9, 9)));
        assert_eq!(output.name(), "Output");
        assert_eq!(output.dims(), Dimensions::planar(1, 512, 512));
        assert_eq!(output.pixels(), input.pixels());
    }

    #[test]
    fn test_tiling_keeps_slices_and_frames() {
        let input = gradient(Dimensions::new(2, 40, 24, 2, 3));
        let config = InferenceConfig::builder().tile_overlap(4).build();
        let mut pipeline = OnnxModelPipeline::with_session(MockSession::identity(2, 16, 16), config);

        let output = pipeline.run(&input, |_, _| {}).unwrap().unwrap();

        // 3 x 2 tiles per frame, 2 slices x 3 frames
        assert_eq!(pipeline.sessions()[0].calls, 36);
        assert_eq!(output.dims(), input.dims());
        assert_eq!(output.pixels(), input.pixels());
    }

    #[test]
    fn test_model_sized_image_passes_through() {
        let input = gradient(Dimensions::new(1, 16, 16, 3, 2));
        let mut pipeline =
            OnnxModelPipeline::with_session(MockSession::identity(1, 16, 16), InferenceConfig::default());
        let mut reports = Vec::new();

        let output = pipeline
            .run(&input, |done, total| reports.push((done, total)))
            .unwrap()
            .unwrap();

        assert_eq!(pipeline.sessions()[0].calls, 6);
        assert_eq!(reports, (1..=6).map(|i| (i, 6)).collect::<Vec<_>>());
        assert_eq!(output.name(), "Output");
        assert_eq!(output.pixels(), input.pixels());
    }

    #[test]
    fn test_undersized_image_yields_no_output() {
        let input = gradient(Dimensions::planar(1, 100, 100));
        let mut pipeline =
            OnnxModelPipeline::with_session(MockSession::identity(1, 256, 256), InferenceConfig::default());

        let output = pipeline.run(&input, |_, _| panic!("no progress expected")).unwrap();

        assert!(output.is_none());
        assert_eq!(pipeline.sessions()[0].calls, 0);
    }

    #[test]
    fn test_single_matching_axis_with_short_other_axis_fails() {
        let input = gradient(Dimensions::planar(1, 256, 100));
        let mut pipeline =
            OnnxModelPipeline::with_session(MockSession::identity(1, 256, 256), InferenceConfig::default());

        let result = pipeline.run(&input, |_, _| {});

        assert!(matches!(result, Err(PipelineError::ShapeMismatch(_))));
    }

    #[test]
    fn test_overlap_not_smaller_than_tile_is_rejected() {
        let input = gradient(Dimensions::planar(1, 64, 64));
        let config = InferenceConfig::builder().tile_overlap(32).build();
        let mut pipeline = OnnxModelPipeline::with_session(MockSession::identity(1, 32, 32), config);

        let result = pipeline.run(&input, |_, _| {});

        assert!(matches!(
            result,
            Err(PipelineError::InvalidOverlap { overlap: 32, tile: 32 })
        ));
    }

    #[test]
    fn test_class_selection_and_bit_depth() {
        let input = constant(Dimensions::new(1, 8, 8, 2, 1), 0.5);
        let session = MockSession::classes(TensorShape::new(1, 8, 8), 3, 0.25);
        let config = InferenceConfig::builder()
            .bit_depth(BitDepth::Eight)
            .class_selection(Some("3, 1".parse().unwrap()))
            .build();
        let mut pipeline = OnnxModelPipeline::with_session(session, config);

        let output = pipeline.run(&input, |_, _| {}).unwrap().unwrap();

        assert_eq!(output.dims(), Dimensions::new(2, 8, 8, 2, 1));
        assert_eq!(output.bit_depth(), BitDepth::Eight);
        // class 3 = 0.5 + 0.5, class 1 = 0.5
        assert_eq!(output.plane(0, 1, 0), PixelBuffer::U8(vec![255; 64]));
        assert_eq!(output.plane(1, 1, 0), PixelBuffer::U8(vec![128; 64]));
    }

    #[test]
    fn test_class_selection_checked_before_inference() {
        let input = constant(Dimensions::planar(1, 8, 8), 0.5);
        let session = MockSession::classes(TensorShape::new(1, 8, 8), 2, 0.0);
        let config = InferenceConfig::builder()
            .class_selection(Some(ClassSelection::new(vec![1, 3]).unwrap()))
            .build();
        let mut pipeline = OnnxModelPipeline::with_session(session, config);

        let result = pipeline.run(&input, |_, _| {});

        assert!(matches!(result, Err(PipelineError::InvalidClassSelection(_))));
        assert_eq!(pipeline.sessions()[0].calls, 0);
    }

    #[test]
    fn test_unreadable_model_shape() {
        let input = constant(Dimensions::planar(1, 8, 8), 0.5);
        let mut pipeline = OnnxModelPipeline::with_session(BrokenSession, InferenceConfig::default());

        let result = pipeline.run(&input, |_, _| {});

        assert!(matches!(result, Err(PipelineError::ModelIntrospection(_))));
    }

    #[test]
    fn test_inference_failure_aborts_run() {
        let input = gradient(Dimensions::new(1, 8, 8, 3, 1));
        let session = MockSession::identity(1, 8, 8).failing_at(2);
        let mut pipeline = OnnxModelPipeline::with_session(session, InferenceConfig::default());
        let mut reports = Vec::new();

        let result = pipeline.run(&input, |done, total| reports.push((done, total)));

        assert!(matches!(result, Err(PipelineError::Inference(_))));
        assert_eq!(reports, vec![(1, 3)]);
    }

    #[test]
    fn test_cancelled_run() {
        let input = gradient(Dimensions::new(1, 8, 8, 2, 2));
        let mut pipeline =
            OnnxModelPipeline::with_session(MockSession::identity(1, 8, 8), InferenceConfig::default());
        pipeline.cancellation_flag().store(true, Ordering::SeqCst);

        let result = pipeline.run(&input, |_, _| {});

        assert!(matches!(
            result,
            Err(PipelineError::Cancelled { completed: 0, total: 4 })
        ));
        assert_eq!(pipeline.sessions()[0].calls, 0);
    }

    #[test]
    fn test_session_pool_matches_single_session() {
        let input = gradient(Dimensions::new(1, 24, 24, 2, 2));
        let config = InferenceConfig::builder().tile_overlap(4).build();
        let session = MockSession::identity(1, 16, 16);

        let mut single = OnnxModelPipeline::with_session(session.clone(), config.clone());
        let expected = single.run(&input, |_, _| {}).unwrap().unwrap();

        let mut pooled = OnnxModelPipeline::with_custom(
            vec![session.clone(), session.clone(), session],
            StandardTiffReader,
            StandardTiffWriter,
            config,
        )
        .unwrap();
        let mut reports = Vec::new();
        let output = pooled
            .run(&input, |done, total| reports.push((done, total)))
            .unwrap()
            .unwrap();

        assert_eq!(output, expected);
        let calls: usize = pooled.sessions().iter().map(|s| s.calls).sum();
        assert_eq!(calls, single.sessions()[0].calls);
        assert_eq!(reports, (1..=16).map(|i| (i, 16)).collect::<Vec<_>>());
    }

    #[test]
    fn test_empty_session_pool_is_rejected() {
        let result = OnnxModelPipeline::<MockSession>::with_custom(
            Vec::new(),
            StandardTiffReader,
            StandardTiffWriter,
            InferenceConfig::default(),
        );

        assert!(matches!(result, Err(PipelineError::Inference(_))));
    }

    #[test]
    fn test_convert_with_mock_reader_and_writer() {
        let written = Arc::new(Mutex::new(Vec::new()));
        let reader = MockReader {
            should_fail: false,
            image: gradient(Dimensions::planar(1, 16, 16)),
        };
        let writer = MockWriter {
            written: written.clone(),
        };
        let config = InferenceConfig::builder()
            .compression(TiffCompression::DeflateBest)
            .build();
        let mut pipeline =
            OnnxModelPipeline::with_custom(vec![MockSession::identity(1, 16, 16)], reader, writer, config)
                .unwrap();

        let mut output = Cursor::new(Vec::new());
        let produced = pipeline
            .convert("stack", b"fake tiff data", &mut output, |_, _| {})
            .unwrap();

        assert!(produced);
        assert_eq!(output.into_inner(), b"mock tiff");
        let written = written.lock().unwrap();
        assert_eq!(written.len(), 1);
        assert_eq!(written[0].0.name(), "Output");
        assert_eq!(written[0].1, TiffCompression::DeflateBest);
    }

    #[test]
    fn test_convert_undersized_writes_nothing() {
        let written = Arc::new(Mutex::new(Vec::new()));
        let reader = MockReader {
            should_fail: false,
            image: gradient(Dimensions::planar(1, 8, 8)),
        };
        let writer = MockWriter {
            written: written.clone(),
        };
        let mut pipeline = OnnxModelPipeline::with_custom(
            vec![MockSession::identity(1, 16, 16)],
            reader,
            writer,
            InferenceConfig::default(),
        )
        .unwrap();

        let mut output = Cursor::new(Vec::new());
        let produced = pipeline
            .convert("stack", b"fake tiff data", &mut output, |_, _| {})
            .unwrap();

        assert!(!produced);
        assert!(output.into_inner().is_empty());
        assert!(written.lock().unwrap().is_empty());
    }

    #[test]
    fn test_convert_reader_failure() {
        let reader = MockReader {
            should_fail: true,
            image: gradient(Dimensions::planar(1, 16, 16)),
        };
        let writer = MockWriter {
            written: Arc::new(Mutex::new(Vec::new())),
        };
        let mut pipeline = OnnxModelPipeline::with_custom(
            vec![MockSession::identity(1, 16, 16)],
            reader,
            writer,
            InferenceConfig::default(),
        )
        .unwrap();

        let mut output = Cursor::new(Vec::new());
        let result = pipeline.convert("stack", b"", &mut output, |_, _| {});

        assert!(matches!(result, Err(PipelineError::DecodeError(_))));
        assert_eq!(pipeline.sessions()[0].calls, 0);
    }

    #[test]
    fn test_convert_file_missing_input() {
        let dir = tempfile::tempdir().unwrap();
        let mut pipeline =
            OnnxModelPipeline::with_session(MockSession::identity(1, 16, 16), InferenceConfig::default());

        let result = pipeline.convert_file(
            dir.path().join("missing.tif"),
            dir.path().join("out.tif"),
            |_, _| {},
        );

        assert!(matches!(result, Err(PipelineError::InputReadError(_))));
        assert!(!dir.path().join("out.tif").exists());
    }

    #[test]
    fn test_convert_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let input_path = dir.path().join("cells.tif");
        let output_path = dir.path().join("cells_probabilities.tif");
        let input = gradient(Dimensions::new(1, 40, 40, 2, 1));

        let mut file = std::fs::File::create(&input_path).unwrap();
        StandardTiffWriter
            .write_stack(&input, &mut file, TiffCompression::None)
            .unwrap();
        drop(file);

        let config = InferenceConfig::builder().tile_overlap(8).build();
        let mut pipeline = OnnxModelPipeline::with_session(MockSession::identity(1, 32, 32), config);
        let produced = pipeline.convert_file(&input_path, &output_path, |_, _| {}).unwrap();
        assert!(produced);

        let data = std::fs::read(&output_path).unwrap();
        let output = StandardTiffReader
            .read_stack("result", &data, &StackHints::default())
            .unwrap();
        assert_eq!(output.dims(), input.dims());
        assert_eq!(output.pixels(), input.pixels());
    }

    #[test]
    fn test_convert_file_undersized_creates_no_file() {
        let dir = tempfile::tempdir().unwrap();
        let input_path = dir.path().join("small.tif");
        let output_path = dir.path().join("small_out.tif");

        let mut file = std::fs::File::create(&input_path).unwrap();
        StandardTiffWriter
            .write_stack(&gradient(Dimensions::planar(1, 8, 8)), &mut file, TiffCompression::None)
            .unwrap();
        drop(file);

        let mut pipeline =
            OnnxModelPipeline::with_session(MockSession::identity(1, 16, 16), InferenceConfig::default());
        let produced = pipeline.convert_file(&input_path, &output_path, |_, _| {}).unwrap();

        assert!(!produced);
        assert!(!output_path.exists());
    }
}
