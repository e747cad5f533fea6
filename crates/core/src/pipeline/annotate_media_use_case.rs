use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::analysis::domain::landmark_provider::LandmarkProvider;
use crate::analysis::domain::object_detector::ObjectDetector;
use crate::annotation::frame_annotator::FrameAnnotator;
use crate::pipeline::frame_stream::AnnotatedFrames;
use crate::video::domain::video_reader::VideoReader;
use crate::video::domain::video_writer::VideoWriter;

/// Aggregate counts for one processed video.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MediaSummary {
    pub frames_written: usize,
    pub frames_analyzed: usize,
    pub mobile_frames: usize,
}

/// Orchestrates the full video annotation pipeline.
///
/// Wires the reader, inference adapters, annotator, and writer together.
/// This is a single-use struct: `execute` consumes the owned components,
/// so calling it twice will fail.
pub struct AnnotateMediaUseCase {
    reader: Option<Box<dyn VideoReader>>,
    writer: Option<Box<dyn VideoWriter>>,
    landmark_provider: Option<Box<dyn LandmarkProvider>>,
    object_detector: Option<Box<dyn ObjectDetector>>,
    annotator: Option<FrameAnnotator>,
    stride: usize,
    on_progress: Option<Box<dyn Fn(usize, usize) -> bool + Send>>,
    cancelled: Arc<AtomicBool>,
}

impl AnnotateMediaUseCase {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        reader: Box<dyn VideoReader>,
        writer: Box<dyn VideoWriter>,
        landmark_provider: Box<dyn LandmarkProvider>,
        object_detector: Box<dyn ObjectDetector>,
        annotator: FrameAnnotator,
        stride: usize,
        on_progress: Option<Box<dyn Fn(usize, usize) -> bool + Send>>,
        cancelled: Option<Arc<AtomicBool>>,
    ) -> Self {
        Self {
            reader: Some(reader),
            writer: Some(writer),
            landmark_provider: Some(landmark_provider),
            object_detector: Some(object_detector),
            annotator: Some(annotator),
            stride,
            on_progress,
            cancelled: cancelled.unwrap_or_else(|| Arc::new(AtomicBool::new(false))),
        }
    }

    /// Runs the pipeline from `input_path` to `output_path`.
    ///
    /// A progress callback returning `false` aborts with an error; the
    /// cancellation flag stops cleanly at the next frame boundary, keeping
    /// what was already written. Reader and writer are closed on every exit
    /// path.
    pub fn execute(
        &mut self,
        input_path: &Path,
        output_path: &Path,
    ) -> Result<MediaSummary, Box<dyn std::error::Error>> {
        let mut reader = self.reader.take().ok_or("Pipeline already executed")?;
        let mut writer = self.writer.take().ok_or("Pipeline already executed")?;
        let mut landmark_provider = self
            .landmark_provider
            .take()
            .ok_or("Pipeline already executed")?;
        let mut object_detector = self
            .object_detector
            .take()
            .ok_or("Pipeline already executed")?;
        let annotator = self.annotator.take().ok_or("Pipeline already executed")?;
        let on_progress = self.on_progress.take();

        let metadata = reader.open(input_path)?;
        writer.open(output_path, &metadata)?;

        let total = metadata.total_frames;
        let stride = self.stride;
        let cancelled = self.cancelled.clone();
        let mut summary = MediaSummary::default();

        let result = (|| -> Result<(), Box<dyn std::error::Error>> {
            let mut stream = AnnotatedFrames::new(
                reader.frames(),
                metadata.clone(),
                landmark_provider.as_mut(),
                object_detector.as_mut(),
                &annotator,
                stride,
            );
            loop {
                if cancelled.load(Ordering::Relaxed) {
                    break;
                }
                let Some(item) = stream.next() else {
                    break;
                };
                let annotated = item?;
                writer.write(&annotated.frame)?;
                summary.frames_written += 1;
                if let Some(frame_summary) = &annotated.summary {
                    summary.frames_analyzed += 1;
                    if frame_summary.mobile_detected {
                        summary.mobile_frames += 1;
                    }
                }
                if let Some(cb) = &on_progress {
                    if !cb(summary.frames_written, total) {
                        return Err("Cancelled by progress callback".into());
                    }
                }
            }
            Ok(())
        })();

        let close_result = writer.close();
        reader.close();
        result?;
        close_result?;
        Ok(summary)
    }
}
