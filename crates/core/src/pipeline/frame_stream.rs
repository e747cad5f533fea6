use std::error::Error;

use log::warn;

use crate::analysis::domain::landmark_provider::LandmarkProvider;
use crate::analysis::domain::object_detector::ObjectDetector;
use crate::annotation::draw::{draw_text, WHITE};
use crate::annotation::frame_annotator::{AnnotationSummary, FrameAnnotator};
use crate::shared::frame::Frame;
use crate::shared::video_metadata::VideoMetadata;

/// One frame out of the stream. `summary` is present only for frames that
/// went through analysis; strided-over frames pass through with just the
/// counter overlay.
pub struct AnnotatedFrame {
    pub frame: Frame,
    pub summary: Option<AnnotationSummary>,
}

impl AnnotatedFrame {
    pub fn analyzed(&self) -> bool {
        self.summary.is_some()
    }
}

/// Lazy adapter from decoded frames to annotated frames.
///
/// With `stride` N, every Nth frame (starting at the first) is analyzed and
/// annotated; the rest are copied through. Every frame gets a counter
/// overlay, so output frame count always equals input frame count.
/// Inference failures are logged and leave that frame without the affected
/// overlay; decode failures surface as `Err` items.
pub struct AnnotatedFrames<'a> {
    frames: Box<dyn Iterator<Item = Result<Frame, Box<dyn Error>>> + 'a>,
    landmark_provider: &'a mut dyn LandmarkProvider,
    object_detector: &'a mut dyn ObjectDetector,
    annotator: &'a FrameAnnotator,
    metadata: VideoMetadata,
    stride: usize,
    position: usize,
}

impl<'a> AnnotatedFrames<'a> {
    pub fn new(
        frames: Box<dyn Iterator<Item = Result<Frame, Box<dyn Error>>> + 'a>,
        metadata: VideoMetadata,
        landmark_provider: &'a mut dyn LandmarkProvider,
        object_detector: &'a mut dyn ObjectDetector,
        annotator: &'a FrameAnnotator,
        stride: usize,
    ) -> Self {
        Self {
            frames,
            landmark_provider,
            object_detector,
            annotator,
            metadata,
            stride: stride.max(1),
            position: 0,
        }
    }

    fn annotate(&mut self, frame: &mut Frame) -> AnnotationSummary {
        let landmarks = match self.landmark_provider.landmarks(frame) {
            Ok(landmarks) => landmarks,
            Err(e) => {
                warn!("landmark inference failed on frame {}: {e}", frame.index());
                None
            }
        };
        let detections = match self.object_detector.detect(frame) {
            Ok(detections) => detections,
            Err(e) => {
                warn!("object detection failed on frame {}: {e}", frame.index());
                Vec::new()
            }
        };
        self.annotator.annotate(frame, landmarks.as_ref(), &detections)
    }

    fn draw_counter(&self, frame: &mut Frame, analyzed: bool) {
        // Zero-based, same as the source frame index
        let current = self.position;
        let total = self.metadata.total_frames;
        let width = frame.width() as i32;
        let height = frame.height() as i32;
        if self.stride == 1 {
            let label = format!("Frame: {current}/{total}");
            draw_text(frame, width - 200, height - 20, &label, WHITE);
        } else {
            let status = if analyzed { "PROCESSED" } else { "COPIED" };
            let label = format!("Frame: {current}/{total} ({status})");
            draw_text(frame, 10, height - 20, &label, WHITE);
        }
    }
}

impl Iterator for AnnotatedFrames<'_> {
    type Item = Result<AnnotatedFrame, Box<dyn Error>>;

    fn next(&mut self) -> Option<Self::Item> {
        let mut frame = match self.frames.next()? {
            Ok(frame) => frame,
            Err(e) => return Some(Err(e)),
        };

        let analyzed = self.position % self.stride == 0;
        let summary = analyzed.then(|| self.annotate(&mut frame));
        self.draw_counter(&mut frame, analyzed);
        self.position += 1;

        Some(Ok(AnnotatedFrame { frame, summary }))
    }
}
