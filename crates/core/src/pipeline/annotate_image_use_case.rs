use std::path::Path;

use crate::analysis::domain::landmark_provider::LandmarkProvider;
use crate::analysis::domain::object_detector::ObjectDetector;
use crate::annotation::frame_annotator::{AnnotationSummary, FrameAnnotator};
use crate::video::domain::image_writer::ImageWriter;
use crate::video::domain::video_reader::VideoReader;

/// Single-image pipeline: read → analyze → annotate → write.
pub struct AnnotateImageUseCase {
    reader: Box<dyn VideoReader>,
    image_writer: Box<dyn ImageWriter>,
    landmark_provider: Box<dyn LandmarkProvider>,
    object_detector: Box<dyn ObjectDetector>,
    annotator: FrameAnnotator,
}

impl AnnotateImageUseCase {
    pub fn new(
        reader: Box<dyn VideoReader>,
        image_writer: Box<dyn ImageWriter>,
        landmark_provider: Box<dyn LandmarkProvider>,
        object_detector: Box<dyn ObjectDetector>,
        annotator: FrameAnnotator,
    ) -> Self {
        Self {
            reader,
            image_writer,
            landmark_provider,
            object_detector,
            annotator,
        }
    }

    /// Reads a single image, runs both analyses, draws the overlays, and
    /// writes the result. Unlike the video path there is no frame counter.
    pub fn execute(
        &mut self,
        input_path: &Path,
        output_path: &Path,
    ) -> Result<AnnotationSummary, Box<dyn std::error::Error>> {
        let metadata = self.reader.open(input_path)?;
        if !metadata.is_still_image() {
            log::warn!(
                "{} has multiple frames, annotating only the first",
                input_path.display()
            );
        }

        let mut frame = self.reader.frames().next().ok_or("No frames in image")??;
        self.reader.close();

        let landmarks = self.landmark_provider.landmarks(&frame)?;
        let detections = self.object_detector.detect(&frame)?;
        let summary = self
            .annotator
            .annotate(&mut frame, landmarks.as_ref(), &detections);

        self.image_writer.write(output_path, &frame)?;
        Ok(summary)
    }
}
