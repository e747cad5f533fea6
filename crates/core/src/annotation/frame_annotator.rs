use log::warn;

use crate::analysis::domain::detection::{filter_detections, Detection};
use crate::analysis::domain::gaze::{classify_gaze, GazeLabel};
use crate::analysis::domain::head_pose::{solve_head_pose, CameraIntrinsics, HeadDirection};
use crate::analysis::domain::landmarks::FaceLandmarks;
use crate::annotation::draw::{draw_disc, draw_rect, draw_text, GREEN, MAGENTA, WHITE};
use crate::shared::constants::{COCO_CLASS_CELL_PHONE, DEFAULT_PHONE_CONFIDENCE};
use crate::shared::frame::Frame;

const IRIS_RADIUS: i32 = 3;
const STATUS_X: i32 = 20;
const STATUS_Y: i32 = 30;
const STATUS_LINE_HEIGHT: i32 = 30;

/// What one annotated frame concluded. `None` fields mean the signal was
/// unavailable, not that it was negative.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct AnnotationSummary {
    pub head_direction: Option<HeadDirection>,
    pub left_eye: Option<GazeLabel>,
    pub right_eye: Option<GazeLabel>,
    pub mobile_detected: bool,
}

/// Draws all analysis overlays onto a frame: face bounding box, head and
/// gaze status lines, iris markers, and phone detection boxes.
pub struct FrameAnnotator {
    phone_class: u32,
    min_phone_confidence: f64,
}

impl FrameAnnotator {
    pub fn new(phone_class: u32, min_phone_confidence: f64) -> Self {
        Self {
            phone_class,
            min_phone_confidence,
        }
    }

    /// Annotates in place. A missing face skips the face overlays but phone
    /// detections are still drawn. Pose and gaze failures degrade to missing
    /// status lines rather than aborting the frame.
    pub fn annotate(
        &self,
        frame: &mut Frame,
        landmarks: Option<&FaceLandmarks>,
        detections: &[Detection],
    ) -> AnnotationSummary {
        let mut summary = AnnotationSummary::default();

        if let Some(landmarks) = landmarks {
            summary = self.annotate_face(frame, landmarks);
        }
        summary.mobile_detected = self.annotate_phones(frame, detections);
        summary
    }

    fn annotate_face(&self, frame: &mut Frame, landmarks: &FaceLandmarks) -> AnnotationSummary {
        let mut summary = AnnotationSummary::default();

        if let Some(bbox) = landmarks.bounding_box() {
            draw_rect(frame, bbox, GREEN, 2);
        }

        summary.head_direction = self.head_direction(frame, landmarks);
        summary.left_eye = landmarks.left_eye_corners().zip(landmarks.left_iris()).and_then(
            |((a, b), iris)| match classify_gaze(a, b, iris) {
                Ok(label) => Some(label),
                Err(e) => {
                    warn!("left eye gaze skipped on frame {}: {e}", frame.index());
                    None
                }
            },
        );
        summary.right_eye = landmarks
            .right_eye_corners()
            .zip(landmarks.right_iris())
            .and_then(|((a, b), iris)| match classify_gaze(a, b, iris) {
                Ok(label) => Some(label),
                Err(e) => {
                    warn!("right eye gaze skipped on frame {}: {e}", frame.index());
                    None
                }
            });

        for iris in [landmarks.left_iris(), landmarks.right_iris()].into_iter().flatten() {
            draw_disc(
                frame,
                iris.x.round() as i32,
                iris.y.round() as i32,
                IRIS_RADIUS,
                MAGENTA,
            );
        }

        let mut lines: Vec<String> = Vec::with_capacity(3);
        if let Some(direction) = summary.head_direction {
            lines.push(format!("Head: {}", direction.as_str()));
        }
        if let Some(label) = summary.left_eye {
            lines.push(format!("Left Eye: {}", label.as_str()));
        }
        if let Some(label) = summary.right_eye {
            lines.push(format!("Right Eye: {}", label.as_str()));
        }
        for (i, line) in lines.iter().enumerate() {
            draw_text(
                frame,
                STATUS_X,
                STATUS_Y + i as i32 * STATUS_LINE_HEIGHT,
                line,
                GREEN,
            );
        }

        summary
    }

    fn head_direction(&self, frame: &Frame, landmarks: &FaceLandmarks) -> Option<HeadDirection> {
        let (image_points, model_points) = landmarks.pose_correspondences()?;
        let camera = CameraIntrinsics::for_frame(frame.width(), frame.height());
        match solve_head_pose(&image_points, &model_points, &camera) {
            Ok(pose) => Some(pose.direction()),
            Err(e) => {
                warn!("head pose skipped on frame {}: {e}", frame.index());
                None
            }
        }
    }

    fn annotate_phones(&self, frame: &mut Frame, detections: &[Detection]) -> bool {
        let phones = filter_detections(detections, self.phone_class, self.min_phone_confidence);
        for phone in &phones {
            let (x1, y1, _, _) = phone.bbox;
            draw_rect(frame, phone.bbox, GREEN, 3);
            draw_text(
                frame,
                x1,
                y1 - 10,
                &format!("Mobile ({:.2})", phone.confidence),
                WHITE,
            );
        }
        !phones.is_empty()
    }
}

impl Default for FrameAnnotator {
    fn default() -> Self {
        Self::new(COCO_CLASS_CELL_PHONE, DEFAULT_PHONE_CONFIDENCE)
    }
}
