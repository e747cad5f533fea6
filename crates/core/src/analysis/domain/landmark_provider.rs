use std::error::Error;

use crate::analysis::domain::landmarks::FaceLandmarks;
use crate::shared::frame::Frame;

/// Extracts face landmarks from a frame.
///
/// `Ok(None)` means the frame was analyzed and no face was found; `Err` is
/// reserved for inference failures. Implementations take `&mut self` since
/// inference sessions are stateful.
pub trait LandmarkProvider: Send {
    fn landmarks(&mut self, frame: &Frame) -> Result<Option<FaceLandmarks>, Box<dyn Error>>;
}
