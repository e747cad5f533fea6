use std::error::Error;

use crate::analysis::domain::detection::Detection;
use crate::shared::frame::Frame;

/// Detects objects in a frame. Returns every detection above the
/// implementation's own floor; callers filter by class and confidence.
pub trait ObjectDetector: Send {
    fn detect(&mut self, frame: &Frame) -> Result<Vec<Detection>, Box<dyn Error>>;
}
