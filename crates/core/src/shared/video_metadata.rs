use std::path::PathBuf;

/// Stream properties captured when a reader opens its source.
///
/// Still images flow through the same pipeline as videos; they are
/// represented as a single-frame stream with `fps = 0`.
#[derive(Clone, Debug, PartialEq)]
pub struct VideoMetadata {
    pub width: u32,
    pub height: u32,
    pub fps: f64,
    pub total_frames: usize,
    pub codec: String,
    pub source_path: Option<PathBuf>,
}

impl VideoMetadata {
    /// Metadata for a decoded still image.
    pub fn still_image(width: u32, height: u32, source_path: Option<PathBuf>) -> Self {
        Self {
            width,
            height,
            fps: 0.0,
            total_frames: 1,
            codec: String::new(),
            source_path,
        }
    }

    pub fn is_still_image(&self) -> bool {
        self.fps == 0.0 && self.total_frames == 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn webcam_recording() -> VideoMetadata {
        VideoMetadata {
            width: 1280,
            height: 720,
            fps: 25.0,
            total_frames: 1500,
            codec: "h264".to_string(),
            source_path: Some(PathBuf::from("/tmp/session.mp4")),
        }
    }

    #[test]
    fn test_video_is_not_still_image() {
        assert!(!webcam_recording().is_still_image());
    }

    #[test]
    fn test_still_image_constructor() {
        let meta = VideoMetadata::still_image(800, 600, None);
        assert_eq!(meta.width, 800);
        assert_eq!(meta.height, 600);
        assert_eq!(meta.fps, 0.0);
        assert_eq!(meta.total_frames, 1);
        assert!(meta.codec.is_empty());
        assert!(meta.is_still_image());
    }

    #[test]
    fn test_clone_compares_equal() {
        let meta = webcam_recording();
        assert_eq!(meta, meta.clone());
    }
}
