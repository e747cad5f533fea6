use std::path::Path;

use crate::shared::frame::Frame;
use crate::video::domain::image_writer::ImageWriter;

/// Saves an annotated frame as an image file via the `image` crate; the
/// format follows the output path's extension.
pub struct ImageFileWriter;

impl ImageFileWriter {
    pub fn new() -> Self {
        Self
    }
}

impl Default for ImageFileWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl ImageWriter for ImageFileWriter {
    fn write(&self, path: &Path, frame: &Frame) -> Result<(), Box<dyn std::error::Error>> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let img = image::RgbImage::from_raw(frame.width(), frame.height(), frame.data().to_vec())
            .ok_or("Frame data does not match its dimensions")?;
        img.save(path)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn colored_frame(width: u32, height: u32, rgb: [u8; 3]) -> Frame {
        let data: Vec<u8> = rgb
            .iter()
            .copied()
            .cycle()
            .take((width * height * 3) as usize)
            .collect();
        Frame::new(data, width, height, 3, 0)
    }

    #[test]
    fn test_writes_readable_png() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("annotated.png");
        let writer = ImageFileWriter::new();
        writer
            .write(&path, &colored_frame(60, 40, [10, 200, 90]))
            .unwrap();

        let img = image::open(&path).unwrap().to_rgb8();
        assert_eq!((img.width(), img.height()), (60, 40));
        assert_eq!(img.get_pixel(30, 20).0, [10, 200, 90]);
    }

    #[test]
    fn test_creates_missing_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/out/annotated.png");
        let writer = ImageFileWriter::new();
        writer
            .write(&path, &colored_frame(8, 8, [0, 255, 0]))
            .unwrap();
        assert!(path.exists());
    }

    #[test]
    fn test_unwritable_path_errors() {
        let writer = ImageFileWriter::new();
        let result = writer.write(
            Path::new("/proc/annotated.png"),
            &colored_frame(8, 8, [1, 2, 3]),
        );
        assert!(result.is_err());
    }
}
