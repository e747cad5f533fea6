use std::path::Path;

use crate::shared::frame::Frame;
use crate::shared::video_metadata::VideoMetadata;
use crate::video::domain::video_writer::VideoWriter;

/// Fallback frame rate for sources that report none (e.g. still images
/// pushed through the video path).
const DEFAULT_FPS: i32 = 30;

/// Encodes annotated RGB frames to a video container via ffmpeg-next.
pub struct FfmpegWriter {
    output: Option<ffmpeg_next::format::context::Output>,
    encoder: Option<ffmpeg_next::codec::encoder::video::Encoder>,
    scaler: Option<ffmpeg_next::software::scaling::Context>,
    width: u32,
    height: u32,
    stream_index: usize,
    encoder_time_base: ffmpeg_next::Rational,
    next_pts: i64,
}

// Safety: FfmpegWriter is only used from a single thread at a time.
// The raw pointers inside ffmpeg types are not shared across threads.
unsafe impl Send for FfmpegWriter {}

impl FfmpegWriter {
    pub fn new() -> Self {
        Self {
            output: None,
            encoder: None,
            scaler: None,
            width: 0,
            height: 0,
            stream_index: 0,
            encoder_time_base: ffmpeg_next::Rational(1, DEFAULT_FPS),
            next_pts: 0,
        }
    }

    /// Drains pending packets from the encoder into the container.
    fn drain_encoder(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        let encoder = self.encoder.as_mut().ok_or("FfmpegWriter: not opened")?;
        let output = self.output.as_mut().ok_or("FfmpegWriter: not opened")?;
        let stream_time_base = output
            .stream(self.stream_index)
            .ok_or("FfmpegWriter: missing stream")?
            .time_base();

        let mut packet = ffmpeg_next::Packet::empty();
        while encoder.receive_packet(&mut packet).is_ok() {
            packet.set_stream(self.stream_index);
            packet.rescale_ts(self.encoder_time_base, stream_time_base);
            packet.write_interleaved(output)?;
        }
        Ok(())
    }
}

impl Default for FfmpegWriter {
    fn default() -> Self {
        Self::new()
    }
}

fn rounded_fps(fps: f64) -> i32 {
    let fps = fps.round() as i32;
    if fps > 0 {
        fps
    } else {
        DEFAULT_FPS
    }
}

impl VideoWriter for FfmpegWriter {
    fn open(
        &mut self,
        path: &Path,
        metadata: &VideoMetadata,
    ) -> Result<(), Box<dyn std::error::Error>> {
        ffmpeg_next::init()?;

        let mut output = ffmpeg_next::format::output(path)?;
        let needs_global_header = output
            .format()
            .flags()
            .contains(ffmpeg_next::format::Flags::GLOBAL_HEADER);

        // MPEG4 keeps the build free of GPL encoder dependencies
        let codec = ffmpeg_next::encoder::find(ffmpeg_next::codec::Id::MPEG4)
            .ok_or("MPEG4 encoder not found")?;
        let mut stream = output.add_stream(Some(codec))?;
        let stream_index = stream.index();

        let fps = rounded_fps(metadata.fps);
        let time_base = ffmpeg_next::Rational(1, fps);

        let mut encoder_ctx = ffmpeg_next::codec::context::Context::new_with_codec(codec)
            .encoder()
            .video()?;
        encoder_ctx.set_width(metadata.width);
        encoder_ctx.set_height(metadata.height);
        encoder_ctx.set_format(ffmpeg_next::format::Pixel::YUV420P);
        encoder_ctx.set_time_base(time_base);
        encoder_ctx.set_frame_rate(Some(ffmpeg_next::Rational(fps, 1)));
        if needs_global_header {
            encoder_ctx.set_flags(ffmpeg_next::codec::Flags::GLOBAL_HEADER);
        }

        let encoder = encoder_ctx.open_with(ffmpeg_next::Dictionary::new())?;
        stream.set_parameters(&encoder);

        output.write_header()?;

        let scaler = ffmpeg_next::software::scaling::Context::get(
            ffmpeg_next::format::Pixel::RGB24,
            metadata.width,
            metadata.height,
            ffmpeg_next::format::Pixel::YUV420P,
            metadata.width,
            metadata.height,
            ffmpeg_next::software::scaling::Flags::BILINEAR,
        )?;

        self.output = Some(output);
        self.encoder = Some(encoder);
        self.scaler = Some(scaler);
        self.width = metadata.width;
        self.height = metadata.height;
        self.stream_index = stream_index;
        self.encoder_time_base = time_base;
        self.next_pts = 0;

        Ok(())
    }

    fn write(&mut self, frame: &Frame) -> Result<(), Box<dyn std::error::Error>> {
        let encoder = self.encoder.as_mut().ok_or("FfmpegWriter: not opened")?;
        let scaler = self.scaler.as_mut().ok_or("FfmpegWriter: not opened")?;

        let mut rgb = ffmpeg_next::util::frame::video::Video::new(
            ffmpeg_next::format::Pixel::RGB24,
            self.width,
            self.height,
        );

        // ffmpeg rows may be padded; copy row by row
        let stride = rgb.stride(0);
        let row_bytes = self.width as usize * 3;
        let dst = rgb.data_mut(0);
        let src = frame.data();
        for row in 0..self.height as usize {
            dst[row * stride..row * stride + row_bytes]
                .copy_from_slice(&src[row * row_bytes..(row + 1) * row_bytes]);
        }

        let mut yuv = ffmpeg_next::util::frame::video::Video::empty();
        scaler.run(&rgb, &mut yuv)?;
        yuv.set_pts(Some(self.next_pts));
        self.next_pts += 1;

        encoder.send_frame(&yuv)?;
        self.drain_encoder()
    }

    fn close(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        if self.encoder.is_none() {
            self.output = None;
            self.scaler = None;
            return Ok(());
        }

        if let Some(encoder) = self.encoder.as_mut() {
            encoder.send_eof()?;
        }
        self.drain_encoder()?;
        if let Some(output) = self.output.as_mut() {
            output.write_trailer()?;
        }

        self.output = None;
        self.encoder = None;
        self.scaler = None;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::video::domain::video_reader::VideoReader;
    use crate::video::infrastructure::ffmpeg_reader::FfmpegReader;

    fn metadata(fps: f64) -> VideoMetadata {
        VideoMetadata {
            width: 160,
            height: 120,
            fps,
            total_frames: 0,
            codec: String::new(),
            source_path: None,
        }
    }

    fn gray_frame(index: usize) -> Frame {
        Frame::new(vec![128; 160 * 120 * 3], 160, 120, 3, index)
    }

    fn write_frames(path: &Path, fps: f64, count: usize) {
        let mut writer = FfmpegWriter::new();
        writer.open(path, &metadata(fps)).unwrap();
        for i in 0..count {
            writer.write(&gray_frame(i)).unwrap();
        }
        writer.close().unwrap();
    }

    #[test]
    fn test_write_creates_nonempty_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.mp4");
        write_frames(&path, 30.0, 3);
        assert!(std::fs::metadata(&path).unwrap().len() > 0);
    }

    #[test]
    fn test_write_without_open_errors() {
        let mut writer = FfmpegWriter::new();
        assert!(writer.write(&gray_frame(0)).is_err());
    }

    #[test]
    fn test_close_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.mp4");
        write_frames(&path, 30.0, 1);
        let mut writer = FfmpegWriter::new();
        let _ = writer.close();
    }

    #[test]
    fn test_zero_fps_falls_back_to_default() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.mp4");
        write_frames(&path, 0.0, 1);
        assert!(path.exists());
    }

    #[test]
    fn test_rounded_fps() {
        assert_eq!(rounded_fps(29.97), 30);
        assert_eq!(rounded_fps(24.0), 24);
        assert_eq!(rounded_fps(0.0), DEFAULT_FPS);
        assert_eq!(rounded_fps(-5.0), DEFAULT_FPS);
    }

    #[test]
    fn test_roundtrip_readable_with_expected_content() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("roundtrip.mp4");
        write_frames(&path, 30.0, 3);

        let mut reader = FfmpegReader::new();
        let meta = reader.open(&path).unwrap();
        assert_eq!((meta.width, meta.height), (160, 120));

        let frames: Vec<_> = reader.frames().map(|f| f.unwrap()).collect();
        assert_eq!(frames.len(), 3);

        // Lossy codec, so only check overall brightness
        let first = &frames[0];
        let avg: f64 =
            first.data().iter().map(|&b| b as f64).sum::<f64>() / first.data().len() as f64;
        assert!(
            (avg - 128.0).abs() < 40.0,
            "Average pixel value {avg} should be close to 128"
        );
    }
}
