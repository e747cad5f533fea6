use std::path::Path;

use crate::shared::frame::Frame;
use crate::shared::video_metadata::VideoMetadata;
use crate::video::domain::video_reader::VideoReader;

/// Decodes video frames via ffmpeg-next (libavformat + libavcodec),
/// converting each one to RGB24.
pub struct FfmpegReader {
    input: Option<ffmpeg_next::format::context::Input>,
    stream_index: usize,
}

// Safety: FfmpegReader is only used from a single thread at a time.
// The raw pointers inside ffmpeg types are not shared across threads.
unsafe impl Send for FfmpegReader {}

impl FfmpegReader {
    pub fn new() -> Self {
        Self {
            input: None,
            stream_index: 0,
        }
    }
}

impl Default for FfmpegReader {
    fn default() -> Self {
        Self::new()
    }
}

impl VideoReader for FfmpegReader {
    fn open(&mut self, path: &Path) -> Result<VideoMetadata, Box<dyn std::error::Error>> {
        ffmpeg_next::init()?;

        let input = ffmpeg_next::format::input(path)?;
        let stream = input
            .streams()
            .best(ffmpeg_next::media::Type::Video)
            .ok_or("No video stream found")?;
        let stream_index = stream.index();

        let codec_ctx = ffmpeg_next::codec::context::Context::from_parameters(stream.parameters())?;
        let decoder = codec_ctx.decoder().video()?;

        let rate = stream.rate();
        let fps = if rate.denominator() != 0 {
            rate.numerator() as f64 / rate.denominator() as f64
        } else {
            0.0
        };

        let metadata = VideoMetadata {
            width: decoder.width(),
            height: decoder.height(),
            fps,
            total_frames: total_frames(&stream, fps),
            codec: decoder
                .codec()
                .map(|c| c.name().to_string())
                .unwrap_or_default(),
            source_path: Some(path.to_path_buf()),
        };

        self.stream_index = stream_index;
        self.input = Some(input);

        Ok(metadata)
    }

    fn frames(
        &mut self,
    ) -> Box<dyn Iterator<Item = Result<Frame, Box<dyn std::error::Error>>> + '_> {
        let stream_index = self.stream_index;
        let Some(input) = self.input.as_mut() else {
            return Box::new(std::iter::once(Err("FfmpegReader: not opened".into())));
        };

        match DecodedFrames::build(input, stream_index) {
            Ok(iter) => Box::new(iter),
            Err(e) => Box::new(std::iter::once(Err(e))),
        }
    }

    fn close(&mut self) {
        self.input = None;
    }
}

/// Frame count from the stream header, falling back to an estimate from the
/// stream duration when the container doesn't record one.
fn total_frames(stream: &ffmpeg_next::format::stream::Stream, fps: f64) -> usize {
    let declared = stream.frames();
    if declared > 0 {
        return declared as usize;
    }
    let duration = stream.duration();
    if duration > 0 && fps > 0.0 {
        let seconds = duration as f64 * f64::from(stream.time_base());
        return (seconds * fps).round() as usize;
    }
    0
}

/// Lazy decoding iterator; holds one in-flight frame at most rather than
/// buffering the whole video.
struct DecodedFrames<'a> {
    input: &'a mut ffmpeg_next::format::context::Input,
    decoder: ffmpeg_next::decoder::Video,
    scaler: ffmpeg_next::software::scaling::Context,
    width: u32,
    height: u32,
    stream_index: usize,
    next_index: usize,
    flushing: bool,
    done: bool,
}

impl<'a> DecodedFrames<'a> {
    fn build(
        input: &'a mut ffmpeg_next::format::context::Input,
        stream_index: usize,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        let stream = input
            .streams()
            .best(ffmpeg_next::media::Type::Video)
            .ok_or("No video stream found")?;
        let codec_ctx = ffmpeg_next::codec::context::Context::from_parameters(stream.parameters())?;
        let decoder = codec_ctx.decoder().video()?;

        let (width, height) = (decoder.width(), decoder.height());
        let scaler = ffmpeg_next::software::scaling::Context::get(
            decoder.format(),
            width,
            height,
            ffmpeg_next::format::Pixel::RGB24,
            width,
            height,
            ffmpeg_next::software::scaling::Flags::BILINEAR,
        )?;

        Ok(Self {
            input,
            decoder,
            scaler,
            width,
            height,
            stream_index,
            next_index: 0,
            flushing: false,
            done: false,
        })
    }

    fn receive_ready(&mut self) -> Option<Result<Frame, Box<dyn std::error::Error>>> {
        let mut decoded = ffmpeg_next::util::frame::video::Video::empty();
        if self.decoder.receive_frame(&mut decoded).is_err() {
            return None;
        }

        let mut rgb = ffmpeg_next::util::frame::video::Video::empty();
        if let Err(e) = self.scaler.run(&decoded, &mut rgb) {
            return Some(Err(Box::new(e)));
        }

        let pixels = strip_stride(&rgb, self.width, self.height);
        let frame = Frame::new(pixels, self.width, self.height, 3, self.next_index);
        self.next_index += 1;
        Some(Ok(frame))
    }
}

impl Iterator for DecodedFrames<'_> {
    type Item = Result<Frame, Box<dyn std::error::Error>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        if let Some(result) = self.receive_ready() {
            return Some(result);
        }

        if self.flushing {
            self.done = true;
            return None;
        }

        loop {
            let Some((stream, packet)) = self.input.packets().next() else {
                // Input exhausted; drain whatever the decoder still holds
                let _ = self.decoder.send_eof();
                self.flushing = true;
                if let Some(result) = self.receive_ready() {
                    return Some(result);
                }
                self.done = true;
                return None;
            };

            if stream.index() != self.stream_index {
                continue;
            }
            if self.decoder.send_packet(&packet).is_err() {
                continue;
            }
            if let Some(result) = self.receive_ready() {
                return Some(result);
            }
        }
    }
}

/// Copies pixel rows out of an ffmpeg RGB frame into a tightly packed
/// buffer, dropping the per-row alignment padding (stride > width*3).
pub(crate) fn strip_stride(
    rgb: &ffmpeg_next::util::frame::video::Video,
    width: u32,
    height: u32,
) -> Vec<u8> {
    let stride = rgb.stride(0);
    let data = rgb.data(0);
    let row_bytes = width as usize * 3;

    let mut pixels = Vec::with_capacity(row_bytes * height as usize);
    for row in 0..height as usize {
        let start = row * stride;
        pixels.extend_from_slice(&data[start..start + row_bytes]);
    }
    pixels
}

/// Encodes `num_frames` solid gray-scale frames (brightness varies per
/// frame) for reader-side tests.
#[cfg(test)]
pub(crate) fn create_test_video(path: &Path, num_frames: usize, width: u32, height: u32, fps: f64) {
    use crate::video::domain::video_writer::VideoWriter;
    use crate::video::infrastructure::ffmpeg_writer::FfmpegWriter;

    let metadata = VideoMetadata {
        width,
        height,
        fps,
        total_frames: num_frames,
        codec: String::new(),
        source_path: None,
    };

    let mut writer = FfmpegWriter::new();
    writer.open(path, &metadata).unwrap();
    for i in 0..num_frames {
        let value = ((i * 40) % 256) as u8;
        let frame = Frame::new(vec![value; (width * height * 3) as usize], width, height, 3, i);
        writer.write(&frame).unwrap();
    }
    writer.close().unwrap();
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn test_video(dir: &Path, num_frames: usize) -> PathBuf {
        let path = dir.join("test.mp4");
        create_test_video(&path, num_frames, 160, 120, 30.0);
        path
    }

    #[test]
    fn test_open_returns_metadata() {
        let dir = tempfile::tempdir().unwrap();
        let path = test_video(dir.path(), 5);

        let mut reader = FfmpegReader::new();
        let meta = reader.open(&path).unwrap();
        assert_eq!((meta.width, meta.height), (160, 120));
        assert!(meta.fps > 0.0);
        assert_eq!(meta.source_path, Some(path));
    }

    #[test]
    fn test_open_nonexistent_fails() {
        let mut reader = FfmpegReader::new();
        assert!(reader.open(Path::new("/nonexistent/test.mp4")).is_err());
    }

    #[test]
    fn test_decodes_all_frames_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = test_video(dir.path(), 5);

        let mut reader = FfmpegReader::new();
        reader.open(&path).unwrap();

        let frames: Vec<_> = reader.frames().map(|f| f.unwrap()).collect();
        assert_eq!(frames.len(), 5);
        for (i, frame) in frames.iter().enumerate() {
            assert_eq!(frame.index(), i);
        }
    }

    #[test]
    fn test_frames_are_packed_rgb() {
        let dir = tempfile::tempdir().unwrap();
        let path = test_video(dir.path(), 2);

        let mut reader = FfmpegReader::new();
        reader.open(&path).unwrap();

        let frame = reader.frames().next().unwrap().unwrap();
        assert_eq!(frame.channels(), 3);
        assert_eq!(frame.data().len(), 160 * 120 * 3);
    }

    #[test]
    fn test_frames_without_open_errors() {
        let mut reader = FfmpegReader::new();
        assert!(reader.frames().next().unwrap().is_err());
    }

    #[test]
    fn test_close_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let path = test_video(dir.path(), 1);

        let mut reader = FfmpegReader::new();
        reader.open(&path).unwrap();
        reader.close();
        reader.close();
    }
}
