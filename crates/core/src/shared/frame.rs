use ndarray::{ArrayView3, ArrayViewMut3};

/// A single video/image frame: contiguous RGB bytes in row-major order.
///
/// Format conversion happens at I/O boundaries only. The analysis layer
/// reads pixels through the ndarray views; the annotation layer draws
/// through the bounds-checked pixel accessors.
#[derive(Clone, Debug)]
pub struct Frame {
    data: Vec<u8>,
    width: u32,
    height: u32,
    channels: u8,
    index: usize,
}

impl Frame {
    pub fn new(data: Vec<u8>, width: u32, height: u32, channels: u8, index: usize) -> Self {
        debug_assert_eq!(
            data.len(),
            (width as usize) * (height as usize) * (channels as usize),
            "data length must equal width * height * channels"
        );
        Self {
            data,
            width,
            height,
            channels,
            index,
        }
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn channels(&self) -> u8 {
        self.channels
    }

    pub fn index(&self) -> usize {
        self.index
    }

    /// Reads one RGB pixel; `None` when the coordinates fall outside the
    /// frame or the frame is not 3-channel.
    pub fn pixel(&self, x: i32, y: i32) -> Option<[u8; 3]> {
        let offset = self.pixel_offset(x, y)?;
        Some([self.data[offset], self.data[offset + 1], self.data[offset + 2]])
    }

    /// Writes one RGB pixel, silently clipping out-of-bounds coordinates.
    /// Drawing code relies on the clipping to slide shapes off frame edges.
    pub fn set_pixel(&mut self, x: i32, y: i32, rgb: [u8; 3]) {
        if let Some(offset) = self.pixel_offset(x, y) {
            self.data[offset..offset + 3].copy_from_slice(&rgb);
        }
    }

    fn pixel_offset(&self, x: i32, y: i32) -> Option<usize> {
        if self.channels != 3 || x < 0 || y < 0 || x >= self.width as i32 || y >= self.height as i32
        {
            return None;
        }
        Some((y as usize * self.width as usize + x as usize) * 3)
    }

    pub fn as_ndarray(&self) -> ArrayView3<'_, u8> {
        ArrayView3::from_shape(self.shape(), &self.data)
            .expect("Frame data length must match dimensions")
    }

    pub fn as_ndarray_mut(&mut self) -> ArrayViewMut3<'_, u8> {
        ArrayViewMut3::from_shape(self.shape(), &mut self.data)
            .expect("Frame data length must match dimensions")
    }

    fn shape(&self) -> (usize, usize, usize) {
        (
            self.height as usize,
            self.width as usize,
            self.channels as usize,
        )
    }
}
