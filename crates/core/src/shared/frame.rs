use ndarray::{s, ArrayView3};

/// A single decoded raster: contiguous bytes in row-major order.
///
/// Video frames are RGB (3 channels); grayscale derivatives used for
/// landmark prediction and rendered masks are single-channel.
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

    /// A zero-filled single-channel canvas.
    pub fn blank_gray(width: u32, height: u32) -> Self {
        Self::new(vec![0; (width * height) as usize], width, height, 1, 0)
    }

    pub fn data(&self) -> &[u8] {
        &self.data
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

    /// Zero-based position of the frame in its source sequence.
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn as_ndarray(&self) -> ArrayView3<'_, u8> {
        ArrayView3::from_shape(self.shape(), &self.data)
            .expect("Frame data length must match dimensions")
    }

    /// Copies the `width` x `height` block starting at column `x`, row `y`.
    ///
    /// The block is clipped to the frame; the returned frame keeps this
    /// frame's index.
    pub fn crop(&self, x: u32, y: u32, width: u32, height: u32) -> Frame {
        let x1 = x.min(self.width) as usize;
        let y1 = y.min(self.height) as usize;
        let x2 = (x.saturating_add(width)).min(self.width) as usize;
        let y2 = (y.saturating_add(height)).min(self.height) as usize;

        let block = self.as_ndarray();
        let block = block.slice(s![y1..y2, x1..x2, ..]);
        let data: Vec<u8> = block.iter().copied().collect();

        Frame::new(
            data,
            (x2 - x1) as u32,
            (y2 - y1) as u32,
            self.channels,
            self.index,
        )
    }

    /// Luma conversion with ITU-R BT.601 weights. Single-channel frames are
    /// returned unchanged.
    pub fn to_grayscale(&self) -> Frame {
        if self.channels == 1 {
            return self.clone();
        }
        let channels = self.channels as usize;
        let data = self
            .data
            .chunks_exact(channels)
            .map(|px| {
                let luma = 0.299 * px[0] as f32 + 0.587 * px[1] as f32 + 0.114 * px[2] as f32;
                luma.round().clamp(0.0, 255.0) as u8
            })
            .collect();
        Frame::new(data, self.width, self.height, 1, self.index)
    }

    /// Averages non-overlapping `factor` x `factor` blocks per channel,
    /// rounding halves up. Rows and columns that do not fill a whole block
    /// are dropped.
    pub fn box_downsample(&self, factor: u32) -> Frame {
        let factor = factor.max(1);
        let (out_w, out_h) = (self.width / factor, self.height / factor);
        let f = factor as usize;
        let n = factor * factor;
        let channels = self.channels as usize;

        let pixels = self.as_ndarray();
        let mut data = Vec::with_capacity(out_w as usize * out_h as usize * channels);
        for row in 0..out_h as usize {
            for col in 0..out_w as usize {
                let block = pixels.slice(s![row * f..(row + 1) * f, col * f..(col + 1) * f, ..]);
                for c in 0..channels {
                    let sum: u32 = block.slice(s![.., .., c]).iter().map(|&v| v as u32).sum();
                    data.push(((2 * sum + n) / (2 * n)) as u8);
                }
            }
        }
        Frame::new(data, out_w, out_h, self.channels, self.index)
    }

    fn shape(&self) -> (usize, usize, usize) {
        (
            self.height as usize,
            self.width as usize,
            self.channels as usize,
        )
    }
}
