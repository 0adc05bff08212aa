use std::path::Path;

use image::{ColorType, DynamicImage};

use crate::shared::frame::Frame;
use crate::shared::video_metadata::VideoMetadata;
use crate::video::domain::video_reader::VideoReader;

/// Reads a still image as a one-frame video (`fps=0`, `total_frames=1`).
///
/// Every image comes out as 8-bit RGB whatever its stored colour type, so
/// still-image datasets and aligned frame folders share the detection and
/// statistics paths with decoded video.
pub struct ImageFileReader {
    frame: Option<Frame>,
}

impl ImageFileReader {
    pub fn new() -> Self {
        Self { frame: None }
    }
}

impl Default for ImageFileReader {
    fn default() -> Self {
        Self::new()
    }
}

/// Converts any decoded image to packed RGB24.
///
/// Gray channels are replicated, alpha is discarded without compositing and
/// deeper samples are scaled down to 8 bits.
fn to_rgb_frame(image: DynamicImage) -> Frame {
    let rgb = match image {
        DynamicImage::ImageRgb8(rgb) => rgb,
        other => {
            match other.color() {
                ColorType::L8 | ColorType::La8 => log::trace!("Expanding grayscale image to RGB"),
                ColorType::Rgba8 => log::trace!("Dropping alpha channel"),
                color => log::trace!("Converting {color:?} image to RGB8"),
            }
            other.to_rgb8()
        }
    };
    let (width, height) = rgb.dimensions();
    Frame::new(rgb.into_raw(), width, height, 3, 0)
}

impl VideoReader for ImageFileReader {
    fn open(&mut self, path: &Path) -> Result<VideoMetadata, Box<dyn std::error::Error>> {
        let image = image::open(path)
            .map_err(|e| format!("Failed to read image {}: {e}", path.display()))?;
        let frame = to_rgb_frame(image);
        let (width, height) = (frame.width(), frame.height());
        self.frame = Some(frame);

        Ok(VideoMetadata {
            width,
            height,
            fps: 0.0,
            total_frames: 1,
            codec: String::new(),
            source_path: Some(path.to_path_buf()),
        })
    }

    fn frames(
        &mut self,
    ) -> Box<dyn Iterator<Item = Result<Frame, Box<dyn std::error::Error>>> + '_> {
        if self.frame.is_none() {
            return Box::new(std::iter::once(Err("ImageFileReader: not opened".into())));
        }
        Box::new(self.frame.take().into_iter().map(Ok))
    }

    fn close(&mut self) {
        self.frame = None;
    }
}
