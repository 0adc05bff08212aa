use std::path::Path;

use crate::shared::frame::Frame;
use crate::video::domain::image_writer::ImageWriter;

/// Writes a single frame to an image file using the `image` crate.
///
/// RGB frames become colour images and single-channel frames (masks,
/// rendered landmarks) become grayscale images. The encoder follows the
/// path extension.
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

fn resized<P>(
    img: image::ImageBuffer<P, Vec<u8>>,
    size: Option<(u32, u32)>,
) -> image::ImageBuffer<P, Vec<u8>>
where
    P: image::Pixel<Subpixel = u8> + 'static,
{
    match size {
        Some((w, h)) if (w, h) != img.dimensions() => {
            image::imageops::resize(&img, w, h, image::imageops::FilterType::Triangle)
        }
        _ => img,
    }
}

impl ImageWriter for ImageFileWriter {
    fn write(
        &self,
        path: &Path,
        frame: &Frame,
        size: Option<(u32, u32)>,
    ) -> Result<(), Box<dyn std::error::Error>> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let (width, height) = (frame.width(), frame.height());
        match frame.channels() {
            1 => {
                let img = image::GrayImage::from_raw(width, height, frame.data().to_vec())
                    .ok_or("Failed to create grayscale image from frame data")?;
                resized(img, size).save(path)?;
            }
            3 => {
                let img = image::RgbImage::from_raw(width, height, frame.data().to_vec())
                    .ok_or("Failed to create image from frame data")?;
                resized(img, size).save(path)?;
            }
            n => return Err(format!("Unsupported channel count: {n}").into()),
        }
        Ok(())
    }
}
