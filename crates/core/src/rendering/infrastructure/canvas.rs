//! Grayscale drawing helpers over `image::GrayImage`.

use image::{GrayImage, Luma};
use imageproc::drawing::draw_line_segment_mut;

use crate::shared::frame::Frame;

pub(super) const INK: Luma<u8> = Luma([255]);

pub(super) fn blank(width: u32, height: u32) -> Result<GrayImage, Box<dyn std::error::Error>> {
    if width == 0 || height == 0 {
        return Err(format!("Canvas must be non-empty, got {width}x{height}").into());
    }
    Ok(GrayImage::new(width, height))
}

pub(super) fn into_frame(canvas: GrayImage) -> Frame {
    let (width, height) = canvas.dimensions();
    Frame::new(canvas.into_raw(), width, height, 1, 0)
}

/// Connects consecutive points with 1px segments, and the last back to the
/// first when `closed`.
pub(super) fn draw_path(canvas: &mut GrayImage, points: &[(i32, i32)], closed: bool) {
    let as_f32 = |p: (i32, i32)| (p.0 as f32, p.1 as f32);
    for pair in points.windows(2) {
        draw_line_segment_mut(canvas, as_f32(pair[0]), as_f32(pair[1]), INK);
    }
    if closed && points.len() > 2 {
        draw_line_segment_mut(
            canvas,
            as_f32(points[points.len() - 1]),
            as_f32(points[0]),
            INK,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_rejects_empty_canvas() {
        assert!(blank(0, 10).is_err());
        assert!(blank(10, 0).is_err());
        assert_eq!(blank(4, 3).unwrap().dimensions(), (4, 3));
    }

    #[test]
    fn test_open_path_does_not_close() {
        let mut canvas = blank(10, 10).unwrap();
        draw_path(&mut canvas, &[(1, 1), (8, 1), (8, 8)], false);
        assert_eq!(canvas.get_pixel(4, 1).0, [255]);
        assert_eq!(canvas.get_pixel(8, 4).0, [255]);
        // Diagonal back to the start is absent.
        assert_eq!(canvas.get_pixel(4, 4).0, [0]);
    }

    #[test]
    fn test_closed_path_joins_ends() {
        let mut canvas = blank(10, 10).unwrap();
        draw_path(&mut canvas, &[(1, 1), (8, 1), (8, 8)], true);
        assert_eq!(canvas.get_pixel(4, 4).0, [255]);
    }

    #[test]
    fn test_into_frame_is_single_channel() {
        let frame = into_frame(blank(6, 4).unwrap());
        assert_eq!(frame.channels(), 1);
        assert_eq!((frame.width(), frame.height()), (6, 4));
    }
}
