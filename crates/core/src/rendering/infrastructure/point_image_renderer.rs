use imageproc::drawing::draw_filled_circle_mut;

use crate::detection::domain::face_landmarks::LandmarkSet;
use crate::rendering::domain::landmark_renderer::LandmarkRenderer;
use crate::shared::frame::Frame;

use super::canvas;

const DEFAULT_RADIUS: i32 = 1;

/// Draws every landmark as a filled dot.
pub struct PointImageRenderer {
    radius: i32,
}

impl PointImageRenderer {
    pub fn new(radius: i32) -> Self {
        Self { radius }
    }
}

impl Default for PointImageRenderer {
    fn default() -> Self {
        Self::new(DEFAULT_RADIUS)
    }
}

impl LandmarkRenderer for PointImageRenderer {
    fn render(
        &self,
        landmarks: &LandmarkSet,
        width: u32,
        height: u32,
    ) -> Result<Frame, Box<dyn std::error::Error>> {
        let mut img = canvas::blank(width, height)?;
        for &point in landmarks.points() {
            draw_filled_circle_mut(&mut img, point, self.radius, canvas::INK);
        }
        Ok(canvas::into_frame(img))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::domain::face_landmarks::LANDMARK_COUNT;

    fn pixel(frame: &Frame, x: u32, y: u32) -> u8 {
        frame.data()[(y * frame.width() + x) as usize]
    }

    #[test]
    fn test_dot_has_radius_one() {
        let set = LandmarkSet::new([(64, 64); LANDMARK_COUNT]);
        let frame = PointImageRenderer::default().render(&set, 128, 128).unwrap();

        assert_eq!(pixel(&frame, 64, 64), 255);
        assert_eq!(pixel(&frame, 65, 64), 255);
        assert_eq!(pixel(&frame, 64, 63), 255);
        assert_eq!(pixel(&frame, 67, 64), 0);
        assert_eq!(pixel(&frame, 0, 0), 0);
    }

    #[test]
    fn test_each_landmark_is_drawn() {
        let mut pts = [(10, 10); LANDMARK_COUNT];
        pts[30] = (100, 20);
        pts[67] = (20, 100);
        let frame = PointImageRenderer::default()
            .render(&LandmarkSet::new(pts), 128, 128)
            .unwrap();
        assert_eq!(pixel(&frame, 10, 10), 255);
        assert_eq!(pixel(&frame, 100, 20), 255);
        assert_eq!(pixel(&frame, 20, 100), 255);
    }

    #[test]
    fn test_points_off_canvas_are_clipped() {
        let mut pts = [(-20, -20); LANDMARK_COUNT];
        pts[0] = (128, 64);
        let frame = PointImageRenderer::default()
            .render(&LandmarkSet::new(pts), 128, 128)
            .unwrap();
        // Only the left edge of the dot lands on the canvas.
        assert_eq!(pixel(&frame, 127, 64), 255);
        let lit = frame.data().iter().filter(|&&v| v == 255).count();
        assert!((1..=3).contains(&lit), "{lit} pixels lit");
    }
}
