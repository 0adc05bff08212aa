use crate::alignment::domain::crop_window::CropWindow;
use crate::detection::domain::face_landmarks::LandmarkSet;
use crate::shared::constants::TARGET_SIZE;

/// Re-projects source-frame landmarks into the pixel space of a crop that
/// has been resized to `target_size` x `target_size`.
///
/// Use the same window and target size as the image written alongside;
/// the image and landmark artifacts are only consistent as a pair.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CoordinateMapper {
    target_size: u32,
}

impl CoordinateMapper {
    pub fn new(target_size: u32) -> Self {
        Self { target_size }
    }

    pub fn target_size(&self) -> u32 {
        self.target_size
    }

    /// Output pixels per source pixel for `window`.
    pub fn scale(&self, window: &CropWindow) -> f64 {
        self.target_size as f64 / window.side().max(1) as f64
    }

    /// Translates by the window origin, then scales uniformly, truncating
    /// toward zero to whole pixels. Points outside the window map outside
    /// `[0, target_size)`; they are not clamped.
    pub fn map(&self, landmarks: &LandmarkSet, window: &CropWindow) -> LandmarkSet {
        let scale = self.scale(window);
        landmarks.map_points(|(x, y)| {
            let dx = (x - window.left) as f64 * scale;
            let dy = (y - window.top) as f64 * scale;
            (dx as i32, dy as i32)
        })
    }
}

impl Default for CoordinateMapper {
    fn default() -> Self {
        Self::new(TARGET_SIZE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::domain::face_landmarks::LANDMARK_COUNT;
    use approx::assert_relative_eq;
    use rstest::rstest;

    fn uniform(point: (i32, i32)) -> LandmarkSet {
        LandmarkSet::new([point; LANDMARK_COUNT])
    }

    fn scenario_window() -> CropWindow {
        CropWindow::new(58, 85, 169, 196)
    }

    #[test]
    fn test_scale() {
        let mapper = CoordinateMapper::new(256);
        assert_relative_eq!(mapper.scale(&scenario_window()), 256.0 / 111.0);
    }

    #[rstest]
    #[case::top_left((85, 58), (0, 0))]
    #[case::middle((140, 113), (126, 126))]
    #[case::just_inside((86, 59), (2, 2))]
    fn test_maps_window_points(#[case] source: (i32, i32), #[case] expected: (i32, i32)) {
        let mapper = CoordinateMapper::new(256);
        let mapped = mapper.map(&uniform(source), &scenario_window());
        assert_eq!(mapped.point(0), expected);
        assert_eq!(mapped.point(LANDMARK_COUNT - 1), expected);
    }

    #[test]
    fn test_bottom_right_corner_maps_to_target_size() {
        let mapper = CoordinateMapper::new(256);
        let (x, y) = mapper.map(&uniform((196, 169)), &scenario_window()).point(0);
        assert!((255..=256).contains(&x), "x = {x}");
        assert!((255..=256).contains(&y), "y = {y}");
    }

    #[test]
    fn test_fractional_coordinates_truncate() {
        // 35 and 42 px into the window scale to 80.7 and 96.9.
        let mapper = CoordinateMapper::new(256);
        let mapped = mapper.map(&uniform((120, 100)), &scenario_window());
        assert_eq!(mapped.point(0), (80, 96));
    }

    #[test]
    fn test_negative_offsets_truncate_toward_zero() {
        // -3 px at 256 / 111 scale is -6.9.
        let mapper = CoordinateMapper::new(256);
        let mapped = mapper.map(&uniform((82, 55)), &scenario_window());
        assert_eq!(mapped.point(0), (-6, -6));
    }

    #[test]
    fn test_input_is_not_mutated() {
        let mapper = CoordinateMapper::new(256);
        let original = uniform((100, 100));
        let _ = mapper.map(&original, &scenario_window());
        assert_eq!(original, uniform((100, 100)));
    }

    #[test]
    fn test_identity_when_window_matches_target() {
        let mapper = CoordinateMapper::new(128);
        let window = CropWindow::new(0, 0, 128, 128);
        let mut pts = [(0, 0); LANDMARK_COUNT];
        for (i, p) in pts.iter_mut().enumerate() {
            *p = (i as i32, 127 - i as i32);
        }
        let set = LandmarkSet::new(pts);
        assert_eq!(mapper.map(&set, &window), set);
    }

    #[test]
    fn test_points_outside_window_are_not_clamped() {
        let mapper = CoordinateMapper::new(200);
        let window = CropWindow::new(100, 100, 200, 200);
        let mapped = mapper.map(&uniform((90, 210)), &window);
        assert_eq!(mapped.point(0), (-20, 220));
    }

    #[test]
    fn test_default_target_size() {
        assert_eq!(CoordinateMapper::default().target_size(), 256);
    }
}
