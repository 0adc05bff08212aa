//! Filled face silhouette used to separate face pixels from background.
//!
//! The outline runs along the jaw, then back across the brows. The brow
//! points are lifted so the forehead band just above the eyebrows is
//! inside the mask.

use std::ops::Range;

use imageproc::drawing::draw_polygon_mut;
use imageproc::point::Point;

use crate::detection::domain::face_landmarks::{LandmarkSet, JAW};
use crate::rendering::domain::landmark_renderer::LandmarkRenderer;
use crate::shared::constants::MASK_BROW_LIFT;
use crate::shared::frame::Frame;

use super::canvas;

const MASK_RIGHT_BROW: Range<usize> = 17..20;
const MASK_LEFT_BROW: Range<usize> = 24..27;

pub struct FaceMaskRenderer {
    brow_lift: i32,
}

impl FaceMaskRenderer {
    pub fn new(brow_lift: i32) -> Self {
        Self { brow_lift }
    }

    /// Polygon vertices: jaw left to right, then each brow reversed and
    /// lifted, without repeated vertices.
    fn outline(&self, landmarks: &LandmarkSet) -> Vec<Point<i32>> {
        let lift = |&(x, y): &(i32, i32)| Point::new(x, y - self.brow_lift);
        let mut outline: Vec<Point<i32>> = landmarks
            .group(JAW)
            .iter()
            .map(|&(x, y)| Point::new(x, y))
            .chain(landmarks.group(MASK_LEFT_BROW).iter().rev().map(lift))
            .chain(landmarks.group(MASK_RIGHT_BROW).iter().rev().map(lift))
            .collect();

        outline.dedup();
        while outline.len() > 1 && outline.first() == outline.last() {
            outline.pop();
        }
        outline
    }
}

impl Default for FaceMaskRenderer {
    fn default() -> Self {
        Self::new(MASK_BROW_LIFT)
    }
}

impl LandmarkRenderer for FaceMaskRenderer {
    fn render(
        &self,
        landmarks: &LandmarkSet,
        width: u32,
        height: u32,
    ) -> Result<Frame, Box<dyn std::error::Error>> {
        let mut img = canvas::blank(width, height)?;
        let outline = self.outline(landmarks);
        if outline.len() >= 3 {
            draw_polygon_mut(&mut img, &outline, canvas::INK);
        } else {
            log::debug!("Degenerate face outline, mask left empty");
        }
        Ok(canvas::into_frame(img))
    }
}
