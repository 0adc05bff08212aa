use std::ops::Range;

use crate::detection::domain::face_landmarks::{
    LandmarkSet, INNER_LIP, JAW, LEFT_EYE, LEFT_EYEBROW, NOSE_BASE, NOSE_BRIDGE, RIGHT_EYE,
    RIGHT_EYEBROW,
};
use crate::rendering::domain::landmark_renderer::LandmarkRenderer;
use crate::shared::frame::Frame;

use super::canvas;

/// Outer lip contour as traced in line images: point 59 is left out.
const LINE_OUTER_LIP: Range<usize> = 48..59;

const OPEN_STROKES: [Range<usize>; 5] = [JAW, RIGHT_EYEBROW, LEFT_EYEBROW, NOSE_BRIDGE, NOSE_BASE];
const CLOSED_STROKES: [Range<usize>; 4] = [RIGHT_EYE, LEFT_EYE, LINE_OUTER_LIP, INNER_LIP];

/// Draws the face as a 1px line sketch: jaw, brows and nose as open
/// polylines, eyes and lips as closed contours.
#[derive(Default)]
pub struct LineImageRenderer;

impl LineImageRenderer {
    pub fn new() -> Self {
        Self
    }
}

impl LandmarkRenderer for LineImageRenderer {
    fn render(
        &self,
        landmarks: &LandmarkSet,
        width: u32,
        height: u32,
    ) -> Result<Frame, Box<dyn std::error::Error>> {
        let mut img = canvas::blank(width, height)?;
        for stroke in OPEN_STROKES {
            canvas::draw_path(&mut img, landmarks.group(stroke), false);
        }
        for stroke in CLOSED_STROKES {
            canvas::draw_path(&mut img, landmarks.group(stroke), true);
        }
        Ok(canvas::into_frame(img))
    }
}
