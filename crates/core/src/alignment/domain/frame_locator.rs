//! Square face crop placement with a per-utterance frozen side length.
//!
//! The window is centred on the face extent (brow line to lower jaw,
//! outer jaw points left/right), shifted upward by a fraction of the side,
//! then slid back inside the frame if it would cross an edge. Only the
//! centre follows the face from frame to frame; the side length comes from
//! the first located frame of the utterance so crops do not jitter in scale.

use crate::alignment::domain::crop_window::CropWindow;
use crate::alignment::domain::utterance_session::UtteranceSession;
use crate::detection::domain::face_landmarks::LandmarkSet;
use crate::shared::constants::{MARGIN_RATIO, RECENTER_RATIO};

/// Raw face bounds taken from individual landmarks.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FaceExtent {
    pub top: i32,
    pub bottom: i32,
    pub left: i32,
    pub right: i32,
}

impl FaceExtent {
    /// Brow line from points 19/24, lower jaw from 6..10, cheeks from
    /// jaw points 0..4 and 12..16.
    pub fn from_landmarks(landmarks: &LandmarkSet) -> Self {
        Self {
            top: landmarks.point(19).1.min(landmarks.point(24).1),
            bottom: landmarks.max_y(6..10),
            left: landmarks.min_x(0..4),
            right: landmarks.max_x(12..16),
        }
    }

    pub fn center(&self) -> (i32, i32) {
        (
            (self.left + self.right).div_euclid(2),
            (self.top + self.bottom).div_euclid(2),
        )
    }

    pub fn height(&self) -> i32 {
        self.bottom - self.top
    }
}

#[derive(Clone, Copy, Debug)]
pub struct FrameLocator {
    margin_ratio: f64,
    recenter_ratio: f64,
}

impl FrameLocator {
    pub fn new(margin_ratio: f64, recenter_ratio: f64) -> Self {
        Self {
            margin_ratio,
            recenter_ratio,
        }
    }

    /// Computes the crop window for one frame of `(height, width)` pixels.
    ///
    /// Seeds `session` on its first call; later calls reuse the stored
    /// side and only recompute the centre.
    pub fn locate(
        &self,
        landmarks: &LandmarkSet,
        frame_shape: (u32, u32),
        session: &mut UtteranceSession,
    ) -> CropWindow {
        let (frame_h, frame_w) = (frame_shape.0 as i32, frame_shape.1 as i32);
        let extent = FaceExtent::from_landmarks(landmarks);

        let side = session.side_or_seed_with(|| {
            let raw = extent.height();
            let margin = round_half_even(self.margin_ratio * raw as f64);
            (raw + margin).max(1)
        });

        let (center_x, center_y) = extent.center();
        let center_y = center_y - round_half_even(self.recenter_ratio * side as f64);

        // A frame smaller than the frozen side still gets a square,
        // in-bounds window.
        let fitted = side.min(frame_w).min(frame_h).max(1);

        let (left, right) = place(center_x, fitted, frame_w);
        let (top, bottom) = place(center_y, fitted, frame_h);
        CropWindow::new(top, left, bottom, right)
    }
}

impl Default for FrameLocator {
    fn default() -> Self {
        Self::new(MARGIN_RATIO, RECENTER_RATIO)
    }
}

/// Places a span of `side` pixels centred on `center` within `[0, extent)`,
/// anchoring it to the nearer edge when centring would cross one.
fn place(center: i32, side: i32, extent: i32) -> (i32, i32) {
    let start = center - side / 2;
    if start < 0 {
        (0, side)
    } else if start + side > extent {
        (extent - side, extent)
    } else {
        (start, start + side)
    }
}

/// Python-style rounding (ties to even) for the ratio terms.
fn round_half_even(value: f64) -> i32 {
    value.round_ties_even() as i32
}
