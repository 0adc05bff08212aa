use crate::detection::domain::face_landmarks::LandmarkSet;
use crate::shared::frame::Frame;

/// Domain interface for drawing a landmark set onto a fresh canvas.
///
/// Implementations return a single-channel `width` x `height` frame, black
/// except for what they draw at 255. Points off the canvas are clipped.
pub trait LandmarkRenderer: Send + Sync {
    fn render(
        &self,
        landmarks: &LandmarkSet,
        width: u32,
        height: u32,
    ) -> Result<Frame, Box<dyn std::error::Error>>;
}
