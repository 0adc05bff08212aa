use crate::detection::domain::face_landmarks::LandmarkSet;
use crate::shared::frame::Frame;
use crate::shared::region::Region;

/// Domain interface for 68-point landmark regression.
///
/// `gray` is the single-channel version of the frame the `face` region was
/// detected in; returned coordinates are pixels of that frame.
pub trait LandmarkPredictor: Send {
    fn predict(
        &mut self,
        gray: &Frame,
        face: &Region,
    ) -> Result<LandmarkSet, Box<dyn std::error::Error>>;
}
