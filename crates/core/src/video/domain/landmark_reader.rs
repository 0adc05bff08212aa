use std::path::Path;

use crate::detection::domain::face_landmarks::LandmarkSet;

/// Loads a landmark set written by a [`LandmarkWriter`](super::landmark_writer::LandmarkWriter).
pub trait LandmarkReader: Send {
    fn read(&self, path: &Path) -> Result<LandmarkSet, Box<dyn std::error::Error>>;
}
