use std::path::Path;

use crate::detection::domain::face_landmarks::LandmarkSet;

/// Persists a landmark set as a 68x2 array.
pub trait LandmarkWriter: Send {
    fn write(&self, path: &Path, landmarks: &LandmarkSet)
        -> Result<(), Box<dyn std::error::Error>>;

    /// Whether a landmark set was already written at `path`.
    fn exists(&self, path: &Path) -> bool {
        path.is_file()
    }
}
