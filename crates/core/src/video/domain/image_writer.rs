use std::path::Path;

use crate::shared::frame::Frame;

/// Persists a frame as a standard raster image (format chosen by the path
/// extension).
pub trait ImageWriter: Send {
    /// Writes `frame` to `path`, resizing to `size` first when given.
    /// Parent directories are created as needed.
    fn write(
        &self,
        path: &Path,
        frame: &Frame,
        size: Option<(u32, u32)>,
    ) -> Result<(), Box<dyn std::error::Error>>;

    /// Whether an image was already written at `path`.
    fn exists(&self, path: &Path) -> bool {
        path.is_file()
    }
}
