use std::path::Path;

use crate::shared::frame::Frame;
use crate::shared::video_metadata::VideoMetadata;

/// Decodes an utterance video (or a still image) into RGB frames.
///
/// Frames are yielded strictly in decode order with consecutive zero-based
/// indices. A reader can be reopened on another path after `close`.
pub trait VideoReader: Send {
    /// Opens a video or image file and returns the metadata of the frames
    /// the reader will yield.
    fn open(&mut self, path: &Path) -> Result<VideoMetadata, Box<dyn std::error::Error>>;

    /// Returns an iterator over frames in decode order.
    fn frames(
        &mut self,
    ) -> Box<dyn Iterator<Item = Result<Frame, Box<dyn std::error::Error>>> + '_>;

    /// Releases any resources held by the reader.
    fn close(&mut self);
}
