use std::path::PathBuf;

use crate::alignment::domain::coordinate_mapper::CoordinateMapper;
use crate::alignment::domain::frame_locator::FrameLocator;
use crate::shared::constants::{pre_resize_height, MARGIN_RATIO, RECENTER_RATIO, TARGET_SIZE};

/// Parameters of a video-to-training-pairs conversion run.
#[derive(Clone, Debug)]
pub struct ConvertConfig {
    /// Aligned crops are written at `target_size` x `target_size`.
    pub target_size: u32,
    pub margin_ratio: f64,
    pub recenter_ratio: f64,
    /// Root of the `<actor>/<utterance>/<NNN>.jpg` image store.
    pub image_root: PathBuf,
    /// Root of the `<actor>/<utterance>/<NNN>.npy` landmark store.
    pub landmark_root: PathBuf,
    /// Utterances converted in parallel.
    pub workers: usize,
}

impl ConvertConfig {
    pub fn new(image_root: PathBuf, landmark_root: PathBuf) -> Self {
        Self {
            target_size: TARGET_SIZE,
            margin_ratio: MARGIN_RATIO,
            recenter_ratio: RECENTER_RATIO,
            image_root,
            landmark_root,
            workers: 1,
        }
    }

    /// Row count frames are decoded at before detection.
    pub fn detection_height(&self) -> u32 {
        pre_resize_height(self.target_size)
    }

    pub fn locator(&self) -> FrameLocator {
        FrameLocator::new(self.margin_ratio, self.recenter_ratio)
    }

    pub fn mapper(&self) -> CoordinateMapper {
        CoordinateMapper::new(self.target_size)
    }
}
