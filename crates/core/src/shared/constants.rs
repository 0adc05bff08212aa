/// Side length of the square face crops written for training.
pub const TARGET_SIZE: u32 = 256;

/// Frames are downscaled to `PRE_RESIZE_FACTOR * TARGET_SIZE` rows before
/// detection. Crop geometry is computed in that space.
pub const PRE_RESIZE_FACTOR: f64 = 1.65;

/// Fraction of the brow-to-jaw span added to the crop side.
pub const MARGIN_RATIO: f64 = 0.85;

/// Fraction of the crop side the window is shifted upward.
pub const RECENTER_RATIO: f64 = 0.15;

/// Canvas size for rendered landmark point/line images.
pub const LANDMARK_IMAGE_SIZE: u32 = 128;

/// Eyebrow points are raised by this many pixels when building face masks.
pub const MASK_BROW_LIFT: i32 = 10;

/// Digits in zero-padded frame file stems (`001.jpg`).
pub const FRAME_INDEX_WIDTH: usize = 3;

/// Frames sampled per utterance when computing dataset statistics.
pub const STATS_FRAMES_PER_UTTERANCE: usize = 5;

/// Filesystem entries that are never treated as dataset content.
pub const IGNORED_ENTRIES: &[&str] = &[".DS_Store"];

pub const VIDEO_EXTENSIONS: &[&str] = &["mp4", "avi", "mov", "mkv", "webm"];

pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "bmp", "tiff", "tif", "webp"];

pub const IMAGE_OUTPUT_EXTENSION: &str = "jpg";
pub const LANDMARK_OUTPUT_EXTENSION: &str = "npy";
pub const MASK_OUTPUT_EXTENSION: &str = "png";

/// Row count frames are decoded at before detection (`int(1.65 * 256)` = 422).
pub fn pre_resize_height(target_size: u32) -> u32 {
    (PRE_RESIZE_FACTOR * target_size as f64) as u32
}
