//! Face-centred dataset preparation: square face crops with a per-utterance
//! fixed side length, landmarks normalised to the crop, and derived
//! landmark images.

pub mod alignment;
pub mod detection;
pub mod pipeline;
pub mod rendering;
pub mod shared;
pub mod video;
