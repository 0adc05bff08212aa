pub mod constants;
pub mod frame;
pub mod frame_key;
pub mod region;
pub mod video_metadata;
