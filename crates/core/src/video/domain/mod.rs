pub mod image_writer;
pub mod landmark_reader;
pub mod landmark_writer;
pub mod video_reader;
