pub mod ffmpeg_reader;
pub mod image_file_reader;
pub mod image_file_writer;
pub mod npy_landmark_store;
