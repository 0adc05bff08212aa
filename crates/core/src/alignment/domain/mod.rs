pub mod coordinate_mapper;
pub mod crop_window;
pub mod frame_locator;
pub mod utterance_session;
