pub mod annotate_images_use_case;
pub mod convert_config;
pub mod convert_dataset_use_case;
pub mod convert_utterance_use_case;
pub mod dataset_executor;
pub mod dataset_layout;
pub mod group_utterances_use_case;
pub mod image_statistics_use_case;
pub mod infrastructure;
pub mod pipeline_logger;
pub mod render_landmarks_use_case;
pub mod resize_frames_use_case;
