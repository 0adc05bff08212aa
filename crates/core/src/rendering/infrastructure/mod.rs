mod canvas;
pub mod face_mask_renderer;
pub mod line_image_renderer;
pub mod point_image_renderer;
pub mod renderer_factory;
