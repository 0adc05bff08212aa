use crate::rendering::domain::landmark_renderer::LandmarkRenderer;

use super::face_mask_renderer::FaceMaskRenderer;
use super::line_image_renderer::LineImageRenderer;
use super::point_image_renderer::PointImageRenderer;

/// Derived image representation of a landmark set.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RenderKind {
    Points,
    Lines,
    Mask,
}

pub fn create_renderer(kind: RenderKind) -> Box<dyn LandmarkRenderer> {
    log::debug!("Using {kind:?} landmark renderer");
    match kind {
        RenderKind::Points => Box::new(PointImageRenderer::default()),
        RenderKind::Lines => Box::new(LineImageRenderer::new()),
        RenderKind::Mask => Box::new(FaceMaskRenderer::default()),
    }
}
