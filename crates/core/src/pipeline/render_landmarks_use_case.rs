use std::path::{Path, PathBuf};

use crate::pipeline::dataset_layout::{discover_utterance_dirs, files_in};
use crate::pipeline::pipeline_logger::PipelineLogger;
use crate::rendering::domain::landmark_renderer::LandmarkRenderer;
use crate::shared::constants::{IMAGE_OUTPUT_EXTENSION, LANDMARK_OUTPUT_EXTENSION};
use crate::video::domain::image_writer::ImageWriter;
use crate::video::domain::landmark_reader::LandmarkReader;

/// Renders every stored landmark set of a dataset to an image.
///
/// Reads `<landmark_root>/<actor>/<utterance>/<NNN>.npy` and writes
/// `<target_root>/<actor>/<utterance>/<NNN>.jpg` on a `size x size` canvas.
pub struct RenderLandmarksUseCase {
    reader: Box<dyn LandmarkReader>,
    renderer: Box<dyn LandmarkRenderer>,
    writer: Box<dyn ImageWriter>,
    size: u32,
    logger: Box<dyn PipelineLogger>,
}

impl RenderLandmarksUseCase {
    pub fn new(
        reader: Box<dyn LandmarkReader>,
        renderer: Box<dyn LandmarkRenderer>,
        writer: Box<dyn ImageWriter>,
        size: u32,
        logger: Box<dyn PipelineLogger>,
    ) -> Self {
        Self {
            reader,
            renderer,
            writer,
            size,
            logger,
        }
    }

    /// Returns the number of images written.
    pub fn execute(
        &mut self,
        landmark_root: &Path,
        target_root: &Path,
    ) -> Result<usize, Box<dyn std::error::Error>> {
        let mut pending: Vec<(PathBuf, PathBuf)> = Vec::new();
        for dir in discover_utterance_dirs(landmark_root)? {
            let out_dir = target_root.join(&dir.actor).join(&dir.utterance);
            for file in files_in(&dir.path, &[LANDMARK_OUTPUT_EXTENSION])? {
                let out = out_dir.join(format!("{}.{IMAGE_OUTPUT_EXTENSION}", base_name(&file)));
                pending.push((file, out));
            }
        }

        let total = pending.len();
        if total == 0 {
            log::warn!("No landmark files found under {}", landmark_root.display());
        }
        for (i, (source, out)) in pending.iter().enumerate() {
            let landmarks = self
                .reader
                .read(source)
                .map_err(|e| format!("{}: {e}", source.display()))?;
            let image = self.renderer.render(&landmarks, self.size, self.size)?;
            self.writer.write(out, &image, None)?;
            self.logger.progress(i + 1, total);
        }

        self.logger.count("images_rendered", total);
        self.logger.summary();
        Ok(total)
    }
}

/// File name up to its first `.`; `001.npy` gives `001`.
fn base_name(path: &Path) -> String {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    match name.split_once('.') {
        Some((base, _)) => base.to_string(),
        None => name,
    }
}
