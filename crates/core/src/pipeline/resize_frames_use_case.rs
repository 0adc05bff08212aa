use std::path::Path;

use crate::pipeline::dataset_layout::{discover_utterance_dirs, files_in};
use crate::pipeline::pipeline_logger::PipelineLogger;
use crate::shared::constants::IMAGE_EXTENSIONS;
use crate::video::domain::image_writer::ImageWriter;
use crate::video::domain::video_reader::VideoReader;

/// Shrinks an aligned frame dataset by an integer factor.
///
/// Every `<source_root>/<actor>/<utterance>/<file>` is box-averaged by
/// `height / target_size` and written to the same relative path under
/// `target_root`. Frames already at the target height are copied through
/// unchanged.
pub struct ResizeFramesUseCase {
    reader: Box<dyn VideoReader>,
    writer: Box<dyn ImageWriter>,
    target_size: u32,
    logger: Box<dyn PipelineLogger>,
}

impl ResizeFramesUseCase {
    pub fn new(
        reader: Box<dyn VideoReader>,
        writer: Box<dyn ImageWriter>,
        target_size: u32,
        logger: Box<dyn PipelineLogger>,
    ) -> Self {
        Self {
            reader,
            writer,
            target_size,
            logger,
        }
    }

    /// Returns the number of frames written.
    pub fn execute(
        &mut self,
        source_root: &Path,
        target_root: &Path,
    ) -> Result<usize, Box<dyn std::error::Error>> {
        let mut pending = Vec::new();
        for dir in discover_utterance_dirs(source_root)? {
            let out_dir = target_root.join(&dir.actor).join(&dir.utterance);
            for file in files_in(&dir.path, IMAGE_EXTENSIONS)? {
                let out = out_dir.join(file.file_name().ok_or("Frame path has no file name")?);
                pending.push((file, out));
            }
        }

        let total = pending.len();
        if total == 0 {
            log::warn!("No frames found under {}", source_root.display());
        }
        log::info!("Saving to: {}", target_root.display());

        for (i, (source, out)) in pending.iter().enumerate() {
            self.reader.open(source)?;
            let frame = self.reader.frames().next();
            self.reader.close();
            let frame = frame
                .unwrap_or_else(|| Err(format!("No frame decoded from {}", source.display()).into()))?;

            let factor = frame.height() / self.target_size;
            if factor == 0 {
                return Err(format!(
                    "{} is {} rows tall, smaller than the target {}",
                    source.display(),
                    frame.height(),
                    self.target_size
                )
                .into());
            }
            self.writer.write(out, &frame.box_downsample(factor), None)?;
            self.logger.progress(i + 1, total);
        }

        self.logger.count("frames_resized", total);
        self.logger.summary();
        Ok(total)
    }
}
