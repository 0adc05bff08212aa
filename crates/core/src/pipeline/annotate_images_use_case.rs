use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::detection::domain::face_landmarker::FaceLandmarker;
use crate::pipeline::dataset_layout::{discover_files, mirrored_path};
use crate::pipeline::pipeline_logger::PipelineLogger;
use crate::rendering::domain::landmark_renderer::LandmarkRenderer;
use crate::shared::constants::{IMAGE_EXTENSIONS, LANDMARK_OUTPUT_EXTENSION};
use crate::shared::frame::Frame;
use crate::video::domain::image_writer::ImageWriter;
use crate::video::domain::landmark_writer::LandmarkWriter;
use crate::video::domain::video_reader::VideoReader;

/// An extra image rendered from each landmark set, mirrored under `root`.
struct DerivedOutput {
    root: PathBuf,
    renderer: Box<dyn LandmarkRenderer>,
    extension: &'static str,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AnnotateReport {
    pub images: usize,
    pub annotated: usize,
    pub without_face: usize,
}

/// Annotates a tree of still images with landmarks.
///
/// For every image under the input root the first face's landmarks are
/// written, in source-image pixels, to the mirrored path under the landmark
/// root. Derived images (face masks, line drawings) are rendered at the
/// source image's size. Images without a face produce no output.
pub struct AnnotateImagesUseCase {
    reader: Box<dyn VideoReader>,
    landmarker: FaceLandmarker,
    landmark_writer: Box<dyn LandmarkWriter>,
    image_writer: Box<dyn ImageWriter>,
    landmark_root: PathBuf,
    derived: Vec<DerivedOutput>,
    logger: Box<dyn PipelineLogger>,
    cancelled: Arc<AtomicBool>,
}

impl AnnotateImagesUseCase {
    pub fn new(
        reader: Box<dyn VideoReader>,
        landmarker: FaceLandmarker,
        landmark_writer: Box<dyn LandmarkWriter>,
        image_writer: Box<dyn ImageWriter>,
        landmark_root: PathBuf,
        logger: Box<dyn PipelineLogger>,
        cancelled: Arc<AtomicBool>,
    ) -> Self {
        Self {
            reader,
            landmarker,
            landmark_writer,
            image_writer,
            landmark_root,
            derived: Vec::new(),
            logger,
            cancelled,
        }
    }

    /// Also renders each landmark set with `renderer` into `root`, using
    /// `extension` for the output files.
    pub fn with_derived(
        mut self,
        root: PathBuf,
        renderer: Box<dyn LandmarkRenderer>,
        extension: &'static str,
    ) -> Self {
        self.derived.push(DerivedOutput {
            root,
            renderer,
            extension,
        });
        self
    }

    pub fn execute(&mut self, image_root: &Path) -> Result<AnnotateReport, Box<dyn std::error::Error>> {
        let files = discover_files(image_root, IMAGE_EXTENSIONS)?;
        let total = files.len();
        if total == 0 {
            log::warn!("No images found under {}", image_root.display());
        }

        let mut report = AnnotateReport::default();
        for (i, path) in files.iter().enumerate() {
            if self.cancelled.load(Ordering::Relaxed) {
                return Err("Cancelled".into());
            }
            let frame = self.read_image(path)?;
            report.images += 1;

            let Some(landmarks) = self.landmarker.landmarks(&frame)? else {
                log::debug!("No face in {}", path.display());
                report.without_face += 1;
                self.logger.progress(i + 1, total);
                continue;
            };

            let landmark_path =
                mirrored_path(path, image_root, &self.landmark_root, LANDMARK_OUTPUT_EXTENSION)?;
            self.landmark_writer.write(&landmark_path, &landmarks)?;

            for output in &self.derived {
                let rendered = output
                    .renderer
                    .render(&landmarks, frame.width(), frame.height())?;
                let out_path = mirrored_path(path, image_root, &output.root, output.extension)?;
                self.image_writer.write(&out_path, &rendered, None)?;
            }
            report.annotated += 1;
            self.logger.progress(i + 1, total);
        }

        self.logger.count("images_annotated", report.annotated);
        self.logger.count("images_no_face", report.without_face);
        self.logger.summary();
        Ok(report)
    }

    fn read_image(&mut self, path: &Path) -> Result<Frame, Box<dyn std::error::Error>> {
        self.reader
            .open(path)
            .map_err(|e| format!("Cannot open {}: {e}", path.display()))?;
        let first = self.reader.frames().next();
        self.reader.close();
        match first {
            Some(frame) => frame,
            None => Err(format!("No frame decoded from {}", path.display()).into()),
        }
    }
}
