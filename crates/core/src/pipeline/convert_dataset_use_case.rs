use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use crate::pipeline::convert_config::ConvertConfig;
use crate::pipeline::dataset_executor::{DatasetExecutor, DatasetReport, WorkerFactory};
use crate::pipeline::dataset_layout::discover_utterances;
use crate::pipeline::pipeline_logger::PipelineLogger;

/// Converts every `<video_root>/<actor>/<utterance>` video into aligned
/// training pairs.
///
/// Discovers the utterances, prepares the per-actor output directories and
/// delegates the per-utterance work to a [`DatasetExecutor`].
pub struct ConvertDatasetUseCase {
    executor: Box<dyn DatasetExecutor>,
    logger: Box<dyn PipelineLogger>,
    config: ConvertConfig,
}

impl ConvertDatasetUseCase {
    pub fn new(
        executor: Box<dyn DatasetExecutor>,
        logger: Box<dyn PipelineLogger>,
        config: ConvertConfig,
    ) -> Self {
        Self {
            executor,
            logger,
            config,
        }
    }

    pub fn execute(
        &mut self,
        video_root: &Path,
        factory: Arc<WorkerFactory>,
        cancelled: Arc<AtomicBool>,
    ) -> Result<DatasetReport, Box<dyn std::error::Error>> {
        let jobs = discover_utterances(video_root)?;
        if jobs.is_empty() {
            log::warn!("No utterance videos found under {}", video_root.display());
            return Ok(DatasetReport::default());
        }

        for job in &jobs {
            for root in [&self.config.image_root, &self.config.landmark_root] {
                let actor_dir = root.join(&job.actor);
                if !actor_dir.is_dir() {
                    std::fs::create_dir_all(&actor_dir)
                        .map_err(|e| format!("Cannot create {}: {e}", actor_dir.display()))?;
                }
            }
        }

        let report = self
            .executor
            .execute(jobs, factory, cancelled, self.logger.as_mut())?;
        self.logger.summary();
        Ok(report)
    }
}
