use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use crate::pipeline::convert_utterance_use_case::{ConvertUtteranceUseCase, UtteranceReport};
use crate::pipeline::dataset_layout::UtteranceJob;
use crate::pipeline::pipeline_logger::PipelineLogger;

/// Builds one converter per worker. Each worker owns its reader, detector
/// and predictor, so the factory is called on the worker's thread.
pub type WorkerFactory =
    dyn Fn() -> Result<ConvertUtteranceUseCase, Box<dyn std::error::Error>> + Send + Sync;

/// Totals over every converted utterance.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DatasetReport {
    pub utterances: usize,
    pub frames_decoded: usize,
    pub frames_written: usize,
    pub frames_skipped: usize,
    pub frames_without_face: usize,
}

impl DatasetReport {
    pub fn add(&mut self, report: &UtteranceReport) {
        self.utterances += 1;
        self.frames_decoded += report.frames_decoded;
        self.frames_written += report.frames_written;
        self.frames_skipped += report.frames_skipped;
        self.frames_without_face += report.frames_without_face;
    }
}

/// Records one finished utterance on `logger`.
pub fn log_utterance(logger: &mut dyn PipelineLogger, report: &UtteranceReport) {
    logger.count("frames_decoded", report.frames_decoded);
    logger.count("frames_written", report.frames_written);
    logger.count("frames_skipped", report.frames_skipped);
    logger.count("frames_no_face", report.frames_without_face);
    logger.timing("detect", report.detect_ms);
    logger.timing("write", report.write_ms);
}

/// Abstracts how utterance jobs are scheduled onto converters.
///
/// Application-layer port; infrastructure provides the threaded fan-out.
pub trait DatasetExecutor: Send {
    /// Runs every job and returns the aggregated report. The first failing
    /// utterance aborts the run and its error is returned.
    fn execute(
        &self,
        jobs: Vec<UtteranceJob>,
        factory: Arc<WorkerFactory>,
        cancelled: Arc<AtomicBool>,
        logger: &mut dyn PipelineLogger,
    ) -> Result<DatasetReport, Box<dyn std::error::Error>>;
}
