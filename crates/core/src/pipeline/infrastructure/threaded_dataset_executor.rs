use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::pipeline::convert_utterance_use_case::UtteranceReport;
use crate::pipeline::dataset_executor::{log_utterance, DatasetExecutor, DatasetReport, WorkerFactory};
use crate::pipeline::dataset_layout::UtteranceJob;
use crate::pipeline::pipeline_logger::PipelineLogger;

const DEFAULT_CHANNEL_CAPACITY: usize = 8;

type SendError = Box<dyn std::error::Error + Send + Sync>;
type JobOutcome = Result<(UtteranceJob, UtteranceReport), SendError>;

/// Converts utterances on a fixed pool of worker threads.
///
/// Layout: `feeder → [worker × N] → main [aggregate/log]`
///
/// Jobs are handed out over a bounded channel, so workers pick up the next
/// utterance as soon as they finish one. Results arrive in completion
/// order.
pub struct ThreadedDatasetExecutor {
    workers: usize,
    channel_capacity: usize,
}

impl ThreadedDatasetExecutor {
    pub fn new(workers: usize) -> Self {
        Self {
            workers: workers.max(1),
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
        }
    }
}

impl Default for ThreadedDatasetExecutor {
    fn default() -> Self {
        Self::new(1)
    }
}

impl DatasetExecutor for ThreadedDatasetExecutor {
    fn execute(
        &self,
        jobs: Vec<UtteranceJob>,
        factory: Arc<WorkerFactory>,
        cancelled: Arc<AtomicBool>,
        logger: &mut dyn PipelineLogger,
    ) -> Result<DatasetReport, Box<dyn std::error::Error>> {
        let total = jobs.len();
        if total == 0 {
            return Ok(DatasetReport::default());
        }
        let workers = self.workers.min(total);
        let cap = self.channel_capacity;
        logger.info(&format!("Converting {total} utterances with {workers} workers"));

        // Set when an utterance fails so idle workers stop taking jobs.
        let aborted = Arc::new(AtomicBool::new(false));

        let (job_tx, job_rx) = crossbeam_channel::bounded::<UtteranceJob>(cap);
        let (result_tx, result_rx) = crossbeam_channel::bounded::<JobOutcome>(cap);

        let feeder_handle = spawn_feeder(jobs, job_tx, cancelled.clone(), aborted.clone());
        let worker_handles: Vec<_> = (0..workers)
            .map(|id| {
                spawn_worker(
                    id,
                    factory.clone(),
                    job_rx.clone(),
                    result_tx.clone(),
                    cancelled.clone(),
                    aborted.clone(),
                )
            })
            .collect();
        drop(job_rx);
        drop(result_tx);

        let mut report = DatasetReport::default();
        let mut first_error: Option<Box<dyn std::error::Error>> = None;
        for outcome in result_rx.iter() {
            match outcome {
                Ok((job, utterance_report)) => {
                    log::debug!(
                        "{}/{}: {} written, {} skipped, {} without face",
                        job.actor,
                        job.utterance,
                        utterance_report.frames_written,
                        utterance_report.frames_skipped,
                        utterance_report.frames_without_face
                    );
                    report.add(&utterance_report);
                    log_utterance(logger, &utterance_report);
                    logger.progress(report.utterances, total);
                }
                Err(e) => {
                    first_error = Some(e.to_string().into());
                    aborted.store(true, Ordering::Relaxed);
                    break;
                }
            }
        }
        drop(result_rx);

        join_threads(feeder_handle, worker_handles, first_error)?;

        if cancelled.load(Ordering::Relaxed) {
            return Err("Cancelled".into());
        }
        Ok(report)
    }
}

fn spawn_feeder(
    jobs: Vec<UtteranceJob>,
    job_tx: crossbeam_channel::Sender<UtteranceJob>,
    cancelled: Arc<AtomicBool>,
    aborted: Arc<AtomicBool>,
) -> std::thread::JoinHandle<()> {
    std::thread::spawn(move || {
        for job in jobs {
            if cancelled.load(Ordering::Relaxed) || aborted.load(Ordering::Relaxed) {
                break;
            }
            if job_tx.send(job).is_err() {
                break;
            }
        }
    })
}

fn spawn_worker(
    id: usize,
    factory: Arc<WorkerFactory>,
    job_rx: crossbeam_channel::Receiver<UtteranceJob>,
    result_tx: crossbeam_channel::Sender<JobOutcome>,
    cancelled: Arc<AtomicBool>,
    aborted: Arc<AtomicBool>,
) -> std::thread::JoinHandle<()> {
    std::thread::spawn(move || {
        let mut converter = match factory() {
            Ok(converter) => converter,
            Err(e) => {
                let _ = result_tx.send(Err(format!("Worker {id} failed to start: {e}").into()));
                return;
            }
        };

        for job in job_rx {
            if cancelled.load(Ordering::Relaxed) || aborted.load(Ordering::Relaxed) {
                break;
            }
            let p = job.position;
            log::info!(
                "Utterance {} of {}, actor {} of {}, {}/{}",
                p.utterance,
                p.utterances,
                p.actor,
                p.actors,
                job.actor,
                job.utterance
            );

            let outcome = match converter.execute(&job) {
                Ok(report) => Ok((job, report)),
                Err(e) => Err(format!("{}/{}: {e}", job.actor, job.utterance).into()),
            };
            if result_tx.send(outcome).is_err() {
                break;
            }
        }
    })
}

/// Joins the feeder and all workers, keeping the first error encountered.
fn join_threads(
    feeder_handle: std::thread::JoinHandle<()>,
    worker_handles: Vec<std::thread::JoinHandle<()>>,
    mut first_error: Option<Box<dyn std::error::Error>>,
) -> Result<(), Box<dyn std::error::Error>> {
    if feeder_handle.join().is_err() && first_error.is_none() {
        first_error = Some("Feeder thread panicked".into());
    }
    for handle in worker_handles {
        if handle.join().is_err() && first_error.is_none() {
            first_error = Some("Worker thread panicked".into());
        }
    }
    match first_error {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::domain::face_detector::FaceDetector;
    use crate::detection::domain::face_landmarker::FaceLandmarker;
    use crate::detection::domain::face_landmarks::{LandmarkSet, LANDMARK_COUNT};
    use crate::detection::domain::landmark_predictor::LandmarkPredictor;
    use crate::pipeline::convert_config::ConvertConfig;
    use crate::pipeline::convert_utterance_use_case::ConvertUtteranceUseCase;
    use crate::pipeline::dataset_layout::JobPosition;
    use crate::pipeline::pipeline_logger::{NullPipelineLogger, StdoutPipelineLogger};
    use crate::shared::frame::Frame;
    use crate::shared::region::Region;
    use crate::shared::video_metadata::VideoMetadata;
    use crate::video::domain::image_writer::ImageWriter;
    use crate::video::domain::landmark_writer::LandmarkWriter;
    use crate::video::domain::video_reader::VideoReader;
    use std::collections::HashSet;
    use std::path::{Path, PathBuf};
    use std::sync::Mutex;

    const FRAMES_PER_UTTERANCE: usize = 3;

    // --- Stubs ---

    /// Yields a fixed number of frames per opened path; paths containing
    /// "broken" fail to open.
    struct StubReader {
        remaining: usize,
    }

    impl VideoReader for StubReader {
        fn open(&mut self, path: &Path) -> Result<VideoMetadata, Box<dyn std::error::Error>> {
            if path.to_string_lossy().contains("broken") {
                return Err("moov atom not found".into());
            }
            self.remaining = FRAMES_PER_UTTERANCE;
            Ok(VideoMetadata {
                width: 320,
                height: 240,
                fps: 30.0,
                total_frames: FRAMES_PER_UTTERANCE,
                codec: String::new(),
                source_path: Some(path.to_path_buf()),
            })
        }

        fn frames(
            &mut self,
        ) -> Box<dyn Iterator<Item = Result<Frame, Box<dyn std::error::Error>>> + '_> {
            let n = std::mem::take(&mut self.remaining);
            Box::new((0..n).map(|i| Ok(Frame::new(vec![0; 320 * 240 * 3], 320, 240, 3, i))))
        }

        fn close(&mut self) {
            self.remaining = 0;
        }
    }

    struct StubDetector;

    impl FaceDetector for StubDetector {
        fn detect(&mut self, _frame: &Frame) -> Result<Vec<Region>, Box<dyn std::error::Error>> {
            Ok(vec![Region::new(100, 80, 100, 100, 0.9)])
        }
    }

    struct StubPredictor;

    impl LandmarkPredictor for StubPredictor {
        fn predict(
            &mut self,
            _gray: &Frame,
            _face: &Region,
        ) -> Result<LandmarkSet, Box<dyn std::error::Error>> {
            let mut pts = [(150, 120); LANDMARK_COUNT];
            pts[19] = (140, 100);
            pts[24] = (160, 100);
            pts[8] = (150, 150);
            pts[0] = (110, 110);
            pts[15] = (190, 110);
            Ok(LandmarkSet::new(pts))
        }
    }

    #[derive(Clone, Default)]
    struct RecordingStore {
        paths: Arc<Mutex<HashSet<PathBuf>>>,
    }

    impl ImageWriter for RecordingStore {
        fn write(
            &self,
            path: &Path,
            _frame: &Frame,
            _size: Option<(u32, u32)>,
        ) -> Result<(), Box<dyn std::error::Error>> {
            self.paths.lock().unwrap().insert(path.to_path_buf());
            Ok(())
        }

        fn exists(&self, path: &Path) -> bool {
            self.paths.lock().unwrap().contains(path)
        }
    }

    impl LandmarkWriter for RecordingStore {
        fn write(
            &self,
            path: &Path,
            _landmarks: &LandmarkSet,
        ) -> Result<(), Box<dyn std::error::Error>> {
            self.paths.lock().unwrap().insert(path.to_path_buf());
            Ok(())
        }

        fn exists(&self, path: &Path) -> bool {
            self.paths.lock().unwrap().contains(path)
        }
    }

    // --- Helpers ---

    fn jobs(names: &[&str]) -> Vec<UtteranceJob> {
        names
            .iter()
            .enumerate()
            .map(|(i, name)| UtteranceJob {
                actor: "Actor_01".into(),
                utterance: name.to_string(),
                video_path: PathBuf::from(format!("/videos/Actor_01/{name}.mp4")),
                position: JobPosition {
                    utterance: i + 1,
                    utterances: names.len(),
                    actor: 1,
                    actors: 1,
                },
            })
            .collect()
    }

    fn factory(store: RecordingStore, cancelled: Arc<AtomicBool>) -> Arc<WorkerFactory> {
        Arc::new(move || -> Result<ConvertUtteranceUseCase, Box<dyn std::error::Error>> {
            let config = ConvertConfig::new("/img".into(), "/lm".into());
            Ok(ConvertUtteranceUseCase::new(
                Box::new(StubReader { remaining: 0 }),
                FaceLandmarker::new(Box::new(StubDetector), Box::new(StubPredictor)),
                Box::new(store.clone()),
                Box::new(store.clone()),
                &config,
                cancelled.clone(),
            ))
        })
    }

    // --- Tests ---

    #[test]
    fn test_all_utterances_converted_across_workers() {
        let store = RecordingStore::default();
        let cancelled = Arc::new(AtomicBool::new(false));
        let executor = ThreadedDatasetExecutor::new(3);
        let mut logger = StdoutPipelineLogger::new(1, "utterances");

        let report = executor
            .execute(
                jobs(&["u1", "u2", "u3", "u4", "u5"]),
                factory(store.clone(), cancelled.clone()),
                cancelled,
                &mut logger,
            )
            .unwrap();

        assert_eq!(report.utterances, 5);
        assert_eq!(report.frames_written, 5 * FRAMES_PER_UTTERANCE);
        assert_eq!(logger.counter("frames_written"), 5 * FRAMES_PER_UTTERANCE);
        // Image + landmarks per frame.
        assert_eq!(store.paths.lock().unwrap().len(), 2 * 5 * FRAMES_PER_UTTERANCE);
        assert!(store
            .paths
            .lock()
            .unwrap()
            .contains(Path::new("/img/Actor_01/u4/003.jpg")));
    }

    #[test]
    fn test_failing_utterance_aborts_with_its_name() {
        let store = RecordingStore::default();
        let cancelled = Arc::new(AtomicBool::new(false));
        let err = ThreadedDatasetExecutor::new(2)
            .execute(
                jobs(&["u1", "broken", "u3"]),
                factory(store, cancelled.clone()),
                cancelled,
                &mut NullPipelineLogger,
            )
            .unwrap_err();
        assert!(err.to_string().contains("Actor_01/broken"));
        assert!(err.to_string().contains("moov atom"));
    }

    #[test]
    fn test_worker_factory_failure_is_reported() {
        let cancelled = Arc::new(AtomicBool::new(false));
        let failing: Arc<WorkerFactory> =
            Arc::new(|| -> Result<ConvertUtteranceUseCase, Box<dyn std::error::Error>> {
                Err("model file missing".into())
            });
        let err = ThreadedDatasetExecutor::new(2)
            .execute(jobs(&["u1"]), failing, cancelled, &mut NullPipelineLogger)
            .unwrap_err();
        assert!(err.to_string().contains("failed to start"));
        assert!(err.to_string().contains("model file missing"));
    }

    #[test]
    fn test_cancelled_before_start() {
        let store = RecordingStore::default();
        let cancelled = Arc::new(AtomicBool::new(true));
        let err = ThreadedDatasetExecutor::new(2)
            .execute(
                jobs(&["u1", "u2"]),
                factory(store.clone(), cancelled.clone()),
                cancelled,
                &mut NullPipelineLogger,
            )
            .unwrap_err();
        assert_eq!(err.to_string(), "Cancelled");
        assert!(store.paths.lock().unwrap().is_empty());
    }

    #[test]
    fn test_no_jobs_is_empty_report() {
        let cancelled = Arc::new(AtomicBool::new(false));
        let report = ThreadedDatasetExecutor::default()
            .execute(
                Vec::new(),
                factory(RecordingStore::default(), cancelled.clone()),
                cancelled,
                &mut NullPipelineLogger,
            )
            .unwrap();
        assert_eq!(report, DatasetReport::default());
    }
}
