use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use crate::alignment::domain::coordinate_mapper::CoordinateMapper;
use crate::alignment::domain::frame_locator::FrameLocator;
use crate::alignment::domain::utterance_session::UtteranceSession;
use crate::detection::domain::face_landmarker::FaceLandmarker;
use crate::pipeline::convert_config::ConvertConfig;
use crate::pipeline::dataset_layout::UtteranceJob;
use crate::shared::constants::{IMAGE_OUTPUT_EXTENSION, LANDMARK_OUTPUT_EXTENSION};
use crate::shared::frame_key::FrameKey;
use crate::video::domain::image_writer::ImageWriter;
use crate::video::domain::landmark_writer::LandmarkWriter;
use crate::video::domain::video_reader::VideoReader;

/// Per-utterance outcome counts and stage times.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct UtteranceReport {
    pub frames_decoded: usize,
    pub frames_written: usize,
    /// Frames whose image and landmarks already existed.
    pub frames_skipped: usize,
    pub frames_without_face: usize,
    pub detect_ms: f64,
    pub write_ms: f64,
    /// The run stopped early on cancellation.
    pub cancelled: bool,
}

/// Converts one utterance video into aligned `(image, landmarks)` pairs.
///
/// Frames are processed strictly in decode order with a fresh
/// [`UtteranceSession`], so every crop of the utterance shares the side
/// length fixed by its first located frame. A frame yields output only
/// when a face is found; frames without one leave a gap in the key
/// sequence.
pub struct ConvertUtteranceUseCase {
    reader: Box<dyn VideoReader>,
    landmarker: FaceLandmarker,
    image_writer: Box<dyn ImageWriter>,
    landmark_writer: Box<dyn LandmarkWriter>,
    locator: FrameLocator,
    mapper: CoordinateMapper,
    image_root: PathBuf,
    landmark_root: PathBuf,
    cancelled: Arc<AtomicBool>,
}

impl ConvertUtteranceUseCase {
    pub fn new(
        reader: Box<dyn VideoReader>,
        landmarker: FaceLandmarker,
        image_writer: Box<dyn ImageWriter>,
        landmark_writer: Box<dyn LandmarkWriter>,
        config: &ConvertConfig,
        cancelled: Arc<AtomicBool>,
    ) -> Self {
        Self {
            reader,
            landmarker,
            image_writer,
            landmark_writer,
            locator: config.locator(),
            mapper: config.mapper(),
            image_root: config.image_root.clone(),
            landmark_root: config.landmark_root.clone(),
            cancelled,
        }
    }

    pub fn execute(&mut self, job: &UtteranceJob) -> Result<UtteranceReport, Box<dyn std::error::Error>> {
        let metadata = self.reader.open(&job.video_path)?;
        log::debug!(
            "{}/{}: {}x{} @ {:.2} fps, ~{} frames",
            job.actor,
            job.utterance,
            metadata.width,
            metadata.height,
            metadata.fps,
            metadata.total_frames
        );

        let result = self.convert_frames(job);
        self.reader.close();
        result
    }

    fn convert_frames(&mut self, job: &UtteranceJob) -> Result<UtteranceReport, Box<dyn std::error::Error>> {
        let Self {
            reader,
            landmarker,
            image_writer,
            landmark_writer,
            locator,
            mapper,
            image_root,
            landmark_root,
            cancelled,
        } = self;

        let target = mapper.target_size();
        let mut session = UtteranceSession::new();
        let mut report = UtteranceReport::default();

        for frame_result in reader.frames() {
            if cancelled.load(Ordering::Relaxed) {
                report.cancelled = true;
                break;
            }
            let frame = frame_result?;
            report.frames_decoded += 1;

            let key = FrameKey::new(&job.actor, &job.utterance, frame.index() + 1);
            let image_path = key.path_in(image_root, IMAGE_OUTPUT_EXTENSION);
            let landmark_path = key.path_in(landmark_root, LANDMARK_OUTPUT_EXTENSION);
            let already_written =
                image_writer.exists(&image_path) && landmark_writer.exists(&landmark_path);

            // Once the side is frozen, existing keys need no detection at
            // all. Before that, the frame must still seed the session.
            if already_written && session.is_seeded() {
                report.frames_skipped += 1;
                continue;
            }

            let t0 = Instant::now();
            let landmarks = landmarker.landmarks(&frame)?;
            report.detect_ms += t0.elapsed().as_secs_f64() * 1000.0;

            let Some(landmarks) = landmarks else {
                report.frames_without_face += 1;
                continue;
            };

            let window = locator.locate(&landmarks, (frame.height(), frame.width()), &mut session);
            if already_written {
                log::debug!("{}: exists, session seeded with side {}", key.file_stem(), window.side());
                report.frames_skipped += 1;
                continue;
            }

            let t0 = Instant::now();
            let side = window.side() as u32;
            let crop = frame.crop(window.left as u32, window.top as u32, side, side);
            let mapped = mapper.map(&landmarks, &window);
            landmark_writer.write(&landmark_path, &mapped)?;
            image_writer.write(&image_path, &crop, Some((target, target)))?;
            report.write_ms += t0.elapsed().as_secs_f64() * 1000.0;
            report.frames_written += 1;
        }

        if report.frames_decoded > 0 && report.frames_written + report.frames_skipped == 0 {
            log::warn!(
                "{}/{}: no face found in any of {} frames",
                job.actor,
                job.utterance,
                report.frames_decoded
            );
        }
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::domain::face_detector::FaceDetector;
    use crate::detection::domain::face_landmarks::{LandmarkSet, LANDMARK_COUNT};
    use crate::detection::domain::landmark_predictor::LandmarkPredictor;
    use crate::pipeline::dataset_layout::JobPosition;
    use crate::shared::frame::Frame;
    use crate::shared::region::Region;
    use crate::shared::video_metadata::VideoMetadata;
    use std::collections::{HashMap, HashSet};
    use std::path::Path;
    use std::sync::Mutex;

    // --- Stubs ---

    struct StubReader {
        frames: Vec<Frame>,
        opened: Arc<Mutex<usize>>,
        closed: Arc<Mutex<usize>>,
    }

    impl VideoReader for StubReader {
        fn open(&mut self, path: &Path) -> Result<VideoMetadata, Box<dyn std::error::Error>> {
            *self.opened.lock().unwrap() += 1;
            Ok(VideoMetadata {
                width: 800,
                height: 600,
                fps: 30.0,
                total_frames: self.frames.len(),
                codec: "h264".into(),
                source_path: Some(path.to_path_buf()),
            })
        }

        fn frames(
            &mut self,
        ) -> Box<dyn Iterator<Item = Result<Frame, Box<dyn std::error::Error>>> + '_> {
            Box::new(self.frames.drain(..).map(Ok))
        }

        fn close(&mut self) {
            *self.closed.lock().unwrap() += 1;
        }
    }

    /// Reports a face on every frame except the listed indices.
    struct StubDetector {
        faceless: HashSet<usize>,
        calls: Arc<Mutex<Vec<usize>>>,
    }

    impl FaceDetector for StubDetector {
        fn detect(&mut self, frame: &Frame) -> Result<Vec<Region>, Box<dyn std::error::Error>> {
            self.calls.lock().unwrap().push(frame.index());
            if self.faceless.contains(&frame.index()) {
                Ok(vec![])
            } else {
                Ok(vec![Region::new(80, 100, 120, 60, 0.9)])
            }
        }
    }

    /// Returns a face whose extent depends on the frame's first pixel.
    struct StubPredictor;

    impl LandmarkPredictor for StubPredictor {
        fn predict(
            &mut self,
            gray: &Frame,
            _face: &Region,
        ) -> Result<LandmarkSet, Box<dyn std::error::Error>> {
            let grow = gray.data()[0] as i32;
            Ok(face(100, 160 + grow, 80, 200))
        }
    }

    #[derive(Clone, Default)]
    struct MemoryStore {
        images: Arc<Mutex<HashMap<PathBuf, Frame>>>,
        landmarks: Arc<Mutex<HashMap<PathBuf, LandmarkSet>>>,
        sizes: Arc<Mutex<Vec<Option<(u32, u32)>>>>,
    }

    impl ImageWriter for MemoryStore {
        fn write(
            &self,
            path: &Path,
            frame: &Frame,
            size: Option<(u32, u32)>,
        ) -> Result<(), Box<dyn std::error::Error>> {
            self.sizes.lock().unwrap().push(size);
            self.images
                .lock()
                .unwrap()
                .insert(path.to_path_buf(), frame.clone());
            Ok(())
        }

        fn exists(&self, path: &Path) -> bool {
            self.images.lock().unwrap().contains_key(path)
        }
    }

    impl LandmarkWriter for MemoryStore {
        fn write(
            &self,
            path: &Path,
            landmarks: &LandmarkSet,
        ) -> Result<(), Box<dyn std::error::Error>> {
            self.landmarks
                .lock()
                .unwrap()
                .insert(path.to_path_buf(), landmarks.clone());
            Ok(())
        }

        fn exists(&self, path: &Path) -> bool {
            self.landmarks.lock().unwrap().contains_key(path)
        }
    }

    struct FailingWriter;

    impl ImageWriter for FailingWriter {
        fn write(
            &self,
            _path: &Path,
            _frame: &Frame,
            _size: Option<(u32, u32)>,
        ) -> Result<(), Box<dyn std::error::Error>> {
            Err("disk full".into())
        }
    }

    // --- Helpers ---

    fn face(top: i32, bottom: i32, left: i32, right: i32) -> LandmarkSet {
        let center = ((left + right) / 2, (top + bottom) / 2);
        let mut pts = [center; LANDMARK_COUNT];
        pts[19] = (center.0 - 20, top);
        pts[24] = (center.0 + 20, top + 3);
        pts[8] = (center.0, bottom);
        pts[0] = (left, center.1 - 10);
        pts[15] = (right, center.1 - 10);
        LandmarkSet::new(pts)
    }

    /// 800x600 RGB frame whose first pixel encodes extra face height.
    fn frame(index: usize, grow: u8) -> Frame {
        let mut data = vec![90u8; 800 * 600 * 3];
        data[..3].copy_from_slice(&[grow, grow, grow]);
        Frame::new(data, 800, 600, 3, index)
    }

    fn job() -> UtteranceJob {
        UtteranceJob {
            actor: "Actor_01".into(),
            utterance: "01-01-03".into(),
            video_path: PathBuf::from("/videos/Actor_01/01-01-03.mp4"),
            position: JobPosition {
                utterance: 1,
                utterances: 1,
                actor: 1,
                actors: 1,
            },
        }
    }

    fn config() -> ConvertConfig {
        ConvertConfig::new("/img".into(), "/lm".into())
    }

    struct Harness {
        use_case: ConvertUtteranceUseCase,
        store: MemoryStore,
        detect_calls: Arc<Mutex<Vec<usize>>>,
        closed: Arc<Mutex<usize>>,
    }

    fn harness(frames: Vec<Frame>, faceless: &[usize], store: MemoryStore) -> Harness {
        let detect_calls = Arc::new(Mutex::new(Vec::new()));
        let closed = Arc::new(Mutex::new(0));
        let reader = StubReader {
            frames,
            opened: Arc::new(Mutex::new(0)),
            closed: closed.clone(),
        };
        let detector = StubDetector {
            faceless: faceless.iter().copied().collect(),
            calls: detect_calls.clone(),
        };
        let landmarker = FaceLandmarker::new(Box::new(detector), Box::new(StubPredictor));
        let use_case = ConvertUtteranceUseCase::new(
            Box::new(reader),
            landmarker,
            Box::new(store.clone()),
            Box::new(store.clone()),
            &config(),
            Arc::new(AtomicBool::new(false)),
        );
        Harness {
            use_case,
            store,
            detect_calls,
            closed,
        }
    }

    fn key_path(root: &str, index: usize, ext: &str) -> PathBuf {
        FrameKey::new("Actor_01", "01-01-03", index).path_in(Path::new(root), ext)
    }

    // --- Tests ---

    #[test]
    fn test_writes_aligned_pairs_for_every_frame() {
        let mut h = harness(vec![frame(0, 0), frame(1, 0)], &[], MemoryStore::default());
        let report = h.use_case.execute(&job()).unwrap();

        assert_eq!(report.frames_decoded, 2);
        assert_eq!(report.frames_written, 2);

        let images = h.store.images.lock().unwrap();
        let crop = &images[&key_path("/img", 1, "jpg")];
        assert_eq!((crop.width(), crop.height()), (111, 111));
        assert!(images.contains_key(&key_path("/img", 2, "jpg")));
        assert!(h
            .store
            .sizes
            .lock()
            .unwrap()
            .iter()
            .all(|s| *s == Some((256, 256))));

        let landmarks = h.store.landmarks.lock().unwrap();
        let mapped = &landmarks[&key_path("/lm", 1, "npy")];
        // Window (top 58, left 85, side 111): the brow point (120, 100)
        // lands at (80.7, 96.9) and truncates to (80, 96).
        assert_eq!(mapped.point(19), (80, 96));
    }

    #[test]
    fn test_frame_without_face_leaves_gap() {
        let frames = vec![frame(0, 0), frame(1, 0), frame(2, 0)];
        let mut h = harness(frames, &[1], MemoryStore::default());
        let report = h.use_case.execute(&job()).unwrap();

        assert_eq!(report.frames_written, 2);
        assert_eq!(report.frames_without_face, 1);
        let images = h.store.images.lock().unwrap();
        assert!(images.contains_key(&key_path("/img", 1, "jpg")));
        assert!(!images.contains_key(&key_path("/img", 2, "jpg")));
        assert!(images.contains_key(&key_path("/img", 3, "jpg")));
        assert!(!h
            .store
            .landmarks
            .lock()
            .unwrap()
            .contains_key(&key_path("/lm", 2, "npy")));
    }

    #[test]
    fn test_side_frozen_by_first_located_frame() {
        // Frame 0 has no face; frame 1 seeds side 111; frame 2's face is
        // 40px taller but keeps the same crop size.
        let frames = vec![frame(0, 0), frame(1, 0), frame(2, 40)];
        let mut h = harness(frames, &[0], MemoryStore::default());
        h.use_case.execute(&job()).unwrap();

        let images = h.store.images.lock().unwrap();
        assert_eq!(images[&key_path("/img", 2, "jpg")].width(), 111);
        assert_eq!(images[&key_path("/img", 3, "jpg")].width(), 111);
    }

    #[test]
    fn test_resume_skips_existing_and_reseeds_session() {
        let store = MemoryStore::default();
        // First run wrote frame 1 (side 111 seeded from it).
        let mut first = harness(vec![frame(0, 0)], &[], store.clone());
        first.use_case.execute(&job()).unwrap();

        // Second run: frame 1 exists but must still seed the session, so
        // frame 2 (taller face) is cropped with side 111, not 185.
        let mut second = harness(vec![frame(0, 0), frame(1, 40), frame(2, 40)], &[], store);
        let report = second.use_case.execute(&job()).unwrap();

        assert_eq!(report.frames_skipped, 1);
        assert_eq!(report.frames_written, 2);
        assert_eq!(*second.detect_calls.lock().unwrap(), vec![0, 1, 2]);
        let images = second.store.images.lock().unwrap();
        assert_eq!(images[&key_path("/img", 2, "jpg")].width(), 111);
    }

    #[test]
    fn test_resume_after_seeding_skips_detection() {
        let store = MemoryStore::default();
        let mut first = harness(vec![frame(0, 0), frame(1, 0)], &[], store.clone());
        first.use_case.execute(&job()).unwrap();

        let mut second = harness(vec![frame(0, 0), frame(1, 0), frame(2, 0)], &[], store);
        let report = second.use_case.execute(&job()).unwrap();

        assert_eq!(report.frames_skipped, 2);
        assert_eq!(report.frames_written, 1);
        // Frame 0 seeds; frame 1 is skipped without detection.
        assert_eq!(*second.detect_calls.lock().unwrap(), vec![0, 2]);
    }

    #[test]
    fn test_image_only_key_is_rewritten() {
        let store = MemoryStore::default();
        store
            .images
            .lock()
            .unwrap()
            .insert(key_path("/img", 1, "jpg"), Frame::blank_gray(4, 4));
        let mut h = harness(vec![frame(0, 0)], &[], store);
        let report = h.use_case.execute(&job()).unwrap();

        assert_eq!(report.frames_written, 1);
        assert_eq!(report.frames_skipped, 0);
        assert_eq!(h.store.images.lock().unwrap()[&key_path("/img", 1, "jpg")].width(), 111);
    }

    #[test]
    fn test_cancelled_run_stops_before_next_frame() {
        let mut h = harness(vec![frame(0, 0), frame(1, 0)], &[], MemoryStore::default());
        h.use_case.cancelled.store(true, Ordering::Relaxed);
        let report = h.use_case.execute(&job()).unwrap();

        assert!(report.cancelled);
        assert_eq!(report.frames_decoded, 0);
        assert_eq!(*h.closed.lock().unwrap(), 1);
    }

    #[test]
    fn test_write_error_propagates_and_closes_reader() {
        let detect_calls = Arc::new(Mutex::new(Vec::new()));
        let closed = Arc::new(Mutex::new(0));
        let reader = StubReader {
            frames: vec![frame(0, 0)],
            opened: Arc::new(Mutex::new(0)),
            closed: closed.clone(),
        };
        let detector = StubDetector {
            faceless: HashSet::new(),
            calls: detect_calls,
        };
        let mut use_case = ConvertUtteranceUseCase::new(
            Box::new(reader),
            FaceLandmarker::new(Box::new(detector), Box::new(StubPredictor)),
            Box::new(FailingWriter),
            Box::new(MemoryStore::default()),
            &config(),
            Arc::new(AtomicBool::new(false)),
        );

        let err = use_case.execute(&job()).unwrap_err();
        assert!(err.to_string().contains("disk full"));
        assert_eq!(*closed.lock().unwrap(), 1);
    }
}
