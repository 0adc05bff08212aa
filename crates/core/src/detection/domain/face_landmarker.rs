use crate::detection::domain::face_detector::FaceDetector;
use crate::detection::domain::face_landmarks::LandmarkSet;
use crate::detection::domain::landmark_predictor::LandmarkPredictor;
use crate::shared::frame::Frame;

/// Detect-then-predict: finds the most confident face in a frame and
/// regresses its 68 landmarks.
pub struct FaceLandmarker {
    detector: Box<dyn FaceDetector>,
    predictor: Box<dyn LandmarkPredictor>,
}

impl FaceLandmarker {
    pub fn new(detector: Box<dyn FaceDetector>, predictor: Box<dyn LandmarkPredictor>) -> Self {
        Self {
            detector,
            predictor,
        }
    }

    /// Landmarks of the first detected face, or `None` when the frame has
    /// no face. Coordinates are pixels of `frame`.
    pub fn landmarks(
        &mut self,
        frame: &Frame,
    ) -> Result<Option<LandmarkSet>, Box<dyn std::error::Error>> {
        let regions = self.detector.detect(frame)?;
        let Some(face) = regions.first() else {
            log::debug!("No face in frame {}", frame.index());
            return Ok(None);
        };
        if regions.len() > 1 {
            log::debug!(
                "{} faces in frame {}, using confidence {:.2}",
                regions.len(),
                frame.index(),
                face.confidence
            );
        }

        let gray = frame.to_grayscale();
        let landmarks = self.predictor.predict(&gray, face)?;
        Ok(Some(landmarks))
    }
}
