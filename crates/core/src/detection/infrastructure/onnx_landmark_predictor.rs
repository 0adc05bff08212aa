/// 68-point landmark regressor using ONNX Runtime.
///
/// The face region is expanded to a square around its centre, sampled from
/// the grayscale frame into a `1x3xSxS` tensor (gray replicated to three
/// channels), and the model's 136 outputs are read as `(x, y)` pairs
/// normalised to that square.
use std::path::Path;

use crate::detection::domain::face_landmarks::{LandmarkSet, LANDMARK_COUNT};
use crate::detection::domain::landmark_predictor::LandmarkPredictor;
use crate::shared::frame::Frame;
use crate::shared::region::Region;

use super::onnx_session;

/// Fallback model input resolution when the model doesn't specify dimensions.
const DEFAULT_INPUT_SIZE: u32 = 112;

/// Square face crop in frame pixels. May extend past the frame edges.
#[derive(Clone, Copy, Debug, PartialEq)]
struct FaceSquare {
    left: f64,
    top: f64,
    side: f64,
}

impl FaceSquare {
    fn around(face: &Region) -> Self {
        let (cx, cy) = face.center();
        let side = face.width.max(face.height).max(1) as f64;
        Self {
            left: cx - side / 2.0,
            top: cy - side / 2.0,
            side,
        }
    }
}

pub struct OnnxLandmarkPredictor {
    session: ort::session::Session,
    input_size: u32,
}

impl OnnxLandmarkPredictor {
    pub fn new(model_path: &Path, intra_threads: usize) -> Result<Self, Box<dyn std::error::Error>> {
        let session = onnx_session::load_session(model_path, intra_threads)?;
        let input_size = onnx_session::square_input_size(&session).unwrap_or(DEFAULT_INPUT_SIZE);
        log::debug!("Landmark model input size {input_size}");
        Ok(Self {
            session,
            input_size,
        })
    }
}

impl LandmarkPredictor for OnnxLandmarkPredictor {
    fn predict(
        &mut self,
        gray: &Frame,
        face: &Region,
    ) -> Result<LandmarkSet, Box<dyn std::error::Error>> {
        let square = FaceSquare::around(face);
        let tensor = preprocess(gray, square, self.input_size as usize);

        let input_value = ort::value::Tensor::from_array(tensor)?;
        let outputs = self.session.run(ort::inputs![input_value])?;
        if outputs.len() == 0 {
            return Err("Landmark model produced no outputs".into());
        }
        let values = outputs[0].try_extract_array::<f32>()?;
        let values = values.as_slice().ok_or("Cannot get landmark slice")?;
        decode(values, square)
    }
}

/// Samples `square` from a grayscale frame (nearest pixel) into an NCHW
/// tensor scaled to `[0, 1]`. Samples outside the frame are black.
fn preprocess(gray: &Frame, square: FaceSquare, size: usize) -> ndarray::Array4<f32> {
    let mut tensor = ndarray::Array4::<f32>::zeros((1, 3, size, size));
    let width = gray.width() as i64;
    let height = gray.height() as i64;
    let channels = gray.channels() as usize;
    let data = gray.data();
    let step = square.side / size as f64;

    for y in 0..size {
        let src_y = (square.top + (y as f64 + 0.5) * step).floor() as i64;
        if src_y < 0 || src_y >= height {
            continue;
        }
        for x in 0..size {
            let src_x = (square.left + (x as f64 + 0.5) * step).floor() as i64;
            if src_x < 0 || src_x >= width {
                continue;
            }
            let offset = ((src_y * width + src_x) as usize) * channels;
            let value = data[offset] as f32 / 255.0;
            for c in 0..3 {
                tensor[[0, c, y, x]] = value;
            }
        }
    }
    tensor
}

/// Converts normalised `(x, y)` pairs back to frame pixels.
fn decode(values: &[f32], square: FaceSquare) -> Result<LandmarkSet, Box<dyn std::error::Error>> {
    if values.len() < LANDMARK_COUNT * 2 {
        return Err(format!(
            "Landmark model returned {} values, expected {}",
            values.len(),
            LANDMARK_COUNT * 2
        )
        .into());
    }
    let points: Vec<(i32, i32)> = values[..LANDMARK_COUNT * 2]
        .chunks_exact(2)
        .map(|xy| {
            let x = square.left + xy[0] as f64 * square.side;
            let y = square.top + xy[1] as f64 * square.side;
            (x.round() as i32, y.round() as i32)
        })
        .collect();
    Ok(LandmarkSet::try_from(points)?)
}
