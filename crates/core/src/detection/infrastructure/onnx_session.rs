//! ONNX Runtime session construction shared by the detector and the
//! landmark predictor.

use std::path::Path;

/// Return the preferred ONNX execution providers for the current platform.
///
/// Falls back to CPU if the platform-specific provider is unavailable.
fn preferred_execution_providers() -> Vec<ort::execution_providers::ExecutionProviderDispatch> {
    #[cfg(target_os = "macos")]
    {
        vec![ort::execution_providers::CoreMLExecutionProvider::default().build()]
    }
    #[cfg(target_os = "windows")]
    {
        vec![ort::execution_providers::DirectMLExecutionProvider::default().build()]
    }
    #[cfg(not(any(target_os = "macos", target_os = "windows")))]
    {
        vec![]
    }
}

/// Loads `model_path` with full graph optimisation.
///
/// Dataset conversion runs one session per worker thread, so each session
/// gets `intra_threads` threads rather than the whole machine.
pub fn load_session(
    model_path: &Path,
    intra_threads: usize,
) -> Result<ort::session::Session, Box<dyn std::error::Error>> {
    if !model_path.is_file() {
        return Err(format!("Model file not found: {}", model_path.display()).into());
    }
    log::debug!(
        "Loading ONNX model {} ({intra_threads} intra-op threads)",
        model_path.display()
    );
    let session = ort::session::Session::builder()?
        .with_optimization_level(ort::session::builder::GraphOptimizationLevel::Level3)?
        .with_inter_threads(1)?
        .with_intra_threads(intra_threads.max(1))?
        .with_execution_providers(preferred_execution_providers())?
        .commit_from_file(model_path)?;
    Ok(session)
}

/// Square spatial input size of an NCHW model, or `None` when the model
/// declares dynamic dimensions.
pub fn square_input_size(session: &ort::session::Session) -> Option<u32> {
    session.inputs().first().and_then(|input| {
        if let ort::value::ValueType::Tensor { ref shape, .. } = input.dtype() {
            if shape.len() >= 4 && shape[2] > 0 {
                Some(shape[2] as u32)
            } else {
                None
            }
        } else {
            None
        }
    })
}
