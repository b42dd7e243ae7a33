// SPDX-License-Identifier: MPL-2.0
//! YOLO pothole detection adapter implementing the [`PotholeDetector`] trait.
//!
//! [`PotholeDetector`]: crate::application::port::PotholeDetector

use std::sync::{Arc, Mutex};

use crate::application::port::{DetectorCapabilities, DetectorError, PotholeDetector};
use crate::media::detector::{DetectorManager, ModelError, INPUT_SIZE};

/// ONNX-based pothole detector.
///
/// This adapter wraps [`DetectorManager`] to implement the
/// [`PotholeDetector`] trait, so one loaded model can serve concurrent
/// requests behind internal locking.
///
/// # Example
///
/// ```ignore
/// use road_guard::infrastructure::onnx::OnnxPotholeDetector;
/// use road_guard::application::port::PotholeDetector;
///
/// let detector = OnnxPotholeDetector::new();
/// detector.load()?;
/// let verdict = detector.detect(&image)?;
/// ```
pub struct OnnxPotholeDetector {
    /// The underlying detector manager (wrapped for thread safety).
    manager: Arc<Mutex<DetectorManager>>,
}

impl Default for OnnxPotholeDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl OnnxPotholeDetector {
    /// Creates a detector using the default model location.
    #[must_use]
    pub fn new() -> Self {
        Self {
            manager: Arc::new(Mutex::new(DetectorManager::new())),
        }
    }

    /// Creates a detector from an existing `DetectorManager`.
    ///
    /// This is useful when the caller already manages the model lifecycle
    /// (download, checksum verification).
    #[must_use]
    pub fn from_manager(manager: Arc<Mutex<DetectorManager>>) -> Self {
        Self { manager }
    }

    /// Returns a reference to the underlying manager.
    ///
    /// Use this for model lifecycle operations (download, validation).
    #[must_use]
    pub fn manager(&self) -> &Arc<Mutex<DetectorManager>> {
        &self.manager
    }

    /// Loads the model session.
    ///
    /// # Errors
    ///
    /// Returns an error if the model is not downloaded or loading fails.
    pub fn load(&self) -> Result<(), DetectorError> {
        let mut manager = self
            .manager
            .lock()
            .map_err(|_| DetectorError::InferenceFailed("Lock poisoned".to_string()))?;

        manager.load_session().map_err(map_model_error)
    }
}

impl PotholeDetector for OnnxPotholeDetector {
    fn detect(&self, image: &image_rs::DynamicImage) -> Result<bool, DetectorError> {
        let mut manager = self
            .manager
            .lock()
            .map_err(|_| DetectorError::InferenceFailed("Lock poisoned".to_string()))?;

        let detection = manager.detect(image).map_err(map_model_error)?;
        Ok(detection.pothole_detected())
    }

    fn is_ready(&self) -> bool {
        self.manager
            .lock()
            .map(|m| m.is_session_ready())
            .unwrap_or(false)
    }

    fn capabilities(&self) -> DetectorCapabilities {
        let threshold = self
            .manager
            .lock()
            .map(|m| m.confidence_threshold())
            .unwrap_or(crate::media::detector::DEFAULT_CONFIDENCE_THRESHOLD);

        DetectorCapabilities::new("YOLOv8 Pothole")
            .with_input_size(INPUT_SIZE, INPUT_SIZE)
            .with_confidence_threshold(threshold)
    }
}

/// Maps manager-level model errors onto the port error taxonomy.
fn map_model_error(err: ModelError) -> DetectorError {
    match err {
        ModelError::ModelNotFound | ModelError::SessionNotInitialized => {
            DetectorError::ModelNotReady
        }
        ModelError::DownloadFailed(msg) | ModelError::Io(msg) => {
            DetectorError::ModelLoadFailed(msg)
        }
        ModelError::ChecksumMismatch { expected, actual } => DetectorError::ModelLoadFailed(
            format!("checksum mismatch: expected {expected}, got {actual}"),
        ),
        ModelError::PreprocessingFailed(msg) => DetectorError::PreprocessingFailed(msg),
        ModelError::InferenceFailed(msg) => DetectorError::InferenceFailed(msg),
        ModelError::PostprocessingFailed(msg) => DetectorError::PostprocessingFailed(msg),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn detector_can_be_created() {
        let detector = OnnxPotholeDetector::new();
        assert!(!detector.is_ready()); // Model not loaded by default
    }

    #[test]
    fn detector_default_is_same_as_new() {
        let detector = OnnxPotholeDetector::default();
        assert!(!detector.is_ready());
    }

    #[test]
    fn capabilities_reflect_manager_threshold() {
        let manager = DetectorManager::with_model_path(PathBuf::from("model.onnx"))
            .with_confidence_threshold(0.4);
        let detector = OnnxPotholeDetector::from_manager(Arc::new(Mutex::new(manager)));

        let caps = detector.capabilities();
        assert_eq!(caps.name, "YOLOv8 Pothole");
        assert_eq!(caps.input_size, (INPUT_SIZE, INPUT_SIZE));
        assert!((caps.confidence_threshold - 0.4).abs() < f32::EPSILON);
    }

    #[test]
    fn detect_fails_when_not_ready() {
        let detector = OnnxPotholeDetector::new();
        let image = image_rs::DynamicImage::new_rgb8(8, 8);

        let result = detector.detect(&image);
        assert_eq!(result, Err(DetectorError::ModelNotReady));
    }

    #[test]
    fn load_fails_for_missing_model_file() {
        let manager = DetectorManager::with_model_path(PathBuf::from("/nonexistent/model.onnx"));
        let detector = OnnxPotholeDetector::from_manager(Arc::new(Mutex::new(manager)));

        assert_eq!(detector.load(), Err(DetectorError::ModelNotReady));
    }

    #[test]
    fn model_errors_map_onto_port_taxonomy() {
        assert_eq!(
            map_model_error(ModelError::SessionNotInitialized),
            DetectorError::ModelNotReady
        );
        assert!(matches!(
            map_model_error(ModelError::ChecksumMismatch {
                expected: "a".to_string(),
                actual: "b".to_string(),
            }),
            DetectorError::ModelLoadFailed(_)
        ));
        assert!(matches!(
            map_model_error(ModelError::PostprocessingFailed("shape".to_string())),
            DetectorError::PostprocessingFailed(_)
        ));
    }
}
