// SPDX-License-Identifier: MPL-2.0
//! Pothole detector port definition.
//!
//! This module defines the [`PotholeDetector`] trait: the capability the
//! analysis pipeline consumes without owning. The model behind it is an
//! opaque external collaborator; the pipeline only ever sees the boolean
//! verdict.
//!
//! # Design Notes
//!
//! - Model downloading and validation is implementation-specific
//! - The trait is `Send + Sync` for thread-safe concurrent requests

use std::fmt;

// =============================================================================
// DetectorError
// =============================================================================

/// Errors that can occur while obtaining a detection verdict.
#[derive(Debug, Clone, PartialEq)]
pub enum DetectorError {
    /// The detection model is not ready (not downloaded or not loaded).
    ModelNotReady,

    /// The model file could not be loaded.
    ModelLoadFailed(String),

    /// The input image could not be prepared for the model.
    PreprocessingFailed(String),

    /// Inference failed.
    InferenceFailed(String),

    /// The model output could not be interpreted.
    PostprocessingFailed(String),
}

impl fmt::Display for DetectorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DetectorError::ModelNotReady => write!(f, "detection model is not ready"),
            DetectorError::ModelLoadFailed(msg) => write!(f, "failed to load model: {msg}"),
            DetectorError::PreprocessingFailed(msg) => write!(f, "preprocessing failed: {msg}"),
            DetectorError::InferenceFailed(msg) => write!(f, "inference failed: {msg}"),
            DetectorError::PostprocessingFailed(msg) => write!(f, "postprocessing failed: {msg}"),
        }
    }
}

impl std::error::Error for DetectorError {}

// =============================================================================
// DetectorCapabilities
// =============================================================================

/// Describes a detector implementation.
#[derive(Debug, Clone)]
pub struct DetectorCapabilities {
    /// Human-readable name of the detector (e.g., "YOLOv8 Pothole").
    pub name: &'static str,

    /// Square input resolution the model was exported with.
    pub input_size: (u32, u32),

    /// Confidence threshold above which a localized object counts.
    pub confidence_threshold: f32,
}

impl DetectorCapabilities {
    /// Creates capabilities with the stock YOLOv8 export defaults.
    #[must_use]
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            input_size: (640, 640),
            confidence_threshold: 0.25,
        }
    }

    /// Sets the input resolution.
    #[must_use]
    pub const fn with_input_size(mut self, width: u32, height: u32) -> Self {
        self.input_size = (width, height);
        self
    }

    /// Sets the confidence threshold.
    #[must_use]
    pub const fn with_confidence_threshold(mut self, threshold: f32) -> Self {
        self.confidence_threshold = threshold;
        self
    }
}

// =============================================================================
// PotholeDetector Trait
// =============================================================================

/// Port for pothole detection.
///
/// Infrastructure adapters implement this trait on top of ONNX Runtime or
/// another inference backend. The pipeline treats the verdict as opaque:
/// `true` means at least one object of interest was localized above the
/// detector's confidence threshold.
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync` so concurrent requests can share
/// one loaded model.
pub trait PotholeDetector: Send + Sync {
    /// Runs detection on a decoded image.
    ///
    /// # Errors
    ///
    /// Returns a [`DetectorError`] if the model is not ready or inference
    /// fails. Detector failures belong to the caller; the analysis pipeline
    /// is never invoked without a verdict.
    fn detect(&self, image: &image_rs::DynamicImage) -> Result<bool, DetectorError>;

    /// Checks if the model is loaded and ready for inference.
    fn is_ready(&self) -> bool;

    /// Returns the capabilities of this detector.
    fn capabilities(&self) -> DetectorCapabilities;
}
