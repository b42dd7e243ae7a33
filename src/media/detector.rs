// SPDX-License-Identifier: MPL-2.0
//! Pothole detection using a YOLO-family ONNX model.
//!
//! This module provides functionality for:
//! - Downloading the detection ONNX model from a configurable URL
//! - Verifying model integrity with BLAKE3 checksum
//! - Running inference to decide whether an image shows a pothole

use image_rs::DynamicImage;
use ndarray::Array4;
use ort::session::{builder::GraphOptimizationLevel, Session};
use std::path::{Path, PathBuf};

/// Filename for the downloaded detection model in the data directory.
const MODEL_FILENAME: &str = "pothole-yolov8n.onnx";

/// Directory name under the platform data dir.
const APP_NAME: &str = "RoadGuard";

/// Score a localized box must reach to count as a detection.
pub const DEFAULT_CONFIDENCE_THRESHOLD: f32 = 0.25;

/// Square input resolution the model was exported with.
pub const INPUT_SIZE: u32 = 640;

/// Result type for detector model operations.
pub type ModelResult<T> = Result<T, ModelError>;

/// Errors that can occur during detector model operations.
#[derive(Debug, Clone)]
pub enum ModelError {
    /// Model file not found at expected path.
    ModelNotFound,
    /// Failed to download the model.
    DownloadFailed(String),
    /// Model checksum verification failed.
    ChecksumMismatch { expected: String, actual: String },
    /// ONNX inference failed.
    InferenceFailed(String),
    /// Image preprocessing failed.
    PreprocessingFailed(String),
    /// Model output decoding failed.
    PostprocessingFailed(String),
    /// IO error occurred.
    Io(String),
    /// Model session not initialized.
    SessionNotInitialized,
}

impl std::fmt::Display for ModelError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ModelError::ModelNotFound => write!(f, "Model file not found"),
            ModelError::DownloadFailed(msg) => write!(f, "Download failed: {msg}"),
            ModelError::ChecksumMismatch { expected, actual } => {
                write!(f, "Checksum mismatch: expected {expected}, got {actual}")
            }
            ModelError::InferenceFailed(msg) => write!(f, "Inference failed: {msg}"),
            ModelError::PreprocessingFailed(msg) => write!(f, "Preprocessing failed: {msg}"),
            ModelError::PostprocessingFailed(msg) => write!(f, "Postprocessing failed: {msg}"),
            ModelError::Io(msg) => write!(f, "IO error: {msg}"),
            ModelError::SessionNotInitialized => write!(f, "ONNX session not initialized"),
        }
    }
}

impl std::error::Error for ModelError {}

/// Outcome of one detection inference.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Detection {
    /// Number of boxes scoring at or above the confidence threshold.
    pub boxes: usize,
    /// Highest score seen across all candidate boxes, detected or not.
    pub top_confidence: f32,
}

impl Detection {
    /// Returns `true` when at least one box cleared the threshold.
    #[must_use]
    pub fn pothole_detected(&self) -> bool {
        self.boxes > 0
    }
}

/// Manager for the pothole detection model.
///
/// Handles model lifecycle: download, validation, and inference.
pub struct DetectorManager {
    model_path: PathBuf,
    confidence_threshold: f32,
    session: Option<Session>,
}

impl Default for DetectorManager {
    fn default() -> Self {
        Self::new()
    }
}

impl DetectorManager {
    /// Creates a manager using the default model location and threshold.
    #[must_use]
    pub fn new() -> Self {
        Self::with_model_path(default_model_path())
    }

    /// Creates a manager for a model stored at a specific path.
    #[must_use]
    pub fn with_model_path(model_path: PathBuf) -> Self {
        Self {
            model_path,
            confidence_threshold: DEFAULT_CONFIDENCE_THRESHOLD,
            session: None,
        }
    }

    /// Sets the confidence threshold for subsequent detections.
    #[must_use]
    pub fn with_confidence_threshold(mut self, threshold: f32) -> Self {
        self.confidence_threshold = threshold;
        self
    }

    /// Returns the path where the model is/will be stored.
    #[must_use]
    pub fn model_path(&self) -> &PathBuf {
        &self.model_path
    }

    /// Returns the active confidence threshold.
    #[must_use]
    pub fn confidence_threshold(&self) -> f32 {
        self.confidence_threshold
    }

    /// Checks if the model file exists on disk.
    #[must_use]
    pub fn is_model_downloaded(&self) -> bool {
        self.model_path.exists()
    }

    /// Loads the ONNX session from the model file.
    ///
    /// Must be called after the model is downloaded and verified.
    pub fn load_session(&mut self) -> ModelResult<()> {
        if !self.model_path.exists() {
            return Err(ModelError::ModelNotFound);
        }

        let session = Session::builder()
            .map_err(|e| ModelError::InferenceFailed(e.to_string()))?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(|e| ModelError::InferenceFailed(e.to_string()))?
            .commit_from_file(&self.model_path)
            .map_err(|e| ModelError::InferenceFailed(e.to_string()))?;

        self.session = Some(session);
        log::info!("loaded detection model from {}", self.model_path.display());
        Ok(())
    }

    /// Checks if the ONNX session is loaded and ready.
    #[must_use]
    pub fn is_session_ready(&self) -> bool {
        self.session.is_some()
    }

    /// Runs detection inference on an image.
    pub fn detect(&mut self, image: &DynamicImage) -> ModelResult<Detection> {
        let threshold = self.confidence_threshold;
        let session = self
            .session
            .as_mut()
            .ok_or(ModelError::SessionNotInitialized)?;

        // Preprocess: DynamicImage -> letterboxed NCHW tensor (RGB, 0-1)
        let input_tensor = preprocess_image(image)?;

        // Ensure standard layout for ONNX Runtime
        let input_tensor = input_tensor.as_standard_layout().into_owned();

        // Get input name from model (Ultralytics exports use 'images')
        let input_name = session
            .inputs
            .first()
            .map_or_else(|| "images".to_string(), |i| i.name.clone());

        let input_ref = ort::value::TensorRef::from_array_view(&input_tensor)
            .map_err(|e| ModelError::InferenceFailed(e.to_string()))?;

        let outputs = session
            .run(ort::inputs![input_name.as_str() => input_ref])
            .map_err(|e| ModelError::InferenceFailed(e.to_string()))?;

        let detection = decode_detections(&outputs, threshold)?;
        log::debug!(
            "detection: {} boxes >= {:.2}, top confidence {:.3}",
            detection.boxes,
            threshold,
            detection.top_confidence
        );
        Ok(detection)
    }

    /// Deletes the model file from disk.
    pub fn delete_model(&mut self) -> ModelResult<()> {
        self.session = None;
        if self.model_path.exists() {
            std::fs::remove_file(&self.model_path).map_err(|e| ModelError::Io(e.to_string()))?;
        }
        Ok(())
    }
}

/// Returns the default path where the detection model is stored.
#[must_use]
pub fn default_model_path() -> PathBuf {
    dirs::data_dir().map_or_else(
        || PathBuf::from(MODEL_FILENAME),
        |mut p| {
            p.push(APP_NAME);
            p.push(MODEL_FILENAME);
            p
        },
    )
}

/// Minimum expected model size (1 MB) to detect failed downloads; the
/// smallest usable YOLO export is several times larger.
const MIN_MODEL_SIZE_BYTES: u64 = 1_000_000;

/// Downloads the model from the specified URL to the given path.
///
/// Returns the number of bytes downloaded.
pub async fn download_model(
    url: &str,
    model_path: &Path,
    mut progress_callback: impl FnMut(f32) + Send,
) -> ModelResult<u64> {
    use futures_util::StreamExt;

    let client = reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::limited(10))
        .user_agent("RoadGuard/0.1.0")
        .build()
        .map_err(|e| ModelError::DownloadFailed(e.to_string()))?;

    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| ModelError::DownloadFailed(e.to_string()))?;

    if !response.status().is_success() {
        return Err(ModelError::DownloadFailed(format!(
            "HTTP status: {}",
            response.status()
        )));
    }

    let total_size = response.content_length().unwrap_or(0);

    // If the content length is suspiciously small, the URL likely returned
    // an error page instead of the model file.
    if total_size > 0 && total_size < MIN_MODEL_SIZE_BYTES {
        return Err(ModelError::DownloadFailed(format!(
            "Response too small ({total_size} bytes), expected an ONNX model file"
        )));
    }

    if let Some(parent) = model_path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| ModelError::Io(e.to_string()))?;
    }

    let mut file = std::fs::File::create(model_path).map_err(|e| ModelError::Io(e.to_string()))?;

    let mut downloaded: u64 = 0;
    let mut stream = response.bytes_stream();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|e| ModelError::DownloadFailed(e.to_string()))?;
        std::io::Write::write_all(&mut file, &chunk).map_err(|e| ModelError::Io(e.to_string()))?;

        downloaded += chunk.len() as u64;

        if total_size > 0 {
            let progress = downloaded as f32 / total_size as f32;
            progress_callback(progress);
        }
    }

    if downloaded < MIN_MODEL_SIZE_BYTES {
        // Delete the incomplete/invalid file
        let _ = std::fs::remove_file(model_path);
        return Err(ModelError::DownloadFailed(format!(
            "Downloaded file too small ({downloaded} bytes)"
        )));
    }

    log::info!("downloaded detection model ({downloaded} bytes)");
    Ok(downloaded)
}

/// Verifies the model file integrity using BLAKE3 hash.
pub fn verify_checksum(model_path: &Path, expected_hash: &str) -> ModelResult<()> {
    let actual_hash = compute_model_hash(model_path)?;
    if actual_hash != expected_hash {
        return Err(ModelError::ChecksumMismatch {
            expected: expected_hash.to_string(),
            actual: actual_hash,
        });
    }
    Ok(())
}

/// Computes the BLAKE3 hash of the model file.
pub fn compute_model_hash(model_path: &Path) -> ModelResult<String> {
    if !model_path.exists() {
        return Err(ModelError::ModelNotFound);
    }
    let file_data = std::fs::read(model_path).map_err(|e| ModelError::Io(e.to_string()))?;
    Ok(blake3::hash(&file_data).to_hex().to_string())
}

/// Validates the model by running a test inference on a synthetic image.
pub fn validate_model(manager: &mut DetectorManager) -> ModelResult<()> {
    let mut img = image_rs::RgbImage::new(INPUT_SIZE, INPUT_SIZE);
    for pixel in img.pixels_mut() {
        *pixel = image_rs::Rgb([128, 128, 128]);
    }
    let test_image = DynamicImage::ImageRgb8(img);

    let _detection = manager.detect(&test_image)?;
    Ok(())
}

/// Gray value used to fill the letterbox borders (Ultralytics convention).
const LETTERBOX_FILL: u8 = 114;

/// Preprocesses an image for YOLO inference.
///
/// Letterboxes the image into a square `INPUT_SIZE` canvas preserving aspect
/// ratio, then converts to NCHW format (batch=1, channels=3, height, width),
/// RGB color order, normalized to 0-1 range.
fn preprocess_image(img: &DynamicImage) -> ModelResult<Array4<f32>> {
    let (width, height) = (img.width(), img.height());
    if width == 0 || height == 0 {
        return Err(ModelError::PreprocessingFailed(
            "image has zero dimension".to_string(),
        ));
    }

    let scale = f64::from(INPUT_SIZE) / f64::from(width.max(height));
    let scaled_width = ((f64::from(width) * scale).round() as u32).max(1);
    let scaled_height = ((f64::from(height) * scale).round() as u32).max(1);

    let resized = img
        .resize_exact(
            scaled_width,
            scaled_height,
            image_rs::imageops::FilterType::Triangle,
        )
        .to_rgb8();

    let mut canvas = image_rs::RgbImage::from_pixel(
        INPUT_SIZE,
        INPUT_SIZE,
        image_rs::Rgb([LETTERBOX_FILL, LETTERBOX_FILL, LETTERBOX_FILL]),
    );
    let offset_x = (INPUT_SIZE - scaled_width) / 2;
    let offset_y = (INPUT_SIZE - scaled_height) / 2;
    image_rs::imageops::overlay(&mut canvas, &resized, i64::from(offset_x), i64::from(offset_y));

    let size = INPUT_SIZE as usize;
    let mut tensor = Array4::<f32>::zeros((1, 3, size, size));
    for (x, y, pixel) in canvas.enumerate_pixels() {
        let [r, g, b] = pixel.0;
        tensor[[0, 0, y as usize, x as usize]] = f32::from(r) / 255.0;
        tensor[[0, 1, y as usize, x as usize]] = f32::from(g) / 255.0;
        tensor[[0, 2, y as usize, x as usize]] = f32::from(b) / 255.0;
    }

    Ok(tensor)
}

/// Decodes YOLOv8-format output into a [`Detection`].
///
/// The output tensor is `[batch, 4 + classes, anchors]`: four box
/// coordinates followed by per-class scores for each anchor. An anchor
/// counts as a box when its best class score reaches the threshold. Box
/// geometry is irrelevant here; only presence is reported.
fn decode_detections(
    outputs: &ort::session::SessionOutputs<'_>,
    threshold: f32,
) -> ModelResult<Detection> {
    let (_, output) = outputs
        .iter()
        .next()
        .ok_or_else(|| ModelError::PostprocessingFailed("No output tensor".to_string()))?;

    let (shape, data) = output
        .try_extract_tensor::<f32>()
        .map_err(|e: ort::Error| ModelError::PostprocessingFailed(e.to_string()))?;

    score_anchors(shape, data, threshold)
}

/// Scores the raw output tensor. Shape is `[batch, attributes, anchors]`.
fn score_anchors(shape: &[i64], data: &[f32], threshold: f32) -> ModelResult<Detection> {
    if shape.len() != 3 {
        return Err(ModelError::PostprocessingFailed(format!(
            "Expected 3D tensor, got {}D",
            shape.len()
        )));
    }

    let attributes = shape[1] as usize;
    let anchors = shape[2] as usize;
    if attributes < 5 {
        return Err(ModelError::PostprocessingFailed(format!(
            "Expected at least 5 attributes per anchor, got {attributes}"
        )));
    }

    let mut boxes = 0usize;
    let mut top_confidence = 0.0f32;

    for anchor in 0..anchors {
        // Best class score for this anchor; rows 0..4 are box geometry.
        let mut score = 0.0f32;
        for class_row in 4..attributes {
            score = score.max(data[class_row * anchors + anchor]);
        }
        top_confidence = top_confidence.max(score);
        if score >= threshold {
            boxes += 1;
        }
    }

    Ok(Detection {
        boxes,
        top_confidence,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_model_path_uses_model_filename() {
        let path = default_model_path();
        assert!(path.to_string_lossy().contains(MODEL_FILENAME));
    }

    #[test]
    fn model_error_display() {
        let err = ModelError::ModelNotFound;
        assert_eq!(err.to_string(), "Model file not found");

        let err = ModelError::ChecksumMismatch {
            expected: "aaaa".to_string(),
            actual: "bbbb".to_string(),
        };
        assert!(err.to_string().contains("aaaa"));
        assert!(err.to_string().contains("bbbb"));
    }

    #[test]
    fn detection_verdict() {
        let none = Detection {
            boxes: 0,
            top_confidence: 0.2,
        };
        assert!(!none.pothole_detected());

        let one = Detection {
            boxes: 1,
            top_confidence: 0.9,
        };
        assert!(one.pothole_detected());
    }

    #[test]
    fn manager_defaults() {
        let manager = DetectorManager::new();
        assert!(!manager.is_session_ready());
        assert!(
            (manager.confidence_threshold() - DEFAULT_CONFIDENCE_THRESHOLD).abs() < f32::EPSILON
        );
    }

    #[test]
    fn manager_threshold_override() {
        let manager =
            DetectorManager::with_model_path(PathBuf::from("model.onnx")).with_confidence_threshold(0.5);
        assert!((manager.confidence_threshold() - 0.5).abs() < f32::EPSILON);
    }

    #[test]
    fn detect_fails_without_session() {
        let mut manager = DetectorManager::with_model_path(PathBuf::from("missing.onnx"));
        let image = DynamicImage::new_rgb8(8, 8);
        assert!(matches!(
            manager.detect(&image),
            Err(ModelError::SessionNotInitialized)
        ));
    }

    #[test]
    fn load_session_fails_for_missing_file() {
        let mut manager = DetectorManager::with_model_path(PathBuf::from("/nonexistent/model.onnx"));
        assert!(matches!(
            manager.load_session(),
            Err(ModelError::ModelNotFound)
        ));
    }

    #[test]
    fn compute_model_hash_requires_file() {
        let result = compute_model_hash(Path::new("/nonexistent/model.onnx"));
        assert!(matches!(result, Err(ModelError::ModelNotFound)));
    }

    #[test]
    fn verify_checksum_matches_computed_hash() {
        let dir = tempfile::tempdir().expect("failed to create temp dir");
        let path = dir.path().join("model.onnx");
        std::fs::write(&path, b"not really a model").expect("failed to write file");

        let hash = compute_model_hash(&path).expect("hash of existing file");
        assert!(verify_checksum(&path, &hash).is_ok());

        let err = verify_checksum(&path, "feedface").expect_err("wrong hash must fail");
        match err {
            ModelError::ChecksumMismatch { expected, actual } => {
                assert_eq!(expected, "feedface");
                assert_eq!(actual, hash);
            }
            other => panic!("expected ChecksumMismatch, got {other:?}"),
        }
    }

    #[test]
    fn validate_model_requires_session() {
        let mut manager = DetectorManager::with_model_path(PathBuf::from("missing.onnx"));
        assert!(matches!(
            validate_model(&mut manager),
            Err(ModelError::SessionNotInitialized)
        ));
    }

    #[test]
    fn preprocess_image_creates_square_tensor() {
        let img = DynamicImage::new_rgb8(1280, 720);
        let tensor = preprocess_image(&img).unwrap();
        assert_eq!(tensor.shape(), &[1, 3, 640, 640]);

        let tall = DynamicImage::new_rgb8(480, 960);
        let tensor = preprocess_image(&tall).unwrap();
        assert_eq!(tensor.shape(), &[1, 3, 640, 640]);
    }

    #[test]
    fn preprocess_image_normalizes_values() {
        let mut img = image_rs::RgbImage::new(INPUT_SIZE, INPUT_SIZE);
        for pixel in img.pixels_mut() {
            *pixel = image_rs::Rgb([255, 128, 0]);
        }
        let dynamic = DynamicImage::ImageRgb8(img);

        let tensor = preprocess_image(&dynamic).unwrap();

        // Square input fills the canvas, no letterbox border.
        assert!((tensor[[0, 0, 0, 0]] - 1.0).abs() < 0.01);
        assert!((tensor[[0, 1, 0, 0]] - 0.502).abs() < 0.01);
        assert!(tensor[[0, 2, 0, 0]].abs() < 0.01);
    }

    #[test]
    fn preprocess_image_letterboxes_wide_input() {
        let mut img = image_rs::RgbImage::new(640, 320);
        for pixel in img.pixels_mut() {
            *pixel = image_rs::Rgb([255, 255, 255]);
        }
        let tensor = preprocess_image(&DynamicImage::ImageRgb8(img)).unwrap();

        // Top border is letterbox fill, center is image content.
        let fill = f32::from(LETTERBOX_FILL) / 255.0;
        assert!((tensor[[0, 0, 0, 320]] - fill).abs() < 0.01);
        assert!((tensor[[0, 0, 320, 320]] - 1.0).abs() < 0.01);
    }

    // Builds a single-class YOLOv8-style output tensor [1, 5, anchors] with
    // the given per-anchor scores.
    fn output_tensor(scores: &[f32]) -> (Vec<i64>, Vec<f32>) {
        let anchors = scores.len();
        let mut data = vec![0.0f32; 5 * anchors];
        data[4 * anchors..].copy_from_slice(scores);
        (vec![1, 5, anchors as i64], data)
    }

    #[test]
    fn score_anchors_counts_boxes_above_threshold() {
        let (shape, data) = output_tensor(&[0.1, 0.3, 0.24, 0.9]);
        let detection = score_anchors(&shape, &data, DEFAULT_CONFIDENCE_THRESHOLD).unwrap();
        assert_eq!(detection.boxes, 2);
        assert!((detection.top_confidence - 0.9).abs() < f32::EPSILON);
        assert!(detection.pothole_detected());
    }

    #[test]
    fn score_anchors_reports_no_boxes_below_threshold() {
        let (shape, data) = output_tensor(&[0.1, 0.2, 0.05]);
        let detection = score_anchors(&shape, &data, DEFAULT_CONFIDENCE_THRESHOLD).unwrap();
        assert_eq!(detection.boxes, 0);
        assert!(!detection.pothole_detected());
        assert!((detection.top_confidence - 0.2).abs() < f32::EPSILON);
    }

    #[test]
    fn score_anchors_takes_best_class_score() {
        // Two classes: anchor 0 scores (0.1, 0.6), anchor 1 scores (0.3, 0.0).
        let shape = vec![1, 6, 2];
        let data = vec![
            0.0, 0.0, // cx
            0.0, 0.0, // cy
            0.0, 0.0, // w
            0.0, 0.0, // h
            0.1, 0.3, // class 0
            0.6, 0.0, // class 1
        ];
        let detection = score_anchors(&shape, &data, 0.25).unwrap();
        assert_eq!(detection.boxes, 2);
        assert!((detection.top_confidence - 0.6).abs() < f32::EPSILON);
    }

    #[test]
    fn score_anchors_rejects_unexpected_shapes() {
        assert!(matches!(
            score_anchors(&[1, 5], &[0.0; 5], 0.25),
            Err(ModelError::PostprocessingFailed(_))
        ));
        assert!(matches!(
            score_anchors(&[1, 4, 2], &[0.0; 8], 0.25),
            Err(ModelError::PostprocessingFailed(_))
        ));
    }

    #[test]
    fn preprocess_rejects_empty_image() {
        let img = DynamicImage::new_rgb8(0, 0);
        assert!(matches!(
            preprocess_image(&img),
            Err(ModelError::PreprocessingFailed(_))
        ));
    }
}
