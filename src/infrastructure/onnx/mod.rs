// SPDX-License-Identifier: MPL-2.0
//! ONNX Runtime adapter implementing the [`PotholeDetector`] port trait.
//!
//! # Design Notes
//!
//! - The adapter wraps the existing [`DetectorManager`], which handles model
//!   loading and ONNX inference
//! - It reduces the manager's [`Detection`] record to the boolean verdict
//!   the pipeline consumes
//!
//! [`PotholeDetector`]: crate::application::port::PotholeDetector
//! [`DetectorManager`]: crate::media::detector::DetectorManager
//! [`Detection`]: crate::media::detector::Detection

mod pothole;

pub use pothole::OnnxPotholeDetector;
