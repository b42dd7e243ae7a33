// SPDX-License-Identifier: MPL-2.0
//! `road_guard` analyzes pothole report photos.
//!
//! Given the raw bytes of an uploaded image, it answers two questions: does
//! the photo show a pothole (via a pretrained ONNX object detector), and
//! where was it taken (via the GPS block of the image's embedded EXIF
//! metadata)? Both answers are combined into a single JSON-serializable
//! report with a fixed status message.

pub mod analysis;
pub mod application;
pub mod config;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod media;
