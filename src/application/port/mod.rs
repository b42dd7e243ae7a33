// SPDX-License-Identifier: MPL-2.0
//! Port definitions (traits) for dependency inversion.
//!
//! # Available Ports
//!
//! - [`detector`]: Pothole detection capability

pub mod detector;

// Re-export main types for convenience
pub use detector::{DetectorCapabilities, DetectorError, PotholeDetector};
