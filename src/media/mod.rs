// SPDX-License-Identifier: MPL-2.0
//! Image metadata decoding and detector model handling.
//!
//! This module owns the two image-facing concerns of the crate: decoding the
//! embedded EXIF tag directory of an uploaded photo ([`exif`], [`gps`]) and
//! running the pothole detection model ([`detector`]).

pub mod detector;
pub mod exif;
pub mod gps;

// Re-export commonly used types
pub use exif::{decode_tag_directory, MetadataError, Rational, TagDirectory, TagValue};
pub use gps::{extract_gps_directory, GpsDirectory};
