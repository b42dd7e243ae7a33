// SPDX-License-Identifier: MPL-2.0
//! The image analysis pipeline.
//!
//! Composes metadata decoding, GPS extraction, coordinate conversion and
//! result synthesis: raw bytes go in, a serializable report comes out. The
//! detection verdict itself is supplied by the caller (see
//! [`PotholeDetector`](crate::application::port::PotholeDetector)); this
//! module never touches the model.
//!
//! Two entry points with different strictness:
//!
//! - [`extract_coordinates`] propagates metadata validation errors to the
//!   caller,
//! - [`analyze`] is total: validation errors degrade to "coordinates absent"
//!   and are surfaced alongside the report, so a broken GPS block never
//!   blocks the detection answer.

pub mod report;

pub use report::{synthesize, AnalysisReport, ErrorPayload};

use crate::domain::geo::GpsCoordinates;
use crate::media::exif::{decode_tag_directory, MetadataError};
use crate::media::gps::extract_gps_directory;

/// Outcome of [`analyze`]: the report plus the metadata failure that was
/// degraded to absence, if any.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageAnalysis {
    /// The wire-level report; always present.
    pub report: AnalysisReport,
    /// A metadata validation error that forced `coordinates` to absent.
    /// `None` when the metadata was absent or parsed cleanly.
    pub metadata_error: Option<MetadataError>,
}

/// Recovers the photo position from the image's embedded metadata.
///
/// Absence at any stage (no metadata block, no GPS sub-block, partial GPS
/// block) propagates as `Ok(None)`.
///
/// # Errors
///
/// Returns a [`MetadataError`] for a structurally damaged metadata block or
/// a malformed GPS coordinate value.
pub fn extract_coordinates(bytes: &[u8]) -> Result<Option<GpsCoordinates>, MetadataError> {
    let directory = decode_tag_directory(bytes)?;
    let Some(gps) = extract_gps_directory(directory.as_ref()) else {
        return Ok(None);
    };
    gps.coordinates()
}

/// Runs the full pipeline for one image.
///
/// Total function: metadata failures never abort the request. A validation
/// error degrades the position to absent, is logged, and is carried in
/// [`ImageAnalysis::metadata_error`] for callers that report it.
#[must_use]
pub fn analyze(bytes: &[u8], pothole_detected: bool) -> ImageAnalysis {
    match extract_coordinates(bytes) {
        Ok(coordinates) => ImageAnalysis {
            report: synthesize(pothole_detected, coordinates),
            metadata_error: None,
        },
        Err(err) => {
            log::warn!("GPS metadata unusable, continuing without coordinates: {err}");
            ImageAnalysis {
                report: synthesize(pothole_detected, None),
                metadata_error: Some(err),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::report::{MESSAGE_NO_POTHOLE, MESSAGE_POTHOLE_NO_GPS};

    const JPEG_WITHOUT_METADATA: &[u8] = &[0xFF, 0xD8, 0xFF, 0xD9];

    #[test]
    fn metadata_less_image_yields_absent_coordinates() {
        assert_eq!(extract_coordinates(JPEG_WITHOUT_METADATA), Ok(None));
    }

    #[test]
    fn analyze_without_metadata_still_answers_detection() {
        let analysis = analyze(JPEG_WITHOUT_METADATA, true);
        assert!(analysis.report.pothole_detected);
        assert_eq!(analysis.report.coordinates, None);
        assert_eq!(analysis.report.message, MESSAGE_POTHOLE_NO_GPS);
        assert_eq!(analysis.metadata_error, None);

        let analysis = analyze(JPEG_WITHOUT_METADATA, false);
        assert_eq!(analysis.report.message, MESSAGE_NO_POTHOLE);
    }

    #[test]
    fn analyze_degrades_corrupt_metadata_to_absence() {
        // TIFF header pointing at a missing IFD: present but damaged.
        let corrupt = [0x49, 0x49, 0x2A, 0x00, 0x08, 0x00, 0x00, 0x00];
        assert!(extract_coordinates(&corrupt).is_err());

        let analysis = analyze(&corrupt, true);
        assert!(analysis.report.pothole_detected);
        assert_eq!(analysis.report.coordinates, None);
        assert!(matches!(
            analysis.metadata_error,
            Some(MetadataError::Corrupted(_))
        ));
    }

    #[test]
    fn analyze_is_deterministic() {
        let first = analyze(JPEG_WITHOUT_METADATA, true);
        let second = analyze(JPEG_WITHOUT_METADATA, true);
        assert_eq!(first, second);

        let first_json = serde_json::to_string(&first.report).unwrap();
        let second_json = serde_json::to_string(&second.report).unwrap();
        assert_eq!(first_json, second_json);
    }
}
