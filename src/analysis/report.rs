// SPDX-License-Identifier: MPL-2.0
//! Detection-result synthesis.
//!
//! Joins the detector's verdict with the (optional) recovered photo position
//! into the wire-level report. The status message is derived from exactly
//! one table and nothing else:
//!
//! | pothole_detected | coordinates | message |
//! |---|---|---|
//! | false | any | no potholes detected |
//! | true | present | pothole detected, GPS found |
//! | true | absent | pothole detected, manual address needed |

use crate::domain::geo::GpsCoordinates;
use serde::{Deserialize, Serialize};

/// Message when no pothole was detected, regardless of coordinates.
pub const MESSAGE_NO_POTHOLE: &str = "No potholes detected in the image.";

/// Message when a pothole was detected and the photo carried a position.
pub const MESSAGE_POTHOLE_WITH_GPS: &str = "Pothole detected, GPS coordinates found.";

/// Message when a pothole was detected but no position could be recovered.
pub const MESSAGE_POTHOLE_NO_GPS: &str =
    "Pothole detected, but no GPS location found. Please input manually.";

// =============================================================================
// AnalysisReport
// =============================================================================

/// The terminal artifact of the analysis pipeline.
///
/// Constructed exactly once per request by [`synthesize`] and handed to the
/// transport layer for serialization. Field names are part of the wire
/// contract; `coordinates` serializes as a `[latitude, longitude]` pair or
/// `null`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub pothole_detected: bool,
    pub coordinates: Option<(f64, f64)>,
    pub message: String,
}

/// The transport-level error document, distinct from the success schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorPayload {
    pub error: String,
}

impl ErrorPayload {
    /// Creates an error payload from any displayable error.
    #[must_use]
    pub fn new(error: impl ToString) -> Self {
        Self {
            error: error.to_string(),
        }
    }
}

// =============================================================================
// Synthesis
// =============================================================================

/// Returns the status message for a detection outcome.
///
/// Total function over its two inputs; cannot fail.
#[must_use]
pub fn status_message(pothole_detected: bool, has_coordinates: bool) -> &'static str {
    match (pothole_detected, has_coordinates) {
        (false, _) => MESSAGE_NO_POTHOLE,
        (true, true) => MESSAGE_POTHOLE_WITH_GPS,
        (true, false) => MESSAGE_POTHOLE_NO_GPS,
    }
}

/// Combines the detector verdict and the optional position into a report.
///
/// Both inputs are carried verbatim; the message comes from the fixed table.
/// Stateless and pure: identical inputs always yield an identical report.
#[must_use]
pub fn synthesize(pothole_detected: bool, coordinates: Option<GpsCoordinates>) -> AnalysisReport {
    AnalysisReport {
        pothole_detected,
        coordinates: coordinates.map(|c| c.pair()),
        message: status_message(pothole_detected, coordinates.is_some()).to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_table_is_exhaustive() {
        assert_eq!(status_message(false, false), MESSAGE_NO_POTHOLE);
        assert_eq!(status_message(false, true), MESSAGE_NO_POTHOLE);
        assert_eq!(status_message(true, true), MESSAGE_POTHOLE_WITH_GPS);
        assert_eq!(status_message(true, false), MESSAGE_POTHOLE_NO_GPS);
    }

    #[test]
    fn synthesize_with_coordinates() {
        let report = synthesize(true, Some(GpsCoordinates::new(40.0, -75.0)));
        assert!(report.pothole_detected);
        assert_eq!(report.coordinates, Some((40.0, -75.0)));
        assert_eq!(report.message, MESSAGE_POTHOLE_WITH_GPS);
    }

    #[test]
    fn synthesize_without_coordinates() {
        let report = synthesize(true, None);
        assert!(report.pothole_detected);
        assert_eq!(report.coordinates, None);
        assert_eq!(report.message, MESSAGE_POTHOLE_NO_GPS);
    }

    #[test]
    fn synthesize_no_detection_ignores_coordinates() {
        let with = synthesize(false, Some(GpsCoordinates::new(40.0, -75.0)));
        let without = synthesize(false, None);
        assert_eq!(with.message, MESSAGE_NO_POTHOLE);
        assert_eq!(without.message, MESSAGE_NO_POTHOLE);
        // Coordinates are still carried verbatim.
        assert_eq!(with.coordinates, Some((40.0, -75.0)));
    }

    #[test]
    fn report_serializes_with_wire_field_names() {
        let report = synthesize(true, Some(GpsCoordinates::new(40.0, -75.0)));
        let json = serde_json::to_value(&report).expect("report serializes");
        assert_eq!(json["pothole_detected"], serde_json::json!(true));
        assert_eq!(json["coordinates"], serde_json::json!([40.0, -75.0]));
        assert_eq!(
            json["message"],
            serde_json::json!("Pothole detected, GPS coordinates found.")
        );
    }

    #[test]
    fn absent_coordinates_serialize_as_null() {
        let report = synthesize(true, None);
        let json = serde_json::to_value(&report).expect("report serializes");
        assert_eq!(json["coordinates"], serde_json::Value::Null);
    }

    #[test]
    fn error_payload_has_distinct_schema() {
        let payload = ErrorPayload::new("Failed to download image");
        let json = serde_json::to_value(&payload).expect("payload serializes");
        assert_eq!(json["error"], serde_json::json!("Failed to download image"));
        assert!(json.get("pothole_detected").is_none());
    }
}
