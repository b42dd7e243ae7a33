// SPDX-License-Identifier: MPL-2.0
//! Geographic domain types.
//!
//! Pure domain types for geographic coordinates with no external dependencies.

// =============================================================================
// GpsCoordinates
// =============================================================================

/// GPS coordinates in signed decimal degrees.
///
/// This type represents geographic coordinates using the WGS84 coordinate
/// system. Latitude is negative in the southern hemisphere, longitude is
/// negative in the western hemisphere.
///
/// Values are stored exactly as computed by the coordinate converter and are
/// never clamped or normalized: a photo carrying nonsense DMS values yields
/// nonsense decimal degrees, observable via [`is_plausible`](Self::is_plausible).
///
/// # Example
///
/// ```ignore
/// let coords = GpsCoordinates::new(48.8566, 2.3522); // Paris
/// assert!(coords.is_plausible());
/// assert_eq!(coords.format(), "48.856600° N, 2.352200° E");
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GpsCoordinates {
    /// Latitude in decimal degrees (plausible range -90.0 to 90.0)
    latitude: f64,
    /// Longitude in decimal degrees (plausible range -180.0 to 180.0)
    longitude: f64,
}

impl GpsCoordinates {
    /// Creates new GPS coordinates. Values are stored verbatim.
    #[must_use]
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Returns the latitude in decimal degrees.
    #[must_use]
    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    /// Returns the longitude in decimal degrees.
    #[must_use]
    pub fn longitude(&self) -> f64 {
        self.longitude
    }

    /// Returns the coordinates as a `(latitude, longitude)` pair.
    #[must_use]
    pub fn pair(&self) -> (f64, f64) {
        (self.latitude, self.longitude)
    }

    /// Returns whether these coordinates are finite and within the valid
    /// geographic ranges (latitude ±90°, longitude ±180°).
    ///
    /// Photos occasionally carry corrupt or placeholder GPS blocks; callers
    /// that plot markers should check this before using the position.
    #[must_use]
    pub fn is_plausible(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
    }

    /// Formats the coordinates as a human-readable string.
    ///
    /// Format: "48.856600° N, 2.352200° E"
    #[must_use]
    pub fn format(&self) -> String {
        let lat_dir = if self.latitude >= 0.0 { "N" } else { "S" };
        let lon_dir = if self.longitude >= 0.0 { "E" } else { "W" };
        format!(
            "{:.6}° {}, {:.6}° {}",
            self.latitude.abs(),
            lat_dir,
            self.longitude.abs(),
            lon_dir
        )
    }

    /// Generates a URL to view these coordinates on a map.
    ///
    /// Returns a Google Maps URL for the location.
    #[must_use]
    pub fn map_url(&self) -> String {
        format!(
            "https://www.google.com/maps?q={},{}",
            self.latitude, self.longitude
        )
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gps_coordinates_new() {
        let coords = GpsCoordinates::new(48.8566, 2.3522);
        assert!((coords.latitude() - 48.8566).abs() < f64::EPSILON);
        assert!((coords.longitude() - 2.3522).abs() < f64::EPSILON);
    }

    #[test]
    fn gps_coordinates_does_not_clamp() {
        let coords = GpsCoordinates::new(100.0, -200.0);
        assert!((coords.latitude() - 100.0).abs() < f64::EPSILON);
        assert!((coords.longitude() - -200.0).abs() < f64::EPSILON);
        assert!(!coords.is_plausible());
    }

    #[test]
    fn gps_coordinates_is_plausible() {
        assert!(GpsCoordinates::new(48.8566, 2.3522).is_plausible());
        assert!(GpsCoordinates::new(-90.0, 180.0).is_plausible());
        assert!(!GpsCoordinates::new(90.5, 0.0).is_plausible());
        assert!(!GpsCoordinates::new(0.0, -180.5).is_plausible());
        assert!(!GpsCoordinates::new(f64::NAN, 0.0).is_plausible());
    }

    #[test]
    fn gps_coordinates_pair() {
        let coords = GpsCoordinates::new(40.0, -75.0);
        assert_eq!(coords.pair(), (40.0, -75.0));
    }

    #[test]
    fn gps_coordinates_format() {
        let paris = GpsCoordinates::new(48.8566, 2.3522);
        assert_eq!(paris.format(), "48.856600° N, 2.352200° E");

        let sydney = GpsCoordinates::new(-33.8688, 151.2093);
        assert_eq!(sydney.format(), "33.868800° S, 151.209300° E");

        let nyc = GpsCoordinates::new(40.7128, -74.0060);
        assert_eq!(nyc.format(), "40.712800° N, 74.006000° W");
    }

    #[test]
    fn gps_coordinates_map_url() {
        let paris = GpsCoordinates::new(48.8566, 2.3522);
        assert!(paris.map_url().contains("48.8566"));
        assert!(paris.map_url().contains("2.3522"));
    }

    #[test]
    fn gps_coordinates_equality() {
        let a = GpsCoordinates::new(48.8566, 2.3522);
        let b = GpsCoordinates::new(48.8566, 2.3522);
        assert_eq!(a, b);

        let c = GpsCoordinates::new(40.7128, -74.0060);
        assert_ne!(a, c);
    }
}
