// SPDX-License-Identifier: MPL-2.0
//! GPS sub-directory extraction and coordinate conversion.
//!
//! The GPS block of an EXIF directory stores each coordinate as a
//! degrees/minutes/seconds triple plus a one-character hemisphere reference.
//! Metadata writers differ on whether the triple components are stored as
//! plain numbers or numerator/denominator rationals; the [`DmsComponent`]
//! type consumes both representations uniformly.
//!
//! Conversion rules:
//! - any required field missing: the photo has no usable position, `Ok(None)`
//! - a triple without exactly three numeric components: validation error
//! - a rational with a zero denominator: validation error
//! - minutes or seconds outside [0, 60): still converted, garbage in
//!   garbage out
//! - hemisphere reference "S"/"W": negate; any other value, including
//!   unrecognized characters: positive (deliberate leniency)

use crate::domain::geo::GpsCoordinates;
use crate::media::exif::{gps_tag_name, MetadataError, Rational, TagDirectory, TagValue};
use std::collections::BTreeMap;

/// GPS tag codes used for coordinate recovery.
pub const TAG_GPS_LATITUDE_REF: u16 = 0x0001;
pub const TAG_GPS_LATITUDE: u16 = 0x0002;
pub const TAG_GPS_LONGITUDE_REF: u16 = 0x0003;
pub const TAG_GPS_LONGITUDE: u16 = 0x0004;

// =============================================================================
// DmsComponent
// =============================================================================

/// One component of a degrees/minutes/seconds triple.
///
/// Either an already-resolved number or an unresolved rational pair; the
/// converter treats both the same once resolved.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DmsComponent {
    /// A component stored as a plain number.
    Plain(f64),
    /// A component stored as numerator over denominator.
    Ratio { num: u32, denom: u32 },
}

impl DmsComponent {
    /// Resolves the component to a floating point value.
    ///
    /// # Errors
    ///
    /// Returns [`MetadataError::ZeroDenominator`] for a rational whose
    /// denominator is zero.
    pub fn resolve(self, tag: &'static str) -> Result<f64, MetadataError> {
        match self {
            DmsComponent::Plain(value) => Ok(value),
            DmsComponent::Ratio { num, denom } => Rational::new(num, denom)
                .to_f64()
                .ok_or(MetadataError::ZeroDenominator { tag }),
        }
    }
}

// =============================================================================
// GpsDirectory
// =============================================================================

/// The GPS sub-directory of a decoded tag directory.
///
/// Holds every decoded GPS tag; only the four coordinate tags are consumed
/// by [`coordinates`](Self::coordinates), the rest are retained for callers
/// that want them (timestamps, altitude, datum).
#[derive(Debug, Clone, PartialEq, Default)]
pub struct GpsDirectory {
    entries: BTreeMap<u16, TagValue>,
}

impl GpsDirectory {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn insert(&mut self, code: u16, value: TagValue) {
        self.entries.insert(code, value);
    }

    /// Looks up a GPS tag value by its numeric code.
    #[must_use]
    pub fn get(&self, code: u16) -> Option<&TagValue> {
        self.entries.get(&code)
    }

    /// Returns `true` when the directory holds no tags.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the number of decoded GPS tags.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Iterates over `(code, value)` pairs in ascending code order.
    pub fn iter(&self) -> impl Iterator<Item = (u16, &TagValue)> {
        self.entries.iter().map(|(code, value)| (*code, value))
    }

    /// Recovers the photo position as signed decimal degrees.
    ///
    /// Requires the latitude and longitude triples and both hemisphere
    /// references. A partial GPS block (any of the four missing) is a normal
    /// case and yields `Ok(None)`.
    ///
    /// # Errors
    ///
    /// Returns [`MetadataError::MalformedTuple`] when a triple does not hold
    /// exactly three numeric components, and
    /// [`MetadataError::ZeroDenominator`] when a component rational divides
    /// by zero.
    pub fn coordinates(&self) -> Result<Option<GpsCoordinates>, MetadataError> {
        let (Some(lat_value), Some(lon_value)) = (
            self.get(TAG_GPS_LATITUDE),
            self.get(TAG_GPS_LONGITUDE),
        ) else {
            return Ok(None);
        };
        let (Some(lat_ref), Some(lon_ref)) = (
            self.get(TAG_GPS_LATITUDE_REF),
            self.get(TAG_GPS_LONGITUDE_REF),
        ) else {
            return Ok(None);
        };

        let latitude = decimal_degrees(TAG_GPS_LATITUDE, lat_value)?
            * hemisphere_sign(lat_ref.as_text().unwrap_or(""), "S");
        let longitude = decimal_degrees(TAG_GPS_LONGITUDE, lon_value)?
            * hemisphere_sign(lon_ref.as_text().unwrap_or(""), "W");

        Ok(Some(GpsCoordinates::new(latitude, longitude)))
    }
}

/// Locates the GPS sub-directory of an optionally-present tag directory.
///
/// Absence propagates: a missing directory and a directory without a GPS
/// block both yield `None`. A GPS-less photo is a normal case, so there is
/// no error condition distinct from absence.
#[must_use]
pub fn extract_gps_directory(directory: Option<&TagDirectory>) -> Option<&GpsDirectory> {
    directory.and_then(TagDirectory::gps)
}

// =============================================================================
// Conversion
// =============================================================================

/// Extracts the numeric components of a DMS tag value.
fn dms_components(value: &TagValue) -> Vec<DmsComponent> {
    match value {
        TagValue::Rationals(values) => values
            .iter()
            .map(|r| DmsComponent::Ratio {
                num: r.num,
                denom: r.denom,
            })
            .collect(),
        TagValue::Rational(r) => vec![DmsComponent::Ratio {
            num: r.num,
            denom: r.denom,
        }],
        TagValue::Integer(n) => vec![DmsComponent::Plain(*n as f64)],
        TagValue::Number(x) => vec![DmsComponent::Plain(*x)],
        TagValue::Numbers(values) => values.iter().map(|&x| DmsComponent::Plain(x)).collect(),
        // Text, nested directories: no numeric components at all.
        _ => Vec::new(),
    }
}

/// Converts a DMS tag value to unsigned decimal degrees.
///
/// Validation errors name the offending tag, resolved through the static
/// table in [`crate::media::exif`].
///
/// # Errors
///
/// Returns [`MetadataError::MalformedTuple`] unless the value holds exactly
/// three numeric components.
fn decimal_degrees(code: u16, value: &TagValue) -> Result<f64, MetadataError> {
    let tag = gps_tag_name(code).unwrap_or("GPS");
    let components = dms_components(value);
    let [degrees, minutes, seconds] = components.as_slice() else {
        return Err(MetadataError::MalformedTuple {
            tag,
            count: components.len(),
        });
    };
    Ok(degrees.resolve(tag)? + minutes.resolve(tag)? / 60.0 + seconds.resolve(tag)? / 3600.0)
}

/// Sign factor for a hemisphere reference.
///
/// Case-sensitive single-character match: only the exact negative reference
/// ("S" for latitude, "W" for longitude) negates. Anything else, including
/// lowercase or unrecognized characters, is treated as the positive case.
fn hemisphere_sign(reference: &str, negative: &str) -> f64 {
    if reference == negative {
        -1.0
    } else {
        1.0
    }
}
