// SPDX-License-Identifier: MPL-2.0
//! EXIF tag directory decoding.
//!
//! This module turns the raw bytes of an image into a [`TagDirectory`]: a
//! mapping from numeric tag codes to decoded tag values, with the GPS
//! sub-directory nested under its pointer tag. Absence of a metadata block
//! is an expected, common case and is reported as `Ok(None)`, distinct from
//! a block that is present but structurally damaged.
//!
//! Tag names are resolved through static lookup tables rather than a runtime
//! tag registry; see [`tag_name`] and [`gps_tag_name`].

use crate::media::gps::GpsDirectory;
use std::collections::BTreeMap;
use std::fmt;
use std::io::Cursor;

/// Pointer tag in the primary directory holding the nested GPS block.
pub const TAG_GPS_INFO: u16 = 0x8825;

// =============================================================================
// MetadataError
// =============================================================================

/// Errors produced while decoding or interpreting image metadata.
///
/// Absence of metadata is never an error; these variants cover the cases
/// where a metadata block exists but cannot be trusted.
#[derive(Debug, Clone, PartialEq)]
pub enum MetadataError {
    /// A metadata block is present but structurally damaged (truncated,
    /// inconsistent offsets, bad byte order marker).
    Corrupted(String),

    /// A GPS coordinate value that should hold exactly three numeric
    /// components (degrees, minutes, seconds) holds a different count.
    MalformedTuple {
        /// Name of the offending tag, e.g. "GPSLatitude".
        tag: &'static str,
        /// Number of numeric components actually found.
        count: usize,
    },

    /// A rational value with a zero denominator.
    ZeroDenominator {
        /// Name of the offending tag.
        tag: &'static str,
    },
}

impl fmt::Display for MetadataError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetadataError::Corrupted(msg) => write!(f, "corrupted metadata block: {msg}"),
            MetadataError::MalformedTuple { tag, count } => {
                write!(f, "malformed GPS tuple: {tag} has {count} components, expected 3")
            }
            MetadataError::ZeroDenominator { tag } => {
                write!(f, "zero denominator in {tag} rational")
            }
        }
    }
}

impl std::error::Error for MetadataError {}

// =============================================================================
// Rational and TagValue
// =============================================================================

/// An unsigned EXIF rational: numerator over denominator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rational {
    pub num: u32,
    pub denom: u32,
}

impl Rational {
    /// Creates a rational value.
    #[must_use]
    pub fn new(num: u32, denom: u32) -> Self {
        Self { num, denom }
    }

    /// Resolves the rational to a floating point value.
    ///
    /// Returns `None` when the denominator is zero; the division is never
    /// performed blindly.
    #[must_use]
    pub fn to_f64(self) -> Option<f64> {
        if self.denom == 0 {
            None
        } else {
            Some(f64::from(self.num) / f64::from(self.denom))
        }
    }
}

/// A decoded EXIF tag value.
///
/// EXIF stores values in a handful of physical types; this enum is the
/// decoded form the rest of the crate consumes. Multi-valued integer and
/// float fields outside the GPS block are rare and are not modelled.
#[derive(Debug, Clone, PartialEq)]
pub enum TagValue {
    /// A single integer (EXIF BYTE/SHORT/LONG and signed variants).
    Integer(i64),
    /// A single already-resolved floating point number (EXIF FLOAT/DOUBLE).
    Number(f64),
    /// A sequence of already-resolved numbers, e.g. a DMS triple written by
    /// software that pre-divided its rationals.
    Numbers(Vec<f64>),
    /// A text value (EXIF ASCII).
    Text(String),
    /// A single rational.
    Rational(Rational),
    /// A sequence of rationals, e.g. a degrees/minutes/seconds triple.
    Rationals(Vec<Rational>),
    /// The nested GPS sub-directory.
    Gps(GpsDirectory),
}

impl TagValue {
    /// Returns the text content, if this value is textual.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            TagValue::Text(s) => Some(s),
            _ => None,
        }
    }
}

// =============================================================================
// TagDirectory
// =============================================================================

/// A decoded metadata tag directory: tag code to tag value.
///
/// Produced once per image by [`decode_tag_directory`] and immutable
/// afterwards. The GPS sub-directory, when present, is nested under
/// [`TAG_GPS_INFO`].
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TagDirectory {
    entries: BTreeMap<u16, TagValue>,
}

impl TagDirectory {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn insert(&mut self, code: u16, value: TagValue) {
        self.entries.insert(code, value);
    }

    /// Looks up a tag value by its numeric code.
    #[must_use]
    pub fn get(&self, code: u16) -> Option<&TagValue> {
        self.entries.get(&code)
    }

    /// Returns the nested GPS sub-directory, if the image carries one.
    #[must_use]
    pub fn gps(&self) -> Option<&GpsDirectory> {
        match self.entries.get(&TAG_GPS_INFO) {
            Some(TagValue::Gps(gps)) => Some(gps),
            _ => None,
        }
    }

    /// Returns the number of decoded tags.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` when no tags were decoded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates over `(code, value)` pairs in ascending code order.
    pub fn iter(&self) -> impl Iterator<Item = (u16, &TagValue)> {
        self.entries.iter().map(|(code, value)| (*code, value))
    }
}

// =============================================================================
// Decoding
// =============================================================================

/// Decodes the embedded metadata block of an image.
///
/// Accepts the raw bytes of a JPEG, TIFF, PNG, WebP or HEIF file and returns
/// the decoded primary tag directory with the GPS block nested under
/// [`TAG_GPS_INFO`]. Pure function of the input bytes.
///
/// # Errors
///
/// Returns [`MetadataError::Corrupted`] only when a metadata block is present
/// but structurally malformed. An image without any metadata block is the
/// common case and yields `Ok(None)`.
pub fn decode_tag_directory(bytes: &[u8]) -> Result<Option<TagDirectory>, MetadataError> {
    let mut cursor = Cursor::new(bytes);
    let reader = exif::Reader::new();
    let parsed = match reader.read_from_container(&mut cursor) {
        Ok(parsed) => parsed,
        Err(exif::Error::NotFound(_)) => return Ok(None),
        Err(err) => return Err(MetadataError::Corrupted(err.to_string())),
    };

    let mut directory = TagDirectory::new();
    let mut gps = GpsDirectory::new();

    for field in parsed.fields() {
        if field.ifd_num != exif::In::PRIMARY {
            continue;
        }
        let Some(value) = convert_value(&field.value) else {
            continue;
        };
        match field.tag.context() {
            exif::Context::Gps => gps.insert(field.tag.number(), value),
            exif::Context::Tiff | exif::Context::Exif => {
                directory.insert(field.tag.number(), value);
            }
            _ => {}
        }
    }

    if !gps.is_empty() {
        directory.insert(TAG_GPS_INFO, TagValue::Gps(gps));
    }

    if log::log_enabled!(log::Level::Debug) {
        log_tag_listing(&directory);
    }
    Ok(Some(directory))
}

/// Writes the decoded tags to the debug log, one line per tag, with numeric
/// codes resolved to their EXIF names through the static tables.
fn log_tag_listing(directory: &TagDirectory) {
    for (code, value) in directory.iter() {
        match value {
            TagValue::Gps(gps) => {
                for (gps_code, gps_value) in gps.iter() {
                    log::debug!(
                        "GPS tag {gps_code:#06X} ({}): {gps_value:?}",
                        gps_tag_name(gps_code).unwrap_or("unknown")
                    );
                }
            }
            _ => log::debug!(
                "tag {code:#06X} ({}): {value:?}",
                tag_name(code).unwrap_or("unknown")
            ),
        }
    }
}

/// Converts a raw EXIF value into the decoded [`TagValue`] form.
///
/// Values that do not fit the model (multi-valued integers, undefined blobs)
/// are dropped rather than misrepresented.
fn convert_value(value: &exif::Value) -> Option<TagValue> {
    match value {
        exif::Value::Ascii(parts) => {
            let text = parts
                .iter()
                .map(|part| String::from_utf8_lossy(part).into_owned())
                .collect::<Vec<_>>()
                .join(" ");
            let text = text.trim_end_matches('\0').to_string();
            Some(TagValue::Text(text))
        }
        exif::Value::Rational(values) => {
            let rationals: Vec<Rational> = values
                .iter()
                .map(|r| Rational::new(r.num, r.denom))
                .collect();
            match rationals.as_slice() {
                [single] => Some(TagValue::Rational(*single)),
                _ => Some(TagValue::Rationals(rationals)),
            }
        }
        exif::Value::Byte(v) => single_int(v.iter().map(|&n| i64::from(n))),
        exif::Value::Short(v) => single_int(v.iter().map(|&n| i64::from(n))),
        exif::Value::Long(v) => single_int(v.iter().map(|&n| i64::from(n))),
        exif::Value::SByte(v) => single_int(v.iter().map(|&n| i64::from(n))),
        exif::Value::SShort(v) => single_int(v.iter().map(|&n| i64::from(n))),
        exif::Value::SLong(v) => single_int(v.iter().map(|&n| i64::from(n))),
        exif::Value::Float(v) => match v.as_slice() {
            [single] => Some(TagValue::Number(f64::from(*single))),
            _ => Some(TagValue::Numbers(v.iter().map(|&x| f64::from(x)).collect())),
        },
        exif::Value::Double(v) => match v.as_slice() {
            [single] => Some(TagValue::Number(*single)),
            _ => Some(TagValue::Numbers(v.clone())),
        },
        exif::Value::SRational(values) => match values.as_slice() {
            [single] if single.denom != 0 => Some(TagValue::Number(
                f64::from(single.num) / f64::from(single.denom),
            )),
            _ => None,
        },
        _ => None,
    }
}

fn single_int(mut values: impl ExactSizeIterator<Item = i64>) -> Option<TagValue> {
    if values.len() == 1 {
        values.next().map(TagValue::Integer)
    } else {
        None
    }
}

// =============================================================================
// Tag name tables
// =============================================================================

/// Resolves a primary-directory tag code to its EXIF name.
///
/// Covers the TIFF/EXIF tags commonly found in phone photos; unknown codes
/// yield `None`.
#[must_use]
pub fn tag_name(code: u16) -> Option<&'static str> {
    match code {
        0x0100 => Some("ImageWidth"),
        0x0101 => Some("ImageLength"),
        0x010E => Some("ImageDescription"),
        0x010F => Some("Make"),
        0x0110 => Some("Model"),
        0x0112 => Some("Orientation"),
        0x011A => Some("XResolution"),
        0x011B => Some("YResolution"),
        0x0128 => Some("ResolutionUnit"),
        0x0131 => Some("Software"),
        0x0132 => Some("DateTime"),
        0x013B => Some("Artist"),
        0x8298 => Some("Copyright"),
        0x829A => Some("ExposureTime"),
        0x829D => Some("FNumber"),
        0x8769 => Some("ExifIFDPointer"),
        TAG_GPS_INFO => Some("GPSInfo"),
        0x8827 => Some("PhotographicSensitivity"),
        0x9003 => Some("DateTimeOriginal"),
        0x9004 => Some("DateTimeDigitized"),
        0x920A => Some("FocalLength"),
        0x9209 => Some("Flash"),
        0xA002 => Some("PixelXDimension"),
        0xA003 => Some("PixelYDimension"),
        0xA405 => Some("FocalLengthIn35mmFilm"),
        _ => None,
    }
}

/// Resolves a GPS sub-directory tag code to its EXIF name.
///
/// The GPS tag space is small and fixed; this table covers all of it.
#[must_use]
pub fn gps_tag_name(code: u16) -> Option<&'static str> {
    match code {
        0x0000 => Some("GPSVersionID"),
        0x0001 => Some("GPSLatitudeRef"),
        0x0002 => Some("GPSLatitude"),
        0x0003 => Some("GPSLongitudeRef"),
        0x0004 => Some("GPSLongitude"),
        0x0005 => Some("GPSAltitudeRef"),
        0x0006 => Some("GPSAltitude"),
        0x0007 => Some("GPSTimeStamp"),
        0x0008 => Some("GPSSatellites"),
        0x0009 => Some("GPSStatus"),
        0x000A => Some("GPSMeasureMode"),
        0x000B => Some("GPSDOP"),
        0x000C => Some("GPSSpeedRef"),
        0x000D => Some("GPSSpeed"),
        0x000E => Some("GPSTrackRef"),
        0x000F => Some("GPSTrack"),
        0x0010 => Some("GPSImgDirectionRef"),
        0x0011 => Some("GPSImgDirection"),
        0x0012 => Some("GPSMapDatum"),
        0x0013 => Some("GPSDestLatitudeRef"),
        0x0014 => Some("GPSDestLatitude"),
        0x0015 => Some("GPSDestLongitudeRef"),
        0x0016 => Some("GPSDestLongitude"),
        0x0017 => Some("GPSDestBearingRef"),
        0x0018 => Some("GPSDestBearing"),
        0x0019 => Some("GPSDestDistanceRef"),
        0x001A => Some("GPSDestDistance"),
        0x001B => Some("GPSProcessingMethod"),
        0x001C => Some("GPSAreaInformation"),
        0x001D => Some("GPSDateStamp"),
        0x001E => Some("GPSDifferential"),
        0x001F => Some("GPSHPositioningError"),
        _ => None,
    }
}
