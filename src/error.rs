// SPDX-License-Identifier: MPL-2.0
use crate::application::port::DetectorError;
use crate::media::exif::MetadataError;
use std::fmt;

#[derive(Debug, Clone)]
pub enum Error {
    Io(String),
    Image(String),
    Http(String),
    Json(String),
    Config(String),
    Metadata(MetadataError),
    Detector(DetectorError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Io(e) => write!(f, "I/O Error: {}", e),
            Error::Image(e) => write!(f, "Image Error: {}", e),
            Error::Http(e) => write!(f, "HTTP Error: {}", e),
            Error::Json(e) => write!(f, "JSON Error: {}", e),
            Error::Config(e) => write!(f, "Config Error: {}", e),
            Error::Metadata(e) => write!(f, "Metadata Error: {}", e),
            Error::Detector(e) => write!(f, "Detector Error: {}", e),
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err.to_string())
    }
}

impl From<image_rs::ImageError> for Error {
    fn from(err: image_rs::ImageError) -> Self {
        Error::Image(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Json(err.to_string())
    }
}

impl From<MetadataError> for Error {
    fn from(err: MetadataError) -> Self {
        Error::Metadata(err)
    }
}

impl From<DetectorError> for Error {
    fn from(err: DetectorError) -> Self {
        Error::Detector(err)
    }
}

impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Error::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for Error {
    fn from(err: toml::ser::Error) -> Self {
        Error::Config(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
