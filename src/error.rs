//! Error types for the gridcal library.

use serde::Serialize;
use std::io;
use thiserror::Error;

/// Result type alias for gridcal operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Fatal errors: the workbook as a whole could not be read.
///
/// Problems confined to a single worksheet never surface here; they are
/// reported as [`LocateError`] in the per-sheet report instead.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error during file operations.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The file is not a ZIP-based Office document.
    #[error("Unknown file format")]
    UnknownFormat,

    /// The file is an Office document, but not a spreadsheet.
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    /// Error reading ZIP archive.
    #[error("ZIP archive error: {0}")]
    ZipArchive(String),

    /// Error parsing XML content.
    #[error("XML parse error: {0}")]
    XmlParse(String),

    /// Invalid or malformed data in the workbook.
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// A required workbook part is missing.
    #[error("Missing component: {0}")]
    MissingComponent(String),

    /// A configuration value could not be interpreted.
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Error during rendering.
    #[error("Render error: {0}")]
    Render(String),
}

impl From<zip::result::ZipError> for Error {
    fn from(err: zip::result::ZipError) -> Self {
        Error::ZipArchive(err.to_string())
    }
}

impl From<quick_xml::Error> for Error {
    fn from(err: quick_xml::Error) -> Self {
        Error::XmlParse(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Render(format!("JSON serialization error: {}", err))
    }
}

/// Reasons a worksheet was skipped by the grid locator.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LocateError {
    /// The worksheet has no cells at all.
    #[error("worksheet is empty")]
    EmptySheet,

    /// None of the leading columns looks like a time axis.
    #[error("no time column found")]
    NoTimeColumn,

    /// No weekday header with a nearby date was found.
    #[error("no dated day columns found")]
    NoDayColumns,

    /// The time column never settles into a regular grid.
    #[error("no grid start row found")]
    NoGridStart,
}
