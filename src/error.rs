//! Error Handling Module
//!
//! This module defines the error type shared by extraction, XML parsing,
//! flattening and sorting, using the `thiserror` crate.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DmarcError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("ZIP error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("Invalid format: {0}")]
    Format(String),

    #[error("File too large: {0}")]
    FileTooLarge(String),

    #[error("Unsupported file type: {0}")]
    UnsupportedFile(String),

    /// A field without a defined default is absent from the report.
    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid number in {field}: {value:?}")]
    InvalidNumber { field: String, value: String },

    #[error("The {name} is not a valid column name (accepted: {accepted})")]
    UnknownColumn { name: String, accepted: String },
}

impl DmarcError {
    pub(crate) fn missing(path: impl Into<String>) -> Self {
        DmarcError::MissingField(path.into())
    }

    pub(crate) fn invalid_number(field: impl Into<String>, value: impl Into<String>) -> Self {
        DmarcError::InvalidNumber {
            field: field.into(),
            value: value.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, DmarcError>;
