//! Error types for EPUB container operations.

use thiserror::Error;

/// Result type alias for EPUB container operations.
pub type Result<T> = std::result::Result<T, EpubError>;

/// Errors that can occur while reading or writing an EPUB container.
#[derive(Debug, Error)]
pub enum EpubError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Archive error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("Missing archive entry: {name}")]
    MissingEntry { name: String },

    #[error("Not an EPUB: mimetype entry is '{found}'")]
    InvalidMimetype { found: String },

    #[error("Invalid OCF container: {message}")]
    InvalidContainer { message: String },

    #[error("Invalid package document '{path}': {message}")]
    InvalidPackage { path: String, message: String },

    #[error("Entry is not valid UTF-8: {name}")]
    NotUtf8 { name: String },
}
