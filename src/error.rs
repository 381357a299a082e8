//! Structured error types for parcelsheet.
//!
//! Only fatal conditions live here. Recoverable ones (a code cell that is
//! not numeric, a passport with no lookup match, a write into a merged
//! cell) never surface as `Err`; they show up as counts and diagnostics.

/// All errors that can abort a parcelsheet run.
#[derive(Debug, thiserror::Error)]
pub enum ParcelError {
    /// Input bytes are not a readable XLSX package.
    #[error("Unreadable document: {0}")]
    UnreadableDocument(String),

    /// Chunk size must be a positive integer.
    #[error("Invalid chunk size: {0} (must be at least 1)")]
    InvalidChunkSize(usize),

    /// The export template could not be loaded.
    #[error("Template asset missing or unreadable: {0}")]
    MissingTemplateAsset(String),

    /// A document arrived for a caller who has not picked a mode.
    #[error("No processing mode selected; choose a mode first")]
    NoModeSelected,

    /// Unrecognized mode key.
    #[error("Unknown processing mode: {0}")]
    UnknownMode(String),

    /// Configuration could not be loaded or failed validation.
    #[error("Configuration: {0}")]
    Config(String),

    /// XML parsing error from quick-xml.
    #[error("XML parsing: {0}")]
    Xml(#[from] quick_xml::Error),

    /// ZIP archive error.
    #[error("ZIP archive: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, ParcelError>;

impl From<figment::Error> for ParcelError {
    fn from(e: figment::Error) -> Self {
        Self::Config(e.to_string())
    }
}
