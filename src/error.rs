//! Error types for the statement converter.

use thiserror::Error;

/// Result type alias for converter operations
pub type Result<T> = std::result::Result<T, ConvertError>;

/// Errors that can occur while loading schemas, decoding or writing output.
#[derive(Error, Debug)]
pub enum ConvertError {
    /// Failed to open or read an input file
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV reading or writing error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Spreadsheet could not be opened or read
    #[error("Workbook error: {0}")]
    Workbook(#[from] calamine::Error),

    /// Schema definition is missing, malformed or incomplete
    #[error("Schema error: {0}")]
    Schema(String),

    /// Format name is neither a registry key nor an existing schema file
    #[error("Field definitions not found for '{0}'")]
    UnknownFormat(String),

    /// A field required by a decoding step is not available
    #[error("Missing field '{field}': {reason}")]
    MissingField { field: String, reason: String },

    /// Strict date parsing failed
    #[error("Invalid date at row {row}: field '{field}' value '{value}' does not match format '{format}'")]
    DateParse {
        row: usize,
        field: String,
        value: String,
        format: String,
    },

    /// A value could not be coerced to its declared type
    #[error("Invalid value at row {row}: field '{field}' cannot be read from '{value}'")]
    InvalidValue {
        row: usize,
        field: String,
        value: String,
    },

    /// Normalization left no transactions
    #[error("No valid transactions found in the input file ({input_rows} rows decoded)")]
    EmptyResult { input_rows: usize },

    /// The requested combination of input and reader type cannot be handled
    #[error("Unsupported input: {0}")]
    UnsupportedInput(String),
}

impl ConvertError {
    pub(crate) fn schema(message: impl Into<String>) -> Self {
        ConvertError::Schema(message.into())
    }

    pub(crate) fn missing_field(field: &str, reason: impl Into<String>) -> Self {
        ConvertError::MissingField {
            field: field.to_string(),
            reason: reason.into(),
        }
    }
}
