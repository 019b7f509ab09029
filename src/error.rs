//! Error types for the MariaDB client layer.

use std::fmt;
use thiserror::Error;

/// Result type alias for client operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for all client operations.
///
/// Driver-reported failures carry the driver's numeric error code and the
/// query text that triggered them; conditions detected by this layer itself
/// (template syntax errors, out-of-range lookups, conversion failures) map to
/// [`ErrorCode::Unknown`].
#[derive(Error, Debug)]
pub enum Error {
    /// Opening the driver session failed.
    #[error("connect failed: {message} (code {code})")]
    Connect { code: u32, message: String },

    /// The driver rejected a query.
    #[error("query execution failed: {message} (code {code}, query: {query})")]
    Execute {
        code: u32,
        message: String,
        query: String,
    },

    /// The query produced a result set, but fetching it failed.
    #[error("failed to fetch result set: {message} (code {code}, query: {query})")]
    StoreResult {
        code: u32,
        message: String,
        query: String,
    },

    /// Operation on a connection whose session handle was already released.
    #[error("connection is closed")]
    ConnectionClosed,

    /// A statement template ended inside an open `?name` parameter.
    #[error("unclosed parameter in statement: {query}")]
    UnclosedParameter { query: String },

    /// Code fragments and parameter slots of a statement no longer alternate.
    #[error("statement layout broken: {fragments} code fragments vs {parameters} parameters")]
    StatementMismatch { fragments: usize, parameters: usize },

    /// `set`/`set_null` on a parameter name the template does not contain.
    #[error("unknown parameter name: {name}")]
    UnknownParameter { name: String },

    /// `set`/`set_null` on a parameter index past the end of the template.
    #[error("parameter index {index} out of bounds (parameters: {count})")]
    ParameterIndexOutOfBounds { index: usize, count: usize },

    /// Field index past the end of the row.
    #[error("field index {index} out of bounds (fields: {count})")]
    FieldIndexOutOfBounds { index: usize, count: usize },

    /// Field name matching neither a column name nor an original column name.
    #[error("unknown field name: {name}")]
    UnknownField { name: String },

    /// The driver could not supply the per-field byte lengths for a row.
    #[error("unable to fetch field lengths for row")]
    FetchLengths,

    /// Typed field extraction failed (malformed text, invalid UTF-8, or NULL
    /// into a non-optional target).
    #[error("cannot convert field to {target}: {message}")]
    Conversion {
        target: &'static str,
        message: String,
    },
}

/// Structured error code carried by every [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    /// Sentinel for "no error"; never produced by this crate.
    NoError,
    /// A condition detected by the client layer itself.
    Unknown,
    /// A code reported by the driver, passed through verbatim.
    Driver(u32),
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorCode::NoError => write!(f, "none"),
            ErrorCode::Unknown => write!(f, "unknown"),
            ErrorCode::Driver(code) => write!(f, "{code}"),
        }
    }
}

impl Error {
    /// The structured code of this error.
    pub fn code(&self) -> ErrorCode {
        match self {
            Error::Connect { code, .. }
            | Error::Execute { code, .. }
            | Error::StoreResult { code, .. } => ErrorCode::Driver(*code),
            _ => ErrorCode::Unknown,
        }
    }

    /// The query text this error relates to, if any.
    pub fn query(&self) -> Option<&str> {
        match self {
            Error::Execute { query, .. }
            | Error::StoreResult { query, .. }
            | Error::UnclosedParameter { query } => Some(query),
            _ => None,
        }
    }

    /// Create a conversion error.
    pub fn conversion(target: &'static str, message: impl Into<String>) -> Self {
        Self::Conversion {
            target,
            message: message.into(),
        }
    }
}
