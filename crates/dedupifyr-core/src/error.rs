//! Error types for options, requests and detection runs.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while building [`ComparisonOptions`](crate::ComparisonOptions).
#[derive(Debug, Error)]
pub enum OptionsError {
    /// A required option was never given a value.
    #[error("Comparison option '{option}' must have a value")]
    Incomplete { option: String },

    /// Bias percentage outside of `0..=100`.
    #[error("Bias must be between 0 and 100 (inclusive), got {value}")]
    BiasOutOfBounds { value: f64 },

    /// An option value could not be parsed.
    #[error("Invalid value '{value}' for option '{option}'")]
    InvalidValue { option: String, value: String },

    /// A flag name that no option answers to.
    #[error("Unknown option flag: {flag}")]
    UnknownFlag { flag: String },
}

impl OptionsError {
    /// Create an invalid value error.
    pub fn invalid(option: impl Into<String>, value: impl Into<String>) -> Self {
        Self::InvalidValue {
            option: option.into(),
            value: value.into(),
        }
    }
}

impl From<derive_builder::UninitializedFieldError> for OptionsError {
    fn from(err: derive_builder::UninitializedFieldError) -> Self {
        Self::Incomplete {
            option: err.field_name().to_string(),
        }
    }
}

/// Errors raised while building or validating a
/// [`ComparisonRequest`](crate::ComparisonRequest).
#[derive(Debug, Error)]
pub enum RequestError {
    /// Nothing was requested.
    #[error(
        "A directory, an image and a directory, or two images separated by a comma must be given"
    )]
    MissingInput,

    /// The comparison kind tag is not one we know.
    #[error("The comparison of type '{kind}' is either not known or not supported")]
    UnsupportedKind { kind: String },

    /// Invalid all-in-directory request.
    #[error("Invalid directory comparison: {message}")]
    InvalidDirectoryComparison {
        message: String,
        #[source]
        source: Option<std::io::Error>,
    },

    /// Invalid pair request.
    #[error("Invalid pair comparison: {message}")]
    InvalidPairComparison {
        message: String,
        #[source]
        source: Option<std::io::Error>,
    },

    /// Invalid single-against-directory request.
    #[error("Invalid single comparison: {message}")]
    InvalidSingleComparison {
        message: String,
        #[source]
        source: Option<std::io::Error>,
    },
}

impl RequestError {
    /// Build the not-found cause attached to validation errors.
    pub(crate) fn not_found(path: &std::path::Path) -> Option<std::io::Error> {
        Some(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            path.display().to_string(),
        ))
    }
}

/// Errors from the collaborators that enumerate, read and decode images.
#[derive(Debug, Error)]
pub enum ScanError {
    /// Permission denied for a path.
    #[error("Permission denied: {path}")]
    PermissionDenied { path: PathBuf },

    /// Path not found.
    #[error("Path not found: {path}")]
    NotFound { path: PathBuf },

    /// Generic I/O error.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Directory walk failed part way.
    #[error("Failed to walk {path}: {message}")]
    Walk { path: PathBuf, message: String },

    /// Root path is not a directory.
    #[error("Root path is not a directory: {path}")]
    NotADirectory { path: PathBuf },

    /// File could not be decoded as an image.
    #[error("Failed to decode image {path}: {message}")]
    Decode { path: PathBuf, message: String },
}

impl ScanError {
    /// Create an I/O error with path context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        match source.kind() {
            std::io::ErrorKind::PermissionDenied => Self::PermissionDenied { path },
            std::io::ErrorKind::NotFound => Self::NotFound { path },
            _ => Self::Io { path, source },
        }
    }

    /// Create a decode error.
    pub fn decode(path: impl Into<PathBuf>, message: impl ToString) -> Self {
        Self::Decode {
            path: path.into(),
            message: message.to_string(),
        }
    }
}

/// Fatal errors for a detection run. Any of these aborts the run without
/// partial results.
#[derive(Debug, Error)]
pub enum DetectError {
    /// The request failed validation before any work began.
    #[error(transparent)]
    Request(#[from] RequestError),

    /// An image could not be listed, read or decoded.
    #[error("Detection aborted: {0}")]
    Scan(#[from] ScanError),

    /// The dedicated worker pool could not be created.
    #[error("Failed to start worker pool: {message}")]
    ThreadPool { message: String },
}
