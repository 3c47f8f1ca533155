// SPDX-License-Identifier: MPL-2.0

//! Error types for the image post-processing pipeline

use std::fmt;

/// Result type alias using ImagingError
pub type ImagingResult<T> = Result<T, ImagingError>;

/// Error kinds reported by frames, filters and the media processor
///
/// Every variant carries a short human-readable context string. Callers that
/// only care about the kind can match on the variant and ignore the message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImagingError {
    /// Missing input, wrong content type, out-of-range parameter or unsupported MIME pair
    InvalidArgument(String),
    /// A frame, filter or worker could not be allocated
    OutOfMemory(String),
    /// Encoder failure or an operation that is not valid in the current state
    Fail(String),
    /// The filter does not expose the requested capability
    NotSupported(String),
}

impl ImagingError {
    /// Short kind name, used in log fields
    pub fn kind_name(&self) -> &'static str {
        match self {
            ImagingError::InvalidArgument(_) => "invalid_argument",
            ImagingError::OutOfMemory(_) => "out_of_memory",
            ImagingError::Fail(_) => "fail",
            ImagingError::NotSupported(_) => "not_supported",
        }
    }

    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        ImagingError::InvalidArgument(msg.into())
    }

    pub(crate) fn oom(msg: impl Into<String>) -> Self {
        ImagingError::OutOfMemory(msg.into())
    }

    pub(crate) fn fail(msg: impl Into<String>) -> Self {
        ImagingError::Fail(msg.into())
    }

    pub(crate) fn unsupported(msg: impl Into<String>) -> Self {
        ImagingError::NotSupported(msg.into())
    }
}

impl fmt::Display for ImagingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImagingError::InvalidArgument(msg) => write!(f, "Invalid argument: {}", msg),
            ImagingError::OutOfMemory(msg) => write!(f, "Out of memory: {}", msg),
            ImagingError::Fail(msg) => write!(f, "Operation failed: {}", msg),
            ImagingError::NotSupported(msg) => write!(f, "Not supported: {}", msg),
        }
    }
}

impl std::error::Error for ImagingError {}

impl From<std::io::Error> for ImagingError {
    fn from(err: std::io::Error) -> Self {
        ImagingError::Fail(err.to_string())
    }
}

impl From<image::ImageError> for ImagingError {
    fn from(err: image::ImageError) -> Self {
        match err {
            image::ImageError::Limits(e) => ImagingError::OutOfMemory(e.to_string()),
            image::ImageError::Parameter(e) => ImagingError::InvalidArgument(e.to_string()),
            other => ImagingError::Fail(other.to_string()),
        }
    }
}

impl From<serde_json::Error> for ImagingError {
    fn from(err: serde_json::Error) -> Self {
        ImagingError::InvalidArgument(format!("config: {}", err))
    }
}

impl From<std::collections::TryReserveError> for ImagingError {
    fn from(err: std::collections::TryReserveError) -> Self {
        ImagingError::OutOfMemory(err.to_string())
    }
}
