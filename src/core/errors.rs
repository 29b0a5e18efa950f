//! Error types for the tvilling library.
//!
//! The detection engines themselves never fail; errors surface only at the
//! edges of the system — reading files, parsing configuration, persisting
//! reports and baselines.

use std::io;

use thiserror::Error;

/// Main result type for tvilling operations.
pub type Result<T> = std::result::Result<T, TvillingError>;

/// Error type for all fallible tvilling operations.
#[derive(Error, Debug)]
pub enum TvillingError {
    /// I/O related errors (file reads, report writes)
    #[error("I/O error: {message}")]
    Io {
        /// Human-readable error message
        message: String,
        /// Underlying I/O error
        #[source]
        source: io::Error,
    },

    /// Configuration errors
    #[error("Configuration error: {message}")]
    Config {
        /// Error description
        message: String,
        /// Configuration field that caused the error
        field: Option<String>,
    },

    /// Source file discovery errors
    #[error("Discovery error: {message}")]
    Discovery {
        /// Error description
        message: String,
        /// Path that caused the error
        path: Option<String>,
    },

    /// Serialization/deserialization errors
    #[error("Serialization error: {message}")]
    Serialization {
        /// Error description
        message: String,
        /// Underlying serialization error
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Internal errors (task joins, invariant breaches)
    #[error("Internal error: {message}")]
    Internal {
        /// Error description
        message: String,
    },
}

impl TvillingError {
    /// Create a new I/O error with context
    pub fn io(message: impl Into<String>, source: io::Error) -> Self {
        Self::Io {
            message: message.into(),
            source,
        }
    }

    /// Create a new configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            field: None,
        }
    }

    /// Create a configuration error tagged with the offending field
    pub fn config_field(message: impl Into<String>, field: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            field: Some(field.into()),
        }
    }

    /// Create a new discovery error for a path
    pub fn discovery(message: impl Into<String>, path: impl Into<String>) -> Self {
        Self::Discovery {
            message: message.into(),
            path: Some(path.into()),
        }
    }

    /// Create a new internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Create a new serialization error
    pub fn serialization(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Serialization {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }
}
