//! Unified error handling for the crate
//!
//! Domain errors ([`ClientError`], [`ResolveError`]) stay usable on their
//! own; [`Error`] wraps them for code that crosses module boundaries, such
//! as startup and the binary.
//!
//! # Usage
//!
//! ```rust,ignore
//! use hcloud_resolver::error::{Error, ErrorCategory};
//!
//! fn handle_error(err: Error) {
//!     if err.is_instance_not_found() {
//!         // deregister the node
//!     } else if err.is_recoverable() {
//!         // try again on the next sync
//!     }
//! }
//! ```

use std::io;
use thiserror::Error;

pub use crate::client::ClientError;
pub use crate::resolver::ResolveError;

/// Classification of errors for handling strategies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// API or network failures
    Network,
    /// The server does not exist in any source
    NotFound,
    /// Malformed input such as a bad provider ID
    Input,
    /// Configuration and validation errors
    Config,
    /// I/O and serialization errors
    Storage,
    /// Other/unknown errors
    Other,
}

/// Unified error type for the crate
#[derive(Error, Debug)]
pub enum Error {
    /// Source client errors
    #[error("Client error: {0}")]
    Client(#[from] ClientError),

    /// Resolution errors
    #[error("Resolve error: {0}")]
    Resolve(#[from] ResolveError),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration errors
    #[error("Config error: {0}")]
    Config(String),

    /// Generic error with context
    #[error("{context}")]
    Other {
        context: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl Error {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a generic error with context and source
    pub fn with_source(
        context: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Other {
            context: context.into(),
            source: Box::new(source),
        }
    }

    /// Check for the instance-not-found sentinel
    pub fn is_instance_not_found(&self) -> bool {
        matches!(self, Self::Resolve(e) if e.is_instance_not_found())
    }

    /// Check if this error is recoverable (can be retried)
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::Client(e) => e.is_transient(),
            Self::Resolve(e) => e.is_recoverable(),
            Self::Io(_) => true,
            Self::Json(_) | Self::Config(_) | Self::Other { .. } => false,
        }
    }

    /// Get the error category for handling strategies
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Client(_) => ErrorCategory::Network,
            Self::Resolve(e) => match e {
                ResolveError::Transport(_) => ErrorCategory::Network,
                ResolveError::InstanceNotFound => ErrorCategory::NotFound,
                ResolveError::MalformedIdentifier { .. } => ErrorCategory::Input,
            },
            Self::Io(_) | Self::Json(_) => ErrorCategory::Storage,
            Self::Config(_) => ErrorCategory::Config,
            Self::Other { .. } => ErrorCategory::Other,
        }
    }
}

/// Result type alias using the unified Error type
pub type Result<T> = std::result::Result<T, Error>;
