//! Error types for hardware operations.
//!
//! This module defines error types specific to peripheral access, covering
//! unknown peripherals, contention, stale handles and driver failures.

use crate::types::HandleId;

/// Result type alias for hardware operations.
pub type Result<T> = std::result::Result<T, HardwareError>;

/// Errors that can occur during hardware peripheral operations.
#[derive(Debug, thiserror::Error)]
pub enum HardwareError {
    /// No peripheral with this name exists on the board.
    #[error("Peripheral not found: {name}")]
    NotFound { name: String },

    /// The peripheral is already opened by someone else.
    #[error("Peripheral busy: {name}")]
    Busy { name: String },

    /// The handle does not refer to an open peripheral.
    #[error("Invalid handle: {handle}")]
    InvalidHandle { handle: HandleId },

    /// Operation is not supported by this peripheral.
    #[error("Unsupported operation: {operation}")]
    Unsupported { operation: String },

    /// Driver communication error.
    #[error("Communication error: {message}")]
    CommunicationError { message: String },

    /// Peripheral configuration error.
    #[error("Configuration error: {message}")]
    ConfigurationError { message: String },

    /// Generic I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic error with custom message.
    #[error("{0}")]
    Other(String),
}

impl HardwareError {
    /// Create a new not found error.
    pub fn not_found(name: impl Into<String>) -> Self {
        Self::NotFound { name: name.into() }
    }

    /// Create a new busy error.
    pub fn busy(name: impl Into<String>) -> Self {
        Self::Busy { name: name.into() }
    }

    /// Create a new invalid handle error.
    pub fn invalid_handle(handle: HandleId) -> Self {
        Self::InvalidHandle { handle }
    }

    /// Create a new unsupported operation error.
    pub fn unsupported(operation: impl Into<String>) -> Self {
        Self::Unsupported {
            operation: operation.into(),
        }
    }

    /// Create a new communication error.
    pub fn communication(message: impl Into<String>) -> Self {
        Self::CommunicationError {
            message: message.into(),
        }
    }

    /// Create a new configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::ConfigurationError {
            message: message.into(),
        }
    }

    /// Create a generic error with custom message.
    pub fn other(message: impl Into<String>) -> Self {
        Self::Other(message.into())
    }
}
