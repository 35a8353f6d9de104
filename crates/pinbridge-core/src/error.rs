use thiserror::Error;

use crate::types::Property;

#[derive(Error, Debug)]
pub enum Error {
    // Protocol errors
    #[error("Malformed payload: {0}")]
    MalformedPayload(String),

    // Validation errors
    #[error("Invalid parameter for {property}: {reason}")]
    InvalidParameter { property: Property, reason: String },

    // Hardware errors
    #[error("Peripheral I/O error on {name}: {cause}")]
    PeripheralIo { name: String, cause: String },

    // Transport errors
    #[error("Publish failed: {0}")]
    PublishFailed(String),

    #[error("Subscribe failed: {0}")]
    SubscribeFailed(String),

    // Lifecycle errors
    #[error("Bridge is not running")]
    NotRunning,

    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Create a malformed payload error.
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedPayload(message.into())
    }

    /// Create an invalid parameter error for the given property.
    pub fn invalid_parameter(property: Property, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            property,
            reason: reason.into(),
        }
    }

    /// Create a peripheral I/O error for the named line.
    pub fn peripheral_io(name: impl Into<String>, cause: impl std::fmt::Display) -> Self {
        Self::PeripheralIo {
            name: name.into(),
            cause: cause.to_string(),
        }
    }

    /// Create a publish failure error.
    pub fn publish_failed(cause: impl std::fmt::Display) -> Self {
        Self::PublishFailed(cause.to_string())
    }

    /// Create a subscription failure error.
    pub fn subscribe_failed(cause: impl std::fmt::Display) -> Self {
        Self::SubscribeFailed(cause.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_parameter_display() {
        let error = Error::invalid_parameter(Property::Frequency, "must be > 0, got 0");
        assert_eq!(
            error.to_string(),
            "Invalid parameter for FREQUENCY: must be > 0, got 0"
        );
    }

    #[test]
    fn test_peripheral_io_display() {
        let error = Error::peripheral_io("BCM4", "device busy");
        assert!(matches!(error, Error::PeripheralIo { .. }));
        assert_eq!(error.to_string(), "Peripheral I/O error on BCM4: device busy");
    }

    #[test]
    fn test_publish_failed_display() {
        let error = Error::publish_failed("not connected");
        assert_eq!(error.to_string(), "Publish failed: not connected");
    }
}
