use thiserror::Error;

/// Errors reported by a publish/subscribe transport.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("Not connected to broker")]
    NotConnected,

    #[error("Broker rejected request: {0}")]
    Rejected(String),

    #[error("Transport channel closed")]
    ChannelClosed,
}

impl From<TransportError> for pinbridge_core::Error {
    fn from(error: TransportError) -> Self {
        pinbridge_core::Error::publish_failed(error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_maps_to_publish_failed() {
        let error: pinbridge_core::Error = TransportError::NotConnected.into();

        assert!(matches!(error, pinbridge_core::Error::PublishFailed(_)));
        assert_eq!(error.to_string(), "Publish failed: Not connected to broker");
    }
}
