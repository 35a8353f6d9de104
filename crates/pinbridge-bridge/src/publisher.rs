//! Outbound event publication.
//!
//! Each publish is followed by a fixed quiescence pause so a burst of
//! physical edges cannot flood the broker. Delivery is at most once: a
//! failed publish is reported and never retried, since the next edge or
//! sample supersedes it.

use std::time::Duration;

use pinbridge_core::{Qos, Result};
use pinbridge_network::Transport;
use pinbridge_protocol::{Message, encode};
use tracing::debug;

#[derive(Debug)]
pub struct EventPublisher<T> {
    transport: T,
    topic: String,
    qos: Qos,
    quiescence: Duration,
}

impl<T: Transport> EventPublisher<T> {
    pub fn new(transport: T, topic: impl Into<String>, qos: Qos, quiescence: Duration) -> Self {
        Self {
            transport,
            topic: topic.into(),
            qos,
            quiescence,
        }
    }

    /// Publish at the configured default QoS.
    ///
    /// # Errors
    ///
    /// See [`publish_with`](Self::publish_with).
    pub async fn publish(&self, message: &Message) -> Result<()> {
        self.publish_with(message, self.qos).await
    }

    /// Encode `message`, hand it to the transport at `qos`, then pause.
    ///
    /// # Errors
    ///
    /// `Error::PublishFailed` if the transport refuses the payload; the
    /// pause is skipped in that case. Encoding errors propagate unchanged.
    pub async fn publish_with(&self, message: &Message, qos: Qos) -> Result<()> {
        let payload = encode(message)?;

        self.transport.publish(&self.topic, payload, qos, false).await?;
        debug!(
            "Published {} {} for {} to {} (QoS {})",
            message.class, message.property, message.name, self.topic, qos
        );

        if !self.quiescence.is_zero() {
            tokio::time::sleep(self.quiescence).await;
        }
        Ok(())
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    pub fn qos(&self) -> Qos {
        self.qos
    }
}
