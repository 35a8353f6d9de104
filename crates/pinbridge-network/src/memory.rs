//! In-process transport for testing and simulation.
//!
//! Records every subscription and publication instead of talking to a broker.
//! The paired [`MemoryTransportHandle`] inspects what was published, streams
//! publications as they happen and toggles connectivity to exercise failure
//! paths.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use bytes::Bytes;
use pinbridge_core::Qos;
use tokio::sync::mpsc;
use tracing::{debug, trace};

use crate::error::TransportError;
use crate::transport::Transport;

/// One payload accepted by a [`MemoryTransport`].
#[derive(Debug, Clone, PartialEq)]
pub struct Publication {
    pub topic: String,
    pub payload: Bytes,
    pub qos: Qos,
    pub retained: bool,
}

#[derive(Debug)]
struct Inner {
    connected: bool,
    rejection: Option<String>,
    subscriptions: Vec<(String, Qos)>,
    published: Vec<Publication>,
    feed: Option<mpsc::UnboundedSender<Publication>>,
}

fn lock(inner: &Mutex<Inner>) -> MutexGuard<'_, Inner> {
    inner.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Transport that keeps everything in memory.
///
/// # Examples
///
/// ```
/// use bytes::Bytes;
/// use pinbridge_core::Qos;
/// use pinbridge_network::{MemoryTransport, Transport};
///
/// #[tokio::main]
/// async fn main() -> Result<(), pinbridge_network::TransportError> {
///     let (transport, handle) = MemoryTransport::new();
///
///     transport
///         .publish("b1/events", Bytes::from_static(b"{}"), Qos::AtLeastOnce, false)
///         .await?;
///
///     assert_eq!(handle.published().len(), 1);
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone)]
pub struct MemoryTransport {
    inner: Arc<Mutex<Inner>>,
}

impl MemoryTransport {
    /// Create a connected transport and its control handle.
    pub fn new() -> (Self, MemoryTransportHandle) {
        let inner = Arc::new(Mutex::new(Inner {
            connected: true,
            rejection: None,
            subscriptions: Vec::new(),
            published: Vec::new(),
            feed: None,
        }));
        (
            Self {
                inner: Arc::clone(&inner),
            },
            MemoryTransportHandle { inner },
        )
    }

    fn check(inner: &Inner) -> Result<(), TransportError> {
        if !inner.connected {
            return Err(TransportError::NotConnected);
        }
        if let Some(reason) = &inner.rejection {
            return Err(TransportError::Rejected(reason.clone()));
        }
        Ok(())
    }
}

impl Default for MemoryTransport {
    fn default() -> Self {
        Self::new().0
    }
}

impl Transport for MemoryTransport {
    async fn subscribe(&self, topic: &str, qos: Qos) -> Result<(), TransportError> {
        let mut inner = lock(&self.inner);
        Self::check(&inner)?;
        debug!("Subscribed to {} at {}", topic, qos);
        inner.subscriptions.push((topic.to_string(), qos));
        Ok(())
    }

    async fn publish(
        &self,
        topic: &str,
        payload: Bytes,
        qos: Qos,
        retained: bool,
    ) -> Result<(), TransportError> {
        let mut inner = lock(&self.inner);
        Self::check(&inner)?;
        trace!("Publishing {} bytes to {}", payload.len(), topic);

        let publication = Publication {
            topic: topic.to_string(),
            payload,
            qos,
            retained,
        };
        let feed_closed = inner
            .feed
            .as_ref()
            .is_some_and(|feed| feed.send(publication.clone()).is_err());
        if feed_closed {
            inner.feed = None;
        }
        inner.published.push(publication);
        Ok(())
    }
}

/// Handle for observing and controlling a [`MemoryTransport`].
#[derive(Debug, Clone)]
pub struct MemoryTransportHandle {
    inner: Arc<Mutex<Inner>>,
}

impl MemoryTransportHandle {
    /// Every publication so far, oldest first.
    pub fn published(&self) -> Vec<Publication> {
        lock(&self.inner).published.clone()
    }

    /// Drain the recorded publications.
    pub fn take_published(&self) -> Vec<Publication> {
        std::mem::take(&mut lock(&self.inner).published)
    }

    /// Every subscribe call so far, oldest first.
    pub fn subscriptions(&self) -> Vec<(String, Qos)> {
        lock(&self.inner).subscriptions.clone()
    }

    /// Stream publications as they are accepted.
    ///
    /// Replaces any previously created feed.
    pub fn feed(&self) -> mpsc::UnboundedReceiver<Publication> {
        let (tx, rx) = mpsc::unbounded_channel();
        lock(&self.inner).feed = Some(tx);
        rx
    }

    /// Simulate losing or regaining the broker connection.
    pub fn set_connected(&self, connected: bool) {
        lock(&self.inner).connected = connected;
    }

    /// Make the broker refuse every request with `reason` until cleared.
    pub fn reject(&self, reason: Option<&str>) {
        lock(&self.inner).rejection = reason.map(str::to_string);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_publish_recorded() {
        let (transport, handle) = MemoryTransport::new();

        transport
            .publish("t", Bytes::from_static(b"x"), Qos::ExactlyOnce, false)
            .await
            .unwrap();

        assert_eq!(
            handle.take_published(),
            vec![Publication {
                topic: "t".to_string(),
                payload: Bytes::from_static(b"x"),
                qos: Qos::ExactlyOnce,
                retained: false,
            }]
        );
        assert!(handle.published().is_empty());
    }

    #[tokio::test]
    async fn test_disconnected_fails() {
        let (transport, handle) = MemoryTransport::new();
        handle.set_connected(false);

        let result = transport
            .publish("t", Bytes::new(), Qos::AtMostOnce, false)
            .await;
        assert!(matches!(result, Err(TransportError::NotConnected)));
        assert!(matches!(
            transport.subscribe("t", Qos::AtMostOnce).await,
            Err(TransportError::NotConnected)
        ));

        handle.set_connected(true);
        assert!(transport.subscribe("t", Qos::AtMostOnce).await.is_ok());
        assert_eq!(handle.subscriptions().len(), 1);
    }

    #[tokio::test]
    async fn test_rejection() {
        let (transport, handle) = MemoryTransport::new();
        handle.reject(Some("quota exceeded"));

        let result = transport
            .publish("t", Bytes::new(), Qos::AtLeastOnce, false)
            .await;
        assert!(matches!(result, Err(TransportError::Rejected(ref r)) if r == "quota exceeded"));

        handle.reject(None);
        assert!(
            transport
                .publish("t", Bytes::new(), Qos::AtLeastOnce, false)
                .await
                .is_ok()
        );
    }

    #[tokio::test]
    async fn test_feed_streams_publications() {
        let (transport, handle) = MemoryTransport::new();
        let mut feed = handle.feed();

        transport
            .publish("t", Bytes::from_static(b"1"), Qos::AtLeastOnce, false)
            .await
            .unwrap();

        let publication = feed.recv().await.unwrap();
        assert_eq!(publication.payload, Bytes::from_static(b"1"));
    }
}
