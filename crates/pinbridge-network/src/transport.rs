//! Publish/subscribe transport capability.
//!
//! The bridge never owns a broker connection. It is handed something that can
//! subscribe and publish; connecting, reconnecting and delivering inbound
//! payloads (through `Bridge::on_delivery`) stay with the host.

use std::future::Future;

use bytes::Bytes;
use pinbridge_core::Qos;

use crate::error::TransportError;

pub trait Transport: Send + Sync {
    /// Ask the broker to deliver messages published on `topic`.
    fn subscribe(
        &self,
        topic: &str,
        qos: Qos,
    ) -> impl Future<Output = Result<(), TransportError>> + Send;

    /// Hand one payload to the broker.
    ///
    /// Resolves once the broker has accepted it (or refused it); no retry
    /// happens at this layer.
    fn publish(
        &self,
        topic: &str,
        payload: Bytes,
        qos: Qos,
        retained: bool,
    ) -> impl Future<Output = Result<(), TransportError>> + Send;
}
