//! Hardware-to-core notifications.
//!
//! Ports never call back into the bridge directly. A port is handed a
//! [`NoticeSender`] when a listener is attached, and its driver callback only
//! enqueues a [`HardwareNotice`]. The bridge drains the channel on its own
//! task, resolves the handle to a logical name and publishes.
//!
//! ```text
//! driver callback ──► NoticeSender::notify ──► mpsc ──► bridge notice pump
//! ```
//!
//! `notify` never blocks, so it is safe to call from an interrupt or driver
//! thread. When the channel is full the notice is dropped: edges recur and the
//! next one supersedes it.

use crate::types::HandleId;
use pinbridge_core::PeripheralClass;
use tokio::sync::mpsc;

/// Event raised by a port on behalf of an open peripheral.
#[derive(Debug, Clone, PartialEq)]
pub enum HardwareNotice {
    /// A digital input changed level.
    Edge { handle: HandleId },

    /// A monitored sensor delivered a sample.
    Sample { handle: HandleId, value: f64 },

    /// The driver reported an error for a watched peripheral. Handles are
    /// only unique within a class, so the class travels with them.
    ListenerError {
        class: PeripheralClass,
        handle: HandleId,
        code: i32,
    },
}

impl HardwareNotice {
    pub fn handle(&self) -> HandleId {
        match self {
            Self::Edge { handle }
            | Self::Sample { handle, .. }
            | Self::ListenerError { handle, .. } => *handle,
        }
    }
}

/// What a driver callback should do after delivering a notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListenerControl {
    /// Keep the listener registered.
    Continue,
}

/// Sending half of the notice channel, cloned into each attached listener.
#[derive(Debug, Clone)]
pub struct NoticeSender {
    tx: mpsc::Sender<HardwareNotice>,
}

impl NoticeSender {
    /// Create a bounded notice channel.
    pub fn channel(capacity: usize) -> (NoticeSender, mpsc::Receiver<HardwareNotice>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (NoticeSender { tx }, rx)
    }

    /// Enqueue a notice without blocking.
    ///
    /// Always asks the driver to keep the listener registered; a single
    /// registration is never self-cancelling.
    pub fn notify(&self, notice: HardwareNotice) -> ListenerControl {
        match self.tx.try_send(notice) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(notice)) => {
                tracing::warn!(handle = %notice.handle(), "Notice channel full, dropping notice");
            }
            Err(mpsc::error::TrySendError::Closed(notice)) => {
                tracing::trace!(handle = %notice.handle(), "Notice channel closed");
            }
        }
        ListenerControl::Continue
    }

    /// Whether the receiving side has gone away.
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}
