//! Peripheral-class handlers.
//!
//! A handler applies one decoded [`Message`](pinbridge_protocol::Message) to
//! hardware through the registry and reports an [`Outcome`]. Handlers never
//! publish themselves: readings come back as [`Outcome::Publish`] so the
//! caller can publish after releasing the registry lock.

pub mod analog;
pub mod digital;
pub mod pulse;

use pinbridge_core::{Error, PeripheralClass};
use pinbridge_hardware::{
    HardwareError, NoticeSender, Oversampling, PeripheralRegistry, Peripherals,
};
use pinbridge_protocol::Message;
use tracing::warn;

/// What handling a message amounted to.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// Hardware was updated; nothing to publish.
    Applied,

    /// The message was understood but deliberately had no effect.
    Ignored { reason: &'static str },

    /// A reading that must be published.
    Publish(Message),
}

/// Everything a handler may touch while the registry lock is held.
pub struct HandlerContext<'a> {
    pub registry: &'a mut PeripheralRegistry,
    pub peripherals: &'a Peripherals,
    /// Cloned into every listener a handler attaches.
    pub notices: &'a NoticeSender,
    /// Whether edge listeners should be attached right away.
    pub foreground: bool,
    /// Oversampling for one-shot sensor reads.
    pub oversampling: Oversampling,
}

/// Map a hardware failure on `name` into the bridge error type.
pub(crate) fn io_error(name: &str) -> impl FnOnce(HardwareError) -> Error + '_ {
    move |error| Error::peripheral_io(name, error)
}

/// Drop a half-configured entry after a setup failure.
///
/// The setup error is what the caller reports; a failure to close is only
/// logged.
pub(crate) async fn discard(ctx: &mut HandlerContext<'_>, class: PeripheralClass, name: &str) {
    if let Err(e) = ctx.registry.close(ctx.peripherals, class, name).await {
        warn!("Failed to release {} {} after setup error: {}", class, name, e);
    }
}
