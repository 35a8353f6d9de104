//! Bridge lifecycle.
//!
//! A [`Bridge`] owns the registry and ties the three flows together:
//!
//! ```text
//! on_message ─► decode ─► dispatch ─► handler ─► registry ─► port
//!                                        │
//! port listener ─► NoticeSender ─► pump ─┴─► EventPublisher ─► transport
//! ```
//!
//! Inbound messages run one at a time to completion, including any
//! publication they produce. Every registry access, inbound or from the
//! notice pump, happens under a single state lock; publishing happens after
//! that lock is released so a quiescence pause never stalls hardware.

use std::sync::{Arc, Mutex as StdMutex, PoisonError};

use chrono::{DateTime, Utc};
use pinbridge_core::{Direction, Error, PeripheralClass, PinLevel, Result};
use pinbridge_hardware::{
    HandleId, HardwareNotice, NoticeSender, PeripheralRegistry, Peripherals,
};
use pinbridge_network::{DeviceTopics, Transport};
use pinbridge_protocol::{Message, decode};
use serde::Serialize;
use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinHandle;
use tracing::{debug, info, trace, warn};

use crate::config::BridgeConfig;
use crate::dispatcher::dispatch;
use crate::handlers::{HandlerContext, Outcome, analog, digital};
use crate::publisher::EventPublisher;

/// Diagnostic view of one registry entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntryInfo {
    pub class: PeripheralClass,
    pub name: String,
    pub handle: u64,
    pub direction: Option<Direction>,
    pub watching: bool,
    pub level: Option<PinLevel>,
    pub opened_at: DateTime<Utc>,
}

struct State {
    registry: PeripheralRegistry,
    running: bool,
    foreground: bool,
}

struct Shared<T> {
    /// Held for the whole of one inbound message.
    inbound: Mutex<()>,
    state: Mutex<State>,
    peripherals: Peripherals,
    publisher: EventPublisher<T>,
    topics: DeviceTopics,
    config: BridgeConfig,
    notices: NoticeSender,
}

impl<T: Transport> Shared<T> {
    fn context<'a>(&'a self, state: &'a mut State) -> HandlerContext<'a> {
        HandlerContext {
            registry: &mut state.registry,
            peripherals: &self.peripherals,
            notices: &self.notices,
            foreground: state.foreground,
            oversampling: self.config.oversampling,
        }
    }

    async fn handle_notice(&self, notice: HardwareNotice) {
        let event = {
            let mut state = self.state.lock().await;
            if !state.running {
                return;
            }
            let mut ctx = self.context(&mut state);

            match notice {
                HardwareNotice::Edge { handle } => match digital::on_edge(&mut ctx, handle).await {
                    Ok(event) => event,
                    Err(e) => {
                        warn!(%handle, "Failed to read line after edge: {}", e);
                        None
                    }
                },
                HardwareNotice::Sample { handle, value } => analog::on_sample(&ctx, handle, value),
                HardwareNotice::ListenerError {
                    class,
                    handle,
                    code,
                } => {
                    let name = listener_owner(ctx.registry, class, handle).unwrap_or("<unknown>");
                    warn!(%class, %handle, code, "Listener error on {}", name);
                    None
                }
            }
        };

        if let Some(event) = event
            && let Err(e) = self.publisher.publish(&event).await
        {
            warn!(class = %event.class, name = %event.name, "Dropping event: {}", e);
        }
    }
}

/// Name of the watched peripheral behind `handle` within `class`.
fn listener_owner(
    registry: &PeripheralRegistry,
    class: PeripheralClass,
    handle: HandleId,
) -> Option<&str> {
    registry
        .lookup_name(class, handle)
        .filter(|name| registry.get(class, name).is_some_and(|entry| entry.listening))
}

async fn run_notice_pump<T: Transport>(
    shared: Arc<Shared<T>>,
    mut notices: mpsc::Receiver<HardwareNotice>,
) {
    while let Some(notice) = notices.recv().await {
        trace!("Hardware notice: {:?}", notice);
        shared.handle_notice(notice).await;
    }
    debug!("Notice channel closed");
}

/// A running peripheral bridge.
///
/// # Examples
///
/// ```
/// use pinbridge_bridge::{Bridge, BridgeConfig};
/// use pinbridge_core::BoardId;
/// use pinbridge_hardware::Peripherals;
/// use pinbridge_network::MemoryTransport;
///
/// #[tokio::main]
/// async fn main() -> pinbridge_core::Result<()> {
///     let config = BridgeConfig::new(BoardId::new("bench-01")?);
///     let (transport, broker) = MemoryTransport::new();
///     let (peripherals, _mocks) = Peripherals::mock();
///
///     let bridge = Bridge::start(config, transport, peripherals).await?;
///     assert_eq!(broker.subscriptions()[0].0, "bench-01");
///
///     bridge
///         .on_message(br#"{"peripheral":"PWM","action":"REGISTER","name":"PWM0","property":"FREQUENCY","value":50.0}"#)
///         .await?;
///     assert_eq!(bridge.stop().await, 1);
///     Ok(())
/// }
/// ```
pub struct Bridge<T> {
    shared: Arc<Shared<T>>,
    pump: StdMutex<Option<JoinHandle<()>>>,
}

impl<T: Transport + 'static> Bridge<T> {
    /// Subscribe to the board's inbound topic and start forwarding hardware
    /// notices.
    ///
    /// Must be called from within a Tokio runtime.
    ///
    /// # Errors
    ///
    /// `Error::Config` for an invalid configuration, `Error::SubscribeFailed`
    /// if the transport refuses the subscription.
    pub async fn start(
        config: BridgeConfig,
        transport: T,
        peripherals: Peripherals,
    ) -> Result<Self> {
        config.validate()?;

        match peripherals.inventory().await {
            Ok(inventory) => {
                for (class, names) in inventory {
                    info!("{} available: [{}]", class, names.join(", "));
                }
            }
            Err(e) => warn!("Failed to list peripherals: {}", e),
        }

        let topics = config.topics();
        transport
            .subscribe(topics.inbound(), config.qos)
            .await
            .map_err(Error::subscribe_failed)?;
        info!("Subscribed to {} (QoS {})", topics.inbound(), config.qos);

        let (notices, receiver) = NoticeSender::channel(config.notice_capacity);
        let publisher = EventPublisher::new(
            transport,
            topics.outbound(),
            config.qos,
            config.quiescence(),
        );

        let shared = Arc::new(Shared {
            inbound: Mutex::new(()),
            state: Mutex::new(State {
                registry: PeripheralRegistry::new(),
                running: true,
                foreground: true,
            }),
            peripherals,
            publisher,
            topics,
            config,
            notices,
        });
        let pump = tokio::spawn(run_notice_pump(Arc::clone(&shared), receiver));

        info!("Bridge {} started", shared.config.board_id);
        Ok(Self {
            shared,
            pump: StdMutex::new(Some(pump)),
        })
    }

    /// Handle one inbound payload.
    ///
    /// Readings produced by the message are published before this returns.
    ///
    /// # Errors
    ///
    /// `Error::MalformedPayload` for undecodable payloads, `Error::NotRunning`
    /// after [`stop`](Self::stop), otherwise whatever the handler or the
    /// publisher reports. Failures are logged here; none of them affect
    /// later messages.
    pub async fn on_message(&self, payload: &[u8]) -> Result<Outcome> {
        let message = decode(payload).inspect_err(|e| warn!("Dropping inbound payload: {}", e))?;
        self.apply(&message).await
    }

    /// Handle a message that was already decoded, for instance by a
    /// [`WireCodec`](pinbridge_protocol::WireCodec) reading a capture.
    ///
    /// # Errors
    ///
    /// As for [`on_message`](Self::on_message), minus decoding.
    pub async fn apply(&self, message: &Message) -> Result<Outcome> {
        let _inbound = self.shared.inbound.lock().await;
        let outcome = {
            let mut state = self.shared.state.lock().await;
            if !state.running {
                return Err(Error::NotRunning);
            }
            let mut ctx = self.shared.context(&mut state);
            dispatch(&mut ctx, message).await
        };

        let outcome = outcome.inspect_err(|e| {
            warn!(
                class = %message.class,
                action = %message.action,
                name = %message.name,
                "Handler failed: {}", e
            );
        })?;

        if let Outcome::Publish(event) = &outcome {
            self.shared.publisher.publish(event).await.inspect_err(|e| {
                warn!(class = %event.class, name = %event.name, "Dropping event: {}", e);
            })?;
        }
        Ok(outcome)
    }

    /// Handle a payload delivered on `topic`.
    ///
    /// Returns `Ok(None)` when the topic is not this board's inbound topic.
    pub async fn on_delivery(&self, topic: &str, payload: &[u8]) -> Result<Option<Outcome>> {
        if !self.shared.topics.is_inbound(topic) {
            debug!("Ignoring delivery on {}", topic);
            return Ok(None);
        }
        self.on_message(payload).await.map(Some)
    }

    /// Stop handling messages and release every peripheral.
    ///
    /// Waits for the message in progress to finish. Returns how many
    /// peripherals were released; calling it again returns 0.
    pub async fn stop(&self) -> usize {
        let _inbound = self.shared.inbound.lock().await;
        let mut state = self.shared.state.lock().await;
        if !state.running {
            return 0;
        }
        state.running = false;
        self.abort_pump();

        let released = state.registry.close_all(&self.shared.peripherals).await;
        info!("Bridge {} stopped, released {} peripherals", self.shared.config.board_id, released);
        released
    }

    /// Attach edge listeners to every registered input line.
    pub async fn on_foreground(&self) -> usize {
        let mut state = self.shared.state.lock().await;
        state.foreground = true;
        if !state.running {
            return 0;
        }
        let attached = digital::attach_listeners(&mut self.shared.context(&mut state)).await;
        debug!("Foreground: attached {} edge listeners", attached);
        attached
    }

    /// Detach every edge listener; lines stay open.
    pub async fn on_background(&self) -> usize {
        let mut state = self.shared.state.lock().await;
        state.foreground = false;
        if !state.running {
            return 0;
        }
        let detached = digital::detach_listeners(&mut self.shared.context(&mut state)).await;
        debug!("Background: detached {} edge listeners", detached);
        detached
    }

    /// Resubscribe after the host re-established its broker connection.
    ///
    /// Hardware state is left as it is.
    pub async fn on_reconnect(&self) -> Result<()> {
        let topics = &self.shared.topics;
        self.shared
            .publisher
            .transport()
            .subscribe(topics.inbound(), self.shared.config.qos)
            .await
            .map_err(Error::subscribe_failed)?;
        info!("Resubscribed to {}", topics.inbound());
        Ok(())
    }

    /// Tear down one peripheral, ending any listener or monitor session.
    ///
    /// Returns `Ok(false)` if nothing was registered under `name`.
    pub async fn release(&self, class: PeripheralClass, name: &str) -> Result<bool> {
        let mut state = self.shared.state.lock().await;
        state
            .registry
            .close(&self.shared.peripherals, class, name)
            .await
    }

    /// Every open peripheral, ordered by class then name.
    pub async fn snapshot(&self) -> Vec<EntryInfo> {
        let state = self.shared.state.lock().await;
        let mut entries: Vec<EntryInfo> = state
            .registry
            .entries()
            .map(|entry| EntryInfo {
                class: entry.class,
                name: entry.name.clone(),
                handle: entry.handle.as_u64(),
                direction: entry.direction,
                watching: entry.listening,
                level: entry.level,
                opened_at: entry.opened_at,
            })
            .collect();
        entries.sort_by(|a, b| {
            (a.class.wire_name(), &a.name).cmp(&(b.class.wire_name(), &b.name))
        });
        entries
    }

    pub async fn is_running(&self) -> bool {
        self.shared.state.lock().await.running
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.shared.config
    }

    pub fn topics(&self) -> &DeviceTopics {
        &self.shared.topics
    }
}

impl<T> Bridge<T> {
    fn abort_pump(&self) {
        let pump = self.pump.lock().unwrap_or_else(PoisonError::into_inner).take();
        if let Some(pump) = pump {
            pump.abort();
        }
    }
}

impl<T> Drop for Bridge<T> {
    fn drop(&mut self) {
        self.abort_pump();
    }
}

impl<T> std::fmt::Debug for Bridge<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Bridge")
            .field("board_id", &self.shared.config.board_id)
            .finish_non_exhaustive()
    }
}
