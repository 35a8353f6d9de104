//! Shared harness for bridge integration tests.
//!
//! Starts a bridge on mock peripherals and the in-memory transport, and
//! offers helpers to build inbound payloads and wait for outbound events.

#![allow(dead_code)]

use std::time::Duration;

use pinbridge_bridge::{Bridge, BridgeConfig};
use pinbridge_core::{Action, BoardId, Direction, PeripheralClass, PinLevel, Property, Value};
use pinbridge_hardware::{MockPeripherals, Peripherals};
use pinbridge_network::{MemoryTransport, MemoryTransportHandle, Publication};
use pinbridge_protocol::{Message, decode, encode};
use tokio::sync::mpsc;

pub const BOARD: &str = "bench-01";
pub const EVENTS_TOPIC: &str = "bench-01/events";

/// How long to wait for an event before giving up.
const EVENT_TIMEOUT: Duration = Duration::from_secs(1);

/// How long to watch for an event that must not arrive.
const SILENCE: Duration = Duration::from_millis(50);

pub struct Harness {
    pub bridge: Bridge<MemoryTransport>,
    pub broker: MemoryTransportHandle,
    pub mocks: MockPeripherals,
    pub feed: mpsc::UnboundedReceiver<Publication>,
}

pub fn config() -> BridgeConfig {
    BridgeConfig::new(BoardId::new(BOARD).unwrap()).with_quiescence(Duration::ZERO)
}

pub async fn start() -> Harness {
    start_with(config()).await
}

pub async fn start_with(config: BridgeConfig) -> Harness {
    let (transport, broker) = MemoryTransport::new();
    let (peripherals, mocks) = Peripherals::mock();
    let feed = broker.feed();
    let bridge = Bridge::start(config, transport, peripherals)
        .await
        .expect("bridge should start");

    Harness {
        bridge,
        broker,
        mocks,
        feed,
    }
}

impl Harness {
    /// Wait for the next outbound event and decode it.
    pub async fn next_event(&mut self) -> Message {
        let publication = tokio::time::timeout(EVENT_TIMEOUT, self.feed.recv())
            .await
            .expect("timed out waiting for an event")
            .expect("feed closed");

        assert_eq!(publication.topic, EVENTS_TOPIC);
        assert!(!publication.retained);
        decode(&publication.payload).expect("published payload should decode")
    }

    /// Assert nothing is published for a short while.
    pub async fn assert_no_event(&mut self) {
        if let Ok(Some(publication)) = tokio::time::timeout(SILENCE, self.feed.recv()).await {
            panic!("unexpected publication: {:?}", publication);
        }
    }
}

pub fn line(action: Action, name: &str, direction: Direction, level: PinLevel) -> Vec<u8> {
    wire(Message::new(
        PeripheralClass::DigitalLine,
        action,
        name,
        Some(direction),
        Property::PinState,
        Value::Level(level),
    ))
}

pub fn pulse(action: Action, name: &str, property: Property, value: impl Into<Value>) -> Vec<u8> {
    wire(Message::new(
        PeripheralClass::PulseOutput,
        action,
        name,
        None,
        property,
        value.into(),
    ))
}

pub fn sensor(action: Action, name: &str) -> Vec<u8> {
    wire(Message::new(
        PeripheralClass::AnalogSensor,
        action,
        name,
        None,
        Property::Temperature,
        Value::Magnitude(0.0),
    ))
}

fn wire(message: Message) -> Vec<u8> {
    encode(&message).unwrap().to_vec()
}
