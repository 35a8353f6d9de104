//! Property-based tests for the wire codec.
//!
//! These tests use proptest to generate arbitrary well-formed messages and
//! verify that encoding followed by decoding preserves every field.

use pinbridge_core::{Action, Direction, PeripheralClass, PinLevel, Property, Value};
use pinbridge_protocol::{Message, decode, encode};
use proptest::prelude::*;

fn valid_class() -> impl Strategy<Value = PeripheralClass> {
    prop_oneof![
        Just(PeripheralClass::DigitalLine),
        Just(PeripheralClass::PulseOutput),
        Just(PeripheralClass::AnalogSensor),
    ]
}

fn valid_action() -> impl Strategy<Value = Action> {
    prop_oneof![Just(Action::Register), Just(Action::Event), Just(Action::Monitor)]
}

fn valid_direction() -> impl Strategy<Value = Direction> {
    prop_oneof![Just(Direction::In), Just(Direction::Out)]
}

fn valid_property() -> impl Strategy<Value = Property> {
    prop_oneof![
        Just(Property::PinState),
        Just(Property::Frequency),
        Just(Property::DutyCycle),
        Just(Property::Temperature),
    ]
}

/// Levels and finite magnitudes; JSON has no encoding for NaN or infinity.
fn valid_value() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Level(PinLevel::High)),
        Just(Value::Level(PinLevel::Low)),
        (-1.0e9f64..1.0e9f64).prop_map(Value::Magnitude),
    ]
}

/// Peripheral names: printable, including characters JSON must escape.
fn valid_name() -> impl Strategy<Value = String> {
    prop::string::string_regex("[A-Za-z0-9_\\-\"\\\\ ]{0,40}[A-Za-z0-9_]")
        .expect("Failed to create name regex strategy")
}

fn valid_message() -> impl Strategy<Value = Message> {
    (
        valid_class(),
        valid_action(),
        valid_name(),
        proptest::option::of(valid_direction()),
        valid_property(),
        valid_value(),
    )
        .prop_map(|(class, action, name, direction, property, value)| {
            // Digital lines always carry a direction.
            let direction = match class {
                PeripheralClass::DigitalLine => direction.or(Some(Direction::Out)),
                _ => direction,
            };
            Message::new(class, action, name, direction, property, value)
        })
}

proptest! {
    /// Property: decode(encode(m)) == m for every constructible message.
    #[test]
    fn prop_encode_decode_roundtrip(msg in valid_message()) {
        let bytes = encode(&msg).unwrap();
        let decoded = decode(&bytes).unwrap();
        prop_assert_eq!(decoded, msg);
    }

    /// Property: decoding arbitrary bytes never panics.
    #[test]
    fn prop_decode_arbitrary_bytes_never_panics(
        bytes in prop::collection::vec(any::<u8>(), 0..512)
    ) {
        let _ = decode(&bytes);
    }

    /// Property: an encoded message is always a JSON object naming the peripheral.
    #[test]
    fn prop_encoded_payload_names_peripheral(msg in valid_message()) {
        let bytes = encode(&msg).unwrap();
        let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        prop_assert_eq!(json["peripheral"].as_str(), Some(msg.class.wire_name()));
        prop_assert_eq!(json["name"].as_str(), Some(msg.name.as_str()));
    }
}
