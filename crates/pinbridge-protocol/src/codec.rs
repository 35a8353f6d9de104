//! Wire codec for peripheral control messages.
//!
//! Each pub/sub delivery carries exactly one JSON key/value record, so the
//! bridge calls [`decode`] and [`encode`] on whole payloads. [`WireCodec`] is
//! the framing adapter for byte streams that carry many payloads (captured
//! controller traffic, pipes, sockets): one payload per line, wrapped with
//! `Framed`, `FramedRead` or `FramedWrite`.
//!
//! ```text
//! bytes -> decode -> Message (validated)
//! Message -> encode -> bytes
//! stream -> WireCodec -> payload\n payload\n ...
//! ```
//!
//! Decoding is field-for-field: unknown keys are ignored, a missing required
//! key or an unrecognized enumeration value yields
//! `Error::MalformedPayload`.

use bytes::{BufMut, Bytes, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

use crate::message::{Message, WirePayload};
use pinbridge_core::constants::MAX_PAYLOAD_SIZE;
use pinbridge_core::{Error, Result, Value};

/// Decode one payload into a validated [`Message`].
///
/// # Errors
/// Returns `Error::MalformedPayload` if the payload is oversized, is not a
/// JSON object, lacks a required field, or carries an unknown class, action,
/// direction or property.
///
/// # Example
/// ```
/// use pinbridge_protocol::decode;
/// use pinbridge_core::{PeripheralClass, PinLevel, Value};
///
/// let payload = br#"{"peripheral":"GPIO","action":"EVENT","name":"BCM4",
///                    "direction":"OUT","property":"PIN_STATE","value":"HIGH"}"#;
/// let msg = decode(payload).unwrap();
///
/// assert_eq!(msg.class, PeripheralClass::DigitalLine);
/// assert_eq!(msg.value, Value::Level(PinLevel::High));
/// ```
pub fn decode(bytes: &[u8]) -> Result<Message> {
    if bytes.len() > MAX_PAYLOAD_SIZE {
        return Err(Error::malformed(format!(
            "Payload of {} bytes exceeds limit of {MAX_PAYLOAD_SIZE}",
            bytes.len()
        )));
    }

    let payload: WirePayload =
        serde_json::from_slice(bytes).map_err(|e| Error::malformed(e.to_string()))?;
    Message::try_from(payload)
}

/// Encode a [`Message`] into its wire form.
///
/// # Errors
/// Returns `Error::InvalidParameter` for a non-finite magnitude, which JSON
/// cannot represent.
pub fn encode(message: &Message) -> Result<Bytes> {
    if let Value::Magnitude(value) = message.value
        && !value.is_finite()
    {
        return Err(Error::invalid_parameter(
            message.property,
            format!("cannot encode non-finite value {value}"),
        ));
    }

    let bytes = serde_json::to_vec(&WirePayload::from(message))
        .map_err(|e| Error::malformed(e.to_string()))?;
    Ok(Bytes::from(bytes))
}

/// Tokio codec for newline-delimited payloads.
///
/// Encoded JSON never contains a raw newline, so the delimiter is
/// unambiguous. Blank lines are skipped and a trailing `\r` is tolerated.
#[derive(Debug, Default, Clone, Copy)]
pub struct WireCodec;

impl WireCodec {
    pub fn new() -> Self {
        WireCodec
    }
}

fn is_blank(line: &[u8]) -> bool {
    line.iter().all(u8::is_ascii_whitespace)
}

impl Decoder for WireCodec {
    type Item = Message;
    type Error = Error;

    /// Decode the next complete line.
    ///
    /// A malformed line is consumed before its error is returned, so it
    /// never blocks the lines behind it.
    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>> {
        loop {
            let Some(end) = src.iter().position(|b| *b == b'\n') else {
                if src.len() > MAX_PAYLOAD_SIZE {
                    src.clear();
                    return Err(Error::malformed(format!(
                        "No line break within {MAX_PAYLOAD_SIZE} bytes"
                    )));
                }
                return Ok(None);
            };

            let line = src.split_to(end + 1);
            if is_blank(&line) {
                continue;
            }
            return decode(&line).map(Some);
        }
    }

    /// Accept a final payload that lacks its line break.
    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>> {
        if let Some(message) = self.decode(src)? {
            return Ok(Some(message));
        }
        let rest = src.split();
        if is_blank(&rest) {
            return Ok(None);
        }
        decode(&rest).map(Some)
    }
}

impl Encoder<Message> for WireCodec {
    type Error = Error;

    fn encode(&mut self, item: Message, dst: &mut BytesMut) -> Result<()> {
        let bytes = encode(&item)?;
        dst.reserve(bytes.len() + 1);
        dst.put_slice(&bytes);
        dst.put_u8(b'\n');
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pinbridge_core::{Action, Direction, PeripheralClass, PinLevel, Property};
    use rstest::rstest;

    #[test]
    fn test_decode_digital_event() {
        let payload = br#"{"peripheral":"GPIO","action":"EVENT","name":"BCM4","direction":"OUT","property":"PIN_STATE","value":"LOW"}"#;

        let msg = decode(payload).unwrap();

        assert_eq!(msg.class, PeripheralClass::DigitalLine);
        assert_eq!(msg.action, Action::Event);
        assert_eq!(msg.name, "BCM4");
        assert_eq!(msg.direction, Some(Direction::Out));
        assert_eq!(msg.property, Property::PinState);
        assert_eq!(msg.value, Value::Level(PinLevel::Low));
    }

    #[test]
    fn test_decode_pulse_output_without_direction() {
        let payload = br#"{"peripheral":"PWM","action":"EVENT","name":"PWM_1","property":"FREQUENCY","value":50}"#;

        let msg = decode(payload).unwrap();

        assert_eq!(msg.class, PeripheralClass::PulseOutput);
        assert_eq!(msg.direction, None);
        assert_eq!(msg.value, Value::Magnitude(50.0));
    }

    #[test]
    fn test_decode_ignores_unknown_keys() {
        let payload = br#"{"peripheral":"TEMPERATURE_SENSOR","action":"MONITOR","name":"TEMP_1","property":"TEMPERATURE","value":0,"version":3}"#;

        assert!(decode(payload).is_ok());
    }

    #[rstest]
    #[case::not_json(b"GPIO:EVENT:BCM4".as_slice())]
    #[case::empty_object(br#"{}"#.as_slice())]
    #[case::unknown_class(br#"{"peripheral":"I2C","action":"EVENT","name":"X","property":"PIN_STATE","value":"HIGH"}"#.as_slice())]
    #[case::unknown_action(br#"{"peripheral":"PWM","action":"BLINK","name":"X","property":"PIN_STATE","value":"HIGH"}"#.as_slice())]
    #[case::unknown_property(br#"{"peripheral":"PWM","action":"EVENT","name":"X","property":"PHASE","value":1}"#.as_slice())]
    #[case::unknown_direction(br#"{"peripheral":"GPIO","action":"EVENT","name":"X","direction":"BOTH","property":"PIN_STATE","value":"HIGH"}"#.as_slice())]
    #[case::missing_direction(br#"{"peripheral":"GPIO","action":"EVENT","name":"X","property":"PIN_STATE","value":"HIGH"}"#.as_slice())]
    #[case::missing_value(br#"{"peripheral":"PWM","action":"EVENT","name":"X","property":"FREQUENCY"}"#.as_slice())]
    #[case::bad_value(br#"{"peripheral":"GPIO","action":"EVENT","name":"X","direction":"IN","property":"PIN_STATE","value":"MAYBE"}"#.as_slice())]
    fn test_decode_malformed(#[case] payload: &[u8]) {
        let result = decode(payload);
        assert!(
            matches!(result, Err(Error::MalformedPayload(_))),
            "expected MalformedPayload, got {result:?}"
        );
    }

    #[test]
    fn test_decode_rejects_oversized_payload() {
        let payload = vec![b' '; MAX_PAYLOAD_SIZE + 1];
        assert!(matches!(decode(&payload), Err(Error::MalformedPayload(_))));
    }

    #[test]
    fn test_encode_omits_absent_direction() {
        let msg = Message::temperature_event("TEMP_1", 21.5);
        let bytes = encode(&msg).unwrap();
        let text = std::str::from_utf8(&bytes).unwrap();

        assert!(!text.contains("direction"));
        assert!(text.contains(r#""value":21.5"#));
        assert!(text.contains(r#""peripheral":"TEMPERATURE_SENSOR""#));
    }

    #[test]
    fn test_encode_rejects_non_finite() {
        let msg = Message::temperature_event("TEMP_1", f64::NAN);
        assert!(matches!(encode(&msg), Err(Error::InvalidParameter { .. })));
    }

    #[test]
    fn test_codec_drains_buffer() {
        let mut codec = WireCodec::new();
        let msg = Message::pin_state_event("LINE_A", PinLevel::High);

        let mut buffer = BytesMut::new();
        Encoder::encode(&mut codec, msg.clone(), &mut buffer).unwrap();

        let decoded = Decoder::decode(&mut codec, &mut buffer).unwrap();
        assert_eq!(decoded, Some(msg));
        assert!(buffer.is_empty());
        assert_eq!(Decoder::decode(&mut codec, &mut buffer).unwrap(), None);
    }

    #[test]
    fn test_codec_skips_past_malformed_line() {
        let mut codec = WireCodec::new();
        let mut buffer = BytesMut::from(&b"not a message\n\n"[..]);
        let msg = Message::temperature_event("TEMP_1", 19.0);
        Encoder::encode(&mut codec, msg.clone(), &mut buffer).unwrap();

        assert!(Decoder::decode(&mut codec, &mut buffer).is_err());
        assert_eq!(Decoder::decode(&mut codec, &mut buffer).unwrap(), Some(msg));
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_codec_waits_for_line_break() {
        let mut codec = WireCodec::new();
        let mut buffer = BytesMut::from(&br#"{"peripheral":"GPIO","action":"EVENT","name":"BCM4","direction":"OUT","property":"PIN_STATE","value":"LOW"}"#[..]);

        assert_eq!(Decoder::decode(&mut codec, &mut buffer).unwrap(), None);
        assert!(!buffer.is_empty());

        let msg = codec.decode_eof(&mut buffer).unwrap().unwrap();
        assert_eq!(msg.name, "BCM4");
        assert!(buffer.is_empty());
        assert_eq!(codec.decode_eof(&mut buffer).unwrap(), None);
    }

    #[test]
    fn test_codec_tolerates_crlf() {
        let mut codec = WireCodec::new();
        let mut buffer = BytesMut::from(&b"{\"peripheral\":\"PWM\",\"action\":\"EVENT\",\"name\":\"PWM_1\",\"property\":\"PIN_STATE\",\"value\":\"HIGH\"}\r\n"[..]);

        let msg = Decoder::decode(&mut codec, &mut buffer).unwrap().unwrap();
        assert_eq!(msg.value, Value::Level(PinLevel::High));
    }

    #[test]
    fn test_codec_rejects_unterminated_flood() {
        let mut codec = WireCodec::new();
        let mut buffer = BytesMut::from(vec![b'{'; MAX_PAYLOAD_SIZE + 1].as_slice());

        assert!(matches!(
            Decoder::decode(&mut codec, &mut buffer),
            Err(Error::MalformedPayload(_))
        ));
        assert!(buffer.is_empty());
    }
}
