use pinbridge_core::constants::MAX_NAME_LENGTH;
use pinbridge_core::{
    Action, Direction, Error, PeripheralClass, PinLevel, Property, Result, Value,
};
use serde::{Deserialize, Serialize};

/// Decoded peripheral control message.
///
/// Immutable once decoded; handlers only read it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub class: PeripheralClass,
    pub action: Action,
    pub name: String,
    pub direction: Option<Direction>,
    pub property: Property,
    pub value: Value,
}

impl Message {
    pub fn new(
        class: PeripheralClass,
        action: Action,
        name: impl Into<String>,
        direction: Option<Direction>,
        property: Property,
        value: Value,
    ) -> Self {
        Message {
            class,
            action,
            name: name.into(),
            direction,
            property,
            value,
        }
    }

    /// Event reporting the observed level of an input line.
    pub fn pin_state_event(name: impl Into<String>, level: PinLevel) -> Self {
        Message::new(
            PeripheralClass::DigitalLine,
            Action::Event,
            name,
            Some(Direction::In),
            Property::PinState,
            Value::Level(level),
        )
    }

    /// Event reporting a temperature sample.
    pub fn temperature_event(name: impl Into<String>, sample: f64) -> Self {
        Message::new(
            PeripheralClass::AnalogSensor,
            Action::Event,
            name,
            None,
            Property::Temperature,
            Value::Magnitude(sample),
        )
    }

    /// Check the structural rules every message must satisfy.
    ///
    /// # Errors
    /// Returns `Error::MalformedPayload` if the name is empty or too long, or
    /// a digital line message carries no direction.
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(Error::malformed("Peripheral name is empty"));
        }
        if self.name.len() > MAX_NAME_LENGTH {
            return Err(Error::malformed(format!(
                "Peripheral name must be at most {MAX_NAME_LENGTH} chars, got {}",
                self.name.len()
            )));
        }
        if self.class == PeripheralClass::DigitalLine && self.direction.is_none() {
            return Err(Error::malformed(format!(
                "Missing direction for {} line {}",
                self.class, self.name
            )));
        }
        Ok(())
    }
}

/// Key/value record as it travels on the wire.
///
/// Every field is optional here so that decoding can name exactly which
/// field is missing or unrecognized.
///
/// ```text
/// {"peripheral":"GPIO","action":"EVENT","name":"BCM4",
///  "direction":"OUT","property":"PIN_STATE","value":"HIGH"}
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WirePayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub peripheral: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub direction: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub property: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
}

impl WirePayload {
    fn required<'a>(field: &'a Option<String>, key: &str) -> Result<&'a str> {
        field
            .as_deref()
            .ok_or_else(|| Error::malformed(format!("Missing required field: {key}")))
    }
}

impl From<&Message> for WirePayload {
    fn from(message: &Message) -> Self {
        WirePayload {
            peripheral: Some(message.class.wire_name().to_string()),
            action: Some(message.action.wire_name().to_string()),
            name: Some(message.name.clone()),
            direction: message.direction.map(|d| d.wire_name().to_string()),
            property: Some(message.property.wire_name().to_string()),
            value: Some(message.value),
        }
    }
}

impl TryFrom<WirePayload> for Message {
    type Error = Error;

    fn try_from(payload: WirePayload) -> Result<Self> {
        let class: PeripheralClass =
            WirePayload::required(&payload.peripheral, "peripheral")?.parse()?;
        let action: Action = WirePayload::required(&payload.action, "action")?.parse()?;
        let name = WirePayload::required(&payload.name, "name")?.to_string();
        let property: Property =
            WirePayload::required(&payload.property, "property")?.parse()?;
        let direction = payload
            .direction
            .as_deref()
            .map(str::parse::<Direction>)
            .transpose()?;
        let value = payload
            .value
            .ok_or_else(|| Error::malformed("Missing required field: value"))?;

        let message = Message {
            class,
            action,
            name,
            direction,
            property,
            value,
        };
        message.validate()?;
        Ok(message)
    }
}
