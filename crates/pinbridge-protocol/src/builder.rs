use crate::message::Message;
use pinbridge_core::{Action, Direction, Error, PeripheralClass, Property, Result, Value};

/// Builder for constructing control messages with a fluent API
///
/// # Example
/// ```
/// use pinbridge_protocol::MessageBuilder;
/// use pinbridge_core::{Action, Direction, PeripheralClass, PinLevel, Property};
///
/// let msg = MessageBuilder::new(PeripheralClass::DigitalLine, Action::Register, "BCM4")
///     .direction(Direction::In)
///     .property(Property::PinState)
///     .value(PinLevel::Low)
///     .build()
///     .unwrap();
///
/// assert_eq!(msg.name, "BCM4");
/// ```
#[derive(Debug, Clone)]
pub struct MessageBuilder {
    class: PeripheralClass,
    action: Action,
    name: String,
    direction: Option<Direction>,
    property: Property,
    value: Option<Value>,
}

impl MessageBuilder {
    /// Create a new builder; the property defaults to `PinState`.
    pub fn new(class: PeripheralClass, action: Action, name: impl Into<String>) -> Self {
        MessageBuilder {
            class,
            action,
            name: name.into(),
            direction: None,
            property: Property::PinState,
            value: None,
        }
    }

    pub fn direction(mut self, direction: Direction) -> Self {
        self.direction = Some(direction);
        self
    }

    pub fn property(mut self, property: Property) -> Self {
        self.property = property;
        self
    }

    /// Set the value; accepts a `PinLevel`, an `f64` or a `Value`.
    pub fn value(mut self, value: impl Into<Value>) -> Self {
        self.value = Some(value.into());
        self
    }

    /// Build the message
    ///
    /// # Errors
    /// Returns `Error::MalformedPayload` if no value was set or the message
    /// fails [`Message::validate`].
    pub fn build(self) -> Result<Message> {
        let value = self
            .value
            .ok_or_else(|| Error::malformed("Missing required field: value"))?;

        let message = Message {
            class: self.class,
            action: self.action,
            name: self.name,
            direction: self.direction,
            property: self.property,
            value,
        };
        message.validate()?;
        Ok(message)
    }
}
