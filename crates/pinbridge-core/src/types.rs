use crate::{
    Result,
    constants::{BOARD_ID_FORBIDDEN_CHARS, DEFAULT_QOS_LEVEL, MAX_BOARD_ID_LENGTH},
    error::Error,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Class of peripheral a message addresses.
///
/// The class decides which handler owns a logical name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PeripheralClass {
    /// Binary input or output line.
    #[serde(rename = "GPIO")]
    DigitalLine,

    /// Pulse-width modulated output.
    #[serde(rename = "PWM")]
    PulseOutput,

    /// Continuous-valued sensor.
    #[serde(rename = "TEMPERATURE_SENSOR")]
    AnalogSensor,
}

impl PeripheralClass {
    /// Every class, in registry partition order.
    pub const ALL: [PeripheralClass; 3] =
        [Self::DigitalLine, Self::PulseOutput, Self::AnalogSensor];

    /// Name used on the wire.
    pub fn wire_name(&self) -> &'static str {
        match self {
            Self::DigitalLine => "GPIO",
            Self::PulseOutput => "PWM",
            Self::AnalogSensor => "TEMPERATURE_SENSOR",
        }
    }
}

impl fmt::Display for PeripheralClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.wire_name())
    }
}

impl FromStr for PeripheralClass {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|class| class.wire_name() == s)
            .ok_or_else(|| Error::malformed(format!("Unknown peripheral class: {s}")))
    }
}

/// What a message asks the bridge to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Action {
    /// Declare a line's direction and initial state, or arm a sensor.
    Register,

    /// Apply or report a value change.
    Event,

    /// Begin continuous sensor observation.
    Monitor,
}

impl Action {
    pub const ALL: [Action; 3] = [Self::Register, Self::Event, Self::Monitor];

    pub fn wire_name(&self) -> &'static str {
        match self {
            Self::Register => "REGISTER",
            Self::Event => "EVENT",
            Self::Monitor => "MONITOR",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.wire_name())
    }
}

impl FromStr for Action {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|action| action.wire_name() == s)
            .ok_or_else(|| Error::malformed(format!("Unknown action: {s}")))
    }
}

/// Direction of a digital line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Direction {
    In,
    Out,
}

impl Direction {
    pub fn wire_name(&self) -> &'static str {
        match self {
            Self::In => "IN",
            Self::Out => "OUT",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.wire_name())
    }
}

impl FromStr for Direction {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "IN" => Ok(Self::In),
            "OUT" => Ok(Self::Out),
            other => Err(Error::malformed(format!("Unknown direction: {other}"))),
        }
    }
}

/// Selects which reading of a message's value is authoritative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Property {
    PinState,
    Frequency,
    DutyCycle,
    Temperature,
}

impl Property {
    pub const ALL: [Property; 4] = [
        Self::PinState,
        Self::Frequency,
        Self::DutyCycle,
        Self::Temperature,
    ];

    pub fn wire_name(&self) -> &'static str {
        match self {
            Self::PinState => "PIN_STATE",
            Self::Frequency => "FREQUENCY",
            Self::DutyCycle => "DUTY_CYCLE",
            Self::Temperature => "TEMPERATURE",
        }
    }

    /// Whether this property carries a [`PinLevel`] rather than a magnitude.
    pub fn is_level(&self) -> bool {
        matches!(self, Self::PinState)
    }
}

impl fmt::Display for Property {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.wire_name())
    }
}

impl FromStr for Property {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|property| property.wire_name() == s)
            .ok_or_else(|| Error::malformed(format!("Unknown property: {s}")))
    }
}

/// Logic level of a digital line (active-high).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PinLevel {
    High,
    Low,
}

impl PinLevel {
    #[must_use]
    pub fn is_high(&self) -> bool {
        matches!(self, Self::High)
    }
}

impl From<bool> for PinLevel {
    fn from(high: bool) -> Self {
        if high { Self::High } else { Self::Low }
    }
}

impl From<PinLevel> for bool {
    fn from(level: PinLevel) -> Self {
        level.is_high()
    }
}

impl fmt::Display for PinLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::High => f.write_str("HIGH"),
            Self::Low => f.write_str("LOW"),
        }
    }
}

impl FromStr for PinLevel {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "HIGH" => Ok(Self::High),
            "LOW" => Ok(Self::Low),
            other => Err(Error::malformed(format!("Unknown pin level: {other}"))),
        }
    }
}

/// Value carried by a message.
///
/// On the wire a level is the string `"HIGH"` or `"LOW"` and a magnitude is
/// a bare JSON number.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    /// Digital state.
    Level(PinLevel),

    /// Frequency in Hz, duty cycle in percent, or a sensor sample.
    Magnitude(f64),
}

impl Value {
    pub fn as_level(&self) -> Option<PinLevel> {
        match self {
            Self::Level(level) => Some(*level),
            Self::Magnitude(_) => None,
        }
    }

    pub fn as_magnitude(&self) -> Option<f64> {
        match self {
            Self::Magnitude(value) => Some(*value),
            Self::Level(_) => None,
        }
    }
}

impl From<PinLevel> for Value {
    fn from(level: PinLevel) -> Self {
        Self::Level(level)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Self::Magnitude(value)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Level(level) => write!(f, "{level}"),
            Self::Magnitude(value) => write!(f, "{value}"),
        }
    }
}

/// Delivery-assurance level requested from the pub/sub transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Qos {
    AtMostOnce,
    AtLeastOnce,
    ExactlyOnce,
}

impl Qos {
    pub fn level(&self) -> u8 {
        match self {
            Self::AtMostOnce => 0,
            Self::AtLeastOnce => 1,
            Self::ExactlyOnce => 2,
        }
    }

    /// Whether every delivery is guaranteed to arrive at least once.
    pub fn is_assured(&self) -> bool {
        !matches!(self, Self::AtMostOnce)
    }
}

impl Default for Qos {
    fn default() -> Self {
        // DEFAULT_QOS_LEVEL is always a valid level
        Self::try_from(DEFAULT_QOS_LEVEL).unwrap_or(Self::ExactlyOnce)
    }
}

impl TryFrom<u8> for Qos {
    type Error = Error;

    fn try_from(level: u8) -> Result<Self> {
        match level {
            0 => Ok(Self::AtMostOnce),
            1 => Ok(Self::AtLeastOnce),
            2 => Ok(Self::ExactlyOnce),
            other => Err(Error::Config(format!("QoS level must be 0-2, got {other}"))),
        }
    }
}

impl From<Qos> for u8 {
    fn from(qos: Qos) -> Self {
        qos.level()
    }
}

impl fmt::Display for Qos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.level())
    }
}

/// Identifier of the board a bridge instance serves.
///
/// Doubles as the inbound topic name, so it must not contain topic
/// separators or subscription wildcards.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct BoardId(String);

impl BoardId {
    /// Create a board identifier with validation.
    ///
    /// # Errors
    /// Returns `Error::Config` if the identifier is empty, longer than
    /// `MAX_BOARD_ID_LENGTH`, or contains `/`, `+` or `#`.
    pub fn new(id: impl Into<String>) -> Result<Self> {
        let id = id.into();
        if id.is_empty() || id.len() > MAX_BOARD_ID_LENGTH {
            return Err(Error::Config(format!(
                "Board identifier must be 1-{MAX_BOARD_ID_LENGTH} chars, got {}",
                id.len()
            )));
        }
        if let Some(c) = id.chars().find(|c| BOARD_ID_FORBIDDEN_CHARS.contains(c)) {
            return Err(Error::Config(format!(
                "Board identifier may not contain '{c}': {id}"
            )));
        }
        Ok(BoardId(id))
    }

    /// Generate a fresh random identifier.
    ///
    /// Persisting it across restarts is the host application's concern.
    #[must_use]
    pub fn generate() -> Self {
        BoardId(uuid::Uuid::new_v4().to_string())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for BoardId {
    fn default() -> Self {
        Self::generate()
    }
}

impl fmt::Display for BoardId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for BoardId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        BoardId::new(s)
    }
}

impl TryFrom<String> for BoardId {
    type Error = Error;

    fn try_from(s: String) -> Result<Self> {
        BoardId::new(s)
    }
}

impl From<BoardId> for String {
    fn from(id: BoardId) -> Self {
        id.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("GPIO", PeripheralClass::DigitalLine)]
    #[case("PWM", PeripheralClass::PulseOutput)]
    #[case("TEMPERATURE_SENSOR", PeripheralClass::AnalogSensor)]
    fn test_peripheral_class_parse(#[case] input: &str, #[case] expected: PeripheralClass) {
        let class: PeripheralClass = input.parse().unwrap();
        assert_eq!(class, expected);
        assert_eq!(class.to_string(), input);
    }

    #[rstest]
    #[case("gpio")]
    #[case("I2C")]
    #[case("")]
    fn test_peripheral_class_rejects_unknown(#[case] input: &str) {
        let result = input.parse::<PeripheralClass>();
        assert!(matches!(result, Err(Error::MalformedPayload(_))));
    }

    #[rstest]
    #[case("REGISTER", Action::Register)]
    #[case("EVENT", Action::Event)]
    #[case("MONITOR", Action::Monitor)]
    fn test_action_parse(#[case] input: &str, #[case] expected: Action) {
        assert_eq!(input.parse::<Action>().unwrap(), expected);
    }

    #[test]
    fn test_action_rejects_unknown() {
        assert!("SUBSCRIBE".parse::<Action>().is_err());
    }

    #[rstest]
    #[case("PIN_STATE", Property::PinState)]
    #[case("FREQUENCY", Property::Frequency)]
    #[case("DUTY_CYCLE", Property::DutyCycle)]
    #[case("TEMPERATURE", Property::Temperature)]
    fn test_property_parse(#[case] input: &str, #[case] expected: Property) {
        assert_eq!(input.parse::<Property>().unwrap(), expected);
    }

    #[test]
    fn test_pin_level_bool_conversion() {
        assert_eq!(PinLevel::from(true), PinLevel::High);
        assert_eq!(PinLevel::from(false), PinLevel::Low);
        assert!(bool::from(PinLevel::High));
        assert!(!bool::from(PinLevel::Low));
    }

    #[test]
    fn test_value_serialization() {
        let level = Value::Level(PinLevel::High);
        assert_eq!(serde_json::to_string(&level).unwrap(), "\"HIGH\"");

        let magnitude = Value::Magnitude(21.5);
        assert_eq!(serde_json::to_string(&magnitude).unwrap(), "21.5");

        let parsed: Value = serde_json::from_str("\"LOW\"").unwrap();
        assert_eq!(parsed, Value::Level(PinLevel::Low));

        let parsed: Value = serde_json::from_str("50").unwrap();
        assert_eq!(parsed, Value::Magnitude(50.0));

        assert!(serde_json::from_str::<Value>("\"MEDIUM\"").is_err());
    }

    #[test]
    fn test_value_accessors() {
        assert_eq!(Value::from(PinLevel::High).as_level(), Some(PinLevel::High));
        assert_eq!(Value::from(PinLevel::High).as_magnitude(), None);
        assert_eq!(Value::from(3.5).as_magnitude(), Some(3.5));
        assert_eq!(Value::from(3.5).as_level(), None);
    }

    #[rstest]
    #[case(0, Qos::AtMostOnce)]
    #[case(1, Qos::AtLeastOnce)]
    #[case(2, Qos::ExactlyOnce)]
    fn test_qos_levels(#[case] level: u8, #[case] expected: Qos) {
        let qos = Qos::try_from(level).unwrap();
        assert_eq!(qos, expected);
        assert_eq!(qos.level(), level);
    }

    #[test]
    fn test_qos_invalid_and_default() {
        assert!(Qos::try_from(3).is_err());
        assert_eq!(Qos::default(), Qos::ExactlyOnce);
        assert!(Qos::default().is_assured());
        assert!(!Qos::AtMostOnce.is_assured());
    }

    #[test]
    fn test_board_id_validation() {
        assert!(BoardId::new("kitchen-board").is_ok());
        assert!(BoardId::new("").is_err());
        assert!(BoardId::new("a/b").is_err());
        assert!(BoardId::new("a+b").is_err());
        assert!(BoardId::new("#").is_err());
        assert!(BoardId::new("x".repeat(MAX_BOARD_ID_LENGTH + 1)).is_err());
    }

    #[test]
    fn test_board_id_generate_is_unique() {
        let a = BoardId::generate();
        let b = BoardId::generate();
        assert_ne!(a, b);
        assert_eq!(a.as_str().len(), 36);
    }

    #[test]
    fn test_board_id_deserialize_validates() {
        let ok: BoardId = serde_json::from_str("\"board-7\"").unwrap();
        assert_eq!(ok.as_str(), "board-7");
        assert!(serde_json::from_str::<BoardId>("\"bad/id\"").is_err());
    }
}
