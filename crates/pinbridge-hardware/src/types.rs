//! Common types shared across peripheral port implementations.
//!
//! This module defines the opaque handle token issued by a port, line
//! configuration enums and sensor sampling settings.

use pinbridge_core::Direction;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque token identifying one open peripheral.
///
/// Issued by a port's `open` and valid until the matching `close`. Only the
/// registry keeps handles across calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct HandleId(u64);

impl HandleId {
    pub fn new(raw: u64) -> Self {
        HandleId(raw)
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for HandleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Electrical configuration of a digital line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LineDirection {
    /// Line is read by the board.
    Input,

    /// Line is driven by the board, starting low.
    OutputInitiallyLow,

    /// Line is driven by the board, starting high.
    OutputInitiallyHigh,
}

impl LineDirection {
    /// Whether the line is driven by the board.
    pub fn is_output(&self) -> bool {
        !matches!(self, Self::Input)
    }
}

impl From<Direction> for LineDirection {
    fn from(direction: Direction) -> Self {
        match direction {
            Direction::In => Self::Input,
            Direction::Out => Self::OutputInitiallyLow,
        }
    }
}

/// Which voltage counts as logic-high.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActiveType {
    ActiveHigh,
    ActiveLow,
}

/// Which transitions of an input line raise an edge notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EdgeTrigger {
    None,
    Rising,
    Falling,
    Both,
}

/// Oversampling applied by a sensor before it reports a sample.
///
/// Higher ratios average more raw conversions per sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Oversampling {
    Skipped,
    #[default]
    X1,
    X2,
    X4,
    X8,
    X16,
}

impl Oversampling {
    /// Raw conversions averaged into one sample.
    pub fn ratio(&self) -> u8 {
        match self {
            Self::Skipped => 0,
            Self::X1 => 1,
            Self::X2 => 2,
            Self::X4 => 4,
            Self::X8 => 8,
            Self::X16 => 16,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handle_display() {
        assert_eq!(HandleId::new(12).to_string(), "#12");
        assert_eq!(HandleId::new(12).as_u64(), 12);
    }

    #[test]
    fn test_line_direction_from_direction() {
        assert_eq!(LineDirection::from(Direction::In), LineDirection::Input);
        assert_eq!(
            LineDirection::from(Direction::Out),
            LineDirection::OutputInitiallyLow
        );
        assert!(!LineDirection::Input.is_output());
        assert!(LineDirection::OutputInitiallyHigh.is_output());
    }

    #[test]
    fn test_oversampling_ratio() {
        assert_eq!(Oversampling::default(), Oversampling::X1);
        assert_eq!(Oversampling::Skipped.ratio(), 0);
        assert_eq!(Oversampling::X16.ratio(), 16);
    }

    #[test]
    fn test_oversampling_serialization() {
        let json = serde_json::to_string(&Oversampling::X4).unwrap();
        assert_eq!(json, "\"x4\"");
        let parsed: Oversampling = serde_json::from_str("\"x8\"").unwrap();
        assert_eq!(parsed, Oversampling::X8);
    }
}
