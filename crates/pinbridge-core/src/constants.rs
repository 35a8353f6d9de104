//! Core constants for the pinbridge peripheral bridge.
//!
//! Centralizes the wire names, delivery defaults and validation bounds shared
//! by the protocol, hardware and bridge crates.
//!
//! # Usage
//!
//! ```
//! use pinbridge_core::constants::*;
//!
//! assert_eq!(DEFAULT_QUIESCENCE_MS, 500);
//! assert!((MIN_DUTY_CYCLE..=MAX_DUTY_CYCLE).contains(&50.0));
//! ```

// ============================================================================
// Delivery
// ============================================================================

/// Pause after each outbound publication, in milliseconds.
///
/// Rapid physical edges would otherwise flood the broker with back-to-back
/// publications.
pub const DEFAULT_QUIESCENCE_MS: u64 = 500;

/// Default delivery-assurance level for subscriptions and publications.
pub const DEFAULT_QOS_LEVEL: u8 = 2;

/// Suffix appended to the board identifier to form the outbound topic.
///
/// # Examples
///
/// ```
/// use pinbridge_core::constants::EVENTS_TOPIC_SUFFIX;
///
/// let topic = format!("{}{}", "board-1", EVENTS_TOPIC_SUFFIX);
/// assert_eq!(topic, "board-1/events");
/// ```
pub const EVENTS_TOPIC_SUFFIX: &str = "/events";

/// Capacity of the channel carrying hardware notices into the bridge.
pub const DEFAULT_NOTICE_CAPACITY: usize = 64;

// ============================================================================
// Board identity
// ============================================================================

/// Maximum length of a board identifier.
pub const MAX_BOARD_ID_LENGTH: usize = 128;

/// Characters that may not appear in a board identifier.
///
/// `/` is the topic level separator, `+` and `#` are subscription wildcards.
pub const BOARD_ID_FORBIDDEN_CHARS: [char; 3] = ['/', '+', '#'];

// ============================================================================
// Pulse output bounds
// ============================================================================

/// Lowest accepted duty cycle, in percent.
pub const MIN_DUTY_CYCLE: f64 = 0.0;

/// Highest accepted duty cycle, in percent.
pub const MAX_DUTY_CYCLE: f64 = 100.0;

// ============================================================================
// Payload limits
// ============================================================================

/// Largest inbound payload the codec will attempt to decode (16 KB).
pub const MAX_PAYLOAD_SIZE: usize = 16 * 1024;

/// Maximum length of a logical peripheral name.
pub const MAX_NAME_LENGTH: usize = 64;
