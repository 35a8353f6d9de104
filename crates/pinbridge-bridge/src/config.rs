//! Bridge configuration.

use std::time::Duration;

use pinbridge_core::constants::{DEFAULT_NOTICE_CAPACITY, DEFAULT_QUIESCENCE_MS};
use pinbridge_core::{BoardId, Error, Qos, Result};
use pinbridge_hardware::Oversampling;
use pinbridge_network::DeviceTopics;
use serde::{Deserialize, Serialize};

/// Settings for one bridge instance.
///
/// Every field has a default, so a JSON document only needs the fields it
/// changes:
///
/// ```
/// use pinbridge_bridge::BridgeConfig;
///
/// let config = BridgeConfig::from_json_str(r#"{"board_id": "bench-01", "quiescence_ms": 0}"#)
///     .unwrap();
///
/// assert_eq!(config.board_id.as_str(), "bench-01");
/// assert_eq!(config.topics().outbound(), "bench-01/events");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BridgeConfig {
    /// Identifies the board; also names its topics.
    pub board_id: BoardId,

    /// Delivery level for the inbound subscription and every publication.
    pub qos: Qos,

    /// Pause after each publication, in milliseconds.
    pub quiescence_ms: u64,

    /// Hardware notices buffered before new ones are dropped.
    pub notice_capacity: usize,

    /// Oversampling applied to one-shot sensor reads.
    pub oversampling: Oversampling,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            board_id: BoardId::generate(),
            qos: Qos::default(),
            quiescence_ms: DEFAULT_QUIESCENCE_MS,
            notice_capacity: DEFAULT_NOTICE_CAPACITY,
            oversampling: Oversampling::default(),
        }
    }
}

impl BridgeConfig {
    pub fn new(board_id: BoardId) -> Self {
        Self {
            board_id,
            ..Self::default()
        }
    }

    /// Parse and validate a JSON document.
    ///
    /// # Errors
    ///
    /// `Error::Config` for syntax errors, unknown fields, an invalid board
    /// identifier or a setting [`validate`](Self::validate) rejects.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json).map_err(|e| Error::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Check settings serde cannot express.
    pub fn validate(&self) -> Result<()> {
        if !self.qos.is_assured() {
            return Err(Error::Config(format!(
                "Inbound delivery needs QoS 1 or 2, got {}",
                self.qos
            )));
        }
        if self.notice_capacity == 0 {
            return Err(Error::Config("notice_capacity must be at least 1".to_string()));
        }
        Ok(())
    }

    #[must_use]
    pub fn with_quiescence(mut self, quiescence: Duration) -> Self {
        self.quiescence_ms = u64::try_from(quiescence.as_millis()).unwrap_or(u64::MAX);
        self
    }

    #[must_use]
    pub fn with_qos(mut self, qos: Qos) -> Self {
        self.qos = qos;
        self
    }

    pub fn quiescence(&self) -> Duration {
        Duration::from_millis(self.quiescence_ms)
    }

    pub fn topics(&self) -> DeviceTopics {
        DeviceTopics::for_board(&self.board_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_defaults() {
        let config = BridgeConfig::default();

        assert_eq!(config.qos, Qos::ExactlyOnce);
        assert_eq!(config.quiescence(), Duration::from_millis(500));
        assert_eq!(config.notice_capacity, 64);
        assert_eq!(config.oversampling, Oversampling::X1);
    }

    #[test]
    fn test_generated_board_ids_differ() {
        assert_ne!(BridgeConfig::default().board_id, BridgeConfig::default().board_id);
    }

    #[test]
    fn test_full_document() {
        let config = BridgeConfig::from_json_str(
            r#"{
                "board_id": "lab",
                "qos": 1,
                "quiescence_ms": 20,
                "notice_capacity": 8,
                "oversampling": "x4"
            }"#,
        )
        .unwrap();

        assert_eq!(config.qos, Qos::AtLeastOnce);
        assert_eq!(config.quiescence(), Duration::from_millis(20));
        assert_eq!(config.notice_capacity, 8);
        assert_eq!(config.oversampling, Oversampling::X4);
        assert_eq!(config.topics().inbound(), "lab");
    }

    #[rstest]
    #[case::unknown_field(r#"{"board_id": "lab", "colour": "red"}"#)]
    #[case::bad_board_id(r#"{"board_id": "lab/1"}"#)]
    #[case::qos_out_of_range(r#"{"qos": 3}"#)]
    #[case::qos_not_assured(r#"{"qos": 0}"#)]
    #[case::zero_capacity(r#"{"notice_capacity": 0}"#)]
    #[case::not_json("board_id = lab")]
    fn test_rejected_documents(#[case] json: &str) {
        let result = BridgeConfig::from_json_str(json);
        assert!(matches!(result, Err(Error::Config(_))), "{json}");
    }

    #[test]
    fn test_with_quiescence() {
        let config = BridgeConfig::default().with_quiescence(Duration::ZERO);
        assert_eq!(config.quiescence_ms, 0);
    }
}
