//! Per-board topic naming.

use pinbridge_core::BoardId;
use pinbridge_core::constants::EVENTS_TOPIC_SUFFIX;

/// Inbound and outbound topics for one board.
///
/// Commands arrive on `<board>`; events leave on `<board>/events`.
///
/// ```
/// use pinbridge_core::BoardId;
/// use pinbridge_network::DeviceTopics;
///
/// let board = BoardId::new("bench-01").unwrap();
/// let topics = DeviceTopics::for_board(&board);
///
/// assert_eq!(topics.inbound(), "bench-01");
/// assert_eq!(topics.outbound(), "bench-01/events");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceTopics {
    inbound: String,
    outbound: String,
}

impl DeviceTopics {
    pub fn for_board(board: &BoardId) -> Self {
        Self {
            inbound: board.as_str().to_string(),
            outbound: format!("{}{}", board.as_str(), EVENTS_TOPIC_SUFFIX),
        }
    }

    pub fn inbound(&self) -> &str {
        &self.inbound
    }

    pub fn outbound(&self) -> &str {
        &self.outbound
    }

    /// Whether a delivery on `topic` is addressed to this board.
    pub fn is_inbound(&self, topic: &str) -> bool {
        topic == self.inbound
    }
}
