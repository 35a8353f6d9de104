//! Transport layer for pinbridge.
//!
//! The bridge talks to a publish/subscribe broker through the [`Transport`]
//! capability only. Connection management, reconnection and delivery of
//! inbound payloads belong to the host application.
//!
//! # Components
//!
//! - **Transport**: subscribe/publish capability consumed by the bridge
//! - **DeviceTopics**: inbound and outbound topic names for one board
//! - **MemoryTransport**: in-process transport for tests and the simulator
//!
//! # Example
//!
//! ```
//! use pinbridge_core::{BoardId, Qos};
//! use pinbridge_network::{DeviceTopics, MemoryTransport, Transport};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let board = BoardId::new("bench-01")?;
//! let topics = DeviceTopics::for_board(&board);
//!
//! let (transport, _handle) = MemoryTransport::new();
//! transport.subscribe(topics.inbound(), Qos::AtLeastOnce).await?;
//! # Ok(())
//! # }
//! ```

mod error;
mod memory;
mod topics;
mod transport;

pub use error::TransportError;
pub use memory::{MemoryTransport, MemoryTransportHandle, Publication};
pub use topics::DeviceTopics;
pub use transport::Transport;
