//! Peripheral control core.
//!
//! Turns decoded control messages into operations on digital lines, pulse
//! outputs and sensors, and turns hardware activity back into outbound
//! events.
//!
//! # Components
//!
//! - **[`Bridge`]**: lifecycle (`start`, `on_message`, `stop`, foreground
//!   and background transitions, reconnect)
//! - **[`dispatcher`]**: the `(class, action)` routing table
//! - **[`handlers`]**: one module per peripheral class
//! - **[`EventPublisher`]**: encode, publish, then pause
//! - **[`BridgeConfig`]**: board identity, delivery level and timing
//!
//! # Concurrency
//!
//! Inbound messages are handled strictly one after another. Hardware
//! listeners only enqueue notices; a single task drains them. Both paths
//! take the same registry lock, and neither holds it while publishing.

pub mod bridge;
pub mod config;
pub mod dispatcher;
pub mod handlers;
pub mod publisher;

pub use bridge::{Bridge, EntryInfo};
pub use config::BridgeConfig;
pub use dispatcher::{Route, dispatch, route};
pub use handlers::Outcome;
pub use publisher::EventPublisher;
