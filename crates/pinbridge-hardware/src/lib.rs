//! Peripheral access layer for the pinbridge bridge.
//!
//! This crate defines the capability traits the bridge consumes for each
//! peripheral class, mock implementations for development and testing, and
//! the [`PeripheralRegistry`] that owns open handles.
//!
//! # Design Philosophy
//!
//! - **Async-first**: port operations are `async` (native `async fn` in
//!   traits, edition 2024), returning `Send` futures.
//! - **Enum dispatch**: [`devices`] wraps each port trait in an enum so
//!   concrete backends can be swapped without trait objects.
//! - **No callbacks into the core**: listeners are [`NoticeSender`]s. A
//!   driver callback only enqueues a [`HardwareNotice`].
//! - **Handles stay in the registry**: a [`HandleId`] is only kept across
//!   calls by [`PeripheralRegistry`].
//!
//! # Port Traits
//!
//! - [`DigitalLinePort`]: binary lines with direction, level and edge
//!   listeners.
//! - [`PulseOutputPort`]: PWM outputs with enable, frequency and duty cycle.
//! - [`AnalogSensorPort`]: sensors with oversampling, single reads and
//!   sample listeners.
//!
//! ```no_run
//! use pinbridge_core::PinLevel;
//! use pinbridge_hardware::traits::DigitalLinePort;
//! use pinbridge_hardware::types::LineDirection;
//! use pinbridge_hardware::Result;
//!
//! async fn blink<P: DigitalLinePort>(port: &P, name: &str) -> Result<()> {
//!     let line = port.open(name).await?;
//!     port.set_direction(line, LineDirection::OutputInitiallyLow).await?;
//!     port.set_level(line, PinLevel::High).await?;
//!     port.set_level(line, PinLevel::Low).await?;
//!     port.close(line).await
//! }
//! ```
//!
//! [`DigitalLinePort`]: traits::DigitalLinePort
//! [`PulseOutputPort`]: traits::PulseOutputPort
//! [`AnalogSensorPort`]: traits::AnalogSensorPort

pub mod devices;
pub mod error;
pub mod mock;
pub mod notice;
pub mod registry;
pub mod traits;
pub mod types;

pub use devices::{
    AnyAnalogSensorPort, AnyDigitalLinePort, AnyPulseOutputPort, MockPeripherals, Peripherals,
};
pub use error::{HardwareError, Result};
pub use notice::{HardwareNotice, ListenerControl, NoticeSender};
pub use registry::{Lease, PeripheralRegistry, RegistryEntry};
pub use types::{ActiveType, EdgeTrigger, HandleId, LineDirection, Oversampling};
