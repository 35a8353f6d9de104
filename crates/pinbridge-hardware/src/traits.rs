//! Peripheral port trait definitions.
//!
//! A *port* is the capability the bridge consumes for one peripheral class:
//! it opens peripherals by logical name, hands out [`HandleId`] tokens and
//! applies class-specific operations to them. Real drivers and the mocks in
//! [`crate::mock`] both implement these traits.
//!
//! Methods return `impl Future + Send` rather than using bare `async fn` so
//! the bridge can drive ports from spawned Tokio tasks. Implementors may
//! still write `async fn` in their impl blocks.
//!
//! All methods take `&self`; ports synchronize internally, the same way a
//! driver serializes access to its device file.

use std::future::Future;

use crate::error::Result;
use crate::notice::NoticeSender;
use crate::types::{ActiveType, EdgeTrigger, HandleId, LineDirection, Oversampling};
use pinbridge_core::PinLevel;

/// Operations every peripheral class supports.
///
/// # Examples
///
/// ```
/// use pinbridge_hardware::mock::MockGpio;
/// use pinbridge_hardware::traits::PeripheralPort;
///
/// #[tokio::main]
/// async fn main() -> pinbridge_hardware::Result<()> {
///     let (gpio, _handle) = MockGpio::with_lines(["BCM4"]);
///
///     let handle = gpio.open("BCM4").await?;
///     gpio.close(handle).await?;
///     Ok(())
/// }
/// ```
pub trait PeripheralPort: Send + Sync {
    /// Names of the peripherals this port can open.
    fn available(&self) -> impl Future<Output = Result<Vec<String>>> + Send;

    /// Open the named peripheral.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - No peripheral with this name exists
    /// - The peripheral is already open
    /// - The driver fails
    fn open(&self, name: &str) -> impl Future<Output = Result<HandleId>> + Send;

    /// Release an open peripheral.
    ///
    /// # Errors
    ///
    /// Returns an error if the handle is not open or the driver fails.
    fn close(&self, handle: HandleId) -> impl Future<Output = Result<()>> + Send;

    /// Detach whatever listener is attached to the handle.
    ///
    /// Idempotent: detaching twice, or detaching a handle without a
    /// listener, does nothing.
    fn detach_listener(&self, handle: HandleId) -> impl Future<Output = ()> + Send;
}

/// Binary input/output lines.
pub trait DigitalLinePort: PeripheralPort {
    fn set_direction(
        &self,
        handle: HandleId,
        direction: LineDirection,
    ) -> impl Future<Output = Result<()>> + Send;

    fn set_active_type(
        &self,
        handle: HandleId,
        active: ActiveType,
    ) -> impl Future<Output = Result<()>> + Send;

    fn set_edge_trigger(
        &self,
        handle: HandleId,
        trigger: EdgeTrigger,
    ) -> impl Future<Output = Result<()>> + Send;

    /// Drive an output line.
    fn set_level(&self, handle: HandleId, level: PinLevel)
    -> impl Future<Output = Result<()>> + Send;

    /// Read the current level of a line.
    fn read_level(&self, handle: HandleId) -> impl Future<Output = Result<PinLevel>> + Send;

    /// Register an edge listener; every configured edge raises
    /// [`HardwareNotice::Edge`](crate::notice::HardwareNotice::Edge).
    ///
    /// # Errors
    ///
    /// Returns an error if the line is not an input or a listener is
    /// already attached.
    fn attach_edge_listener(
        &self,
        handle: HandleId,
        listener: NoticeSender,
    ) -> impl Future<Output = Result<()>> + Send;
}

/// Pulse-width modulated outputs.
pub trait PulseOutputPort: PeripheralPort {
    fn set_enabled(&self, handle: HandleId, enabled: bool)
    -> impl Future<Output = Result<()>> + Send;

    /// Set the oscillation rate in Hz.
    fn set_frequency(&self, handle: HandleId, hz: f64) -> impl Future<Output = Result<()>> + Send;

    /// Set the active proportion of each period, in percent.
    fn set_duty_cycle(
        &self,
        handle: HandleId,
        percent: f64,
    ) -> impl Future<Output = Result<()>> + Send;
}

/// Continuous-valued sensors.
pub trait AnalogSensorPort: PeripheralPort {
    fn set_oversampling(
        &self,
        handle: HandleId,
        oversampling: Oversampling,
    ) -> impl Future<Output = Result<()>> + Send;

    /// Take one sample.
    fn read_sample(&self, handle: HandleId) -> impl Future<Output = Result<f64>> + Send;

    /// Register a sample listener; each delivered sample raises
    /// [`HardwareNotice::Sample`](crate::notice::HardwareNotice::Sample).
    fn attach_sample_listener(
        &self,
        handle: HandleId,
        listener: NoticeSender,
    ) -> impl Future<Output = Result<()>> + Send;
}
