//! Enum wrappers for peripheral port dispatch.
//!
//! Native `async fn` in traits is not object-safe, so `Box<dyn DigitalLinePort>`
//! is unavailable. Each port trait instead gets an enum with one variant per
//! backend, dispatched with a `match`. Driver backends slot in as new variants
//! behind their cargo features.
//!
//! [`Peripherals`] bundles one port per [`PeripheralClass`] and offers the
//! class-generic operations (open, close, detach) the registry needs.
//!
//! # Examples
//!
//! ```
//! use pinbridge_core::PeripheralClass;
//! use pinbridge_hardware::devices::Peripherals;
//!
//! #[tokio::main]
//! async fn main() -> pinbridge_hardware::Result<()> {
//!     let (peripherals, mocks) = Peripherals::mock();
//!
//!     let handle = peripherals.open(PeripheralClass::PulseOutput, "PWM0").await?;
//!     assert!(mocks.pwm.is_open("PWM0"));
//!
//!     peripherals.close(PeripheralClass::PulseOutput, handle).await?;
//!     Ok(())
//! }
//! ```

use pinbridge_core::{PeripheralClass, PinLevel};

use crate::Result;
use crate::mock::{
    MockGpio, MockGpioHandle, MockPwm, MockPwmHandle, MockSensor, MockSensorHandle,
};
use crate::notice::NoticeSender;
use crate::traits::{AnalogSensorPort, DigitalLinePort, PeripheralPort, PulseOutputPort};
use crate::types::{ActiveType, EdgeTrigger, HandleId, LineDirection, Oversampling};

/// Enum wrapper for digital line port dispatch.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub enum AnyDigitalLinePort {
    /// Mock lines for development and testing.
    Mock(MockGpio),
}

impl PeripheralPort for AnyDigitalLinePort {
    async fn available(&self) -> Result<Vec<String>> {
        match self {
            Self::Mock(port) => port.available().await,
        }
    }

    async fn open(&self, name: &str) -> Result<HandleId> {
        match self {
            Self::Mock(port) => port.open(name).await,
        }
    }

    async fn close(&self, handle: HandleId) -> Result<()> {
        match self {
            Self::Mock(port) => port.close(handle).await,
        }
    }

    async fn detach_listener(&self, handle: HandleId) {
        match self {
            Self::Mock(port) => port.detach_listener(handle).await,
        }
    }
}

impl DigitalLinePort for AnyDigitalLinePort {
    async fn set_direction(&self, handle: HandleId, direction: LineDirection) -> Result<()> {
        match self {
            Self::Mock(port) => port.set_direction(handle, direction).await,
        }
    }

    async fn set_active_type(&self, handle: HandleId, active: ActiveType) -> Result<()> {
        match self {
            Self::Mock(port) => port.set_active_type(handle, active).await,
        }
    }

    async fn set_edge_trigger(&self, handle: HandleId, trigger: EdgeTrigger) -> Result<()> {
        match self {
            Self::Mock(port) => port.set_edge_trigger(handle, trigger).await,
        }
    }

    async fn set_level(&self, handle: HandleId, level: PinLevel) -> Result<()> {
        match self {
            Self::Mock(port) => port.set_level(handle, level).await,
        }
    }

    async fn read_level(&self, handle: HandleId) -> Result<PinLevel> {
        match self {
            Self::Mock(port) => port.read_level(handle).await,
        }
    }

    async fn attach_edge_listener(&self, handle: HandleId, listener: NoticeSender) -> Result<()> {
        match self {
            Self::Mock(port) => port.attach_edge_listener(handle, listener).await,
        }
    }
}

/// Enum wrapper for pulse output port dispatch.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub enum AnyPulseOutputPort {
    /// Mock outputs for development and testing.
    Mock(MockPwm),
}

impl PeripheralPort for AnyPulseOutputPort {
    async fn available(&self) -> Result<Vec<String>> {
        match self {
            Self::Mock(port) => port.available().await,
        }
    }

    async fn open(&self, name: &str) -> Result<HandleId> {
        match self {
            Self::Mock(port) => port.open(name).await,
        }
    }

    async fn close(&self, handle: HandleId) -> Result<()> {
        match self {
            Self::Mock(port) => port.close(handle).await,
        }
    }

    async fn detach_listener(&self, handle: HandleId) {
        match self {
            Self::Mock(port) => port.detach_listener(handle).await,
        }
    }
}

impl PulseOutputPort for AnyPulseOutputPort {
    async fn set_enabled(&self, handle: HandleId, enabled: bool) -> Result<()> {
        match self {
            Self::Mock(port) => port.set_enabled(handle, enabled).await,
        }
    }

    async fn set_frequency(&self, handle: HandleId, hz: f64) -> Result<()> {
        match self {
            Self::Mock(port) => port.set_frequency(handle, hz).await,
        }
    }

    async fn set_duty_cycle(&self, handle: HandleId, percent: f64) -> Result<()> {
        match self {
            Self::Mock(port) => port.set_duty_cycle(handle, percent).await,
        }
    }
}

/// Enum wrapper for analog sensor port dispatch.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub enum AnyAnalogSensorPort {
    /// Mock sensors for development and testing.
    Mock(MockSensor),
}

impl PeripheralPort for AnyAnalogSensorPort {
    async fn available(&self) -> Result<Vec<String>> {
        match self {
            Self::Mock(port) => port.available().await,
        }
    }

    async fn open(&self, name: &str) -> Result<HandleId> {
        match self {
            Self::Mock(port) => port.open(name).await,
        }
    }

    async fn close(&self, handle: HandleId) -> Result<()> {
        match self {
            Self::Mock(port) => port.close(handle).await,
        }
    }

    async fn detach_listener(&self, handle: HandleId) {
        match self {
            Self::Mock(port) => port.detach_listener(handle).await,
        }
    }
}

impl AnalogSensorPort for AnyAnalogSensorPort {
    async fn set_oversampling(&self, handle: HandleId, oversampling: Oversampling) -> Result<()> {
        match self {
            Self::Mock(port) => port.set_oversampling(handle, oversampling).await,
        }
    }

    async fn read_sample(&self, handle: HandleId) -> Result<f64> {
        match self {
            Self::Mock(port) => port.read_sample(handle).await,
        }
    }

    async fn attach_sample_listener(&self, handle: HandleId, listener: NoticeSender) -> Result<()> {
        match self {
            Self::Mock(port) => port.attach_sample_listener(handle, listener).await,
        }
    }
}

/// One port per peripheral class.
#[derive(Debug, Clone)]
pub struct Peripherals {
    pub gpio: AnyDigitalLinePort,
    pub pwm: AnyPulseOutputPort,
    pub sensor: AnyAnalogSensorPort,
}

/// Control handles for the ports created by [`Peripherals::mock`].
#[derive(Debug, Clone)]
pub struct MockPeripherals {
    pub gpio: MockGpioHandle,
    pub pwm: MockPwmHandle,
    pub sensor: MockSensorHandle,
}

impl MockPeripherals {
    /// Total hardware opens across all classes.
    pub fn opens(&self) -> usize {
        self.gpio.opens() + self.pwm.opens() + self.sensor.opens()
    }

    /// Total hardware closes across all classes.
    pub fn closes(&self) -> usize {
        self.gpio.closes() + self.pwm.closes() + self.sensor.closes()
    }

    /// Peripherals currently open across all classes.
    pub fn open_count(&self) -> usize {
        self.gpio.open_count() + self.pwm.open_count() + self.sensor.open_count()
    }
}

impl Peripherals {
    pub fn new(
        gpio: AnyDigitalLinePort,
        pwm: AnyPulseOutputPort,
        sensor: AnyAnalogSensorPort,
    ) -> Self {
        Self { gpio, pwm, sensor }
    }

    /// Mock ports accepting any name, plus their control handles.
    pub fn mock() -> (Self, MockPeripherals) {
        let (gpio, gpio_handle) = MockGpio::new();
        let (pwm, pwm_handle) = MockPwm::new();
        let (sensor, sensor_handle) = MockSensor::new();

        (
            Self::new(
                AnyDigitalLinePort::Mock(gpio),
                AnyPulseOutputPort::Mock(pwm),
                AnyAnalogSensorPort::Mock(sensor),
            ),
            MockPeripherals {
                gpio: gpio_handle,
                pwm: pwm_handle,
                sensor: sensor_handle,
            },
        )
    }

    pub async fn open(&self, class: PeripheralClass, name: &str) -> Result<HandleId> {
        match class {
            PeripheralClass::DigitalLine => self.gpio.open(name).await,
            PeripheralClass::PulseOutput => self.pwm.open(name).await,
            PeripheralClass::AnalogSensor => self.sensor.open(name).await,
        }
    }

    pub async fn close(&self, class: PeripheralClass, handle: HandleId) -> Result<()> {
        match class {
            PeripheralClass::DigitalLine => self.gpio.close(handle).await,
            PeripheralClass::PulseOutput => self.pwm.close(handle).await,
            PeripheralClass::AnalogSensor => self.sensor.close(handle).await,
        }
    }

    pub async fn detach_listener(&self, class: PeripheralClass, handle: HandleId) {
        match class {
            PeripheralClass::DigitalLine => self.gpio.detach_listener(handle).await,
            PeripheralClass::PulseOutput => self.pwm.detach_listener(handle).await,
            PeripheralClass::AnalogSensor => self.sensor.detach_listener(handle).await,
        }
    }

    /// Names each port reports as available, per class.
    pub async fn inventory(&self) -> Result<Vec<(PeripheralClass, Vec<String>)>> {
        Ok(vec![
            (PeripheralClass::DigitalLine, self.gpio.available().await?),
            (PeripheralClass::PulseOutput, self.pwm.available().await?),
            (PeripheralClass::AnalogSensor, self.sensor.available().await?),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_any_digital_line_port_mock() {
        let (gpio, handle) = MockGpio::new();
        let port = AnyDigitalLinePort::Mock(gpio);

        let line = port.open("BCM4").await.unwrap();
        port.set_direction(line, LineDirection::Input).await.unwrap();

        assert_eq!(handle.direction("BCM4"), Some(LineDirection::Input));
    }

    #[tokio::test]
    async fn test_peripherals_dispatch_by_class() {
        let (peripherals, mocks) = Peripherals::mock();

        peripherals
            .open(PeripheralClass::DigitalLine, "X")
            .await
            .unwrap();
        peripherals
            .open(PeripheralClass::PulseOutput, "X")
            .await
            .unwrap();

        assert!(mocks.gpio.is_open("X"));
        assert!(mocks.pwm.is_open("X"));
        assert!(!mocks.sensor.is_open("X"));
        assert_eq!(mocks.open_count(), 2);
    }

    #[tokio::test]
    async fn test_inventory_lists_restricted_ports() {
        let (gpio, _) = MockGpio::with_lines(["BCM4"]);
        let (pwm, _) = MockPwm::with_outputs(["PWM0", "PWM1"]);
        let (sensor, _) = MockSensor::new();
        let peripherals = Peripherals::new(
            AnyDigitalLinePort::Mock(gpio),
            AnyPulseOutputPort::Mock(pwm),
            AnyAnalogSensorPort::Mock(sensor),
        );

        let inventory = peripherals.inventory().await.unwrap();

        assert_eq!(inventory[0].1, vec!["BCM4"]);
        assert_eq!(inventory[1].1, vec!["PWM0", "PWM1"]);
        assert!(inventory[2].1.is_empty());
    }
}
