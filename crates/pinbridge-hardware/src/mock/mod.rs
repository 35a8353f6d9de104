//! Mock peripheral ports for testing and development.
//!
//! Each mock comes paired with a handle that tests use to inspect recorded
//! calls, change what the "hardware" reports and inject failures.

mod bank;
pub mod gpio;
pub mod pwm;
pub mod sensor;

pub use gpio::{GpioCall, MockGpio, MockGpioHandle};
pub use pwm::{MockPwm, MockPwmHandle, PwmCall};
pub use sensor::{MockSensor, MockSensorHandle, SensorCall};
