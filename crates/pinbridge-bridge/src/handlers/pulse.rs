//! Pulse output handling.
//!
//! Pulse outputs are sinks: they are opened once and every later property
//! update reuses the same handle. Values are validated before any hardware
//! call, and out-of-range values are rejected rather than clamped.

use pinbridge_core::constants::{MAX_DUTY_CYCLE, MIN_DUTY_CYCLE};
use pinbridge_core::{Error, PeripheralClass, Property, Result};
use pinbridge_hardware::traits::PulseOutputPort;
use pinbridge_protocol::Message;
use tracing::debug;

use super::{HandlerContext, Outcome, io_error};

const CLASS: PeripheralClass = PeripheralClass::PulseOutput;

/// A validated change to a pulse output.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PulseSetting {
    Enabled(bool),
    Frequency(f64),
    DutyCycle(f64),
}

impl PulseSetting {
    pub fn from_message(message: &Message) -> Result<Self> {
        let property = message.property;
        let magnitude = || {
            message.value.as_magnitude().ok_or_else(|| {
                Error::invalid_parameter(
                    property,
                    format!("expected a number, got {}", message.value),
                )
            })
        };

        match property {
            Property::PinState => message
                .value
                .as_level()
                .map(|level| Self::Enabled(level.is_high()))
                .ok_or_else(|| {
                    Error::invalid_parameter(
                        property,
                        format!("expected HIGH or LOW, got {}", message.value),
                    )
                }),
            Property::Frequency => {
                let hz = magnitude()?;
                if hz.is_finite() && hz > 0.0 {
                    Ok(Self::Frequency(hz))
                } else {
                    Err(Error::invalid_parameter(
                        property,
                        format!("must be > 0 Hz, got {hz}"),
                    ))
                }
            }
            Property::DutyCycle => {
                let percent = magnitude()?;
                if (MIN_DUTY_CYCLE..=MAX_DUTY_CYCLE).contains(&percent) {
                    Ok(Self::DutyCycle(percent))
                } else {
                    Err(Error::invalid_parameter(
                        property,
                        format!("must be within {MIN_DUTY_CYCLE}-{MAX_DUTY_CYCLE}%, got {percent}"),
                    ))
                }
            }
            Property::Temperature => Err(Error::invalid_parameter(
                property,
                "not applicable to pulse outputs",
            )),
        }
    }
}

/// Open the output so later updates find it ready.
pub async fn register(ctx: &mut HandlerContext<'_>, message: &Message) -> Result<Outcome> {
    let name = message.name.as_str();
    let lease = ctx
        .registry
        .open_or_reuse(ctx.peripherals, CLASS, name, None)
        .await?;

    debug!("Registered pulse output {} ({})", name, lease.handle);
    Ok(Outcome::Applied)
}

/// Apply one property update.
pub async fn event(ctx: &mut HandlerContext<'_>, message: &Message) -> Result<Outcome> {
    let name = message.name.as_str();
    let setting = PulseSetting::from_message(message)?;
    let lease = ctx
        .registry
        .open_or_reuse(ctx.peripherals, CLASS, name, None)
        .await?;

    let pwm = &ctx.peripherals.pwm;
    match setting {
        PulseSetting::Enabled(enabled) => pwm.set_enabled(lease.handle, enabled).await,
        PulseSetting::Frequency(hz) => pwm.set_frequency(lease.handle, hz).await,
        PulseSetting::DutyCycle(percent) => pwm.set_duty_cycle(lease.handle, percent).await,
    }
    .map_err(io_error(name))?;

    debug!("Applied {:?} to {}", setting, name);
    Ok(Outcome::Applied)
}
