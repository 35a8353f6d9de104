//! Analog sensor handling.
//!
//! `Register` is a one-shot read: open, configure, sample, close. `Monitor`
//! keeps the sensor open with a sample listener until the bridge stops or
//! the sensor is released.

use pinbridge_core::{PeripheralClass, Result};
use pinbridge_hardware::HandleId;
use pinbridge_hardware::traits::{AnalogSensorPort, PeripheralPort};
use pinbridge_protocol::Message;
use tracing::{debug, trace, warn};

use super::{HandlerContext, Outcome, discard, io_error};

const CLASS: PeripheralClass = PeripheralClass::AnalogSensor;

/// Take one sample and report it.
///
/// A sensor already held open by a monitor session is read through that
/// session's handle and stays open.
pub async fn register(ctx: &mut HandlerContext<'_>, message: &Message) -> Result<Outcome> {
    let name = message.name.as_str();
    let sensor = &ctx.peripherals.sensor;

    if let Some(entry) = ctx.registry.get(CLASS, name) {
        let sample = sensor
            .read_sample(entry.handle)
            .await
            .map_err(io_error(name))?;
        debug!("Sampled monitored sensor {}: {}", name, sample);
        return Ok(Outcome::Publish(Message::temperature_event(name, sample)));
    }

    let handle = sensor.open(name).await.map_err(io_error(name))?;
    let sample = read_once(ctx, handle).await.map_err(io_error(name));

    // The handle is released whether or not the read worked.
    if let Err(e) = sensor.close(handle).await {
        warn!("Failed to close sensor {} after sampling: {}", name, e);
    }

    let sample = sample?;
    debug!("Sampled {}: {}", name, sample);
    Ok(Outcome::Publish(Message::temperature_event(name, sample)))
}

async fn read_once(
    ctx: &HandlerContext<'_>,
    handle: HandleId,
) -> pinbridge_hardware::Result<f64> {
    let sensor = &ctx.peripherals.sensor;
    sensor.set_oversampling(handle, ctx.oversampling).await?;
    sensor.read_sample(handle).await
}

/// Start a continuous sampling session.
pub async fn monitor(ctx: &mut HandlerContext<'_>, message: &Message) -> Result<Outcome> {
    let name = message.name.as_str();
    if ctx
        .registry
        .get(CLASS, name)
        .is_some_and(|entry| entry.listening)
    {
        return Ok(Outcome::Ignored {
            reason: "sensor is already monitored",
        });
    }

    let lease = ctx
        .registry
        .open_or_reuse(ctx.peripherals, CLASS, name, None)
        .await?;

    let sensor = &ctx.peripherals.sensor;
    let setup = async {
        sensor
            .set_oversampling(lease.handle, ctx.oversampling)
            .await?;
        sensor
            .attach_sample_listener(lease.handle, ctx.notices.clone())
            .await
    }
    .await;

    if let Err(e) = setup {
        discard(ctx, CLASS, name).await;
        return Err(io_error(name)(e));
    }

    if let Some(entry) = ctx.registry.get_mut(CLASS, name) {
        entry.listening = true;
    }
    debug!("Monitoring {}", name);
    Ok(Outcome::Applied)
}

/// Turn a delivered sample into an outbound event.
pub fn on_sample(ctx: &HandlerContext<'_>, handle: HandleId, value: f64) -> Option<Message> {
    let Some(name) = ctx.registry.lookup_name(CLASS, handle) else {
        trace!("Sample on unknown handle {}", handle);
        return None;
    };
    Some(Message::temperature_event(name, value))
}
