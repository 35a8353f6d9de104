//! Digital line handling.
//!
//! Lines move through `unregistered → open(direction) → watching` (inputs
//! only). Inputs are configured active-high with both edges triggering, and
//! keep their edge listener for as long as the bridge is in the foreground.
//! Events only ever drive outputs.

use pinbridge_core::{Direction, Error, PeripheralClass, PinLevel, Property, Result};
use pinbridge_hardware::traits::{DigitalLinePort, PeripheralPort};
use pinbridge_hardware::{ActiveType, EdgeTrigger, HandleId, LineDirection, Peripherals};
use pinbridge_protocol::Message;
use tracing::{debug, trace, warn};

use super::{HandlerContext, Outcome, discard, io_error};

const CLASS: PeripheralClass = PeripheralClass::DigitalLine;

fn level_of(message: &Message) -> Result<PinLevel> {
    match (message.property, message.value.as_level()) {
        (Property::PinState, Some(level)) => Ok(level),
        (Property::PinState, None) => Err(Error::invalid_parameter(
            Property::PinState,
            format!("expected HIGH or LOW, got {}", message.value),
        )),
        (other, _) => Err(Error::invalid_parameter(
            other,
            "digital lines only accept PIN_STATE",
        )),
    }
}

fn output_direction(level: PinLevel) -> LineDirection {
    if level.is_high() {
        LineDirection::OutputInitiallyHigh
    } else {
        LineDirection::OutputInitiallyLow
    }
}

fn direction_of(message: &Message) -> Result<Direction> {
    message
        .direction
        .ok_or_else(|| Error::malformed("Missing required field: direction"))
}

/// Declare a line's direction and initial level.
pub async fn register(ctx: &mut HandlerContext<'_>, message: &Message) -> Result<Outcome> {
    match direction_of(message)? {
        Direction::In => register_input(ctx, message).await,
        Direction::Out => register_output(ctx, message).await,
    }
}

async fn register_input(ctx: &mut HandlerContext<'_>, message: &Message) -> Result<Outcome> {
    let name = message.name.as_str();
    let level = level_of(message)?;
    let lease = ctx
        .registry
        .open_or_reuse(ctx.peripherals, CLASS, name, Some(Direction::In))
        .await?;

    let mut setup = Ok(());
    if lease.fresh {
        setup = configure_input(ctx.peripherals, name, lease.handle).await;
    }
    if setup.is_ok() && ctx.foreground {
        setup = attach(ctx, name).await.map(|_| ());
    }
    if let Err(e) = setup {
        if lease.fresh {
            discard(ctx, CLASS, name).await;
        }
        return Err(e);
    }

    // Inputs are never driven; the declared level is only the last known one.
    if let Some(entry) = ctx.registry.get_mut(CLASS, name) {
        entry.level = Some(level);
    }
    debug!("Registered {} as input", name);
    Ok(Outcome::Applied)
}

async fn register_output(ctx: &mut HandlerContext<'_>, message: &Message) -> Result<Outcome> {
    let name = message.name.as_str();
    let level = level_of(message)?;
    let lease = ctx
        .registry
        .open_or_reuse(ctx.peripherals, CLASS, name, Some(Direction::Out))
        .await?;

    let gpio = &ctx.peripherals.gpio;
    drive(ctx, name, lease.handle, lease.fresh, level).await?;
    debug!("Registered {} as output, {}", name, level);
    Ok(Outcome::Applied)
}

/// Drive an output line.
///
/// Lines registered as inputs are left untouched. A line that was never
/// registered is opened as an output when the message says so.
pub async fn event(ctx: &mut HandlerContext<'_>, message: &Message) -> Result<Outcome> {
    let name = message.name.as_str();
    let registered = ctx.registry.get(CLASS, name).and_then(|entry| entry.direction);

    match registered.or(message.direction) {
        Some(Direction::Out) => {}
        Some(Direction::In) => {
            debug!("Ignoring event for input line {}", name);
            return Ok(Outcome::Ignored {
                reason: "events only drive output lines",
            });
        }
        None => return Err(Error::malformed("Missing required field: direction")),
    }

    let level = level_of(message)?;
    let lease = ctx
        .registry
        .open_or_reuse(ctx.peripherals, CLASS, name, Some(Direction::Out))
        .await?;

    drive(ctx, name, lease.handle, lease.fresh, level).await?;
    debug!("Set {} {}", name, level);
    Ok(Outcome::Applied)
}

/// Turn an edge notice into an outbound event.
///
/// Reads the current level rather than trusting the edge direction, so a
/// burst of edges always reports the settled state. Notices for handles
/// that are no longer watched are dropped.
pub async fn on_edge(ctx: &mut HandlerContext<'_>, handle: HandleId) -> Result<Option<Message>> {
    let Some(entry) = ctx
        .registry
        .lookup_name(CLASS, handle)
        .and_then(|name| ctx.registry.get(CLASS, name))
    else {
        trace!("Edge on unknown handle {}", handle);
        return Ok(None);
    };
    if !entry.listening {
        trace!("Edge on unwatched line {}", entry.name);
        return Ok(None);
    }
    let name = entry.name.clone();

    let level = ctx
        .peripherals
        .gpio
        .read_level(handle)
        .await
        .map_err(io_error(&name))?;
    if let Some(entry) = ctx.registry.get_mut(CLASS, &name) {
        entry.level = Some(level);
    }

    debug!("Edge on {}: {}", name, level);
    Ok(Some(Message::pin_state_event(name, level)))
}

/// Attach edge listeners to every input line that lacks one.
///
/// Failures are logged per line. Returns how many were attached.
pub async fn attach_listeners(ctx: &mut HandlerContext<'_>) -> usize {
    let pending: Vec<String> = ctx
        .registry
        .entries()
        .filter(|entry| {
            entry.class == CLASS && entry.direction == Some(Direction::In) && !entry.listening
        })
        .map(|entry| entry.name.clone())
        .collect();

    let mut attached = 0;
    for name in pending {
        match attach(ctx, &name).await {
            Ok(true) => attached += 1,
            Ok(false) => {}
            Err(e) => warn!("Failed to watch {}: {}", name, e),
        }
    }
    attached
}

/// Detach every edge listener. Returns how many were detached.
pub async fn detach_listeners(ctx: &mut HandlerContext<'_>) -> usize {
    let gpio = &ctx.peripherals.gpio;
    let mut detached = 0;
    for entry in ctx.registry.entries_mut(CLASS) {
        if entry.listening {
            gpio.detach_listener(entry.handle).await;
            entry.listening = false;
            detached += 1;
        }
    }
    detached
}

async fn attach(ctx: &mut HandlerContext<'_>, name: &str) -> Result<bool> {
    let Some(entry) = ctx.registry.get_mut(CLASS, name) else {
        return Ok(false);
    };
    if entry.listening || entry.direction != Some(Direction::In) {
        return Ok(false);
    }

    ctx.peripherals
        .gpio
        .attach_edge_listener(entry.handle, ctx.notices.clone())
        .await
        .map_err(io_error(name))?;
    entry.listening = true;
    Ok(true)
}

/// A freshly opened output starts at `level`; an open one is set to it.
async fn drive(
    ctx: &mut HandlerContext<'_>,
    name: &str,
    handle: HandleId,
    fresh: bool,
    level: PinLevel,
) -> Result<()> {
    let gpio = &ctx.peripherals.gpio;
    if fresh {
        if let Err(e) = gpio.set_direction(handle, output_direction(level)).await {
            discard(ctx, CLASS, name).await;
            return Err(io_error(name)(e));
        }
    } else {
        gpio.set_level(handle, level)
            .await
            .map_err(io_error(name))?;
    }

    if let Some(entry) = ctx.registry.get_mut(CLASS, name) {
        entry.level = Some(level);
    }
    Ok(())
}

async fn configure_input(peripherals: &Peripherals, name: &str, handle: HandleId) -> Result<()> {
    let gpio = &peripherals.gpio;
    gpio.set_direction(handle, LineDirection::Input)
        .await
        .map_err(io_error(name))?;
    gpio.set_active_type(handle, ActiveType::ActiveHigh)
        .await
        .map_err(io_error(name))?;
    gpio.set_edge_trigger(handle, EdgeTrigger::Both)
        .await
        .map_err(io_error(name))?;
    Ok(())
}
