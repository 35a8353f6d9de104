//! Routing of decoded messages to class handlers.
//!
//! Routing is a pure function of `(class, action)`. Pairs without a route
//! are logged and ignored rather than rejected, so a newer controller can
//! send actions this bridge does not know yet.

use pinbridge_core::{Action, PeripheralClass, Result};
use pinbridge_protocol::Message;
use tracing::warn;

use crate::handlers::{HandlerContext, Outcome, analog, digital, pulse};

/// Handler selected for a `(class, action)` pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    RegisterLine,
    DriveLine,
    ArmPulse,
    UpdatePulse,
    ReadSensor,
    MonitorSensor,
}

/// Look up the handler for a `(class, action)` pair.
///
/// ```
/// use pinbridge_bridge::dispatcher::{Route, route};
/// use pinbridge_core::{Action, PeripheralClass};
///
/// assert_eq!(
///     route(PeripheralClass::DigitalLine, Action::Event),
///     Some(Route::DriveLine)
/// );
/// assert_eq!(route(PeripheralClass::AnalogSensor, Action::Event), None);
/// ```
pub fn route(class: PeripheralClass, action: Action) -> Option<Route> {
    match (class, action) {
        (PeripheralClass::DigitalLine, Action::Register) => Some(Route::RegisterLine),
        (PeripheralClass::DigitalLine, Action::Event) => Some(Route::DriveLine),
        (PeripheralClass::DigitalLine, Action::Monitor) => None,
        (PeripheralClass::PulseOutput, Action::Register) => Some(Route::ArmPulse),
        (PeripheralClass::PulseOutput, Action::Event) => Some(Route::UpdatePulse),
        (PeripheralClass::PulseOutput, Action::Monitor) => None,
        (PeripheralClass::AnalogSensor, Action::Register) => Some(Route::ReadSensor),
        (PeripheralClass::AnalogSensor, Action::Event) => None,
        (PeripheralClass::AnalogSensor, Action::Monitor) => Some(Route::MonitorSensor),
    }
}

/// Apply `message` to hardware.
///
/// # Errors
///
/// Whatever the selected handler reports. Unrouted pairs are not errors.
pub async fn dispatch(ctx: &mut HandlerContext<'_>, message: &Message) -> Result<Outcome> {
    let Some(route) = route(message.class, message.action) else {
        warn!(
            "No handler for {} {} on {}",
            message.class, message.action, message.name
        );
        return Ok(Outcome::Ignored {
            reason: "unsupported action for this peripheral class",
        });
    };

    match route {
        Route::RegisterLine => digital::register(ctx, message).await,
        Route::DriveLine => digital::event(ctx, message).await,
        Route::ArmPulse => pulse::register(ctx, message).await,
        Route::UpdatePulse => pulse::event(ctx, message).await,
        Route::ReadSensor => analog::register(ctx, message).await,
        Route::MonitorSensor => analog::monitor(ctx, message).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pinbridge_core::{Direction, PinLevel, Property, Value};
    use pinbridge_hardware::{NoticeSender, Oversampling, PeripheralRegistry, Peripherals};
    use rstest::rstest;

    #[test]
    fn test_every_pair_is_decided() {
        let routed = PeripheralClass::ALL
            .iter()
            .flat_map(|&class| Action::ALL.iter().map(move |&action| (class, action)))
            .filter(|&(class, action)| route(class, action).is_some())
            .count();
        assert_eq!(routed, 6);
    }

    #[rstest]
    #[case::line_monitor(PeripheralClass::DigitalLine, Action::Monitor)]
    #[case::pulse_monitor(PeripheralClass::PulseOutput, Action::Monitor)]
    #[case::sensor_event(PeripheralClass::AnalogSensor, Action::Event)]
    #[tokio::test]
    async fn test_unrouted_pairs_touch_nothing(
        #[case] class: PeripheralClass,
        #[case] action: Action,
    ) {
        let (peripherals, mocks) = Peripherals::mock();
        let (notices, _rx) = NoticeSender::channel(1);
        let mut registry = PeripheralRegistry::new();
        let mut ctx = HandlerContext {
            registry: &mut registry,
            peripherals: &peripherals,
            notices: &notices,
            foreground: true,
            oversampling: Oversampling::X1,
        };
        let message = Message::new(
            class,
            action,
            "X1",
            Some(Direction::In),
            Property::PinState,
            Value::Level(PinLevel::High),
        );

        let outcome = dispatch(&mut ctx, &message).await.unwrap();

        assert!(matches!(outcome, Outcome::Ignored { .. }));
        assert_eq!(mocks.opens(), 0);
        assert!(registry.is_empty());
    }
}
