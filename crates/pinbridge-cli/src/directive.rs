//! Simulator directives.
//!
//! Lines starting with `!` drive the simulated hardware or the bridge
//! lifecycle instead of being delivered as payloads.

use anyhow::{Context, Result, bail};
use pinbridge_core::{PeripheralClass, PinLevel};

#[derive(Debug, Clone, PartialEq)]
pub enum Directive {
    /// Change the level seen on an input line.
    Edge { name: String, level: PinLevel },
    /// Deliver a sample from a sensor.
    Sample { name: String, value: f64 },
    Foreground,
    Background,
    Reconnect,
    Release { class: PeripheralClass, name: String },
    Status,
    Quit,
}

/// Parse a line as a directive.
///
/// Returns `Ok(None)` for lines that are not directives.
pub fn parse(line: &str) -> Result<Option<Directive>> {
    let Some(rest) = line.trim().strip_prefix('!') else {
        return Ok(None);
    };
    let words: Vec<&str> = rest.split_whitespace().collect();

    let directive = match words.as_slice() {
        ["edge", name, level] => Directive::Edge {
            name: name.to_string(),
            level: level.to_ascii_uppercase().parse()?,
        },
        ["sample", name, value] => Directive::Sample {
            name: name.to_string(),
            value: value
                .parse()
                .with_context(|| format!("invalid sample value {value:?}"))?,
        },
        ["foreground"] => Directive::Foreground,
        ["background"] => Directive::Background,
        ["reconnect"] => Directive::Reconnect,
        ["release", class, name] => Directive::Release {
            class: class.to_ascii_uppercase().parse()?,
            name: name.to_string(),
        },
        ["status"] => Directive::Status,
        ["quit"] | ["exit"] => Directive::Quit,
        _ => bail!("unknown directive: !{}", rest.trim()),
    };
    Ok(Some(directive))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("!edge BCM4 high", Directive::Edge { name: "BCM4".into(), level: PinLevel::High })]
    #[case("  !edge BCM4 LOW", Directive::Edge { name: "BCM4".into(), level: PinLevel::Low })]
    #[case("!sample TEMP_1 21.75", Directive::Sample { name: "TEMP_1".into(), value: 21.75 })]
    #[case("!release temperature_sensor TEMP_1", Directive::Release {
        class: PeripheralClass::AnalogSensor,
        name: "TEMP_1".into(),
    })]
    #[case("!background", Directive::Background)]
    #[case("!exit", Directive::Quit)]
    fn test_parse_directive(#[case] line: &str, #[case] expected: Directive) {
        assert_eq!(parse(line).unwrap(), Some(expected));
    }

    #[rstest]
    #[case("!edge BCM4")]
    #[case("!edge BCM4 UP")]
    #[case("!sample TEMP_1 warm")]
    #[case("!release SERVO S1")]
    #[case("!dance")]
    fn test_parse_rejects(#[case] line: &str) {
        assert!(parse(line).is_err());
    }

    #[test]
    fn test_payloads_are_not_directives() {
        assert_eq!(parse(r#"{"peripheral":"GPIO"}"#).unwrap(), None);
    }
}
