//! Terminal simulator for the peripheral bridge.
//!
//! Runs a bridge on mock hardware and an in-memory broker. Each stdin line
//! is either a JSON payload delivered on the board's inbound topic or a
//! `!` directive that drives the simulated hardware:
//!
//! ```text
//! {"peripheral":"GPIO","action":"REGISTER","name":"BCM4","direction":"IN","property":"PIN_STATE","value":"LOW"}
//! !edge BCM4 HIGH
//! !sample TEMP_1 22.5
//! !background | !foreground | !reconnect | !status
//! !release GPIO BCM4
//! !quit
//! ```
//!
//! Outbound events are printed to stdout as `<topic> <payload>`.
//!
//! `--replay FILE` first applies a captured controller session, one JSON
//! payload per line, before reading stdin.

mod directive;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use futures::StreamExt;
use pinbridge_bridge::{Bridge, BridgeConfig};
use pinbridge_core::BoardId;
use pinbridge_hardware::mock::{MockGpio, MockPwm, MockSensor};
use pinbridge_hardware::{
    AnyAnalogSensorPort, AnyDigitalLinePort, AnyPulseOutputPort, MockPeripherals, Peripherals,
};
use pinbridge_network::MemoryTransport;
use pinbridge_protocol::WireCodec;
use tokio_util::codec::{FramedRead, LinesCodec};
use tracing::{error, info, warn};

use crate::directive::Directive;

#[derive(Parser)]
#[command(name = "pinbridge-sim")]
#[command(about = "Drive a peripheral bridge from the terminal", long_about = None)]
#[command(version)]
struct Cli {
    /// JSON configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Board identifier (overrides the configuration file)
    #[arg(short, long)]
    board: Option<String>,

    /// Pause after each publication, in milliseconds
    #[arg(long)]
    quiescence_ms: Option<u64>,

    /// Digital lines the mock exposes; any name is accepted when empty
    #[arg(long, value_delimiter = ',')]
    lines: Vec<String>,

    /// Pulse outputs the mock exposes; any name is accepted when empty
    #[arg(long, value_delimiter = ',')]
    outputs: Vec<String>,

    /// Sensors the mock exposes; any name is accepted when empty
    #[arg(long, value_delimiter = ',')]
    sensors: Vec<String>,

    /// Captured payloads to apply before reading stdin, one per line
    #[arg(long)]
    replay: Option<PathBuf>,
}

impl Cli {
    fn bridge_config(&self) -> Result<BridgeConfig> {
        let mut config = match &self.config {
            Some(path) => {
                let json = std::fs::read_to_string(path)
                    .with_context(|| format!("reading {}", path.display()))?;
                BridgeConfig::from_json_str(&json)
                    .with_context(|| format!("parsing {}", path.display()))?
            }
            None => BridgeConfig::default(),
        };

        if let Some(board) = &self.board {
            config.board_id = BoardId::new(board.as_str())?;
        }
        if let Some(ms) = self.quiescence_ms {
            config.quiescence_ms = ms;
        }
        config.validate()?;
        Ok(config)
    }

    fn peripherals(&self) -> (Peripherals, MockPeripherals) {
        let (gpio, gpio_handle) = if self.lines.is_empty() {
            MockGpio::new()
        } else {
            MockGpio::with_lines(self.lines.clone())
        };
        let (pwm, pwm_handle) = if self.outputs.is_empty() {
            MockPwm::new()
        } else {
            MockPwm::with_outputs(self.outputs.clone())
        };
        let (sensor, sensor_handle) = if self.sensors.is_empty() {
            MockSensor::new()
        } else {
            MockSensor::with_sensors(self.sensors.clone())
        };

        (
            Peripherals::new(
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
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let config = cli.bridge_config()?;
    let (peripherals, mocks) = cli.peripherals();
    let (transport, broker) = MemoryTransport::new();

    let mut feed = broker.feed();
    tokio::spawn(async move {
        while let Some(publication) = feed.recv().await {
            println!(
                "{} {}",
                publication.topic,
                String::from_utf8_lossy(&publication.payload)
            );
        }
    });

    let bridge = Bridge::start(config, transport, peripherals).await?;
    if let Some(path) = &cli.replay {
        let applied = replay(&bridge, path).await?;
        info!("Replayed {} payloads from {}", applied, path.display());
    }

    let inbound = bridge.topics().inbound().to_string();
    info!("Reading payloads for {} from stdin", inbound);

    let mut stdin = FramedRead::new(tokio::io::stdin(), LinesCodec::new());
    while let Some(line) = stdin.next().await {
        let line = line.context("reading stdin")?;
        if line.trim().is_empty() {
            continue;
        }

        match directive::parse(&line) {
            Ok(Some(Directive::Quit)) => break,
            Ok(Some(directive)) => run_directive(&bridge, &mocks, directive).await,
            Ok(None) => {
                if let Ok(Some(outcome)) = bridge.on_delivery(&inbound, line.as_bytes()).await {
                    info!("{:?}", outcome);
                }
            }
            Err(e) => warn!("{:#}", e),
        }
    }

    let released = bridge.stop().await;
    info!("Released {} peripherals", released);
    Ok(())
}

/// Apply every payload in `path`. Handler failures are logged by the bridge
/// and skipped; a malformed line ends the replay.
async fn replay(bridge: &Bridge<MemoryTransport>, path: &Path) -> Result<usize> {
    let file = tokio::fs::File::open(path)
        .await
        .with_context(|| format!("opening {}", path.display()))?;
    let mut payloads = FramedRead::new(file, WireCodec::new());

    let mut applied = 0;
    while let Some(message) = payloads.next().await {
        let message = message.with_context(|| format!("replaying {}", path.display()))?;
        if bridge.apply(&message).await.is_ok() {
            applied += 1;
        }
    }
    Ok(applied)
}

async fn run_directive(
    bridge: &Bridge<MemoryTransport>,
    mocks: &MockPeripherals,
    directive: Directive,
) {
    match directive {
        Directive::Edge { name, level } => {
            if !mocks.gpio.trigger_edge(&name, level) {
                info!("No edge raised on {}", name);
            }
        }
        Directive::Sample { name, value } => {
            if !mocks.sensor.emit_sample(&name, value) {
                info!("{} is not monitored; next read returns {}", name, value);
            }
        }
        Directive::Foreground => {
            let attached = bridge.on_foreground().await;
            info!("Foreground, {} listeners attached", attached);
        }
        Directive::Background => {
            let detached = bridge.on_background().await;
            info!("Background, {} listeners detached", detached);
        }
        Directive::Reconnect => {
            if let Err(e) = bridge.on_reconnect().await {
                error!("Reconnect failed: {}", e);
            }
        }
        Directive::Release { class, name } => match bridge.release(class, &name).await {
            Ok(true) => info!("Released {} {}", class, name),
            Ok(false) => info!("{} {} is not open", class, name),
            Err(e) => error!("Release failed: {}", e),
        },
        Directive::Status => match serde_json::to_string_pretty(&bridge.snapshot().await) {
            Ok(json) => println!("{json}"),
            Err(e) => error!("Failed to render status: {}", e),
        },
        Directive::Quit => {}
    }
}
