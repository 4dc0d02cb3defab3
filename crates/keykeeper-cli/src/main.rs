//! Keykeeper controller binary.
//!
//! # Usage
//!
//! ```bash
//! # Production: validate the central, publish unlocks to the local broker
//! keykeeper --host localhost --topic Things/Door
//!
//! # Commissioning: watch the console without opening the door
//! keykeeper --test --verbose
//! ```
//!
//! Console lines go to stdout, logs to stderr. Exit status is 0 after
//! Ctrl-C or SIGTERM and 1 on any fatal error.

use clap::Parser;
use keykeeper_central::{CentralConfig, Supervisor};
use keykeeper_core::QosLevel;
use keykeeper_core::constants::{
    DEFAULT_BAUD_RATE, DEFAULT_CENTRAL_FILE, DEFAULT_COINS_FILE, DEFAULT_DEVICE_PATH,
    DEFAULT_MQTT_HOST, DEFAULT_MQTT_PORT, DEFAULT_MQTT_QOS, DEFAULT_MQTT_TOPIC, DEFAULT_NAMES_FILE,
    DEFAULT_RECONNECT_BACKOFF_SECS,
};
use keykeeper_hardware::{SerialConfig, SerialConnector};
use keykeeper_network::{AnyNotifier, MqttConfig};
use keykeeper_storage::{CoinDatabase, StoreConfig};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// BLE keykeeper door controller
#[derive(Parser, Debug)]
#[command(name = "keykeeper")]
#[command(about = "Drives a BLE keykeeper central and publishes door unlocks over MQTT")]
#[command(version)]
struct Args {
    /// Do not check the central against the local roster
    #[arg(long)]
    skip_validation: bool,

    /// Debug logging
    #[arg(short, long)]
    verbose: bool,

    /// Do not echo console lines to stdout
    #[arg(short, long)]
    quiet: bool,

    /// MQTT topic to publish to
    #[arg(long, default_value = DEFAULT_MQTT_TOPIC)]
    topic: String,

    /// MQTT broker host
    #[arg(long, default_value = DEFAULT_MQTT_HOST)]
    host: String,

    /// MQTT broker port
    #[arg(long, default_value_t = DEFAULT_MQTT_PORT)]
    port: u16,

    /// MQTT QoS level
    #[arg(long, default_value_t = DEFAULT_MQTT_QOS, value_parser = clap::value_parser!(u8).range(0..=2))]
    qos: u8,

    /// MQTT message payload
    #[arg(long, default_value = "open")]
    msg: String,

    /// Log unlocks instead of publishing them
    #[arg(long)]
    test: bool,

    /// Serial device of the central
    #[arg(long, default_value = DEFAULT_DEVICE_PATH)]
    device: PathBuf,

    /// Serial baud rate
    #[arg(long, default_value_t = DEFAULT_BAUD_RATE)]
    baud: u32,

    /// Seconds to wait before reconnecting after a fault
    #[arg(long, default_value_t = DEFAULT_RECONNECT_BACKOFF_SECS)]
    backoff_secs: u64,

    /// Coin roster
    #[arg(long, default_value = DEFAULT_COINS_FILE)]
    coins: PathBuf,

    /// Central identity
    #[arg(long, default_value = DEFAULT_CENTRAL_FILE)]
    central: PathBuf,

    /// Coin display names
    #[arg(long, default_value = DEFAULT_NAMES_FILE)]
    names: PathBuf,
}

impl Args {
    fn store_config(&self) -> StoreConfig {
        StoreConfig::default()
            .coins_path(&self.coins)
            .central_path(&self.central)
            .names_path(&self.names)
    }

    fn serial_config(&self) -> SerialConfig {
        SerialConfig::new(&self.device).with_baud_rate(self.baud)
    }

    fn mqtt_config(&self) -> Result<MqttConfig, keykeeper_core::Error> {
        Ok(MqttConfig::default()
            .broker(&self.host, self.port)
            .topic(&self.topic)
            .qos(QosLevel::from_u8(self.qos)?)
            .payload(self.msg.as_bytes()))
    }

    fn central_config(&self) -> CentralConfig {
        CentralConfig::default()
            .validate(!self.skip_validation)
            .reconnect_backoff(Duration::from_secs(self.backoff_secs))
            .echo_lines(!self.quiet)
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    let default_level = if args.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "Keykeeper stopped");
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> Result<(), Box<dyn std::error::Error>> {
    info!(version = keykeeper_core::VERSION, "Keykeeper starting");

    let database = CoinDatabase::load(&args.store_config())?;
    let notifier = AnyNotifier::from_config(args.mqtt_config()?, args.test);
    if notifier.is_dry_run() {
        warn!("Test mode, unlocks will not be published");
    }

    let mut supervisor = Supervisor::new(
        SerialConnector::new(args.serial_config()),
        notifier,
        database,
        args.central_config(),
    )?;

    let shutdown = CancellationToken::new();
    tokio::spawn(forward_signals(shutdown.clone()));

    supervisor.run(shutdown).await?;
    Ok(())
}

/// Cancel `shutdown` on Ctrl-C or SIGTERM.
async fn forward_signals(shutdown: CancellationToken) {
    let ctrl_c = tokio::signal::ctrl_c();

    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut terminate) => {
                tokio::select! {
                    _ = ctrl_c => {}
                    _ = terminate.recv() => {}
                }
            }
            Err(e) => {
                warn!(error = %e, "Cannot listen for SIGTERM");
                let _ = ctrl_c.await;
            }
        }
    }

    #[cfg(not(unix))]
    let _ = ctrl_c.await;

    info!("Shutdown requested");
    shutdown.cancel();
}
