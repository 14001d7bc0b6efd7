//! Sigil terminal client entry point.
//!
//! # Usage
//!
//! ```bash
//! # Defaults: account me@sigil/term, logs to ./sigil.log
//! sigil
//!
//! # Custom account, UTC+2 timestamps, verbose logging
//! sigil --account alice@example.org/laptop --tz-offset-minutes 120 --log-level debug
//! ```

use std::{fs::File, path::PathBuf, sync::Mutex, time::Duration};

use chrono::FixedOffset;
use clap::Parser;
use sigil_app::{Address, App, Config, Reactor, mailbox};
use sigil_tui::{TerminalDriver, input, network::NetworkConfig};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Sigil terminal messaging client
#[derive(Parser, Debug)]
#[command(name = "sigil")]
#[command(about = "Terminal client for the sigil messaging runtime")]
#[command(version)]
struct Args {
    /// Own account address (bare/resource)
    #[arg(short, long, default_value = "me@sigil/term")]
    account: String,

    /// Timezone offset for timestamps, in minutes east of UTC
    #[arg(long, default_value = "0", allow_negative_numbers = true)]
    tz_offset_minutes: i32,

    /// Initial buddy pane width
    #[arg(long, default_value = "20")]
    buddy_width: u16,

    /// Initial log pane height
    #[arg(long, default_value = "4")]
    log_height: u16,

    /// List offline contacts on startup
    #[arg(long)]
    show_offline: bool,

    /// Seconds between a link failure and the reconnect attempt
    #[arg(long, default_value = "5")]
    reconnect_secs: u64,

    /// Probability per presence tick that the simulated link drops
    #[arg(long, default_value = "0.0")]
    failure_rate: f64,

    /// Log file; the terminal is owned by the UI
    #[arg(long, default_value = "sigil.log")]
    log_file: PathBuf,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));
    let log_file = File::create(&args.log_file)?;
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(Mutex::new(log_file)).with_ansi(false))
        .with(filter)
        .init();

    let tz_offset = FixedOffset::east_opt(args.tz_offset_minutes.saturating_mul(60))
        .ok_or("timezone offset out of range")?;
    let config = Config {
        account: Address::parse(&args.account),
        tz_offset,
        buddy_width: args.buddy_width,
        log_height: args.log_height,
        show_offline: args.show_offline,
        reconnect_backoff: Duration::from_secs(args.reconnect_secs),
    };
    tracing::info!(account = %config.account, "sigil starting");

    let (tx, rx) = mailbox();
    let network = NetworkConfig {
        account: config.account.clone(),
        failure_rate: args.failure_rate.clamp(0.0, 1.0),
    };
    let driver = TerminalDriver::new(tx.clone(), network)?;
    let reader = input::spawn_reader(tx.clone());

    let result = Reactor::new(driver, App::new(config), rx, tx).run().await;
    reader.abort();

    Ok(result?)
}
