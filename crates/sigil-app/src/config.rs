//! Runtime configuration.

use std::time::Duration;

use chrono::{FixedOffset, Offset, Utc};

use crate::Address;

/// Configuration for the [`crate::App`] and [`crate::Reactor`].
///
/// Built by the binary from command-line arguments; every field has a
/// usable default.
#[derive(Debug, Clone)]
pub struct Config {
    /// Our own account address.
    pub account: Address,
    /// Timezone used for timestamps.
    pub tz_offset: FixedOffset,
    /// Initial buddy pane width.
    pub buddy_width: u16,
    /// Initial log pane height.
    pub log_height: u16,
    /// List offline contacts initially.
    pub show_offline: bool,
    /// Delay between a transport failure and the reconnect attempt.
    pub reconnect_backoff: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            account: Address::full("me@localhost", "sigil"),
            tz_offset: Utc.fix(),
            buddy_width: 20,
            log_height: 4,
            show_offline: false,
            reconnect_backoff: Duration::from_secs(5),
        }
    }
}
