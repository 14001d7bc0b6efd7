//! Terminal driver for the TUI.
//!
//! Implements the [`Driver`] trait using ratatui over crossterm for
//! rendering and the in-process simulated network for transport. Keyboard
//! input does not pass through the driver; it is a separate producer posting
//! to the mailbox (see [`crate::input`]).

use std::io::{self, Stdout, stdout};

use chrono::{DateTime, Utc};
use crossterm::{
    ExecutableCommand,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{Terminal, backend::CrosstermBackend};
use sigil_app::{App, Driver, Mailbox, OutboundMessage};
use thiserror::Error;

use crate::{
    network::{self, NetworkConfig, NetworkHandle},
    ui,
};

/// Terminal driver errors.
#[derive(Debug, Error)]
pub enum TerminalError {
    /// I/O error from terminal operations.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The network link is down.
    #[error("link closed")]
    LinkClosed,
}

/// Terminal driver implementing the [`Driver`] trait.
///
/// Owns the terminal (raw mode and alternate screen for its lifetime) and
/// the handle of the current network link.
pub struct TerminalDriver {
    terminal: Terminal<CrosstermBackend<Stdout>>,
    mailbox: Mailbox,
    network_config: NetworkConfig,
    network: Option<NetworkHandle>,
}

impl TerminalDriver {
    /// Take over the terminal and bring up the network link.
    ///
    /// Must be called from within a tokio runtime.
    pub fn new(mailbox: Mailbox, network_config: NetworkConfig) -> Result<Self, TerminalError> {
        enable_raw_mode()?;
        stdout().execute(EnterAlternateScreen)?;

        let backend = CrosstermBackend::new(stdout());
        let terminal = Terminal::new(backend)?;
        let network = Some(network::spawn(mailbox.clone(), network_config.clone()));

        Ok(Self { terminal, mailbox, network_config, network })
    }
}

impl Driver for TerminalDriver {
    type Error = TerminalError;

    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    fn render(&mut self, app: &App) -> Result<(), Self::Error> {
        let now = self.now();
        self.terminal.draw(|frame| ui::render(frame, app, now))?;
        Ok(())
    }

    async fn send(&mut self, message: OutboundMessage) -> Result<(), Self::Error> {
        let link = self.network.as_ref().ok_or(TerminalError::LinkClosed)?;
        link.outbound.send(message).await.map_err(|_| TerminalError::LinkClosed)
    }

    async fn disconnect(&mut self) {
        if let Some(link) = self.network.take() {
            link.stop();
        }
    }

    async fn reconnect(&mut self) -> Result<(), Self::Error> {
        if self.mailbox.is_closed() {
            return Err(TerminalError::LinkClosed);
        }
        self.disconnect().await;
        self.network = Some(network::spawn(self.mailbox.clone(), self.network_config.clone()));
        Ok(())
    }

    fn stop(&mut self) {
        if let Some(link) = self.network.take() {
            link.stop();
        }
    }
}

impl Drop for TerminalDriver {
    fn drop(&mut self) {
        self.stop();
        let _ = disable_raw_mode();
        let _ = stdout().execute(LeaveAlternateScreen);
    }
}
