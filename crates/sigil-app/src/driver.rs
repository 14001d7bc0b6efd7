//! Driver trait for abstracting I/O operations.
//!
//! The [`Driver`] trait decouples the reactor from the terminal and the
//! transport. The TUI implements it with crossterm, ratatui and a network
//! task; tests implement it with recording fakes. All orchestration stays in
//! the generic [`crate::Reactor`].

use std::future::Future;

use chrono::{DateTime, Utc};

use crate::{App, OutboundMessage};

/// Abstracts the I/O the reactor performs between actions.
pub trait Driver: Send {
    /// Platform-specific error type.
    type Error: std::error::Error + Send + 'static;

    /// Current wall-clock time. Injected so tests control timestamps.
    fn now(&self) -> DateTime<Utc>;

    /// Publish an image of the application state.
    ///
    /// # Errors
    ///
    /// Returns an error if the terminal can no longer be drawn to. This is
    /// the only error that stops the reactor.
    fn render(&mut self, app: &App) -> Result<(), Self::Error>;

    /// Hand an outgoing message to the transport.
    ///
    /// # Errors
    ///
    /// Returns an error if the transport rejected or could not take the
    /// message.
    fn send(
        &mut self,
        message: OutboundMessage,
    ) -> impl Future<Output = Result<(), Self::Error>> + Send;

    /// Close the transport. Idempotent.
    fn disconnect(&mut self) -> impl Future<Output = ()> + Send;

    /// Reopen the transport.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection cannot be established.
    fn reconnect(&mut self) -> impl Future<Output = Result<(), Self::Error>> + Send;

    /// Release resources when the reactor exits.
    fn stop(&mut self);
}
