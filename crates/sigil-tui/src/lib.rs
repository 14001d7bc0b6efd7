//! Terminal UI for Sigil
//!
//! A thin shell over [`sigil_app::Driver`] that provides terminal-specific
//! I/O. All orchestration logic lives in the generic [`sigil_app::Reactor`].
//!
//! This crate only handles terminal rendering, keyboard input and the
//! simulated network link.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod input;
pub mod network;
pub mod terminal;
pub mod ui;

pub use sigil_app::{Action, App, Config, Driver, Reactor};
pub use terminal::{TerminalDriver, TerminalError};
