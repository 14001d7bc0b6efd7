//! Application layer for Sigil
//!
//! Pure state model, layout engine and generic action reactor of a terminal
//! secure-messaging client. Nothing here touches the terminal or the
//! network; both sit behind the [`Driver`] seam so the same code runs under
//! tests and in production.
//!
//! # Components
//!
//! - [`App`]: state machine (contact store plus view state)
//! - [`layout::render`]: pure function from state to a terminal image
//! - [`Reactor`]: single-consumer loop applying [`Action`]s from a mailbox
//! - [`Driver`]: trait for platform-specific rendering and transport I/O

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod action;
mod address;
mod app;
mod config;
mod contact;
mod driver;
mod effect;
mod error;
pub mod format;
pub mod layout;
mod mailbox;
mod message;
mod runtime;
mod view;

pub use action::Action;
pub use address::Address;
pub use app::App;
pub use config::Config;
pub use contact::{
    Availability, Channel, ColorTag, ContactStore, Conversation, ConversationKind, Fingerprint,
    Member, Presence, Session, TrustStore, Verification,
};
pub use driver::Driver;
pub use effect::{Effect, MessageKind, OutboundMessage};
pub use error::ActionError;
pub use format::{Line, Span, Style};
pub use mailbox::{Inbox, Mailbox, mailbox};
pub use message::{DeliveryId, Direction, Message};
pub use runtime::Reactor;
pub use view::{
    DisplayMode, InputLine, MAX_BUDDY_WIDTH, MAX_LOG_HEIGHT, MIN_BUDDY_WIDTH, Nav, ViewState,
};
