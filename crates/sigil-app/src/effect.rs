//! Side effects requested by transitions.
//!
//! [`crate::App::handle`] never performs I/O. It returns [`Effect`]s that the
//! reactor executes against the [`crate::Driver`] before dequeuing the next
//! action.

use std::time::Duration;

use crate::{Address, DeliveryId};

/// Message kind on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    /// Direct message.
    Normal,
    /// Message to a room.
    GroupChat,
}

/// User-issued text handed to the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundMessage {
    /// Destination address.
    pub to: Address,
    /// Message text.
    pub body: String,
    /// Direct or room message.
    pub kind: MessageKind,
    /// Correlation id for the delivery receipt.
    pub id: DeliveryId,
}

/// Effects produced by transitions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Hand a message to the transport.
    Send(OutboundMessage),

    /// Close the transport.
    Disconnect,

    /// Reopen the transport now.
    Reconnect,

    /// Post [`crate::Action::Reconnect`] after a delay.
    ScheduleReconnect(Duration),

    /// Leave the reactor loop.
    Quit,
}
