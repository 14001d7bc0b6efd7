//! Mailbox actions.
//!
//! This module defines the [`Action`] enum: every state transition the
//! reactor can apply. Actions are produced by independent sources and only
//! ever applied by [`crate::Reactor`], one at a time:
//!
//! - the terminal reader (navigation, pane sizing, input line editing);
//! - the network reader (presence, messages, receipts, session facts);
//! - timers (scheduled reconnects).

use chrono::{DateTime, Utc};

use crate::{Address, ColorTag, DeliveryId, Fingerprint, Nav, Presence};

/// State transitions applied by the reactor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Move the active pointer through the visible conversation list.
    NavigateBuddyList(Nav),

    /// Scroll the message pane by one pane height.
    NavigateMessages(Nav),

    /// Show or hide offline contacts.
    ToggleShowOffline,

    /// Grow the log pane by one row, wrapping to zero.
    AdjustLogHeight,

    /// Grow the buddy pane by one column, wrapping to the minimum.
    AdjustBuddyWidth,

    /// Advance to the next display mode.
    CycleDisplayMode,

    /// Show or hide per-resource rows of the active conversation.
    ToggleExpand,

    /// Switch back to the previously active conversation.
    ToggleLastActive,

    /// Append a character to the input line.
    InsertChar(char),

    /// Delete the last character of the input line.
    Backspace,

    /// Send the input line to the active conversation.
    Submit,

    /// Re-render without changing state (terminal resize, clock tick).
    Redraw,

    /// Leave the reactor loop.
    Quit,

    /// Transport is up and authenticated.
    Connected,

    /// Contact pushed by the roster.
    ContactAdded {
        /// Bare address of the contact.
        address: Address,
        /// Display color tag.
        color: ColorTag,
    },

    /// Contact removed from the roster.
    ContactRemoved {
        /// Bare address of the contact.
        address: Address,
    },

    /// Joined a room.
    RoomJoined {
        /// Bare room address.
        room: Address,
        /// Our nickname.
        nick: String,
    },

    /// Left a room.
    RoomLeft {
        /// Bare room address.
        room: Address,
    },

    /// Presence change of a session, room member, or our own account.
    Presence {
        /// Full address of the session or member.
        address: Address,
        /// New presence.
        presence: Presence,
        /// Free-text status.
        status: String,
    },

    /// Encrypted channel established with a session.
    SessionEstablished {
        /// Full address of the session.
        address: Address,
        /// Remote fingerprint reported by the encryption engine.
        fingerprint: Fingerprint,
    },

    /// Encrypted channel with a session ended.
    SessionTornDown {
        /// Full address of the session.
        address: Address,
    },

    /// Message received.
    MessageReceived {
        /// Sender address, with resource or room nickname when known.
        address: Address,
        /// Message text.
        body: String,
        /// Arrived over an encrypted channel.
        encrypted: bool,
        /// Sender-side timestamp for delayed delivery. `None` means now.
        timestamp: Option<DateTime<Utc>>,
    },

    /// Remote side confirmed delivery.
    DeliveryReceipt {
        /// Address the receipt came from.
        address: Address,
        /// Delivery id of the confirmed message.
        id: DeliveryId,
    },

    /// Fingerprint marked trusted for a contact.
    Trust {
        /// Contact address.
        address: Address,
        /// Fingerprint to trust.
        fingerprint: Fingerprint,
    },

    /// Transport broke (authentication failure, connection reset).
    TransportFailure {
        /// Human-readable cause.
        reason: String,
    },

    /// Close the transport.
    Disconnect,

    /// Reopen the transport.
    Reconnect,
}
