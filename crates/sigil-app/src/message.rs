//! History entries.

use std::fmt;

use chrono::{DateTime, Utc};

use crate::Address;

/// Identifier correlating an outbound message with its delivery receipt.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DeliveryId(pub String);

impl fmt::Display for DeliveryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Who a history entry came from or went to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Direction {
    /// Received from the originating address.
    From(Address),
    /// Sent by us.
    To {
        /// Destination address.
        to: Address,
        /// Delivery correlation id.
        id: DeliveryId,
    },
    /// Produced locally (warnings, lifecycle notices).
    Local {
        /// Conversation the entry is addressed to.
        addressee: Address,
        /// Optional label shown in the marker.
        label: Option<String>,
    },
}

impl Direction {
    /// Resource implied by the direction's address.
    pub fn resource(&self) -> Option<&str> {
        match self {
            Self::From(addr) | Self::To { to: addr, .. } | Self::Local { addressee: addr, .. } => {
                addr.resource()
            },
        }
    }
}

/// One history entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    /// Origin or destination.
    pub direction: Direction,
    /// When the entry was produced or received.
    pub timestamp: DateTime<Utc>,
    /// Carried over an established encrypted channel.
    pub encrypted: bool,
    /// For outbound entries: the receipt arrived. Inbound and local entries
    /// are created received.
    pub received: bool,
    /// Message text.
    pub body: String,
}

impl Message {
    /// Local entry addressed to `addressee`.
    pub fn local(
        addressee: Address,
        label: Option<String>,
        body: impl Into<String>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            direction: Direction::Local { addressee, label },
            timestamp,
            encrypted: false,
            received: true,
            body: body.into(),
        }
    }

    /// Whether this entry is a local notice.
    pub fn is_local(&self) -> bool {
        matches!(self.direction, Direction::Local { .. })
    }
}
