//! Action failures.
//!
//! An [`ActionError`] means the action was rejected before it changed any
//! state. The reactor turns it into a local history entry and carries on.

use thiserror::Error;

use crate::{Address, DeliveryId};

/// Reasons an action can be rejected.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ActionError {
    /// No conversation with this bare address.
    #[error("unknown conversation {0}")]
    UnknownConversation(String),

    /// Receipt for a message we have no record of.
    #[error("no pending message {id} for {bare}")]
    UnknownDelivery {
        /// Conversation the receipt named.
        bare: String,
        /// Delivery id the receipt carried.
        id: DeliveryId,
    },

    /// Session facts for an address that is not a live session of a direct
    /// contact.
    #[error("{0} is not a live session")]
    NotASession(Address),

    /// The own-account conversation cannot be removed.
    #[error("cannot remove own account {0}")]
    SelfRemoval(String),

    /// Outgoing text with no conversation to send it to.
    #[error("no conversation selected")]
    NoRecipient,
}

impl ActionError {
    /// Conversation the failure should be reported in. `None` reports it in
    /// the self-conversation.
    pub fn conversation(&self) -> Option<&str> {
        match self {
            Self::UnknownDelivery { bare, .. } => Some(bare),
            Self::NotASession(addr) => Some(&addr.bare),
            Self::UnknownConversation(_) | Self::SelfRemoval(_) | Self::NoRecipient => None,
        }
    }
}
