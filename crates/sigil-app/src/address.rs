//! Conversation addresses.
//!
//! An [`Address`] names a conversation by its bare address, optionally
//! narrowed to one resource: a session of a direct contact, or a member
//! nickname inside a room.

use std::fmt;

/// Bare address with an optional resource.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Address {
    /// Bare address (`alice@example.org`, `lounge@rooms.example.org`).
    pub bare: String,
    /// Resource or nickname. `None` for the bare address.
    pub resource: Option<String>,
}

impl Address {
    /// Address without a resource.
    pub fn bare(bare: impl Into<String>) -> Self {
        Self { bare: bare.into(), resource: None }
    }

    /// Address narrowed to a resource.
    pub fn full(bare: impl Into<String>, resource: impl Into<String>) -> Self {
        Self { bare: bare.into(), resource: Some(resource.into()) }
    }

    /// Parse `bare` or `bare/resource`. The first `/` separates the two;
    /// an empty resource is treated as absent.
    pub fn parse(s: &str) -> Self {
        match s.split_once('/') {
            Some((bare, resource)) if !resource.is_empty() => Self::full(bare, resource),
            Some((bare, _)) => Self::bare(bare),
            None => Self::bare(s),
        }
    }

    /// Same address with the resource stripped.
    pub fn bare_only(&self) -> Self {
        Self::bare(self.bare.clone())
    }

    /// Resource as a string slice.
    pub fn resource(&self) -> Option<&str> {
        self.resource.as_deref()
    }

    /// Whether this address has no resource.
    pub fn is_bare(&self) -> bool {
        self.resource.is_none()
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.resource {
            Some(resource) => write!(f, "{}/{resource}", self.bare),
            None => f.write_str(&self.bare),
        }
    }
}
