//! Contact store.
//!
//! Holds every known conversation: direct contacts with their live sessions
//! and multi-party rooms with their members. Pure data plus accessors; the
//! only mutation path is [`crate::App::handle`].
//!
//! The first entry is always the self-conversation (our own account). It
//! collects local log entries and can never be removed, so the list of
//! visible conversations is never empty.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;

use crate::{Address, Message};

/// Availability of an online session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Availability {
    /// Do not disturb.
    DoNotDisturb,
    /// Away for an extended period.
    ExtendedAway,
    /// Away.
    Away,
    /// Online and available.
    Available,
    /// Eager to chat.
    Chat,
}

/// Presence of a session, member or our own account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Presence {
    /// Connected with the given availability.
    Online(Availability),
    /// Not connected.
    Offline,
}

impl Presence {
    /// Whether the presence is any online subtype.
    pub fn is_online(self) -> bool {
        matches!(self, Self::Online(_))
    }

    /// Ordering rank; higher is more reachable.
    fn rank(self) -> u8 {
        match self {
            Self::Offline => 0,
            Self::Online(Availability::DoNotDisturb) => 1,
            Self::Online(Availability::ExtendedAway) => 2,
            Self::Online(Availability::Away) => 3,
            Self::Online(Availability::Available) => 4,
            Self::Online(Availability::Chat) => 5,
        }
    }

    /// Single-column glyph used in the buddy list.
    pub fn glyph(self) -> char {
        match self {
            Self::Online(Availability::Available | Availability::Chat) => '+',
            Self::Online(Availability::Away | Availability::ExtendedAway) => '-',
            Self::Online(Availability::DoNotDisturb) => '!',
            Self::Offline => ' ',
        }
    }
}

impl fmt::Display for Presence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Online(Availability::Available) => "available",
            Self::Online(Availability::Chat) => "chatty",
            Self::Online(Availability::Away) => "away",
            Self::Online(Availability::ExtendedAway) => "extended away",
            Self::Online(Availability::DoNotDisturb) => "do not disturb",
            Self::Offline => "offline",
        })
    }
}

/// Remote key fingerprint as reported by the encryption engine.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Fingerprint(pub String);

/// Encrypted-channel facts for one session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Channel {
    /// A channel is currently established.
    pub established: bool,
    /// Remote fingerprint of the established channel.
    pub fingerprint: Option<Fingerprint>,
}

/// Trust classification of a session's fingerprint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verification {
    /// No encrypted channel.
    NoChannel,
    /// Channel established, fingerprint not in the trust store.
    UnverifiedFingerprint,
    /// Channel established with a trusted fingerprint.
    VerifiedFingerprint,
    /// Trusted fingerprints exist for the contact but this one is not among
    /// them.
    FingerprintMismatch,
}

/// Locally stored trusted fingerprints, per bare address.
#[derive(Debug, Clone, Default)]
pub struct TrustStore {
    trusted: HashMap<String, BTreeSet<Fingerprint>>,
}

impl TrustStore {
    /// Mark `fingerprint` as trusted for `bare`.
    pub fn trust(&mut self, bare: &str, fingerprint: Fingerprint) {
        self.trusted.entry(bare.to_string()).or_default().insert(fingerprint);
    }

    /// Classify a channel against the stored trust data.
    pub fn verify(&self, bare: &str, channel: &Channel) -> Verification {
        let Some(fingerprint) = channel.fingerprint.as_ref().filter(|_| channel.established) else {
            return Verification::NoChannel;
        };

        match self.trusted.get(bare) {
            Some(set) if set.contains(fingerprint) => Verification::VerifiedFingerprint,
            Some(set) if !set.is_empty() => Verification::FingerprintMismatch,
            _ => Verification::UnverifiedFingerprint,
        }
    }
}

/// One connected endpoint of a direct contact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    /// Resource identifier.
    pub resource: String,
    /// Session presence.
    pub presence: Presence,
    /// Free-text status.
    pub status: String,
    /// Encrypted-channel handle.
    pub channel: Channel,
}

/// One participant of a room.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Member {
    /// Nickname inside the room.
    pub nick: String,
    /// Member presence.
    pub presence: Presence,
    /// Free-text status.
    pub status: String,
}

/// Display color tag of a conversation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ColorTag {
    /// No particular emphasis.
    #[default]
    Default,
    /// Positive (e.g. trusted contact).
    Good,
    /// Negative (e.g. blocked or suspicious contact).
    Bad,
}

/// Kind-specific part of a conversation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConversationKind {
    /// Direct contact.
    User {
        /// Live sessions keyed by resource.
        sessions: BTreeMap<String, Session>,
    },
    /// Multi-party room.
    Room {
        /// Our nickname in the room.
        nick: String,
        /// Members keyed by nickname.
        members: BTreeMap<String, Member>,
    },
}

/// A direct contact or a room.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conversation {
    /// Bare address.
    pub bare: String,
    /// Display color tag.
    pub color: ColorTag,
    /// Per-resource rows are shown in the buddy list.
    pub expanded: bool,
    /// History survives the contact going fully offline.
    pub preserve_history: bool,
    /// History, oldest first.
    pub history: Vec<Message>,
    /// User or room specifics.
    pub kind: ConversationKind,
}

impl Conversation {
    /// New direct contact with no sessions.
    pub fn user(bare: impl Into<String>, color: ColorTag) -> Self {
        Self {
            bare: bare.into(),
            color,
            expanded: false,
            preserve_history: true,
            history: Vec::new(),
            kind: ConversationKind::User { sessions: BTreeMap::new() },
        }
    }

    /// New room joined under `nick`.
    pub fn room(bare: impl Into<String>, nick: impl Into<String>) -> Self {
        Self {
            bare: bare.into(),
            color: ColorTag::Default,
            expanded: false,
            preserve_history: true,
            history: Vec::new(),
            kind: ConversationKind::Room { nick: nick.into(), members: BTreeMap::new() },
        }
    }

    /// Whether this is a room.
    pub fn is_room(&self) -> bool {
        matches!(self.kind, ConversationKind::Room { .. })
    }

    /// Whether any session (or, for rooms, we ourselves) is online.
    pub fn is_online(&self) -> bool {
        match &self.kind {
            ConversationKind::User { sessions } => sessions.values().any(|s| s.presence.is_online()),
            ConversationKind::Room { .. } => true,
        }
    }

    /// Resource or nickname keys, in display order.
    pub fn resources(&self) -> Vec<&str> {
        match &self.kind {
            ConversationKind::User { sessions } => sessions.keys().map(String::as_str).collect(),
            ConversationKind::Room { members, .. } => members.keys().map(String::as_str).collect(),
        }
    }

    /// Whether a session or member with this key exists.
    pub fn has_resource(&self, resource: &str) -> bool {
        match &self.kind {
            ConversationKind::User { sessions } => sessions.contains_key(resource),
            ConversationKind::Room { members, .. } => members.contains_key(resource),
        }
    }

    /// Session for `resource`. Always `None` for rooms.
    pub fn session(&self, resource: &str) -> Option<&Session> {
        match &self.kind {
            ConversationKind::User { sessions } => sessions.get(resource),
            ConversationKind::Room { .. } => None,
        }
    }

    /// Most reachable session. `None` for rooms and offline contacts.
    pub fn best_session(&self) -> Option<&Session> {
        match &self.kind {
            ConversationKind::User { sessions } => {
                sessions.values().max_by_key(|s| s.presence.rank())
            },
            ConversationKind::Room { .. } => None,
        }
    }

    /// Presence and status of one resource, or of the conversation as a
    /// whole when `resource` is `None`.
    pub fn presence_of(&self, resource: Option<&str>) -> (Presence, &str) {
        match (&self.kind, resource) {
            (ConversationKind::User { sessions }, Some(r)) => {
                sessions.get(r).map_or((Presence::Offline, ""), |s| (s.presence, s.status.as_str()))
            },
            (ConversationKind::User { .. }, None) => {
                self.best_session().map_or((Presence::Offline, ""), |s| (s.presence, s.status.as_str()))
            },
            (ConversationKind::Room { members, .. }, Some(r)) => {
                members.get(r).map_or((Presence::Offline, ""), |m| (m.presence, m.status.as_str()))
            },
            (ConversationKind::Room { .. }, None) => {
                (Presence::Online(Availability::Available), "")
            },
        }
    }

    /// Append a history entry.
    pub fn push(&mut self, message: Message) {
        self.history.push(message);
    }
}

/// All known conversations plus our own account facts.
#[derive(Debug, Clone)]
pub struct ContactStore {
    account: Address,
    own_presence: Presence,
    conversations: Vec<Conversation>,
    trust: TrustStore,
}

impl ContactStore {
    /// Store holding only the self-conversation for `account`.
    pub fn new(account: Address) -> Self {
        let own = Conversation::user(account.bare.clone(), ColorTag::Default);
        Self {
            account,
            own_presence: Presence::Offline,
            conversations: vec![own],
            trust: TrustStore::default(),
        }
    }

    /// Our own account address.
    pub fn account(&self) -> &Address {
        &self.account
    }

    /// Whether `bare` is our own account.
    pub fn is_self(&self, bare: &str) -> bool {
        self.account.bare == bare
    }

    /// Our own presence.
    pub fn own_presence(&self) -> Presence {
        self.own_presence
    }

    /// Set our own presence.
    pub fn set_own_presence(&mut self, presence: Presence) {
        self.own_presence = presence;
    }

    /// Trust store used for verification.
    pub fn trust(&self) -> &TrustStore {
        &self.trust
    }

    /// Mutable trust store.
    pub fn trust_mut(&mut self) -> &mut TrustStore {
        &mut self.trust
    }

    /// All conversations in display order; the self-conversation is first.
    pub fn iter(&self) -> impl Iterator<Item = &Conversation> {
        self.conversations.iter()
    }

    /// Number of conversations, including the self-conversation.
    pub fn len(&self) -> usize {
        self.conversations.len()
    }

    /// Always false: the self-conversation is never removed.
    pub fn is_empty(&self) -> bool {
        self.conversations.is_empty()
    }

    /// Conversation by bare address.
    pub fn get(&self, bare: &str) -> Option<&Conversation> {
        self.conversations.iter().find(|c| c.bare == bare)
    }

    /// Mutable conversation by bare address.
    pub fn get_mut(&mut self, bare: &str) -> Option<&mut Conversation> {
        self.conversations.iter_mut().find(|c| c.bare == bare)
    }

    /// The self-conversation.
    pub fn own(&self) -> Option<&Conversation> {
        self.get(&self.account.bare)
    }

    /// Add a conversation. Returns `false` when the bare address is taken.
    pub fn insert(&mut self, conversation: Conversation) -> bool {
        if self.get(&conversation.bare).is_some() {
            return false;
        }
        self.conversations.push(conversation);
        true
    }

    /// Remove a conversation. The self-conversation is never removed.
    pub fn remove(&mut self, bare: &str) -> Option<Conversation> {
        if self.is_self(bare) {
            return None;
        }
        let idx = self.conversations.iter().position(|c| c.bare == bare)?;
        Some(self.conversations.remove(idx))
    }

    /// Whether `address` names an existing conversation and, when it has a
    /// resource, an existing session or member.
    pub fn resolves(&self, address: &Address) -> bool {
        self.get(&address.bare)
            .is_some_and(|c| address.resource().is_none_or(|r| c.has_resource(r)))
    }
}
