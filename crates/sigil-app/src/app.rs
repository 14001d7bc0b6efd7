//! Application state machine.
//!
//! This module defines [`App`], the single owned state value: the contact
//! store plus the view state. It is a pure state machine: it consumes
//! [`crate::Action`]s and returns [`crate::Effect`]s for the reactor to
//! execute. It performs no I/O and reads no clock; the caller passes `now`.
//!
//! # Invariants
//!
//! - The active pointer always resolves and is always a row of
//!   [`App::visible`]. Transitions that remove a conversation, session or
//!   member redirect the pointer before they return.
//! - The notification queue never names the active conversation while the
//!   message pane is at the live tail.
//! - A transition that returns `Err` has not modified any state.

use chrono::{DateTime, Utc};

use crate::{
    Action, ActionError, Address, Availability, Channel, ColorTag, Config, ContactStore,
    Conversation, ConversationKind, DeliveryId, Direction, Effect, Fingerprint, Member, Message,
    MessageKind, Nav, OutboundMessage, Presence, Session, ViewState,
};

const ERROR_LABEL: &str = "error";

/// Application state: contact store plus view state.
#[derive(Debug, Clone)]
pub struct App {
    config: Config,
    contacts: ContactStore,
    view: ViewState,
    /// Counter for outbound delivery ids.
    next_delivery: u64,
}

impl App {
    /// Fresh state for the configured account. Only the self-conversation
    /// exists and it is active.
    pub fn new(config: Config) -> Self {
        let contacts = ContactStore::new(config.account.clone());
        let view = ViewState::new(&config);
        Self { config, contacts, view, next_delivery: 0 }
    }

    /// Apply one action.
    ///
    /// # Errors
    ///
    /// Returns an [`ActionError`] when the action does not fit the current
    /// state. The state is then unchanged.
    pub fn handle(&mut self, action: Action, now: DateTime<Utc>) -> Result<Vec<Effect>, ActionError> {
        tracing::debug!(?action, "applying");
        match action {
            Action::NavigateBuddyList(nav) => self.navigate_buddy_list(nav),
            Action::NavigateMessages(nav) => self.navigate_messages(nav),
            Action::ToggleShowOffline => self.view.show_offline = !self.view.show_offline,
            Action::AdjustLogHeight => self.view.grow_log(),
            Action::AdjustBuddyWidth => self.view.grow_buddy(),
            Action::CycleDisplayMode => self.view.mode = self.view.mode.next(),
            Action::ToggleExpand => self.toggle_expand(),
            Action::ToggleLastActive => self.toggle_last_active(),
            Action::InsertChar(c) => self.view.input.push(c),
            Action::Backspace => self.view.input.pop(),
            Action::Submit => return self.submit(now),
            Action::Redraw => {},
            Action::Quit => return Ok(vec![Effect::Quit]),
            Action::Connected => {
                self.contacts.set_own_presence(Presence::Online(Availability::Available));
                self.log(None, "connected", now);
            },
            Action::ContactAdded { address, color } => self.contact_added(&address, color),
            Action::ContactRemoved { address } => self.remove_conversation(&address.bare)?,
            Action::RoomJoined { room, nick } => self.room_joined(&room, nick, now)?,
            Action::RoomLeft { room } => self.remove_conversation(&room.bare)?,
            Action::Presence { address, presence, status } => {
                self.presence(&address, presence, status)?;
            },
            Action::SessionEstablished { address, fingerprint } => {
                self.session_established(&address, fingerprint, now)?;
            },
            Action::SessionTornDown { address } => self.session_torn_down(&address, now)?,
            Action::MessageReceived { address, body, encrypted, timestamp } => {
                self.message_received(address, body, encrypted, timestamp.unwrap_or(now));
            },
            Action::DeliveryReceipt { address, id } => self.delivery_receipt(&address, &id)?,
            Action::Trust { address, fingerprint } => {
                self.contacts.trust_mut().trust(&address.bare, fingerprint);
                self.log(None, format!("trusted new fingerprint for {}", address.bare), now);
            },
            Action::TransportFailure { reason } => {
                let delay = self.config.reconnect_backoff;
                self.go_offline();
                self.log(
                    Some(ERROR_LABEL),
                    format!("connection lost: {reason}; reconnecting in {}s", delay.as_secs()),
                    now,
                );
                return Ok(vec![Effect::Disconnect, Effect::ScheduleReconnect(delay)]);
            },
            Action::Disconnect => {
                self.go_offline();
                self.log(None, "disconnected", now);
                return Ok(vec![Effect::Disconnect]);
            },
            Action::Reconnect => {
                if self.contacts.own_presence().is_online() {
                    tracing::debug!("already connected, dropping reconnect");
                    return Ok(vec![]);
                }
                self.log(None, "reconnecting", now);
                return Ok(vec![Effect::Reconnect]);
            },
        }
        Ok(vec![])
    }

    /// Report a rejected action in the history of the conversation it
    /// concerns, or of the self-conversation.
    pub fn record_fault(&mut self, error: &ActionError, now: DateTime<Utc>) {
        tracing::warn!(%error, "action rejected");
        let target = error
            .conversation()
            .filter(|bare| self.contacts.get(bare).is_some())
            .map(str::to_string);
        self.log_in(target.as_deref(), Some(ERROR_LABEL), error.to_string(), now);
    }

    /// Report an outbound message the transport did not take. The message
    /// stays unconfirmed in the history.
    pub fn send_failed(&mut self, message: &OutboundMessage, reason: &str, now: DateTime<Utc>) {
        tracing::warn!(to = %message.to, %reason, "send failed");
        let target = self.contacts.get(&message.to.bare).map(|c| c.bare.clone());
        self.log_in(target.as_deref(), Some(ERROR_LABEL), format!("message not delivered: {reason}"), now);
    }

    /// Report a failed reconnect attempt and schedule the next one.
    pub fn reconnect_failed(&mut self, reason: &str, now: DateTime<Utc>) -> Vec<Effect> {
        let delay = self.config.reconnect_backoff;
        tracing::warn!(%reason, ?delay, "reconnect failed");
        self.log(
            Some(ERROR_LABEL),
            format!("reconnect failed: {reason}; retrying in {}s", delay.as_secs()),
            now,
        );
        vec![Effect::ScheduleReconnect(delay)]
    }

    /// Configuration the state was built from.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Contact store.
    pub fn contacts(&self) -> &ContactStore {
        &self.contacts
    }

    /// View state.
    pub fn view(&self) -> &ViewState {
        &self.view
    }

    /// Conversation the active pointer names.
    pub fn active_conversation(&self) -> Option<&Conversation> {
        self.contacts.get(&self.view.active.bare)
    }

    /// Buddy list rows, in order.
    ///
    /// A conversation is listed when it is the self-conversation, is
    /// online, is active, has unseen activity, or offline contacts are
    /// shown. Expanded conversations are followed by one row per session or
    /// member.
    pub fn visible(&self) -> Vec<Address> {
        let mut rows = Vec::new();
        for conv in self.contacts.iter() {
            let listed = self.view.show_offline
                || self.contacts.is_self(&conv.bare)
                || conv.is_online()
                || conv.bare == self.view.active.bare
                || self.view.is_notified(&conv.bare);
            if !listed {
                continue;
            }
            rows.push(Address::bare(conv.bare.clone()));
            if conv.expanded {
                rows.extend(conv.resources().into_iter().map(|r| Address::full(conv.bare.clone(), r)));
            }
        }
        rows
    }

    /// Index of the active pointer among [`App::visible`].
    pub fn active_index(&self, visible: &[Address]) -> Option<usize> {
        visible.iter().position(|a| *a == self.view.active)
    }

    fn activate(&mut self, address: Address) {
        if address != self.view.active {
            let previous = std::mem::replace(&mut self.view.active, address);
            self.view.last_active = Some(previous);
        }
        self.view.scrollback = 0;
        self.clear_active_notification();
    }

    fn clear_active_notification(&mut self) {
        let bare = self.view.active.bare.clone();
        self.view.clear_notification(&bare);
    }

    fn navigate_buddy_list(&mut self, nav: Nav) {
        let visible = self.visible();
        let len = visible.len();
        if len == 0 {
            return;
        }

        let current = self.active_index(&visible);
        debug_assert!(current.is_some(), "active pointer {} not visible", self.view.active);
        let idx = current.unwrap_or(0);
        let next = match nav {
            Nav::Up => (idx + len - 1) % len,
            Nav::Down => (idx + 1) % len,
        };
        if Some(next) == current {
            return;
        }
        if let Some(address) = visible.get(next) {
            self.activate(address.clone());
        }
    }

    fn navigate_messages(&mut self, nav: Nav) {
        match nav {
            Nav::Up => self.view.scrollback = self.view.scrollback.saturating_add(1),
            Nav::Down => {
                self.view.scrollback = self.view.scrollback.saturating_sub(1);
                if self.view.scrollback == 0 {
                    self.clear_active_notification();
                }
            },
        }
    }

    fn toggle_expand(&mut self) {
        let active = self.view.active.clone();
        let Some(conv) = self.contacts.get_mut(&active.bare) else {
            return;
        };
        conv.expanded = !conv.expanded;
        if !conv.expanded && !active.is_bare() {
            self.view.active = active.bare_only();
        }
    }

    fn toggle_last_active(&mut self) {
        let Some(last) = self.view.last_active.clone() else {
            return;
        };
        let expanded = self.contacts.get(&last.bare).is_some_and(|c| c.expanded);
        if self.contacts.resolves(&last) && (last.is_bare() || expanded) {
            self.activate(last);
        } else {
            self.view.last_active = None;
        }
    }

    fn submit(&mut self, now: DateTime<Utc>) -> Result<Vec<Effect>, ActionError> {
        if self.view.input.buffer().is_empty() {
            return Ok(vec![]);
        }

        let to = self.view.active.clone();
        if self.contacts.is_self(&to.bare) {
            return Err(ActionError::NoRecipient);
        }
        let conv = self
            .contacts
            .get(&to.bare)
            .ok_or_else(|| ActionError::UnknownConversation(to.bare.clone()))?;

        let (kind, encrypted) = match &conv.kind {
            ConversationKind::Room { .. } if to.is_bare() => (MessageKind::GroupChat, false),
            ConversationKind::Room { .. } => (MessageKind::Normal, false),
            ConversationKind::User { .. } => {
                let session = to.resource().and_then(|r| conv.session(r)).or_else(|| conv.best_session());
                (MessageKind::Normal, session.is_some_and(|s| s.channel.established))
            },
        };

        self.next_delivery += 1;
        let id = DeliveryId(format!("sigil-{}", self.next_delivery));
        let body = self.view.input.take();
        let outbound = OutboundMessage { to: to.clone(), body: body.clone(), kind, id: id.clone() };

        if let Some(conv) = self.contacts.get_mut(&to.bare) {
            conv.push(Message {
                direction: Direction::To { to, id },
                timestamp: now,
                encrypted,
                received: false,
                body,
            });
        }
        self.view.scrollback = 0;
        self.clear_active_notification();

        Ok(vec![Effect::Send(outbound)])
    }

    fn contact_added(&mut self, address: &Address, color: ColorTag) {
        if self.contacts.is_self(&address.bare) {
            return;
        }
        if let Some(conv) = self.contacts.get_mut(&address.bare) {
            conv.color = color;
        } else {
            self.contacts.insert(Conversation::user(address.bare.clone(), color));
        }
    }

    fn room_joined(&mut self, room: &Address, nick: String, now: DateTime<Utc>) -> Result<(), ActionError> {
        if self.contacts.is_self(&room.bare) {
            return Err(ActionError::UnknownConversation(room.bare.clone()));
        }
        let notice = format!("joined as {nick}");
        match self.contacts.get_mut(&room.bare).map(|c| &mut c.kind) {
            Some(ConversationKind::Room { nick: current, .. }) => *current = nick,
            Some(ConversationKind::User { .. }) => {},
            None => {
                self.contacts.insert(Conversation::room(room.bare.clone(), nick));
            },
        }
        self.log_in(Some(&room.bare), None, notice, now);
        Ok(())
    }

    /// Remove a conversation, redirecting the active pointer first.
    fn remove_conversation(&mut self, bare: &str) -> Result<(), ActionError> {
        if self.contacts.is_self(bare) {
            return Err(ActionError::SelfRemoval(bare.to_string()));
        }
        if self.contacts.get(bare).is_none() {
            return Err(ActionError::UnknownConversation(bare.to_string()));
        }

        if self.view.active.bare == bare {
            let next = self.next_visible_outside(bare);
            self.view.active = next;
            self.view.scrollback = 0;
            self.clear_active_notification();
        }
        if self.view.last_active.as_ref().is_some_and(|a| a.bare == bare) {
            self.view.last_active = None;
        }
        self.view.clear_notification(bare);
        self.contacts.remove(bare);
        Ok(())
    }

    /// First visible conversation after the active one that does not belong
    /// to `bare`, wrapping around; the self-conversation if none.
    fn next_visible_outside(&self, bare: &str) -> Address {
        let visible = self.visible();
        let start = self.active_index(&visible).unwrap_or(0);
        visible
            .iter()
            .cycle()
            .skip(start + 1)
            .take(visible.len())
            .find(|a| a.bare != bare && a.is_bare())
            .cloned()
            .unwrap_or_else(|| self.contacts.account().bare_only())
    }

    fn presence(&mut self, address: &Address, presence: Presence, status: String) -> Result<(), ActionError> {
        if self.contacts.is_self(&address.bare) {
            let own = self.contacts.account().resource.clone();
            if address.resource.is_none() || address.resource == own {
                self.contacts.set_own_presence(presence);
            }
            return Ok(());
        }

        let is_room = self.contacts.get(&address.bare).is_some_and(Conversation::is_room);
        if presence.is_online() && address.is_bare() && !is_room {
            return Err(ActionError::NotASession(address.clone()));
        }

        if self.contacts.get(&address.bare).is_none() {
            if !presence.is_online() {
                return Ok(());
            }
            self.contacts.insert(Conversation::user(address.bare.clone(), ColorTag::Default));
        }

        let Some(conv) = self.contacts.get_mut(&address.bare) else {
            return Err(ActionError::UnknownConversation(address.bare.clone()));
        };

        match (&mut conv.kind, address.resource.clone()) {
            (ConversationKind::User { sessions }, None) => sessions.clear(),
            (ConversationKind::User { sessions }, Some(resource)) => {
                if presence.is_online() {
                    let session = sessions.entry(resource.clone()).or_insert_with(|| Session {
                        resource,
                        presence,
                        status: String::new(),
                        channel: Channel::default(),
                    });
                    session.presence = presence;
                    session.status = status;
                } else {
                    sessions.remove(&resource);
                }
            },
            (ConversationKind::Room { .. }, None) => {},
            (ConversationKind::Room { members, .. }, Some(nick)) => {
                if presence.is_online() {
                    let member = members.entry(nick.clone()).or_insert_with(|| Member {
                        nick,
                        presence,
                        status: String::new(),
                    });
                    member.presence = presence;
                    member.status = status;
                } else {
                    members.remove(&nick);
                }
            },
        }

        if !conv.is_online() && !conv.preserve_history {
            conv.history.clear();
        }
        self.redirect_dangling_resource();
        Ok(())
    }

    fn session_mut(&mut self, address: &Address) -> Result<&mut Session, ActionError> {
        let resource = address.resource().ok_or_else(|| ActionError::NotASession(address.clone()))?;
        match self.contacts.get_mut(&address.bare).map(|c| &mut c.kind) {
            Some(ConversationKind::User { sessions }) => {
                sessions.get_mut(resource).ok_or_else(|| ActionError::NotASession(address.clone()))
            },
            Some(ConversationKind::Room { .. }) => Err(ActionError::NotASession(address.clone())),
            None => Err(ActionError::UnknownConversation(address.bare.clone())),
        }
    }

    fn session_established(
        &mut self,
        address: &Address,
        fingerprint: Fingerprint,
        now: DateTime<Utc>,
    ) -> Result<(), ActionError> {
        let session = self.session_mut(address)?;
        session.channel = Channel { established: true, fingerprint: Some(fingerprint) };
        let channel = session.channel.clone();

        let verification = self.contacts.trust().verify(&address.bare, &channel);
        let notice = format!("encrypted session with {address} ({verification:?})");
        self.log_in(Some(&address.bare), None, notice, now);
        Ok(())
    }

    fn session_torn_down(&mut self, address: &Address, now: DateTime<Utc>) -> Result<(), ActionError> {
        self.session_mut(address)?.channel = Channel::default();
        self.log_in(Some(&address.bare), None, format!("encrypted session with {address} ended"), now);
        Ok(())
    }

    fn message_received(&mut self, from: Address, body: String, encrypted: bool, at: DateTime<Utc>) {
        let bare = from.bare.clone();

        if let Some(conv) = self.contacts.get_mut(&bare)
            && let ConversationKind::Room { nick, .. } = &conv.kind
            && from.resource() == Some(nick.as_str())
        {
            let echo = conv.history.iter_mut().find(|m| {
                !m.received && m.body == body && matches!(m.direction, Direction::To { .. })
            });
            if let Some(sent) = echo {
                sent.received = true;
                return;
            }
        }

        if self.contacts.get(&bare).is_none() {
            self.contacts.insert(Conversation::user(bare.clone(), ColorTag::Default));
        }
        if let Some(conv) = self.contacts.get_mut(&bare) {
            conv.push(Message { direction: Direction::From(from), timestamp: at, encrypted, received: true, body });
        }

        self.notify_unseen(&bare);
    }

    fn delivery_receipt(&mut self, address: &Address, id: &DeliveryId) -> Result<(), ActionError> {
        let conv = self
            .contacts
            .get_mut(&address.bare)
            .ok_or_else(|| ActionError::UnknownConversation(address.bare.clone()))?;
        let sent = conv
            .history
            .iter_mut()
            .find(|m| matches!(&m.direction, Direction::To { id: sent, .. } if sent == id))
            .ok_or_else(|| ActionError::UnknownDelivery { bare: address.bare.clone(), id: id.clone() })?;
        sent.received = true;
        Ok(())
    }

    /// Drop every session and member after the transport went away.
    fn go_offline(&mut self) {
        self.contacts.set_own_presence(Presence::Offline);
        let bares: Vec<String> = self.contacts.iter().map(|c| c.bare.clone()).collect();
        for bare in bares {
            if let Some(conv) = self.contacts.get_mut(&bare) {
                match &mut conv.kind {
                    ConversationKind::User { sessions } => sessions.clear(),
                    ConversationKind::Room { members, .. } => members.clear(),
                }
                if !conv.is_online() && !conv.preserve_history {
                    conv.history.clear();
                }
            }
        }
        self.redirect_dangling_resource();
    }

    /// Point the active and last-active pointers at the bare address when
    /// their resource no longer exists.
    fn redirect_dangling_resource(&mut self) {
        if !self.contacts.resolves(&self.view.active) {
            self.view.active = self.view.active.bare_only();
        }
        if let Some(last) = &self.view.last_active
            && !self.contacts.resolves(last)
        {
            self.view.last_active = Some(last.bare_only());
        }
    }

    fn log(&mut self, label: Option<&str>, body: impl Into<String>, now: DateTime<Utc>) {
        self.log_in(None, label, body, now);
    }

    /// Append a local entry to `bare`, or to the self-conversation.
    fn log_in(&mut self, bare: Option<&str>, label: Option<&str>, body: impl Into<String>, now: DateTime<Utc>) {
        let target = bare.unwrap_or(&self.config.account.bare).to_string();
        let entry = Message::local(Address::bare(target.clone()), label.map(str::to_string), body, now);
        if let Some(conv) = self.contacts.get_mut(&target) {
            conv.push(entry);
        }
        if !self.contacts.is_self(&target) {
            self.notify_unseen(&target);
        }
    }

    /// Queue a notification unless `bare` is active and at the live tail.
    fn notify_unseen(&mut self, bare: &str) {
        if bare != self.view.active.bare || self.view.scrollback > 0 {
            self.view.notify(bare);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn now() -> DateTime<Utc> {
        DateTime::from_timestamp(1_709_373_600, 0).unwrap_or_default()
    }

    fn online(app: &mut App, address: &str) {
        let result = app.handle(
            Action::Presence {
                address: Address::parse(address),
                presence: Presence::Online(Availability::Available),
                status: String::new(),
            },
            now(),
        );
        assert!(result.is_ok());
    }

    fn app_with_contacts() -> App {
        let mut app = App::new(Config::default());
        for bare in ["a@x", "b@x", "c@x"] {
            let _ = app.handle(
                Action::ContactAdded { address: Address::bare(bare), color: ColorTag::Default },
                now(),
            );
            online(&mut app, &format!("{bare}/phone"));
        }
        app
    }

    fn bare(s: &str) -> Address {
        Address::bare(s)
    }

    #[test]
    fn buddy_navigation_wraps() {
        let mut app = app_with_contacts();
        assert_eq!(app.visible().len(), 4);

        let _ = app.handle(Action::NavigateBuddyList(Nav::Up), now());
        assert_eq!(app.view().active, bare("c@x"));

        let _ = app.handle(Action::NavigateBuddyList(Nav::Down), now());
        assert_eq!(app.view().active, bare("me@localhost"));
        assert_eq!(app.view().last_active, Some(bare("c@x")));
    }

    #[test]
    fn single_row_navigation_is_noop() {
        let mut app = App::new(Config::default());
        let _ = app.handle(Action::NavigateBuddyList(Nav::Down), now());
        assert_eq!(app.view().active, bare("me@localhost"));
        assert_eq!(app.view().last_active, None);
    }

    #[test]
    fn scrolling_back_to_tail_clears_notification() {
        let mut app = app_with_contacts();
        let _ = app.handle(Action::NavigateBuddyList(Nav::Down), now());
        let _ = app.handle(Action::NavigateMessages(Nav::Up), now());
        let _ = app.handle(Action::NavigateMessages(Nav::Up), now());

        let _ = app.handle(
            Action::MessageReceived {
                address: Address::parse("a@x/phone"),
                body: "hi".into(),
                encrypted: false,
                timestamp: None,
            },
            now(),
        );
        assert!(app.view().is_notified("a@x"));

        let _ = app.handle(Action::NavigateMessages(Nav::Down), now());
        assert!(app.view().is_notified("a@x"));
        let _ = app.handle(Action::NavigateMessages(Nav::Down), now());
        assert!(!app.view().is_notified("a@x"));

        let _ = app.handle(Action::NavigateMessages(Nav::Down), now());
        assert_eq!(app.view().scrollback, 0);
    }

    #[test]
    fn submit_returns_to_tail_and_clears_notification() {
        let mut app = app_with_contacts();
        let _ = app.handle(Action::NavigateBuddyList(Nav::Down), now());
        let _ = app.handle(Action::NavigateMessages(Nav::Up), now());
        let _ = app.handle(
            Action::MessageReceived {
                address: Address::parse("a@x/phone"),
                body: "hi".into(),
                encrypted: false,
                timestamp: None,
            },
            now(),
        );
        assert!(app.view().is_notified("a@x"));

        let _ = app.handle(Action::InsertChar('x'), now());
        assert!(app.handle(Action::Submit, now()).is_ok());
        assert_eq!(app.view().scrollback, 0);
        assert!(!app.view().is_notified("a@x"));
    }

    #[test]
    fn local_entry_in_scrolled_back_conversation_notifies() {
        let mut app = app_with_contacts();
        let _ = app.handle(Action::NavigateBuddyList(Nav::Down), now());

        let fingerprint = Fingerprint("ab12".into());
        let established =
            Action::SessionEstablished { address: Address::parse("a@x/phone"), fingerprint };
        assert!(app.handle(established.clone(), now()).is_ok());
        assert!(!app.view().is_notified("a@x"));

        let _ = app.handle(Action::NavigateMessages(Nav::Up), now());
        assert!(app.handle(established, now()).is_ok());
        assert!(app.view().is_notified("a@x"));
    }

    #[test]
    fn rejoining_room_updates_nick() {
        let mut app = App::new(Config::default());
        let room = bare("lounge@x");
        let _ = app.handle(Action::RoomJoined { room: room.clone(), nick: "me".into() }, now());
        let _ = app.handle(Action::RoomJoined { room, nick: "me2".into() }, now());

        let nick = app.contacts().get("lounge@x").and_then(|c| match &c.kind {
            ConversationKind::Room { nick, .. } => Some(nick.clone()),
            ConversationKind::User { .. } => None,
        });
        assert_eq!(nick.as_deref(), Some("me2"));
    }

    #[test]
    fn removing_active_contact_redirects_pointer() {
        let mut app = app_with_contacts();
        let _ = app.handle(Action::NavigateBuddyList(Nav::Down), now());
        let _ = app.handle(Action::NavigateBuddyList(Nav::Down), now());
        assert_eq!(app.view().active, bare("b@x"));

        let result = app.handle(Action::ContactRemoved { address: bare("b@x") }, now());
        assert!(result.is_ok());
        assert_eq!(app.view().active, bare("c@x"));
        assert!(app.contacts().get("b@x").is_none());
    }

    #[test]
    fn removing_last_contact_falls_back_to_self() {
        let mut app = App::new(Config::default());
        let _ = app.handle(Action::ContactAdded { address: bare("a@x"), color: ColorTag::Good }, now());
        let _ = app.handle(Action::ToggleShowOffline, now());
        let _ = app.handle(Action::NavigateBuddyList(Nav::Down), now());
        assert_eq!(app.view().active, bare("a@x"));

        let _ = app.handle(Action::ContactRemoved { address: bare("a@x") }, now());
        assert_eq!(app.view().active, bare("me@localhost"));
    }

    #[test]
    fn self_removal_is_rejected_without_change() {
        let mut app = App::new(Config::default());
        let result = app.handle(Action::ContactRemoved { address: bare("me@localhost") }, now());
        assert_eq!(result, Err(ActionError::SelfRemoval("me@localhost".into())));
        assert_eq!(app.contacts().len(), 1);
    }

    #[test]
    fn session_going_offline_redirects_resource_pointer() {
        let mut app = app_with_contacts();
        let _ = app.handle(Action::NavigateBuddyList(Nav::Down), now());
        let _ = app.handle(Action::ToggleExpand, now());
        let _ = app.handle(Action::NavigateBuddyList(Nav::Down), now());
        assert_eq!(app.view().active, Address::full("a@x", "phone"));

        let _ = app.handle(
            Action::Presence {
                address: Address::full("a@x", "phone"),
                presence: Presence::Offline,
                status: String::new(),
            },
            now(),
        );
        assert_eq!(app.view().active, bare("a@x"));
        assert!(app.active_index(&app.visible()).is_some());
    }

    #[test]
    fn submit_appends_unconfirmed_message_and_sends() {
        let mut app = app_with_contacts();
        let _ = app.handle(Action::NavigateBuddyList(Nav::Down), now());
        for c in "hello".chars() {
            let _ = app.handle(Action::InsertChar(c), now());
        }

        let effects = app.handle(Action::Submit, now());
        let Ok([Effect::Send(outbound)]) = effects.as_deref() else {
            panic!("expected one send, got {effects:?}");
        };
        assert_eq!(outbound.to, bare("a@x"));
        assert_eq!(outbound.kind, MessageKind::Normal);
        assert!(app.view().input.buffer().is_empty());

        let sent = app.contacts().get("a@x").and_then(|c| c.history.last()).cloned();
        assert!(sent.is_some_and(|m| !m.received && m.body == "hello"));

        let receipt = Action::DeliveryReceipt { address: bare("a@x"), id: outbound.id.clone() };
        assert!(app.handle(receipt, now()).is_ok());
        let sent = app.contacts().get("a@x").and_then(|c| c.history.last()).cloned();
        assert!(sent.is_some_and(|m| m.received));
    }

    #[test]
    fn submit_to_self_is_rejected_and_keeps_input() {
        let mut app = App::new(Config::default());
        let _ = app.handle(Action::InsertChar('x'), now());
        assert_eq!(app.handle(Action::Submit, now()), Err(ActionError::NoRecipient));
        assert_eq!(app.view().input.buffer(), "x");
    }

    #[test]
    fn unknown_receipt_is_reported() {
        let mut app = app_with_contacts();
        let err = app
            .handle(Action::DeliveryReceipt { address: bare("a@x"), id: DeliveryId("nope".into()) }, now())
            .err();
        let Some(err) = err else { panic!("receipt should be rejected") };

        app.record_fault(&err, now());
        let last = app.contacts().get("a@x").and_then(|c| c.history.last()).cloned();
        assert!(last.is_some_and(|m| m.is_local() && m.body.contains("nope")));
    }

    #[test]
    fn transport_failure_schedules_reconnect() {
        let mut app = app_with_contacts();
        let _ = app.handle(Action::Connected, now());

        let effects = app.handle(Action::TransportFailure { reason: "reset".into() }, now());
        assert_eq!(
            effects,
            Ok(vec![Effect::Disconnect, Effect::ScheduleReconnect(app.config().reconnect_backoff)])
        );
        assert_eq!(app.contacts().own_presence(), Presence::Offline);
        assert!(app.contacts().iter().all(|c| c.resources().is_empty()));

        assert_eq!(app.handle(Action::Reconnect, now()), Ok(vec![Effect::Reconnect]));
        let _ = app.handle(Action::Connected, now());
        assert_eq!(app.handle(Action::Reconnect, now()), Ok(vec![]));
    }

    #[test]
    fn room_echo_confirms_groupchat_message() {
        let mut app = App::new(Config::default());
        let room = bare("lounge@x");
        let _ = app.handle(Action::RoomJoined { room: room.clone(), nick: "me".into() }, now());
        while app.view().active != room {
            let _ = app.handle(Action::NavigateBuddyList(Nav::Down), now());
        }
        let _ = app.handle(Action::InsertChar('y'), now());
        let effects = app.handle(Action::Submit, now());
        assert!(matches!(
            effects.as_deref(),
            Ok([Effect::Send(OutboundMessage { kind: MessageKind::GroupChat, .. })])
        ));

        let _ = app.handle(
            Action::MessageReceived {
                address: Address::full("lounge@x", "me"),
                body: "y".into(),
                encrypted: false,
                timestamp: None,
            },
            now(),
        );
        let history = app.contacts().get("lounge@x").map(|c| c.history.clone()).unwrap_or_default();
        assert!(history.last().is_some_and(|m| m.received && !m.is_local()));
        assert_eq!(history.iter().filter(|m| !m.is_local()).count(), 1);
    }
}
