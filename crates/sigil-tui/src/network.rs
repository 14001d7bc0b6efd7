//! In-process simulated network.
//!
//! Stands in for the protocol and encryption collaborators so the client is
//! usable without a server. The task only ever posts [`Action`]s to the
//! reactor's mailbox; outbound messages reach it over an mpsc channel.
//!
//! On start it announces a small roster, a room and one encrypted session.
//! Every outbound message is confirmed with a delivery receipt and answered
//! by the peer. Presence changes arrive at random intervals.

use std::time::Duration;

use rand::{Rng, SeedableRng, rngs::StdRng};
use sigil_app::{
    Action, Address, Availability, ColorTag, Fingerprint, Mailbox, MessageKind, OutboundMessage,
    Presence,
};
use tokio::sync::mpsc;

const ROOM: &str = "lounge@rooms.sigil";
const RECEIPT_DELAY: Duration = Duration::from_millis(150);
const REPLY_DELAY: Duration = Duration::from_millis(600);
const PRESENCE_INTERVAL: Duration = Duration::from_secs(7);

/// Simulated peers: bare address, resource, initial presence.
const PEERS: [(&str, &str, Presence); 3] = [
    ("alice@sigil", "laptop", Presence::Online(Availability::Available)),
    ("bob@sigil", "phone", Presence::Online(Availability::Away)),
    ("carol@sigil", "desk", Presence::Offline),
];

const ROOM_MEMBERS: [&str; 2] = ["alice", "dave"];

/// Fingerprint the simulated peer with an encrypted session presents.
const ALICE_FINGERPRINT: &str = "6a1f 0c3e 9b72 44d8 e015 a7c2 3f9b 80d1";

/// Options for the simulated network.
#[derive(Debug, Clone)]
pub struct NetworkConfig {
    /// Our own account; its local part is our room nickname.
    pub account: Address,
    /// Probability per presence tick that the link drops.
    pub failure_rate: f64,
}

impl NetworkConfig {
    fn nick(&self) -> String {
        self.account.bare.split('@').next().unwrap_or("me").to_string()
    }
}

/// Handle to a running simulated network.
pub struct NetworkHandle {
    /// Outbound messages to the network.
    pub outbound: mpsc::Sender<OutboundMessage>,
    abort_handle: tokio::task::AbortHandle,
}

impl NetworkHandle {
    /// Stop the network task.
    pub fn stop(&self) {
        self.abort_handle.abort();
    }
}

impl Drop for NetworkHandle {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Spawn the simulated network.
///
/// The task runs until stopped or until the reactor drops its inbox.
pub fn spawn(mailbox: Mailbox, config: NetworkConfig) -> NetworkHandle {
    let (outbound, rx) = mpsc::channel::<OutboundMessage>(32);
    let handle = tokio::spawn(run(mailbox, config, rx));

    NetworkHandle { outbound, abort_handle: handle.abort_handle() }
}

async fn run(mailbox: Mailbox, config: NetworkConfig, mut rx: mpsc::Receiver<OutboundMessage>) {
    let mut rng = StdRng::from_os_rng();
    tracing::info!(account = %config.account, "simulated network up");

    for action in announce(&config) {
        mailbox.post(action);
    }

    let mut ticker = tokio::time::interval(PRESENCE_INTERVAL);
    ticker.tick().await;

    loop {
        tokio::select! {
            maybe_message = rx.recv() => {
                let Some(message) = maybe_message else {
                    tracing::debug!("outbound channel closed");
                    break;
                };
                answer(&mailbox, &config, message);
            }

            _ = ticker.tick() => {
                if rng.random_bool(config.failure_rate) {
                    tracing::info!("simulating link failure");
                    mailbox.post(Action::TransportFailure { reason: "connection reset by peer".into() });
                    break;
                }
                mailbox.post(random_presence(&mut rng));
            }
        }

        if mailbox.is_closed() {
            break;
        }
    }

    tracing::info!("simulated network down");
}

/// Initial facts posted after connecting.
fn announce(config: &NetworkConfig) -> Vec<Action> {
    let mut actions = vec![Action::Connected];

    for (bare, resource, presence) in PEERS {
        let color = if bare.starts_with("alice") { ColorTag::Good } else { ColorTag::Default };
        actions.push(Action::ContactAdded { address: Address::bare(bare), color });
        if presence.is_online() {
            actions.push(Action::Presence {
                address: Address::full(bare, resource),
                presence,
                status: String::new(),
            });
        }
    }

    let room = Address::bare(ROOM);
    let nick = config.nick();
    actions.push(Action::RoomJoined { room: room.clone(), nick: nick.clone() });
    for member in ROOM_MEMBERS.iter().copied().chain(std::iter::once(nick.as_str())) {
        actions.push(Action::Presence {
            address: Address::full(ROOM, member),
            presence: Presence::Online(Availability::Available),
            status: String::new(),
        });
    }

    let alice = Address::full("alice@sigil", "laptop");
    let fingerprint = Fingerprint(ALICE_FINGERPRINT.into());
    actions.push(Action::Trust { address: alice.bare_only(), fingerprint: fingerprint.clone() });
    actions.push(Action::SessionEstablished { address: alice.clone(), fingerprint });
    actions.push(Action::MessageReceived {
        address: alice,
        body: "welcome back! F4 cycles the display mode, Tab expands sessions".into(),
        encrypted: true,
        timestamp: None,
    });

    actions
}

/// Confirm and reply to one outbound message.
fn answer(mailbox: &Mailbox, config: &NetworkConfig, message: OutboundMessage) {
    let OutboundMessage { to, body, kind, id } = message;
    tracing::debug!(%to, %id, "simulated delivery");

    match kind {
        MessageKind::GroupChat => {
            let echo = Address::full(to.bare.clone(), config.nick());
            mailbox.post_after(RECEIPT_DELAY, Action::MessageReceived {
                address: echo,
                body: body.clone(),
                encrypted: false,
                timestamp: None,
            });
            mailbox.post_after(REPLY_DELAY, Action::MessageReceived {
                address: Address::full(to.bare, "dave"),
                body: format!("{}: +1", config.nick()),
                encrypted: false,
                timestamp: None,
            });
        },
        MessageKind::Normal => {
            let from = match PEERS.iter().find(|(bare, ..)| *bare == to.bare) {
                Some((bare, resource, _)) => Address::full(*bare, *resource),
                None => to.clone(),
            };
            let encrypted = from.bare.starts_with("alice");
            mailbox.post_after(RECEIPT_DELAY, Action::DeliveryReceipt { address: to.bare_only(), id });
            mailbox.post_after(REPLY_DELAY, Action::MessageReceived {
                address: from,
                body: format!("you said: {body}"),
                encrypted,
                timestamp: None,
            });
        },
    }
}

fn random_presence(rng: &mut StdRng) -> Action {
    const CHOICES: [Presence; 4] = [
        Presence::Online(Availability::Available),
        Presence::Online(Availability::Away),
        Presence::Online(Availability::DoNotDisturb),
        Presence::Offline,
    ];

    let (bare, resource, _) = PEERS[rng.random_range(1..PEERS.len())];
    let presence = CHOICES[rng.random_range(0..CHOICES.len())];
    let status = if presence == Presence::Online(Availability::DoNotDisturb) { "in a meeting" } else { "" };

    Action::Presence { address: Address::full(bare, resource), presence, status: status.into() }
}
