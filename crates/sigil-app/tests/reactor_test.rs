//! Reactor serialization and failure-handling tests.
//!
//! A recording driver captures a snapshot of the input line at every render,
//! which makes interleaving visible: every snapshot must extend the previous
//! one by exactly the one character the applied action inserted.

use std::{
    sync::{Arc, Mutex},
    time::Duration,
};

use chrono::{DateTime, Utc};
use sigil_app::{
    Action, Address, App, Availability, ColorTag, Config, Driver, Mailbox, Nav, OutboundMessage,
    Presence, Reactor, mailbox,
};

#[derive(Debug, thiserror::Error)]
#[error("link down")]
struct LinkDown;

#[derive(Default)]
struct Record {
    renders: Vec<String>,
    sent: Vec<OutboundMessage>,
    reconnects: usize,
    stopped: bool,
}

/// Driver that records what the reactor asked of it.
struct RecordingDriver {
    record: Arc<Mutex<Record>>,
    fail_sends: bool,
    failed_reconnects: usize,
    mailbox: Option<Mailbox>,
}

impl RecordingDriver {
    fn new(record: Arc<Mutex<Record>>) -> Self {
        Self { record, fail_sends: false, failed_reconnects: 0, mailbox: None }
    }
}

impl Driver for RecordingDriver {
    type Error = LinkDown;

    fn now(&self) -> DateTime<Utc> {
        DateTime::from_timestamp(1_709_373_600, 0).unwrap_or_default()
    }

    fn render(&mut self, app: &App) -> Result<(), Self::Error> {
        self.record.lock().unwrap().renders.push(app.view().input.buffer().to_string());
        Ok(())
    }

    async fn send(&mut self, message: OutboundMessage) -> Result<(), Self::Error> {
        if self.fail_sends {
            return Err(LinkDown);
        }
        self.record.lock().unwrap().sent.push(message);
        Ok(())
    }

    async fn disconnect(&mut self) {}

    async fn reconnect(&mut self) -> Result<(), Self::Error> {
        let attempt = {
            let mut record = self.record.lock().unwrap();
            record.reconnects += 1;
            record.reconnects
        };
        if attempt <= self.failed_reconnects {
            return Err(LinkDown);
        }
        if let Some(mailbox) = &self.mailbox {
            mailbox.post(Action::Connected);
            mailbox.post(Action::Quit);
        }
        Ok(())
    }

    fn stop(&mut self) {
        self.record.lock().unwrap().stopped = true;
    }
}

fn app_with_contact() -> App {
    let mut app = App::new(Config::default());
    let now = DateTime::from_timestamp(1_709_373_600, 0).unwrap_or_default();
    let _ = app.handle(
        Action::ContactAdded { address: Address::bare("bob@x"), color: ColorTag::Default },
        now,
    );
    let _ = app.handle(
        Action::Presence {
            address: Address::full("bob@x", "phone"),
            presence: Presence::Online(Availability::Available),
            status: String::new(),
        },
        now,
    );
    let _ = app.handle(Action::NavigateBuddyList(Nav::Down), now);
    app
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_producers_never_interleave() {
    const PRODUCERS: usize = 4;
    const PER_PRODUCER: usize = 50;

    let record = Arc::new(Mutex::new(Record::default()));
    let (tx, rx) = mailbox();
    let reactor = Reactor::new(RecordingDriver::new(record.clone()), App::new(Config::default()), rx, tx.clone());
    let running = tokio::spawn(reactor.run());

    let producers: Vec<_> = (0..PRODUCERS)
        .map(|idx| {
            let tx = tx.clone();
            let letter = char::from(b'a' + idx as u8);
            tokio::spawn(async move {
                for _ in 0..PER_PRODUCER {
                    assert!(tx.post(Action::InsertChar(letter)));
                    tokio::task::yield_now().await;
                }
            })
        })
        .collect();
    for producer in producers {
        producer.await.unwrap();
    }
    tx.post(Action::Quit);

    running.await.unwrap().unwrap();

    let record = record.lock().unwrap();
    assert!(record.stopped);
    assert_eq!(record.renders.len(), PRODUCERS * PER_PRODUCER + 1);
    for pair in record.renders.windows(2) {
        assert!(pair[1].starts_with(pair[0].as_str()));
        assert_eq!(pair[1].chars().count(), pair[0].chars().count() + 1);
    }

    let last = record.renders.last().cloned().unwrap_or_default();
    for idx in 0..PRODUCERS {
        let letter = char::from(b'a' + idx as u8);
        assert_eq!(last.chars().filter(|c| *c == letter).count(), PER_PRODUCER);
    }
}

#[tokio::test]
async fn submit_reaches_transport() {
    let record = Arc::new(Mutex::new(Record::default()));
    let (tx, rx) = mailbox();
    let mut reactor = Reactor::new(RecordingDriver::new(record.clone()), app_with_contact(), rx, tx);

    for c in "hey".chars() {
        assert!(!reactor.step(Action::InsertChar(c)).await.unwrap());
    }
    assert!(!reactor.step(Action::Submit).await.unwrap());

    let sent = record.lock().unwrap().sent.clone();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].to, Address::bare("bob@x"));
    assert_eq!(sent[0].body, "hey");
}

#[tokio::test]
async fn send_failure_is_reported_in_history() {
    let record = Arc::new(Mutex::new(Record::default()));
    let (tx, rx) = mailbox();
    let mut driver = RecordingDriver::new(record.clone());
    driver.fail_sends = true;
    let mut reactor = Reactor::new(driver, app_with_contact(), rx, tx);

    reactor.step(Action::InsertChar('x')).await.unwrap();
    reactor.step(Action::Submit).await.unwrap();

    let history = &reactor.app().contacts().get("bob@x").unwrap().history;
    assert_eq!(history.len(), 2);
    assert!(!history[0].received);
    assert!(history[1].is_local());
    assert!(history[1].body.contains("link down"));
}

#[tokio::test]
async fn rejected_action_keeps_reactor_running() {
    let record = Arc::new(Mutex::new(Record::default()));
    let (tx, rx) = mailbox();
    let mut reactor = Reactor::new(RecordingDriver::new(record), App::new(Config::default()), rx, tx);

    let quit = reactor.step(Action::ContactRemoved { address: Address::bare("ghost@x") }).await.unwrap();
    assert!(!quit);

    let own = reactor.app().contacts().own().unwrap();
    assert!(own.history.last().is_some_and(|m| m.body.contains("ghost@x")));
    assert!(reactor.step(Action::Quit).await.unwrap());
}

#[tokio::test(start_paused = true)]
async fn failed_reconnect_is_retried_after_backoff() {
    let record = Arc::new(Mutex::new(Record::default()));
    let (tx, rx) = mailbox();
    let mut driver = RecordingDriver::new(record.clone());
    driver.failed_reconnects = 1;
    driver.mailbox = Some(tx.clone());

    let reactor = Reactor::new(driver, App::new(Config::default()), rx, tx.clone());
    tx.post(Action::TransportFailure { reason: "reset by peer".into() });

    let started = tokio::time::Instant::now();
    reactor.run().await.unwrap();

    // failure schedules one attempt, that attempt fails and schedules another
    assert_eq!(record.lock().unwrap().reconnects, 2);
    assert!(started.elapsed() >= Duration::from_secs(10));
}
