//! Action reactor.
//!
//! The [`Reactor`] is the single consumer of the mailbox. It coordinates:
//! - [`App`]: pure state machine applying one [`Action`] at a time
//! - [`Inbox`]: FIFO of actions posted by independent producers
//! - [`Driver`]: platform-specific rendering and transport I/O
//!
//! Each cycle renders the current state, waits for the next action, applies
//! it and executes the effects it produced. Effects run to completion before
//! the next action is dequeued, so no two transitions ever interleave.

use std::collections::VecDeque;

use crate::{Action, App, Driver, Effect, Inbox, Mailbox};

/// Single-consumer loop applying actions to the owned [`App`].
pub struct Reactor<D: Driver> {
    driver: D,
    app: App,
    inbox: Inbox,
    mailbox: Mailbox,
}

impl<D: Driver> Reactor<D> {
    /// Create a reactor. `mailbox` must post into `inbox`; it is used for
    /// timers the reactor schedules itself.
    pub fn new(driver: D, app: App, inbox: Inbox, mailbox: Mailbox) -> Self {
        Self { driver, app, inbox, mailbox }
    }

    /// Current application state.
    pub fn app(&self) -> &App {
        &self.app
    }

    /// The driver, for inspection after the loop ends.
    pub fn driver(&self) -> &D {
        &self.driver
    }

    /// Run until a [`Action::Quit`] is applied or every mailbox is dropped.
    ///
    /// # Errors
    ///
    /// Returns an error only if rendering fails. Transport and action
    /// failures are reported in conversation history instead.
    pub async fn run(mut self) -> Result<(), D::Error> {
        tracing::info!(account = %self.app.config().account, "reactor started");

        let result = self.run_loop().await;

        self.driver.stop();
        tracing::info!("reactor stopped");
        result
    }

    async fn run_loop(&mut self) -> Result<(), D::Error> {
        loop {
            self.driver.render(&self.app)?;

            let Some(action) = self.inbox.next().await else {
                tracing::debug!("all producers gone");
                return Ok(());
            };

            if self.step(action).await? {
                return Ok(());
            }
        }
    }

    /// Apply one action and execute its effects.
    ///
    /// Returns `true` if the reactor should quit.
    ///
    /// # Errors
    ///
    /// Propagates driver errors that cannot be reported in history.
    pub async fn step(&mut self, action: Action) -> Result<bool, D::Error> {
        let now = self.driver.now();
        let effects = match self.app.handle(action, now) {
            Ok(effects) => effects,
            Err(err) => {
                self.app.record_fault(&err, now);
                return Ok(false);
            },
        };

        let mut pending: VecDeque<Effect> = effects.into();
        while let Some(effect) = pending.pop_front() {
            match effect {
                Effect::Send(message) => {
                    tracing::debug!(to = %message.to, id = %message.id, "sending");
                    if let Err(err) = self.driver.send(message.clone()).await {
                        let now = self.driver.now();
                        self.app.send_failed(&message, &err.to_string(), now);
                    }
                },
                Effect::Disconnect => {
                    tracing::info!("disconnecting");
                    self.driver.disconnect().await;
                },
                Effect::Reconnect => {
                    tracing::info!("reconnecting");
                    if let Err(err) = self.driver.reconnect().await {
                        let now = self.driver.now();
                        pending.extend(self.app.reconnect_failed(&err.to_string(), now));
                    }
                },
                Effect::ScheduleReconnect(delay) => {
                    tracing::debug!(?delay, "reconnect scheduled");
                    self.mailbox.post_after(delay, Action::Reconnect);
                },
                Effect::Quit => return Ok(true),
            }
        }

        Ok(false)
    }
}
