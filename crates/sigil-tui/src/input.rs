//! Terminal input producer.
//!
//! Translates crossterm events into [`Action`]s through one flat dispatch
//! table and posts them to the reactor's mailbox. Holds no state of its own:
//! the input line lives in the application state.

use crossterm::event::{Event, EventStream, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use futures::StreamExt;
use sigil_app::{Action, Mailbox, Nav};
use tokio::task::JoinHandle;

/// Map one key press to an action.
pub fn keymap(key: KeyEvent) -> Option<Action> {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);

    let action = match (key.code, ctrl) {
        (KeyCode::Char('c'), true) | (KeyCode::Esc, _) => Action::Quit,
        (KeyCode::Char('p'), true) | (KeyCode::Up, _) => Action::NavigateBuddyList(Nav::Up),
        (KeyCode::Char('n'), true) | (KeyCode::Down, _) => Action::NavigateBuddyList(Nav::Down),
        (KeyCode::Char('l'), true) => Action::ToggleLastActive,
        (KeyCode::PageUp, _) => Action::NavigateMessages(Nav::Up),
        (KeyCode::PageDown, _) => Action::NavigateMessages(Nav::Down),
        (KeyCode::F(1), _) => Action::ToggleShowOffline,
        (KeyCode::F(2), _) => Action::AdjustLogHeight,
        (KeyCode::F(3), _) => Action::AdjustBuddyWidth,
        (KeyCode::F(4), _) => Action::CycleDisplayMode,
        (KeyCode::Tab, _) => Action::ToggleExpand,
        (KeyCode::Enter, _) => Action::Submit,
        (KeyCode::Backspace, _) => Action::Backspace,
        (KeyCode::Char(c), false) => Action::InsertChar(c),
        _ => return None,
    };

    Some(action)
}

/// Map one terminal event to an action.
pub fn translate(event: &Event) -> Option<Action> {
    match event {
        Event::Key(key) if key.kind == KeyEventKind::Press => keymap(*key),
        Event::Resize(..) => Some(Action::Redraw),
        _ => None,
    }
}

/// Spawn the terminal reader task.
///
/// Runs until the event stream ends, a read fails, or the reactor drops its
/// inbox.
pub fn spawn_reader(mailbox: Mailbox) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut events = EventStream::new();

        while let Some(event) = events.next().await {
            let event = match event {
                Ok(event) => event,
                Err(e) => {
                    tracing::error!("terminal read failed: {e}");
                    mailbox.post(Action::Quit);
                    break;
                },
            };

            if let Some(action) = translate(&event)
                && !mailbox.post(action)
            {
                break;
            }
        }

        tracing::debug!("terminal reader stopped");
    })
}
