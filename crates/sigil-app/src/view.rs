//! View state.
//!
//! Process-wide UI state: which conversation is active, how far the message
//! pane is scrolled back, pane sizes, display mode, the notification queue
//! and the input line being composed. Created once from [`crate::Config`]
//! and only mutated by [`crate::App::handle`].

use crate::{
    Address, Config,
    format::{Line, Style, char_width},
};

/// Largest requested log pane height before wrapping back to zero.
pub const MAX_LOG_HEIGHT: u16 = 20;
/// Smallest buddy pane width.
pub const MIN_BUDDY_WIDTH: u16 = 8;
/// Largest buddy pane width before wrapping back to [`MIN_BUDDY_WIDTH`].
pub const MAX_BUDDY_WIDTH: u16 = 40;

const PROMPT: &str = "> ";

/// Pane composition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DisplayMode {
    /// Buddy list beside the message pane.
    BuddyList,
    /// Message pane uses the full width.
    FullScreen,
    /// Full width, unstyled text.
    Raw,
}

impl DisplayMode {
    /// Next mode in the fixed cycle.
    pub fn next(self) -> Self {
        match self {
            Self::BuddyList => Self::FullScreen,
            Self::FullScreen => Self::Raw,
            Self::Raw => Self::BuddyList,
        }
    }
}

/// Navigation direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Nav {
    /// Towards the start of the list, or back in history.
    Up,
    /// Towards the end of the list, or forward to the live tail.
    Down,
}

/// Text being composed on the input line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InputLine {
    buffer: String,
}

impl InputLine {
    /// Current text.
    pub fn buffer(&self) -> &str {
        &self.buffer
    }

    /// Append a character.
    pub fn push(&mut self, c: char) {
        self.buffer.push(c);
    }

    /// Remove the last character.
    pub fn pop(&mut self) {
        self.buffer.pop();
    }

    /// Take the text, leaving the line empty.
    pub fn take(&mut self) -> String {
        std::mem::take(&mut self.buffer)
    }

    /// Prompt plus the tail of the buffer that fits in `width - 1` columns,
    /// leaving room for the cursor.
    pub fn image(&self, width: u16) -> Line {
        let budget = usize::from(width).saturating_sub(1);
        let mut line = Line::raw(PROMPT);
        let room = budget.saturating_sub(line.width());

        let mut tail: Vec<char> = Vec::new();
        let mut used = 0;
        for ch in self.buffer.chars().rev() {
            let w = char_width(ch);
            if used + w > room {
                break;
            }
            used += w;
            tail.push(ch);
        }
        line.push(Style::Default, tail.into_iter().rev().collect::<String>());
        line.truncated(budget)
    }
}

/// UI state owned by the reactor.
#[derive(Debug, Clone)]
pub struct ViewState {
    /// Active conversation, possibly narrowed to a resource.
    pub active: Address,
    /// Previously active conversation, for quick toggling.
    pub last_active: Option<Address>,
    /// Pane-heights scrolled back from the live tail. 0 is the tail.
    pub scrollback: usize,
    /// Pane composition.
    pub mode: DisplayMode,
    /// Requested buddy pane width.
    pub buddy_width: u16,
    /// Requested log pane height.
    pub log_height: u16,
    /// Offline contacts are listed.
    pub show_offline: bool,
    /// Bare addresses with unseen activity, oldest first, no duplicates.
    pub notifications: Vec<String>,
    /// Input line.
    pub input: InputLine,
}

impl ViewState {
    /// Initial view: the self-conversation is active.
    pub fn new(config: &Config) -> Self {
        Self {
            active: config.account.bare_only(),
            last_active: None,
            scrollback: 0,
            mode: DisplayMode::BuddyList,
            buddy_width: config.buddy_width.clamp(MIN_BUDDY_WIDTH, MAX_BUDDY_WIDTH),
            log_height: config.log_height.min(MAX_LOG_HEIGHT),
            show_offline: config.show_offline,
            notifications: Vec::new(),
            input: InputLine::default(),
        }
    }

    /// Queue a notification for `bare` unless already queued.
    pub fn notify(&mut self, bare: &str) {
        if !self.is_notified(bare) {
            self.notifications.push(bare.to_string());
        }
    }

    /// Drop the notification for `bare`.
    pub fn clear_notification(&mut self, bare: &str) {
        self.notifications.retain(|n| n != bare);
    }

    /// Whether `bare` has unseen activity.
    pub fn is_notified(&self, bare: &str) -> bool {
        self.notifications.iter().any(|n| n == bare)
    }

    /// Next log height in the wrapping cycle `0..=MAX_LOG_HEIGHT`.
    pub(crate) fn grow_log(&mut self) {
        self.log_height = if self.log_height >= MAX_LOG_HEIGHT { 0 } else { self.log_height + 1 };
    }

    /// Next buddy width in the wrapping cycle
    /// `MIN_BUDDY_WIDTH..=MAX_BUDDY_WIDTH`.
    pub(crate) fn grow_buddy(&mut self) {
        self.buddy_width = if self.buddy_width >= MAX_BUDDY_WIDTH {
            MIN_BUDDY_WIDTH
        } else {
            self.buddy_width.max(MIN_BUDDY_WIDTH - 1) + 1
        };
    }
}
