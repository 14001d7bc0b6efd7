//! Message and log formatting.
//!
//! Pure functions mapping a history entry plus context (current time,
//! timezone offset, conversation kind, focused resource) to a styled
//! [`Line`]. Nothing here touches application state.

use chrono::{DateTime, FixedOffset, Utc};
use unicode_width::UnicodeWidthChar;

use crate::{Conversation, ConversationKind, Direction, Message};

/// Abstract style attribute. The terminal shell decides what each looks like.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Style {
    /// Plain text.
    #[default]
    Default,
    /// Draws attention (inbound traffic, unread markers).
    Highlighted,
    /// Strongest emphasis (selection, trust failures).
    Emphasized,
}

/// A run of text sharing one style.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Span {
    /// Style of the run.
    pub style: Style,
    /// Text of the run.
    pub text: String,
}

/// One row of styled text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Line {
    /// Spans, left to right.
    pub spans: Vec<Span>,
}

impl Line {
    /// Line holding a single span.
    pub fn styled(style: Style, text: impl Into<String>) -> Self {
        let mut line = Self::default();
        line.push(style, text);
        line
    }

    /// Line of plain text.
    pub fn raw(text: impl Into<String>) -> Self {
        Self::styled(Style::Default, text)
    }

    /// Append a span. Empty text is dropped.
    pub fn push(&mut self, style: Style, text: impl Into<String>) {
        let text = text.into();
        if text.is_empty() {
            return;
        }
        match self.spans.last_mut() {
            Some(last) if last.style == style => last.text.push_str(&text),
            _ => self.spans.push(Span { style, text }),
        }
    }

    /// Append every span of `other`.
    pub fn extend(&mut self, other: Line) {
        for span in other.spans {
            self.push(span.style, span.text);
        }
    }

    /// Display width in terminal columns.
    pub fn width(&self) -> usize {
        self.spans.iter().flat_map(|s| s.text.chars()).map(char_width).sum()
    }

    /// Concatenated text without styles.
    pub fn text(&self) -> String {
        self.spans.iter().map(|s| s.text.as_str()).collect()
    }

    /// Same text with every span reset to [`Style::Default`].
    pub fn unstyled(&self) -> Self {
        Self::raw(self.text())
    }

    /// Cut to at most `width` columns.
    pub fn truncated(&self, width: usize) -> Self {
        let mut out = Self::default();
        let mut used = 0;
        for span in &self.spans {
            let mut text = String::new();
            for ch in span.text.chars() {
                let w = char_width(ch);
                if used + w > width {
                    out.push(span.style, text);
                    return out;
                }
                used += w;
                text.push(ch);
            }
            out.push(span.style, text);
        }
        out
    }

    /// Truncate, then pad with spaces to exactly `width` columns.
    pub fn fit(&self, width: usize) -> Self {
        let mut out = self.truncated(width);
        let pad = width.saturating_sub(out.width());
        out.push(Style::Default, " ".repeat(pad));
        out
    }
}

/// Display width of a single character; control characters count as zero.
pub(crate) fn char_width(ch: char) -> usize {
    ch.width().unwrap_or(0)
}

/// Hard-wrap a line into rows of at most `width` columns.
///
/// Embedded newlines start a new row. Always returns at least one row.
pub fn wrap(line: &Line, width: usize) -> Vec<Line> {
    let mut rows = vec![Line::default()];
    let mut used = 0;

    for span in &line.spans {
        for ch in span.text.chars() {
            if ch == '\n' {
                rows.push(Line::default());
                used = 0;
                continue;
            }
            let w = char_width(ch);
            if used > 0 && used + w > width {
                rows.push(Line::default());
                used = 0;
            }
            if let Some(row) = rows.last_mut() {
                row.push(span.style, ch.to_string());
            }
            used += w;
        }
    }
    rows
}

/// Timestamp prefix: `HH:MM:SS ` on the same calendar day as `now` in
/// `offset`, `MM-DD HH:MM ` otherwise.
pub fn timestamp(offset: FixedOffset, now: DateTime<Utc>, at: DateTime<Utc>) -> String {
    let local_now = now.with_timezone(&offset);
    let local_at = at.with_timezone(&offset);

    if local_now.date_naive() == local_at.date_naive() {
        local_at.format("%H:%M:%S ").to_string()
    } else {
        local_at.format("%m-%d %H:%M ").to_string()
    }
}

/// Render a log entry: timestamp, directional marker, body.
pub fn format_log(offset: FixedOffset, now: DateTime<Utc>, entry: &Message) -> Line {
    let (style, marker) = match &entry.direction {
        Direction::From(addr) => (Style::Highlighted, format!("{addr}:")),
        Direction::Local { label: None, .. } => (Style::Default, "***".to_string()),
        Direction::Local { label: Some(label), .. } => {
            (Style::Default, format!("*** {label} ***"))
        },
        Direction::To { .. } => (Style::Default, ">>>".to_string()),
    };

    let mut line = Line::raw(timestamp(offset, now, entry.timestamp));
    line.push(style, marker);
    line.push(Style::Default, " ");
    line.push(Style::Default, entry.body.clone());
    line
}

/// Render a conversation message.
///
/// `resource` is the resource in focus, if any; the message's own resource
/// is annotated only when it differs from the focused one.
pub fn format_message(
    offset: FixedOffset,
    now: DateTime<Utc>,
    conversation: &Conversation,
    resource: Option<&str>,
    message: &Message,
) -> Line {
    let (style, prefix) = match (&conversation.kind, &message.direction) {
        (ConversationKind::Room { .. }, Direction::From(addr)) => match addr.resource() {
            Some(nick) => (Style::Highlighted, format!("{nick}: ")),
            None => (Style::Highlighted, " ".to_string()),
        },
        (ConversationKind::Room { .. }, Direction::Local { label, .. }) => {
            (Style::Default, format!("***{} ", label.as_deref().unwrap_or_default()))
        },
        (ConversationKind::Room { .. }, Direction::To { .. }) => {
            let prefix = if message.received { "-> " } else { "?> " };
            (Style::Default, prefix.to_string())
        },
        (ConversationKind::User { .. }, Direction::From(_)) => {
            (Style::Highlighted, format!("<{}- ", encryption_glyph(message)))
        },
        (ConversationKind::User { .. }, Direction::To { .. }) => {
            let confirm = if message.received { '-' } else { '?' };
            (Style::Default, format!("{confirm}{}> ", encryption_glyph(message)))
        },
        (ConversationKind::User { .. }, Direction::Local { label: None, .. }) => {
            (Style::Default, "*** ".to_string())
        },
        (ConversationKind::User { .. }, Direction::Local { label: Some(label), .. }) => {
            (Style::Default, format!("***{label}*** "))
        },
    };

    let mut line = Line::raw(timestamp(offset, now, message.timestamp));
    line.push(style, prefix);
    if let (Some(focus), Some(own)) = (resource, message.direction.resource())
        && focus != own
    {
        line.push(Style::Default, format!("({own}) "));
    }
    line.push(style, message.body.clone());
    line
}

fn encryption_glyph(message: &Message) -> char {
    if message.encrypted { 'O' } else { '-' }
}
