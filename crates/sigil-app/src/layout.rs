//! Layout engine.
//!
//! [`render`] is a pure function from terminal size, input line image and
//! application state to a full-screen [`Image`] plus the cursor column. It
//! never mutates state; the terminal shell only paints what it returns.
//!
//! ```text
//! +--------+-+------------------------------+
//! | buddy  |||  message pane                |  main rows
//! +--------+-+------------------------------+
//! | -- conversation separator ------------- |
//! | -- status line ------------------------ |  hidden when the
//! | log pane                                |  log pane collapses
//! | > input                                 |
//! +-----------------------------------------+
//! ```

use chrono::{DateTime, Utc};

use crate::{
    App, ColorTag, Conversation, ConversationKind, DisplayMode, Presence, Verification,
    format::{Line, Style, format_log, format_message, wrap},
};

/// Text shown when the terminal is too small for the full layout.
pub const PLACEHOLDER: &str = "Need more space";

const MIN_CHAT_WIDTH: u16 = 21;
const MIN_MAIN_HEIGHT: u16 = 5;
const RULE: char = '-';
const BUDDY_SEPARATOR: &str = "|";

/// Rows of styled text, top to bottom.
pub type Image = Vec<Line>;

/// Output of [`render`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rendered {
    /// Rows to paint. Full layouts have exactly one row per terminal row.
    pub image: Image,
    /// Cursor column on the last row.
    pub cursor: u16,
}

/// Pane geometry derived from the terminal size and view state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Panes {
    width: usize,
    main: usize,
    log: usize,
    collapsed: bool,
    buddy: usize,
    chat: usize,
}

impl Panes {
    fn compute(app: &App, (width, height): (u16, u16)) -> Option<Self> {
        let view = app.view();

        let collapsed = view.log_height.saturating_add(10) > height;
        let (log, main) = if collapsed {
            (0, height.saturating_sub(2))
        } else {
            (view.log_height, height.saturating_sub(view.log_height).saturating_sub(3))
        };

        let (buddy, chat) = match view.mode {
            DisplayMode::BuddyList => {
                (view.buddy_width, width.saturating_sub(view.buddy_width).saturating_sub(1))
            },
            DisplayMode::FullScreen | DisplayMode::Raw => (0, width),
        };

        if main < MIN_MAIN_HEIGHT || chat < MIN_CHAT_WIDTH {
            return None;
        }

        Some(Self {
            width: usize::from(width),
            main: usize::from(main),
            log: usize::from(log),
            collapsed,
            buddy: usize::from(buddy),
            chat: usize::from(chat),
        })
    }
}

/// Compose the terminal image for `app`.
pub fn render(size: (u16, u16), input: &Line, app: &App, now: DateTime<Utc>) -> Rendered {
    let Some(panes) = Panes::compute(app, size) else {
        return Rendered { image: vec![Line::raw(PLACEHOLDER)], cursor: 1 };
    };

    let raw = app.view().mode == DisplayMode::Raw;
    let chat = message_pane(app, &panes, now);
    let chat: Vec<Line> = if raw { chat.iter().map(Line::unstyled).collect() } else { chat };

    let mut image = Image::with_capacity(usize::from(size.1));
    if app.view().mode == DisplayMode::BuddyList {
        let buddies = buddy_pane(app, &panes);
        for (buddy, message) in buddies.into_iter().zip(chat) {
            let mut row = buddy;
            row.push(Style::Default, BUDDY_SEPARATOR);
            row.extend(message.fit(panes.chat));
            image.push(row);
        }
    } else {
        image.extend(chat.into_iter().map(|row| row.fit(panes.chat)));
    }

    image.push(conversation_separator(app, panes.width));
    if !panes.collapsed {
        image.push(status_line(app, panes.width));
        let log = log_pane(app, &panes, now);
        image.extend(log.into_iter().map(|row| if raw { row.unstyled() } else { row }));
    }

    let input = input.truncated(panes.width);
    let cursor = u16::try_from(input.width()).unwrap_or(u16::MAX);
    image.push(input.fit(panes.width));

    Rendered { image, cursor }
}

/// First visible row of the buddy window.
///
/// The window of `min(height, len)` rows is centered on `active` and
/// clamped so it never runs past either end of the list.
pub fn buddy_window(active: usize, height: usize, len: usize) -> usize {
    let shown = height.min(len);
    active.saturating_sub(height / 2).min(len - shown)
}

fn buddy_pane(app: &App, panes: &Panes) -> Vec<Line> {
    let visible = app.visible();
    let active = app.active_index(&visible).unwrap_or(0);
    let start = buddy_window(active, panes.main, visible.len());

    let mut rows: Vec<Line> = visible
        .iter()
        .enumerate()
        .skip(start)
        .take(panes.main)
        .map(|(idx, address)| {
            let Some(conv) = app.contacts().get(&address.bare) else {
                return Line::default().fit(panes.buddy);
            };
            let presence = if app.contacts().is_self(&conv.bare) {
                app.contacts().own_presence()
            } else {
                conv.presence_of(address.resource()).0
            };
            let label = match address.resource() {
                Some(resource) => format!("  {}{resource}", presence.glyph()),
                None => format!("{}{}", presence.glyph(), conv.bare),
            };

            let style = if idx == active {
                Style::Emphasized
            } else if app.view().is_notified(&conv.bare) {
                Style::Highlighted
            } else {
                color_style(conv)
            };
            Line::styled(style, label).fit(panes.buddy)
        })
        .collect();

    rows.resize_with(panes.main, || Line::default().fit(panes.buddy));
    rows
}

fn color_style(conv: &Conversation) -> Style {
    match conv.color {
        ColorTag::Default => Style::Default,
        ColorTag::Good => Style::Highlighted,
        ColorTag::Bad => Style::Emphasized,
    }
}

/// Formatted, wrapped and cropped rows of the active conversation.
fn message_pane(app: &App, panes: &Panes, now: DateTime<Utc>) -> Vec<Line> {
    let offset = app.config().tz_offset;
    let active = &app.view().active;

    let rows: Vec<Line> = match app.active_conversation() {
        None => Vec::new(),
        Some(conv) if app.contacts().is_self(&conv.bare) => conv
            .history
            .iter()
            .flat_map(|entry| wrap(&format_log(offset, now, entry), panes.chat))
            .collect(),
        Some(conv) => {
            let focus = match &conv.kind {
                ConversationKind::User { .. } => {
                    active.resource().filter(|r| conv.session(r).is_some())
                },
                ConversationKind::Room { .. } => None,
            };
            let only = active.resource().filter(|_| conv.expanded);

            conv.history
                .iter()
                .filter(|m| match only {
                    Some(resource) => {
                        let implied = m.direction.resource();
                        implied == Some(resource) || (m.is_local() && implied.is_none())
                    },
                    None => true,
                })
                .flat_map(|m| wrap(&format_message(offset, now, conv, focus, m), panes.chat))
                .collect()
        },
    };

    crop(rows, panes.main, app.view().scrollback)
}

/// Bottom-aligned viewport of `height` rows, `scrollback` pages above the
/// tail. Short content is padded at the top.
fn crop(rows: Vec<Line>, height: usize, scrollback: usize) -> Vec<Line> {
    let end = rows.len().saturating_sub(scrollback.saturating_mul(height));
    let start = end.saturating_sub(height);

    let mut out = vec![Line::default(); height - (end - start)];
    out.extend(rows.into_iter().skip(start).take(end - start));
    out
}

fn log_pane(app: &App, panes: &Panes, now: DateTime<Utc>) -> Vec<Line> {
    let offset = app.config().tz_offset;
    let rows: Vec<Line> = app
        .contacts()
        .own()
        .map(|own| {
            own.history
                .iter()
                .flat_map(|entry| wrap(&format_log(offset, now, entry), panes.width))
                .collect()
        })
        .unwrap_or_default();

    crop(rows, panes.log, 0).into_iter().map(|row| row.fit(panes.width)).collect()
}

/// Badge for the channel of the active session, or a member count for
/// rooms.
fn badge(app: &App, conv: &Conversation) -> (Style, String) {
    match &conv.kind {
        ConversationKind::Room { members, .. } => {
            (Style::Default, format!("[{} members]", members.len()))
        },
        ConversationKind::User { .. } => {
            let session = app
                .view()
                .active
                .resource()
                .and_then(|r| conv.session(r))
                .or_else(|| conv.best_session());
            let channel = session.map(|s| s.channel.clone()).unwrap_or_default();
            match app.contacts().trust().verify(&conv.bare, &channel) {
                Verification::NoChannel => (Style::Default, "[plain]".into()),
                Verification::UnverifiedFingerprint => (Style::Highlighted, "[unverified]".into()),
                Verification::VerifiedFingerprint => (Style::Highlighted, "[verified]".into()),
                Verification::FingerprintMismatch => (Style::Emphasized, "[MISMATCH]".into()),
            }
        },
    }
}

fn conversation_separator(app: &App, width: usize) -> Line {
    let active = &app.view().active;
    let mut line = Line::raw(format!("-- {active} "));

    match app.active_conversation() {
        Some(conv) if app.contacts().is_self(&conv.bare) => {
            line.push(Style::Default, "[log] ");
        },
        Some(conv) => {
            let (style, badge) = badge(app, conv);
            line.push(style, badge);
            let (presence, status) = conv.presence_of(active.resource());
            line.push(Style::Default, format!(" {}", presence_text(presence, status)));
        },
        None => {},
    }

    fill(line, width)
}

fn status_line(app: &App, width: usize) -> Line {
    let contacts = app.contacts();
    let mut line = Line::raw(format!("-- {} {} ", contacts.account(), contacts.own_presence()));

    let notified = &app.view().notifications;
    if !notified.is_empty() {
        line.push(Style::Highlighted, format!("[act: {}]", notified.join(", ")));
        line.push(Style::Default, " ");
    }

    fill(line, width)
}

fn presence_text(presence: Presence, status: &str) -> String {
    if status.is_empty() { format!("{presence} ") } else { format!("{presence}: {status} ") }
}

/// Pad with the rule character to exactly `width`. No filler when the text
/// already reaches the edge.
fn fill(line: Line, width: usize) -> Line {
    let mut out = line.truncated(width);
    let filler = width.saturating_sub(out.width());
    if filler > 0 {
        out.push(Style::Default, RULE.to_string().repeat(filler));
    }
    out
}
