//! UI painting
//!
//! Converts the [`sigil_app::layout`] image into ratatui text. All layout
//! decisions are made by the layout engine; this module only maps abstract
//! styles onto terminal attributes and places the cursor.

use chrono::{DateTime, Utc};
use ratatui::{
    Frame,
    layout::Position,
    style::{Color, Modifier},
    text::{Line, Span, Text},
    widgets::Paragraph,
};
use sigil_app::{App, Style, layout};

/// Terminal attributes for an abstract style.
pub fn style(style: Style) -> ratatui::style::Style {
    match style {
        Style::Default => ratatui::style::Style::default(),
        Style::Highlighted => {
            ratatui::style::Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)
        },
        Style::Emphasized => ratatui::style::Style::default().add_modifier(Modifier::REVERSED),
    }
}

fn line(row: &sigil_app::Line) -> Line<'static> {
    Line::from(
        row.spans
            .iter()
            .map(|span| Span::styled(span.text.clone(), style(span.style)))
            .collect::<Vec<_>>(),
    )
}

/// Render the entire UI.
pub fn render(frame: &mut Frame, app: &App, now: DateTime<Utc>) {
    let area = frame.area();
    let input = app.view().input.image(area.width);
    let rendered = layout::render((area.width, area.height), &input, app, now);

    let text = Text::from(rendered.image.iter().map(line).collect::<Vec<_>>());
    frame.render_widget(Paragraph::new(text), area);

    let column = rendered.cursor.min(area.width.saturating_sub(1));
    frame.set_cursor_position(Position::new(
        area.x.saturating_add(column),
        area.bottom().saturating_sub(1),
    ));
}
