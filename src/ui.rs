use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
};

use crate::{map_draw::Cursor, state::AppState};

pub const MAP_TITLE: &str = " Forest Cover of India ";

pub fn draw(f: &mut Frame, state: &mut AppState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(3), Constraint::Length(1)])
        .split(f.area());

    // map
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(Span::styled(MAP_TITLE, Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)));
    let inner = block.inner(chunks[0]);
    f.render_widget(block, chunks[0]);

    state.attach_map(inner);
    state.surface.render(f, state.selection());
    if state.panel_visible() {
        let panel = &state.panel;
        state.surface.render_popup(f, |f, area| panel.draw(f, area));
    }

    // status bar
    let pointer = match state.surface.cursor() {
        Cursor::Pointer => Span::styled(" ● ", Style::default().fg(Color::Yellow)),
        Cursor::Default => Span::raw("   "),
    };
    let selected = state
        .selection()
        .map(|s| format!("[{s}] "))
        .unwrap_or_default();
    let status = Line::from(vec![
        pointer,
        Span::styled(selected, Style::default().fg(Color::Red)),
        Span::raw(state.status.as_str()),
    ]);
    f.render_widget(Paragraph::new(status), chunks[1]);
}
