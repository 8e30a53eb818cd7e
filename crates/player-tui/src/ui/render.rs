use ratatui::{
    layout::{Constraint, Direction, Layout},
    text::Line,
    widgets::{Block, Borders, Clear, List, ListItem, Paragraph},
};

use player_widget::engine::StreamMode;
use player_widget::view::AudioPlayerWidget;

use super::app::App;

const KEYS_LINE: &str =
    "Space play/pause | r restart | m mute | ←/→ seek | Enter reload | x clear | l logs | q quit";

pub(crate) fn draw(f: &mut ratatui::Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(4),
            Constraint::Length(5),
            Constraint::Min(0),
            Constraint::Length(4),
        ])
        .split(f.area());

    let mode = match app.stream_mode {
        StreamMode::Progressive => "streaming",
        StreamMode::Preload => "preload",
    };
    let loaded = app.controller.source().unwrap_or("<none>").to_string();
    let header = Paragraph::new(vec![
        Line::from(format!(
            "player-tui  →  {}  [{mode}]",
            app.configured_source
        )),
        Line::from(format!("loaded: {loaded}")),
    ])
    .block(Block::default().borders(Borders::ALL).title("Source"));
    f.render_widget(header, chunks[0]);

    // Remember where the player landed so clicks can be routed back.
    app.player_area = chunks[1];
    f.render_widget(
        AudioPlayerWidget::new(&app.label, app.controller.snapshot()),
        chunks[1],
    );

    let footer = Paragraph::new(vec![
        Line::from(format!("status: {}", app.status)),
        Line::from(KEYS_LINE),
    ])
    .block(Block::default().borders(Borders::ALL).title("Status"));
    f.render_widget(footer, chunks[3]);

    if app.logs_open {
        let area = centered_rect(90, 80, f.area());
        f.render_widget(Clear, area);
        let block = Block::default()
            .borders(Borders::ALL)
            .title("Logs (Esc to close, ↑/↓ scroll)");
        let inner = block.inner(area);
        let height = inner.height as usize;
        let end = app.logs.len().saturating_sub(app.logs_scroll);
        let start = end.saturating_sub(height);
        let visible: Vec<ListItem> = app
            .logs
            .iter()
            .skip(start)
            .take(end.saturating_sub(start))
            .cloned()
            .map(ListItem::new)
            .collect();
        let items = if visible.is_empty() {
            vec![ListItem::new("<no logs>")]
        } else {
            visible
        };
        f.render_widget(List::new(items).block(block), area);
    }
}

fn centered_rect(percent_x: u16, percent_y: u16, r: ratatui::layout::Rect) -> ratatui::layout::Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);
    let horizontal = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1]);
    horizontal[1]
}
