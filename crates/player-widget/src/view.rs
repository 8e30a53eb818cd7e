//! The player widget proper: layout, drawing, and click hit-testing.
//!
//! Rendering is pure: the widget draws a [`PlayerSnapshot`] and keeps no
//! state of its own. Hosts render it into a rect, remember that rect, and
//! feed mouse clicks through [`AudioPlayerWidget::hit_test`] on the same
//! rect to get [`PlayerAction`]s back.

use ratatui::buffer::Buffer;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Position, Rect};
use ratatui::text::Line;
use ratatui::widgets::{Block, Borders, Gauge, Paragraph, Widget};

use crate::controller::PlayerSnapshot;
use crate::style::PlayerStyle;

const TOGGLE_COL_WIDTH: u16 = 8;
const REPEAT_TEXT: &str = "[repeat]";
const VOLUME_UP_TEXT: &str = "[vol+]";
const VOLUME_DOWN_TEXT: &str = "[vol-]";

// Below this the body rows degenerate; only the frame is drawn and
// clicks map to nothing.
const MIN_INNER_WIDTH: u16 = 20;
const MIN_INNER_HEIGHT: u16 = 3;

/// Player command produced by a click inside the widget.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PlayerAction {
    TogglePlayPause,
    /// Jump back to the start (and play if paused).
    Restart,
    ToggleMute,
    /// Seek to this fraction of the duration, already clamped to \[0, 1\].
    Seek(f64),
}

/// Terminal rendition of the audio player control.
pub struct AudioPlayerWidget<'a> {
    label: &'a str,
    snapshot: PlayerSnapshot,
    style: PlayerStyle,
}

impl<'a> AudioPlayerWidget<'a> {
    pub fn new(label: &'a str, snapshot: PlayerSnapshot) -> Self {
        Self {
            label,
            snapshot,
            style: PlayerStyle::default(),
        }
    }

    /// Replace the default style table.
    pub fn style(mut self, style: PlayerStyle) -> Self {
        self.style = style;
        self
    }

    /// Map a click to the action for the region it landed on.
    ///
    /// `area` must be the rect the widget was last rendered into. Clicks
    /// on the frame, the label, or dead space return `None`. Clicks on
    /// the progress row seek: left of the bar to the start, at or past
    /// its right edge to the end, otherwise proportionally.
    pub fn hit_test(area: Rect, click: Position) -> Option<PlayerAction> {
        let l = layout(area)?;
        if l.toggle.contains(click) {
            return Some(PlayerAction::TogglePlayPause);
        }
        if l.repeat.contains(click) {
            return Some(PlayerAction::Restart);
        }
        if l.volume.contains(click) {
            return Some(PlayerAction::ToggleMute);
        }
        if l.seek_row.contains(click) {
            return Some(PlayerAction::Seek(seek_fraction(l.bar, click.x)));
        }
        None
    }
}

impl Widget for AudioPlayerWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        Block::default().borders(Borders::ALL).render(area, buf);
        let Some(l) = layout(area) else {
            return;
        };

        Block::default()
            .borders(Borders::RIGHT)
            .render(l.toggle_col, buf);
        let (toggle_text, toggle_style) = if self.snapshot.playing {
            ("pause", self.style.button.patch(self.style.pause))
        } else {
            ("play", self.style.button.patch(self.style.play))
        };
        let toggle_mid = Rect {
            y: l.toggle.y + l.toggle.height / 2,
            height: 1,
            ..l.toggle
        };
        Paragraph::new(Line::from(toggle_text))
            .style(toggle_style)
            .alignment(Alignment::Center)
            .render(toggle_mid, buf);

        Paragraph::new(Line::from(truncate_label(self.label, l.label.width as usize)))
            .style(self.style.label)
            .render(l.label, buf);
        Paragraph::new(Line::from(REPEAT_TEXT))
            .style(self.style.button.patch(self.style.repeat))
            .render(l.repeat, buf);
        let (volume_text, volume_hook) = if self.snapshot.muted {
            (VOLUME_DOWN_TEXT, self.style.volume_down)
        } else {
            (VOLUME_UP_TEXT, self.style.volume_up)
        };
        Paragraph::new(Line::from(volume_text))
            .style(self.style.button.patch(volume_hook))
            .render(l.volume, buf);

        Gauge::default()
            .ratio(self.snapshot.progress() / 100.0)
            .label("")
            .style(self.style.progress_track())
            .gauge_style(self.style.progress)
            .render(l.bar, buf);

        Paragraph::new(Line::from(format_time(self.snapshot.position_secs)))
            .style(self.style.time)
            .render(l.elapsed, buf);
        Paragraph::new(Line::from(format_time(self.snapshot.duration_secs)))
            .style(self.style.time)
            .alignment(Alignment::Right)
            .render(l.total, buf);
    }
}

/// Resolved cell regions of one rendered widget.
struct PlayerLayout {
    /// Toggle column including its separator border.
    toggle_col: Rect,
    /// Clickable interior of the toggle column.
    toggle: Rect,
    label: Rect,
    repeat: Rect,
    volume: Rect,
    /// Whole middle row; any click here is a seek.
    seek_row: Rect,
    /// The gauge itself, inset from `seek_row`.
    bar: Rect,
    elapsed: Rect,
    total: Rect,
}

fn layout(area: Rect) -> Option<PlayerLayout> {
    let inner = Block::default().borders(Borders::ALL).inner(area);
    if inner.width < MIN_INNER_WIDTH || inner.height < MIN_INNER_HEIGHT {
        return None;
    }

    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(TOGGLE_COL_WIDTH), Constraint::Min(10)])
        .split(inner);
    let toggle_col = cols[0];
    let toggle = Block::default().borders(Borders::RIGHT).inner(toggle_col);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .split(cols[1]);

    let controls = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Min(4),
            Constraint::Length(REPEAT_TEXT.len() as u16),
            Constraint::Length(1),
            Constraint::Length(VOLUME_UP_TEXT.len() as u16),
        ])
        .split(rows[0]);

    let bar = Layout::default()
        .direction(Direction::Horizontal)
        .horizontal_margin(1)
        .constraints([Constraint::Min(1)])
        .split(rows[1])[0];

    let times = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(rows[2]);

    Some(PlayerLayout {
        toggle_col,
        toggle,
        label: controls[0],
        repeat: controls[1],
        volume: controls[3],
        seek_row: rows[1],
        bar,
        elapsed: times[0],
        total: times[1],
    })
}

/// Click column to seek fraction. Left of the bar seeks to the start, at
/// or past the right edge to the end.
fn seek_fraction(bar: Rect, x: u16) -> f64 {
    if bar.width == 0 || x < bar.left() {
        0.0
    } else if x >= bar.right() {
        1.0
    } else {
        f64::from(x - bar.left()) / f64::from(bar.width)
    }
}

/// Whole seconds as `M:SS`, e.g. `65` becomes `1:05`. Minutes are not
/// capped, so `3600` becomes `60:00`.
pub fn format_time(secs: u64) -> String {
    let minutes = secs / 60;
    let seconds = secs % 60;
    format!("{minutes}:{seconds:02}")
}

fn truncate_label(label: &str, max: usize) -> String {
    if max == 0 || label.chars().count() <= max {
        return label.to_string();
    }
    if max <= 3 {
        return label.chars().take(max).collect();
    }
    let cut: String = label.chars().take(max - 3).collect();
    format!("{cut}...")
}

#[cfg(test)]
mod tests {
    use super::*;

    const AREA: Rect = Rect {
        x: 0,
        y: 0,
        width: 40,
        height: 5,
    };

    fn snapshot(playing: bool, muted: bool, position_secs: u64, duration_secs: u64) -> PlayerSnapshot {
        PlayerSnapshot {
            playing,
            muted,
            position_secs,
            duration_secs,
        }
    }

    fn render_to_rows(widget: AudioPlayerWidget, area: Rect) -> Vec<String> {
        let mut buf = Buffer::empty(area);
        widget.render(area, &mut buf);
        (area.top()..area.bottom())
            .map(|y| {
                (area.left()..area.right())
                    .map(|x| buf.cell((x, y)).unwrap().symbol().to_string())
                    .collect()
            })
            .collect()
    }

    #[test]
    fn formats_seconds_as_minutes_and_padded_seconds() {
        assert_eq!(format_time(0), "0:00");
        assert_eq!(format_time(9), "0:09");
        assert_eq!(format_time(59), "0:59");
        assert_eq!(format_time(60), "1:00");
        assert_eq!(format_time(65), "1:05");
        assert_eq!(format_time(600), "10:00");
        assert_eq!(format_time(3600), "60:00");
    }

    #[test]
    fn truncates_long_labels() {
        assert_eq!(truncate_label("short", 10), "short");
        assert_eq!(truncate_label("exactly-ten", 11), "exactly-ten");
        assert_eq!(truncate_label("a very long track title", 10), "a very ...");
        assert_eq!(truncate_label("abc", 0), "abc");
        assert_eq!(truncate_label("abcdef", 2), "ab");
    }

    #[test]
    fn truncation_respects_char_boundaries() {
        assert_eq!(truncate_label("übertrack läuft weiter", 10), "übertra...");
    }

    #[test]
    fn paused_player_shows_play_and_volume_up() {
        let rows = render_to_rows(
            AudioPlayerWidget::new("Lesson 1", snapshot(false, false, 0, 205)),
            AREA,
        );
        assert!(rows[2].contains("play"));
        assert!(!rows[2].contains("pause"));
        assert!(rows[1].contains("Lesson 1"));
        assert!(rows[1].contains("[repeat]"));
        assert!(rows[1].contains("[vol+]"));
    }

    #[test]
    fn playing_muted_player_shows_pause_and_volume_down() {
        let rows = render_to_rows(
            AudioPlayerWidget::new("Lesson 1", snapshot(true, true, 42, 205)),
            AREA,
        );
        assert!(rows[2].contains("pause"));
        assert!(rows[1].contains("[vol-]"));
    }

    #[test]
    fn time_row_shows_elapsed_left_and_duration_right() {
        let rows = render_to_rows(
            AudioPlayerWidget::new("x", snapshot(true, false, 42, 205)),
            AREA,
        );
        let elapsed = rows[3].find("0:42").unwrap();
        let total = rows[3].find("3:25").unwrap();
        assert!(elapsed < total);
        // Right-aligned: the duration ends flush against the frame.
        assert!(rows[3].trim_end_matches('│').trim_end().ends_with("3:25"));
    }

    #[test]
    fn long_label_is_cut_to_its_cell() {
        let rows = render_to_rows(
            AudioPlayerWidget::new("Lesson 1 - Greetings and Names", snapshot(false, false, 0, 0)),
            AREA,
        );
        assert!(rows[1].contains("Lesson 1 - G..."));
    }

    #[test]
    fn gauge_fill_tracks_progress() {
        // 42/205 of a 28-cell bar rounds to 6 filled cells.
        let rows = render_to_rows(
            AudioPlayerWidget::new("x", snapshot(true, false, 42, 205)),
            AREA,
        );
        assert!(rows[2].contains(&"█".repeat(6)));
        assert!(!rows[2].contains(&"█".repeat(7)));
        assert!(!rows[2].contains('%'));

        // The gauge keeps a one-cell label slot at the bar's center even
        // with an empty label, so a full bar is 27 blocks around it.
        let full = render_to_rows(
            AudioPlayerWidget::new("x", snapshot(true, false, 205, 205)),
            AREA,
        );
        assert_eq!(full[2].chars().filter(|&c| c == '█').count(), 27);
        assert!(full[2].contains(&"█".repeat(14)));

        let empty = render_to_rows(
            AudioPlayerWidget::new("x", snapshot(false, false, 0, 205)),
            AREA,
        );
        assert!(!empty[2].contains('█'));
    }

    #[test]
    fn tiny_area_renders_frame_only() {
        let rows = render_to_rows(
            AudioPlayerWidget::new("x", snapshot(true, false, 42, 205)),
            Rect::new(0, 0, 10, 3),
        );
        assert!(!rows.concat().contains("play"));
        assert_eq!(
            AudioPlayerWidget::hit_test(Rect::new(0, 0, 10, 3), Position::new(2, 1)),
            None
        );
    }

    #[test]
    fn clicks_map_to_the_widget_regions() {
        assert_eq!(
            AudioPlayerWidget::hit_test(AREA, Position::new(3, 2)),
            Some(PlayerAction::TogglePlayPause)
        );
        assert_eq!(
            AudioPlayerWidget::hit_test(AREA, Position::new(25, 1)),
            Some(PlayerAction::Restart)
        );
        assert_eq!(
            AudioPlayerWidget::hit_test(AREA, Position::new(35, 1)),
            Some(PlayerAction::ToggleMute)
        );
        // Label text and the frame are not buttons.
        assert_eq!(AudioPlayerWidget::hit_test(AREA, Position::new(10, 1)), None);
        assert_eq!(AudioPlayerWidget::hit_test(AREA, Position::new(0, 0)), None);
        assert_eq!(AudioPlayerWidget::hit_test(AREA, Position::new(39, 2)), None);
        // Row 3 (times) is informational.
        assert_eq!(AudioPlayerWidget::hit_test(AREA, Position::new(10, 3)), None);
    }

    #[test]
    fn progress_clicks_seek_proportionally() {
        // The bar spans x 10..38 inside the 40-wide test area.
        assert_eq!(
            AudioPlayerWidget::hit_test(AREA, Position::new(10, 2)),
            Some(PlayerAction::Seek(0.0))
        );
        assert_eq!(
            AudioPlayerWidget::hit_test(AREA, Position::new(24, 2)),
            Some(PlayerAction::Seek(0.5))
        );
        match AudioPlayerWidget::hit_test(AREA, Position::new(37, 2)) {
            Some(PlayerAction::Seek(f)) => assert!(f > 0.9 && f < 1.0),
            other => panic!("expected seek, got {other:?}"),
        }
    }

    #[test]
    fn progress_clicks_clamp_at_the_row_edges() {
        // Inside the row but left of the bar inset: seek to the start.
        assert_eq!(
            AudioPlayerWidget::hit_test(AREA, Position::new(9, 2)),
            Some(PlayerAction::Seek(0.0))
        );
        // At the bar's right edge: seek to the end.
        assert_eq!(
            AudioPlayerWidget::hit_test(AREA, Position::new(38, 2)),
            Some(PlayerAction::Seek(1.0))
        );
    }
}
