//! Style table for the player widget.
//!
//! One entry per visual hook of the control. Hosts override individual
//! entries with struct-update syntax; the widget composes them at draw
//! time (`button` is the base every button patches over), so there is no
//! inheritance to trace through.

use ratatui::style::{Color, Modifier, Style};

/// Styles for every visual hook of the player widget.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PlayerStyle {
    /// Base style shared by all buttons.
    pub button: Style,
    /// Patched over `button` while paused (the "play" affordance).
    pub play: Style,
    /// Patched over `button` while playing (the "pause" affordance).
    pub pause: Style,
    pub repeat: Style,
    /// Volume button while audible.
    pub volume_up: Style,
    /// Volume button while muted.
    pub volume_down: Style,
    /// Filled portion of the progress bar.
    pub progress: Style,
    pub label: Style,
    pub time: Style,
}

impl Default for PlayerStyle {
    fn default() -> Self {
        Self {
            button: Style::default().add_modifier(Modifier::BOLD),
            play: Style::default().fg(Color::Green),
            pause: Style::default().fg(Color::Yellow),
            repeat: Style::default().fg(Color::Cyan),
            volume_up: Style::default().fg(Color::Cyan),
            volume_down: Style::default().fg(Color::DarkGray),
            progress: Style::default().fg(Color::Cyan).bg(Color::DarkGray),
            label: Style::default().add_modifier(Modifier::BOLD),
            time: Style::default().fg(Color::Gray),
        }
    }
}

impl PlayerStyle {
    /// Style for the unfilled remainder of the progress bar. The gauge
    /// draws its fill with the `progress` foreground, so the track uses
    /// the `progress` background on both layers.
    pub fn progress_track(&self) -> Style {
        Style {
            fg: self.progress.bg,
            bg: self.progress.bg,
            ..self.progress
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hooks_override_independently() {
        let styled = PlayerStyle {
            play: Style::default().fg(Color::Magenta),
            ..PlayerStyle::default()
        };
        assert_eq!(styled.play.fg, Some(Color::Magenta));
        assert_eq!(styled.pause, PlayerStyle::default().pause);
        assert_eq!(styled.button, PlayerStyle::default().button);
    }

    #[test]
    fn track_dims_to_progress_background() {
        let style = PlayerStyle::default();
        let track = style.progress_track();
        assert_eq!(track.fg, style.progress.bg);
        assert_eq!(track.bg, style.progress.bg);
    }
}
