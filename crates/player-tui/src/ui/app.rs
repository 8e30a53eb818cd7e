use std::collections::VecDeque;
use std::io;
use std::time::Duration;

use anyhow::{Context, Result};
use crossbeam_channel::{Receiver, unbounded};
use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event as CEvent, KeyCode, KeyEventKind,
    KeyModifiers, MouseButton, MouseEventKind,
};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Position, Rect};

use player_widget::controller::{PlayerConfig, PlayerController, RenderRequest};
use player_widget::engine::StreamMode;
use player_widget::playback::RodioEngineFactory;
use player_widget::view::{self, AudioPlayerWidget, PlayerAction};

use super::render;

const MAX_LOG_LINES: usize = 500;
const SEEK_NUDGE_SECS: i64 = 5;

/// UI state shared between the event loop and the draw pass.
pub(crate) struct App {
    pub(crate) controller: PlayerController,
    /// Source from the command line; Enter rebinds it after `x`.
    pub(crate) configured_source: String,
    pub(crate) label: String,
    pub(crate) stream_mode: StreamMode,
    pub(crate) status: String,
    /// Rect the player was last drawn into, for click routing.
    pub(crate) player_area: Rect,
    pub(crate) logs_open: bool,
    pub(crate) logs: VecDeque<String>,
    pub(crate) logs_scroll: usize,
    render_rx: Receiver<RenderRequest>,
    log_rx: Receiver<String>,
}

/// Launch the TUI and drive it until quit.
pub(crate) fn run_tui(
    source: String,
    label: String,
    mode: StreamMode,
    log_rx: Receiver<String>,
) -> Result<()> {
    let (render_tx, render_rx) = unbounded();
    let config = PlayerConfig {
        stream_mode: mode,
        ..PlayerConfig::default()
    };
    let controller = PlayerController::new(Box::new(RodioEngineFactory), config, render_tx);

    let mut app = App::new(controller, source, label, mode, render_rx, log_rx);
    app.load_source();

    let mut terminal = init_terminal()?;
    let result = ui_loop(&mut terminal, app);
    restore_terminal(&mut terminal)?;
    result
}

impl App {
    fn new(
        controller: PlayerController,
        configured_source: String,
        label: String,
        stream_mode: StreamMode,
        render_rx: Receiver<RenderRequest>,
        log_rx: Receiver<String>,
    ) -> Self {
        Self {
            controller,
            configured_source,
            label,
            stream_mode,
            status: String::new(),
            player_area: Rect::default(),
            logs_open: false,
            logs: VecDeque::new(),
            logs_scroll: 0,
            render_rx,
            log_rx,
        }
    }

    pub(crate) fn load_source(&mut self) {
        self.controller.set_source(Some(&self.configured_source));
        self.status = if self.controller.source().is_some() {
            format!("Loading {}", self.configured_source)
        } else {
            "Could not open audio output (press l for logs)".to_string()
        };
    }

    pub(crate) fn clear_source(&mut self) {
        self.controller.set_source(None);
        self.status = "Source cleared".into();
    }

    /// Turn a "Loading ..." status into a failure notice once the
    /// controller has dropped the session behind our back.
    pub(crate) fn sync_status(&mut self) {
        if self.controller.source().is_none() && self.status.starts_with("Loading ") {
            self.status = "Load failed (press l for logs)".into();
        }
    }

    pub(crate) fn toggle_play_pause(&mut self) {
        if self.controller.source().is_none() {
            self.status = "Nothing loaded".into();
            return;
        }
        let was_playing = self.controller.is_playing();
        self.controller.toggle_play_pause();
        self.status = if was_playing { "Paused" } else { "Playing" }.into();
    }

    pub(crate) fn restart(&mut self) {
        if self.controller.source().is_none() {
            self.status = "Nothing loaded".into();
            return;
        }
        self.controller.restart();
        self.status = "Restarted".into();
    }

    pub(crate) fn toggle_mute(&mut self) {
        if self.controller.source().is_none() {
            self.status = "Nothing loaded".into();
            return;
        }
        self.controller.toggle_mute();
        self.status = if self.controller.is_muted() {
            "Muted"
        } else {
            "Unmuted"
        }
        .into();
    }

    /// Move the playhead by `delta_secs`, clamped to the track bounds.
    pub(crate) fn nudge_seek(&mut self, delta_secs: i64) {
        let duration = self.controller.duration_secs();
        if duration == 0 {
            self.status = "Cannot seek yet".into();
            return;
        }
        let target = self
            .controller
            .position_secs()
            .saturating_add_signed(delta_secs)
            .min(duration);
        self.controller.seek_to(target as f64 / duration as f64);
        self.status = format!("Seek {}", view::format_time(target));
    }

    pub(crate) fn handle_click(&mut self, click: Position) {
        let Some(action) = AudioPlayerWidget::hit_test(self.player_area, click) else {
            return;
        };
        match action {
            PlayerAction::TogglePlayPause => self.toggle_play_pause(),
            PlayerAction::Restart => self.restart(),
            PlayerAction::ToggleMute => self.toggle_mute(),
            PlayerAction::Seek(fraction) => {
                self.controller.seek_to(fraction);
                self.status = format!("Seek {:.0}%", fraction * 100.0);
            }
        }
    }

    pub(crate) fn drain_render_requests(&mut self) -> bool {
        let mut any = false;
        while self.render_rx.try_recv().is_ok() {
            any = true;
        }
        any
    }

    pub(crate) fn drain_logs(&mut self) -> bool {
        let mut any = false;
        while let Ok(line) = self.log_rx.try_recv() {
            self.push_log_line(line);
            any = true;
        }
        any
    }

    pub(crate) fn push_log_line(&mut self, line: String) {
        if self.logs.len() >= MAX_LOG_LINES {
            self.logs.pop_front();
        }
        self.logs.push_back(line);
    }

    pub(crate) fn toggle_logs(&mut self) {
        self.logs_open = !self.logs_open;
        self.logs_scroll = 0;
    }

    /// Scroll one line towards older log entries.
    pub(crate) fn scroll_logs_up(&mut self) {
        if self.logs_scroll + 1 < self.logs.len() {
            self.logs_scroll += 1;
        }
    }

    pub(crate) fn scroll_logs_down(&mut self) {
        self.logs_scroll = self.logs_scroll.saturating_sub(1);
    }
}

fn ui_loop(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>, mut app: App) -> Result<()> {
    let tick = Duration::from_millis(33);
    let mut needs_redraw = true;

    loop {
        app.controller.pump_events();
        app.sync_status();
        if app.drain_render_requests() {
            needs_redraw = true;
        }
        if app.drain_logs() && app.logs_open {
            needs_redraw = true;
        }

        if needs_redraw {
            terminal.draw(|frame| render::draw(frame, &mut app))?;
            needs_redraw = false;
        }

        if !event::poll(tick).context("poll terminal events")? {
            continue;
        }
        needs_redraw = true;
        match event::read().context("read terminal event")? {
            CEvent::Key(key) if key.kind != KeyEventKind::Release => {
                if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
                    return Ok(());
                }
                if app.logs_open {
                    match key.code {
                        KeyCode::Char('q') => return Ok(()),
                        KeyCode::Char('l') | KeyCode::Esc => app.toggle_logs(),
                        KeyCode::Up => app.scroll_logs_up(),
                        KeyCode::Down => app.scroll_logs_down(),
                        _ => {}
                    }
                    continue;
                }
                match key.code {
                    KeyCode::Char('q') => return Ok(()),
                    KeyCode::Char(' ') => app.toggle_play_pause(),
                    KeyCode::Char('r') => app.restart(),
                    KeyCode::Char('m') => app.toggle_mute(),
                    KeyCode::Left => app.nudge_seek(-SEEK_NUDGE_SECS),
                    KeyCode::Right => app.nudge_seek(SEEK_NUDGE_SECS),
                    KeyCode::Enter => app.load_source(),
                    KeyCode::Char('x') => app.clear_source(),
                    KeyCode::Char('l') => app.toggle_logs(),
                    _ => {}
                }
            }
            CEvent::Mouse(mouse) => {
                if let MouseEventKind::Down(MouseButton::Left) = mouse.kind {
                    app.handle_click(Position::new(mouse.column, mouse.row));
                }
            }
            _ => {}
        }
    }
}

fn init_terminal() -> Result<Terminal<CrosstermBackend<io::Stdout>>> {
    enable_raw_mode().context("enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)
        .context("enter alternate screen")?;
    let backend = CrosstermBackend::new(stdout);
    Terminal::new(backend).context("create terminal")
}

fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) -> Result<()> {
    disable_raw_mode().ok();
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )
    .ok();
    terminal.show_cursor().ok();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::bail;
    use crossbeam_channel::Sender;
    use player_widget::engine::{EngineEvent, EngineFactory, PlaybackEngine};

    struct NoDeviceFactory;

    impl EngineFactory for NoDeviceFactory {
        fn open(
            &self,
            _source: &str,
            _mode: StreamMode,
            _events: Sender<EngineEvent>,
        ) -> anyhow::Result<Box<dyn PlaybackEngine>> {
            bail!("no audio device in tests")
        }
    }

    fn test_app() -> App {
        let (render_tx, render_rx) = unbounded();
        let (_log_tx, log_rx) = unbounded();
        let controller = PlayerController::new(
            Box::new(NoDeviceFactory),
            PlayerConfig::default(),
            render_tx,
        );
        App::new(
            controller,
            "lesson.mp3".to_string(),
            "Lesson".to_string(),
            StreamMode::Progressive,
            render_rx,
            log_rx,
        )
    }

    #[test]
    fn failed_open_reports_and_stays_unloaded() {
        let mut app = test_app();
        app.load_source();
        assert!(app.controller.source().is_none());
        assert!(app.status.contains("Could not open audio output"));
    }

    #[test]
    fn transport_keys_without_a_session_explain_themselves() {
        let mut app = test_app();
        app.toggle_play_pause();
        assert_eq!(app.status, "Nothing loaded");
        app.restart();
        assert_eq!(app.status, "Nothing loaded");
        app.toggle_mute();
        assert_eq!(app.status, "Nothing loaded");
    }

    #[test]
    fn seek_nudge_needs_a_known_duration() {
        let mut app = test_app();
        app.nudge_seek(5);
        assert_eq!(app.status, "Cannot seek yet");
    }

    #[test]
    fn set_source_requests_a_render_even_on_failure() {
        let mut app = test_app();
        app.load_source();
        assert!(app.drain_render_requests());
        assert!(!app.drain_render_requests());
    }

    #[test]
    fn clicks_outside_the_player_do_nothing() {
        let mut app = test_app();
        app.player_area = Rect::new(0, 0, 40, 5);
        app.status = "idle".into();
        app.handle_click(Position::new(0, 0));
        assert_eq!(app.status, "idle");
    }

    #[test]
    fn toggle_click_routes_through_hit_test() {
        let mut app = test_app();
        app.player_area = Rect::new(0, 0, 40, 5);
        app.handle_click(Position::new(3, 2));
        // No session is bound, so the click reports instead of playing.
        assert_eq!(app.status, "Nothing loaded");
    }

    #[test]
    fn log_buffer_is_capped() {
        let mut app = test_app();
        for i in 0..(MAX_LOG_LINES + 25) {
            app.push_log_line(format!("line {i}"));
        }
        assert_eq!(app.logs.len(), MAX_LOG_LINES);
        assert_eq!(app.logs.front().map(String::as_str), Some("line 25"));
    }

    #[test]
    fn log_scroll_stays_in_bounds() {
        let mut app = test_app();
        for i in 0..3 {
            app.push_log_line(format!("line {i}"));
        }
        app.scroll_logs_down();
        assert_eq!(app.logs_scroll, 0);
        app.scroll_logs_up();
        app.scroll_logs_up();
        assert_eq!(app.logs_scroll, 2);
        app.scroll_logs_up();
        assert_eq!(app.logs_scroll, 2);
    }
}
