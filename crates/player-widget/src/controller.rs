//! Playback controller: owns the active session and reduces engine events.
//!
//! Commands never fail. With no active session every command is a no-op and
//! every query reports the unloaded defaults (paused, unmuted, position 0,
//! duration 0). Load failures are absorbed at the session boundary and fold
//! the widget back to the unloaded state.

use std::time::Duration;

use crossbeam_channel::{Receiver, Sender, unbounded};

use crate::engine::{EngineEvent, EngineFactory, PlaybackEngine, StreamMode};
use crate::poll::RenderPoll;

/// Wakeup message asking the host to redraw.
///
/// Carries no payload: the renderer re-reads the controller on every pass.
#[derive(Clone, Copy, Debug)]
pub struct RenderRequest;

/// Tuning knobs for a controller instance.
#[derive(Clone, Copy, Debug)]
pub struct PlayerConfig {
    /// Cadence of render requests while playing.
    pub poll_interval: Duration,
    /// How sessions acquire media bytes.
    pub stream_mode: StreamMode,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(500),
            stream_mode: StreamMode::Progressive,
        }
    }
}

/// Point-in-time view of the observable playback state.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PlayerSnapshot {
    pub playing: bool,
    pub muted: bool,
    /// Position rounded to whole seconds.
    pub position_secs: u64,
    /// Duration rounded to whole seconds, 0 while unknown.
    pub duration_secs: u64,
}

impl PlayerSnapshot {
    /// Progress-bar fill in percent.
    ///
    /// 0 at position 0, 100 once the position has reached (or passed) the
    /// duration, the plain ratio in between. A zero duration can therefore
    /// only ever report 0 or 100.
    pub fn progress(&self) -> f64 {
        if self.position_secs == 0 {
            0.0
        } else if self.position_secs >= self.duration_secs {
            100.0
        } else {
            (self.position_secs as f64 / self.duration_secs as f64) * 100.0
        }
    }
}

struct Session {
    source: String,
    engine: Box<dyn PlaybackEngine>,
    events: Receiver<EngineEvent>,
}

/// Owns at most one playback session and the re-render poll for it.
pub struct PlayerController {
    factory: Box<dyn EngineFactory>,
    config: PlayerConfig,
    render_tx: Sender<RenderRequest>,
    session: Option<Session>,
    poll: Option<RenderPoll>,
}

impl PlayerController {
    pub fn new(
        factory: Box<dyn EngineFactory>,
        config: PlayerConfig,
        render_tx: Sender<RenderRequest>,
    ) -> Self {
        Self {
            factory,
            config,
            render_tx,
            session: None,
            poll: None,
        }
    }

    /// Currently assigned media source, if any.
    pub fn source(&self) -> Option<&str> {
        self.session.as_ref().map(|s| s.source.as_str())
    }

    /// Replace (or clear) the media source.
    ///
    /// Any previous session is released first, even when the source string
    /// is unchanged. A factory failure leaves the controller unloaded.
    pub fn set_source(&mut self, source: Option<&str>) {
        self.release_session();
        if let Some(url) = source {
            let (event_tx, event_rx) = unbounded();
            match self.factory.open(url, self.config.stream_mode, event_tx) {
                Ok(engine) => {
                    tracing::debug!("opened session for {url}");
                    self.session = Some(Session {
                        source: url.to_string(),
                        engine,
                        events: event_rx,
                    });
                }
                Err(e) => {
                    tracing::warn!("unable to open {url}: {e:#}");
                }
            }
        }
        self.request_render();
    }

    pub fn toggle_play_pause(&mut self) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        if session.engine.playing() {
            session.engine.pause();
            self.cancel_poll();
        } else {
            session.engine.play();
        }
        self.request_render();
    }

    /// Seek to the beginning; resumes playback when paused.
    pub fn restart(&mut self) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        session.engine.seek(Duration::ZERO);
        if !session.engine.playing() {
            session.engine.play();
        }
        self.request_render();
    }

    pub fn toggle_mute(&mut self) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        let muted = session.engine.muted();
        session.engine.set_muted(!muted);
        self.request_render();
    }

    /// Seek to a fraction of the duration.
    ///
    /// The fraction is clamped to [0, 1]; non-finite input behaves as 0.
    /// The target is rounded to whole seconds.
    pub fn seek_to(&mut self, fraction: f64) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        let fraction = if fraction.is_finite() {
            fraction.clamp(0.0, 1.0)
        } else {
            0.0
        };
        let duration = session.engine.duration().as_secs_f64();
        let target = (duration * fraction).round() as u64;
        session.engine.seek(Duration::from_secs(target));
        self.request_render();
    }

    pub fn is_playing(&self) -> bool {
        self.session
            .as_ref()
            .map(|s| s.engine.playing())
            .unwrap_or(false)
    }

    pub fn is_muted(&self) -> bool {
        self.session
            .as_ref()
            .map(|s| s.engine.muted())
            .unwrap_or(false)
    }

    pub fn position_secs(&self) -> u64 {
        self.session
            .as_ref()
            .map(|s| round_secs(s.engine.position().as_secs_f64()))
            .unwrap_or(0)
    }

    pub fn duration_secs(&self) -> u64 {
        self.session
            .as_ref()
            .map(|s| round_secs(s.engine.duration().as_secs_f64()))
            .unwrap_or(0)
    }

    pub fn snapshot(&self) -> PlayerSnapshot {
        PlayerSnapshot {
            playing: self.is_playing(),
            muted: self.is_muted(),
            position_secs: self.position_secs(),
            duration_secs: self.duration_secs(),
        }
    }

    /// Reduce pending engine events and retire the poll once playback has
    /// stopped on its own. Call once per host loop iteration.
    pub fn pump_events(&mut self) {
        let pending: Vec<EngineEvent> = match &self.session {
            Some(session) => session.events.try_iter().collect(),
            None => return,
        };
        for event in pending {
            self.apply_event(event);
        }
        if self.poll.is_some() && !self.is_playing() {
            self.cancel_poll();
        }
    }

    fn apply_event(&mut self, event: EngineEvent) {
        match event {
            EngineEvent::Started => {
                tracing::debug!("playback started");
                self.restart_poll();
                self.request_render();
            }
            EngineEvent::Loaded => {
                tracing::debug!("source loaded");
                self.request_render();
            }
            EngineEvent::LoadFailed { reason } => {
                tracing::warn!("load failed: {reason}");
                self.release_session();
                self.request_render();
            }
        }
    }

    fn release_session(&mut self) {
        self.cancel_poll();
        if let Some(mut session) = self.session.take() {
            tracing::debug!("released session for {}", session.source);
            session.engine.unload();
        }
    }

    fn restart_poll(&mut self) {
        self.cancel_poll();
        self.poll = Some(RenderPoll::spawn(
            self.config.poll_interval,
            self.render_tx.clone(),
        ));
    }

    fn cancel_poll(&mut self) {
        if let Some(mut poll) = self.poll.take() {
            poll.cancel();
        }
    }

    fn request_render(&self) {
        let _ = self.render_tx.send(RenderRequest);
    }
}

impl Drop for PlayerController {
    fn drop(&mut self) {
        self.release_session();
    }
}

/// Round seconds to the nearest whole second, normalizing non-finite input
/// to 0.
fn round_secs(seconds: f64) -> u64 {
    if seconds.is_finite() {
        seconds.round().max(0.0) as u64
    } else {
        0
    }
}
