//! Rodio-backed playback engine.
//!
//! Opening an engine grabs the default output device and a paused sink,
//! then hands the slow work (fetch, decode) to a loader thread. The loader
//! reports back over the session's event channel, so a fetch or decode
//! failure arrives as [`EngineEvent::LoadFailed`] instead of poisoning
//! construction.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result};
use crossbeam_channel::Sender;
use rodio::{Decoder, OutputStream, Sink, Source};

use crate::engine::{EngineEvent, EngineFactory, PlaybackEngine, StreamMode};
use crate::source;

/// Opens one [`RodioEngine`] per session.
pub struct RodioEngineFactory;

impl EngineFactory for RodioEngineFactory {
    fn open(
        &self,
        source: &str,
        mode: StreamMode,
        events: Sender<EngineEvent>,
    ) -> Result<Box<dyn PlaybackEngine>> {
        Ok(Box::new(RodioEngine::open(source, mode, events)?))
    }
}

pub struct RodioEngine {
    sink: Arc<Sink>,
    muted: bool,
    /// Total duration in ms, written once by the loader. 0 while unknown.
    duration_ms: Arc<AtomicU64>,
    cancelled: Arc<AtomicBool>,
    events: Sender<EngineEvent>,
    // Keeps the output device alive for the lifetime of the engine.
    _stream: OutputStream,
}

impl RodioEngine {
    /// Open the default output device and start loading `source`.
    pub fn open(source: &str, mode: StreamMode, events: Sender<EngineEvent>) -> Result<Self> {
        let (stream, handle) =
            OutputStream::try_default().context("open default audio output device")?;
        let sink = Sink::try_new(&handle).context("create audio sink")?;
        // Sessions start paused; the controller decides when to play.
        sink.pause();
        let sink = Arc::new(sink);

        let duration_ms = Arc::new(AtomicU64::new(0));
        let cancelled = Arc::new(AtomicBool::new(false));

        thread::spawn({
            let source = source.to_string();
            let sink = sink.clone();
            let duration_ms = duration_ms.clone();
            let cancelled = cancelled.clone();
            let events = events.clone();
            move || load_source(&source, mode, &sink, &duration_ms, &cancelled, &events)
        });

        Ok(Self {
            sink,
            muted: false,
            duration_ms,
            cancelled,
            events,
            _stream: stream,
        })
    }
}

fn load_source(
    source: &str,
    mode: StreamMode,
    sink: &Sink,
    duration_ms: &AtomicU64,
    cancelled: &AtomicBool,
    events: &Sender<EngineEvent>,
) {
    let input = match source::open(source, mode) {
        Ok(input) => input,
        Err(e) => {
            let _ = events.send(EngineEvent::LoadFailed {
                reason: format!("{e:#}"),
            });
            return;
        }
    };
    let decoder = match Decoder::new(input) {
        Ok(decoder) => decoder,
        Err(e) => {
            let _ = events.send(EngineEvent::LoadFailed {
                reason: format!("decode {source}: {e}"),
            });
            return;
        }
    };
    if let Some(total) = decoder.total_duration() {
        duration_ms.store(total.as_millis() as u64, Ordering::Relaxed);
    }

    if cancelled.load(Ordering::Relaxed) {
        return;
    }
    sink.append(decoder);
    if cancelled.load(Ordering::Relaxed) {
        // Unload raced the append; clear the queue again.
        sink.stop();
        return;
    }

    tracing::debug!(source, "source loaded");
    let _ = events.send(EngineEvent::Loaded);
    // Play was pressed while still loading; audio is audible from here.
    if !sink.is_paused() {
        let _ = events.send(EngineEvent::Started);
    }
}

impl PlaybackEngine for RodioEngine {
    fn play(&mut self) {
        self.sink.play();
        if !self.sink.empty() {
            let _ = self.events.send(EngineEvent::Started);
        }
    }

    fn pause(&mut self) {
        self.sink.pause();
    }

    fn playing(&self) -> bool {
        !self.sink.is_paused() && !self.sink.empty()
    }

    fn seek(&mut self, position: Duration) {
        if self.sink.empty() {
            tracing::debug!("seek ignored, nothing queued");
            return;
        }
        if let Err(e) = self.sink.try_seek(position) {
            tracing::warn!(
                position_secs = position.as_secs(),
                "seek not supported by this source: {e}"
            );
        }
    }

    fn position(&self) -> Duration {
        self.sink.get_pos()
    }

    fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
        self.sink.set_volume(if muted { 0.0 } else { 1.0 });
    }

    fn muted(&self) -> bool {
        self.muted
    }

    fn duration(&self) -> Duration {
        Duration::from_millis(self.duration_ms.load(Ordering::Relaxed))
    }

    fn unload(&mut self) {
        // Flag first; the loader re-checks it after appending.
        self.cancelled.store(true, Ordering::Relaxed);
        self.sink.stop();
    }
}
