//! Engine seam between the playback controller and an audio backend.
//!
//! The controller never talks to an audio library directly: it drives a
//! [`PlaybackEngine`] and reduces the [`EngineEvent`]s the engine emits on
//! the session's channel. `playback` provides the rodio-backed
//! implementation; tests substitute scripted fakes.

use std::time::Duration;

use anyhow::Result;
use crossbeam_channel::Sender;

/// How a session acquires its media bytes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum StreamMode {
    /// Decode while the source is still downloading (spooled to disk).
    #[default]
    Progressive,
    /// Fetch the whole source into memory before decoding.
    Preload,
}

/// Lifecycle notifications emitted by an engine.
///
/// Reduced by the controller on the UI thread; engine internals never
/// mutate controller state directly.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EngineEvent {
    /// Decoding is set up; the total duration (if the container reports
    /// one) is now queryable.
    Loaded,
    /// Audible playback began (initial start or resume).
    Started,
    /// The source could not be fetched or decoded.
    LoadFailed { reason: String },
}

/// Transport commands and queries for one bound media source.
///
/// Implementations are owned by a single session on the UI thread; none of
/// these calls may block on I/O.
pub trait PlaybackEngine {
    fn play(&mut self);
    fn pause(&mut self);
    /// `true` while audio is actively progressing (loaded and not paused).
    fn playing(&self) -> bool;
    /// Jump to an absolute position. Ignored by sources that cannot seek.
    fn seek(&mut self, position: Duration);
    fn position(&self) -> Duration;
    fn set_muted(&mut self, muted: bool);
    fn muted(&self) -> bool;
    /// Total media duration, `Duration::ZERO` while unknown.
    fn duration(&self) -> Duration;
    /// Stop playback and release buffers. Idempotent.
    fn unload(&mut self);
}

/// Creates one engine per session.
///
/// Errors from `open` cover construction only (for example: no output
/// device). Fetch and decode failures arrive later as
/// [`EngineEvent::LoadFailed`] on the session channel.
pub trait EngineFactory {
    fn open(
        &self,
        source: &str,
        mode: StreamMode,
        events: Sender<EngineEvent>,
    ) -> Result<Box<dyn PlaybackEngine>>;
}
