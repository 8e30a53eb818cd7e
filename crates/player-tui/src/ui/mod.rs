//! Terminal UI hosting the player widget.
//!
//! Keys:
//! - Space: play / pause
//! - r: restart from the top
//! - m: mute / unmute
//! - Left / Right: seek 5s back / forward
//! - Enter: reload the configured source
//! - x: unload the current source
//! - l: toggle the log overlay (Up / Down scroll, Esc closes)
//! - q: quit
//!
//! The widget is also mouse-aware: click play/pause, repeat, or the
//! volume button, or anywhere on the progress row to seek.

mod app;
mod render;

pub(crate) use app::run_tui;
