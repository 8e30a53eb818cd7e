//! Embeddable terminal audio-player widget.
//!
//! `controller` owns the playback session and reduces engine lifecycle
//! events; `view` renders the controller's snapshot as a `ratatui` widget
//! and maps clicks back to player actions; `playback` is the rodio-backed
//! engine behind the `engine` trait seam.

pub mod controller;
pub mod engine;
pub mod playback;
pub mod style;
pub mod view;

mod poll;
mod source;
