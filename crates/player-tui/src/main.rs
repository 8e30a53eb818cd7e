//! `player-tui`: terminal host for the audio player widget.
//!
//! Plays one media source, local file or http(s) URL, inside a small
//! ratatui frame. Remote sources stream by default and can be fully
//! prefetched with `--preload`.

mod ui;

use std::io;

use anyhow::Result;
use clap::Parser;
use crossbeam_channel::{Sender, unbounded};
use player_widget::engine::StreamMode;
use tracing_subscriber::EnvFilter;

const VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    " (",
    env!("GIT_SHA"),
    ", ",
    env!("BUILD_DATE"),
    ")"
);

#[derive(Parser, Debug)]
#[command(name = "player-tui", version = VERSION, about = "Terminal audio player")]
struct Args {
    /// Media source: a local file path or an http(s) URL.
    source: String,

    /// Label shown in the player; defaults to the last path segment.
    #[arg(long)]
    label: Option<String>,

    /// Download the whole source before decoding instead of streaming it.
    #[arg(long)]
    preload: bool,
}

/// Forwards formatted tracing lines to the in-app log overlay.
struct LogWriter {
    tx: Sender<String>,
}

impl io::Write for LogWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        for line in String::from_utf8_lossy(buf).lines() {
            if !line.trim().is_empty() {
                let _ = self.tx.send(line.to_string());
            }
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    // The alternate screen owns stdout, so log lines go to the overlay
    // instead of corrupting the frame.
    let (log_tx, log_rx) = unbounded();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,player_widget=info")),
        )
        .with_ansi(false)
        .with_writer(move || LogWriter { tx: log_tx.clone() })
        .init();
    tracing::info!("player-tui {VERSION} starting");

    let label = args
        .label
        .clone()
        .unwrap_or_else(|| source_label(&args.source));
    let mode = if args.preload {
        StreamMode::Preload
    } else {
        StreamMode::Progressive
    };

    ui::run_tui(args.source, label, mode, log_rx)
}

/// Last path segment of the source, query string and fragment stripped.
fn source_label(source: &str) -> String {
    let path = source.split(['?', '#']).next().unwrap_or(source);
    match path.trim_end_matches('/').rsplit('/').next() {
        Some(segment) if !segment.is_empty() => segment.to_string(),
        _ => path.to_string(),
    }
}
