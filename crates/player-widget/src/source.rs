//! Resolves a media source string into the seekable byte stream the
//! decoder consumes.
//!
//! Local paths are read straight from disk. For http(s) URLs the stream
//! mode decides the strategy: `Preload` fetches the whole body into memory
//! up front, `Progressive` spools the download into a temp file and hands
//! out a reader that blocks until the bytes it wants have arrived, so
//! decoding can begin while the fetch is still running.

use std::fs::File;
use std::io::{self, BufReader, Cursor, Read, Seek, SeekFrom, Write};
use std::sync::{Arc, Condvar, Mutex};
use std::thread;

use anyhow::{Context, Result};
use tempfile::TempPath;

use crate::engine::StreamMode;

/// Cap on preloaded bodies. Large enough for any sane audio file; a
/// source past this fails to load instead of exhausting memory.
const PRELOAD_LIMIT_BYTES: u64 = 512 * 1024 * 1024;

const FETCH_CHUNK_BYTES: usize = 64 * 1024;

pub(crate) fn is_http_url(source: &str) -> bool {
    source.starts_with("http://") || source.starts_with("https://")
}

/// Seekable byte stream backing one playback session.
#[derive(Debug)]
pub(crate) enum MediaInput {
    /// Local file, streamed from disk.
    File(BufReader<File>),
    /// Fully prefetched body.
    Memory(Cursor<Vec<u8>>),
    /// Remote body still downloading into a spool file.
    Spool(SpoolReader),
}

impl Read for MediaInput {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            MediaInput::File(r) => r.read(buf),
            MediaInput::Memory(r) => r.read(buf),
            MediaInput::Spool(r) => r.read(buf),
        }
    }
}

impl Seek for MediaInput {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        match self {
            MediaInput::File(r) => r.seek(pos),
            MediaInput::Memory(r) => r.seek(pos),
            MediaInput::Spool(r) => r.seek(pos),
        }
    }
}

pub(crate) fn open(source: &str, mode: StreamMode) -> Result<MediaInput> {
    if is_http_url(source) {
        match mode {
            StreamMode::Progressive => spool_http(source),
            StreamMode::Preload => preload_http(source),
        }
    } else {
        let file = File::open(source).with_context(|| format!("open {source}"))?;
        Ok(MediaInput::File(BufReader::new(file)))
    }
}

fn preload_http(url: &str) -> Result<MediaInput> {
    let resp = ureq::get(url)
        .call()
        .with_context(|| format!("fetch {url}"))?;
    if !resp.status().is_success() {
        anyhow::bail!("fetch {url}: status {}", resp.status());
    }
    let bytes = resp
        .into_body()
        .with_config()
        .limit(PRELOAD_LIMIT_BYTES)
        .read_to_vec()
        .with_context(|| format!("read body of {url}"))?;
    tracing::debug!(bytes = bytes.len(), url, "source preloaded");
    Ok(MediaInput::Memory(Cursor::new(bytes)))
}

/// Start a background download of `url` into a temp file and return a
/// reader over it. The spool file is deleted when the reader drops.
fn spool_http(url: &str) -> Result<MediaInput> {
    let spool = tempfile::Builder::new()
        .prefix("player-spool-")
        .tempfile()
        .context("create spool file")?;
    let writer = spool.reopen().context("reopen spool file")?;
    let (file, path) = spool.into_parts();

    let progress: SharedProgress =
        Arc::new((Mutex::new(SpoolProgress::default()), Condvar::new()));

    thread::spawn({
        let url = url.to_string();
        let progress = progress.clone();
        move || {
            match fetch_into(&url, writer, &progress) {
                Ok(bytes) => tracing::debug!(bytes, url, "spool download complete"),
                Err(e) => {
                    tracing::warn!(url, "spool download failed: {e:#}");
                    mark_failed(&progress, format!("{e:#}"));
                }
            }
            mark_done(&progress);
        }
    });

    Ok(MediaInput::Spool(SpoolReader {
        file,
        progress,
        pos: 0,
        _cleanup: path,
    }))
}

fn fetch_into(url: &str, mut writer: File, progress: &SharedProgress) -> Result<u64> {
    let resp = ureq::get(url)
        .call()
        .with_context(|| format!("fetch {url}"))?;
    if !resp.status().is_success() {
        anyhow::bail!("fetch {url}: status {}", resp.status());
    }
    let (_, body) = resp.into_parts();
    let mut reader = body.into_reader();

    let mut chunk = [0u8; FETCH_CHUNK_BYTES];
    let mut total: u64 = 0;
    loop {
        let n = reader.read(&mut chunk).context("read response body")?;
        if n == 0 {
            break;
        }
        writer.write_all(&chunk[..n]).context("write spool file")?;
        total += n as u64;

        let (lock, cvar) = &**progress;
        let mut state = lock.lock().unwrap();
        state.bytes_written = total;
        drop(state);
        cvar.notify_all();
    }
    writer.flush().context("flush spool file")?;
    Ok(total)
}

/// Download state shared between the fetch thread and the reader.
#[derive(Debug, Default)]
struct SpoolProgress {
    bytes_written: u64,
    done: bool,
    failed: Option<String>,
}

type SharedProgress = Arc<(Mutex<SpoolProgress>, Condvar)>;

fn mark_done(progress: &SharedProgress) {
    let (lock, cvar) = &**progress;
    let mut state = lock.lock().unwrap();
    state.done = true;
    drop(state);
    cvar.notify_all();
}

fn mark_failed(progress: &SharedProgress, reason: String) {
    let (lock, cvar) = &**progress;
    let mut state = lock.lock().unwrap();
    state.failed = Some(reason);
    drop(state);
    cvar.notify_all();
}

/// Seekable view of a spool file another thread is still appending to.
///
/// Reads past the downloaded prefix block until the bytes arrive or the
/// download finishes. Seeking relative to the end waits for the download
/// to finish first, since only then is the length known.
#[derive(Debug)]
pub(crate) struct SpoolReader {
    file: File,
    progress: SharedProgress,
    pos: u64,
    // Removes the spool file once the decoder lets go of the reader.
    _cleanup: TempPath,
}

impl SpoolReader {
    fn wait_until_available(&self, pos: u64) {
        let (lock, cvar) = &*self.progress;
        let mut state = lock.lock().unwrap();
        while !state.done && state.bytes_written < pos {
            state = cvar.wait(state).unwrap();
        }
    }

    fn wait_until_done(&self) -> u64 {
        let (lock, cvar) = &*self.progress;
        let mut state = lock.lock().unwrap();
        while !state.done {
            state = cvar.wait(state).unwrap();
        }
        state.bytes_written
    }
}

impl Read for SpoolReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.wait_until_available(self.pos.saturating_add(1));

        let (lock, _) = &*self.progress;
        let state = lock.lock().unwrap();
        if state.done && self.pos >= state.bytes_written {
            // A failed download surfaces once the written prefix runs out.
            if let Some(reason) = state.failed.as_deref() {
                return Err(io::Error::other(reason.to_string()));
            }
            return Ok(0);
        }
        let available = (state.bytes_written - self.pos) as usize;
        let to_read = buf.len().min(available);
        drop(state);

        self.file.seek(SeekFrom::Start(self.pos))?;
        let n = self.file.read(&mut buf[..to_read])?;
        self.pos += n as u64;
        Ok(n)
    }
}

impl Seek for SpoolReader {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        let target = match pos {
            SeekFrom::Start(offset) => offset,
            SeekFrom::Current(delta) => self.pos.saturating_add_signed(delta),
            SeekFrom::End(delta) => self.wait_until_done().saturating_add_signed(delta),
        };
        self.wait_until_available(target);
        self.pos = target;
        Ok(target)
    }
}
