//! Cancellable re-render poll for an actively playing session.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

use crossbeam_channel::Sender;

use crate::controller::RenderRequest;

/// Periodic render-request ticker.
///
/// The thread wakes every `interval`, checks the cancel flag, and sends one
/// render request. Cancelling (or dropping the channel receiver) ends the
/// thread at its next wakeup, so no tick is sent after cancellation.
pub(crate) struct RenderPoll {
    cancel: Arc<AtomicBool>,
}

impl RenderPoll {
    pub(crate) fn spawn(interval: Duration, render_tx: Sender<RenderRequest>) -> Self {
        let cancel = Arc::new(AtomicBool::new(false));
        thread::spawn({
            let cancel = cancel.clone();
            move || {
                loop {
                    thread::sleep(interval);
                    if cancel.load(Ordering::Relaxed) {
                        break;
                    }
                    if render_tx.send(RenderRequest).is_err() {
                        break;
                    }
                }
            }
        });
        Self { cancel }
    }

    pub(crate) fn cancel(&mut self) {
        self.cancel.store(true, Ordering::Relaxed);
    }
}

impl Drop for RenderPoll {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam_channel::unbounded;

    #[test]
    fn ticks_arrive_while_active() {
        let (tx, rx) = unbounded();
        let mut poll = RenderPoll::spawn(Duration::from_millis(5), tx);
        assert!(rx.recv_timeout(Duration::from_secs(2)).is_ok());
        assert!(rx.recv_timeout(Duration::from_secs(2)).is_ok());
        poll.cancel();
    }

    #[test]
    fn cancel_stops_ticking() {
        let (tx, rx) = unbounded();
        let mut poll = RenderPoll::spawn(Duration::from_millis(5), tx);
        assert!(rx.recv_timeout(Duration::from_secs(2)).is_ok());
        poll.cancel();
        // The thread exits at its next wakeup; allow one in-flight tick.
        thread::sleep(Duration::from_millis(50));
        while rx.try_recv().is_ok() {}
        thread::sleep(Duration::from_millis(50));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn closed_receiver_ends_the_thread() {
        let (tx, rx) = unbounded();
        let _poll = RenderPoll::spawn(Duration::from_millis(5), tx);
        drop(rx);
        thread::sleep(Duration::from_millis(30));
    }
}
