//! Trailing-edge debounce timer.
//!
//! Each [`schedule`](Debouncer::schedule) call aborts the pending timer and
//! starts a new one, so only the last edit in a burst fires.  Expiry is
//! delivered through [`expired`](Debouncer::expired), which is meant to sit
//! in a `tokio::select!` branch of the owning task.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

pub struct Debouncer {
    delay: Duration,
    generation: u64,
    armed: bool,
    timer: Option<JoinHandle<()>>,
    tx: mpsc::UnboundedSender<u64>,
    rx: mpsc::UnboundedReceiver<u64>,
}

impl Debouncer {
    pub fn new(delay: Duration) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            delay,
            generation: 0,
            armed: false,
            timer: None,
            tx,
            rx,
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    pub fn is_pending(&self) -> bool {
        self.armed
    }

    /// Restart the idle window.
    pub fn schedule(&mut self) {
        self.abort_timer();
        self.generation += 1;
        self.armed = true;

        let generation = self.generation;
        let delay = self.delay;
        let tx = self.tx.clone();
        self.timer = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = tx.send(generation);
        }));
    }

    /// Drop the pending timer, if any.
    pub fn cancel(&mut self) {
        self.abort_timer();
        self.armed = false;
    }

    /// Resolves when the current window elapses.  Pending forever while
    /// nothing is scheduled.  Cancel safe.
    pub async fn expired(&mut self) {
        loop {
            // The sender half lives in `self`, so the channel never closes.
            let Some(generation) = self.rx.recv().await else {
                std::future::pending::<()>().await;
                return;
            };
            // A timer aborted after it already sent leaves a stale tick.
            if self.armed && generation == self.generation {
                self.armed = false;
                self.timer = None;
                return;
            }
        }
    }

    fn abort_timer(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.abort();
        }
    }
}

impl Drop for Debouncer {
    fn drop(&mut self) {
        self.abort_timer();
    }
}
