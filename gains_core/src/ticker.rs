//! Repeating tick task with explicit cancellation.
//!
//! Each timer owns one [`Ticker`]. Cancelling it (or dropping it) stops the
//! underlying task, so no tick can arrive after teardown or pause.

use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

pub struct Ticker {
    ticks: mpsc::Receiver<u64>,
    cancel_tx: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

impl Ticker {
    /// Spawn a task emitting numbered ticks every `period`; the first tick
    /// arrives one period after spawning. Must be called inside a runtime.
    pub fn spawn(period: Duration) -> Self {
        let (tick_tx, ticks) = mpsc::channel(16);
        let (cancel_tx, mut cancel_rx) = watch::channel(false);

        let handle = tokio::spawn(async move {
            let start = tokio::time::Instant::now() + period;
            let mut interval = tokio::time::interval_at(start, period);
            let mut count = 0u64;

            loop {
                tokio::select! {
                    _ = interval.tick() => {
                        count += 1;
                        if tick_tx.send(count).await.is_err() {
                            break;
                        }
                    }
                    changed = cancel_rx.changed() => {
                        if changed.is_err() || *cancel_rx.borrow() {
                            break;
                        }
                    }
                }
            }
            tracing::debug!("Ticker stopped after {} ticks", count);
        });

        Self {
            ticks,
            cancel_tx,
            handle,
        }
    }

    /// Wait for the next tick; `None` once the ticker has been cancelled and
    /// every already-emitted tick has been drained.
    pub async fn next(&mut self) -> Option<u64> {
        self.ticks.recv().await
    }

    pub fn cancel(&self) {
        let _ = self.cancel_tx.send(true);
    }
}

impl Drop for Ticker {
    fn drop(&mut self) {
        self.cancel();
        self.handle.abort();
    }
}
