use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::{self, Instant, Interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

enum TickSource {
    Periodic(Interval),
    Manual(mpsc::UnboundedReceiver<()>),
}

/// A tick source with an external stop control.
///
/// Pipelines take a ticker instead of sleeping on their own, so callers can
/// swap the wall-clock cadence for ticks pushed by hand (see
/// [`CancellableTicker::manual`]).
///
/// Stopping is idempotent and may happen from any task: once the stop handle
/// is cancelled, pending and future calls to [`tick`](Self::tick) return
/// `false` and the underlying timer is released when the ticker is dropped.
pub struct CancellableTicker {
    source: TickSource,
    token:  CancellationToken,
}

impl CancellableTicker {
    /// Tick every `period`, the first tick one period from now.
    ///
    /// A zero period is clamped to one millisecond. Ticks missed while the
    /// consumer was busy are not replayed in a burst.
    pub fn periodic(period: Duration) -> Self {
        let period = period.max(Duration::from_millis(1));
        let mut interval = time::interval_at(Instant::now() + period, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        Self {
            source: TickSource::Periodic(interval),
            token:  CancellationToken::new(),
        }
    }

    /// A ticker that only ticks when the returned [`TickTrigger`] is fired.
    /// It stops on its own once every trigger has been dropped.
    pub fn manual() -> (Self, TickTrigger) {
        let (tx, rx) = mpsc::unbounded_channel();
        let ticker = Self {
            source: TickSource::Manual(rx),
            token:  CancellationToken::new(),
        };
        (ticker, TickTrigger { tx })
    }

    /// Wait for the next tick. Returns `false` once the ticker is stopped.
    pub async fn tick(&mut self) -> bool {
        if self.token.is_cancelled() {
            return false;
        }
        let token = self.token.clone();
        tokio::select! {
            biased;
            _ = token.cancelled() => false,
            ticked = self.next() => ticked,
        }
    }

    async fn next(&mut self) -> bool {
        match &mut self.source {
            TickSource::Periodic(interval) => {
                interval.tick().await;
                true
            }
            TickSource::Manual(rx) => rx.recv().await.is_some(),
        }
    }

    /// Push the next periodic tick a full period away from now.
    /// Manual tickers are unaffected.
    pub fn reset(&mut self) {
        if let TickSource::Periodic(interval) = &mut self.source {
            interval.reset();
        }
    }

    pub fn stop(&self) { self.token.cancel(); }

    pub fn is_stopped(&self) -> bool { self.token.is_cancelled() }

    /// A handle that stops this ticker when cancelled.
    pub fn stop_handle(&self) -> CancellationToken { self.token.clone() }
}

/// Pushes ticks into a manual [`CancellableTicker`].
#[derive(Clone)]
pub struct TickTrigger {
    tx: mpsc::UnboundedSender<()>,
}

impl TickTrigger {
    /// Returns `false` if the ticker has been dropped.
    pub fn tick(&self) -> bool { self.tx.send(()).is_ok() }
}
