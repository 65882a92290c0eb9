//! Shared state of one running transfer and the per-caller handles on it.

use std::pin::Pin;
use std::sync::{Arc, Weak};
use std::task::{Context, Poll};

use futures_util::Stream;
use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::data::{Completed, Progress, TransferEvent};
use crate::error::{Error, Result};

struct EventLog {
    latest:      Option<Progress>,
    outcome:     Option<TransferEvent>,
    subscribers: Vec<(u64, mpsc::UnboundedSender<TransferEvent>)>,
    next_id:     u64,
    finished:    bool,
}

/// Event log of one transfer, shared by every handle attached to it.
///
/// Subscribing replays the latest progress and the outcome, if any, and
/// registers for live events under the same lock as publishing. `loaded` is
/// cumulative, so a late subscriber sees the same progress as everyone else
/// from the point it joined.
pub(crate) struct TransferRun {
    key:   String,
    token: CancellationToken,
    log:   Mutex<EventLog>,
}

impl TransferRun {
    pub(crate) fn new(key: String) -> Arc<Self> {
        Arc::new(Self {
            key,
            token: CancellationToken::new(),
            log: Mutex::new(EventLog {
                latest:      None,
                outcome:     None,
                subscribers: Vec::new(),
                next_id:     0,
                finished:    false,
            }),
        })
    }

    pub(crate) fn key(&self) -> &str { &self.key }

    /// Cancelled once no handle is attached any more.
    pub(crate) fn token(&self) -> &CancellationToken { &self.token }

    /// Attach a newcomer, unless the run has already finished or lost its
    /// last subscriber.
    pub(crate) fn attach(self: &Arc<Self>) -> Option<TransferHandle> {
        let mut log = self.log.lock();
        if log.finished || self.token.is_cancelled() {
            return None;
        }
        Some(self.register(&mut log))
    }

    /// Attach unconditionally. A finished run replays its outcome and ends.
    pub(crate) fn subscribe(self: &Arc<Self>) -> TransferHandle {
        let mut log = self.log.lock();
        self.register(&mut log)
    }

    fn register(self: &Arc<Self>, log: &mut EventLog) -> TransferHandle {
        let (tx, rx) = mpsc::unbounded_channel();
        let replay = log.latest.map(TransferEvent::Progress).into_iter().chain(log.outcome.clone());
        for event in replay {
            let _ = tx.send(event);
        }

        let id = log.next_id;
        log.next_id += 1;
        if !log.finished {
            log.subscribers.push((id, tx));
        }

        TransferHandle {
            id,
            rx,
            run: Arc::downgrade(self),
            cancelled: false,
        }
    }

    /// Append an event. Anything after the first terminal event is dropped.
    pub(crate) fn publish(&self, event: TransferEvent) {
        let mut log = self.log.lock();
        if log.finished {
            return;
        }
        for (_, tx) in &log.subscribers {
            let _ = tx.send(event.clone());
        }
        match event {
            TransferEvent::Progress(progress) => log.latest = Some(progress),
            outcome => {
                log.finished = true;
                log.subscribers.clear();
                log.outcome = Some(outcome);
            }
        }
    }

    /// End every subscriber's stream without a terminal event.
    pub(crate) fn close(&self) {
        let mut log = self.log.lock();
        log.finished = true;
        log.subscribers.clear();
        log.latest = None;
        log.outcome = None;
    }

    fn detach(&self, id: u64) {
        let mut log = self.log.lock();
        log.subscribers.retain(|(subscriber, _)| *subscriber != id);
        if log.subscribers.is_empty() && !log.finished {
            debug!(key = %self.key, "last subscriber left, cancelling transfer");
            self.token.cancel();
        }
    }
}

/// A caller's subscription to a transfer.
///
/// A [`Stream`] of [`TransferEvent`]s: `Progress` events followed by one
/// `Complete` or `Failed`, after which the stream ends. If the transfer is
/// cancelled the stream ends without a terminal event.
///
/// Dropping the handle is the same as [`cancel`](Self::cancel).
pub struct TransferHandle {
    id:        u64,
    rx:        mpsc::UnboundedReceiver<TransferEvent>,
    run:       Weak<TransferRun>,
    cancelled: bool,
}

impl TransferHandle {
    /// Stop receiving events. Idempotent, silent, and safe to call right
    /// after receiving an event.
    ///
    /// The transfer itself is cancelled, releasing its connection and
    /// buffers, once no other handle is attached to it.
    pub fn cancel(&mut self) {
        if self.cancelled {
            return;
        }
        self.cancelled = true;
        self.rx.close();
        if let Some(run) = self.run.upgrade() {
            run.detach(self.id);
        }
    }

    pub fn is_cancelled(&self) -> bool { self.cancelled }

    /// The next event, or `None` once the stream has ended.
    pub async fn next_event(&mut self) -> Option<TransferEvent> {
        if self.cancelled {
            return None;
        }
        self.rx.recv().await
    }

    /// Skip progress and wait for the outcome.
    ///
    /// # Errors
    ///
    /// The error carried by `Failed`, or [`Error::Cancelled`] if the stream
    /// ended without a terminal event.
    pub async fn finish(mut self) -> Result<Completed> {
        while let Some(event) = self.next_event().await {
            match event {
                TransferEvent::Progress(_) => {}
                TransferEvent::Complete(completed) => return Ok(completed),
                TransferEvent::Failed(e) => return Err(e),
            }
        }
        Err(Error::Cancelled)
    }
}

impl Stream for TransferHandle {
    type Item = TransferEvent;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        if this.cancelled {
            return Poll::Ready(None);
        }
        this.rx.poll_recv(cx)
    }
}

impl Drop for TransferHandle {
    fn drop(&mut self) { self.cancel(); }
}
