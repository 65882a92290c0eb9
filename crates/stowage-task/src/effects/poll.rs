//! Poll-until-ready acquisition.
//!
//! A readiness query answers `Ok(None)` while the resource is not ready yet.
//! The loop keeps asking on a fixed cadence until the first `Ok(Some(_))`,
//! and stops on the first `Err(_)` without retrying past it.

use std::fmt::Display;
use std::future::Future;
use std::hash::Hash;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::data::PollOptions;
use crate::effects::single_flight::{Flight, SingleFlightGroup};
use crate::effects::ticker::CancellableTicker;
use crate::error::{Error, Result};

/// Query until it yields a value.
///
/// The first query is issued immediately. After every empty answer the loop
/// waits for the ticker, which is reset first so that a periodic ticker waits
/// at least one full period after the answer arrived. Stopping the ticker
/// cancels the loop, including a query that is still in flight.
pub async fn poll_until_ready<F, Fut, V, E>(
    mut query: F,
    ticker: &mut CancellableTicker,
    max_attempts: Option<u32>,
) -> Result<V>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = std::result::Result<Option<V>, E>>,
    E: Display,
{
    let stop = ticker.stop_handle();
    let mut attempts = 0u32;

    loop {
        attempts += 1;
        let answer = tokio::select! {
            biased;
            _ = stop.cancelled() => return Err(Error::Cancelled),
            answer = query() => answer,
        };

        match answer {
            Ok(Some(value)) => {
                debug!(attempts, "resource ready");
                return Ok(value);
            }
            Ok(None) => debug!(attempts, "resource not ready yet"),
            Err(e) => {
                debug!(attempts, error = %e, "readiness query failed");
                return Err(Error::transport(e));
            }
        }

        if max_attempts.is_some_and(|max| attempts >= max) {
            return Err(Error::Exhausted { attempts });
        }

        ticker.reset();
        if !ticker.tick().await {
            return Err(Error::Cancelled);
        }
    }
}

type Slot<V> = Option<Result<V>>;

/// A pending acquisition. Resolves once with the ready value or the error
/// that stopped the loop.
pub struct AcquireHandle<V> {
    rx:     Mutex<Option<watch::Receiver<Slot<V>>>>,
    cancel: CancellationToken,
}

impl<V: Clone> AcquireHandle<V> {
    fn new(rx: watch::Receiver<Slot<V>>, cancel: CancellationToken) -> Self {
        Self {
            rx: Mutex::new(Some(rx)),
            cancel,
        }
    }

    /// Wait for the outcome. Returns [`Error::Cancelled`] if this handle was
    /// cancelled first.
    pub async fn wait(self) -> Result<V> {
        let Self { rx, cancel } = self;
        let Some(mut rx) = rx.into_inner() else {
            return Err(Error::Cancelled);
        };
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(Error::Cancelled),
            slot = rx.wait_for(Option::is_some) => match slot {
                Ok(slot) => (*slot).clone().unwrap_or(Err(Error::Cancelled)),
                Err(_) => Err(Error::Cancelled),
            },
        }
    }

    /// Stop waiting. Idempotent.
    ///
    /// The handle lets go of the loop right away, even if it is kept around.
    /// The loop itself stops once no handle is waiting on it any more.
    pub fn cancel(&self) {
        self.cancel.cancel();
        self.rx.lock().take();
    }

    pub fn is_cancelled(&self) -> bool { self.cancel.is_cancelled() }

    /// A token that cancels this handle, usable while [`wait`](Self::wait)
    /// owns the handle.
    pub fn canceller(&self) -> CancellationToken { self.cancel.clone() }
}

/// Run the loop in the background and publish its outcome on `tx`.
///
/// `guard` is held until the loop ends, e.g. the lease keeping the loop
/// joinable under its key.
fn spawn_loop<F, Fut, V, E, G>(
    query: F,
    mut ticker: CancellableTicker,
    max_attempts: Option<u32>,
    tx: Arc<watch::Sender<Slot<V>>>,
    guard: G,
) where
    F: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = std::result::Result<Option<V>, E>> + Send + 'static,
    V: Send + Sync + 'static,
    E: Display + Send + 'static,
    G: Send + 'static,
{
    tokio::spawn(async move {
        let _guard = guard;
        let outcome = tokio::select! {
            _ = tx.closed() => {
                debug!("no waiters left, polling stopped");
                return;
            }
            outcome = poll_until_ready(query, &mut ticker, max_attempts) => outcome,
        };
        if matches!(outcome, Err(Error::Cancelled)) {
            debug!("acquisition cancelled, polling stopped");
        }
        tx.send_replace(Some(outcome));
    });
}

/// Start polling `query` every `interval` until it yields a value.
///
/// Must be called within a tokio runtime.
///
/// # Examples
///
/// ```no_run
/// use std::time::Duration;
///
/// # async fn run() -> stowage_task::Result<()> {
/// let handle = stowage_task::acquire(
///     || async { Ok::<_, std::io::Error>(Some("bucket-7".to_string())) },
///     Duration::from_millis(500),
/// );
/// let bucket = handle.wait().await?;
/// # Ok(())
/// # }
/// ```
pub fn acquire<F, Fut, V, E>(query: F, interval: Duration) -> AcquireHandle<V>
where
    F: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = std::result::Result<Option<V>, E>> + Send + 'static,
    V: Clone + Send + Sync + 'static,
    E: Display + Send + 'static,
{
    let (tx, rx) = watch::channel(None);
    let ticker = CancellableTicker::periodic(interval);
    let cancel = ticker.stop_handle();
    spawn_loop(query, ticker, None, Arc::new(tx), ());
    AcquireHandle::new(rx, cancel)
}

/// Keyed acquisitions that share one polling loop per key.
///
/// Every caller asking for a key while its loop runs waits on the same loop
/// and receives the same value, so the remote service sees one query stream
/// no matter how many consumers are waiting.
pub struct Acquirer<K, V> {
    flights: SingleFlightGroup<K, Arc<watch::Sender<Slot<V>>>>,
    options: PollOptions,
}

impl<K, V> Acquirer<K, V>
where
    K: Eq + Hash + Clone + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    pub fn new(options: PollOptions) -> Self {
        Self {
            flights: SingleFlightGroup::new(),
            options,
        }
    }

    /// Wait on the loop for `key`, starting it with `query` if none runs.
    /// `query` is dropped unused when the caller joins an existing loop.
    pub fn acquire<F, Fut, E>(&self, key: K, query: F) -> AcquireHandle<V>
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = std::result::Result<Option<V>, E>> + Send + 'static,
        E: Display + Send + 'static,
    {
        let mut first = None;
        let flight = self.flights.join_live_or_start(key, |tx| !tx.is_closed(), || {
            let (tx, rx) = watch::channel(None);
            first = Some(rx);
            Arc::new(tx)
        });

        match flight {
            Flight::Follower(tx) => {
                debug!("joined in-flight acquisition");
                AcquireHandle::new(tx.subscribe(), CancellationToken::new())
            }
            Flight::Leader { value: tx, lease } => {
                let rx = first.unwrap_or_else(|| tx.subscribe());
                let ticker = CancellableTicker::periodic(self.options.interval);
                spawn_loop(query, ticker, self.options.max_attempts, tx, lease);
                AcquireHandle::new(rx, CancellationToken::new())
            }
        }
    }

    pub fn is_polling(&self, key: &K) -> bool { self.flights.contains(key) }
}

impl<K, V> Default for Acquirer<K, V>
where
    K: Eq + Hash + Clone + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    fn default() -> Self { Self::new(PollOptions::default()) }
}
