//! Session-health watchdog over two independent probes.

use std::fmt::Display;
use std::future::Future;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::core::StrikeWindow;
use crate::data::{WatchdogEvent, WatchdogOptions, WatchdogSample, WatchdogState};
use crate::effects::single_flight::SingleFlightGuard;
use crate::effects::ticker::CancellableTicker;

const EVENT_CAPACITY: usize = 16;

/// An asynchronous health check.
///
/// A probe failure is not an error for the watchdog: it is logged and counted
/// as an unhealthy answer.
pub trait Probe: Send + Sync + 'static {
    type Error: Display + Send;

    fn check(&self) -> impl Future<Output = Result<bool, Self::Error>> + Send;
}

/// Adapts an async closure into a [`Probe`].
pub struct ProbeFn<F>(F);

/// Wrap `f` as a [`Probe`].
///
/// # Examples
///
/// ```
/// use stowage_task::probe_fn;
///
/// let auth = probe_fn(|| async { Ok::<_, std::io::Error>(true) });
/// ```
pub fn probe_fn<F, Fut, E>(f: F) -> ProbeFn<F>
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<bool, E>> + Send,
    E: Display + Send,
{
    ProbeFn(f)
}

impl<F, Fut, E> Probe for ProbeFn<F>
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<bool, E>> + Send,
    E: Display + Send,
{
    type Error = E;

    fn check(&self) -> impl Future<Output = Result<bool, E>> + Send { (self.0)() }
}

struct Inner {
    state:  WatchdogState,
    window: StrikeWindow,
    run:    Option<CancellationToken>,
}

struct Shared<A, D> {
    auth:       A,
    delegation: D,
    options:    WatchdogOptions,
    inner:      Mutex<Inner>,
    sampling:   SingleFlightGuard<()>,
    events:     broadcast::Sender<WatchdogEvent>,
}

/// Samples an authentication probe and a delegation probe on a fixed cadence
/// and fires [`WatchdogEvent::Triggered`] once neither sample in a row of
/// `strikes` consecutive samples was healthy.
///
/// A sample is healthy only if both probes answered `true`. Both probes of a
/// tick run concurrently and the tick completes when both have answered. A
/// tick arriving while the previous sample is still being taken is dropped,
/// so samples never overlap.
///
/// The trigger fires at most once per armed period. Re-arming takes an
/// explicit [`start`](Self::start). Dropping the watchdog stops it.
pub struct DualConditionWatchdog<A: Probe, D: Probe> {
    shared: Arc<Shared<A, D>>,
}

impl<A: Probe, D: Probe> DualConditionWatchdog<A, D> {
    pub fn new(auth: A, delegation: D, options: WatchdogOptions) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        let window = StrikeWindow::new(options.strikes);
        Self {
            shared: Arc::new(Shared {
                auth,
                delegation,
                options,
                inner: Mutex::new(Inner {
                    state: WatchdogState::Idle,
                    window,
                    run: None,
                }),
                sampling: SingleFlightGuard::new(),
                events,
            }),
        }
    }

    /// Arm the watchdog with a periodic ticker at the configured interval.
    ///
    /// A no-op while already armed. From `Triggered` it re-arms with a
    /// cleared window.
    pub fn start(&self) {
        if self.state() == WatchdogState::Armed {
            debug!("watchdog already armed");
            return;
        }
        self.start_with(CancellableTicker::periodic(self.shared.options.interval));
    }

    /// Arm the watchdog with a caller-supplied ticker.
    ///
    /// Must be called within a tokio runtime. The ticker is dropped unused if
    /// the watchdog is already armed.
    pub fn start_with(&self, ticker: CancellableTicker) {
        let mut inner = self.shared.inner.lock();
        if inner.state == WatchdogState::Armed {
            debug!("watchdog already armed");
            return;
        }

        let token = ticker.stop_handle();
        inner.window.clear();
        inner.state = WatchdogState::Armed;
        inner.run = Some(token.clone());
        drop(inner);

        info!(strikes = self.shared.options.strikes, "watchdog armed");
        tokio::spawn(Self::run(Arc::clone(&self.shared), ticker, token));
    }

    /// Return to `Idle`, clear the window and stop ticking. Idempotent, and
    /// safe to call from a trigger handler.
    pub fn stop(&self) {
        let mut inner = self.shared.inner.lock();
        if let Some(token) = inner.run.take() {
            token.cancel();
        }
        inner.window.clear();
        if inner.state != WatchdogState::Idle {
            debug!(from = %inner.state, "watchdog stopped");
        }
        inner.state = WatchdogState::Idle;
    }

    pub fn state(&self) -> WatchdogState { self.shared.inner.lock().state }

    /// Subscribe to trigger events.
    pub fn subscribe(&self) -> broadcast::Receiver<WatchdogEvent> { self.shared.events.subscribe() }

    async fn run(shared: Arc<Shared<A, D>>, mut ticker: CancellableTicker, token: CancellationToken) {
        while ticker.tick().await {
            let Some(permit) = shared.sampling.try_enter(()) else {
                debug!("previous sample still in flight, tick dropped");
                continue;
            };
            let shared = Arc::clone(&shared);
            let token = token.clone();
            tokio::spawn(async move {
                let _permit = permit;
                Self::sample(&shared, &token).await;
            });
        }
    }

    async fn sample(shared: &Shared<A, D>, token: &CancellationToken) {
        let probes = async { tokio::join!(shared.auth.check(), shared.delegation.check()) };
        let (auth, delegation) = tokio::select! {
            biased;
            _ = token.cancelled() => return,
            answers = probes => answers,
        };
        let sample = WatchdogSample::new(absorb("auth", auth), absorb("delegation", delegation));

        let mut inner = shared.inner.lock();
        if token.is_cancelled() || inner.state != WatchdogState::Armed {
            return;
        }
        if !inner.window.push(sample.is_healthy()) {
            debug!(
                healthy = sample.is_healthy(),
                streak = inner.window.streak(),
                "watchdog sample"
            );
            return;
        }

        inner.state = WatchdogState::Triggered;
        if let Some(run) = inner.run.take() {
            run.cancel();
        }
        warn!(
            auth_valid = sample.auth_valid,
            delegation_valid = sample.delegation_valid,
            "session health lost, watchdog triggered"
        );
        let _ = shared.events.send(WatchdogEvent::Triggered(sample));
    }
}

impl<A: Probe, D: Probe> Drop for DualConditionWatchdog<A, D> {
    fn drop(&mut self) { self.stop(); }
}

fn absorb<E: Display>(probe: &'static str, answer: Result<bool, E>) -> bool {
    match answer {
        Ok(valid) => valid,
        Err(e) => {
            debug!(probe, error = %e, "probe degraded, counted as unhealthy");
            false
        }
    }
}
