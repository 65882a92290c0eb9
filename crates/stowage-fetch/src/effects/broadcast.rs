//! Single-read fan-out of a chunk stream.
//!
//! A response body can only be read once, so every downstream consumer is
//! fed from one pull loop: the [`Broadcaster`] advances its source once per
//! chunk and pushes a copy into a bounded queue per [`Tap`]. Copies are cheap
//! because [`Bytes`] is reference-counted.

use std::future::Future;
use std::pin::{Pin, pin};
use std::task::{Context, Poll};

use bytes::Bytes;
use futures_util::{Stream, StreamExt};
use tokio::sync::mpsc;
use tracing::debug;

use crate::error::Result;

/// One consumer's view of a broadcast chunk stream.
///
/// Yields every chunk in source order, then ends. If the source fails, the
/// failure is yielded once and the stream ends.
pub struct Tap {
    rx: mpsc::Receiver<Result<Bytes>>,
}

impl Stream for Tap {
    type Item = Result<Bytes>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.get_mut().rx.poll_recv(cx)
    }
}

/// Fans one chunk source out to any number of [`Tap`]s.
///
/// The source is only read while [`run`](Self::run) is polled. Each tap
/// buffers up to `capacity` chunks; when a tap's queue is full the
/// broadcaster waits for it, so the source advances at the pace of the
/// slowest tap still alive. Dropped taps are pruned, and reading stops early
/// once every tap is gone.
pub struct Broadcaster<S> {
    source:   S,
    branches: Vec<mpsc::Sender<Result<Bytes>>>,
    capacity: usize,
}

impl<S> Broadcaster<S>
where
    S: Stream<Item = Result<Bytes>>,
{
    pub fn new(source: S, capacity: usize) -> Self {
        Self {
            source,
            branches: Vec::new(),
            capacity: capacity.max(1),
        }
    }

    /// Add a tap. Taps added after [`run`](Self::run) starts are impossible,
    /// since `run` consumes the broadcaster.
    pub fn subscribe(&mut self) -> Tap {
        let (tx, rx) = mpsc::channel(self.capacity);
        self.branches.push(tx);
        Tap { rx }
    }

    /// Drive the source to its end and return the number of chunks
    /// delivered.
    pub async fn run(self) -> u64 {
        let Self {
            source,
            mut branches,
            ..
        } = self;
        let mut source = pin!(source);
        let mut delivered = 0u64;

        while let Some(item) = source.next().await {
            let failed = item.is_err();
            let mut live = Vec::with_capacity(branches.len());
            for branch in branches {
                if branch.send(item.clone()).await.is_ok() {
                    live.push(branch);
                }
            }
            branches = live;

            if failed {
                break;
            }
            if branches.is_empty() {
                debug!(delivered, "every tap dropped, source abandoned");
                break;
            }
            delivered += 1;
        }
        delivered
    }
}

/// Split `source` into two taps fed by one read of it.
///
/// The returned future is the pull loop and must be polled alongside the
/// taps, e.g. with `tokio::join!`.
///
/// # Examples
///
/// ```
/// use bytes::Bytes;
/// use futures_util::{StreamExt, stream};
///
/// # tokio_test_block_on(async {
/// let source = stream::iter(vec![Ok(Bytes::from_static(b"ab")), Ok(Bytes::from_static(b"c"))]);
/// let (pump, left, right) = stowage_fetch::tee(source, 8);
///
/// let (_, left, right) = futures_util::join!(pump, left.collect::<Vec<_>>(), right.collect::<Vec<_>>());
/// assert_eq!(left, right);
/// # });
/// # fn tokio_test_block_on<F: std::future::Future>(f: F) -> F::Output {
/// #     tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(f)
/// # }
/// ```
pub fn tee<S>(source: S, capacity: usize) -> (impl Future<Output = u64>, Tap, Tap)
where
    S: Stream<Item = Result<Bytes>>,
{
    let mut broadcaster = Broadcaster::new(source, capacity);
    let left = broadcaster.subscribe();
    let right = broadcaster.subscribe();
    (broadcaster.run(), left, right)
}
