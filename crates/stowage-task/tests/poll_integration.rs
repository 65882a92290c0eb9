//! Integration tests for poll-until-ready acquisition.

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use parking_lot::Mutex;
use stowage_task::{Acquirer, Error, PollOptions, acquire};
use tokio::time::Instant;

/// Answers `None` for the first `empty` calls, then `value`, recording when
/// each call happened.
#[derive(Clone)]
struct ScriptedQuery {
    empty: u32,
    value: &'static str,
    calls: Arc<Mutex<Vec<Instant>>>,
}

impl ScriptedQuery {
    fn new(empty: u32, value: &'static str) -> Self {
        Self {
            empty,
            value,
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    fn query(&self) -> impl FnMut() -> std::future::Ready<Result<Option<String>, String>> + Send + 'static {
        let this = self.clone();
        move || {
            let mut calls = this.calls.lock();
            calls.push(Instant::now());
            let answer = (calls.len() as u32 > this.empty).then(|| this.value.to_string());
            std::future::ready(Ok(answer))
        }
    }

    fn calls(&self) -> Vec<Instant> { self.calls.lock().clone() }
}

#[tokio::test(start_paused = true)]
async fn test_absent_twice_then_bucket() {
    let start = Instant::now();
    let script = ScriptedQuery::new(2, "bucket-7");

    let bucket = acquire(script.query(), Duration::from_millis(500)).wait().await;

    assert_eq!(bucket, Ok("bucket-7".to_string()));
    assert!(start.elapsed() >= Duration::from_millis(1000));
    assert_eq!(script.calls().len(), 3);
}

#[tokio::test(start_paused = true)]
async fn test_resolves_after_k_plus_one_calls_with_interval_gaps() {
    let interval = Duration::from_millis(250);

    for k in [0u32, 1, 4] {
        let script = ScriptedQuery::new(k, "ready");
        let value = acquire(script.query(), interval).wait().await;

        assert_eq!(value, Ok("ready".to_string()));
        let calls = script.calls();
        assert_eq!(calls.len() as u32, k + 1);
        for pair in calls.windows(2) {
            assert!(pair[1] - pair[0] >= interval);
        }
    }
}

#[tokio::test(start_paused = true)]
async fn test_transport_error_surfaces_once() {
    let calls = Arc::new(AtomicU32::new(0));
    let counter = calls.clone();
    let handle = acquire(
        move || {
            let n = counter.fetch_add(1, Ordering::SeqCst);
            async move {
                if n == 0 {
                    Ok::<Option<String>, &str>(None)
                } else {
                    Err("503 service unavailable")
                }
            }
        },
        Duration::from_millis(100),
    );

    let outcome: Result<String, Error> = handle.wait().await;

    assert_eq!(outcome, Err(Error::Transport("503 service unavailable".to_string())));
    tokio::time::sleep(Duration::from_secs(1)).await;
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[tokio::test(start_paused = true)]
async fn test_cancel_stops_polling() {
    let script = ScriptedQuery::new(u32::MAX, "never");
    let handle = acquire(script.query(), Duration::from_millis(100));
    let cancel = handle.canceller();

    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(250)).await;
        cancel.cancel();
        cancel.cancel();
    });
    assert_eq!(handle.wait().await, Err(Error::Cancelled));

    let polled = script.calls().len();
    tokio::time::sleep(Duration::from_secs(1)).await;
    assert_eq!(script.calls().len(), polled);
}

#[tokio::test(start_paused = true)]
async fn test_cancel_without_wait_stops_polling() {
    let script = ScriptedQuery::new(u32::MAX, "never");
    let handle = acquire(script.query(), Duration::from_millis(100));

    tokio::time::sleep(Duration::from_millis(150)).await;
    handle.cancel();
    let polled = script.calls().len();
    assert_eq!(polled, 2);

    tokio::time::sleep(Duration::from_secs(1)).await;
    assert_eq!(script.calls().len(), polled);
    assert!(handle.is_cancelled());
    assert_eq!(handle.wait().await, Err(Error::Cancelled));
}

#[tokio::test(start_paused = true)]
async fn test_acquirer_shares_one_loop_per_key() {
    let acquirer: Acquirer<&'static str, String> =
        Acquirer::new(PollOptions::default().interval(Duration::from_millis(500)));
    let script = ScriptedQuery::new(2, "bucket-7");
    let unused = ScriptedQuery::new(0, "wrong");

    let first = acquirer.acquire("user-1", script.query());
    let second = acquirer.acquire("user-1", unused.query());
    assert!(acquirer.is_polling(&"user-1"));

    let (a, b) = tokio::join!(first.wait(), second.wait());

    assert_eq!(a, Ok("bucket-7".to_string()));
    assert_eq!(b, Ok("bucket-7".to_string()));
    assert_eq!(script.calls().len(), 3);
    assert!(unused.calls().is_empty());

    tokio::time::sleep(Duration::from_millis(1)).await;
    assert!(!acquirer.is_polling(&"user-1"));
}

#[tokio::test(start_paused = true)]
async fn test_acquirer_loop_survives_one_cancelled_waiter() {
    let acquirer: Acquirer<&'static str, String> =
        Acquirer::new(PollOptions::default().interval(Duration::from_millis(100)));
    let script = ScriptedQuery::new(3, "bucket-2");

    let leaving = acquirer.acquire("user-1", script.query());
    let staying = acquirer.acquire("user-1", script.query());
    leaving.cancel();

    assert_eq!(leaving.wait().await, Err(Error::Cancelled));
    assert_eq!(staying.wait().await, Ok("bucket-2".to_string()));
    assert_eq!(script.calls().len(), 4);
}

#[tokio::test(start_paused = true)]
async fn test_acquirer_stops_when_every_waiter_leaves() {
    let acquirer: Acquirer<&'static str, String> =
        Acquirer::new(PollOptions::default().interval(Duration::from_millis(100)));
    let script = ScriptedQuery::new(u32::MAX, "never");

    let handle = acquirer.acquire("user-1", script.query());
    tokio::time::sleep(Duration::from_millis(250)).await;
    drop(handle);
    tokio::time::sleep(Duration::from_millis(1)).await;

    assert!(!acquirer.is_polling(&"user-1"));
    let polled = script.calls().len();
    tokio::time::sleep(Duration::from_secs(1)).await;
    assert_eq!(script.calls().len(), polled);
}

#[tokio::test(start_paused = true)]
async fn test_acquirer_stops_when_every_waiter_cancels() {
    let acquirer: Acquirer<&'static str, String> =
        Acquirer::new(PollOptions::default().interval(Duration::from_millis(100)));
    let script = ScriptedQuery::new(u32::MAX, "never");

    let first = acquirer.acquire("user-1", script.query());
    let second = acquirer.acquire("user-1", script.query());
    tokio::time::sleep(Duration::from_millis(150)).await;
    first.cancel();
    second.cancel();
    tokio::time::sleep(Duration::from_millis(1)).await;

    assert!(!acquirer.is_polling(&"user-1"));
    let polled = script.calls().len();
    tokio::time::sleep(Duration::from_secs(1)).await;
    assert_eq!(script.calls().len(), polled);
    drop((first, second));
}
