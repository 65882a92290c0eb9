use std::sync::Arc;

use futures_util::StreamExt;
use stowage_task::{Flight, FlightLease, SingleFlightGroup};
use tracing::{debug, info, warn};

use crate::core::assemble;
use crate::data::{Completed, Progress, TransferEvent, TransferOptions, TransferRequest};
use crate::effects::broadcast::tee;
use crate::effects::handle::{TransferHandle, TransferRun};
use crate::effects::http::HttpClient;
use crate::effects::reader::ChunkReader;
use crate::error::{Error, Result};

/// Streams remote payloads while reporting progress.
///
/// Each transfer reads its response body exactly once. The chunk stream is
/// teed into a progress branch, which publishes the running byte count, and
/// a body branch, which collects the chunks for the final payload.
///
/// Transfers are deduplicated by [`TransferRequest::key`]: starting a key
/// that is already in flight attaches to the running transfer instead of
/// issuing a second request.
///
/// # Examples
///
/// ```no_run
/// use stowage_fetch::{ReqwestClient, TransferEvent, TransferPipeline, TransferRequest};
///
/// # async fn example() -> stowage_fetch::Result<()> {
/// let pipeline = TransferPipeline::new(ReqwestClient::new());
/// let mut handle = pipeline.start(TransferRequest::new("https://example.com/report.csv"));
///
/// while let Some(event) = handle.next_event().await {
///     match event {
///         TransferEvent::Progress(p) => println!("{:?}%", p.percentage()),
///         TransferEvent::Complete(done) => println!("{} bytes", done.bytes.len()),
///         TransferEvent::Failed(e) => return Err(e),
///     }
/// }
/// # Ok(())
/// # }
/// ```
pub struct TransferPipeline<C> {
    client:  Arc<C>,
    options: TransferOptions,
    flights: SingleFlightGroup<String, Arc<TransferRun>>,
}

impl<C> TransferPipeline<C>
where
    C: HttpClient + 'static,
{
    pub fn new(client: C) -> Self { Self::with_options(client, TransferOptions::default()) }

    pub fn with_options(client: C, options: TransferOptions) -> Self {
        Self {
            client: Arc::new(client),
            options,
            flights: SingleFlightGroup::new(),
        }
    }

    pub fn options(&self) -> &TransferOptions { &self.options }

    /// Start a transfer, or attach to the one already running for the same
    /// key.
    ///
    /// A handle attached late first receives every event published so far.
    /// Must be called within a Tokio runtime.
    pub fn start(&self, request: TransferRequest) -> TransferHandle {
        let key = request.key().to_string();
        let mut joined = None;
        let mut first = None;
        let flight = self.flights.join_live_or_start(
            key.clone(),
            |run| {
                joined = run.attach();
                joined.is_some()
            },
            || {
                let run = TransferRun::new(key.clone());
                first = Some(run.subscribe());
                run
            },
        );

        match flight {
            Flight::Follower(run) => {
                debug!(key = %key, "joined transfer in flight");
                joined.unwrap_or_else(|| run.subscribe())
            }
            Flight::Leader { value: run, lease } => {
                let handle = first.unwrap_or_else(|| run.subscribe());
                let capacity = self.options.buffer_capacity;
                tokio::spawn(drive(Arc::clone(&self.client), request, run, capacity, lease));
                handle
            }
        }
    }

    /// Whether a transfer for `key` is currently in flight.
    pub fn is_active(&self, key: &str) -> bool { self.flights.contains(&key.to_string()) }
}

async fn drive<C>(
    client: Arc<C>,
    request: TransferRequest,
    run: Arc<TransferRun>,
    capacity: usize,
    lease: FlightLease<String, Arc<TransferRun>>,
) where
    C: HttpClient + 'static,
{
    debug!(key = run.key(), url = %request.url, "transfer started");
    tokio::select! {
        biased;

        () = run.token().cancelled() => {
            debug!(key = run.key(), "transfer cancelled");
            run.close();
        }
        outcome = transfer(client.as_ref(), &request, &run, capacity) => match outcome {
            Ok(completed) => {
                info!(key = run.key(), bytes = completed.bytes.len(), "transfer complete");
                run.publish(TransferEvent::Complete(completed));
            }
            Err(e) => {
                warn!(key = run.key(), error = %e, "transfer failed");
                run.publish(TransferEvent::Failed(e));
            }
        },
    }
    drop(lease);
}

async fn transfer<C: HttpClient>(
    client: &C,
    request: &TransferRequest,
    run: &TransferRun,
    capacity: usize,
) -> Result<Completed> {
    let reader = ChunkReader::open(client, request).await?;
    let total = reader.total_hint();
    let content_type = reader.meta().content_type.clone();
    let (pump, mut progress, mut body) = tee(reader.into_stream(), capacity);

    let report = async {
        let mut loaded = 0u64;
        while let Some(Ok(chunk)) = progress.next().await {
            loaded += chunk.len() as u64;
            run.publish(TransferEvent::Progress(Progress::new(loaded, total)));
        }
    };
    let collect = async {
        let mut chunks = Vec::new();
        while let Some(chunk) = body.next().await {
            chunks.push(chunk?);
        }
        Ok::<_, Error>(chunks)
    };

    let (_, (), chunks) = tokio::join!(pump, report, collect);
    Ok(Completed {
        bytes: assemble(chunks?),
        content_type,
    })
}
