//! Pending Transaction Listener
//!
//! Consumes the pending-transaction subscription and handles every reported
//! hash in its own task: fetch the transaction, apply the watch rule, emit
//! the report. Tasks share only read-only configuration, and reports may be
//! emitted in a different order than the hashes arrived.

use std::sync::Arc;

use alloy::primitives::TxHash;
use futures::{Stream, StreamExt};
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

use crate::report::{Report, ReportSink};
use crate::source::{
    connect, subscribe_pending, Endpoint, NodeSource, PendingEvent, SourceError, TransactionSource,
};
use crate::watch::Watch;

/// What happened to a single pending transaction hash
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventOutcome {
    /// The transaction matched and a report was emitted
    Reported,
    /// The transaction was fetched but did not match
    Ignored,
    /// The node no longer knows the transaction
    Missing,
    /// The lookup failed; the event is dropped without retry
    FetchFailed(SourceError),
}

/// Counters returned once the subscription ends
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ListenOutcome {
    /// Hashes received and dispatched
    pub events: u64,
    /// Subscription notifications that carried an error
    pub subscription_errors: u64,
}

/// Handle one pending transaction hash
pub async fn process_event<S>(
    hash: TxHash,
    source: &S,
    watch: &Watch,
    sink: &dyn ReportSink,
) -> EventOutcome
where
    S: TransactionSource + ?Sized,
{
    let record = match source.fetch(hash).await {
        Ok(Some(record)) => record,
        Ok(None) => {
            debug!(%hash, "Pending transaction no longer known to node");
            return EventOutcome::Missing;
        }
        Err(e) => {
            debug!(%hash, "Failed to fetch pending transaction: {}", e);
            return EventOutcome::FetchFailed(e);
        }
    };

    let Some(report) = watch.inspect(&record) else {
        return EventOutcome::Ignored;
    };

    if let Report::Matched {
        solution: Err(e), ..
    } = &report
    {
        warn!(%hash, "Matched call carries an undecodable argument: {}", e);
    }

    sink.emit(&report);
    EventOutcome::Reported
}

/// Run until the subscription stream ends
///
/// Subscription errors skip the affected notification only. Each hash is
/// processed by a freshly spawned task; there is no concurrency limit.
/// In-flight tasks are drained before returning.
pub async fn listen<E, S>(
    events: E,
    source: Arc<S>,
    watch: Arc<Watch>,
    sink: Arc<dyn ReportSink>,
) -> ListenOutcome
where
    E: Stream<Item = PendingEvent>,
    S: TransactionSource + ?Sized + 'static,
{
    let mut events = std::pin::pin!(events);
    let mut in_flight: JoinSet<EventOutcome> = JoinSet::new();
    let mut outcome = ListenOutcome::default();

    info!(watch = watch.name(), "Listening for pending transactions");

    loop {
        tokio::select! {
            event = events.next() => match event {
                Some(Ok(hash)) => {
                    outcome.events += 1;
                    let source = Arc::clone(&source);
                    let watch = Arc::clone(&watch);
                    let sink = Arc::clone(&sink);
                    in_flight.spawn(async move {
                        process_event(hash, source.as_ref(), &watch, sink.as_ref()).await
                    });
                }
                Some(Err(e)) => {
                    outcome.subscription_errors += 1;
                    warn!("Subscription error, skipping notification: {}", e);
                }
                None => break,
            },
            Some(joined) = in_flight.join_next(), if !in_flight.is_empty() => {
                log_joined(joined);
            }
        }
    }

    info!(
        events = outcome.events,
        in_flight = in_flight.len(),
        "Subscription ended, draining in-flight lookups"
    );
    while let Some(joined) = in_flight.join_next().await {
        log_joined(joined);
    }

    outcome
}

/// Connect to `endpoint`, subscribe, and listen until the subscription ends
pub async fn run(
    endpoint: &Endpoint,
    connect_timeout_ms: u64,
    watch: Watch,
    sink: Arc<dyn ReportSink>,
) -> Result<ListenOutcome, SourceError> {
    let provider = connect(endpoint, connect_timeout_ms).await?;
    let events = subscribe_pending(&provider).await?;
    let source = Arc::new(NodeSource::new(provider.clone()));
    Ok(listen(events, source, Arc::new(watch), sink).await)
}

fn log_joined(joined: Result<EventOutcome, tokio::task::JoinError>) {
    if let Err(e) = joined {
        error!("Event task failed: {}", e);
    }
}
