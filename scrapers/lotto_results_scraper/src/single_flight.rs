use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::{watch, Mutex};
use tracing::debug;

use crate::error::{Result, ScrapeError};
use crate::types::RunSummary;

type SharedOutcome = std::result::Result<RunSummary, String>;

/// Serializes fetch-parse-ingest cycles process-wide.
///
/// One caller leads; a single waiter may queue behind it and receives a
/// clone of the leader's outcome instead of triggering a second fetch (all
/// games share one source page, so the in-flight result answers the waiter
/// too). Any further caller fails fast with [`ScrapeError::Busy`].
/// Scheduler ticks use [`SingleFlight::try_run`] and skip instead of
/// queueing; the next tick re-evaluates.
pub struct SingleFlight {
    lock: Mutex<()>,
    waiters: AtomicUsize,
    outcome_tx: watch::Sender<Option<SharedOutcome>>,
}

impl SingleFlight {
    pub fn new() -> Self {
        let (outcome_tx, _) = watch::channel(None);
        Self {
            lock: Mutex::new(()),
            waiters: AtomicUsize::new(0),
            outcome_tx,
        }
    }

    /// Run `work` as leader, join the in-flight run, or fail fast.
    pub async fn run<F, Fut>(&self, work: F) -> Result<RunSummary>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<RunSummary>>,
    {
        if let Ok(guard) = self.lock.try_lock() {
            let result = work().await;
            self.publish(&result);
            drop(guard);
            return result;
        }

        // Queue depth is one: a second waiter is refused outright.
        if self.waiters.fetch_add(1, Ordering::SeqCst) >= 1 {
            self.waiters.fetch_sub(1, Ordering::SeqCst);
            return Err(ScrapeError::Busy);
        }

        debug!("joining in-flight scrape cycle");
        // The leader publishes its outcome before releasing the lock, so
        // acquiring it here means the shared outcome is current.
        let guard = self.lock.lock().await;
        self.waiters.fetch_sub(1, Ordering::SeqCst);
        let outcome = self.outcome_tx.borrow().clone();
        drop(guard);

        match outcome {
            Some(Ok(summary)) => Ok(summary),
            Some(Err(message)) => Err(ScrapeError::InFlight(message)),
            None => Err(ScrapeError::Busy),
        }
    }

    /// Run `work` if nothing is in flight; otherwise return `None`.
    pub async fn try_run<F, Fut>(&self, work: F) -> Option<Result<RunSummary>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<RunSummary>>,
    {
        let guard = self.lock.try_lock().ok()?;
        let result = work().await;
        self.publish(&result);
        drop(guard);
        Some(result)
    }

    fn publish(&self, result: &Result<RunSummary>) {
        let shared = match result {
            Ok(summary) => Ok(summary.clone()),
            Err(e) => Err(e.to_string()),
        };
        // send_replace stores the value even with no receivers subscribed;
        // waiters read it via borrow() after taking the lock
        self.outcome_tx.send_replace(Some(shared));
    }
}

impl Default for SingleFlight {
    fn default() -> Self {
        Self::new()
    }
}
