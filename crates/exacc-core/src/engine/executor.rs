use crate::engine::comparator::ResultComparator;
use crate::errors::CompareError;
use crate::model::{BenchmarkItem, ExtractedAnswer, Outcome, ScoredResult};
use rusqlite::Connection;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

// VM instructions between cancel checks.
const PROGRESS_OPS: std::os::raw::c_int = 1_000;

/// Best-effort cancellation for one unit of blocking work.
///
/// The worker guards its connection with the handle; once the caller cancels,
/// SQLite aborts the running statement at its next progress check and any
/// statement started later fails straight away.
#[derive(Debug, Clone, Default)]
pub struct CancelHandle {
    cancelled: Arc<AtomicBool>,
}

impl CancelHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    pub fn guard(&self, conn: &Connection) {
        let flag = self.cancelled.clone();
        conn.progress_handler(PROGRESS_OPS, Some(move || flag.load(Ordering::Relaxed)));
    }
}

/// How a bounded unit of work ended.
#[derive(Debug)]
pub enum Bounded<T> {
    Done(T),
    Failed(CompareError),
    TimedOut,
    Panicked(String),
}

/// Runs `job` on the blocking pool and gives up on it after `timeout`.
///
/// The caller resumes by the deadline whether or not the job has stopped. An
/// abandoned job is signalled through its [`CancelHandle`] and its result is
/// discarded; it holds no resource anyone else will reuse.
pub async fn run_bounded<T, F>(timeout: Duration, job: F) -> Bounded<T>
where
    F: FnOnce(&CancelHandle) -> Result<T, CompareError> + Send + 'static,
    T: Send + 'static,
{
    let cancel = CancelHandle::new();
    let worker_cancel = cancel.clone();
    let handle = tokio::task::spawn_blocking(move || job(&worker_cancel));

    match tokio::time::timeout(timeout, handle).await {
        Ok(Ok(Ok(v))) => Bounded::Done(v),
        Ok(Ok(Err(CompareError::Interrupted))) => Bounded::TimedOut,
        Ok(Ok(Err(e))) => Bounded::Failed(e),
        Ok(Err(join)) => Bounded::Panicked(join_message(join)),
        Err(_) => {
            cancel.cancel();
            Bounded::TimedOut
        }
    }
}

fn join_message(e: tokio::task::JoinError) -> String {
    if !e.is_panic() {
        return e.to_string();
    }
    let payload = e.into_panic();
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "panic with non-string payload".to_string()
    }
}

/// Scores one item under a wall-clock deadline.
#[derive(Clone)]
pub struct BoundedExecutor {
    comparator: Arc<dyn ResultComparator>,
    timeout: Duration,
}

impl BoundedExecutor {
    pub fn new(comparator: Arc<dyn ResultComparator>, timeout: Duration) -> Self {
        Self {
            comparator,
            timeout,
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub async fn run(&self, item: &BenchmarkItem, answer: &ExtractedAnswer) -> ScoredResult {
        let start = Instant::now();
        let comparator = self.comparator.clone();
        let predicted = answer.predicted_sql.clone();
        let ground_truth = item.ground_truth_sql.clone();
        let db_path = item.db_path.clone();

        let bounded = run_bounded(self.timeout, move |cancel| {
            comparator.compare(&predicted, &ground_truth, &db_path, cancel)
        })
        .await;

        let outcome = match bounded {
            Bounded::Done(true) => Outcome::Correct,
            Bounded::Done(false) => Outcome::Incorrect,
            Bounded::TimedOut => {
                tracing::warn!(
                    event = "exacc.item.timeout",
                    index = item.index,
                    timeout_ms = self.timeout.as_millis() as u64,
                    "item exceeded its deadline"
                );
                Outcome::Timeout
            }
            Bounded::Failed(e) if e.is_benchmark_fault() => {
                tracing::error!(
                    event = "exacc.ground_truth.failed",
                    index = item.index,
                    db = %item.db_path.display(),
                    error = %e,
                    "ground truth could not be executed; the benchmark entry is broken"
                );
                Outcome::ExecutionError
            }
            Bounded::Failed(e) => {
                tracing::debug!(
                    event = "exacc.predicted.failed",
                    index = item.index,
                    error = %e
                );
                Outcome::ExecutionError
            }
            Bounded::Panicked(msg) => {
                tracing::warn!(
                    event = "exacc.item.panicked",
                    index = item.index,
                    message = %msg,
                    "comparison panicked"
                );
                Outcome::ExecutionError
            }
        };

        ScoredResult {
            index: item.index,
            difficulty: item.difficulty,
            outcome,
            predicted_sql: answer.predicted_sql.clone(),
            duration_ms: Some(start.elapsed().as_millis() as u64),
        }
    }
}
