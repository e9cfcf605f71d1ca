//! Ground-truth health check: runs every reference query on its own.

use crate::engine::comparator::SqliteComparator;
use crate::engine::executor::{run_bounded, Bounded};
use crate::model::BenchmarkItem;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ProbeStatus {
    Ok { rows: usize },
    Failed { error: String },
    Timeout,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ProbeResult {
    pub index: usize,
    pub db_path: String,
    #[serde(flatten)]
    pub status: ProbeStatus,
}

impl ProbeResult {
    pub fn is_ok(&self) -> bool {
        matches!(self.status, ProbeStatus::Ok { .. })
    }
}

/// Executes each ground-truth query under the same limits as an evaluation
/// run. Results come back in input order.
pub async fn probe_ground_truths(
    items: &[BenchmarkItem],
    timeout: Duration,
    concurrency: usize,
) -> Vec<ProbeResult> {
    let sem = Arc::new(Semaphore::new(concurrency.max(1)));
    let comparator = Arc::new(SqliteComparator::new());
    let mut handles = Vec::with_capacity(items.len());

    for item in items {
        let permit = sem.clone().acquire_owned().await.ok();
        let comparator = comparator.clone();
        let sql = item.ground_truth_sql.clone();
        let db = item.db_path.clone();
        handles.push(tokio::spawn(async move {
            let _permit = permit;
            run_bounded(timeout, move |cancel| comparator.probe(&sql, &db, cancel)).await
        }));
    }

    let mut out = Vec::with_capacity(items.len());
    for (item, h) in items.iter().zip(handles) {
        let status = match h.await {
            Ok(Bounded::Done(rows)) => ProbeStatus::Ok { rows },
            Ok(Bounded::Failed(e)) => ProbeStatus::Failed {
                error: e.to_string(),
            },
            Ok(Bounded::TimedOut) => ProbeStatus::Timeout,
            Ok(Bounded::Panicked(msg)) => ProbeStatus::Failed { error: msg },
            Err(e) => ProbeStatus::Failed {
                error: e.to_string(),
            },
        };
        if !matches!(status, ProbeStatus::Ok { .. }) {
            tracing::warn!(
                event = "exacc.ground_truth.failed",
                index = item.index,
                db = %item.db_path.display(),
                status = ?status
            );
        }
        out.push(ProbeResult {
            index: item.index,
            db_path: item.db_path.display().to_string(),
            status,
        });
    }
    out
}
