use crate::engine::executor::BoundedExecutor;
use crate::model::{BenchmarkItem, ExtractedAnswer, Outcome, ScoredResult};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Semaphore;

/// Fans items out to the bounded executor, at most `concurrency` at a time.
pub struct EvaluationScheduler {
    executor: BoundedExecutor,
    concurrency: usize,
}

impl EvaluationScheduler {
    pub fn new(executor: BoundedExecutor, concurrency: usize) -> Self {
        Self {
            executor,
            concurrency: concurrency.max(1),
        }
    }

    /// Scores every item and returns the results in input order.
    ///
    /// Never fails as a whole: a task that dies is scored as an execution
    /// error for its own item. Items start in input order; completion order
    /// is arbitrary.
    pub async fn evaluate_all(
        &self,
        items: Vec<(BenchmarkItem, ExtractedAnswer)>,
    ) -> Vec<ScoredResult> {
        let total = items.len();
        let started = Instant::now();
        tracing::info!(
            event = "exacc.run.start",
            items = total,
            concurrency = self.concurrency,
            timeout_ms = self.executor.timeout().as_millis() as u64
        );

        let sem = Arc::new(Semaphore::new(self.concurrency));
        let mut handles = Vec::with_capacity(total);
        let mut fallbacks = Vec::with_capacity(total);

        for (item, answer) in items {
            fallbacks.push(ScoredResult {
                index: item.index,
                difficulty: item.difficulty,
                outcome: Outcome::ExecutionError,
                predicted_sql: answer.predicted_sql.clone(),
                duration_ms: None,
            });

            // Taken before spawning so items start in input order. The
            // semaphore is never closed; a missing permit only means running
            // unthrottled.
            let permit = sem.clone().acquire_owned().await.ok();
            let executor = self.executor.clone();
            let h = tokio::spawn(async move {
                let _permit = permit;
                let result = executor.run(&item, &answer).await;
                tracing::debug!(
                    event = "exacc.item.done",
                    index = result.index,
                    outcome = result.outcome.as_str(),
                    duration_ms = ?result.duration_ms
                );
                result
            });
            handles.push(h);
        }

        let mut results = Vec::with_capacity(total);
        for (h, fallback) in handles.into_iter().zip(fallbacks) {
            let row = match h.await {
                Ok(row) => row,
                Err(e) => {
                    tracing::warn!(
                        event = "exacc.item.task_failed",
                        index = fallback.index,
                        error = %e
                    );
                    fallback
                }
            };
            results.push(row);
        }

        tracing::info!(
            event = "exacc.run.finish",
            items = results.len(),
            correct = results.iter().filter(|r| r.outcome.is_correct()).count(),
            elapsed_ms = started.elapsed().as_millis() as u64
        );
        results
    }
}
