use crate::model::{
    Accuracy, AccuracyReport, Difficulty, Outcome, OutcomeCounts, ScoredResult, TierAccuracy,
};
use std::collections::BTreeMap;

/// Percentage of correct items; an empty bucket reports 0.0 rather than NaN.
pub fn accuracy(correct: usize, total: usize) -> Accuracy {
    let accuracy_pct = if total == 0 {
        0.0
    } else {
        100.0 * correct as f64 / total as f64
    };
    Accuracy {
        correct,
        total,
        accuracy_pct,
    }
}

#[derive(Default)]
struct Tally {
    correct: usize,
    total: usize,
}

impl Tally {
    fn push(&mut self, outcome: Outcome) {
        self.total += 1;
        if outcome.is_correct() {
            self.correct += 1;
        }
    }
}

/// Buckets results by difficulty and computes per-tier and overall accuracy.
///
/// Timeouts and execution errors count as incorrect and stay in every
/// denominator. All tiers appear in the report, empty ones as 0/0.
pub fn aggregate(results: &[ScoredResult]) -> AccuracyReport {
    let mut tiers: BTreeMap<Difficulty, Tally> = Difficulty::ALL
        .iter()
        .map(|d| (*d, Tally::default()))
        .collect();
    let mut overall = Tally::default();
    let mut outcomes = OutcomeCounts::default();

    for r in results {
        tiers.entry(r.difficulty).or_default().push(r.outcome);
        overall.push(r.outcome);
        match r.outcome {
            Outcome::Correct => outcomes.correct += 1,
            Outcome::Incorrect => outcomes.incorrect += 1,
            Outcome::Timeout => outcomes.timeout += 1,
            Outcome::ExecutionError => outcomes.execution_error += 1,
        }
    }

    AccuracyReport {
        tiers: tiers
            .into_iter()
            .map(|(difficulty, t)| TierAccuracy {
                difficulty,
                accuracy: accuracy(t.correct, t.total),
            })
            .collect(),
        overall: accuracy(overall.correct, overall.total),
        outcomes,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scored(index: usize, difficulty: Difficulty, outcome: Outcome) -> ScoredResult {
        ScoredResult {
            index,
            difficulty,
            outcome,
            predicted_sql: "SELECT 1".into(),
            duration_ms: None,
        }
    }

    #[test]
    fn test_per_tier_accuracy() {
        let results = vec![
            scored(0, Difficulty::Simple, Outcome::Correct),
            scored(1, Difficulty::Simple, Outcome::Incorrect),
            scored(2, Difficulty::Moderate, Outcome::Correct),
            scored(3, Difficulty::Challenging, Outcome::Timeout),
        ];
        let report = aggregate(&results);

        let simple = report.tier(Difficulty::Simple);
        assert_eq!((simple.correct, simple.total), (1, 2));
        assert!((simple.accuracy_pct - 50.0).abs() < 1e-9);
        assert_eq!(report.tier(Difficulty::Moderate).accuracy_pct, 100.0);
        assert_eq!(report.tier(Difficulty::Challenging).accuracy_pct, 0.0);
        assert_eq!(report.overall.correct, 2);
        assert_eq!(report.overall.total, 4);
        assert!((report.overall.accuracy_pct - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_failures_stay_in_denominator() {
        let results = vec![
            scored(0, Difficulty::Simple, Outcome::Correct),
            scored(1, Difficulty::Simple, Outcome::Timeout),
            scored(2, Difficulty::Simple, Outcome::ExecutionError),
        ];
        let report = aggregate(&results);
        assert_eq!(report.tier(Difficulty::Simple).total, 3);
        assert_eq!(report.outcomes.timeout, 1);
        assert_eq!(report.outcomes.execution_error, 1);
    }

    #[test]
    fn test_empty_tier_reports_zero() {
        let results = vec![scored(0, Difficulty::Simple, Outcome::Correct)];
        let report = aggregate(&results);
        assert_eq!(report.tiers.len(), 3);
        let challenging = report.tier(Difficulty::Challenging);
        assert_eq!((challenging.correct, challenging.total), (0, 0));
        assert_eq!(challenging.accuracy_pct, 0.0);
    }

    #[test]
    fn test_empty_input() {
        let report = aggregate(&[]);
        assert_eq!(report.overall.total, 0);
        assert_eq!(report.overall.accuracy_pct, 0.0);
    }

    #[test]
    fn test_tier_sums_match_overall() {
        let outcomes = [
            Outcome::Correct,
            Outcome::Incorrect,
            Outcome::Timeout,
            Outcome::ExecutionError,
        ];
        let results: Vec<_> = (0..97)
            .map(|i| {
                scored(
                    i,
                    Difficulty::ALL[(i * 7) % 3],
                    outcomes[(i * 5 + i / 3) % outcomes.len()],
                )
            })
            .collect();
        let report = aggregate(&results);
        let correct: usize = report.tiers.iter().map(|t| t.accuracy.correct).sum();
        let total: usize = report.tiers.iter().map(|t| t.accuracy.total).sum();
        assert_eq!(correct, report.overall.correct);
        assert_eq!(total, results.len());
    }

    #[test]
    fn test_aggregate_is_deterministic() {
        let results = vec![
            scored(0, Difficulty::Moderate, Outcome::Correct),
            scored(1, Difficulty::Simple, Outcome::Incorrect),
        ];
        assert_eq!(aggregate(&results), aggregate(&results));
    }
}
