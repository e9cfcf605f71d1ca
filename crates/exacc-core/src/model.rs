use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
    Simple,
    Moderate,
    Challenging,
}

impl Difficulty {
    /// Report column order.
    pub const ALL: [Difficulty; 3] = [
        Difficulty::Simple,
        Difficulty::Moderate,
        Difficulty::Challenging,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Simple => "simple",
            Difficulty::Moderate => "moderate",
            Difficulty::Challenging => "challenging",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "simple" => Some(Difficulty::Simple),
            "moderate" => Some(Difficulty::Moderate),
            "challenging" => Some(Difficulty::Challenging),
            _ => None,
        }
    }
}

impl std::fmt::Display for Difficulty {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One question/ground-truth/database triple, immutable after load.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BenchmarkItem {
    pub index: usize,
    pub difficulty: Difficulty,
    pub db_path: PathBuf,
    pub ground_truth_sql: String,
}

/// A model generation together with the original record it came from.
///
/// `record` keeps every field of the input line so the scored output can be
/// written back without losing anything the generation step attached.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelOutput {
    pub index: usize,
    pub raw_text: String,
    pub record: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ExtractedAnswer {
    pub index: usize,
    pub predicted_sql: String,
    /// False when the sentinel query was substituted.
    pub extracted: bool,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Correct,
    Incorrect,
    Timeout,
    ExecutionError,
}

impl Outcome {
    pub fn is_correct(&self) -> bool {
        matches!(self, Outcome::Correct)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::Correct => "correct",
            Outcome::Incorrect => "incorrect",
            Outcome::Timeout => "timeout",
            Outcome::ExecutionError => "execution_error",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScoredResult {
    pub index: usize,
    pub difficulty: Difficulty,
    pub outcome: Outcome,
    pub predicted_sql: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct Accuracy {
    pub correct: usize,
    pub total: usize,
    pub accuracy_pct: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TierAccuracy {
    pub difficulty: Difficulty,
    #[serde(flatten)]
    pub accuracy: Accuracy,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct OutcomeCounts {
    pub correct: usize,
    pub incorrect: usize,
    pub timeout: usize,
    pub execution_error: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AccuracyReport {
    pub tiers: Vec<TierAccuracy>,
    pub overall: Accuracy,
    pub outcomes: OutcomeCounts,
}

impl AccuracyReport {
    pub fn tier(&self, difficulty: Difficulty) -> Accuracy {
        self.tiers
            .iter()
            .find(|t| t.difficulty == difficulty)
            .map(|t| t.accuracy)
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_difficulty_parse_is_case_insensitive() {
        assert_eq!(Difficulty::parse("Simple"), Some(Difficulty::Simple));
        assert_eq!(Difficulty::parse(" challenging "), Some(Difficulty::Challenging));
        assert_eq!(Difficulty::parse("hard"), None);
    }

    #[test]
    fn test_outcome_serde_names() {
        let s = serde_json::to_string(&Outcome::ExecutionError).unwrap();
        assert_eq!(s, "\"execution_error\"");
        let o: Outcome = serde_json::from_str("\"timeout\"").unwrap();
        assert_eq!(o, Outcome::Timeout);
    }
}
