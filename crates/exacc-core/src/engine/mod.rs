pub mod comparator;
pub mod executor;
pub mod probe;
pub mod runner;

use crate::extract::{extract_answer, AnswerExtractor};
use crate::model::{BenchmarkItem, ExtractedAnswer, ModelOutput};

/// Runs answer extraction for every paired item, keeping input order.
pub fn prepare(
    pairs: Vec<(BenchmarkItem, ModelOutput)>,
    extractor: &dyn AnswerExtractor,
) -> Vec<(BenchmarkItem, ExtractedAnswer)> {
    pairs
        .into_iter()
        .map(|(item, output)| {
            let answer = extract_answer(extractor, &output);
            (item, answer)
        })
        .collect()
}
