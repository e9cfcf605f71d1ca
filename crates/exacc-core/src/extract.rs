//! Pulls a candidate SQL query out of raw model output.

use crate::config::{AnswerFormat, EvalSettings};
use crate::errors::EvalError;
use crate::model::{ExtractedAnswer, ModelOutput};
use regex::{Regex, RegexBuilder};
use std::sync::Arc;

/// Query substituted when nothing can be extracted. Always valid SQL and
/// never the literal answer to a benchmark question.
pub const SENTINEL_SQL: &str = "SELECT 1";

const CODE_BLOCK_PATTERN: &str = r"(?:```sql)(.*?[a-zA-Z].*?)(?:```)";
const BOXED_PATTERN: &str = r"(?:boxed\{\{)(.*?[a-zA-Z].*?)(?:\}\})";

pub trait AnswerExtractor: Send + Sync {
    /// Returns the cleaned candidate query, or `None` when the text holds none.
    fn extract(&self, text: &str) -> Option<String>;
}

pub struct RegexExtractor {
    pattern: Regex,
    cleanup: Cleanup,
}

impl RegexExtractor {
    pub fn new(pattern: &str, dotall: bool) -> Result<Self, EvalError> {
        let pattern = RegexBuilder::new(pattern)
            .dot_matches_new_line(dotall)
            .build()
            .map_err(|e| {
                EvalError::Config(format!("invalid extraction regex '{}': {}", pattern, e))
            })?;
        Ok(Self {
            pattern,
            cleanup: Cleanup::new()?,
        })
    }

    pub fn code_block() -> Result<Self, EvalError> {
        Self::new(CODE_BLOCK_PATTERN, true)
    }

    pub fn boxed() -> Result<Self, EvalError> {
        Self::new(BOXED_PATTERN, true)
    }
}

impl AnswerExtractor for RegexExtractor {
    fn extract(&self, text: &str) -> Option<String> {
        // The last match wins: models often restate a draft before the answer.
        let caps = self.pattern.captures_iter(text).last()?;
        let raw = caps.get(1).or_else(|| caps.get(0))?.as_str();
        let cleaned = self.cleanup.apply(raw);
        if cleaned.is_empty() {
            None
        } else {
            Some(cleaned)
        }
    }
}

struct Cleanup {
    line_comment: Regex,
    whitespace: Regex,
    bold_header: Regex,
}

impl Cleanup {
    fn new() -> Result<Self, EvalError> {
        let build = |p: &str| {
            Regex::new(p).map_err(|e| EvalError::Config(format!("cleanup regex '{}': {}", p, e)))
        };
        Ok(Self {
            line_comment: build(r"--.*")?,
            whitespace: build(r"\s+")?,
            bold_header: build(r"^\*\*.*\*\*")?,
        })
    }

    fn apply(&self, raw: &str) -> String {
        let s = self.line_comment.replace_all(raw, "");
        let s = self.whitespace.replace_all(&s, " ");
        let s = self.bold_header.replace(s.trim_start(), "");
        s.trim().to_string()
    }
}

/// Builds the extractor the settings ask for.
pub fn from_settings(settings: &EvalSettings) -> Result<Arc<dyn AnswerExtractor>, EvalError> {
    let extractor = match settings.answer_format {
        AnswerFormat::CodeBlock => RegexExtractor::code_block()?,
        AnswerFormat::Boxed => RegexExtractor::boxed()?,
        AnswerFormat::CustomRegex => {
            let pattern = settings.extraction_regex.as_deref().ok_or_else(|| {
                EvalError::Config("answer_format 'custom_regex' requires extraction_regex".into())
            })?;
            RegexExtractor::new(pattern, settings.regex_dotall)?
        }
    };
    Ok(Arc::new(extractor))
}

/// Extracts an answer for one model output, substituting [`SENTINEL_SQL`]
/// when extraction fails.
pub fn extract_answer(extractor: &dyn AnswerExtractor, output: &ModelOutput) -> ExtractedAnswer {
    match extractor.extract(&output.raw_text) {
        Some(sql) => ExtractedAnswer {
            index: output.index,
            predicted_sql: sql,
            extracted: true,
        },
        None => {
            tracing::debug!(
                event = "exacc.extract.sentinel",
                index = output.index,
                "no query found in model output, using sentinel"
            );
            ExtractedAnswer {
                index: output.index,
                predicted_sql: SENTINEL_SQL.to_string(),
                extracted: false,
            }
        }
    }
}
