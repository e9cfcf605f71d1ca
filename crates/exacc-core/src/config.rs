use crate::errors::EvalError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_TIMEOUT_SECONDS: f64 = 30.0;
pub const DEFAULT_CONCURRENCY: usize = 10;
pub const DEFAULT_DB_EXTENSION: &str = "sqlite";

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AnswerFormat {
    #[default]
    #[serde(alias = "codeblock")]
    CodeBlock,
    Boxed,
    #[serde(alias = "use_regex")]
    CustomRegex,
}

impl AnswerFormat {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "code_block" | "codeblock" => Some(AnswerFormat::CodeBlock),
            "boxed" => Some(AnswerFormat::Boxed),
            "custom_regex" | "use_regex" | "regex" => Some(AnswerFormat::CustomRegex),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AnswerFormat::CodeBlock => "code_block",
            AnswerFormat::Boxed => "boxed",
            AnswerFormat::CustomRegex => "custom_regex",
        }
    }
}

/// Everything a run needs besides the input files' contents.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EvalSettings {
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: f64,
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
    #[serde(default)]
    pub answer_format: AnswerFormat,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extraction_regex: Option<String>,
    #[serde(default)]
    pub regex_dotall: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata_path: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub db_root: Option<PathBuf>,
    #[serde(default = "default_db_extension")]
    pub db_extension: String,
}

fn default_timeout_seconds() -> f64 {
    DEFAULT_TIMEOUT_SECONDS
}

fn default_concurrency() -> usize {
    DEFAULT_CONCURRENCY
}

fn default_db_extension() -> String {
    DEFAULT_DB_EXTENSION.to_string()
}

impl Default for EvalSettings {
    fn default() -> Self {
        Self {
            timeout_seconds: DEFAULT_TIMEOUT_SECONDS,
            concurrency: DEFAULT_CONCURRENCY,
            answer_format: AnswerFormat::default(),
            extraction_regex: None,
            regex_dotall: false,
            metadata_path: None,
            db_root: None,
            db_extension: default_db_extension(),
        }
    }
}

/// Command-line values that take precedence over the config file.
#[derive(Debug, Clone, Default)]
pub struct SettingsOverrides {
    pub timeout_seconds: Option<f64>,
    pub concurrency: Option<usize>,
    pub answer_format: Option<AnswerFormat>,
    pub extraction_regex: Option<String>,
    pub regex_dotall: Option<bool>,
    pub metadata_path: Option<PathBuf>,
    pub db_root: Option<PathBuf>,
    pub db_extension: Option<String>,
}

impl EvalSettings {
    /// Falls back to the default for values `validate()` would reject.
    pub fn timeout(&self) -> Duration {
        Duration::try_from_secs_f64(self.timeout_seconds)
            .unwrap_or(Duration::from_secs(DEFAULT_TIMEOUT_SECONDS as u64))
    }

    pub fn concurrency_limit(&self) -> usize {
        self.concurrency.max(1)
    }

    pub fn apply(&mut self, o: SettingsOverrides) {
        if let Some(v) = o.timeout_seconds {
            self.timeout_seconds = v;
        }
        if let Some(v) = o.concurrency {
            self.concurrency = v;
        }
        if let Some(v) = o.answer_format {
            self.answer_format = v;
        }
        if o.extraction_regex.is_some() {
            self.extraction_regex = o.extraction_regex;
        }
        if let Some(v) = o.regex_dotall {
            self.regex_dotall = v;
        }
        if o.metadata_path.is_some() {
            self.metadata_path = o.metadata_path;
        }
        if o.db_root.is_some() {
            self.db_root = o.db_root;
        }
        if let Some(v) = o.db_extension {
            self.db_extension = v;
        }
    }

    /// Checks the fields the engine relies on. Paths are only checked for
    /// presence here; the dataset loader reports missing files.
    pub fn validate(&self) -> Result<(), EvalError> {
        if !self.timeout_seconds.is_finite()
            || self.timeout_seconds <= 0.0
            || Duration::try_from_secs_f64(self.timeout_seconds).is_err()
        {
            return Err(EvalError::Config(format!(
                "timeout_seconds must be a positive number, got {}",
                self.timeout_seconds
            )));
        }
        if self.answer_format == AnswerFormat::CustomRegex
            && self
                .extraction_regex
                .as_deref()
                .map_or(true, |r| r.trim().is_empty())
        {
            return Err(EvalError::Config(
                "answer_format 'custom_regex' requires extraction_regex".into(),
            ));
        }
        if self.metadata_path.is_none() {
            return Err(EvalError::Config("metadata_path is not set".into()));
        }
        if self.db_root.is_none() {
            return Err(EvalError::Config("db_root is not set".into()));
        }
        if self.db_extension.trim().is_empty() {
            return Err(EvalError::Config("db_extension must not be empty".into()));
        }
        Ok(())
    }
}

/// Loads settings from a YAML file.
///
/// Unknown keys are collected with `serde_ignored`: with `strict` they are an
/// error, otherwise they are logged and skipped. Relative paths are resolved
/// against the directory holding the config file.
pub fn load_settings(path: &Path, strict: bool) -> Result<EvalSettings, EvalError> {
    let raw = std::fs::read_to_string(path).map_err(|e| EvalError::io(path, e))?;
    let (mut settings, ignored) = parse_settings(&raw).map_err(|e| EvalError::parse(path, e))?;

    if !ignored.is_empty() {
        if strict {
            return Err(EvalError::Config(format!(
                "Unknown fields detected in strict mode: {:?} (file: {})",
                ignored,
                path.display()
            )));
        }
        tracing::warn!(
            event = "exacc.config.ignored_keys",
            keys = ?ignored,
            file = %path.display(),
            "Ignored unknown config fields"
        );
    }

    let base = path.parent().unwrap_or(Path::new("."));
    resolve_relative(&mut settings.metadata_path, base);
    resolve_relative(&mut settings.db_root, base);

    Ok(settings)
}

fn parse_settings(raw: &str) -> Result<(EvalSettings, BTreeSet<String>), serde_yaml::Error> {
    let mut ignored = BTreeSet::new();
    if raw.trim().is_empty() {
        return Ok((EvalSettings::default(), ignored));
    }
    let de = serde_yaml::Deserializer::from_str(raw);
    let settings: EvalSettings = serde_ignored::deserialize(de, |p| {
        ignored.insert(p.to_string());
    })?;
    Ok((settings, ignored))
}

fn resolve_relative(slot: &mut Option<PathBuf>, base: &Path) {
    if let Some(p) = slot.as_ref() {
        if p.is_relative() {
            *slot = Some(base.join(p));
        }
    }
}

pub fn write_sample_config(path: &Path) -> Result<(), EvalError> {
    std::fs::write(
        path,
        r#"# exacc evaluation settings
# Paths are relative to this file.
metadata_path: data/dev.json
db_root: data/dev_databases
db_extension: sqlite

# Seconds a single item may run before it is scored as a timeout.
timeout_seconds: 30
# Items evaluated at the same time.
concurrency: 10

# code_block | boxed | custom_regex
answer_format: code_block
# extraction_regex: "<answer>(.*?)</answer>"
# regex_dotall: true
"#,
    )
    .map_err(|e| EvalError::io(path, e))?;
    Ok(())
}
