//! Reading the benchmark metadata and model outputs, writing scored results.

use crate::errors::{EvalError, EvalResult};
use crate::model::{BenchmarkItem, Difficulty, ModelOutput, ScoredResult};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::io::Write;
use std::path::{Path, PathBuf};

const RAW_TEXT_KEYS: [&str; 3] = ["raw_text", "rawText", "generation"];
const INDEX_KEYS: [&str; 2] = ["index", "sql_index"];

#[derive(Debug, Deserialize)]
struct MetadataEntry {
    #[serde(
        rename = "SQL",
        alias = "sql",
        alias = "solution",
        alias = "ground_truth_sql"
    )]
    sql: String,
    db_id: String,
    difficulty: String,
}

/// Where a benchmark's databases live on disk.
#[derive(Debug, Clone)]
pub struct DbLayout {
    pub root: PathBuf,
    pub extension: String,
}

impl DbLayout {
    pub fn new(root: impl Into<PathBuf>, extension: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            extension: extension.into(),
        }
    }

    /// `<root>/<db_id>/<db_id>.<ext>`
    pub fn resolve(&self, db_id: &str) -> PathBuf {
        self.root
            .join(db_id)
            .join(format!("{}.{}", db_id, self.extension.trim_start_matches('.')))
    }
}

/// Reads a file holding either a JSON array or JSON lines.
pub fn read_records(path: &Path) -> EvalResult<Vec<Value>> {
    let raw = std::fs::read_to_string(path).map_err(|e| EvalError::io(path, e))?;
    parse_records(&raw).map_err(|e| EvalError::parse(path, e))
}

fn parse_records(raw: &str) -> Result<Vec<Value>, String> {
    if raw.trim_start().starts_with('[') {
        return serde_json::from_str(raw).map_err(|e| e.to_string());
    }
    let mut out = Vec::new();
    for (n, line) in raw.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let v = serde_json::from_str(line).map_err(|e| format!("line {}: {}", n + 1, e))?;
        out.push(v);
    }
    Ok(out)
}

/// Loads benchmark items in file order; position is the item index.
///
/// Every referenced database must exist: a missing file would otherwise show
/// up as a wall of execution errors that look like model failures.
pub fn load_benchmark(path: &Path, layout: &DbLayout) -> EvalResult<Vec<BenchmarkItem>> {
    let records = read_records(path)?;
    let mut items = Vec::with_capacity(records.len());

    for (index, record) in records.into_iter().enumerate() {
        let entry: MetadataEntry = serde_json::from_value(record)
            .map_err(|e| EvalError::parse(path, format!("entry {}: {}", index, e)))?;
        let difficulty =
            Difficulty::parse(&entry.difficulty).ok_or_else(|| EvalError::UnknownDifficulty {
                index,
                label: entry.difficulty.clone(),
            })?;
        let db_path = layout.resolve(&entry.db_id);
        if !db_path.is_file() {
            return Err(EvalError::MissingDatabase {
                index,
                path: db_path,
            });
        }
        items.push(BenchmarkItem {
            index,
            difficulty,
            db_path,
            ground_truth_sql: entry.sql,
        });
    }

    tracing::debug!(
        event = "exacc.dataset.loaded",
        file = %path.display(),
        items = items.len()
    );
    Ok(items)
}

/// Loads model outputs. A declared index must match the record's position.
pub fn load_model_outputs(path: &Path) -> EvalResult<Vec<ModelOutput>> {
    let records = read_records(path)?;
    let mut outputs = Vec::with_capacity(records.len());

    for (position, record) in records.into_iter().enumerate() {
        let Value::Object(record) = record else {
            return Err(EvalError::parse(
                path,
                format!("record {} is not a JSON object", position),
            ));
        };

        check_declared_index(path, &record, position)?;

        let raw_text = RAW_TEXT_KEYS
            .iter()
            .find_map(|k| record.get(*k).and_then(Value::as_str))
            .ok_or_else(|| {
                EvalError::parse(
                    path,
                    format!(
                        "record {} has no model text (expected one of {:?})",
                        position, RAW_TEXT_KEYS
                    ),
                )
            })?
            .to_string();

        outputs.push(ModelOutput {
            index: position,
            raw_text,
            record,
        });
    }
    Ok(outputs)
}

/// Every index key present must hold a non-negative integer equal to the
/// record's position.
fn check_declared_index(
    path: &Path,
    record: &Map<String, Value>,
    position: usize,
) -> EvalResult<()> {
    for key in INDEX_KEYS {
        let Some(value) = record.get(key) else {
            continue;
        };
        let declared = value
            .as_u64()
            .and_then(|v| usize::try_from(v).ok())
            .ok_or_else(|| {
                EvalError::parse(
                    path,
                    format!(
                        "record {}: '{}' must be a non-negative integer, got {}",
                        position, key, value
                    ),
                )
            })?;
        if declared != position {
            return Err(EvalError::IndexMismatch { position, declared });
        }
    }
    Ok(())
}

/// Lines the two inputs up item by item.
pub fn pair(
    items: Vec<BenchmarkItem>,
    outputs: Vec<ModelOutput>,
) -> EvalResult<Vec<(BenchmarkItem, ModelOutput)>> {
    if items.len() != outputs.len() {
        return Err(EvalError::CountMismatch {
            metadata: items.len(),
            outputs: outputs.len(),
        });
    }
    items
        .into_iter()
        .zip(outputs)
        .map(|(item, output)| {
            if item.index != output.index {
                return Err(EvalError::IndexMismatch {
                    position: item.index,
                    declared: output.index,
                });
            }
            Ok((item, output))
        })
        .collect()
}

/// Writes every model-output record back, in order, with its score attached.
///
/// The file is written next to the target and renamed over it, so reading
/// and writing the same path is safe.
pub fn write_scored(path: &Path, outputs: &[ModelOutput], results: &[ScoredResult]) -> EvalResult<()> {
    if outputs.len() != results.len() {
        return Err(EvalError::CountMismatch {
            metadata: results.len(),
            outputs: outputs.len(),
        });
    }

    let mut buf = Vec::new();
    for (output, result) in outputs.iter().zip(results) {
        if output.index != result.index {
            return Err(EvalError::IndexMismatch {
                position: output.index,
                declared: result.index,
            });
        }
        let mut record = output.record.clone();
        record.insert("outcome".into(), Value::from(result.outcome.as_str()));
        record.insert("is_correct".into(), Value::from(result.outcome.is_correct()));
        record.insert("difficulty".into(), Value::from(result.difficulty.as_str()));
        record.insert(
            "predicted_sql".into(),
            Value::from(result.predicted_sql.clone()),
        );
        let line = serde_json::to_string(&Value::Object(record))
            .map_err(|e| EvalError::parse(path, e))?;
        buf.extend_from_slice(line.as_bytes());
        buf.push(b'\n');
    }

    let tmp = tmp_sibling(path);
    let mut f = std::fs::File::create(&tmp).map_err(|e| EvalError::io(&tmp, e))?;
    f.write_all(&buf).map_err(|e| EvalError::io(&tmp, e))?;
    f.sync_all().map_err(|e| EvalError::io(&tmp, e))?;
    drop(f);
    std::fs::rename(&tmp, path).map_err(|e| EvalError::io(path, e))?;
    Ok(())
}

fn tmp_sibling(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| "scored".into());
    name.push(".tmp");
    path.with_file_name(name)
}
