use crate::config::EvalSettings;
use crate::model::AccuracyReport;
use serde::Serialize;
use std::path::Path;

pub const SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Serialize)]
pub struct JsonReport<'a> {
    pub schema_version: u32,
    pub fingerprint: &'a str,
    pub settings: &'a EvalSettings,
    #[serde(flatten)]
    pub report: &'a AccuracyReport,
}

pub fn write_json(
    report: &AccuracyReport,
    settings: &EvalSettings,
    fingerprint: &str,
    out: &Path,
) -> anyhow::Result<()> {
    let doc = JsonReport {
        schema_version: SCHEMA_VERSION,
        fingerprint,
        settings,
        report,
    };
    let body = serde_json::to_string_pretty(&doc)?;
    std::fs::write(out, body)?;
    Ok(())
}
