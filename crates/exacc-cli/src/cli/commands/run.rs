use super::{db_layout, exit_codes, metadata_path, resolve_settings};
use crate::cli::args::RunArgs;
use exacc_core::aggregate::aggregate;
use exacc_core::config::EvalSettings;
use exacc_core::dataset::{load_benchmark, load_model_outputs, pair, write_scored};
use exacc_core::engine::comparator::SqliteComparator;
use exacc_core::engine::executor::BoundedExecutor;
use exacc_core::engine::prepare;
use exacc_core::engine::runner::EvaluationScheduler;
use exacc_core::extract;
use exacc_core::fingerprint;
use exacc_core::report::{console, json};
use anyhow::Context;
use std::path::Path;
use std::sync::Arc;

pub async fn run(args: RunArgs) -> anyhow::Result<i32> {
    let settings = resolve_settings(&args.settings)?;
    let extractor = extract::from_settings(&settings)?;
    let metadata = metadata_path(&settings)?;
    let layout = db_layout(&settings)?;

    // Everything structural is checked before the first query runs.
    let items = load_benchmark(&metadata, &layout)?;
    let outputs = load_model_outputs(&args.input)?;
    let pairs = pair(items, outputs.clone())?;
    let prepared = prepare(pairs, extractor.as_ref());

    // Hashed now: with the default in-place write, --input is replaced below.
    let fp = match &args.report_out {
        Some(_) => Some(input_fingerprint(&settings, &metadata, &args.input)?),
        None => None,
    };

    let executor = BoundedExecutor::new(Arc::new(SqliteComparator::new()), settings.timeout());
    let scheduler = EvaluationScheduler::new(executor, settings.concurrency_limit());
    let results = scheduler.evaluate_all(prepared).await;
    let report = aggregate(&results);

    if !args.no_write {
        let out = args.output.as_deref().unwrap_or(&args.input);
        write_scored(out, &outputs, &results)?;
        tracing::info!(
            event = "exacc.scored.written",
            path = %out.display(),
            records = results.len(),
            "wrote scored records"
        );
    }

    console::print_summary(&report);

    if let (Some(report_out), Some(fp)) = (&args.report_out, &fp) {
        json::write_json(&report, &settings, fp, report_out)
            .with_context(|| format!("failed to write report {}", report_out.display()))?;
    }

    Ok(exit_codes::OK)
}

fn input_fingerprint(
    settings: &EvalSettings,
    metadata: &Path,
    input: &Path,
) -> anyhow::Result<String> {
    let metadata_bytes = std::fs::read(metadata)
        .with_context(|| format!("failed to read {}", metadata.display()))?;
    let output_bytes =
        std::fs::read(input).with_context(|| format!("failed to read {}", input.display()))?;
    Ok(fingerprint::compute(fingerprint::Context {
        metadata: &metadata_bytes,
        model_outputs: &output_bytes,
        answer_format: settings.answer_format.as_str(),
        extraction_regex: settings.extraction_regex.as_deref(),
        regex_dotall: settings.regex_dotall,
    }))
}
