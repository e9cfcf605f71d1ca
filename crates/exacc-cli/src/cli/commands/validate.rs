use super::{db_layout, exit_codes, metadata_path, resolve_settings};
use crate::cli::args::ValidateArgs;
use exacc_core::dataset::load_benchmark;
use exacc_core::engine::probe::{probe_ground_truths, ProbeStatus};

pub async fn run(args: ValidateArgs) -> anyhow::Result<i32> {
    let settings = resolve_settings(&args.settings)?;
    let items = load_benchmark(&metadata_path(&settings)?, &db_layout(&settings)?)?;

    let results =
        probe_ground_truths(&items, settings.timeout(), settings.concurrency_limit()).await;
    let failed = results.iter().filter(|r| !r.is_ok()).count();

    if args.format == "json" {
        println!("{}", serde_json::to_string_pretty(&results)?);
    } else {
        for r in results.iter().filter(|r| !r.is_ok()) {
            match &r.status {
                ProbeStatus::Failed { error } => {
                    println!("item {}: {} ({})", r.index, error, r.db_path)
                }
                ProbeStatus::Timeout => println!("item {}: timed out ({})", r.index, r.db_path),
                ProbeStatus::Ok { .. } => {}
            }
        }
        println!("{} of {} ground-truth queries ok", results.len() - failed, results.len());
    }

    if failed > 0 {
        Ok(exit_codes::VALIDATION_FAILED)
    } else {
        Ok(exit_codes::OK)
    }
}
