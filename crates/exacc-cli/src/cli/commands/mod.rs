use super::args::*;
use exacc_core::config::{load_settings, AnswerFormat, EvalSettings, SettingsOverrides};
use anyhow::Context;
use exacc_core::dataset::DbLayout;

pub mod run;
pub mod validate;

pub mod exit_codes {
    pub const OK: i32 = 0;
    pub const VALIDATION_FAILED: i32 = 2;
    pub const CONFIG_ERROR: i32 = 2;
}

pub async fn dispatch(cli: Cli) -> anyhow::Result<i32> {
    match cli.cmd {
        Command::Run(args) => run::run(args).await,
        Command::Validate(args) => validate::run(args).await,
        Command::Init(args) => cmd_init(args),
        Command::Version => {
            println!("{}", env!("CARGO_PKG_VERSION"));
            Ok(exit_codes::OK)
        }
    }
}

fn cmd_init(args: InitArgs) -> anyhow::Result<i32> {
    if args.config.exists() {
        eprintln!("note: {} already exists", args.config.display());
        return Ok(exit_codes::OK);
    }
    if let Some(parent) = args.config.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    exacc_core::config::write_sample_config(&args.config)?;
    eprintln!("created {}", args.config.display());
    Ok(exit_codes::OK)
}

/// File values, then flags, then a validity check.
pub fn resolve_settings(args: &SettingsArgs) -> anyhow::Result<EvalSettings> {
    let mut settings = match &args.config {
        Some(path) => load_settings(path, args.strict)?,
        None => EvalSettings::default(),
    };

    let answer_format = match args.answer_format.as_deref() {
        Some(s) => Some(AnswerFormat::parse(s).ok_or_else(|| {
            anyhow::anyhow!(
                "config error: unknown answer format '{}' (expected code_block, boxed or custom_regex)",
                s
            )
        })?),
        None => None,
    };

    settings.apply(SettingsOverrides {
        timeout_seconds: args.timeout,
        concurrency: args.concurrency,
        answer_format,
        extraction_regex: args.extraction_regex.clone(),
        regex_dotall: args.regex_dotall.then_some(true),
        metadata_path: args.metadata.clone(),
        db_root: args.db_root.clone(),
        db_extension: args.db_extension.clone(),
    });
    settings.validate()?;
    Ok(settings)
}

pub fn db_layout(settings: &EvalSettings) -> anyhow::Result<DbLayout> {
    let root = settings
        .db_root
        .clone()
        .ok_or_else(|| anyhow::anyhow!("config error: db_root is not set"))?;
    Ok(DbLayout::new(root, settings.db_extension.clone()))
}

pub fn metadata_path(settings: &EvalSettings) -> anyhow::Result<std::path::PathBuf> {
    settings
        .metadata_path
        .clone()
        .ok_or_else(|| anyhow::anyhow!("config error: metadata_path is not set"))
}
