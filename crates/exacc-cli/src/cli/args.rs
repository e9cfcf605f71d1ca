use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "exacc",
    version,
    about = "Execution-accuracy scoring for text-to-SQL benchmarks"
)]
pub struct Cli {
    #[command(subcommand)]
    pub cmd: Command,

    /// log output format: text|json (logs always go to stderr)
    #[arg(long, global = true, default_value = "text")]
    pub log_format: String,
}

#[derive(Subcommand)]
pub enum Command {
    /// Score model outputs against the benchmark
    Run(RunArgs),
    /// Check that every ground-truth query executes
    Validate(ValidateArgs),
    /// Write a sample config file
    Init(InitArgs),
    Version,
}

/// Options shared by every command that reads the benchmark.
#[derive(clap::Args, Debug, Clone, Default)]
pub struct SettingsArgs {
    /// YAML settings file; flags below override its values
    #[arg(long, env = "EXACC_CONFIG")]
    pub config: Option<PathBuf>,

    /// reject unknown keys in the settings file
    #[arg(long)]
    pub strict: bool,

    /// benchmark metadata (JSON array or JSON lines)
    #[arg(long)]
    pub metadata: Option<PathBuf>,

    /// directory holding <db_id>/<db_id>.<ext>
    #[arg(long)]
    pub db_root: Option<PathBuf>,

    #[arg(long)]
    pub db_extension: Option<String>,

    /// seconds per item before it is scored as a timeout
    #[arg(long)]
    pub timeout: Option<f64>,

    /// items evaluated at the same time
    #[arg(long)]
    pub concurrency: Option<usize>,

    /// answer extraction: code_block|boxed|custom_regex
    #[arg(long)]
    pub answer_format: Option<String>,

    /// pattern for custom_regex; group 1 is used when present
    #[arg(long)]
    pub extraction_regex: Option<String>,

    /// let '.' match newlines in the custom pattern
    #[arg(long)]
    pub regex_dotall: bool,
}

#[derive(Parser, Clone, Debug)]
pub struct RunArgs {
    #[command(flatten)]
    pub settings: SettingsArgs,

    /// model outputs (JSON lines or JSON array)
    #[arg(long)]
    pub input: PathBuf,

    /// where to write scored records (default: overwrite --input)
    #[arg(long)]
    pub output: Option<PathBuf>,

    /// also write the accuracy report as JSON
    #[arg(long)]
    pub report_out: Option<PathBuf>,

    /// do not write scored records
    #[arg(long)]
    pub no_write: bool,
}

#[derive(Parser, Clone, Debug)]
pub struct ValidateArgs {
    #[command(flatten)]
    pub settings: SettingsArgs,

    #[arg(long, default_value = "text")]
    pub format: String, // text|json
}

#[derive(Parser, Clone, Debug)]
pub struct InitArgs {
    #[arg(long, default_value = "exacc.yaml")]
    pub config: PathBuf,
}
