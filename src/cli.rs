use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::report::OutputFormat;
use crate::types::artifact::ArtifactType;

#[derive(Parser)]
#[command(
    name = "artifact-rater",
    version,
    about = "Trust scoring for models, datasets and code repositories"
)]
pub struct Cli {
    /// Increase verbosity (-v for info, -vv for debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Config file to use instead of ./rater.toml
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Rate a single artifact URL
    Rate(RateCommand),
    /// Rate every model listed in a URL file, one NDJSON line per model
    Batch(BatchCommand),
    /// Print the effective metric weights
    Weights,
}

#[derive(Args)]
pub struct RateCommand {
    pub url: String,
    /// Artifact type; inferred from the URL when omitted
    #[arg(long = "type", value_enum)]
    pub artifact_type: Option<KindArg>,
    /// Display name; defaults to the last repository segment
    #[arg(long)]
    pub name: Option<String>,
    #[arg(long)]
    pub code_url: Option<String>,
    #[arg(long)]
    pub dataset_url: Option<String>,
    #[arg(short, long, value_enum, default_value = "json")]
    pub format: ReportFormat,
    /// Exit with code 1 when the net score falls below this threshold
    #[arg(long, value_parser = parse_unit_interval)]
    pub min_score: Option<f64>,
}

#[derive(Args)]
pub struct BatchCommand {
    /// File with one URL per line
    pub file: PathBuf,
    /// Exit with code 1 when any net score falls below this threshold
    #[arg(long, value_parser = parse_unit_interval)]
    pub min_score: Option<f64>,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum KindArg {
    Model,
    Dataset,
    Code,
}

impl From<KindArg> for ArtifactType {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Model => Self::Model,
            KindArg::Dataset => Self::Dataset,
            KindArg::Code => Self::Code,
        }
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum ReportFormat {
    Json,
    Ndjson,
    Md,
}

impl From<ReportFormat> for OutputFormat {
    fn from(format: ReportFormat) -> Self {
        match format {
            ReportFormat::Json => Self::Json,
            ReportFormat::Ndjson => Self::Ndjson,
            ReportFormat::Md => Self::Md,
        }
    }
}

fn parse_unit_interval(raw: &str) -> Result<f64, String> {
    let value: f64 = raw
        .parse()
        .map_err(|_| format!("`{raw}` is not a number"))?;
    if (0.0..=1.0).contains(&value) {
        Ok(value)
    } else {
        Err(format!("`{raw}` must be between 0.0 and 1.0"))
    }
}
