mod aggregate;
mod cli;
mod config;
mod engine;
mod error;
mod fetch;
mod intake;
mod links;
mod metrics;
mod report;
mod runner;
mod types;

use crate::engine::Engine;
use crate::error::RaterError;
use crate::report::ndjson::NdjsonWriter;
use crate::report::Record;
use crate::types::artifact::{ArtifactDescriptor, ArtifactType};
use clap::Parser;
use tracing_subscriber::EnvFilter;

pub mod exit_code {
    pub const SUCCESS: i32 = 0;
    pub const BELOW_THRESHOLD: i32 = 1;
    pub const RUNTIME_FAILURE: i32 = 3;
}

/// Logs go to stderr so stdout carries only reports. `RUST_LOG` wins over
/// the verbosity flags.
fn init_tracing(verbose: u8, quiet: bool) {
    let fallback = match (quiet, verbose) {
        (true, _) => "error",
        (false, 0) => "warn",
        (false, 1) => "info",
        (false, _) => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn below(threshold: Option<f64>, net_score: f64) -> bool {
    threshold.is_some_and(|min| net_score < min)
}

fn run() -> Result<i32, RaterError> {
    let cli = cli::Cli::parse();
    init_tracing(cli.verbose, cli.quiet);

    let cwd = std::env::current_dir()?;
    let cfg = config::load_config(&cwd, cli.config.as_deref())?;

    match cli.command {
        cli::Commands::Rate(cmd) => {
            let artifact_type = cmd
                .artifact_type
                .map(ArtifactType::from)
                .or_else(|| ArtifactType::classify(&cmd.url))
                .ok_or_else(|| RaterError::UnsupportedArtifact(cmd.url.clone()))?;
            let mut artifact = ArtifactDescriptor::new(artifact_type, cmd.url.as_str())
                .with_code_url(cmd.code_url)
                .with_dataset_url(cmd.dataset_url);
            if let Some(name) = cmd.name {
                artifact = artifact.with_name(name);
            }

            let engine = Engine::from_config(&cfg)?;
            let report = engine.rate(&artifact);
            let rendered = report::render(&Record::new(&artifact, &report), cmd.format.into())?;
            println!("{rendered}");

            if below(cmd.min_score, report.net_score) {
                tracing::warn!(
                    name = %artifact.name,
                    net_score = report.net_score,
                    "net score below threshold"
                );
                Ok(exit_code::BELOW_THRESHOLD)
            } else {
                Ok(exit_code::SUCCESS)
            }
        }
        cli::Commands::Batch(cmd) => {
            let artifacts = intake::read_url_file(&cmd.file)?;
            let engine = Engine::from_config(&cfg)?;
            let mut writer = NdjsonWriter::new(std::io::stdout().lock());
            let mut rejected = 0usize;
            for artifact in &artifacts {
                let report = engine.rate(artifact);
                writer.write(&Record::new(artifact, &report))?;
                if below(cmd.min_score, report.net_score) {
                    rejected += 1;
                }
            }
            tracing::info!(rated = artifacts.len(), rejected, "batch complete");
            if rejected > 0 {
                Ok(exit_code::BELOW_THRESHOLD)
            } else {
                Ok(exit_code::SUCCESS)
            }
        }
        cli::Commands::Weights => {
            for (key, weight) in cfg.weight_table()?.iter() {
                println!("{key}\t{weight}");
            }
            Ok(exit_code::SUCCESS)
        }
    }
}

fn main() {
    match run() {
        Ok(code) => {
            if code != exit_code::SUCCESS {
                std::process::exit(code);
            }
        }
        Err(e) => {
            eprintln!("error: {}", e);
            std::process::exit(exit_code::RUNTIME_FAILURE);
        }
    }
}
