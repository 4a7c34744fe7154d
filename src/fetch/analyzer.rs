use super::StaticAnalyzer;
use crate::error::{RaterError, Result};
use crate::types::config::AnalyzerConfig;
use std::io::{Read, Write};
use std::process::{Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

const RATING_MARKER: &str = "Your code has been rated at";
const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Runs pylint (or a compatible tool) against a temporary copy of the source
/// and reads the rating line from its text output.
pub struct PylintAnalyzer {
    program: String,
    args: Vec<String>,
    timeout: Duration,
}

impl PylintAnalyzer {
    pub fn new(cfg: &AnalyzerConfig) -> Self {
        Self {
            program: cfg.program.clone(),
            args: cfg.args.clone(),
            timeout: cfg.timeout(),
        }
    }
}

impl StaticAnalyzer for PylintAnalyzer {
    fn rate(&self, source: &str, file_name: &str) -> Result<Option<f64>> {
        let mut file = tempfile::Builder::new()
            .prefix("rater-")
            .suffix(".py")
            .tempfile()?;
        file.write_all(source.as_bytes())?;
        file.flush()?;

        tracing::debug!(program = %self.program, file = file_name, "running static analyzer");
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .arg(file.path())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()?;

        let mut stdout = child
            .stdout
            .take()
            .ok_or_else(|| RaterError::Analyzer("stdout was not captured".to_string()))?;
        let reader = thread::spawn(move || {
            let mut output = String::new();
            let _ = stdout.read_to_string(&mut output);
            output
        });

        let deadline = Instant::now() + self.timeout;
        loop {
            if child.try_wait()?.is_some() {
                break;
            }
            if Instant::now() >= deadline {
                let _ = child.kill();
                let _ = child.wait();
                return Err(RaterError::Analyzer(format!(
                    "{} timed out after {}s on {file_name}",
                    self.program,
                    self.timeout.as_secs()
                )));
            }
            thread::sleep(POLL_INTERVAL);
        }

        let output = reader
            .join()
            .map_err(|_| RaterError::Analyzer("output reader panicked".to_string()))?;
        Ok(parse_rating(&output))
    }
}

/// Extract `X` from a `Your code has been rated at X/10` line.
pub fn parse_rating(output: &str) -> Option<f64> {
    output
        .lines()
        .filter_map(|line| line.split_once(RATING_MARKER).map(|(_, rest)| rest))
        .find_map(|rest| rest.trim().split('/').next()?.trim().parse::<f64>().ok())
}

/// Coarse bucket for a raw 0-10 rating; `None` below the lowest bucket.
pub fn bucket(raw: f64) -> Option<f64> {
    if raw >= 7.0 {
        Some(1.0)
    } else if raw >= 4.0 {
        Some(0.75)
    } else if raw >= 2.0 {
        Some(0.5)
    } else if raw >= 0.1 {
        Some(0.25)
    } else {
        None
    }
}
