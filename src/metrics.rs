use crate::error::{FleetError, Result};
use crate::model::QualityMetrics;
use serde_json::Value;
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use std::process::Command;
use tempfile::NamedTempFile;
use tracing::{debug, warn};

pub const DEFAULT_METRICS_COMMAND: &str = "multimetric";

/// Computes code-quality indicators for a repository's full file list.
pub trait QualityMetricsRunner: Send + Sync {
    fn run(&self, files: &[PathBuf]) -> Result<QualityMetrics>;
}

/// Runs an external batch calculator once per repository. The program
/// receives the path of a newline-separated file list and must print a
/// JSON object with an `overall` key to stdout.
#[derive(Debug, Clone)]
pub struct ExternalMetrics {
    program: String,
}

impl ExternalMetrics {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl QualityMetricsRunner for ExternalMetrics {
    fn run(&self, files: &[PathBuf]) -> Result<QualityMetrics> {
        let mut list = NamedTempFile::new()?;
        {
            let mut writer = BufWriter::new(list.as_file_mut());
            for file in files {
                writeln!(writer, "{}", file.display())?;
            }
            writer.flush()?;
        }
        // closes the handle; the list is removed when `list` drops
        let list = list.into_temp_path();

        debug!(program = %self.program, files = files.len(), "running metrics calculator");
        let output = Command::new(&self.program)
            .arg(&*list)
            .output()
            .map_err(|source| FleetError::MetricsSpawn {
                program: self.program.clone(),
                source,
            })?;

        if !output.stderr.is_empty() {
            warn!(
                program = %self.program,
                status = %output.status,
                stderr = %String::from_utf8_lossy(&output.stderr).trim(),
                "metrics calculator reported errors"
            );
        }

        project_overall(&output.stdout)
    }
}

/// Skips quality metrics entirely; every record reports no values.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoMetrics;

impl QualityMetricsRunner for NoMetrics {
    fn run(&self, _files: &[PathBuf]) -> Result<QualityMetrics> {
        Ok(QualityMetrics::default())
    }
}

/// Extracts the fixed metric keys from the calculator's `overall`
/// object, dropping every other key and non-numeric values.
pub fn project_overall(stdout: &[u8]) -> Result<QualityMetrics> {
    let document: Value = serde_json::from_slice(stdout)?;
    let overall = document
        .get("overall")
        .and_then(Value::as_object)
        .ok_or(FleetError::MissingOverall)?;

    let number = |key: &str| overall.get(key).and_then(Value::as_f64);
    Ok(QualityMetrics {
        cyclomatic_complexity: number("cyclomatic_complexity"),
        halstead_bugprop: number("halstead_bugprop"),
        halstead_difficulty: number("halstead_difficulty"),
        halstead_volume: number("halstead_volume"),
        maintainability_index: number("maintainability_index"),
    })
}
