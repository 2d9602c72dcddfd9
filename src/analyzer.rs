use crate::churn::{churn_window, compute_churn, DEFAULT_WINDOW_DAYS};
use crate::error::{FleetError, Result};
use crate::git::{clone_destination, clone_repository, Credentials, GitRepo};
use crate::loc::{count_lines, LineClassifier};
use crate::metrics::QualityMetricsRunner;
use crate::model::RepositoryRecord;
use crate::workdir::{enumerate_files, WorkingCopy};
use chrono::Utc;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::thread;
use tracing::{debug, error, info};

/// How repository identifiers are turned into working directories.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessMode {
    /// Open the path in place.
    Filesystem,
    /// Clone the URL below the working-directory root, delete afterwards.
    Remote,
}

#[derive(Debug, Clone)]
pub struct AnalyzerConfig {
    pub mode: AccessMode,
    pub worker_count: usize,
    pub workdir: PathBuf,
    pub credentials: Credentials,
    pub window_days: i64,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            mode: AccessMode::Filesystem,
            worker_count: 5,
            workdir: PathBuf::from("repos"),
            credentials: Credentials::default(),
            window_days: DEFAULT_WINDOW_DAYS,
        }
    }
}

/// Produces one [`RepositoryRecord`] per repository. Errors never cross
/// [`Analyze::analyze`]; they are logged and turn into "no record".
pub trait Analyze: Send + Sync {
    fn analyze(&self, target: &str) -> Option<RepositoryRecord>;
}

pub struct RepositoryAnalyzer {
    config: AnalyzerConfig,
    classifier: Arc<dyn LineClassifier>,
    metrics: Arc<dyn QualityMetricsRunner>,
}

impl RepositoryAnalyzer {
    pub fn new(
        config: AnalyzerConfig,
        classifier: Arc<dyn LineClassifier>,
        metrics: Arc<dyn QualityMetricsRunner>,
    ) -> Self {
        Self {
            config,
            classifier,
            metrics,
        }
    }

    pub fn try_analyze(&self, target: &str) -> Result<RepositoryRecord> {
        let (copy, repo) = self.resolve(target)?;
        info!(repository = target, path = %copy.path().display(), "analyzing repository");

        let files = enumerate_files(copy.path())?;
        debug!(repository = target, files = ?files, "enumerated source files");

        let workers = self.config.worker_count;
        let window = churn_window(Utc::now(), self.config.window_days)?;

        // the metrics calculator blocks on a subprocess, keep it off the rayon pools
        let (churn, loc, metrics) = thread::scope(|scope| {
            let metrics = scope.spawn(|| self.metrics.run(&files));
            let (churn, loc) = rayon::join(
                || compute_churn(&repo, &window, workers),
                || count_lines(&files, self.classifier.as_ref(), workers),
            );
            let metrics = metrics.join().unwrap_or_else(|panic| std::panic::resume_unwind(panic));
            (churn, loc, metrics)
        });

        let churn = churn?;
        debug!(repository = target, churn = ?churn, "churn");
        let loc = loc?;
        debug!(repository = target, languages = loc.len(), "loc");
        let metrics = metrics?;
        debug!(repository = target, metrics = ?metrics, "metrics");

        Ok(RepositoryRecord {
            url: target.to_string(),
            churn,
            loc,
            metrics,
        })
    }

    /// Working directory and opened repository for `target`. The working
    /// copy outlives the repository handle.
    fn resolve(&self, target: &str) -> Result<(WorkingCopy, GitRepo)> {
        match self.config.mode {
            AccessMode::Filesystem => {
                let copy = WorkingCopy::borrowed(target);
                let repo = GitRepo::open(copy.path()).map_err(|e| FleetError::resolution(target, e))?;
                Ok((copy, repo))
            }
            AccessMode::Remote => {
                let destination = clone_destination(&self.config.workdir, target)?;
                let copy = WorkingCopy::claim(&destination).map_err(|e| match e.kind() {
                    io::ErrorKind::AlreadyExists => FleetError::resolution(
                        target,
                        format!("working directory {} already exists", destination.display()),
                    ),
                    _ => FleetError::resolution(target, e),
                })?;
                clone_repository(target, copy.path(), &self.config.credentials)?;
                let repo = GitRepo::open(copy.path()).map_err(|e| FleetError::resolution(target, e))?;
                Ok((copy, repo))
            }
        }
    }
}

impl Analyze for RepositoryAnalyzer {
    fn analyze(&self, target: &str) -> Option<RepositoryRecord> {
        match self.try_analyze(target) {
            Ok(record) => {
                info!(repository = target, "finished repository");
                Some(record)
            }
            Err(e) => {
                error!(
                    repository = target,
                    kind = ?e.kind(),
                    error = %e,
                    "the following error occurred during the processing of repository"
                );
                None
            }
        }
    }
}
