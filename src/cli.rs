use crate::analyzer::{AccessMode, AnalyzerConfig, RepositoryAnalyzer};
use crate::churn::{DEFAULT_WINDOW_DAYS, MAX_WINDOW_DAYS};
use crate::fleet::run_fleet;
use crate::git::Credentials;
use crate::loc::ExtensionClassifier;
use crate::metrics::{ExternalMetrics, NoMetrics, QualityMetricsRunner, DEFAULT_METRICS_COMMAND};
use crate::model::FleetSummary;
use anyhow::{Context, Result};
use clap::{Args, Parser, ValueEnum};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, warn};

#[derive(Parser)]
#[command(name = "gfleet")]
#[command(about = "Churn, lines-of-code and code quality statistics across many git repositories")]
#[command(version)]
pub struct Cli {
    #[arg(value_enum, help = "Parsing mode")]
    pub mode: Mode,

    #[clap(flatten)]
    pub source: SourceArgs,

    #[arg(short, long, help = "Path to write the output JSON file to")]
    pub output_file: PathBuf,

    #[arg(
        long,
        default_value_t = 5,
        value_parser = clap::value_parser!(u16).range(1..),
        help = "Number of parallel workers"
    )]
    pub worker_count: u16,

    #[arg(long, help = "Enable debug output")]
    pub debug: bool,

    #[arg(short = 'u', long, env = "GFLEET_GIT_USERNAME", help = "Git username for remote origin authentication")]
    pub git_username: Option<String>,

    #[arg(
        short = 'p',
        long,
        env = "GFLEET_GIT_PASSWORD",
        hide_env_values = true,
        help = "Git password for remote origin authentication; access tokens go here"
    )]
    pub git_password: Option<String>,

    #[arg(long, default_value = "repos", help = "Directory that remote repositories are cloned into")]
    pub workdir: PathBuf,

    #[arg(
        long,
        env = "GFLEET_METRICS_COMMAND",
        default_value = DEFAULT_METRICS_COMMAND,
        help = "External code quality calculator"
    )]
    pub metrics_command: String,

    #[arg(long, help = "Skip code quality metrics")]
    pub no_metrics: bool,

    #[arg(
        long,
        default_value_t = DEFAULT_WINDOW_DAYS,
        value_parser = clap::value_parser!(i64).range(0..=MAX_WINDOW_DAYS),
        help = "Churn window in days, ending now"
    )]
    pub window_days: i64,
}

#[derive(Args, Clone)]
#[group(required = true, multiple = false)]
pub struct SourceArgs {
    #[arg(short = 'f', long, help = "File with git repository URLs or paths, one per line")]
    pub repo_file: Option<PathBuf>,

    #[arg(short = 'r', long, help = "URL or path of a single git repository")]
    pub repo_url: Option<String>,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum Mode {
    /// Open repositories in place
    Filesystem,
    /// Clone repositories, analyze, then delete the clone
    Remote,
}

impl From<Mode> for AccessMode {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::Filesystem => AccessMode::Filesystem,
            Mode::Remote => AccessMode::Remote,
        }
    }
}

impl SourceArgs {
    pub fn targets(&self) -> Result<Vec<String>> {
        match (&self.repo_file, &self.repo_url) {
            (Some(file), _) => read_targets(file),
            (None, Some(url)) => Ok(vec![normalize_target(url)]),
            (None, None) => Ok(Vec::new()),
        }
    }
}

pub fn read_targets(path: &Path) -> Result<Vec<String>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read repository list {}", path.display()))?;
    Ok(parse_targets(&content))
}

/// One repository per line; blank lines and `#` comments are skipped.
pub fn parse_targets(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(normalize_target)
        .collect()
}

fn normalize_target(target: &str) -> String {
    target.trim().trim_end_matches('/').to_string()
}

impl Cli {
    pub fn parse() -> Self {
        <Self as Parser>::parse()
    }

    pub fn analyzer_config(&self) -> AnalyzerConfig {
        AnalyzerConfig {
            mode: self.mode.into(),
            worker_count: usize::from(self.worker_count),
            workdir: self.workdir.clone(),
            credentials: Credentials {
                username: self.git_username.clone(),
                password: self.git_password.clone(),
            },
            window_days: self.window_days,
        }
    }

    pub fn execute(self) -> Result<()> {
        crate::logging::init(self.debug)?;

        let targets = self.source.targets()?;
        debug!(targets = ?targets, "repositories to process");
        println!("[*] processing {} repositories", targets.len());

        let metrics: Arc<dyn QualityMetricsRunner> = if self.no_metrics {
            Arc::new(NoMetrics)
        } else {
            Arc::new(ExternalMetrics::new(self.metrics_command.clone()))
        };
        let analyzer = Arc::new(RepositoryAnalyzer::new(
            self.analyzer_config(),
            Arc::new(ExtensionClassifier),
            metrics,
        ));

        let requested = targets.len();
        let progress = progress_bar(requested);
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()
            .context("Failed to start async runtime")?;

        let report = runtime.block_on(run_fleet(
            targets,
            analyzer,
            usize::from(self.worker_count),
            &progress,
            interrupted(),
        ));
        progress.finish();

        if !report.failed.is_empty() {
            warn!(failed = ?report.failed, "some repositories produced no statistics");
        }

        let summary = FleetSummary::new(report.records);
        let written = crate::report::write_json(&self.output_file, &summary)?;
        crate::report::print_summary(&summary, requested);
        println!(
            "\n[+] saved repository metrics to file \"{}\"",
            style(written.display()).green()
        );

        // abandoned repository tasks are not waited for
        runtime.shutdown_background();
        Ok(())
    }
}

fn progress_bar(total: usize) -> ProgressBar {
    let pb = ProgressBar::new(total as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{msg} [{bar:40.green}] {pos}/{len} ({elapsed})")
            .unwrap_or_else(|_| ProgressStyle::default_bar()),
    );
    pb
}

/// Resolves on Ctrl-C; never resolves if the handler cannot be installed.
async fn interrupted() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "cannot listen for interrupts");
        std::future::pending::<()>().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn repository_list_skips_blanks_and_comments_and_trailing_slashes() {
        let content = "https://github.com/org/a/\n\n# archived\n  https://github.com/org/b  \n/srv/git/c\n";
        assert_eq!(
            parse_targets(content),
            vec!["https://github.com/org/a", "https://github.com/org/b", "/srv/git/c"]
        );
    }

    #[test]
    fn single_url_is_normalized() {
        let cli = Cli::try_parse_from([
            "gfleet", "remote", "-r", "https://github.com/org/a/", "-o", "out.json",
        ])
        .unwrap();
        assert_eq!(cli.source.targets().unwrap(), vec!["https://github.com/org/a"]);
        assert_eq!(cli.analyzer_config().mode, AccessMode::Remote);
        assert_eq!(cli.analyzer_config().worker_count, 5);
    }

    #[test]
    fn repo_file_and_repo_url_are_exclusive() {
        let result = Cli::try_parse_from([
            "gfleet", "filesystem", "-f", "list.txt", "-r", "/srv/a", "-o", "out.json",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn one_source_is_required() {
        assert!(Cli::try_parse_from(["gfleet", "filesystem", "-o", "out.json"]).is_err());
    }

    #[test]
    fn zero_workers_are_rejected() {
        let result = Cli::try_parse_from([
            "gfleet", "filesystem", "-r", "/srv/a", "-o", "out.json", "--worker-count", "0",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn window_days_must_be_in_range() {
        let parse = |days: &str| {
            Cli::try_parse_from([
                "gfleet", "filesystem", "-r", "/srv/a", "-o", "out.json", "--window-days", days,
            ])
        };
        assert!(parse("-1").is_err());
        assert!(parse("36501").is_err());
        assert!(parse("1000000000").is_err());
        assert_eq!(parse("30").unwrap().window_days, 30);
        assert_eq!(parse("0").unwrap().window_days, 0);
    }
}
