use crate::analyzer::Analyze;
use crate::model::RepositoryRecord;
use indicatif::ProgressBar;
use std::future::Future;
use std::sync::Arc;
use tokio::task::{JoinError, JoinSet};
use tracing::{error, warn};

/// Completion message of one repository task.
#[derive(Debug)]
pub enum FleetEvent {
    Finished(RepositoryRecord),
    Failed(String),
}

/// Everything the scheduler collected before the batch ended.
#[derive(Debug, Default)]
pub struct FleetReport {
    /// Records in completion order.
    pub records: Vec<RepositoryRecord>,
    pub failed: Vec<String>,
    /// Repositories that were never scheduled because of an interrupt.
    pub skipped: usize,
    pub interrupted: bool,
}

impl FleetReport {
    fn accept(&mut self, joined: Result<FleetEvent, JoinError>, progress: &ProgressBar) {
        match joined {
            Ok(FleetEvent::Finished(record)) => {
                let name = record.url.rsplit('/').next().unwrap_or(&record.url).to_string();
                self.records.push(record);
                progress.set_message(format!("Finished processing repo \"{name}\""));
            }
            Ok(FleetEvent::Failed(target)) => {
                self.failed.push(target);
            }
            Err(e) => {
                error!(error = %e, "repository task did not complete");
            }
        }
        progress.inc(1);
    }
}

/// Analyzes `targets` with at most `worker_count` repositories in flight.
///
/// This loop is the only owner of the collected records; tasks hand their
/// result back through the join set. When `shutdown` resolves, no further
/// repositories are scheduled, in-flight tasks are detached and their late
/// results dropped, and whatever completed so far is returned.
pub async fn run_fleet<A, F>(
    targets: Vec<String>,
    analyzer: Arc<A>,
    worker_count: usize,
    progress: &ProgressBar,
    shutdown: F,
) -> FleetReport
where
    A: Analyze + ?Sized + 'static,
    F: Future<Output = ()>,
{
    let limit = worker_count.max(1);
    let mut pending = targets.into_iter();
    let mut tasks: JoinSet<FleetEvent> = JoinSet::new();
    let mut report = FleetReport::default();
    tokio::pin!(shutdown);

    loop {
        while tasks.len() < limit {
            let Some(target) = pending.next() else { break };
            let analyzer = Arc::clone(&analyzer);
            tasks.spawn_blocking(move || match analyzer.analyze(&target) {
                Some(record) => FleetEvent::Finished(record),
                None => FleetEvent::Failed(target),
            });
        }

        let joined = tokio::select! {
            _ = &mut shutdown => {
                report.interrupted = true;
                report.skipped = pending.len();
                warn!(
                    in_flight = tasks.len(),
                    skipped = report.skipped,
                    "terminated by user, stopping the processing and outputting intermediate results"
                );
                tasks.detach_all();
                break;
            }
            joined = tasks.join_next() => joined,
        };

        match joined {
            Some(joined) => report.accept(joined, progress),
            None => break,
        }
    }

    report
}
