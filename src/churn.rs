pub mod hunk;

use crate::error::{FleetError, Result};
use crate::git::History;
use crate::model::{ChurnResult, CommitInfo, CommitPair, DateRange};
use chrono::{DateTime, Duration, Utc};
use rayon::prelude::*;
use rayon::ThreadPoolBuilder;
use tracing::debug;

pub const DEFAULT_WINDOW_DAYS: i64 = 365;
pub const MAX_WINDOW_DAYS: i64 = 36_500;

/// The trailing `days`-long window ending at `now`. `days` must lie in
/// `0..=MAX_WINDOW_DAYS`.
pub fn churn_window(now: DateTime<Utc>, days: i64) -> Result<DateRange> {
    let since = (0..=MAX_WINDOW_DAYS)
        .contains(&days)
        .then(|| Duration::try_days(days))
        .flatten()
        .and_then(|span| now.checked_sub_signed(span))
        .ok_or_else(|| FleetError::InvalidDate(format!("churn window of {days} days is out of range")))?;

    Ok(DateRange::new().with_since(since).with_until(now))
}

/// Sorts commits by timestamp and pairs each with its successor. The sort
/// is stable, so commits sharing a timestamp keep their history order.
pub fn commit_pairs(mut commits: Vec<CommitInfo>) -> Vec<CommitPair> {
    commits.sort_by(|a, b| a.timestamp.cmp(&b.timestamp));
    commits
        .windows(2)
        .map(|w| CommitPair {
            older: w[0].id.clone(),
            newer: w[1].id.clone(),
        })
        .collect()
}

/// Added/deleted line volume over every consecutive commit pair inside
/// `window`, extracted on a pool of `workers` threads. The first failing
/// pair fails the whole computation.
pub fn compute_churn<H>(history: &H, window: &DateRange, workers: usize) -> Result<ChurnResult>
where
    H: History + ?Sized,
{
    let commits: Vec<CommitInfo> = history
        .commits()?
        .into_iter()
        .filter(|c| window.contains(&c.timestamp))
        .collect();
    let commit_count = commits.len();
    let pairs = commit_pairs(commits);
    debug!(commits = commit_count, pairs = pairs.len(), "computing churn");

    if pairs.is_empty() {
        return Ok(ChurnResult::default());
    }

    let pool = ThreadPoolBuilder::new().num_threads(workers.max(1)).build()?;
    let deltas = pool.install(|| {
        pairs
            .par_iter()
            .map(|pair| {
                let headers = history.hunk_headers(&pair.older, &pair.newer)?;
                hunk::pair_churn(&headers)
            })
            .collect::<Result<Vec<_>>>()
    })?;

    let mut churn = ChurnResult::default();
    for (added, deleted) in deltas {
        churn.add(added, deleted);
    }
    Ok(churn)
}
