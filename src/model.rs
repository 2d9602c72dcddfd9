use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Pseudo-language aggregating every language of one repository.
pub const TOTAL_LANGUAGE: &str = "Total";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitInfo {
    pub id: String,
    pub timestamp: DateTime<Utc>,
}

/// Two consecutive commits of a time-sorted history, older first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitPair {
    pub older: String,
    pub newer: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChurnResult {
    pub added: u64,
    pub deleted: u64,
    pub changed: u64,
}

impl ChurnResult {
    pub fn new(added: u64, deleted: u64) -> Self {
        Self {
            added,
            deleted,
            changed: added + deleted,
        }
    }

    pub fn add(&mut self, added: u64, deleted: u64) {
        self.added += added;
        self.deleted += deleted;
        self.changed += added + deleted;
    }
}

/// Line composition of a single file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LineCounts {
    pub code: u64,
    pub documentation: u64,
    pub empty: u64,
}

impl LineCounts {
    pub fn lines(&self) -> u64 {
        self.code + self.documentation + self.empty
    }

    pub fn source(&self) -> u64 {
        self.code + self.documentation
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LanguageLineStats {
    pub file_count: u64,
    pub line_count: u64,
    pub code_count: u64,
    pub documentation_count: u64,
    pub empty_count: u64,
    pub source_count: u64,
    pub code_percentage: f64,
    pub documentation_percentage: f64,
    pub empty_percentage: f64,
    pub source_percentage: f64,
}

impl LanguageLineStats {
    /// Adds one file's counts. Percentages are left stale until
    /// [`LanguageLineStats::recompute_percentages`] runs.
    pub fn absorb(&mut self, counts: &LineCounts) {
        self.file_count += 1;
        self.line_count += counts.lines();
        self.code_count += counts.code;
        self.documentation_count += counts.documentation;
        self.empty_count += counts.empty;
        self.source_count += counts.source();
    }

    pub fn recompute_percentages(&mut self) {
        let pct = |count: u64| {
            if self.line_count == 0 {
                0.0
            } else {
                count as f64 / self.line_count as f64 * 100.0
            }
        };
        self.code_percentage = pct(self.code_count);
        self.documentation_percentage = pct(self.documentation_count);
        self.empty_percentage = pct(self.empty_count);
        self.source_percentage = pct(self.source_count);
    }
}

/// Language name to its line statistics, including [`TOTAL_LANGUAGE`].
pub type LocTable = BTreeMap<String, LanguageLineStats>;

/// Scalar indicators reported by the external quality calculator for one
/// repository. A field is `None` when the calculator did not report it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QualityMetrics {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cyclomatic_complexity: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub halstead_bugprop: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub halstead_difficulty: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub halstead_volume: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maintainability_index: Option<f64>,
}

/// Cross-repository medians of [`QualityMetrics`]; zero where no
/// repository produced a value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricsSummary {
    pub cyclomatic_complexity: f64,
    pub halstead_bugprop: f64,
    pub halstead_difficulty: f64,
    pub halstead_volume: f64,
    pub maintainability_index: f64,
}

impl MetricsSummary {
    pub fn rows(&self) -> [(&'static str, f64); 5] {
        [
            ("cyclomatic_complexity", self.cyclomatic_complexity),
            ("halstead_bugprop", self.halstead_bugprop),
            ("halstead_difficulty", self.halstead_difficulty),
            ("halstead_volume", self.halstead_volume),
            ("maintainability_index", self.maintainability_index),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepositoryRecord {
    pub url: String,
    pub churn: ChurnResult,
    pub loc: LocTable,
    pub metrics: QualityMetrics,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub loc: LocTable,
    pub churn: ChurnResult,
    pub metrics: MetricsSummary,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FleetSummary {
    pub summary: Summary,
    /// Records in completion order.
    pub repositories: Vec<RepositoryRecord>,
}

#[derive(Debug, Clone)]
pub struct DateRange {
    pub since: Option<DateTime<Utc>>,
    pub until: Option<DateTime<Utc>>,
}

impl DateRange {
    pub fn new() -> Self {
        Self { since: None, until: None }
    }

    pub fn with_since(mut self, since: DateTime<Utc>) -> Self {
        self.since = Some(since);
        self
    }

    pub fn with_until(mut self, until: DateTime<Utc>) -> Self {
        self.until = Some(until);
        self
    }

    pub fn contains(&self, timestamp: &DateTime<Utc>) -> bool {
        if let Some(since) = self.since {
            if timestamp < &since {
                return false;
            }
        }
        if let Some(until) = self.until {
            if timestamp > &until {
                return false;
            }
        }
        true
    }
}

impl Default for DateRange {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn churn_changed_tracks_added_plus_deleted() {
        let mut churn = ChurnResult::new(3, 1);
        churn.add(2, 5);
        assert_eq!(churn, ChurnResult { added: 5, deleted: 6, changed: 11 });
    }

    #[test]
    fn percentages_come_from_counts() {
        let mut stats = LanguageLineStats::default();
        stats.absorb(&LineCounts { code: 6, documentation: 2, empty: 2 });
        stats.recompute_percentages();
        assert_eq!(stats.line_count, 10);
        assert_eq!(stats.source_count, 8);
        assert!((stats.code_percentage - 60.0).abs() < 1e-9);
        assert!((stats.source_percentage - 80.0).abs() < 1e-9);
    }

    #[test]
    fn empty_stats_have_zero_percentages() {
        let mut stats = LanguageLineStats::default();
        stats.absorb(&LineCounts::default());
        stats.recompute_percentages();
        assert_eq!(stats.file_count, 1);
        assert_eq!(stats.code_percentage, 0.0);
    }

    #[test]
    fn missing_metrics_are_not_serialized() {
        let metrics = QualityMetrics {
            maintainability_index: Some(71.5),
            ..Default::default()
        };
        let json = serde_json::to_value(&metrics).unwrap();
        assert_eq!(json, serde_json::json!({ "maintainability_index": 71.5 }));
    }

    #[test]
    fn date_range_bounds_are_inclusive() {
        let now = Utc::now();
        let range = DateRange::new()
            .with_since(now - Duration::days(1))
            .with_until(now);
        assert!(range.contains(&now));
        assert!(range.contains(&(now - Duration::days(1))));
        assert!(!range.contains(&(now - Duration::days(2))));
        assert!(!range.contains(&(now + Duration::seconds(1))));
    }
}
