//! Cross-repository reduction.
//!
//! Each entity declares how every one of its fields is reduced: counts are
//! summed, ratios and quality indicators take the median. The reductions
//! are written as struct literals, so adding a field without deciding its
//! reduction does not compile.

use crate::model::{
    ChurnResult, FleetSummary, LanguageLineStats, LocTable, MetricsSummary, QualityMetrics,
    RepositoryRecord, Summary,
};
use std::collections::BTreeMap;

pub trait Reduce {
    type Output;

    fn reduce(items: &[&Self]) -> Self::Output;
}

/// Median of `values`; the mean of the two middle values for an even
/// count and `0.0` for no values. NaNs are ignored.
pub fn median(values: impl IntoIterator<Item = f64>) -> f64 {
    let mut values: Vec<f64> = values.into_iter().filter(|v| !v.is_nan()).collect();
    if values.is_empty() {
        return 0.0;
    }
    values.sort_by(|a, b| a.total_cmp(b));

    let mid = values.len() / 2;
    if values.len() % 2 == 0 {
        (values[mid - 1] + values[mid]) / 2.0
    } else {
        values[mid]
    }
}

impl Reduce for ChurnResult {
    type Output = ChurnResult;

    fn reduce(items: &[&Self]) -> ChurnResult {
        ChurnResult {
            added: items.iter().map(|c| c.added).sum(),
            deleted: items.iter().map(|c| c.deleted).sum(),
            changed: items.iter().map(|c| c.changed).sum(),
        }
    }
}

impl Reduce for LanguageLineStats {
    type Output = LanguageLineStats;

    fn reduce(items: &[&Self]) -> LanguageLineStats {
        let sum = |field: fn(&LanguageLineStats) -> u64| -> u64 { items.iter().map(|s| field(s)).sum() };
        let med = |field: fn(&LanguageLineStats) -> f64| -> f64 { median(items.iter().map(|s| field(s))) };

        LanguageLineStats {
            file_count: sum(|s| s.file_count),
            line_count: sum(|s| s.line_count),
            code_count: sum(|s| s.code_count),
            documentation_count: sum(|s| s.documentation_count),
            empty_count: sum(|s| s.empty_count),
            source_count: sum(|s| s.source_count),
            code_percentage: med(|s| s.code_percentage),
            documentation_percentage: med(|s| s.documentation_percentage),
            empty_percentage: med(|s| s.empty_percentage),
            source_percentage: med(|s| s.source_percentage),
        }
    }
}

impl Reduce for QualityMetrics {
    type Output = MetricsSummary;

    /// Medians over the repositories that produced each value.
    fn reduce(items: &[&Self]) -> MetricsSummary {
        let med = |field: fn(&QualityMetrics) -> Option<f64>| {
            median(items.iter().filter_map(|m| field(m)))
        };

        MetricsSummary {
            cyclomatic_complexity: med(|m| m.cyclomatic_complexity),
            halstead_bugprop: med(|m| m.halstead_bugprop),
            halstead_difficulty: med(|m| m.halstead_difficulty),
            halstead_volume: med(|m| m.halstead_volume),
            maintainability_index: med(|m| m.maintainability_index),
        }
    }
}

/// Per-language reduction over the repositories that contain the
/// language.
pub fn reduce_loc(records: &[RepositoryRecord]) -> LocTable {
    let mut by_language: BTreeMap<&str, Vec<&LanguageLineStats>> = BTreeMap::new();
    for record in records {
        for (language, stats) in &record.loc {
            by_language.entry(language.as_str()).or_default().push(stats);
        }
    }

    by_language
        .into_iter()
        .map(|(language, stats)| (language.to_string(), LanguageLineStats::reduce(&stats)))
        .collect()
}

pub fn summarize(records: &[RepositoryRecord]) -> Summary {
    let churn: Vec<&ChurnResult> = records.iter().map(|r| &r.churn).collect();
    let metrics: Vec<&QualityMetrics> = records.iter().map(|r| &r.metrics).collect();

    Summary {
        loc: reduce_loc(records),
        churn: ChurnResult::reduce(&churn),
        metrics: QualityMetrics::reduce(&metrics),
    }
}

impl FleetSummary {
    pub fn new(repositories: Vec<RepositoryRecord>) -> Self {
        Self {
            summary: summarize(&repositories),
            repositories,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{LineCounts, TOTAL_LANGUAGE};
    use pretty_assertions::assert_eq;

    fn stats(code: u64, documentation: u64, empty: u64) -> LanguageLineStats {
        let mut s = LanguageLineStats::default();
        s.absorb(&LineCounts { code, documentation, empty });
        s.recompute_percentages();
        s
    }

    fn record(url: &str, churn: ChurnResult, loc: &[(&str, LanguageLineStats)], mi: Option<f64>) -> RepositoryRecord {
        RepositoryRecord {
            url: url.to_string(),
            churn,
            loc: loc.iter().map(|(l, s)| (l.to_string(), s.clone())).collect(),
            metrics: QualityMetrics {
                maintainability_index: mi,
                ..Default::default()
            },
        }
    }

    #[test]
    fn median_of_odd_count_is_the_middle_value() {
        assert_eq!(median([9.0, 1.0, 2.0]), 2.0);
    }

    #[test]
    fn median_of_even_count_averages_the_middle_pair() {
        assert_eq!(median([4.0, 1.0, 3.0, 2.0]), 2.5);
    }

    #[test]
    fn median_of_nothing_is_zero() {
        assert_eq!(median(std::iter::empty()), 0.0);
        assert_eq!(median([f64::NAN]), 0.0);
    }

    #[test]
    fn empty_fleet_reduces_to_explicit_zeros() {
        let summary = FleetSummary::new(Vec::new());
        assert!(summary.summary.loc.is_empty());
        assert_eq!(summary.summary.churn, ChurnResult { added: 0, deleted: 0, changed: 0 });
        assert_eq!(summary.summary.metrics, MetricsSummary::default());

        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["summary"]["metrics"]["maintainability_index"], 0.0);
        assert_eq!(json["repositories"], serde_json::json!([]));
    }

    #[test]
    fn quality_metrics_take_the_median_not_the_mean() {
        let records = vec![
            record("a", ChurnResult::default(), &[], Some(1.0)),
            record("b", ChurnResult::default(), &[], Some(2.0)),
            record("c", ChurnResult::default(), &[], Some(9.0)),
        ];
        assert_eq!(summarize(&records).metrics.maintainability_index, 2.0);
    }

    #[test]
    fn quality_metrics_skip_repositories_without_a_value() {
        let records = vec![
            record("a", ChurnResult::default(), &[], Some(3.0)),
            record("b", ChurnResult::default(), &[], None),
        ];
        let metrics = summarize(&records).metrics;
        assert_eq!(metrics.maintainability_index, 3.0);
        assert_eq!(metrics.halstead_volume, 0.0);
    }

    #[test]
    fn churn_is_summed() {
        let records = vec![
            record("a", ChurnResult::new(10, 2), &[], None),
            record("b", ChurnResult::new(1, 7), &[], None),
        ];
        assert_eq!(summarize(&records).churn, ChurnResult { added: 11, deleted: 9, changed: 20 });
    }

    #[test]
    fn loc_sums_counts_and_takes_median_percentages() {
        let records = vec![
            record("a", ChurnResult::default(), &[("Rust", stats(50, 0, 50)), (TOTAL_LANGUAGE, stats(50, 0, 50))], None),
            record("b", ChurnResult::default(), &[("Rust", stats(10, 0, 0))], None),
            record("c", ChurnResult::default(), &[("Rust", stats(20, 0, 80)), ("Go", stats(3, 1, 0))], None),
        ];

        let loc = summarize(&records).loc;
        let rust = &loc["Rust"];
        assert_eq!(rust.file_count, 3);
        assert_eq!(rust.code_count, 80);
        assert_eq!(rust.line_count, 210);
        // per-repository code percentages are 50, 100 and 20
        assert_eq!(rust.code_percentage, 50.0);

        assert_eq!(loc["Go"].file_count, 1);
        assert_eq!(loc["Go"].code_percentage, 75.0);
        assert_eq!(loc[TOTAL_LANGUAGE].line_count, 100);
    }
}
