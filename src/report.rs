use crate::model::{FleetSummary, LanguageLineStats, Summary};
use anyhow::{Context, Result};
use console::style;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Writes the whole summary as JSON and returns the absolute path written.
pub fn write_json(path: &Path, summary: &FleetSummary) -> Result<PathBuf> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }

    let file = File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, summary).context("Failed to serialize summary")?;
    writer.flush().context("Failed to write summary")?;

    Ok(std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf()))
}

/// Largest languages first, by total lines.
pub fn loc_rows(summary: &Summary) -> Vec<(&str, &LanguageLineStats)> {
    let mut rows: Vec<_> = summary.loc.iter().map(|(l, s)| (l.as_str(), s)).collect();
    rows.sort_by(|a, b| b.1.line_count.cmp(&a.1.line_count).then_with(|| a.0.cmp(b.0)));
    rows
}

pub fn print_summary(summary: &FleetSummary, requested: usize) {
    let s = &summary.summary;

    println!("\n{}\n", style("[!] Churn stats").bold());
    println!(
        "{:<12} {:<12} {:<12}",
        style("Added").bold(),
        style("Deleted").bold(),
        style("Changed").bold()
    );
    println!("{}", "─".repeat(38));
    println!("{:<12} {:<12} {:<12}", s.churn.added, s.churn.deleted, s.churn.changed);

    println!("\n{}\n", style("[!] LoC stats").bold());
    println!(
        "{:<24} {:>8} {:>12} {:>14} {:>10}",
        style("Language").bold(),
        style("Files").bold(),
        style("Total Lines").bold(),
        style("Lines of Code").bold(),
        style("Code %").bold()
    );
    println!("{}", "─".repeat(72));
    for (language, stats) in loc_rows(s) {
        println!(
            "{:<24} {:>8} {:>12} {:>14} {:>10.2}",
            language, stats.file_count, stats.line_count, stats.code_count, stats.code_percentage
        );
    }

    println!("\n{}\n", style("[!] Code quality metrics stats").bold());
    println!("{:<26} {:>14}", style("Metric Name").bold(), style("Metric Value").bold());
    println!("{}", "─".repeat(41));
    for (name, value) in s.metrics.rows() {
        println!("{:<26} {:>14.2}", name, value);
    }

    println!(
        "\n{} of {} repositories analyzed",
        style(summary.repositories.len()).cyan(),
        style(requested).cyan()
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ChurnResult, QualityMetrics, RepositoryRecord, TOTAL_LANGUAGE};

    fn stats(lines: u64) -> LanguageLineStats {
        LanguageLineStats {
            line_count: lines,
            ..Default::default()
        }
    }

    #[test]
    fn loc_rows_are_sorted_by_total_lines() {
        let mut summary = Summary::default();
        summary.loc.insert("Go".into(), stats(10));
        summary.loc.insert(TOTAL_LANGUAGE.into(), stats(60));
        summary.loc.insert("Rust".into(), stats(50));

        let names: Vec<&str> = loc_rows(&summary).into_iter().map(|(l, _)| l).collect();
        assert_eq!(names, vec![TOTAL_LANGUAGE, "Rust", "Go"]);
    }

    #[test]
    fn json_has_summary_and_repositories() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("nested/out.json");
        let summary = FleetSummary::new(vec![RepositoryRecord {
            url: "https://h/org/a".into(),
            churn: ChurnResult::new(4, 1),
            loc: Default::default(),
            metrics: QualityMetrics::default(),
        }]);

        let written = write_json(&out, &summary).unwrap();
        assert!(written.is_absolute());

        let value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&out).unwrap()).unwrap();
        assert_eq!(value["summary"]["churn"]["changed"], 5);
        assert_eq!(value["repositories"][0]["url"], "https://h/org/a");
        assert!(value["summary"]["loc"].as_object().unwrap().is_empty());
    }
}
