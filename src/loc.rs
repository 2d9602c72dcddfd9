pub mod classify;

pub use classify::{ExtensionClassifier, FileLines, LineClassifier};

use crate::error::Result;
use crate::model::{LanguageLineStats, LocTable, TOTAL_LANGUAGE};
use rayon::prelude::*;
use rayon::ThreadPoolBuilder;
use std::path::PathBuf;

/// Classifies every file on a pool of `workers` threads and merges the
/// results per language.
pub fn count_lines(
    files: &[PathBuf],
    classifier: &dyn LineClassifier,
    workers: usize,
) -> Result<LocTable> {
    let pool = ThreadPoolBuilder::new().num_threads(workers.max(1)).build()?;
    let per_file = pool.install(|| {
        files
            .par_iter()
            .map(|path| classifier.classify(path))
            .collect::<Result<Vec<_>>>()
    })?;

    Ok(merge(&per_file))
}

/// Sums per-file counts into per-language totals plus a `Total` entry.
/// Percentages are recomputed from the summed counts.
pub fn merge(files: &[FileLines]) -> LocTable {
    let mut table = LocTable::new();
    let mut total = LanguageLineStats::default();

    for file in files {
        table
            .entry(file.language.clone())
            .or_default()
            .absorb(&file.counts);
        total.absorb(&file.counts);
    }

    for stats in table.values_mut() {
        stats.recompute_percentages();
    }
    total.recompute_percentages();
    table.insert(TOTAL_LANGUAGE.to_string(), total);
    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::LineCounts;
    use std::fs;

    fn file(language: &str, code: u64, documentation: u64, empty: u64) -> FileLines {
        FileLines {
            language: language.to_string(),
            counts: LineCounts { code, documentation, empty },
        }
    }

    #[test]
    fn total_line_count_is_the_sum_of_languages() {
        let table = merge(&[
            file("Rust", 80, 10, 10),
            file("Rust", 5, 0, 5),
            file("Python", 9, 1, 0),
            file("Markdown", 0, 30, 10),
        ]);

        let languages: u64 = table
            .iter()
            .filter(|(name, _)| name.as_str() != TOTAL_LANGUAGE)
            .map(|(_, stats)| stats.line_count)
            .sum();
        assert_eq!(table[TOTAL_LANGUAGE].line_count, languages);
        assert_eq!(table[TOTAL_LANGUAGE].file_count, 4);
        assert_eq!(table["Rust"].file_count, 2);
        assert_eq!(table["Rust"].code_count, 85);
    }

    #[test]
    fn total_percentage_is_recomputed_not_averaged() {
        // per-file code percentages are 100% and 0%; their mean would be 50%
        let table = merge(&[file("Rust", 90, 0, 0), file("Markdown", 0, 10, 0)]);
        assert!((table[TOTAL_LANGUAGE].code_percentage - 90.0).abs() < 1e-9);
    }

    #[test]
    fn no_files_still_yield_a_total() {
        let table = merge(&[]);
        assert_eq!(table.len(), 1);
        assert_eq!(table[TOTAL_LANGUAGE], LanguageLineStats::default());
    }

    #[test]
    fn count_lines_reads_files_in_parallel() {
        let dir = tempfile::tempdir().unwrap();
        let mut files = Vec::new();
        for i in 0..12 {
            let path = dir.path().join(format!("m{i}.rs"));
            fs::write(&path, "// doc\nfn f() {}\n\n").unwrap();
            files.push(path);
        }

        let table = count_lines(&files, &ExtensionClassifier, 4).unwrap();
        let rust = &table["Rust"];
        assert_eq!(rust.file_count, 12);
        assert_eq!(rust.code_count, 12);
        assert_eq!(rust.documentation_count, 12);
        assert_eq!(rust.empty_count, 12);
        assert_eq!(table[TOTAL_LANGUAGE].line_count, 36);
    }
}
