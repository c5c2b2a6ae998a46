//! Dataset output and terminal reporting.
//!
//! Split files and statistics are written via temp-file-then-rename so a
//! crashed run never leaves a half-written JSON file behind; downstream
//! consumers either see the previous dataset or the complete new one.

use crate::error::{QuarryError, Result};
use crate::report::{DatasetStatistics, RunReport};
use crate::split::SplitDataset;
use crate::types::SampleRecord;
use colored::Colorize;
use serde::Serialize;
use std::fs;
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;
use tracing::debug;

pub const STATISTICS_FILE: &str = "dataset_statistics.json";

/// Write the three split files plus `dataset_statistics.json` into `dir`
pub fn write_dataset(dir: &Path, split: &SplitDataset, stats: &DatasetStatistics) -> Result<()> {
    fs::create_dir_all(dir)?;
    for (name, part) in split.named() {
        write_json_atomic(&dir.join(format!("{name}.json")), &part)?;
    }
    write_json_atomic(&dir.join(STATISTICS_FILE), stats)?;
    Ok(())
}

/// Serialize to a temp file in the destination directory, then rename into
/// place
fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let parent = path.parent().filter(|p| !p.as_os_str().is_empty()).unwrap_or(Path::new("."));
    let mut tmp = NamedTempFile::new_in(parent)?;
    serde_json::to_writer_pretty(&mut tmp, value)
        .map_err(|e| QuarryError::serialization(format!("{}: {e}", path.display())))?;
    tmp.write_all(b"\n")?;
    tmp.persist(path).map_err(|e| QuarryError::Io(e.error))?;
    debug!("wrote {}", path.display());
    Ok(())
}

/// Load the three split files of an emitted dataset
pub fn load_split(dir: &Path) -> Result<SplitDataset> {
    Ok(SplitDataset {
        train: load_samples(&dir.join("train.json"))?,
        val: load_samples(&dir.join("val.json"))?,
        test: load_samples(&dir.join("test.json"))?,
    })
}

fn load_samples(path: &Path) -> Result<Vec<SampleRecord>> {
    let text =
        fs::read_to_string(path).map_err(|_| QuarryError::dataset_unreadable(path))?;
    serde_json::from_str(&text)
        .map_err(|e| QuarryError::serialization(format!("{}: {e}", path.display())))
}

/// Human-readable run summary for terminal mode
pub fn print_run_summary(report: &RunReport, split: &SplitDataset) {
    let c = &report.counters;

    println!("{}", "Extraction summary".bold());
    println!("  commits seen          {}", c.commits_seen);
    if c.malformed_records > 0 {
        println!("  malformed records     {}", c.malformed_records.to_string().yellow());
    }
    println!("  unclassified commits  {}", c.unclassified_commits);
    println!("  file diffs examined   {}", c.diffs_considered);
    println!("  trivial changes       {}", c.trivial_changes);
    println!("  missing indicator     {}", c.missing_indicator);
    println!("  low confidence        {}", c.low_confidence);
    println!(
        "  duplicates            {} content, {} commit",
        c.duplicate_content, c.duplicate_commit
    );
    if c.oversized_blobs > 0 {
        println!("  oversized blobs       {}", c.oversized_blobs.to_string().yellow());
    }

    println!(
        "\n{} {} samples ({:.1}% of examined diffs)",
        "Accepted".green().bold(),
        c.accepted,
        c.acceptance_rate() * 100.0
    );
    for (label, count) in &report.per_category {
        println!("  {label:<30} {count}");
    }

    println!(
        "\nSplits: train {} / val {} / test {}",
        split.train.len(),
        split.val.len(),
        split.test.len()
    );
    let scores: Vec<String> = report
        .confidence_histogram
        .iter()
        .map(|(score, count)| format!("{score}: {count}"))
        .collect();
    println!("Confidence: {}", scores.join(", "));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::StageCounters;
    use crate::types::Category;
    use tempfile::TempDir;

    fn sample(serial: u32) -> SampleRecord {
        SampleRecord {
            serial_no: serial,
            vulnerable_code: "stmt.executeQuery(\"SELECT 1 FROM t WHERE a = \" + a);".to_string(),
            vulnerability_type: Category::SqlInjection.label().to_string(),
            repo: "webapp".to_string(),
            commit: format!("{serial:040x}"),
            commit_msg: "fix, bug: 5".to_string(),
            original_file: "Dao.java".to_string(),
            confidence_score: 0.8,
        }
    }

    #[test]
    fn test_write_and_load_round_trip() {
        let dir = TempDir::new().unwrap();
        let split = SplitDataset {
            train: vec![sample(1), sample(2)],
            val: vec![sample(3)],
            test: vec![sample(4)],
        };
        let stats = DatasetStatistics::from_split(&split, Some(StageCounters::default()));

        write_dataset(dir.path(), &split, &stats).unwrap();
        let loaded = load_split(dir.path()).unwrap();

        assert_eq!(loaded.train.len(), 2);
        assert_eq!(loaded.val.len(), 1);
        assert_eq!(loaded.test.len(), 1);
        assert_eq!(loaded.train[0].serial_no, 1);
        assert!(dir.path().join(STATISTICS_FILE).exists());
    }

    #[test]
    fn test_split_files_carry_exactly_the_published_keys() {
        let dir = TempDir::new().unwrap();
        let split = SplitDataset { train: vec![sample(1)], ..SplitDataset::default() };
        let stats = DatasetStatistics::from_split(&split, None);
        write_dataset(dir.path(), &split, &stats).unwrap();

        let text = fs::read_to_string(dir.path().join("train.json")).unwrap();
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        let object = value.as_array().unwrap()[0].as_object().unwrap();

        let mut keys: Vec<&str> = object.keys().map(String::as_str).collect();
        keys.sort_unstable();
        assert_eq!(
            keys,
            vec![
                "commit",
                "commit_msg",
                "confidence_score",
                "original_file",
                "repo",
                "serial_no",
                "vulnerability_type",
                "vulnerable_code",
            ]
        );
    }

    #[test]
    fn test_rewrites_are_byte_identical() {
        let dir_a = TempDir::new().unwrap();
        let dir_b = TempDir::new().unwrap();
        let split = SplitDataset { train: vec![sample(1)], ..SplitDataset::default() };
        let stats = DatasetStatistics::from_split(&split, None);

        write_dataset(dir_a.path(), &split, &stats).unwrap();
        write_dataset(dir_b.path(), &split, &stats).unwrap();

        for name in ["train.json", "val.json", "test.json"] {
            let a = fs::read(dir_a.path().join(name)).unwrap();
            let b = fs::read(dir_b.path().join(name)).unwrap();
            assert_eq!(a, b, "{name}");
        }
    }

    #[test]
    fn test_missing_split_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        assert!(matches!(
            load_split(dir.path()),
            Err(QuarryError::DatasetUnreadable { .. })
        ));
    }
}
