//! Pause-time extraction from per-collector GC logs.
//!
//! The benchmark harness leaves the generation summaries on the final two
//! lines of each log:
//!
//! ```text
//! young generation GC time 12.345 secs, 42 GC's, avg GC time 0.294
//! old generation GC time 1.234 secs, 3 GC's, avg GC time 0.411
//! ```
//!
//! Throughput-oriented collectors emit only the short form
//! (`young generation GC time 12.345 secs`) with no counts.

use std::io::{BufRead, BufReader};
use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use crate::discover::{BenchRun, LogFile};
use crate::errors::GcStatsError;

static GEN_SUMMARY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?P<gen>young|old) generation GC time (?P<total>\d+\.\d+) secs(?:, (?P<count>\d+) GC's, avg GC time (?P<avg>\d+\.\d+))?",
    )
    .expect("generation summary regex")
});

/// One generation's summary line, parsed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenSummary {
    pub total_secs: f64,
    /// Absent in the short summary form.
    pub gcs: Option<u64>,
    pub avg_secs: Option<f64>,
}

/// The parsed tail of one log file.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PauseSample {
    pub young: GenSummary,
    pub old: Option<GenSummary>,
}

/// Aggregated pause statistics for one algorithm group, averaged across the
/// group's matched log files.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupStats {
    pub algorithm: String,
    /// Log files that contributed (files whose tail did not match are skipped).
    pub logs: usize,
    pub young_total_secs: f64,
    pub young_gcs: Option<f64>,
    pub young_avg_secs: Option<f64>,
    pub old_total_secs: Option<f64>,
    pub old_gcs: Option<f64>,
    pub old_avg_secs: Option<f64>,
}

/// Everything extracted from one run: per-group stats plus the groups that
/// had no matching logs at all.
#[derive(Debug, Clone)]
pub struct RunAnalysis {
    pub stats: Vec<GroupStats>,
    pub skipped_groups: Vec<String>,
}

/// Parse a generation summary line. Returns the generation name and values.
pub fn parse_generation_line(line: &str) -> Option<(&str, GenSummary)> {
    let caps = GEN_SUMMARY_RE.captures(line)?;
    let generation = caps.name("gen")?.as_str();
    let total_secs: f64 = caps["total"].parse().ok()?;
    let gcs = caps.name("count").and_then(|m| m.as_str().parse().ok());
    let avg_secs = caps.name("avg").and_then(|m| m.as_str().parse().ok());
    Some((
        generation,
        GenSummary {
            total_secs,
            gcs,
            avg_secs,
        },
    ))
}

/// Read the last two non-empty lines of a log and extract the young (and,
/// when present, old) generation summaries. `Ok(None)` means the tail did
/// not match and the file should be skipped.
pub fn extract_tail_sample(path: &Path) -> Result<Option<PauseSample>, GcStatsError> {
    let file = std::fs::File::open(path).map_err(|source| GcStatsError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    let mut tail: [Option<String>; 2] = [None, None];
    for line in BufReader::new(file).lines() {
        let line = line.map_err(|source| GcStatsError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        if line.trim().is_empty() {
            continue;
        }
        tail[0] = tail[1].take();
        tail[1] = Some(line);
    }

    let mut young = None;
    let mut old = None;
    for line in tail.iter().flatten() {
        match parse_generation_line(line) {
            Some(("young", summary)) => young = Some(summary),
            Some(("old", summary)) => old = Some(summary),
            _ => {}
        }
    }

    // The young summary is the anchor; without it the file is skipped, as
    // the original extraction did.
    Ok(young.map(|young| PauseSample { young, old }))
}

/// Average the samples of one group's log files. `None` when no file in the
/// group had a matching tail.
pub fn aggregate_group(
    algorithm: &str,
    files: &[LogFile],
) -> Result<Option<GroupStats>, GcStatsError> {
    let mut samples = Vec::new();
    for file in files {
        if let Some(sample) = extract_tail_sample(&file.path)? {
            samples.push(sample);
        }
    }

    if samples.is_empty() {
        return Ok(None);
    }

    let n = samples.len() as f64;
    // Optional columns average only when every sample carries them.
    let mean = |values: Vec<f64>| -> Option<f64> {
        (values.len() == samples.len()).then(|| values.iter().sum::<f64>() / n)
    };

    let young_total_secs = samples.iter().map(|s| s.young.total_secs).sum::<f64>() / n;
    let young_gcs = mean(
        samples
            .iter()
            .filter_map(|s| s.young.gcs.map(|v| v as f64))
            .collect(),
    );
    let young_avg_secs = mean(samples.iter().filter_map(|s| s.young.avg_secs).collect());

    let old_total_secs = mean(samples.iter().filter_map(|s| s.old.map(|o| o.total_secs)).collect());
    let old_gcs = mean(
        samples
            .iter()
            .filter_map(|s| s.old.and_then(|o| o.gcs).map(|v| v as f64))
            .collect(),
    );
    let old_avg_secs = mean(
        samples
            .iter()
            .filter_map(|s| s.old.and_then(|o| o.avg_secs))
            .collect(),
    );

    Ok(Some(GroupStats {
        algorithm: algorithm.to_string(),
        logs: samples.len(),
        young_total_secs,
        young_gcs,
        young_avg_secs,
        old_total_secs,
        old_gcs,
        old_avg_secs,
    }))
}

/// Analyze every algorithm group of a run. Errors when no group in the run
/// produced any data.
pub fn analyze_run(run: &BenchRun) -> Result<RunAnalysis, GcStatsError> {
    let mut stats = Vec::new();
    let mut skipped_groups = Vec::new();

    for (algorithm, files) in &run.groups {
        match aggregate_group(algorithm, files)? {
            Some(group_stats) => stats.push(group_stats),
            None => skipped_groups.push(algorithm.clone()),
        }
    }

    if stats.is_empty() {
        return Err(GcStatsError::NoPauseData {
            run: run.name.clone(),
        });
    }

    Ok(RunAnalysis {
        stats,
        skipped_groups,
    })
}

/// Write one run's stats as `gc_stats_<run>.csv` under `out_dir`.
pub fn write_csv(stats: &[GroupStats], out_dir: &Path, run_name: &str) -> Result<std::path::PathBuf, GcStatsError> {
    let path = out_dir.join(format!("gc_stats_{run_name}.csv"));
    let mut writer = csv::Writer::from_path(&path).map_err(|source| GcStatsError::Csv {
        path: path.clone(),
        source,
    })?;

    for row in stats {
        writer.serialize(row).map_err(|source| GcStatsError::Csv {
            path: path.clone(),
            source,
        })?;
    }

    writer.flush().map_err(|source| GcStatsError::Write {
        path: path.clone(),
        source,
    })?;

    Ok(path)
}
