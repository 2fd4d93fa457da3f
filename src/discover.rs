use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use anyhow::Result;

use crate::errors::GcStatsError;

/// Default name of the per-run log directory, as the benchmark harness
/// writes it.
pub const DEFAULT_LOGS_DIR: &str = "moreLogs";

/// One GC log file inside a run's log directory.
#[derive(Debug, Clone)]
pub struct LogFile {
    pub path: PathBuf,
    pub mtime: SystemTime,
}

/// One benchmark run: a directory containing a log directory, with its log
/// files grouped by GC algorithm.
#[derive(Debug, Clone)]
pub struct BenchRun {
    pub name: String,
    pub logs_dir: PathBuf,
    /// Algorithm group (file-name prefix before `.log`) to its log files,
    /// sorted by file name within each group.
    pub groups: BTreeMap<String, Vec<LogFile>>,
}

impl BenchRun {
    pub fn log_count(&self) -> usize {
        self.groups.values().map(Vec::len).sum()
    }

    /// Mtime of the most recently written log, if any.
    pub fn newest_mtime(&self) -> Option<SystemTime> {
        self.groups
            .values()
            .flatten()
            .map(|f| f.mtime)
            .max()
    }
}

/// The algorithm group of a log file: the file-name prefix before the first
/// `.log`. Files without a `.log` component do not belong to any group.
pub fn algorithm_group(file_name: &str) -> Option<&str> {
    file_name.find(".log").map(|idx| &file_name[..idx])
}

/// Discover benchmark runs under `root`.
///
/// Every direct subdirectory of `root` that contains a `logs_dir_name`
/// directory counts as a run. Runs are sorted by name. Returns `Ok(vec![])`
/// when `root` exists but holds no runs (caller decides whether that is an
/// error).
pub fn discover_runs(root: &Path, logs_dir_name: &str) -> Result<Vec<BenchRun>> {
    if !root.is_dir() {
        return Err(GcStatsError::RootNotFound {
            path: root.to_path_buf(),
        }
        .into());
    }

    let mut runs = Vec::new();

    let entries = match std::fs::read_dir(root) {
        Ok(entries) => entries,
        Err(_) => return Ok(vec![]),
    };

    for entry in entries {
        let entry = match entry {
            Ok(e) => e,
            Err(_) => continue,
        };

        let run_path = entry.path();
        if !run_path.is_dir() {
            continue;
        }

        let logs_dir = run_path.join(logs_dir_name);
        if !logs_dir.is_dir() {
            continue;
        }

        let Some(name) = run_path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };

        runs.push(BenchRun {
            name: name.to_string(),
            groups: collect_log_groups(&logs_dir),
            logs_dir,
        });
    }

    runs.sort_by(|a, b| a.name.cmp(&b.name));

    Ok(runs)
}

fn collect_log_groups(logs_dir: &Path) -> BTreeMap<String, Vec<LogFile>> {
    let mut groups: BTreeMap<String, Vec<LogFile>> = BTreeMap::new();

    let entries = match std::fs::read_dir(logs_dir) {
        Ok(entries) => entries,
        Err(_) => return groups,
    };

    for entry in entries {
        let entry = match entry {
            Ok(e) => e,
            Err(_) => continue,
        };

        let path = entry.path();

        let Some(file_name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };

        let Some(group) = algorithm_group(file_name) else {
            continue;
        };

        let metadata = match path.symlink_metadata() {
            Ok(m) => m,
            Err(_) => continue,
        };

        if metadata.file_type().is_symlink() || !metadata.is_file() {
            continue;
        }

        let mtime = match metadata.modified() {
            Ok(t) => t,
            Err(_) => continue,
        };

        groups
            .entry(group.to_string())
            .or_default()
            .push(LogFile { path, mtime });
    }

    for files in groups.values_mut() {
        files.sort_by(|a, b| a.path.cmp(&b.path));
    }

    groups
}
