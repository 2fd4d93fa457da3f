//! Human and machine output: run listings, summary tables, CSV and JSON.

use std::path::Path;

use chrono::{DateTime, Utc};
use owo_colors::{OwoColorize, Stream};
use serde::Serialize;
use tabled::{Table, Tabled};

use crate::discover::BenchRun;
use crate::errors::GcStatsError;
use crate::lifetime::ReconstructionReport;
use crate::summary::{GroupBy, GroupSummary};

/// Format a duration into a compact relative time string like "2m ago".
pub fn format_relative_time(duration: chrono::Duration) -> String {
    let secs = duration.num_seconds().max(0);
    if secs < 60 {
        "<1m ago".to_string()
    } else if secs < 3600 {
        format!("{}m ago", secs / 60)
    } else if secs < 86400 {
        format!("{}h ago", secs / 3600)
    } else if secs < 604800 {
        format!("{}d ago", secs / 86400)
    } else if secs < 2592000 {
        format!("{}w ago", secs / 604800)
    } else if secs < 31536000 {
        format!("{}mo ago", secs / 2592000)
    } else {
        format!("{}y ago", secs / 31536000)
    }
}

/// Listing of discovered benchmark runs: header, aligned columns, one line
/// per run.
pub fn format_run_list(runs: &[BenchRun], now: DateTime<Utc>) -> String {
    let mut out = String::new();

    let header = "Benchmark runs:";
    out.push_str(
        &header
            .if_supports_color(Stream::Stdout, |s| s.dimmed())
            .to_string(),
    );
    out.push_str("\n\n");

    if !runs.is_empty() {
        let max_name_width = runs.iter().map(|r| r.name.len()).max().unwrap_or(0);

        for run in runs {
            let name_padded = format!("{:<width$}", run.name, width = max_name_width);
            let name_colored = name_padded
                .if_supports_color(Stream::Stdout, |s| s.green())
                .to_string();

            let time_str = match run.newest_mtime() {
                Some(mtime) => format_relative_time(now - DateTime::<Utc>::from(mtime)),
                None => "no logs".to_string(),
            };
            let time_padded = format!("{:>8}", time_str);
            let time_colored = time_padded
                .if_supports_color(Stream::Stdout, |s| s.yellow())
                .to_string();

            let counts = format!(
                "{:>3} logs in {} groups",
                run.log_count(),
                run.groups.len()
            );

            let groups = run
                .groups
                .keys()
                .cloned()
                .collect::<Vec<_>>()
                .join(", ");
            let groups_colored = groups
                .if_supports_color(Stream::Stdout, |s| s.dimmed())
                .to_string();

            out.push_str(&format!(
                "  {}  {}  {}   {}\n",
                name_colored, time_colored, counts, groups_colored
            ));
        }

        out.push('\n');
    }

    let footer = "Extract pauses: gcstats pauses <root>";
    out.push_str(
        &footer
            .if_supports_color(Stream::Stdout, |s| s.dimmed())
            .to_string(),
    );
    out.push('\n');

    out
}

#[derive(Serialize)]
struct JsonRun {
    name: String,
    logs: usize,
    groups: Vec<String>,
    last_modified: Option<String>,
    last_modified_relative: Option<String>,
}

pub fn run_list_json(runs: &[BenchRun], now: DateTime<Utc>) -> String {
    let entries: Vec<JsonRun> = runs
        .iter()
        .map(|run| {
            let mtime = run.newest_mtime().map(DateTime::<Utc>::from);
            JsonRun {
                name: run.name.clone(),
                logs: run.log_count(),
                groups: run.groups.keys().cloned().collect(),
                last_modified: mtime.map(|t| t.format("%Y-%m-%dT%H:%M:%SZ").to_string()),
                last_modified_relative: mtime.map(|t| format_relative_time(now - t)),
            }
        })
        .collect();

    serde_json::to_string_pretty(&entries).unwrap_or_else(|_| "[]".to_string())
}

#[derive(Tabled)]
struct TypeRow {
    #[tabled(rename = "Type")]
    ty: String,
    #[tabled(rename = "Count")]
    count: usize,
    #[tabled(rename = "Mean (ns)")]
    mean: String,
    #[tabled(rename = "Min (ns)")]
    min: u64,
    #[tabled(rename = "Max (ns)")]
    max: u64,
}

#[derive(Tabled)]
struct SiteRow {
    #[tabled(rename = "Type")]
    ty: String,
    #[tabled(rename = "Site")]
    site: String,
    #[tabled(rename = "Count")]
    count: usize,
    #[tabled(rename = "Mean (ns)")]
    mean: String,
    #[tabled(rename = "Min (ns)")]
    min: u64,
    #[tabled(rename = "Max (ns)")]
    max: u64,
}

/// ASCII table of group summaries.
pub fn format_summary_table(summaries: &[GroupSummary], by: GroupBy) -> String {
    if summaries.is_empty() {
        return "No groups to report".to_string();
    }

    match by {
        GroupBy::Type => {
            let rows: Vec<TypeRow> = summaries
                .iter()
                .map(|s| TypeRow {
                    ty: s.ty.clone(),
                    count: s.count,
                    mean: format!("{:.1}", s.mean_lifetime),
                    min: s.min_lifetime,
                    max: s.max_lifetime,
                })
                .collect();
            Table::new(rows).to_string()
        }
        GroupBy::TypeAndSite => {
            let rows: Vec<SiteRow> = summaries
                .iter()
                .map(|s| SiteRow {
                    ty: s.ty.clone(),
                    site: s.site.clone().unwrap_or_default(),
                    count: s.count,
                    mean: format!("{:.1}", s.mean_lifetime),
                    min: s.min_lifetime,
                    max: s.max_lifetime,
                })
                .collect();
            Table::new(rows).to_string()
        }
    }
}

pub fn summary_json(summaries: &[GroupSummary]) -> String {
    serde_json::to_string_pretty(summaries).unwrap_or_else(|_| "[]".to_string())
}

/// Write group summaries as CSV.
pub fn write_summary_csv(summaries: &[GroupSummary], path: &Path) -> Result<(), GcStatsError> {
    let mut writer = csv::Writer::from_path(path).map_err(|source| GcStatsError::Csv {
        path: path.to_path_buf(),
        source,
    })?;

    for summary in summaries {
        writer
            .serialize(summary)
            .map_err(|source| GcStatsError::Csv {
                path: path.to_path_buf(),
                source,
            })?;
    }

    writer.flush().map_err(|source| GcStatsError::Write {
        path: path.to_path_buf(),
        source,
    })
}

/// One-line reconstruction report for stderr.
pub fn format_reconstruction_report(report: &ReconstructionReport) -> String {
    format!(
        "{} lines, {} events, {} completed, {} orphans, {} leaked, {} malformed",
        report.lines,
        report.events,
        report.completed,
        report.orphans,
        report.leaked,
        report.malformed
    )
}
