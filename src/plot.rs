//! Horizontal bar charts of lifetime aggregates, rendered with [`plotters`].
//!
//! Charts are PNG files drawn with the bitmap backend so rendering works in
//! headless environments.

use std::path::{MAIN_SEPARATOR, Path, PathBuf};

use plotters::prelude::*;

use crate::config::PlotConfig;
use crate::errors::GcStatsError;
use crate::summary::{GroupBy, GroupSummary};

/// Which lifetime aggregate a chart shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Aggregate {
    Mean,
    Min,
    Max,
}

impl Aggregate {
    pub const ALL: [Aggregate; 3] = [Aggregate::Mean, Aggregate::Min, Aggregate::Max];

    pub fn name(self) -> &'static str {
        match self {
            Aggregate::Mean => "mean",
            Aggregate::Min => "min",
            Aggregate::Max => "max",
        }
    }

    pub fn value(self, summary: &GroupSummary) -> f64 {
        match self {
            Aggregate::Mean => summary.mean_lifetime,
            Aggregate::Min => summary.min_lifetime as f64,
            Aggregate::Max => summary.max_lifetime as f64,
        }
    }
}

/// File name for one chart: `mean_lifetimes.png`,
/// `mean_lifetimes_alloc_site.png`, and so on.
pub fn plot_file_name(aggregate: Aggregate, by: GroupBy) -> String {
    match by {
        GroupBy::Type => format!("{}_lifetimes.png", aggregate.name()),
        GroupBy::TypeAndSite => format!("{}_lifetimes_alloc_site.png", aggregate.name()),
    }
}

/// Default chart directory for an input table: `output/<mangled input path>`,
/// with path separators flattened to `___` and dots to `_._`.
pub fn mangle_output_dir(input: &Path) -> PathBuf {
    let mangled = input
        .to_string_lossy()
        .replace(MAIN_SEPARATOR, "___")
        .replace('.', "_._");
    Path::new("output").join(mangled)
}

/// X-axis range: 5% of the minimum as padding on both sides, widened when
/// the data is degenerate (one bar, or all values equal).
fn axis_range(values: &[f64]) -> (f64, f64) {
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);

    let delta = 0.05 * min;
    let x0 = min - delta;
    let mut x1 = max + delta;
    if x1 <= x0 {
        x1 = if x0 == 0.0 { 1.0 } else { x0 + x0.abs() * 0.1 };
    }
    (x0, x1)
}

fn chart_height(bars: usize, cfg: &PlotConfig) -> u32 {
    (cfg.bar_height * bars as u32 + 200).clamp(400, 6000)
}

/// Render one horizontal bar chart.
pub fn plot_aggregate(
    entries: &[(String, f64)],
    title: &str,
    x_label: &str,
    path: &Path,
    cfg: &PlotConfig,
) -> Result<(), GcStatsError> {
    let plot_err = |detail: String| GcStatsError::Plot {
        path: path.to_path_buf(),
        detail,
    };

    if entries.is_empty() {
        return Err(plot_err("no data to plot".to_string()));
    }

    let values: Vec<f64> = entries.iter().map(|(_, v)| *v).collect();
    let (x0, x1) = axis_range(&values);
    let n = entries.len();

    let root = BitMapBackend::new(path, (cfg.width, chart_height(n, cfg))).into_drawing_area();
    root.fill(&WHITE).map_err(|e| plot_err(e.to_string()))?;

    let mut chart = ChartBuilder::on(&root)
        .caption(title, ("sans-serif", 32))
        .margin(20)
        .x_label_area_size(50)
        .y_label_area_size(260)
        .build_cartesian_2d(x0..x1, (0..n as i32).into_segmented())
        .map_err(|e| plot_err(e.to_string()))?;

    let labels: Vec<String> = entries.iter().map(|(label, _)| label.clone()).collect();
    chart
        .configure_mesh()
        .disable_y_mesh()
        .y_labels(n)
        .y_label_formatter(&|seg| match seg {
            SegmentValue::Exact(i) | SegmentValue::CenterOf(i) => labels
                .get(*i as usize)
                .cloned()
                .unwrap_or_default(),
            SegmentValue::Last => String::new(),
        })
        .x_desc(x_label)
        .label_style(("sans-serif", 16))
        .draw()
        .map_err(|e| plot_err(e.to_string()))?;

    chart
        .draw_series(entries.iter().enumerate().map(|(i, (_, value))| {
            Rectangle::new(
                [
                    (x0, SegmentValue::Exact(i as i32)),
                    (*value, SegmentValue::Exact(i as i32 + 1)),
                ],
                BLUE.filled(),
            )
        }))
        .map_err(|e| plot_err(e.to_string()))?;

    root.present().map_err(|e| plot_err(e.to_string()))?;

    Ok(())
}

/// Render the mean/min/max charts for a set of group summaries. Returns the
/// paths written.
pub fn plot_all(
    summaries: &[GroupSummary],
    by: GroupBy,
    out_dir: &Path,
    cfg: &PlotConfig,
) -> Result<Vec<PathBuf>, GcStatsError> {
    std::fs::create_dir_all(out_dir).map_err(|source| GcStatsError::Write {
        path: out_dir.to_path_buf(),
        source,
    })?;

    let grouping = match by {
        GroupBy::Type => "type",
        GroupBy::TypeAndSite => "type and allocation site",
    };

    let mut written = Vec::new();
    for aggregate in Aggregate::ALL {
        let entries: Vec<(String, f64)> = summaries
            .iter()
            .map(|s| (s.label(), aggregate.value(s)))
            .collect();

        let path = out_dir.join(plot_file_name(aggregate, by));
        let title = format!("{} lifetime per {}", aggregate.name(), grouping);
        plot_aggregate(&entries, &title, "Lifetime (ns)", &path, cfg)?;
        written.push(path);
    }

    Ok(written)
}
