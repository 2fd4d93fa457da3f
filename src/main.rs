use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::process;

use anyhow::Result;
use chrono::Utc;
use clap::{Parser, Subcommand};
use owo_colors::{OwoColorize, Stream};

use gcstats::config::Config;
use gcstats::discover::{self, DEFAULT_LOGS_DIR};
use gcstats::errors::GcStatsError;
use gcstats::lifetime;
use gcstats::pauses;
use gcstats::plot;
use gcstats::report;
use gcstats::summary::{self, GroupBy};

#[derive(Parser)]
#[command(name = "gcstats", version, about = "Offline analysis of GC benchmark logs")]
struct Cli {
    /// Path to a gcstats.toml (./gcstats.toml is picked up when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List benchmark runs under a root directory
    List {
        root: PathBuf,

        /// Name of the per-run log directory
        #[arg(long, default_value = DEFAULT_LOGS_DIR)]
        logs_dir: String,

        #[arg(long)]
        json: bool,
    },

    /// Extract per-collector pause-time summaries into gc_stats_<run>.csv
    Pauses {
        root: PathBuf,

        /// Name of the per-run log directory
        #[arg(long, default_value = DEFAULT_LOGS_DIR)]
        logs_dir: String,

        /// Directory for the generated CSV files
        #[arg(long, default_value = ".")]
        out_dir: PathBuf,
    },

    /// Reconstruct object lifetimes from a lifecycle event log
    Lifetimes {
        log: PathBuf,

        /// Write the lifetime rows here instead of stdout
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// Aggregate lifetime statistics per object type
    Summary {
        /// Lifetimes CSV (the output of `gcstats lifetimes`)
        table: PathBuf,

        /// Group by (type, allocation site) instead of type alone
        #[arg(long)]
        by_site: bool,

        /// Drop groups with fewer objects than this
        #[arg(long)]
        min_objects: Option<usize>,

        #[arg(long)]
        json: bool,

        /// Write the summary as CSV here instead of printing a table
        #[arg(long)]
        csv: Option<PathBuf>,
    },

    /// Render lifetime bar charts from a lifetimes CSV
    Plot {
        /// Lifetimes CSV (the output of `gcstats lifetimes`)
        table: PathBuf,

        /// Group by (type, allocation site) instead of type alone
        #[arg(long)]
        by_site: bool,

        /// Drop groups with fewer objects than this
        #[arg(long)]
        min_objects: Option<usize>,

        /// Chart directory (default: output/<mangled table path>)
        #[arg(long)]
        out_dir: Option<PathBuf>,
    },
}

/// Dimmed progress note on stderr; stdout stays machine-readable.
fn note(msg: &str) {
    eprintln!("{}", msg.if_supports_color(Stream::Stderr, |s| s.dimmed()));
}

/// Read a lifetimes table and reduce it to groups over the threshold.
fn load_groups(
    table: &Path,
    by_site: bool,
    min_objects: Option<usize>,
    config: &Config,
) -> Result<(Vec<summary::GroupSummary>, GroupBy)> {
    let records = lifetime::read_csv(table)?;
    if records.is_empty() {
        return Err(GcStatsError::EmptyTable {
            path: table.to_path_buf(),
        }
        .into());
    }

    let by = if by_site {
        GroupBy::TypeAndSite
    } else {
        GroupBy::Type
    };

    let all = summary::summarize(&records, by);
    let min_objects = min_objects.unwrap_or(config.summary.min_objects);
    let largest = all.first().map(|s| s.count).unwrap_or(0);

    let kept = summary::apply_threshold(all, min_objects);
    if kept.is_empty() {
        return Err(GcStatsError::BelowThreshold {
            min_objects,
            largest,
        }
        .into());
    }

    Ok((kept, by))
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::load(cli.config.as_deref())?;

    match cli.command {
        Command::List {
            root,
            logs_dir,
            json,
        } => {
            let runs = discover::discover_runs(&root, &logs_dir)?;
            if runs.is_empty() {
                return Err(GcStatsError::NoRunsFound {
                    path: root,
                    logs_dir,
                }
                .into());
            }

            let now = Utc::now();
            if json {
                println!("{}", report::run_list_json(&runs, now));
            } else {
                print!("{}", report::format_run_list(&runs, now));
            }
        }

        Command::Pauses {
            root,
            logs_dir,
            out_dir,
        } => {
            let runs = discover::discover_runs(&root, &logs_dir)?;
            if runs.is_empty() {
                return Err(GcStatsError::NoRunsFound {
                    path: root,
                    logs_dir,
                }
                .into());
            }

            std::fs::create_dir_all(&out_dir).map_err(|source| GcStatsError::Write {
                path: out_dir.clone(),
                source,
            })?;

            for run in &runs {
                let analysis = pauses::analyze_run(run)?;
                for group in &analysis.skipped_groups {
                    eprintln!(
                        "{}",
                        format!(
                            "warning: no GC summary lines matched in group '{}' of run '{}'",
                            group, run.name
                        )
                        .if_supports_color(Stream::Stderr, |s| s.yellow())
                    );
                }
                let path = pauses::write_csv(&analysis.stats, &out_dir, &run.name)?;
                note(&format!("wrote {}", path.display()));
            }
        }

        Command::Lifetimes { log, out } => {
            let file = std::fs::File::open(&log).map_err(|source| GcStatsError::Read {
                path: log.clone(),
                source,
            })?;

            let (records, rep) =
                lifetime::reconstruct(BufReader::new(file)).map_err(|source| {
                    GcStatsError::Read {
                        path: log.clone(),
                        source,
                    }
                })?;

            note(&report::format_reconstruction_report(&rep));

            match out {
                Some(path) => {
                    let file =
                        std::fs::File::create(&path).map_err(|source| GcStatsError::Write {
                            path: path.clone(),
                            source,
                        })?;
                    lifetime::write_csv(&records, file, &path)?;
                    note(&format!("wrote {}", path.display()));
                }
                None => {
                    let stdout = std::io::stdout();
                    lifetime::write_csv(&records, stdout.lock(), Path::new("stdout"))?;
                }
            }
        }

        Command::Summary {
            table,
            by_site,
            min_objects,
            json,
            csv,
        } => {
            let (groups, by) = load_groups(&table, by_site, min_objects, &config)?;

            if json {
                println!("{}", report::summary_json(&groups));
            } else if let Some(path) = csv {
                report::write_summary_csv(&groups, &path)?;
                note(&format!("wrote {}", path.display()));
            } else {
                println!("{}", report::format_summary_table(&groups, by));
            }
        }

        Command::Plot {
            table,
            by_site,
            min_objects,
            out_dir,
        } => {
            let (groups, by) = load_groups(&table, by_site, min_objects, &config)?;

            let dir = out_dir.unwrap_or_else(|| plot::mangle_output_dir(&table));
            let written = plot::plot_all(&groups, by, &dir, &config.plot)?;

            for path in &written {
                note(&format!("wrote {}", path.display()));
            }
            println!("Saved {} charts to {}", written.len(), dir.display());
        }
    }

    Ok(())
}

fn main() {
    if let Err(err) = run() {
        eprintln!("{}", err);
        process::exit(1);
    }
}
