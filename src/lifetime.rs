//! Object-lifetime reconstruction.
//!
//! Matches BORN/MOVED/YEETED events per object tag across a log. Tags are
//! reused by the VM after collection, so each tag keeps a stack of pending
//! births: a YEETED pops the most recent unmatched BORN for that tag.

use std::collections::HashMap;
use std::io::BufRead;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::errors::GcStatsError;
use crate::events::{Event, EventKind, LineOutcome, parse_line};

/// One completed object lifetime, as written to the lifetimes CSV.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LifetimeRecord {
    pub tag: u64,
    #[serde(rename = "type")]
    pub ty: String,
    pub size: u64,
    pub site: Option<String>,
    pub born_at: u64,
    pub last_moved_at: Option<u64>,
    pub died_at: u64,
    pub born_gc: u32,
    pub died_gc: u32,
    pub moves: u32,
    pub lifetime: u64,
}

/// Tallies from one reconstruction pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReconstructionReport {
    /// Lines read, including comments and blanks.
    pub lines: u64,
    /// Well-formed events.
    pub events: u64,
    /// Completed lifetimes emitted.
    pub completed: u64,
    /// MOVED/YEETED events with no pending birth for their tag.
    pub orphans: u64,
    /// Objects still pending at end of log.
    pub leaked: u64,
    /// Lines that parsed as neither event nor comment.
    pub malformed: u64,
}

#[derive(Debug)]
struct PendingObject {
    ty: String,
    size: u64,
    site: Option<String>,
    born_at: u64,
    born_gc: u32,
    last_moved_at: Option<u64>,
    moves: u32,
}

/// Streaming reconstruction state. Feed lines or events, then `finish`.
#[derive(Debug, Default)]
pub struct Reconstructor {
    pending: HashMap<u64, Vec<PendingObject>>,
    completed: Vec<LifetimeRecord>,
    report: ReconstructionReport,
}

impl Reconstructor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn feed_line(&mut self, line: &str) {
        self.report.lines += 1;
        match parse_line(line) {
            LineOutcome::Event(event) => self.feed(event),
            LineOutcome::Skip => {}
            LineOutcome::Malformed(_) => self.report.malformed += 1,
        }
    }

    pub fn feed(&mut self, event: Event) {
        self.report.events += 1;
        match event.kind {
            EventKind::Born => {
                // parse_line guarantees type and size on BORN.
                let (Some(ty), Some(size)) = (event.ty, event.size) else {
                    self.report.malformed += 1;
                    return;
                };
                self.pending.entry(event.tag).or_default().push(PendingObject {
                    ty,
                    size,
                    site: event.site,
                    born_at: event.timestamp,
                    born_gc: event.gc,
                    last_moved_at: None,
                    moves: 0,
                });
            }
            EventKind::Moved => {
                match self.pending.get_mut(&event.tag).and_then(|s| s.last_mut()) {
                    Some(obj) => {
                        obj.last_moved_at = Some(event.timestamp);
                        obj.moves += 1;
                    }
                    None => self.report.orphans += 1,
                }
            }
            EventKind::Yeeted => {
                match self.pending.get_mut(&event.tag).and_then(|stack| stack.pop()) {
                    Some(obj) => {
                        self.report.completed += 1;
                        self.completed.push(LifetimeRecord {
                            tag: event.tag,
                            ty: obj.ty,
                            size: obj.size,
                            site: obj.site,
                            born_at: obj.born_at,
                            last_moved_at: obj.last_moved_at,
                            died_at: event.timestamp,
                            born_gc: obj.born_gc,
                            died_gc: event.gc,
                            moves: obj.moves,
                            lifetime: event.timestamp.saturating_sub(obj.born_at),
                        });
                    }
                    None => self.report.orphans += 1,
                }
            }
        }
    }

    /// Consume the state; objects still pending are counted as leaked.
    pub fn finish(mut self) -> (Vec<LifetimeRecord>, ReconstructionReport) {
        self.report.leaked = self.pending.values().map(|s| s.len() as u64).sum();
        (self.completed, self.report)
    }
}

/// Reconstruct lifetimes from a reader over an event log.
pub fn reconstruct(
    reader: impl BufRead,
) -> std::io::Result<(Vec<LifetimeRecord>, ReconstructionReport)> {
    let mut rec = Reconstructor::new();
    for line in reader.lines() {
        rec.feed_line(&line?);
    }
    Ok(rec.finish())
}

/// Write lifetime rows as CSV (header included) to any writer.
pub fn write_csv(
    records: &[LifetimeRecord],
    writer: impl std::io::Write,
    path_for_errors: &Path,
) -> Result<(), GcStatsError> {
    let mut out = csv::Writer::from_writer(writer);
    for record in records {
        out.serialize(record).map_err(|source| GcStatsError::Csv {
            path: path_for_errors.to_path_buf(),
            source,
        })?;
    }
    out.flush().map_err(|source| GcStatsError::Write {
        path: path_for_errors.to_path_buf(),
        source,
    })
}

/// Read a lifetimes CSV back in (the `summary` and `plot` inputs).
pub fn read_csv(path: &Path) -> Result<Vec<LifetimeRecord>, GcStatsError> {
    let mut reader = csv::Reader::from_path(path).map_err(|source| GcStatsError::Csv {
        path: path.to_path_buf(),
        source,
    })?;

    let mut records = Vec::new();
    for row in reader.deserialize() {
        let record: LifetimeRecord = row.map_err(|source| GcStatsError::Csv {
            path: path.to_path_buf(),
            source,
        })?;
        records.push(record);
    }
    Ok(records)
}
