//! Parser for object-lifecycle event logs.
//!
//! One event per line:
//!
//! ```text
//! <timestamp> BORN tag=<u64> type=<str> size=<u64> gc=<u32> [site=<str>]
//! <timestamp> MOVED tag=<u64> gc=<u32> [addr=<hex>]
//! <timestamp> YEETED tag=<u64> gc=<u32>
//! ```
//!
//! Timestamps are nanoseconds since VM start. Unknown `key=value` pairs are
//! ignored so newer tracer builds can add fields without breaking older
//! analysis tooling.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    Born,
    Moved,
    Yeeted,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    pub timestamp: u64,
    pub kind: EventKind,
    pub tag: u64,
    pub gc: u32,
    /// Object type; present on BORN.
    pub ty: Option<String>,
    /// Object size in bytes; present on BORN.
    pub size: Option<u64>,
    /// Allocation site; optionally present on BORN.
    pub site: Option<String>,
}

/// Result of looking at one log line.
#[derive(Debug, PartialEq)]
pub enum LineOutcome {
    Event(Event),
    /// Blank line or `#` comment.
    Skip,
    Malformed(&'static str),
}

/// Parse a single log line. Never panics on bad input.
pub fn parse_line(line: &str) -> LineOutcome {
    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed.starts_with('#') {
        return LineOutcome::Skip;
    }

    let mut tokens = trimmed.split_whitespace();

    let Some(timestamp) = tokens.next().and_then(|t| t.parse::<u64>().ok()) else {
        return LineOutcome::Malformed("missing or non-numeric timestamp");
    };

    let kind = match tokens.next() {
        Some("BORN") => EventKind::Born,
        Some("MOVED") => EventKind::Moved,
        Some("YEETED") => EventKind::Yeeted,
        Some(_) => return LineOutcome::Malformed("unknown event kind"),
        None => return LineOutcome::Malformed("missing event kind"),
    };

    let mut tag: Option<u64> = None;
    let mut gc: Option<u32> = None;
    let mut ty: Option<String> = None;
    let mut size: Option<u64> = None;
    let mut site: Option<String> = None;

    for token in tokens {
        let Some((key, value)) = token.split_once('=') else {
            return LineOutcome::Malformed("bare token where key=value expected");
        };
        match key {
            "tag" => match value.parse() {
                Ok(v) => tag = Some(v),
                Err(_) => return LineOutcome::Malformed("non-numeric tag"),
            },
            "gc" => match value.parse() {
                Ok(v) => gc = Some(v),
                Err(_) => return LineOutcome::Malformed("non-numeric gc id"),
            },
            "type" => ty = Some(value.to_string()),
            "size" => match value.parse() {
                Ok(v) => size = Some(v),
                Err(_) => return LineOutcome::Malformed("non-numeric size"),
            },
            "site" => site = Some(value.to_string()),
            // addr and anything newer: ignored.
            _ => {}
        }
    }

    let Some(tag) = tag else {
        return LineOutcome::Malformed("missing tag");
    };
    let Some(gc) = gc else {
        return LineOutcome::Malformed("missing gc id");
    };

    if kind == EventKind::Born && (ty.is_none() || size.is_none()) {
        return LineOutcome::Malformed("BORN without type or size");
    }

    LineOutcome::Event(Event {
        timestamp,
        kind,
        tag,
        gc,
        ty,
        size,
        site,
    })
}
