//! Per-type lifetime aggregation.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::lifetime::LifetimeRecord;

/// How lifetimes are grouped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupBy {
    Type,
    /// (type, allocation site). Records without a site are excluded, as a
    /// site-keyed groupby cannot place them.
    TypeAndSite,
}

/// Aggregate lifetime statistics for one group.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupSummary {
    #[serde(rename = "type")]
    pub ty: String,
    pub site: Option<String>,
    pub count: usize,
    pub mean_lifetime: f64,
    pub min_lifetime: u64,
    pub max_lifetime: u64,
}

impl GroupSummary {
    /// Label used on plots and tables: `type` or `type-site`.
    pub fn label(&self) -> String {
        match &self.site {
            Some(site) => format!("{}-{}", self.ty, site),
            None => self.ty.clone(),
        }
    }
}

struct Acc {
    count: usize,
    sum: u128,
    min: u64,
    max: u64,
}

/// Group records and compute count/mean/min/max of lifetime per group.
///
/// Output is ordered by descending count, ties by group key, so every run
/// over the same table produces the same report.
pub fn summarize(records: &[LifetimeRecord], by: GroupBy) -> Vec<GroupSummary> {
    let mut groups: BTreeMap<(String, Option<String>), Acc> = BTreeMap::new();

    for record in records {
        let key = match by {
            GroupBy::Type => (record.ty.clone(), None),
            GroupBy::TypeAndSite => match &record.site {
                Some(site) => (record.ty.clone(), Some(site.clone())),
                None => continue,
            },
        };

        let acc = groups.entry(key).or_insert(Acc {
            count: 0,
            sum: 0,
            min: u64::MAX,
            max: 0,
        });
        acc.count += 1;
        acc.sum += u128::from(record.lifetime);
        acc.min = acc.min.min(record.lifetime);
        acc.max = acc.max.max(record.lifetime);
    }

    let mut summaries: Vec<GroupSummary> = groups
        .into_iter()
        .map(|((ty, site), acc)| GroupSummary {
            ty,
            site,
            count: acc.count,
            mean_lifetime: acc.sum as f64 / acc.count as f64,
            min_lifetime: acc.min,
            max_lifetime: acc.max,
        })
        .collect();

    summaries.sort_by(|a, b| {
        b.count
            .cmp(&a.count)
            .then_with(|| a.ty.cmp(&b.ty))
            .then_with(|| a.site.cmp(&b.site))
    });

    summaries
}

/// Drop groups with fewer than `min_objects` records.
pub fn apply_threshold(summaries: Vec<GroupSummary>, min_objects: usize) -> Vec<GroupSummary> {
    summaries
        .into_iter()
        .filter(|s| s.count >= min_objects)
        .collect()
}
