//! Fan-in merging
//!
//! Leaf results within one AND-group intersect; groups of an OR clause
//! union. Both operate on ordered sets, so the merged output is always
//! ascending by (timestamp, identity) no matter the arrival order of the
//! leaf results.

use std::collections::{BTreeSet, HashSet};

use uuid::Uuid;

use super::scan::RowRecord;

/// Intersects the per-leaf result sets of one AND-group.
///
/// An empty input (a group that dispatched no scans) intersects to the
/// empty set.
pub fn intersect(batches: Vec<Vec<RowRecord>>) -> Vec<RowRecord> {
    let mut iter = batches.into_iter();
    let Some(first) = iter.next() else {
        return Vec::new();
    };
    let mut acc: BTreeSet<RowRecord> = first.into_iter().collect();
    for batch in iter {
        if acc.is_empty() {
            return Vec::new();
        }
        let next: BTreeSet<RowRecord> = batch.into_iter().collect();
        acc = acc.intersection(&next).copied().collect();
    }
    acc.into_iter().collect()
}

/// Unions the merged results of every OR-group.
pub fn union(groups: Vec<Vec<RowRecord>>) -> Vec<RowRecord> {
    let mut acc: BTreeSet<RowRecord> = BTreeSet::new();
    for group in groups {
        acc.extend(group);
    }
    acc.into_iter().collect()
}

/// Collapses rows sharing an identity down to their most recent instance.
///
/// Input must be ascending; output stays ascending. Flow-record queries
/// use this because one flow writes a row per export interval, and the
/// latest row carries the authoritative counters.
pub fn dedup_by_identity(rows: Vec<RowRecord>) -> Vec<RowRecord> {
    let mut seen: HashSet<Uuid> = HashSet::with_capacity(rows.len());
    let mut kept: Vec<RowRecord> = rows
        .into_iter()
        .rev()
        .filter(|row| seen.insert(row.identity))
        .collect();
    kept.reverse();
    kept
}
