//! Selection statistics
//!
//! [`aggregate`] is the one place counts, areas and shares are derived from a
//! set of units. Reports and screens read from the returned snapshot instead
//! of recomputing their own ratios.

use crate::record::{UnitKind, UnitRecord};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct KindTotals {
    pub count: usize,
    pub area: f64,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Aggregate {
    pub count: usize,
    pub total_area: f64,
    pub by_kind: BTreeMap<UnitKind, KindTotals>,
}

impl Aggregate {
    /// Share of the total area as a percentage; 0 when the total is 0.
    pub fn percent_of_total(&self, area: f64) -> f64 {
        if self.total_area > 0.0 {
            area * 100.0 / self.total_area
        } else {
            0.0
        }
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }
}

/// Summarize the records at `indices`.
///
/// Indices outside `records` are skipped, so `count` always equals the sum of
/// the per-kind counts.
pub fn aggregate(records: &[UnitRecord], indices: &BTreeSet<usize>) -> Aggregate {
    let mut result = Aggregate::default();
    for record in indices.iter().filter_map(|&i| records.get(i)) {
        result.count += 1;
        result.total_area += record.built_area;

        let totals = result.by_kind.entry(record.kind).or_default();
        totals.count += 1;
        totals.area += record.built_area;
    }
    result
}
