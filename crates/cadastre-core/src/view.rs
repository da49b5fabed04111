//! Active views
//!
//! An [`ActiveView`] is the list of original indices in the order a widget
//! currently shows them. It is the frame of reference for shift-click ranges.

use crate::record::{UnitKind, UnitRecord};
use crate::sort::{sort, SortKey};
use crate::store::UnitStore;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewFilter {
    #[default]
    All,
    /// Everything except common elements.
    PrivateOnly,
    Kind(UnitKind),
}

impl ViewFilter {
    pub fn matches(&self, record: &UnitRecord) -> bool {
        match self {
            ViewFilter::All => true,
            ViewFilter::PrivateOnly => record.kind != UnitKind::CommonElement,
            ViewFilter::Kind(kind) => record.kind == *kind,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ActiveView {
    indices: Vec<usize>,
}

impl ActiveView {
    /// Every unit in the store, ordered by `key`.
    pub fn sorted(store: &UnitStore, key: &SortKey) -> Self {
        Self::filtered(store, key, ViewFilter::All)
    }

    /// Units matching `filter`, ordered by `key`.
    pub fn filtered(store: &UnitStore, key: &SortKey, filter: ViewFilter) -> Self {
        let indices = sort(store.records(), key)
            .into_iter()
            .filter(|record| filter.matches(record))
            .map(|record| record.original_index)
            .collect();
        Self { indices }
    }

    pub fn from_indices(indices: Vec<usize>) -> Self {
        Self { indices }
    }

    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    /// Position of an original index on screen.
    pub fn position(&self, index: usize) -> Option<usize> {
        self.indices.iter().position(|&i| i == index)
    }

    /// Original indices shown between two units, both ends included,
    /// regardless of which one comes first.
    pub fn span(&self, from: usize, to: usize) -> Option<&[usize]> {
        let a = self.position(from)?;
        let b = self.position(to)?;
        Some(&self.indices[a.min(b)..=a.max(b)])
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }
}
