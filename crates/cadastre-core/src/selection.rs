//! Unit selection
//!
//! A [`SelectionState`] is a set of original indices plus the last unit the
//! user touched. Every operation returns a new snapshot; the previous one is
//! left as it was.
//!
//! Range selection (shift-click) is always resolved against the view the
//! user is looking at, never against load order.

use crate::store::UnitStore;
use crate::view::ActiveView;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SelectionState {
    selected: BTreeSet<usize>,
    last_touched: Option<usize>,
}

impl SelectionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything in the store selected, as on first load.
    pub fn all(store: &UnitStore) -> Self {
        Self::new().select_all(store)
    }

    /// Flip membership of `index` and make it the range anchor.
    #[must_use]
    pub fn toggle(&self, index: usize) -> Self {
        let mut selected = self.selected.clone();
        if !selected.remove(&index) {
            selected.insert(index);
        }
        tracing::debug!(index, selected = selected.contains(&index), "Toggled unit");
        Self {
            selected,
            last_touched: Some(index),
        }
    }

    /// Add every unit shown between the anchor and `index` in `view`.
    ///
    /// The range is added to the current selection, never replacing it. With
    /// no anchor, or when either end is not in `view`, only the anchor moves.
    #[must_use]
    pub fn range_select(&self, index: usize, view: &ActiveView) -> Self {
        let mut selected = self.selected.clone();
        match self.last_touched.and_then(|anchor| view.span(anchor, index)) {
            Some(span) => {
                selected.extend(span.iter().copied());
                tracing::debug!(
                    anchor = ?self.last_touched,
                    index,
                    added = span.len(),
                    "Range selected units"
                );
            }
            None => {
                tracing::debug!(
                    anchor = ?self.last_touched,
                    index,
                    "Range endpoints not in active view, selection unchanged"
                );
            }
        }
        Self {
            selected,
            last_touched: Some(index),
        }
    }

    /// A click on a unit card: shift with an anchor extends the range,
    /// anything else toggles.
    #[must_use]
    pub fn click(&self, index: usize, shift: bool, view: &ActiveView) -> Self {
        if shift && self.last_touched.is_some() {
            self.range_select(index, view)
        } else {
            self.toggle(index)
        }
    }

    #[must_use]
    pub fn select_all(&self, store: &UnitStore) -> Self {
        Self {
            selected: store.indices().collect(),
            last_touched: store.len().checked_sub(1),
        }
    }

    /// Select exactly the units in `view`, anchored on its last entry.
    #[must_use]
    pub fn select_view(&self, view: &ActiveView) -> Self {
        Self {
            selected: view.indices().iter().copied().collect(),
            last_touched: view.indices().last().copied(),
        }
    }

    #[must_use]
    pub fn clear(&self) -> Self {
        Self::default()
    }

    pub fn contains(&self, index: usize) -> bool {
        self.selected.contains(&index)
    }

    pub fn indices(&self) -> &BTreeSet<usize> {
        &self.selected
    }

    pub fn last_touched(&self) -> Option<usize> {
        self.last_touched
    }

    pub fn len(&self) -> usize {
        self.selected.len()
    }

    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }
}

impl FromIterator<usize> for SelectionState {
    fn from_iter<I: IntoIterator<Item = usize>>(iter: I) -> Self {
        Self {
            selected: iter.into_iter().collect(),
            last_touched: None,
        }
    }
}
