//! Unit record store
//!
//! Holds the units in load order. The position of a record in the store is
//! its original index, the only identity used for selection.

use crate::error::StoreError;
use crate::record::{RawUnit, UnitRecord};
use serde::Deserialize;
use std::ops::Range;

#[derive(Deserialize)]
#[serde(untagged)]
enum Payload {
    Envelope {
        #[serde(default)]
        success: Option<bool>,
        #[serde(default)]
        message: Option<String>,
        data: Vec<RawUnit>,
    },
    Bare(Vec<RawUnit>),
}

#[derive(Debug, Clone, Default)]
pub struct UnitStore {
    records: Vec<UnitRecord>,
}

impl UnitStore {
    /// Normalize raw units, assigning original indices in load order.
    pub fn from_raw(units: Vec<RawUnit>) -> Self {
        let records = units
            .into_iter()
            .enumerate()
            .map(|(index, raw)| UnitRecord::from_raw(index, raw))
            .collect();
        Self { records }
    }

    /// Parse a backend listing, either a bare array or a `{success, data}` envelope.
    pub fn from_json(json: &str) -> Result<Self, StoreError> {
        let units = match serde_json::from_str::<Payload>(json)? {
            Payload::Envelope {
                success: Some(false),
                message,
                ..
            } => {
                return Err(StoreError::Rejected(
                    message.unwrap_or_else(|| "success flag is false".to_string()),
                ))
            }
            Payload::Envelope { data, .. } => data,
            Payload::Bare(data) => data,
        };
        tracing::debug!(units = units.len(), "Loaded unit listing");
        Ok(Self::from_raw(units))
    }

    pub fn records(&self) -> &[UnitRecord] {
        &self.records
    }

    pub fn get(&self, index: usize) -> Option<&UnitRecord> {
        self.records.get(index)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// The full original-index domain `[0, N)`.
    pub fn indices(&self) -> Range<usize> {
        0..self.records.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &UnitRecord> {
        self.records.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bare_array_assigns_dense_indices() {
        let store = UnitStore::from_json(r#"[{"planta":"1"},{"planta":"2"},{}]"#).unwrap();
        let indices: Vec<usize> = store.iter().map(|r| r.original_index).collect();
        assert_eq!(indices, vec![0, 1, 2]);
        assert_eq!(store.indices(), 0..3);
    }

    #[test]
    fn test_envelope_payload() {
        let store =
            UnitStore::from_json(r#"{"success":true,"data":[{"puerta":"A"},{"puerta":"B"}]}"#)
                .unwrap();
        assert_eq!(store.len(), 2);
        assert_eq!(store.get(1).unwrap().door, "B");
    }

    #[test]
    fn test_rejected_envelope_is_an_error() {
        let result = UnitStore::from_json(r#"{"success":false,"message":"no data","data":[]}"#);
        assert!(matches!(result, Err(StoreError::Rejected(msg)) if msg == "no data"));
    }

    #[test]
    fn test_invalid_json_fails() {
        assert!(matches!(
            UnitStore::from_json("not json"),
            Err(StoreError::Json(_))
        ));
    }

    #[test]
    fn test_empty_store() {
        let store = UnitStore::from_raw(vec![]);
        assert!(store.is_empty());
        assert!(store.indices().is_empty());
    }
}
