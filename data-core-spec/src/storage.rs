/*!
Storage definitions: the physical realisation of a DATA or FILE
object's data items. A [`StorageDefinition`] is append-only across
versions (invariant 3): a data item key appears in exactly one object
version's definition for the lifetime of the object.
*/

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle status of one physical copy or incarnation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StorageStatus {
    /// The write is in flight.
    Pending,
    /// The write completed and the copy is readable.
    Available,
    /// The copy is known to be gone (e.g. orphan-collected).
    Expired,
}

/// One physical realisation of a data item: `(storage_key, storage_path, storage_format)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Copy {
    pub storage_key: String,
    pub storage_path: String,
    pub storage_format: String,
    pub status: StorageStatus,
    pub timestamp: DateTime<Utc>,
}

/// One write attempt for a data item: a set of copies sharing a write timestamp.
///
/// Only the first incarnation/copy is produced by this crate; more may be
/// read, e.g. if a backend replicates across storage keys out of band.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Incarnation {
    pub incarnation_index: u32,
    pub timestamp: DateTime<Utc>,
    pub status: StorageStatus,
    pub copies: Vec<Copy>,
}

impl Incarnation {
    pub fn first(copy: Copy) -> Self {
        Incarnation {
            incarnation_index: 0,
            timestamp: copy.timestamp,
            status: copy.status,
            copies: vec![copy],
        }
    }

    /// The copy a reader should use: the first `Available` copy, else the first copy.
    pub fn preferred_copy(&self) -> Option<&Copy> {
        self.copies
            .iter()
            .find(|c| c.status == StorageStatus::Available)
            .or_else(|| self.copies.first())
    }
}

/// All incarnations ever written for one data item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageItem {
    pub incarnations: Vec<Incarnation>,
}

impl StorageItem {
    pub fn new(first: Incarnation) -> Self {
        StorageItem {
            incarnations: vec![first],
        }
    }

    pub fn latest(&self) -> Option<&Incarnation> {
        self.incarnations.last()
    }
}

/// `{ data_items : map<data_item -> StorageItem> }`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageDefinition {
    pub data_items: BTreeMap<String, StorageItem>,
}

impl StorageDefinition {
    pub fn new() -> Self {
        StorageDefinition::default()
    }

    /// True if `data_item` has already been written in a prior version
    /// (the supersession check reads this).
    pub fn contains(&self, data_item: &str) -> bool {
        self.data_items.contains_key(data_item)
    }

    /// Add a brand-new data item. Per invariant 3 this must only be
    /// called with a data item key that has never appeared before.
    pub fn add(&mut self, data_item: impl Into<String>, item: StorageItem) {
        self.data_items.insert(data_item.into(), item);
    }
}
