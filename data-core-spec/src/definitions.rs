/*!
The two artifact definitions this data-plane stores: [`FileDefinition`]
for opaque files and [`DataDefinition`] for tabular datasets. Both
reference their bytes only through a `storage_id` selector and
`data_item` keys: the DATA object points at its STORAGE object; it
never embeds the physical path.
*/

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::selector::Selector;

/// One physical write within a [`Snap`]. Only "snap" updates are produced
/// by this crate: `snap_index` increments on every update and
/// `delta_index` is always 0, though the type allows reading definitions
/// written by other producers with a richer delta history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Delta {
    pub delta_index: u32,
    pub data_item: String,
    pub physical_row_count: u64,
    pub delta_row_count: u64,
}

/// One version of a table partition: the current set of deltas.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snap {
    pub snap_index: u64,
    pub deltas: Vec<Delta>,
}

impl Snap {
    pub fn first(delta: Delta) -> Self {
        Snap {
            snap_index: 0,
            deltas: vec![delta],
        }
    }

    /// Row count contributed by this snap: Σ deltas.delta_row_count.
    pub fn row_count(&self) -> u64 {
        self.deltas.iter().map(|d| d.delta_row_count).sum()
    }
}

/// One partition of a dataset: its current snap.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Part {
    pub snap: Snap,
}

/// Either an embedded schema or a reference to an external SCHEMA object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SchemaRef {
    Embedded(crate::schema::Schema),
    External(Selector),
}

/// `{ schema_ref, parts, row_count, storage_id }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataDefinition {
    pub schema_ref: SchemaRef,
    pub parts: BTreeMap<String, Part>,
    pub row_count: u64,
    pub storage_id: Selector,
}

impl DataDefinition {
    /// Recompute `row_count` from the live parts (invariant 5: for a DATA
    /// object, `row_count = Σ deltas.delta_row_count` over all live snaps).
    pub fn recompute_row_count(&mut self) {
        self.row_count = self.parts.values().map(|p| p.snap.row_count()).sum();
    }
}

/// `{ name, extension, mime_type, size, data_item, storage_id }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileDefinition {
    pub name: String,
    pub extension: Option<String>,
    pub mime_type: String,
    pub size: u64,
    pub data_item: String,
    pub storage_id: Selector,
}

impl FileDefinition {
    /// Derive the extension from `name`, lower-cased, if it has one.
    pub fn derive_extension(name: &str) -> Option<String> {
        name.rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase())
            .filter(|ext| !ext.is_empty())
    }
}
