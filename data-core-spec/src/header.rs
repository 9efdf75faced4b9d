/*!
The object header: the catalogue-assigned identity of one committed object version.
*/

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The kind of object a header identifies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ObjectType {
    /// A tabular dataset definition.
    Data,
    /// An opaque file definition.
    File,
    /// A storage definition, linking data items to physical copies.
    Storage,
    /// An external schema definition.
    Schema,
}

/// `(tenant, object_type, object_id, object_version, tag_version, timestamp)`.
///
/// The pair `(object_id, object_version)` uniquely names a version; `tag_version`
/// names a mutation of its attributes. The header is immutable once committed
/// (invariant 6): a tag always carries the header of the object version it annotates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectHeader {
    pub tenant: String,
    pub object_type: ObjectType,
    pub object_id: Uuid,
    pub object_version: u64,
    pub tag_version: u64,
    pub timestamp: DateTime<Utc>,
}

impl ObjectHeader {
    /// Header for a freshly pre-allocated id: `object_version = 0`, no definition yet.
    pub fn preallocated(tenant: impl Into<String>, object_type: ObjectType, object_id: Uuid) -> Self {
        ObjectHeader {
            tenant: tenant.into(),
            object_type,
            object_id,
            object_version: 0,
            tag_version: 0,
            timestamp: Utc::now(),
        }
    }

    /// True if this header still names a pre-allocated, never-graduated id.
    pub fn is_preallocated(&self) -> bool {
        self.object_version == 0
    }
}
