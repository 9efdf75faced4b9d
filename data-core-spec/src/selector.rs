/*!
Selectors: reference values that name a version/tag of an object without
owning a pointer to it. See the "Cyclic references" design note — the
catalogue is the single source of truth and the core never walks a
pointer graph, so every cross-object reference is a [`Selector`] value.
*/

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Which object version a selector names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VersionSelector {
    /// An explicit version number.
    Explicit(u64),
    /// The head (most recently committed) version.
    Latest,
}

/// Which tag of the selected version a selector names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TagSelector {
    /// An explicit tag version.
    Explicit(u64),
    /// The head tag of the selected object version.
    Latest,
}

/// A reference to one version/tag of one object, by id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selector {
    pub object_id: Uuid,
    pub version: VersionSelector,
    pub tag: TagSelector,
}

impl Selector {
    /// Select the latest version and latest tag of an object.
    pub fn latest(object_id: Uuid) -> Self {
        Selector {
            object_id,
            version: VersionSelector::Latest,
            tag: TagSelector::Latest,
        }
    }

    /// Select an explicit version, latest tag.
    pub fn version(object_id: Uuid, version: u64) -> Self {
        Selector {
            object_id,
            version: VersionSelector::Explicit(version),
            tag: TagSelector::Latest,
        }
    }

    /// Select an explicit version and explicit tag.
    pub fn exact(object_id: Uuid, version: u64, tag: u64) -> Self {
        Selector {
            object_id,
            version: VersionSelector::Explicit(version),
            tag: TagSelector::Explicit(tag),
        }
    }
}
