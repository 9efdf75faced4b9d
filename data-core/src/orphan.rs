/*!
Orphan collection: lost updates leave orphaned physical files behind,
collected by an external collector whose contract is not specified
here. This crate defines only the boundary: a query the collector must
honour, never an implementation or schedule.
*/

use crate::error::Error;

/// The sole requirement on any orphan collector: it must never delete a
/// file whose `storage_path` appears in any committed STORAGE
/// definition. Implementations live outside this crate.
pub trait OrphanCollector: Send + Sync {
    /// True if `storage_path` is referenced by a committed STORAGE
    /// definition and must not be deleted.
    fn is_referenced(&self, storage_path: &str) -> bool;

    /// Run one collection pass. Not scheduled or invoked by this crate.
    fn sweep(&self) -> Result<(), Error>;
}
