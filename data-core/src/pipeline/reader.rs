/*!
The reader pipeline (download): `storage-reader(storage_path, offset,
limit) -> encoder(codec) -> transport outbound stream`.

The reference storage backends keep a data item's bytes in its
original wire format, so there is no re-encoding step here: the stream
returned by the storage backend's `reader` is handed to the outbound
adapter unchanged. A codec that transcodes on read is a natural
extension of the `Codec` trait and is out of scope (see
`pipeline::codec`).
*/

use tokio_util::sync::CancellationToken;

use crate::error::Error;
use crate::pipeline::{ByteStream, StorageBackend};

/// Open a reader pipeline over `storage_path`. `offset`/`limit` are
/// applied by the storage backend before any bytes are produced
/// (row-skip/row-limit for tables, byte-skip/byte-limit for files); a
/// negative `limit` means unbounded.
pub async fn run_read_pipeline(
    storage: &dyn StorageBackend,
    storage_path: &str,
    offset: Option<u64>,
    limit: Option<i64>,
    cancellation: &CancellationToken,
) -> Result<ByteStream, Error> {
    if cancellation.is_cancelled() {
        return Err(Error::Cancelled);
    }
    storage.reader(storage_path, offset, limit).await
}
