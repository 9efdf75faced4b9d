/*!
The writer pipeline (upload): `transport inbound stream -> decoder(codec,
schema) -> row-counter -> storage-writer`.
*/

use bytes::{Bytes, BytesMut};
use futures::StreamExt;
use tokio_util::sync::CancellationToken;

use crate::error::Error;
use crate::pipeline::{ByteStream, Codec, StorageBackend};
use data_core_spec::Schema;

/// The measured outcome of a completed write pipeline.
#[derive(Debug, Clone, Default)]
pub struct WriteOutcome {
    pub bytes_written: u64,
    /// `Some` when a codec/schema pair was supplied (dataset writes);
    /// `None` for opaque file writes.
    pub row_count: Option<u64>,
}

/// Run the write pipeline against `storage_path`, forwarding chunks from
/// `inbound` to the storage writer in the order received, while also
/// accumulating them to hand to the codec once the stream completes.
///
/// On any error the pipeline cancels (drops) the still-open writer and
/// propagates the error; a partially written file is not cleaned up
/// here, that is the job of the out-of-band orphan collector.
pub async fn run_write_pipeline(
    storage: &dyn StorageBackend,
    storage_path: &str,
    mut inbound: ByteStream,
    codec: Option<(&dyn Codec, &Schema)>,
    declared_size: Option<u64>,
    cancellation: &CancellationToken,
) -> Result<WriteOutcome, Error> {
    if let Some((parent, _)) = storage_path.rsplit_once('/') {
        storage.mkdir(parent, true).await?;
    }
    let mut writer = storage.writer(storage_path).await?;
    let mut buffer = BytesMut::new();

    loop {
        let next = tokio::select! {
            biased;
            _ = cancellation.cancelled() => {
                return Err(Error::Cancelled);
            }
            next = inbound.next() => next,
        };
        match next {
            Some(Ok(chunk)) => {
                buffer.extend_from_slice(&chunk);
                writer.write(chunk).await?;
            }
            Some(Err(err)) => return Err(err),
            None => break,
        }
    }

    let bytes_written = writer.finish().await?;

    if let Some(declared) = declared_size {
        if declared != bytes_written {
            return Err(Error::DataSize {
                declared,
                received: bytes_written,
            });
        }
    }

    let row_count = match codec {
        Some((codec, schema)) => Some(codec.count_rows(schema, &buffer)?),
        None => None,
    };

    Ok(WriteOutcome {
        bytes_written,
        row_count,
    })
}

/// Adapt a plain in-memory payload into a [`ByteStream`] of one chunk,
/// used by callers (tests, unary-upload adapters) that already hold the
/// whole payload.
pub fn single_chunk_stream(payload: Bytes) -> ByteStream {
    Box::pin(futures::stream::once(async move { Ok(payload) }))
}
