/*!
The streaming storage pipeline: bridges an inbound/outbound byte
stream to a codec and an object-store file writer/reader.

The Reactive-Streams-shaped contract (source, stages, sink, each with
`onSubscribe`/`onNext`/`onComplete`/`onError` and `request(n)`
backpressure) is realised here as `futures::Stream<Item =
Result<Bytes, Error>>`: polling for the next item *is* `request(1)`,
and the item's `Result` carries `onNext`/`onError`, with stream
termination carrying `onComplete`.
*/

pub mod codec;
pub mod reader;
pub mod storage_backend;
pub mod writer;

pub use codec::Codec;
pub use storage_backend::{StorageBackend, StorageWriter};

use bytes::Bytes;
use futures::Stream;
use std::pin::Pin;

use crate::error::Error;

/// A chunk stream: an owned, ref-counted byte buffer per item. Ownership
/// transfers from producer to consumer on each `next()`.
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, Error>> + Send>>;
