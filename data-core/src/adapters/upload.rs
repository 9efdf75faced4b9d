/*!
The upload adapter: buffers inbound transport messages into the
source of the write pipeline, honouring back-pressure.

The delayed-start protocol is realised by [`UploadAdapter::prime`]:
it eagerly requests a single inbound message before the handler begins,
then replays that message as the first item of the stream the handler
ultimately pulls from, so the handler's own first `request(1)` does not
double up on the transport.
*/

use std::collections::VecDeque;
use std::pin::Pin;
use std::task::{Context, Poll};

use bytes::Bytes;
use futures::{Stream, StreamExt};

use crate::error::Error;
use crate::pipeline::ByteStream;

pub struct UploadAdapter {
    primed: VecDeque<Bytes>,
    inner: ByteStream,
}

impl UploadAdapter {
    pub fn new(inner: ByteStream) -> Self {
        UploadAdapter {
            primed: VecDeque::new(),
            inner,
        }
    }

    /// Eagerly pull the first inbound message (the delayed-start
    /// protocol's single upfront `request(1)`). Returns `Ok(None)` if the
    /// inbound stream was already empty (e.g. a zero-byte file).
    pub async fn prime(&mut self) -> Result<Option<Bytes>, Error> {
        match self.inner.next().await.transpose()? {
            Some(chunk) => {
                self.primed.push_back(chunk.clone());
                Ok(Some(chunk))
            }
            None => Ok(None),
        }
    }

    /// Consume this adapter as a [`ByteStream`] for the write pipeline,
    /// replaying the primed chunk (if any) first.
    pub fn into_stream(self) -> ByteStream {
        Box::pin(self)
    }
}

impl Stream for UploadAdapter {
    type Item = Result<Bytes, Error>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        if let Some(chunk) = this.primed.pop_front() {
            return Poll::Ready(Some(Ok(chunk)));
        }
        this.inner.as_mut().poll_next(cx)
    }
}
