/*!
The download adapter: the first logical message from the state
machine becomes the first transport message (schema/stat), subsequent
payload chunks are data messages; on error, if the first message has
not yet been sent the error is surfaced as a unary failure, otherwise as
an in-stream error terminator.
*/

use async_trait::async_trait;
use bytes::Bytes;
use data_core_spec::Schema;

use crate::error::Error;

/// A file's stat, sent as the first message of a file download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileStat {
    pub name: String,
    pub mime_type: String,
    pub size: u64,
}

/// One message emitted to the outbound transport.
#[derive(Debug, Clone)]
pub enum DownloadMessage {
    Schema(Schema),
    FileStat(FileStat),
    Chunk(Bytes),
}

/// The transport-facing sink the download adapter writes into. A real
/// gRPC/HTTP binding would implement this over its own response stream;
/// out of scope here.
#[async_trait]
pub trait OutboundSink: Send {
    async fn send(&mut self, message: DownloadMessage) -> Result<(), Error>;
    /// Terminate the stream with an in-band error, used only once the
    /// first message has already been sent (a unary failure is used
    /// instead before that point — see [`DownloadAdapter::fail`]).
    async fn error(&mut self, err: Error) -> Result<(), Error>;
}

pub struct DownloadAdapter<O: OutboundSink> {
    sink: O,
    first_sent: bool,
}

impl<O: OutboundSink> DownloadAdapter<O> {
    pub fn new(sink: O) -> Self {
        DownloadAdapter {
            sink,
            first_sent: false,
        }
    }

    /// Send the first logical message (schema or file stat).
    pub async fn send_first(&mut self, message: DownloadMessage) -> Result<(), Error> {
        self.sink.send(message).await?;
        self.first_sent = true;
        Ok(())
    }

    /// Send one payload chunk. Must only be called after `send_first`.
    pub async fn send_chunk(&mut self, chunk: Bytes) -> Result<(), Error> {
        debug_assert!(self.first_sent, "send_chunk called before send_first");
        self.sink.send(DownloadMessage::Chunk(chunk)).await
    }

    /// Surface an error: a unary failure if nothing has been sent yet,
    /// otherwise an in-stream terminator.
    pub async fn fail(&mut self, err: Error) -> Result<(), Error> {
        if self.first_sent {
            self.sink.error(err).await
        } else {
            Err(err)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use data_core_spec::Schema;

    #[derive(Default)]
    struct RecordingSink {
        sent: Vec<DownloadMessage>,
        errored: Option<String>,
    }

    #[async_trait]
    impl OutboundSink for RecordingSink {
        async fn send(&mut self, message: DownloadMessage) -> Result<(), Error> {
            self.sent.push(message);
            Ok(())
        }
        async fn error(&mut self, err: Error) -> Result<(), Error> {
            self.errored = Some(err.to_string());
            Ok(())
        }
    }

    #[tokio::test]
    async fn error_before_first_message_is_unary_failure() {
        let mut adapter = DownloadAdapter::new(RecordingSink::default());
        let result = adapter.fail(Error::Missing("x".into())).await;
        assert!(result.is_err());
        assert!(adapter.sink.errored.is_none());
    }

    #[tokio::test]
    async fn error_after_first_message_is_in_stream_terminator() {
        let mut adapter = DownloadAdapter::new(RecordingSink::default());
        adapter
            .send_first(DownloadMessage::Schema(Schema::default()))
            .await
            .unwrap();
        let result = adapter.fail(Error::Missing("x".into())).await;
        assert!(result.is_ok());
        assert!(adapter.sink.errored.is_some());
    }
}
