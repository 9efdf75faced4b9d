/*!
The codec capability set: decodes a complete payload against a
schema, counting logical rows, and claims a format string.

The reference plugins in `data-codec-csv` and `data-codec-json`
implement this trait. Storage keeps the payload in its original wire
format (CSV stays CSV, JSON stays JSON), so this crate's reference
pipeline does not need a separate re-encoding stage: the writer
pipeline forwards raw bytes to storage unchanged and only asks the
codec to validate/count rows over the fully-received buffer. A
genuinely streaming, incremental decoder (or an encoder that transcodes
between formats, e.g. Arrow IPC) is a natural extension of this trait;
this crate declares the extension point without shipping an Arrow
implementation.
*/

use data_core_spec::Schema;

use crate::error::Error;

/// A pluggable tabular codec, selected by MIME type.
pub trait Codec: Send + Sync {
    /// The MIME type this codec claims, e.g. `text/csv`.
    fn format(&self) -> &'static str;

    /// Validate `buffer` against `schema` and return its row count.
    /// Row-skip/row-limit (offset/limit) is applied by the caller before
    /// this is invoked for reads, and is not this codec's concern.
    fn count_rows(&self, schema: &Schema, buffer: &[u8]) -> Result<u64, Error>;
}

/// Look up a codec for `format` among `codecs`, or fail `INPUT_INVALID`
/// if no plugin claims it.
pub fn find_codec<'a>(
    codecs: &'a [std::sync::Arc<dyn Codec>],
    format: &str,
) -> Result<&'a std::sync::Arc<dyn Codec>, Error> {
    codecs
        .iter()
        .find(|codec| codec.format() == format)
        .ok_or_else(|| Error::InputInvalid(format!("no codec registered for format {format}")))
}
