/*!
A reference [`Codec`] for newline-delimited JSON: each line is
one row object; the row count is the number of non-blank lines. A
payload that is a single top-level JSON array is also accepted, for
callers that prefer to ship one array instead of NDJSON.
*/

use data_core::error::Error;
use data_core::pipeline::Codec;
use data_core_spec::Schema;

pub struct JsonCodec;

impl Codec for JsonCodec {
    fn format(&self) -> &'static str {
        "application/json"
    }

    fn count_rows(&self, _schema: &Schema, buffer: &[u8]) -> Result<u64, Error> {
        let trimmed = {
            let mut start = 0;
            while start < buffer.len() && buffer[start].is_ascii_whitespace() {
                start += 1;
            }
            &buffer[start..]
        };
        if trimmed.first() == Some(&b'[') {
            let value: serde_json::Value = serde_json::from_slice(trimmed)?;
            let rows = value
                .as_array()
                .ok_or_else(|| Error::InputInvalid("json payload is not an array of rows".into()))?;
            return Ok(rows.len() as u64);
        }

        let mut count = 0u64;
        for line in buffer.split(|b| *b == b'\n') {
            if line.iter().all(|b| b.is_ascii_whitespace()) {
                continue;
            }
            serde_json::from_slice::<serde_json::Value>(line)
                .map_err(|err| Error::InputInvalid(format!("malformed json row: {err}")))?;
            count += 1;
        }
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_ndjson_rows() {
        let codec = JsonCodec;
        let schema = Schema::default();
        let rows = codec
            .count_rows(&schema, b"{\"id\":1}\n{\"id\":2}\n")
            .unwrap();
        assert_eq!(rows, 2);
    }

    #[test]
    fn counts_array_rows() {
        let codec = JsonCodec;
        let schema = Schema::default();
        let rows = codec
            .count_rows(&schema, b"[{\"id\":1},{\"id\":2},{\"id\":3}]")
            .unwrap();
        assert_eq!(rows, 3);
    }

    #[test]
    fn rejects_malformed_row() {
        let codec = JsonCodec;
        let schema = Schema::default();
        let err = codec.count_rows(&schema, b"{\"id\":1}\nnot json\n").unwrap_err();
        assert!(matches!(err, Error::InputInvalid(_)));
    }
}
