//! Incremental decoding of JSON value streams.
//!
//! The engine emits progress and event streams as JSON objects, usually one
//! per line. Values can arrive split across chunks, several can share one
//! chunk, and the separator is not guaranteed, so values are parsed as a
//! prefix of an accumulating buffer instead of line by line.

use async_stream::try_stream;
use bytes::{Buf, Bytes, BytesMut};
use futures_core::Stream;
use serde::de::DeserializeOwned;
use tokio_stream::StreamExt;

use crate::{
    error::{Error, Result},
    stream::ResponseStream,
};

/// Buffer that splits complete JSON values off its front.
#[derive(Debug, Default)]
pub struct JsonSplitter {
    buf: BytesMut,
    closed: bool,
}

impl JsonSplitter {
    /// Create an empty splitter.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a chunk.
    pub fn push(&mut self, chunk: &[u8]) {
        self.buf.extend_from_slice(chunk);
    }

    /// Parse one complete value from the front of the buffer.
    ///
    /// Returns `Ok(None)` when the buffer holds only whitespace or an
    /// incomplete value. A number running up to the end of the buffer counts
    /// as incomplete: the next chunk may carry more digits.
    pub fn next_value<T: DeserializeOwned>(&mut self) -> Result<Option<T>> {
        self.trim_start();
        if self.buf.is_empty() {
            return Ok(None);
        }

        let parsed = {
            let mut values = serde_json::Deserializer::from_slice(&self.buf).into_iter::<T>();
            match values.next() {
                Some(Ok(_)) if !self.closed && ends_in_number(&self.buf, values.byte_offset()) => {
                    None
                }
                Some(Ok(value)) => Some((value, values.byte_offset())),
                Some(Err(e)) if e.is_eof() => None,
                Some(Err(e)) => {
                    return Err(Error::format(format!("invalid value in JSON stream: {e}")));
                }
                None => None,
            }
        };

        Ok(parsed.map(|(value, consumed)| {
            self.buf.advance(consumed);
            self.trim_start();
            value
        }))
    }

    /// Take the last value once the input has ended.
    ///
    /// This yields a trailing number held back by [`JsonSplitter::next_value`].
    /// Trailing whitespace is discarded; anything else is a format error.
    pub fn finish<T: DeserializeOwned>(mut self) -> Result<Option<T>> {
        self.closed = true;
        let last = self.next_value()?;
        if self.buf.is_empty() {
            return Ok(last);
        }

        Err(Error::format(format!(
            "JSON stream ended with {} unparsed bytes",
            self.buf.len()
        )))
    }

    fn trim_start(&mut self) {
        let ws = self
            .buf
            .iter()
            .take_while(|b| b.is_ascii_whitespace())
            .count();
        self.buf.advance(ws);
    }
}

/// Whether the value parsed from `buf[..end]` reaches the end of the buffer
/// with a digit, which only a number can.
fn ends_in_number(buf: &[u8], end: usize) -> bool {
    end == buf.len() && buf.last().is_some_and(u8::is_ascii_digit)
}

/// Decode a lazy sequence of chunks into a lazy sequence of JSON values.
pub fn json_stream<T, S>(chunks: S) -> ResponseStream<T>
where
    T: DeserializeOwned + Send + 'static,
    S: Stream<Item = Result<Bytes>> + Send + 'static,
{
    ResponseStream::new(try_stream! {
        tokio::pin!(chunks);
        let mut splitter = JsonSplitter::new();

        while let Some(chunk) = chunks.next().await {
            splitter.push(&chunk?);
            while let Some(value) = splitter.next_value::<T>()? {
                yield value;
            }
        }

        if let Some(value) = splitter.finish::<T>()? {
            yield value;
        }
    })
}

#[cfg(test)]
mod tests {
    use serde_json::{Value, json};

    use super::*;

    fn source(chunks: Vec<&'static str>) -> impl Stream<Item = Result<Bytes>> + Send + 'static {
        tokio_stream::iter(chunks.into_iter().map(|c| Ok(Bytes::from_static(c.as_bytes()))))
    }

    #[tokio::test]
    async fn value_split_across_chunks() -> Result<()> {
        let got: Vec<Value> = json_stream(source(vec!["{\"a\":1}\n{\"b\":2", "}\n"]))
            .try_collect()
            .await?;
        assert_eq!(got, vec![json!({"a": 1}), json!({"b": 2})]);
        Ok(())
    }

    #[tokio::test]
    async fn concatenated_values_without_separator() -> Result<()> {
        let got: Vec<Value> = json_stream(source(vec!["{\"a\":1}{\"b\":2}"]))
            .try_collect()
            .await?;
        assert_eq!(got, vec![json!({"a": 1}), json!({"b": 2})]);
        Ok(())
    }

    #[tokio::test]
    async fn crlf_and_blank_lines_are_ignored() -> Result<()> {
        let got: Vec<Value> = json_stream(source(vec!["\r\n{\"a\":1}\r\n\r\n", "  [1,2]\n\n"]))
            .try_collect()
            .await?;
        assert_eq!(got, vec![json!({"a": 1}), json!([1, 2])]);
        Ok(())
    }

    #[tokio::test]
    async fn string_containing_newline_split_mid_escape() -> Result<()> {
        let got: Vec<Value> = json_stream(source(vec!["{\"s\":\"x\\", "ny\"}"]))
            .try_collect()
            .await?;
        assert_eq!(got, vec![json!({"s": "x\ny"})]);
        Ok(())
    }

    #[tokio::test]
    async fn typed_values() -> Result<()> {
        #[derive(Debug, PartialEq, serde::Deserialize)]
        struct Progress {
            status: String,
        }

        let got: Vec<Progress> = json_stream(source(vec![
            "{\"status\":\"Pulling\"}\n{\"sta",
            "tus\":\"Done\"}\n",
        ]))
        .try_collect()
        .await?;
        assert_eq!(
            got,
            vec![
                Progress {
                    status: "Pulling".into()
                },
                Progress {
                    status: "Done".into()
                }
            ]
        );
        Ok(())
    }

    #[tokio::test]
    async fn incomplete_tail_is_a_format_error() {
        let mut stream = json_stream::<Value, _>(source(vec!["{\"a\":1}\n{\"b\":"]));
        assert_eq!(stream.try_next().await.expect("first value"), Some(json!({"a": 1})));
        let err = stream.try_next().await.expect_err("tail must fail");
        assert_eq!(err.kind(), crate::error::ErrorKind::Format);
    }

    #[tokio::test]
    async fn garbage_is_rejected_immediately() {
        let mut stream = json_stream::<Value, _>(source(vec!["{\"a\":1}\nnot json\n", "{}"]));
        assert_eq!(stream.try_next().await.expect("first value"), Some(json!({"a": 1})));
        assert!(stream.try_next().await.is_err());
    }

    #[test]
    fn splitter_waits_for_more_input() -> Result<()> {
        let mut splitter = JsonSplitter::new();
        splitter.push(b"{\"a\":[1,");
        assert_eq!(splitter.next_value::<Value>()?, None);
        splitter.push(b"2]}\n");
        assert_eq!(splitter.next_value::<Value>()?, Some(json!({"a": [1, 2]})));
        assert_eq!(splitter.next_value::<Value>()?, None);
        assert_eq!(splitter.finish::<Value>()?, None);
        Ok(())
    }

    #[tokio::test]
    async fn number_split_across_chunks() -> Result<()> {
        let got: Vec<Value> = json_stream(source(vec!["12", "34\n"])).try_collect().await?;
        assert_eq!(got, vec![json!(1234)]);
        Ok(())
    }

    #[tokio::test]
    async fn trailing_number_is_yielded_at_end() -> Result<()> {
        let got: Vec<Value> = json_stream(source(vec!["{\"a\":1} 7", "8"])).try_collect().await?;
        assert_eq!(got, vec![json!({"a": 1}), json!(78)]);
        Ok(())
    }

    #[test]
    fn splitter_holds_back_a_number_until_closed() -> Result<()> {
        let mut splitter = JsonSplitter::new();
        splitter.push(b"3.5");
        assert_eq!(splitter.next_value::<Value>()?, None);
        splitter.push(b"e2 ");
        assert_eq!(splitter.next_value::<Value>()?, Some(json!(350.0)));
        splitter.push(b"42");
        assert_eq!(splitter.next_value::<Value>()?, None);
        assert_eq!(splitter.finish::<Value>()?, Some(json!(42)));
        Ok(())
    }
}
