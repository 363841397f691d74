//! HTTP responses and their byte-stream bodies.

use std::{fmt, pin::Pin};

use bytes::{Bytes, BytesMut};
use futures_core::Stream;
use http::{HeaderMap, StatusCode};
use serde::de::DeserializeOwned;
use tokio_stream::StreamExt;

use crate::error::{ApiError, Error, Result};

/// Source of raw body chunks, as delivered by the transport.
pub type ByteSource = Pin<Box<dyn Stream<Item = Result<Bytes>> + Send>>;

/// A response body that has not been read yet.
///
/// `Body` owns the connection the response arrived on. Dropping it releases
/// the connection, whether or not the body was read to the end.
pub struct Body {
    source: ByteSource,
    buf: BytesMut,
    eof: bool,
}

impl Body {
    /// Wrap a stream of raw chunks.
    pub fn new<S>(source: S) -> Self
    where
        S: Stream<Item = Result<Bytes>> + Send + 'static,
    {
        Self {
            source: Box::pin(source),
            buf: BytesMut::new(),
            eof: false,
        }
    }

    /// An empty body.
    #[must_use]
    pub fn empty() -> Self {
        Self::from_chunks(Vec::<Bytes>::new())
    }

    /// A body delivered as the given chunk sequence.
    pub fn from_chunks<I, B>(chunks: I) -> Self
    where
        I: IntoIterator<Item = B>,
        B: Into<Bytes>,
    {
        let chunks: Vec<Result<Bytes>> = chunks.into_iter().map(|c| Ok(c.into())).collect();
        Self::new(tokio_stream::iter(chunks))
    }

    /// Pull the next non-empty chunk into the buffer.
    ///
    /// Returns `false` at end of stream.
    async fn fill(&mut self) -> Result<bool> {
        while !self.eof {
            match self.source.next().await {
                Some(chunk) => {
                    let chunk = chunk?;
                    if !chunk.is_empty() {
                        self.buf.extend_from_slice(&chunk);
                        return Ok(true);
                    }
                }
                None => self.eof = true,
            }
        }

        Ok(false)
    }

    /// Wait for at least one byte, then return whatever is already buffered,
    /// up to `max` bytes.
    ///
    /// An empty result means a clean end of stream.
    pub async fn read_some(&mut self, max: usize) -> Result<Bytes> {
        if self.buf.is_empty() && !self.fill().await? {
            return Ok(Bytes::new());
        }

        let n = max.max(1).min(self.buf.len());
        Ok(self.buf.split_to(n).freeze())
    }

    /// Read exactly `n` bytes, or fewer if the stream ends first.
    pub async fn read_up_to(&mut self, n: usize) -> Result<Bytes> {
        while self.buf.len() < n {
            if !self.fill().await? {
                break;
            }
        }

        let n = n.min(self.buf.len());
        Ok(self.buf.split_to(n).freeze())
    }

    /// Read the remainder of the body.
    pub async fn read_to_end(&mut self) -> Result<Bytes> {
        while self.fill().await? {}
        Ok(self.buf.split().freeze())
    }
}

impl fmt::Debug for Body {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Body")
            .field("buffered", &self.buf.len())
            .field("eof", &self.eof)
            .finish()
    }
}

/// An HTTP response whose body may still be streaming.
#[derive(Debug)]
pub struct Response {
    status: StatusCode,
    headers: HeaderMap,
    body: Body,
}

impl Response {
    /// Assemble a response.
    #[must_use]
    pub fn new(status: StatusCode, headers: HeaderMap, body: Body) -> Self {
        Self {
            status,
            headers,
            body,
        }
    }

    /// Status code.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Response headers.
    #[must_use]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Mutable access to the body.
    pub fn body_mut(&mut self) -> &mut Body {
        &mut self.body
    }

    /// Take the body, dropping status and headers.
    #[must_use]
    pub fn into_body(self) -> Body {
        self.body
    }

    /// Fail with a typed [`ApiError`] if the status is 400 or above.
    ///
    /// On failure the body is read to build the explanation; otherwise the
    /// response is returned untouched.
    pub async fn error_for_status(mut self) -> Result<Self> {
        if self.status.as_u16() < 400 {
            return Ok(self);
        }

        let body = self.body.read_to_end().await?;
        match ApiError::from_body(self.status, &body) {
            Some(err) => {
                #[cfg(feature = "tracing")]
                tracing::debug!(status = self.status.as_u16(), error = %err, "engine returned an error");
                Err(err.into())
            }
            None => Ok(self),
        }
    }

    /// Read the whole body.
    pub async fn bytes(mut self) -> Result<Bytes> {
        self.body.read_to_end().await
    }

    /// Read the whole body as text (invalid UTF-8 is replaced).
    pub async fn text(self) -> Result<String> {
        let bytes = self.bytes().await?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    /// Read the whole body and deserialize it as JSON.
    pub async fn json<T: DeserializeOwned>(self) -> Result<T> {
        let bytes = self.bytes().await?;
        deserialize_slice(&bytes)
    }
}

/// Deserialize JSON, reporting the path of the first failing field.
pub(crate) fn deserialize_slice<T: DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    let mut deserializer = serde_json::Deserializer::from_slice(bytes);
    serde_path_to_error::deserialize(&mut deserializer).map_err(|e| {
        let path = e.path().to_string();
        let source = e.into_inner();
        if source.is_data() {
            Error::format(format!("failed to decode response at '{path}': {source}"))
        } else {
            Error::from(source)
        }
    })
}

/// Convert an already parsed value, reporting the failing field path.
pub(crate) fn deserialize_value<T: DeserializeOwned>(value: serde_json::Value) -> Result<T> {
    serde_path_to_error::deserialize(value).map_err(|e| {
        Error::format(format!(
            "failed to decode response at '{}': {}",
            e.path(),
            e.inner()
        ))
    })
}
