//! Lazy response stream wrapper.

use futures_core::Stream;
use std::{
    fmt,
    pin::Pin,
    task::{Context, Poll},
};

use tokio_stream::StreamExt;

use crate::error::Result;

/// A lazily produced sequence decoded from a streaming response.
///
/// The stream owns the underlying response: dropping it (after exhaustion or
/// part-way through) releases the connection.
///
/// This type implements [`Stream`], but it does **not** expose the generator
/// that drives it in the public API.
pub struct ResponseStream<T> {
    inner: Pin<Box<dyn Stream<Item = Result<T>> + Send>>,
}

impl<T: Send + 'static> ResponseStream<T> {
    pub(crate) fn new<S>(stream: S) -> Self
    where
        S: Stream<Item = Result<T>> + Send + 'static,
    {
        Self {
            inner: Box::pin(stream),
        }
    }

    /// Receive the next element.
    ///
    /// Returns `Ok(None)` once the response is exhausted. This is a
    /// convenience over the `Stream` interface when you prefer a simple
    /// `await`.
    pub async fn try_next(&mut self) -> Result<Option<T>> {
        self.inner.next().await.transpose()
    }

    /// Drain the stream, stopping at the first error.
    pub async fn try_collect(mut self) -> Result<Vec<T>> {
        let mut out = Vec::new();
        while let Some(item) = self.try_next().await? {
            out.push(item);
        }
        Ok(out)
    }
}

impl<T> Stream for ResponseStream<T> {
    type Item = Result<T>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.inner.as_mut().poll_next(cx)
    }
}

impl<T> fmt::Debug for ResponseStream<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResponseStream").finish_non_exhaustive()
    }
}
