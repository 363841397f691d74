//! Selecting how a response body is consumed.

use bytes::Bytes;
use serde_json::Value;

use super::{
    chunked::{chunks, text_chunks},
    demux::{demux_stream, demux_to_end},
    frame::Frame,
    json_stream::json_stream,
};
use crate::{error::Result, response::Response, stream::ResponseStream};

/// How a generic (non-attach) response body should be consumed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ResultShape {
    /// Read to the end and decode as text.
    #[default]
    Text,
    /// Read to the end and parse as JSON.
    Json,
    /// Read to the end, keep raw bytes.
    Binary,
    /// Stream raw chunks as they arrive.
    Stream,
    /// Stream parsed JSON values as they arrive.
    JsonStream,
}

impl ResultShape {
    /// Whether the body is consumed lazily.
    #[must_use]
    pub fn is_stream(self) -> bool {
        matches!(self, Self::Stream | Self::JsonStream)
    }
}

/// A decoded response body.
#[derive(Debug)]
pub enum DecodedResult {
    /// Full body as text.
    Text(String),
    /// Full body parsed as JSON.
    Json(Value),
    /// Full body as raw bytes.
    Binary(Bytes),
    /// Lazy sequence of raw chunks.
    Stream(ResponseStream<Bytes>),
    /// Lazy sequence of parsed JSON values.
    JsonStream(ResponseStream<Value>),
}

/// Output of a container logs/attach call.
#[derive(Debug)]
pub enum ContainerOutput {
    /// The complete output: raw for TTY containers, joined payloads otherwise.
    Buffered(Bytes),
    /// Live output of a TTY container, as text chunks.
    Raw(ResponseStream<String>),
    /// Live output of a non-TTY container, one element per frame.
    Multiplexed(ResponseStream<Frame>),
}

impl ContainerOutput {
    /// Read everything into one buffer, whatever the shape.
    ///
    /// `Raw` output has already been decoded as text, so invalid UTF-8 from a
    /// TTY comes back as U+FFFD rather than the original bytes. Use
    /// `Buffered` (a non-streaming call) when the exact bytes matter.
    pub async fn into_bytes(self) -> Result<Bytes> {
        match self {
            Self::Buffered(bytes) => Ok(bytes),
            Self::Raw(stream) => {
                let text: String = stream.try_collect().await?.concat();
                Ok(Bytes::from(text))
            }
            Self::Multiplexed(stream) => {
                let frames = stream.try_collect().await?;
                let payloads: Vec<Bytes> = frames.into_iter().map(|f| f.payload).collect();
                Ok(Bytes::from(payloads.concat()))
            }
        }
    }
}

/// Decode `response` according to `shape`, failing on error statuses.
pub async fn resolve(response: Response, shape: ResultShape) -> Result<DecodedResult> {
    let response = response.error_for_status().await?;

    Ok(match shape {
        ResultShape::Text => DecodedResult::Text(response.text().await?),
        ResultShape::Json => DecodedResult::Json(response.json().await?),
        ResultShape::Binary => DecodedResult::Binary(response.bytes().await?),
        ResultShape::Stream => DecodedResult::Stream(chunks(response.into_body())),
        ResultShape::JsonStream => {
            DecodedResult::JsonStream(json_stream(chunks(response.into_body())))
        }
    })
}

/// Decode a logs/attach response.
///
/// | `stream` | `tty` | result |
/// |---|---|---|
/// | false | true | raw bytes |
/// | true | true | raw text chunks |
/// | false | false | demultiplexed, payloads joined |
/// | true | false | demultiplexed, one element per frame |
pub async fn resolve_tty(response: Response, stream: bool, tty: bool) -> Result<ContainerOutput> {
    let response = response.error_for_status().await?;

    #[cfg(feature = "tracing")]
    tracing::debug!(stream, tty, "decoding container output");

    Ok(match (stream, tty) {
        (false, true) => ContainerOutput::Buffered(response.bytes().await?),
        (true, true) => ContainerOutput::Raw(text_chunks(response.into_body())),
        (false, false) => ContainerOutput::Buffered(demux_to_end(response.into_body()).await?),
        (true, false) => ContainerOutput::Multiplexed(demux_stream(response.into_body())),
    })
}

#[cfg(test)]
mod tests {
    use http::{HeaderMap, StatusCode};

    use super::*;
    use crate::response::Body;

    fn framed() -> Vec<u8> {
        let mut out = Vec::new();
        for (tag, payload) in [(1u8, &b"out "[..]), (1, &b""[..]), (2, &b"err"[..])] {
            out.extend_from_slice(&[tag, 0, 0, 0]);
            out.extend_from_slice(&(payload.len() as u32).to_be_bytes());
            out.extend_from_slice(payload);
        }
        out
    }

    fn ok(body: Vec<u8>) -> Response {
        Response::new(StatusCode::OK, HeaderMap::new(), Body::from_chunks(vec![body]))
    }

    #[tokio::test]
    async fn tty_buffered_is_untouched() -> Result<()> {
        match resolve_tty(ok(framed()), false, true).await? {
            ContainerOutput::Buffered(bytes) => assert_eq!(bytes, Bytes::from(framed())),
            other => panic!("unexpected {other:?}"),
        }
        Ok(())
    }

    #[tokio::test]
    async fn tty_stream_is_text() -> Result<()> {
        match resolve_tty(ok(b"hello tty".to_vec()), true, true).await? {
            ContainerOutput::Raw(stream) => {
                assert_eq!(stream.try_collect().await?.concat(), "hello tty");
            }
            other => panic!("unexpected {other:?}"),
        }
        Ok(())
    }

    #[tokio::test]
    async fn raw_output_collects_as_decoded_text() -> Result<()> {
        let output = resolve_tty(ok(b"ok \xff\n".to_vec()), true, true).await?;
        assert_eq!(&output.into_bytes().await?[..], "ok \u{fffd}\n".as_bytes());

        let output = resolve_tty(ok(b"ok \xff\n".to_vec()), false, true).await?;
        assert_eq!(&output.into_bytes().await?[..], b"ok \xff\n");
        Ok(())
    }

    #[tokio::test]
    async fn multiplexed_buffered_is_joined() -> Result<()> {
        match resolve_tty(ok(framed()), false, false).await? {
            ContainerOutput::Buffered(bytes) => assert_eq!(bytes, Bytes::from_static(b"out err")),
            other => panic!("unexpected {other:?}"),
        }
        Ok(())
    }

    #[tokio::test]
    async fn multiplexed_stream_yields_frames() -> Result<()> {
        match resolve_tty(ok(framed()), true, false).await? {
            ContainerOutput::Multiplexed(stream) => {
                let frames = stream.try_collect().await?;
                let payloads: Vec<_> = frames.iter().map(|f| f.payload.clone()).collect();
                assert_eq!(
                    payloads,
                    vec![Bytes::from_static(b"out "), Bytes::from_static(b"err")]
                );
            }
            other => panic!("unexpected {other:?}"),
        }
        Ok(())
    }

    #[tokio::test]
    async fn error_status_is_raised_before_streaming() {
        let resp = Response::new(
            StatusCode::NOT_FOUND,
            HeaderMap::new(),
            Body::from_chunks(vec![r#"{"message":"No such container: x"}"#]),
        );
        let err = resolve_tty(resp, true, false).await.expect_err("404");
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn generic_shapes() -> Result<()> {
        match resolve(ok(b"{\"a\":1}".to_vec()), ResultShape::Json).await? {
            DecodedResult::Json(v) => assert_eq!(v, serde_json::json!({"a": 1})),
            other => panic!("unexpected {other:?}"),
        }
        match resolve(ok(Vec::new()), ResultShape::Text).await? {
            DecodedResult::Text(t) => assert!(t.is_empty()),
            other => panic!("unexpected {other:?}"),
        }
        match resolve(ok(b"{\"a\":1}\n{\"a\":2}\n".to_vec()), ResultShape::JsonStream).await? {
            DecodedResult::JsonStream(s) => assert_eq!(s.try_collect().await?.len(), 2),
            other => panic!("unexpected {other:?}"),
        }
        Ok(())
    }
}
