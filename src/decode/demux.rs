//! Demultiplexing of framed stdout/stderr streams.

use async_stream::try_stream;
use bytes::{Bytes, BytesMut};

use super::frame::{Frame, HEADER_LEN, decode_header, decode_header_slice};
use crate::{error::Result, response::Body, stream::ResponseStream};

/// Walks a fully read, framed buffer.
///
/// Iteration stops once fewer than [`HEADER_LEN`] bytes remain; a trailing
/// partial header is dropped rather than reported. A frame whose declared
/// length runs past the end of the buffer yields what is left.
///
/// Zero-length frames produce no element.
#[derive(Debug, Clone)]
pub struct Frames {
    buf: Bytes,
    cursor: usize,
}

impl Frames {
    /// Start walking `buf` from the beginning.
    #[must_use]
    pub fn new(buf: Bytes) -> Self {
        Self { buf, cursor: 0 }
    }

    /// Concatenate all remaining payloads.
    #[must_use]
    pub fn concat(self) -> Bytes {
        let mut out = BytesMut::new();
        for frame in self {
            out.extend_from_slice(&frame.payload);
        }
        out.freeze()
    }
}

impl Iterator for Frames {
    type Item = Frame;

    fn next(&mut self) -> Option<Frame> {
        loop {
            let rest = &self.buf[self.cursor..];
            let header: &[u8; HEADER_LEN] = rest.get(..HEADER_LEN)?.try_into().ok()?;
            let header = decode_header(header);

            let start = self.cursor + HEADER_LEN;
            let end = start
                .saturating_add(header.payload_len())
                .min(self.buf.len());
            self.cursor = end;

            if end == start {
                continue;
            }

            return Some(Frame {
                tag: header.tag,
                payload: self.buf.slice(start..end),
            });
        }
    }
}

/// Read the whole body, then join every frame payload.
pub async fn demux_to_end(mut body: Body) -> Result<Bytes> {
    let buf = body.read_to_end().await?;
    Ok(Frames::new(buf).concat())
}

/// Demultiplex a live body frame by frame.
///
/// The sequence ends when the peer closes between frames, or when a payload
/// is cut short. A header cut short is a format error.
pub fn demux_stream(body: Body) -> ResponseStream<Frame> {
    ResponseStream::new(try_stream! {
        let mut body = body;
        loop {
            let header = body.read_up_to(HEADER_LEN).await?;
            if header.is_empty() {
                break;
            }
            let header = decode_header_slice(&header)?;

            if header.length == 0 {
                continue;
            }

            let len = header.payload_len();
            let payload = body.read_up_to(len).await?;
            if payload.len() < len {
                #[cfg(feature = "tracing")]
                tracing::debug!(
                    expected = len,
                    received = payload.len(),
                    "multiplexed stream closed inside a frame"
                );
                break;
            }

            yield Frame {
                tag: header.tag,
                payload,
            };
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decode::frame::StreamTag;

    fn frame(tag: u8, payload: &[u8]) -> Vec<u8> {
        let mut out = vec![tag, 0, 0, 0];
        out.extend_from_slice(&(payload.len() as u32).to_be_bytes());
        out.extend_from_slice(payload);
        out
    }

    fn payloads(frames: impl IntoIterator<Item = Frame>) -> Vec<Bytes> {
        frames.into_iter().map(|f| f.payload).collect()
    }

    #[test]
    fn buffered_frames_in_order() {
        let sizes = [1usize, 0, 17, 4096, 65536, 3];
        let mut buf = Vec::new();
        let mut expected = Vec::new();
        for (i, size) in sizes.iter().enumerate() {
            let payload: Vec<u8> = (0..*size).map(|b| (b + i) as u8).collect();
            buf.extend(frame(1 + (i % 2) as u8, &payload));
            if *size > 0 {
                expected.push(Bytes::from(payload));
            }
        }

        let buf = Bytes::from(buf);
        let got = payloads(Frames::new(buf.clone()));
        assert_eq!(got, expected);
        assert_eq!(Frames::new(buf).concat(), expected.concat());
    }

    #[test]
    fn tags_are_kept() {
        let mut buf = frame(1, b"out");
        buf.extend(frame(2, b"err"));
        let tags: Vec<StreamTag> = Frames::new(Bytes::from(buf)).map(|f| f.tag).collect();
        assert_eq!(tags, vec![StreamTag::Stdout, StreamTag::Stderr]);
    }

    #[test]
    fn trailing_partial_header_is_dropped() {
        let mut buf = frame(1, b"hello ");
        buf.extend(frame(2, b"world"));
        let clean = payloads(Frames::new(Bytes::from(buf.clone())));

        buf.extend_from_slice(&[1, 0, 0]);
        let truncated = payloads(Frames::new(Bytes::from(buf)));
        assert_eq!(clean, truncated);
        assert_eq!(truncated.len(), 2);
    }

    #[test]
    fn overlong_length_yields_remainder() {
        let mut buf = frame(1, b"abc");
        buf.extend_from_slice(&[1, 0, 0, 0, 0, 0, 0, 10, b'x', b'y']);
        assert_eq!(
            payloads(Frames::new(Bytes::from(buf))),
            vec![Bytes::from_static(b"abc"), Bytes::from_static(b"xy")]
        );
    }

    #[tokio::test]
    async fn buffered_result_joins_payloads() -> Result<()> {
        let mut buf = frame(1, b"one ");
        buf.extend(frame(1, b""));
        buf.extend(frame(2, b"two"));
        let got = demux_to_end(Body::from_chunks(vec![buf])).await?;
        assert_eq!(got, Bytes::from_static(b"one two"));
        Ok(())
    }

    #[tokio::test]
    async fn streaming_skips_zero_length_frames() -> Result<()> {
        let mut buf = frame(1, b"first");
        buf.extend(frame(1, b""));
        buf.extend(frame(2, b"second"));
        let got = demux_stream(Body::from_chunks(vec![buf])).try_collect().await?;
        assert_eq!(
            payloads(got),
            vec![Bytes::from_static(b"first"), Bytes::from_static(b"second")]
        );
        Ok(())
    }

    #[tokio::test]
    async fn streaming_handles_headers_split_across_chunks() -> Result<()> {
        let mut buf = frame(1, b"abc");
        buf.extend(frame(2, b"defgh"));
        let chunks: Vec<Bytes> = buf.chunks(3).map(Bytes::copy_from_slice).collect();
        let got = demux_stream(Body::from_chunks(chunks)).try_collect().await?;
        assert_eq!(got.len(), 2);
        assert_eq!(got[0].tag, StreamTag::Stdout);
        assert_eq!(got[1].payload, Bytes::from_static(b"defgh"));
        Ok(())
    }

    #[tokio::test]
    async fn streaming_short_payload_ends_quietly() -> Result<()> {
        let mut buf = frame(1, b"whole");
        buf.extend_from_slice(&[1, 0, 0, 0, 0, 0, 0, 9, b'p', b'a']);
        let got = demux_stream(Body::from_chunks(vec![buf])).try_collect().await?;
        assert_eq!(payloads(got), vec![Bytes::from_static(b"whole")]);
        Ok(())
    }

    #[tokio::test]
    async fn streaming_short_header_is_an_error() {
        let mut buf = frame(1, b"whole");
        buf.extend_from_slice(&[1, 0, 0]);
        let mut stream = demux_stream(Body::from_chunks(vec![buf]));
        assert!(stream.try_next().await.expect("first frame").is_some());
        let err = stream.try_next().await.expect_err("partial header");
        assert_eq!(err.kind(), crate::error::ErrorKind::Format);
    }
}
