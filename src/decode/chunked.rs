//! Chunked reading of unframed streaming bodies.

use async_stream::try_stream;
use bytes::{Buf, Bytes, BytesMut};

use crate::{response::Body, stream::ResponseStream};

/// Upper bound on the size of a single chunk.
pub const DEFAULT_CHUNK_SIZE: usize = 64 * 1024;

/// Turn a body into a lazy sequence of byte chunks.
///
/// Each element suspends until at least one byte arrives (or the peer closes),
/// then takes everything already received, up to [`DEFAULT_CHUNK_SIZE`]. The
/// sequence ends at a clean end of stream.
pub fn chunks(body: Body) -> ResponseStream<Bytes> {
    ResponseStream::new(try_stream! {
        let mut body = body;
        loop {
            let chunk = body.read_some(DEFAULT_CHUNK_SIZE).await?;
            if chunk.is_empty() {
                break;
            }
            yield chunk;
        }
    })
}

/// Like [`chunks`], with every element decoded as UTF-8 text.
///
/// A multi-byte character split across two chunks is held back and emitted
/// with the following chunk. Invalid sequences are replaced with U+FFFD.
pub fn text_chunks(body: Body) -> ResponseStream<String> {
    ResponseStream::new(try_stream! {
        let mut body = body;
        let mut pending = BytesMut::new();
        loop {
            let chunk = body.read_some(DEFAULT_CHUNK_SIZE).await?;
            if chunk.is_empty() {
                break;
            }
            pending.extend_from_slice(&chunk);

            let text = take_text(&mut pending);
            if !text.is_empty() {
                yield text;
            }
        }

        if !pending.is_empty() {
            yield String::from_utf8_lossy(&pending).into_owned();
        }
    })
}

/// Decode everything in `pending` except an incomplete multi-byte character
/// at its very end, which is left in place for the next chunk.
///
/// Each invalid sequence becomes one U+FFFD, as in `String::from_utf8_lossy`.
fn take_text(pending: &mut BytesMut) -> String {
    let mut text = String::with_capacity(pending.len());
    loop {
        let (valid, invalid) = match std::str::from_utf8(pending) {
            Ok(_) => (pending.len(), None),
            Err(e) => (e.valid_up_to(), Some(e.error_len())),
        };

        let head = pending.split_to(valid);
        text.push_str(&String::from_utf8_lossy(&head));

        match invalid {
            Some(Some(len)) => {
                text.push('\u{fffd}');
                pending.advance(len);
            }
            // All valid, or the tail may still be completed.
            None | Some(None) => return text,
        }
    }
}
