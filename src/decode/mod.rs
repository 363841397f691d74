//! Response body decoding.
//!
//! The engine answers in three body shapes:
//! - plain JSON or text, read to completion
//! - JSON values streamed back to back ([`json_stream`])
//! - stdout/stderr multiplexed into 8-byte-header frames ([`demux`]), used for
//!   logs and attach of containers without a TTY
//!
//! [`resolve`] picks the right decoder for a response.

pub mod chunked;
pub mod demux;
pub mod frame;
pub mod json_stream;
pub mod resolve;

pub use chunked::{DEFAULT_CHUNK_SIZE, chunks, text_chunks};
pub use demux::{Frames, demux_stream, demux_to_end};
pub use frame::{Frame, FrameHeader, HEADER_LEN, StreamTag, decode_header, decode_header_slice};
pub use json_stream::{JsonSplitter, json_stream};
pub use resolve::{ContainerOutput, DecodedResult, ResultShape, resolve, resolve_tty};
