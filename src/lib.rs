//! `engine-client` - Async-first client for the container engine HTTP API.
//!
//! The heavy lifting is response decoding. Depending on the endpoint a
//! response body is
//! - a single JSON document or plain text
//! - a lazy sequence of raw byte chunks
//! - a sequence of concatenated JSON documents with arbitrary chunk
//!   boundaries (pull progress, events)
//! - a multiplexed stdout/stderr stream of framed records (logs of a
//!   container without a TTY)
//!
//! The [`decode`] module turns each of these into a value or a lazy
//! [`ResponseStream`]. Dropping a stream before its end releases the
//! underlying connection.
//!
//! ## Quick start (Unix socket)
//!
//! ```no_run
//! use engine_client::{Client, ContainerOutput, Endpoint, api::LogsOptions};
//! # async fn demo() -> engine_client::Result<()> {
//! let client = Client::connect(Endpoint::default()).await?;
//! assert!(client.ping().await?);
//!
//! let options = LogsOptions { follow: true, ..Default::default() };
//! if let ContainerOutput::Multiplexed(mut frames) = client.logs("web", options).await? {
//!     while let Some(frame) = frames.try_next().await? {
//!         println!("{:?}: {}", frame.tag, String::from_utf8_lossy(&frame.payload));
//!     }
//! }
//! # Ok(()) }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod client;
mod params;
mod response;
mod stream;
mod transport;

pub mod api;
pub mod decode;
pub mod error;
pub mod types;

#[cfg(any(test, feature = "mock"))]
pub mod mock;

pub use client::{
    ApiVersion, CallOptions, Client, ClientBuilder, ClientOptions, DEFAULT_API_VERSION,
    DEFAULT_TIMEOUT, DEFAULT_UNIX_SOCKET, Endpoint, MINIMUM_API_VERSION,
};
pub use decode::{ContainerOutput, DecodedResult, Frame, ResultShape, StreamTag};
pub use error::{ApiError, ApiErrorKind, Error, ErrorKind, Result};
pub use params::{ParamValue, Params, quote_path_arg};
pub use response::{Body, ByteSource, Response};
pub use stream::ResponseStream;
pub use transport::{ApiRequest, HttpTransport, Transport, TransportFuture};
