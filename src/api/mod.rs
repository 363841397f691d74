//! Engine endpoints.
//!
//! Every operation is a thin method on [`crate::Client`]: build the request,
//! send it, pick a decoder. The decoding itself lives in [`crate::decode`].

mod container;
mod image;
mod network;
mod system;

pub use container::{CommitOptions, LogsOptions, RemoveContainerOptions, Tail};
pub use image::{ImagesOptions, RemoveImageOptions};
pub use system::EventsOptions;
