//! Public data types.

mod container;
mod event;
mod image;
mod network;
mod system;

pub use container::{
    ContainerConfig, ContainerCreate, ContainerInspect, ContainerState, CreateContainerResponse,
    IdResponse,
};
pub use event::{EngineEvent, EventActor};
pub use image::{ErrorDetail, HistoryEntry, ImageInspect, ImageSummary, ProgressMessage};
pub use network::{EndpointConfig, EndpointIpamConfig};

pub(crate) use network::NetworkConnect;
pub use system::VersionInfo;
