use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// The object an event is about.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct EventActor {
    /// Object id (container id, image name, network id, ...).
    #[serde(rename = "ID", default)]
    pub id: String,

    /// Free-form attributes such as `name` or `image`.
    #[serde(rename = "Attributes", default)]
    pub attributes: HashMap<String, String>,
}

/// An engine event as streamed by `GET /events`.
///
/// Only the stable fields are modelled; older engines may omit `Type` and
/// `Actor`, in which case they default to empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineEvent {
    /// Object type: `container`, `image`, `network`, `volume`, ...
    #[serde(rename = "Type", default)]
    pub kind: String,

    /// What happened: `create`, `start`, `die`, `pull`, ...
    #[serde(rename = "Action", default)]
    pub action: String,

    /// Affected object.
    #[serde(rename = "Actor", default)]
    pub actor: EventActor,

    /// Unix timestamp in seconds.
    #[serde(default)]
    pub time: i64,

    /// Unix timestamp in nanoseconds.
    #[serde(rename = "timeNano", default)]
    pub time_nano: i64,
}
