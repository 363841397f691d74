use serde::{Deserialize, Serialize};

/// One entry of `GET /images/json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ImageSummary {
    /// Image id (`sha256:...`).
    pub id: String,

    /// Repository tags; `null` for dangling images.
    #[serde(default)]
    pub repo_tags: Option<Vec<String>>,

    /// Creation time as a Unix timestamp.
    #[serde(default)]
    pub created: i64,

    /// Size in bytes.
    #[serde(default)]
    pub size: i64,
}

/// Response of `GET /images/{name}/json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ImageInspect {
    /// Image id.
    pub id: String,

    /// Repository tags.
    #[serde(default)]
    pub repo_tags: Vec<String>,

    /// Creation time (RFC 3339).
    #[serde(default)]
    pub created: String,

    /// Size in bytes.
    #[serde(default)]
    pub size: i64,

    /// CPU architecture.
    #[serde(default)]
    pub architecture: String,

    /// Operating system.
    #[serde(default)]
    pub os: String,
}

/// One layer of `GET /images/{name}/history`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct HistoryEntry {
    /// Layer id, or `<missing>`.
    pub id: String,

    /// Creation time as a Unix timestamp.
    #[serde(default)]
    pub created: i64,

    /// Instruction that produced the layer.
    #[serde(default)]
    pub created_by: String,

    /// Tags pointing at this layer.
    #[serde(default)]
    pub tags: Option<Vec<String>>,

    /// Layer size in bytes.
    #[serde(default)]
    pub size: i64,

    /// Commit message.
    #[serde(default)]
    pub comment: String,
}

/// Error detail attached to a failed progress message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorDetail {
    /// Error message.
    #[serde(default)]
    pub message: String,
}

/// One progress message from `POST /images/create` (pull) and friends.
///
/// A stream of these may end with a message carrying `error` instead of a
/// final status: the HTTP status is already 200 by then.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressMessage {
    /// Status line, e.g. `Pulling fs layer`.
    #[serde(default)]
    pub status: Option<String>,

    /// Layer id the status refers to.
    #[serde(default)]
    pub id: Option<String>,

    /// Rendered progress bar.
    #[serde(default)]
    pub progress: Option<String>,

    /// Error message, if the operation failed mid-stream.
    #[serde(default)]
    pub error: Option<String>,

    /// Structured error.
    #[serde(rename = "errorDetail", default)]
    pub error_detail: Option<ErrorDetail>,
}
