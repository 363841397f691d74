use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Configuration part of a container inspection.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ContainerConfig {
    /// Whether a pseudo-terminal is allocated.
    ///
    /// This decides whether logs and attach output are multiplexed.
    #[serde(rename = "Tty", default)]
    pub tty: bool,

    /// Image the container was created from.
    #[serde(rename = "Image", default)]
    pub image: String,

    /// Command line.
    #[serde(rename = "Cmd", default)]
    pub cmd: Option<Vec<String>>,

    /// Environment in `KEY=value` form.
    #[serde(rename = "Env", default)]
    pub env: Option<Vec<String>>,

    /// Labels.
    #[serde(rename = "Labels", default)]
    pub labels: Option<HashMap<String, String>>,
}

/// Runtime state part of a container inspection.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ContainerState {
    /// Status string: `created`, `running`, `exited`, ...
    #[serde(default)]
    pub status: String,

    /// Whether the main process is running.
    #[serde(default)]
    pub running: bool,

    /// Exit code of the last run.
    #[serde(default)]
    pub exit_code: i64,
}

/// Response of `GET /containers/{id}/json`.
///
/// Only the fields this crate relies on are modelled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ContainerInspect {
    /// Full container id.
    pub id: String,

    /// Container name, with a leading `/`.
    #[serde(default)]
    pub name: String,

    /// Container configuration.
    pub config: ContainerConfig,

    /// Runtime state.
    #[serde(default)]
    pub state: ContainerState,
}

/// Body of `POST /containers/create`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ContainerCreate {
    /// Image to create the container from.
    pub image: String,

    /// Command to run.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cmd: Option<Vec<String>>,

    /// Environment in `KEY=value` form.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub env: Option<Vec<String>>,

    /// Allocate a pseudo-terminal.
    pub tty: bool,

    /// Keep stdin open.
    pub open_stdin: bool,

    /// Attach stdout when started.
    pub attach_stdout: bool,

    /// Attach stderr when started.
    pub attach_stderr: bool,

    /// Labels.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub labels: Option<HashMap<String, String>>,
}

impl ContainerCreate {
    /// Create a container from `image` running `cmd`.
    #[must_use]
    pub fn new(image: impl Into<String>, cmd: impl IntoIterator<Item = impl Into<String>>) -> Self {
        let cmd: Vec<String> = cmd.into_iter().map(Into::into).collect();
        Self {
            image: image.into(),
            cmd: (!cmd.is_empty()).then_some(cmd),
            attach_stdout: true,
            attach_stderr: true,
            ..Self::default()
        }
    }

    /// Allocate a pseudo-terminal.
    #[must_use]
    pub fn tty(mut self, tty: bool) -> Self {
        self.tty = tty;
        self
    }

    /// Add an environment variable.
    #[must_use]
    pub fn env(mut self, key: &str, value: &str) -> Self {
        self.env
            .get_or_insert_with(Vec::new)
            .push(format!("{key}={value}"));
        self
    }
}

/// Response of `POST /containers/create`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CreateContainerResponse {
    /// Id of the new container.
    pub id: String,

    /// Warnings raised during creation.
    #[serde(default)]
    pub warnings: Option<Vec<String>>,
}

/// A response carrying only an object id (e.g. `POST /commit`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdResponse {
    /// Object id.
    #[serde(rename = "Id")]
    pub id: String,
}
