use serde::{Deserialize, Serialize};

/// Response of `GET /version`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct VersionInfo {
    /// Engine release, e.g. `17.06.0-ce`.
    pub version: String,

    /// Highest API version the engine speaks.
    pub api_version: String,

    /// Lowest API version the engine accepts (newer engines only).
    #[serde(rename = "MinAPIVersion", default)]
    pub min_api_version: Option<String>,

    /// Operating system.
    #[serde(default)]
    pub os: String,

    /// CPU architecture.
    #[serde(default)]
    pub arch: String,

    /// Kernel version of the host.
    #[serde(default)]
    pub kernel_version: Option<String>,

    /// Go toolchain the engine was built with.
    #[serde(default)]
    pub go_version: Option<String>,

    /// Source revision.
    #[serde(default)]
    pub git_commit: Option<String>,
}
