use http::Method;

use crate::{
    client::Client,
    decode::ContainerOutput,
    error::Result,
    params::{Params, quote_path_arg},
    types::{ContainerCreate, ContainerInspect, CreateContainerResponse, IdResponse},
};

/// How many log lines to return.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Tail {
    /// Every line.
    #[default]
    All,
    /// The last `n` lines.
    Lines(u32),
}

/// Options for [`Client::logs`].
#[derive(Debug, Clone)]
pub struct LogsOptions {
    /// Include stdout.
    pub stdout: bool,
    /// Include stderr.
    pub stderr: bool,
    /// Prefix every line with its timestamp.
    pub timestamps: bool,
    /// Return a lazy stream instead of the buffered output.
    pub stream: bool,
    /// Keep the stream open for new output. Implies `stream`.
    pub follow: bool,
    /// Which lines to return.
    pub tail: Tail,
    /// Only lines at or after this Unix timestamp.
    pub since: Option<i64>,
}

impl Default for LogsOptions {
    fn default() -> Self {
        Self {
            stdout: true,
            stderr: true,
            timestamps: false,
            stream: false,
            follow: false,
            tail: Tail::All,
            since: None,
        }
    }
}

/// Options for [`Client::remove_container`].
#[derive(Debug, Clone, Copy, Default)]
pub struct RemoveContainerOptions {
    /// Remove anonymous volumes too.
    pub volumes: bool,
    /// Kill the container first if it is running.
    pub force: bool,
    /// Remove the link instead of the container.
    pub link: bool,
}

/// Options for [`Client::commit`].
#[derive(Debug, Clone, Default)]
pub struct CommitOptions {
    /// Repository of the new image.
    pub repository: Option<String>,
    /// Tag of the new image.
    pub tag: Option<String>,
    /// Commit message.
    pub message: Option<String>,
    /// Author.
    pub author: Option<String>,
}

fn container_path(id: &str, suffix: &str) -> String {
    format!("/containers/{}{suffix}", quote_path_arg(id))
}

impl Client {
    /// `GET /containers/{id}/json`.
    pub async fn inspect_container(&self, container: &str) -> Result<ContainerInspect> {
        self.get_json(&container_path(container, "/json"), &Params::new())
            .await
    }

    /// `POST /containers/create`.
    pub async fn create_container(
        &self,
        config: &ContainerCreate,
        name: Option<&str>,
    ) -> Result<CreateContainerResponse> {
        let params = Params::new().set_opt("name", name);
        self.post_json("/containers/create", &params, config).await
    }

    /// `POST /containers/{id}/start`.
    pub async fn start(&self, container: &str) -> Result<()> {
        let path = container_path(container, "/start");
        self.execute(self.request(Method::POST, &path, &Params::new(), true))
            .await
    }

    /// `POST /containers/{id}/stop`, killing after `timeout_secs`.
    pub async fn stop(&self, container: &str, timeout_secs: u32) -> Result<()> {
        let path = container_path(container, "/stop");
        let params = Params::new().set("t", timeout_secs);
        self.execute(self.request(Method::POST, &path, &params, true))
            .await
    }

    /// `POST /containers/{id}/restart`, killing after `timeout_secs`.
    pub async fn restart(&self, container: &str, timeout_secs: u32) -> Result<()> {
        let path = container_path(container, "/restart");
        let params = Params::new().set("t", timeout_secs);
        self.execute(self.request(Method::POST, &path, &params, true))
            .await
    }

    /// `DELETE /containers/{id}`.
    pub async fn remove_container(
        &self,
        container: &str,
        options: RemoveContainerOptions,
    ) -> Result<()> {
        let params = Params::new()
            .set("v", options.volumes)
            .set("force", options.force)
            .set("link", options.link);
        let path = container_path(container, "");
        self.execute(self.request(Method::DELETE, &path, &params, true))
            .await
    }

    /// `GET /containers/{id}/logs`.
    ///
    /// The shape of the output depends on whether the container has a TTY,
    /// which costs one extra inspect request.
    pub async fn logs(&self, container: &str, options: LogsOptions) -> Result<ContainerOutput> {
        let stream = options.stream || options.follow;
        let tail = match options.tail {
            Tail::All => "all".to_string(),
            Tail::Lines(n) => n.to_string(),
        };
        let params = Params::new()
            .set("stdout", options.stdout)
            .set("stderr", options.stderr)
            .set("timestamps", options.timestamps)
            .set("follow", options.follow)
            .set("tail", tail)
            .set_opt("since", options.since);

        let path = container_path(container, "/logs");
        let request = self.request(Method::GET, &path, &params, true);
        self.container_output(container, request, stream).await
    }

    /// `POST /commit`: create an image from a container.
    pub async fn commit(&self, container: &str, options: CommitOptions) -> Result<IdResponse> {
        let params = Params::new()
            .set("container", container)
            .set_opt("repo", options.repository)
            .set_opt("tag", options.tag)
            .set_opt("comment", options.message)
            .set_opt("author", options.author);
        self.post_json("/commit", &params, &serde_json::json!({}))
            .await
    }
}
