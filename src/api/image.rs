use bytes::Bytes;
use http::{Method, StatusCode};

use crate::{
    client::Client,
    decode::{chunks, json_stream},
    error::Result,
    params::{Params, quote_path_arg},
    response::Response,
    stream::ResponseStream,
    types::{HistoryEntry, ImageInspect, ImageSummary, ProgressMessage},
};

/// Options for [`Client::images`].
#[derive(Debug, Clone, Default)]
pub struct ImagesOptions {
    /// Only images matching this reference (`repo`, `repo:tag`).
    pub name: Option<String>,
    /// Include intermediate layers.
    pub all: bool,
}

/// Options for [`Client::remove_image`].
#[derive(Debug, Clone, Copy, Default)]
pub struct RemoveImageOptions {
    /// Remove even if tagged in several repositories or in use.
    pub force: bool,
    /// Keep untagged parents.
    pub noprune: bool,
}

fn image_path(name: &str, suffix: &str) -> String {
    format!("/images/{}{suffix}", quote_path_arg(name))
}

impl Client {
    /// `GET /images/json`.
    pub async fn images(&self, options: ImagesOptions) -> Result<Vec<ImageSummary>> {
        let filters = options
            .name
            .map(|name| serde_json::json!({ "reference": [name] }).to_string());
        let params = Params::new()
            .set("all", options.all)
            .set_opt("filters", filters);
        self.get_json("/images/json", &params).await
    }

    /// `GET /images/{name}/json`.
    pub async fn inspect_image(&self, image: &str) -> Result<ImageInspect> {
        self.get_json(&image_path(image, "/json"), &Params::new())
            .await
    }

    /// `GET /images/{name}/history`.
    pub async fn history(&self, image: &str) -> Result<Vec<HistoryEntry>> {
        self.get_json(&image_path(image, "/history"), &Params::new())
            .await
    }

    /// `POST /images/create`: pull an image, streaming progress messages.
    ///
    /// A failed pull can still answer 200 and report the failure in the last
    /// message's `error` field.
    pub async fn pull(
        &self,
        repository: &str,
        tag: Option<&str>,
    ) -> Result<ResponseStream<ProgressMessage>> {
        let response = self.pull_response(repository, tag).await?;
        Ok(json_stream(chunks(response.into_body())))
    }

    /// Like [`Client::pull`], but yields the progress body undecoded.
    pub async fn pull_raw(&self, repository: &str, tag: Option<&str>) -> Result<ResponseStream<Bytes>> {
        let response = self.pull_response(repository, tag).await?;
        Ok(chunks(response.into_body()))
    }

    async fn pull_response(&self, repository: &str, tag: Option<&str>) -> Result<Response> {
        let params = Params::new()
            .set("fromImage", repository)
            .set("tag", tag.unwrap_or("latest"));
        let request = self.request(Method::POST, "/images/create", &params, true);
        self.open_stream(request).await
    }

    /// `POST /images/{name}/tag`. Returns `true` when the tag was created.
    pub async fn tag(
        &self,
        image: &str,
        repository: &str,
        tag: Option<&str>,
        force: bool,
    ) -> Result<bool> {
        let params = Params::new()
            .set("repo", repository)
            .set_opt("tag", tag)
            .set("force", force);
        let request = self.request(Method::POST, &image_path(image, "/tag"), &params, true);
        self.fetch(request, |r| async move { Ok(r.status() == StatusCode::CREATED) })
            .await
    }

    /// `DELETE /images/{name}`.
    pub async fn remove_image(&self, image: &str, options: RemoveImageOptions) -> Result<()> {
        let params = Params::new()
            .set("force", options.force)
            .set("noprune", options.noprune);
        let request = self.request(Method::DELETE, &image_path(image, ""), &params, true);
        self.execute(request).await
    }

    /// `GET /images/{name}/get`: export an image as a tarball, streamed.
    pub async fn get_image(&self, image: &str) -> Result<ResponseStream<Bytes>> {
        let request = self.request(Method::GET, &image_path(image, "/get"), &Params::new(), true);
        let response = self.open_stream(request).await?;
        Ok(chunks(response.into_body()))
    }

    /// `POST /images/load`: import a tarball produced by [`Client::get_image`].
    pub async fn load_image(&self, tarball: impl Into<Bytes>) -> Result<()> {
        let request = self
            .request(Method::POST, "/images/load", &Params::new(), true)
            .with_body(tarball, "application/x-tar");
        self.execute(request).await
    }
}
