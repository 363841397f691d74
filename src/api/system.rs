use http::Method;

use crate::{
    client::Client,
    decode::{chunks, json_stream},
    error::Result,
    params::Params,
    stream::ResponseStream,
    types::{EngineEvent, VersionInfo},
};

/// Filters for [`Client::events`].
#[derive(Debug, Clone, Default)]
pub struct EventsOptions {
    /// Only events at or after this Unix timestamp.
    pub since: Option<i64>,

    /// Stop streaming at this Unix timestamp.
    pub until: Option<i64>,

    /// Engine-side filters, e.g. `{"type": ["container"]}`, as JSON.
    pub filters: Option<serde_json::Value>,
}

impl Client {
    /// `GET /_ping`: whether the engine answers `OK`.
    pub async fn ping(&self) -> Result<bool> {
        let request = self.request(Method::GET, "/_ping", &Params::new(), true);
        let text = self.fetch(request, |r| r.text()).await?;
        Ok(text.trim() == "OK")
    }

    /// `GET /version`.
    ///
    /// With `versioned == false` the request omits the `/v<version>` prefix,
    /// which is how the version is discovered in the first place.
    pub async fn version(&self, versioned: bool) -> Result<VersionInfo> {
        let request = self.request(Method::GET, "/version", &Params::new(), versioned);
        self.fetch(request, |r| r.json()).await
    }

    /// `GET /events`: stream engine events as they happen.
    ///
    /// Without `until` the stream only ends when the caller drops it.
    pub async fn events(&self, options: EventsOptions) -> Result<ResponseStream<EngineEvent>> {
        let filters = options
            .filters
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;
        let params = Params::new()
            .set_opt("since", options.since)
            .set_opt("until", options.until)
            .set_opt("filters", filters);

        let request = self.request(Method::GET, "/events", &params, true);
        let response = self.open_stream(request).await?;
        Ok(json_stream(chunks(response.into_body())))
    }
}
