use http::Method;

use crate::{
    client::Client,
    error::Result,
    params::{Params, quote_path_arg},
    types::{EndpointConfig, NetworkConnect},
};

impl Client {
    /// `DELETE /networks/{id}`. Requires API 1.21.
    pub async fn remove_network(&self, network: &str) -> Result<()> {
        self.require_version("remove_network", "1.21")?;
        let path = format!("/networks/{}", quote_path_arg(network));
        self.execute(self.request(Method::DELETE, &path, &Params::new(), true))
            .await
    }

    /// `POST /networks/{id}/connect`. Requires API 1.21.
    pub async fn connect_container_to_network(
        &self,
        container: &str,
        network: &str,
        endpoint_config: &EndpointConfig,
    ) -> Result<()> {
        self.require_version("connect_container_to_network", "1.21")?;
        let path = format!("/networks/{}/connect", quote_path_arg(network));
        let body = NetworkConnect {
            container,
            endpoint_config,
        };
        let request = self
            .request(Method::POST, &path, &Params::new(), true)
            .with_json(&body)?;
        self.execute(request).await
    }
}
