use serde::Serialize;

/// IP address settings of a network endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct EndpointIpamConfig {
    /// Fixed IPv4 address.
    #[serde(rename = "IPv4Address", skip_serializing_if = "Option::is_none")]
    pub ipv4_address: Option<String>,

    /// Fixed IPv6 address.
    #[serde(rename = "IPv6Address", skip_serializing_if = "Option::is_none")]
    pub ipv6_address: Option<String>,

    /// Link-local addresses.
    #[serde(rename = "LinkLocalIPs", skip_serializing_if = "Vec::is_empty")]
    pub link_local_ips: Vec<String>,
}

impl EndpointIpamConfig {
    fn is_empty(&self) -> bool {
        self.ipv4_address.is_none() && self.ipv6_address.is_none() && self.link_local_ips.is_empty()
    }
}

/// How a container joins a network.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct EndpointConfig {
    /// Extra DNS names for the container on this network.
    #[serde(rename = "Aliases", skip_serializing_if = "Vec::is_empty")]
    pub aliases: Vec<String>,

    /// Legacy links, `container:alias`.
    #[serde(rename = "Links", skip_serializing_if = "Vec::is_empty")]
    pub links: Vec<String>,

    /// Address settings.
    #[serde(rename = "IPAMConfig", skip_serializing_if = "EndpointIpamConfig::is_empty")]
    pub ipam_config: EndpointIpamConfig,
}

/// Body of `POST /networks/{id}/connect`.
#[derive(Debug, Clone, Serialize)]
pub(crate) struct NetworkConnect<'a> {
    #[serde(rename = "Container")]
    pub(crate) container: &'a str,

    #[serde(rename = "EndpointConfig")]
    pub(crate) endpoint_config: &'a EndpointConfig,
}
