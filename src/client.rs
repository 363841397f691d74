//! Asynchronous engine API client.

use std::{fmt, future::Future, path::PathBuf, str::FromStr, sync::Arc, time::Duration};

use http::{HeaderValue, Method, header};
use serde::{Serialize, de::DeserializeOwned};

use crate::{
    decode::{self, ContainerOutput, DecodedResult, ResultShape},
    error::{Error, Result},
    params::Params,
    response::Response,
    transport::{ApiRequest, HttpTransport, Transport},
};

/// API version used when none is configured.
pub const DEFAULT_API_VERSION: &str = "1.26";

/// Oldest API version this client is tested against.
pub const MINIMUM_API_VERSION: &str = "1.21";

/// Default per-call timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Default Unix socket of the engine.
pub const DEFAULT_UNIX_SOCKET: &str = "/var/run/docker.sock";

/// Engine endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Endpoint {
    /// Connect via a Unix domain socket.
    Unix {
        /// Socket path.
        path: PathBuf,
    },

    /// Connect via a TCP socket.
    Tcp {
        /// Hostname or IP.
        host: String,
        /// Port.
        port: u16,
    },
}

impl Endpoint {
    /// Create a Unix socket endpoint.
    #[must_use]
    pub fn unix(path: impl Into<PathBuf>) -> Self {
        Self::Unix { path: path.into() }
    }

    /// Create a TCP endpoint.
    #[must_use]
    pub fn tcp(host: impl Into<String>, port: u16) -> Self {
        Self::Tcp {
            host: host.into(),
            port,
        }
    }
}

impl Default for Endpoint {
    fn default() -> Self {
        Self::unix(DEFAULT_UNIX_SOCKET)
    }
}

impl FromStr for Endpoint {
    type Err = Error;

    /// Parse `unix:///path`, `tcp://host:port`, `http://host:port` or a bare
    /// absolute socket path.
    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if s.starts_with('/') {
            return Ok(Self::unix(s));
        }

        let (scheme, rest) = s
            .split_once("://")
            .ok_or_else(|| Error::endpoint(format!("missing scheme in '{s}'")))?;

        match scheme {
            "unix" | "http+unix" => {
                if rest.is_empty() {
                    return Err(Error::endpoint("empty unix socket path"));
                }
                let path = if rest.starts_with('/') {
                    rest.to_string()
                } else {
                    format!("/{rest}")
                };
                Ok(Self::unix(path))
            }
            "tcp" | "http" => {
                let authority = rest.trim_end_matches('/');
                let (host, port) = authority
                    .rsplit_once(':')
                    .ok_or_else(|| Error::endpoint(format!("missing port in '{s}'")))?;
                let host = host.trim_start_matches('[').trim_end_matches(']');
                if host.is_empty() {
                    return Err(Error::endpoint(format!("missing host in '{s}'")));
                }
                let port = port
                    .parse::<u16>()
                    .map_err(|e| Error::endpoint(format!("invalid port in '{s}': {e}")))?;
                Ok(Self::tcp(host, port))
            }
            "https" => Err(Error::endpoint("TLS endpoints are not supported")),
            "npipe" => Err(Error::endpoint("named pipes are not supported")),
            other => Err(Error::endpoint(format!("unknown scheme '{other}'"))),
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unix { path } => write!(f, "unix://{}", path.display()),
            Self::Tcp { host, port } => write!(f, "tcp://{host}:{port}"),
        }
    }
}

/// Which API version requests are made against.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ApiVersion {
    /// A fixed version such as `1.26`.
    Fixed(String),
    /// Ask the engine (`GET /version`) when the client is built.
    Auto,
}

impl Default for ApiVersion {
    fn default() -> Self {
        Self::Fixed(DEFAULT_API_VERSION.to_string())
    }
}

/// Options controlling how the client talks to the engine.
#[derive(Debug, Clone)]
pub struct ClientOptions {
    /// API version.
    pub version: ApiVersion,

    /// Default timeout for non-streaming calls.
    ///
    /// Individual calls can override this via [`CallOptions`]. Streaming
    /// calls are never bounded by it.
    pub default_timeout: Option<Duration>,

    /// `User-Agent` header value.
    pub user_agent: String,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            version: ApiVersion::default(),
            default_timeout: Some(DEFAULT_TIMEOUT),
            user_agent: concat!("engine-client/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

/// Options for a single call.
#[derive(Debug, Clone, Default)]
pub struct CallOptions {
    /// Override the default timeout.
    pub timeout: Option<Duration>,
}

/// Client builder.
#[derive(Debug, Clone)]
pub struct ClientBuilder {
    endpoint: Endpoint,
    options: ClientOptions,
}

impl ClientBuilder {
    /// Set the API version.
    #[must_use]
    pub fn version(mut self, version: ApiVersion) -> Self {
        self.options.version = version;
        self
    }

    /// Set default call timeout.
    #[must_use]
    pub fn default_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.options.default_timeout = timeout;
        self
    }

    /// Set the `User-Agent` header.
    #[must_use]
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.options.user_agent = user_agent.into();
        self
    }

    /// Build a client speaking HTTP to the configured endpoint.
    pub async fn build(self) -> Result<Client> {
        let transport = HttpTransport::new(self.endpoint);
        Client::with_transport(Arc::new(transport), self.options).await
    }

    /// Build a client over a custom transport (the endpoint is ignored).
    pub async fn build_with_transport(self, transport: Arc<dyn Transport>) -> Result<Client> {
        Client::with_transport(transport, self.options).await
    }
}

/// An async-first engine API client.
///
/// Cloning is cheap; clones share the transport.
#[derive(Clone, Debug)]
pub struct Client {
    inner: Arc<Inner>,
}

#[derive(Debug)]
struct Inner {
    transport: Arc<dyn Transport>,
    version: String,
    default_timeout: Option<Duration>,
    user_agent: HeaderValue,
}

impl Client {
    /// Create a builder for the given endpoint.
    #[must_use]
    pub fn builder(endpoint: Endpoint) -> ClientBuilder {
        ClientBuilder {
            endpoint,
            options: ClientOptions::default(),
        }
    }

    /// Connect to an endpoint with default options.
    pub async fn connect(endpoint: Endpoint) -> Result<Client> {
        Self::builder(endpoint).build().await
    }

    /// Create a client over any transport.
    pub async fn with_transport(
        transport: Arc<dyn Transport>,
        options: ClientOptions,
    ) -> Result<Client> {
        let user_agent = HeaderValue::from_str(&options.user_agent)
            .map_err(|e| Error::endpoint(format!("invalid user agent: {e}")))?;

        let version = match options.version {
            ApiVersion::Fixed(v) => v,
            ApiVersion::Auto => {
                let probe = Self::from_parts(
                    transport.clone(),
                    DEFAULT_API_VERSION.to_string(),
                    options.default_timeout,
                    user_agent.clone(),
                );
                probe.version(false).await?.api_version
            }
        };
        parse_version(&version)?;

        if version_lt(&version, MINIMUM_API_VERSION) {
            #[cfg(feature = "tracing")]
            tracing::warn!(
                version = %version,
                minimum = MINIMUM_API_VERSION,
                "API version is older than the minimum supported version"
            );
        }

        Ok(Self::from_parts(
            transport,
            version,
            options.default_timeout,
            user_agent,
        ))
    }

    fn from_parts(
        transport: Arc<dyn Transport>,
        version: String,
        default_timeout: Option<Duration>,
        user_agent: HeaderValue,
    ) -> Self {
        Client {
            inner: Arc::new(Inner {
                transport,
                version,
                default_timeout,
                user_agent,
            }),
        }
    }

    /// API version requests are made against.
    #[must_use]
    pub fn api_version(&self) -> &str {
        &self.inner.version
    }

    /// Build a request for `path`, prefixed with `/v<version>` when
    /// `versioned` is set.
    #[must_use]
    pub fn request(&self, method: Method, path: &str, params: &Params, versioned: bool) -> ApiRequest {
        let mut path_and_query = if versioned {
            format!("/v{}{path}", self.inner.version)
        } else {
            path.to_string()
        };

        if !params.is_empty() {
            path_and_query.push('?');
            path_and_query.push_str(&params.to_query());
        }

        let mut request = ApiRequest::new(method, path_and_query);
        request
            .headers
            .insert(header::USER_AGENT, self.inner.user_agent.clone());
        request
    }

    /// Send a request and wait for the response head.
    ///
    /// Error statuses are *not* turned into errors here.
    pub async fn send(&self, request: ApiRequest, timeout: Option<Duration>) -> Result<Response> {
        #[cfg(feature = "tracing")]
        let (method, path) = (request.method.clone(), request.path_and_query.clone());

        let response = with_timeout(timeout, self.inner.transport.send(request)).await?;

        #[cfg(feature = "tracing")]
        tracing::debug!(
            method = %method,
            path = %path,
            status = response.status().as_u16(),
            "engine responded"
        );

        Ok(response)
    }

    /// Send a request and decode the body as `shape`.
    ///
    /// Non-streaming shapes are bounded by the timeout as a whole (request and
    /// body); streaming shapes are not bounded at all.
    pub async fn call(
        &self,
        request: ApiRequest,
        shape: ResultShape,
        options: CallOptions,
    ) -> Result<DecodedResult> {
        if shape.is_stream() {
            let response = self.send(request, None).await?;
            return decode::resolve(response, shape).await;
        }

        let timeout = self.timeout(&options);
        with_timeout(timeout, async {
            let response = self.send(request, None).await?;
            decode::resolve(response, shape).await
        })
        .await
    }

    fn timeout(&self, options: &CallOptions) -> Option<Duration> {
        options.timeout.or(self.inner.default_timeout)
    }

    /// Send, fail on error statuses, then hand the response to `decode`,
    /// all within the default timeout.
    pub(crate) async fn fetch<T, F, Fut>(&self, request: ApiRequest, decode: F) -> Result<T>
    where
        F: FnOnce(Response) -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        with_timeout(self.inner.default_timeout, async {
            let response = self.send(request, None).await?.error_for_status().await?;
            decode(response).await
        })
        .await
    }

    pub(crate) async fn get_json<T: DeserializeOwned>(&self, path: &str, params: &Params) -> Result<T> {
        let request = self.request(Method::GET, path, params, true);
        self.fetch(request, Response::json).await
    }

    pub(crate) async fn post_json<B, T>(&self, path: &str, params: &Params, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let request = self.request(Method::POST, path, params, true).with_json(body)?;
        self.fetch(request, Response::json).await
    }

    /// Fire a request whose body carries nothing of interest.
    pub(crate) async fn execute(&self, request: ApiRequest) -> Result<()> {
        self.fetch(request, |r| async move { r.bytes().await.map(drop) })
            .await
    }

    /// Open a streaming response, failing on error statuses.
    pub(crate) async fn open_stream(&self, request: ApiRequest) -> Result<Response> {
        self.send(request, None).await?.error_for_status().await
    }

    /// Run a logs/attach style request and decode its output according to
    /// the container's TTY setting.
    ///
    /// The TTY flag is not visible on the response itself, so the container
    /// is inspected first.
    pub(crate) async fn container_output(
        &self,
        container: &str,
        request: ApiRequest,
        stream: bool,
    ) -> Result<ContainerOutput> {
        let tty = self.inspect_container(container).await?.config.tty;

        if stream {
            let response = self.send(request, None).await?;
            return decode::resolve_tty(response, true, tty).await;
        }

        with_timeout(self.inner.default_timeout, async {
            let response = self.send(request, None).await?;
            decode::resolve_tty(response, false, tty).await
        })
        .await
    }

    /// Fail unless the configured API version is at least `minimum`.
    pub(crate) fn require_version(&self, operation: &'static str, minimum: &'static str) -> Result<()> {
        if version_lt(&self.inner.version, minimum) {
            return Err(Error::UnsupportedVersion {
                operation,
                minimum,
                current: self.inner.version.clone(),
            });
        }
        Ok(())
    }
}

async fn with_timeout<T, F>(timeout: Option<Duration>, fut: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match timeout {
        Some(t) => tokio::time::timeout(t, fut)
            .await
            .map_err(|_elapsed| Error::Timeout { timeout: t })?,
        None => fut.await,
    }
}

fn parse_version(version: &str) -> Result<(u32, u32)> {
    let invalid = || Error::endpoint(format!("invalid API version '{version}'"));
    let (major, minor) = version.split_once('.').ok_or_else(invalid)?;
    let major = major.parse::<u32>().map_err(|_| invalid())?;
    let minor = minor.parse::<u32>().map_err(|_| invalid())?;
    Ok((major, minor))
}

/// `a < b`; unparseable versions compare as `0.0`.
fn version_lt(a: &str, b: &str) -> bool {
    let a = parse_version(a).unwrap_or((0, 0));
    let b = parse_version(b).unwrap_or((0, 0));
    a < b
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoints_parse() -> Result<()> {
        assert_eq!(
            "unix:///var/run/docker.sock".parse::<Endpoint>()?,
            Endpoint::unix("/var/run/docker.sock")
        );
        assert_eq!("/tmp/e.sock".parse::<Endpoint>()?, Endpoint::unix("/tmp/e.sock"));
        assert_eq!(
            "tcp://127.0.0.1:2375".parse::<Endpoint>()?,
            Endpoint::tcp("127.0.0.1", 2375)
        );
        assert_eq!(
            "http://[::1]:2375/".parse::<Endpoint>()?,
            Endpoint::tcp("::1", 2375)
        );
        Ok(())
    }

    #[test]
    fn bad_endpoints_are_rejected() {
        for s in ["tcp://host", "tcp://:1", "https://h:1", "ftp://x", "localhost", "unix://"] {
            let err = s.parse::<Endpoint>().expect_err(s);
            assert_eq!(err.kind(), crate::error::ErrorKind::Config, "{s}");
        }
    }

    #[test]
    fn endpoint_display_round_trips() -> Result<()> {
        for e in [Endpoint::unix("/a/b.sock"), Endpoint::tcp("h", 1)] {
            assert_eq!(e.to_string().parse::<Endpoint>()?, e);
        }
        Ok(())
    }

    #[test]
    fn versions_compare_numerically() {
        assert!(version_lt("1.9", "1.21"));
        assert!(!version_lt("1.26", "1.21"));
        assert!(!version_lt("1.21", "1.21"));
        assert!(version_lt("1.41", "2.0"));
        assert!(parse_version("1").is_err());
        assert!(parse_version("1.x").is_err());
    }
}
