//! HTTP transport.
//!
//! The decoding core only needs "send a request, get a response with a
//! streaming body". [`Transport`] is that seam; [`HttpTransport`] implements
//! it with one HTTP/1.1 connection per request over a Unix or TCP socket.

use std::{fmt, future::Future, pin::Pin};

use bytes::Bytes;
use http::{HeaderMap, HeaderValue, Method, header};
use http_body_util::{BodyStream, Full};
use hyper::client::conn::http1;
use hyper_util::rt::TokioIo;
use serde::Serialize;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio_stream::StreamExt;

use crate::{
    client::Endpoint,
    error::{Error, Result},
    response::{Body, Response},
};

/// Trait object representing an async stream a connection runs over.
pub trait AsyncConnStream: AsyncRead + AsyncWrite + Unpin + Send {}
impl<T> AsyncConnStream for T where T: AsyncRead + AsyncWrite + Unpin + Send {}

/// A connected socket.
///
/// Internally this is a boxed stream so the rest of the crate does not care
/// whether the underlying connection is Unix or TCP.
pub type ConnStream = Box<dyn AsyncConnStream>;

/// Future returned by [`Transport::send`].
pub type TransportFuture<'a> = Pin<Box<dyn Future<Output = Result<Response>> + Send + 'a>>;

/// Something that can carry one API request and hand back its response.
pub trait Transport: Send + Sync + fmt::Debug {
    /// Send `request` and resolve once the response head has arrived.
    ///
    /// The returned body is read lazily; dropping it releases the connection.
    fn send(&self, request: ApiRequest) -> TransportFuture<'_>;
}

/// A request against the engine API.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    /// HTTP method.
    pub method: Method,
    /// Path plus encoded query, e.g. `/v1.26/containers/abc/json`.
    pub path_and_query: String,
    /// Extra request headers.
    pub headers: HeaderMap,
    /// Request body.
    pub body: Option<Bytes>,
}

impl ApiRequest {
    /// A request without body.
    #[must_use]
    pub fn new(method: Method, path_and_query: impl Into<String>) -> Self {
        Self {
            method,
            path_and_query: path_and_query.into(),
            headers: HeaderMap::new(),
            body: None,
        }
    }

    /// Attach a raw body with its content type.
    #[must_use]
    pub fn with_body(mut self, body: impl Into<Bytes>, content_type: &'static str) -> Self {
        self.headers
            .insert(header::CONTENT_TYPE, HeaderValue::from_static(content_type));
        self.body = Some(body.into());
        self
    }

    /// Attach a JSON body.
    pub fn with_json<T: Serialize + ?Sized>(self, value: &T) -> Result<Self> {
        let body = serde_json::to_vec(value).map_err(Error::from)?;
        Ok(self.with_body(body, "application/json"))
    }

    /// Path without the query string.
    #[must_use]
    pub fn path(&self) -> &str {
        self.path_and_query
            .split_once('?')
            .map_or(self.path_and_query.as_str(), |(path, _)| path)
    }
}

/// Connect to an engine endpoint.
pub async fn connect(endpoint: &Endpoint) -> Result<ConnStream> {
    match endpoint {
        #[cfg(unix)]
        Endpoint::Unix { path } => {
            let s = tokio::net::UnixStream::connect(path)
                .await
                .map_err(Error::from)?;
            Ok(Box::new(s))
        }
        #[cfg(not(unix))]
        Endpoint::Unix { .. } => Err(Error::endpoint(
            "unix sockets are not supported on this platform",
        )),
        Endpoint::Tcp { host, port } => {
            let s = tokio::net::TcpStream::connect((host.as_str(), *port))
                .await
                .map_err(Error::from)?;
            // Best effort: disable Nagle for request/response latency.
            let _ = s.set_nodelay(true);
            Ok(Box::new(s))
        }
    }
}

/// HTTP/1.1 transport opening a fresh connection for every request.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    endpoint: Endpoint,
}

impl HttpTransport {
    /// Transport for the given endpoint.
    #[must_use]
    pub fn new(endpoint: Endpoint) -> Self {
        Self { endpoint }
    }

    /// Endpoint requests are sent to.
    #[must_use]
    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    fn host_header(&self) -> Result<HeaderValue> {
        match &self.endpoint {
            Endpoint::Unix { .. } => Ok(HeaderValue::from_static("localhost")),
            Endpoint::Tcp { host, port } => HeaderValue::from_str(&format!("{host}:{port}"))
                .map_err(|e| Error::endpoint(format!("invalid host header: {e}"))),
        }
    }

    async fn round_trip(&self, request: ApiRequest) -> Result<Response> {
        let io = TokioIo::new(connect(&self.endpoint).await?);
        let (mut sender, conn) = http1::handshake(io).await?;

        // The connection task outlives this call: it keeps driving the body
        // until the caller drops it.
        tokio::spawn(async move {
            if let Err(_e) = conn.await {
                #[cfg(feature = "tracing")]
                tracing::debug!(error = %_e, "engine connection ended");
            }
        });

        let mut req = http::Request::builder()
            .method(request.method)
            .uri(request.path_and_query)
            .body(Full::new(request.body.unwrap_or_default()))?;

        let headers = req.headers_mut();
        headers.extend(request.headers);
        headers.insert(header::HOST, self.host_header()?);

        let response = sender.send_request(req).await?;
        let (parts, incoming) = response.into_parts();

        let source = BodyStream::new(incoming).filter_map(|frame| match frame {
            Ok(frame) => frame.into_data().ok().map(Ok),
            Err(e) => Some(Err(Error::from(e))),
        });

        Ok(Response::new(parts.status, parts.headers, Body::new(source)))
    }
}

impl Transport for HttpTransport {
    fn send(&self, request: ApiRequest) -> TransportFuture<'_> {
        Box::pin(self.round_trip(request))
    }
}
