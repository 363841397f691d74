//! Scripted engine for tests.
//!
//! [`MockTransport`] answers requests in memory and counts how many response
//! bodies were released. [`MockServer`] serves the same script over real
//! HTTP on a TCP or Unix socket.
//!
//! It is gated behind `cfg(test)` or the `mock` Cargo feature.

use std::{
    collections::{HashMap, VecDeque},
    convert::Infallible,
    pin::Pin,
    sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
    },
    task::{Context, Poll},
};

#[cfg(unix)]
use std::path::Path;

use bytes::{BufMut, Bytes, BytesMut};
use futures_core::Stream;
use http::{HeaderMap, HeaderValue, Method, StatusCode, header};
use http_body_util::{BodyExt, StreamBody, combinators::BoxBody};
use hyper::{body::Frame as BodyFrame, server::conn::http1, service::service_fn};
use hyper_util::rt::TokioIo;
use tokio::{
    net::TcpListener,
    sync::{mpsc, oneshot},
};

#[cfg(unix)]
use tokio::net::UnixListener;

use crate::{
    client::Endpoint,
    decode::{HEADER_LEN, StreamTag},
    error::{Error, Result},
    response::{Body, Response},
    transport::{ApiRequest, Transport, TransportFuture},
};

/// Encode one multiplexed frame.
///
/// # Panics
///
/// If `payload` is longer than `u32::MAX` bytes, which the header cannot
/// express.
#[must_use]
pub fn frame(tag: StreamTag, payload: &[u8]) -> Bytes {
    let length = u32::try_from(payload.len()).expect("frame payload longer than u32::MAX");
    let mut buf = BytesMut::with_capacity(HEADER_LEN + payload.len());
    buf.put_u8(tag.into());
    buf.put_bytes(0, 3);
    buf.put_u32(length);
    buf.put_slice(payload);
    buf.freeze()
}

/// How a route is answered.
#[derive(Debug, Clone)]
pub struct MockReply {
    /// Status code.
    pub status: StatusCode,
    /// `Content-Type` header, if any.
    pub content_type: Option<&'static str>,
    /// Body, delivered chunk by chunk.
    pub chunks: Vec<Bytes>,
    /// Keep the body open after the last chunk, like a followed log.
    pub hold_open: bool,
}

impl MockReply {
    /// A reply with the given status and an empty body.
    #[must_use]
    pub fn status(status: StatusCode) -> Self {
        Self {
            status,
            content_type: None,
            chunks: Vec::new(),
            hold_open: false,
        }
    }

    /// A `200` JSON reply.
    #[must_use]
    pub fn json(value: &serde_json::Value) -> Self {
        Self::status(StatusCode::OK)
            .content_type("application/json")
            .chunk(value.to_string())
    }

    /// An error reply carrying `{"message": ...}`.
    #[must_use]
    pub fn error(status: StatusCode, message: &str) -> Self {
        Self::status(status)
            .content_type("application/json")
            .chunk(serde_json::json!({ "message": message }).to_string())
    }

    /// Set the content type.
    #[must_use]
    pub fn content_type(mut self, content_type: &'static str) -> Self {
        self.content_type = Some(content_type);
        self
    }

    /// Append a body chunk.
    #[must_use]
    pub fn chunk(mut self, chunk: impl Into<Bytes>) -> Self {
        self.chunks.push(chunk.into());
        self
    }

    /// Never end the body.
    #[must_use]
    pub fn hold_open(mut self) -> Self {
        self.hold_open = true;
        self
    }

    fn headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        if let Some(ct) = self.content_type {
            headers.insert(header::CONTENT_TYPE, HeaderValue::from_static(ct));
        }
        headers
    }
}

/// Routes keyed by method and path.
///
/// Paths are matched without the query string and without the `/v<version>`
/// prefix, so `/containers/abc/json` matches `/v1.26/containers/abc/json`.
#[derive(Debug, Clone, Default)]
pub struct MockScript {
    routes: HashMap<(Method, String), MockReply>,
}

impl MockScript {
    /// An empty script; every request gets a `404`.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer `method path` with `reply`.
    #[must_use]
    pub fn route(mut self, method: Method, path: impl Into<String>, reply: MockReply) -> Self {
        self.routes.insert((method, path.into()), reply);
        self
    }

    /// Answer `GET /containers/{id}/json` with a minimal inspect document.
    #[must_use]
    pub fn container(self, id: &str, tty: bool) -> Self {
        let doc = serde_json::json!({
            "Id": id,
            "Name": format!("/{id}"),
            "Config": { "Tty": tty, "Image": "busybox" },
            "State": { "Status": "running", "Running": true, "ExitCode": 0 },
        });
        self.route(
            Method::GET,
            format!("/containers/{id}/json"),
            MockReply::json(&doc),
        )
    }

    /// Reply for a request, `404` when no route matches.
    #[must_use]
    pub fn reply_for(&self, method: &Method, path_and_query: &str) -> MockReply {
        let path = route_path(path_and_query);
        self.routes
            .get(&(method.clone(), path.to_string()))
            .cloned()
            .unwrap_or_else(|| {
                MockReply::error(
                    StatusCode::NOT_FOUND,
                    &format!("page not found: {method} {path}"),
                )
            })
    }
}

/// Strip the query and a leading `/v1.23` style prefix.
fn route_path(path_and_query: &str) -> &str {
    let path = path_and_query
        .split_once('?')
        .map_or(path_and_query, |(path, _)| path);

    if let Some(rest) = path.strip_prefix("/v") {
        let end = rest.find('/').unwrap_or(rest.len());
        let (version, tail) = rest.split_at(end);
        if !version.is_empty() && version.chars().all(|c| c.is_ascii_digit() || c == '.') {
            return if tail.is_empty() { "/" } else { tail };
        }
    }
    path
}

/// In-memory transport answering from a [`MockScript`].
#[derive(Debug)]
pub struct MockTransport {
    script: MockScript,
    requests: Mutex<Vec<ApiRequest>>,
    issued: AtomicUsize,
    released: Arc<AtomicUsize>,
}

impl MockTransport {
    /// Transport serving `script`.
    #[must_use]
    pub fn new(script: MockScript) -> Self {
        Self {
            script,
            requests: Mutex::new(Vec::new()),
            issued: AtomicUsize::new(0),
            released: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Requests seen so far, in order.
    #[must_use]
    pub fn requests(&self) -> Vec<ApiRequest> {
        self.requests
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Number of response bodies handed out.
    #[must_use]
    pub fn issued(&self) -> usize {
        self.issued.load(Ordering::SeqCst)
    }

    /// Number of response bodies dropped.
    #[must_use]
    pub fn released(&self) -> usize {
        self.released.load(Ordering::SeqCst)
    }
}

impl Transport for MockTransport {
    fn send(&self, request: ApiRequest) -> TransportFuture<'_> {
        let reply = self.script.reply_for(&request.method, &request.path_and_query);
        self.requests
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(request);
        self.issued.fetch_add(1, Ordering::SeqCst);

        let body = ProbedBody {
            chunks: reply.chunks.iter().cloned().collect(),
            hold_open: reply.hold_open,
            released: self.released.clone(),
        };
        let response = Response::new(reply.status, reply.headers(), Body::new(body));
        Box::pin(async move { Ok(response) })
    }
}

/// Body chunks that report their own drop.
struct ProbedBody {
    chunks: VecDeque<Bytes>,
    hold_open: bool,
    released: Arc<AtomicUsize>,
}

impl Stream for ProbedBody {
    type Item = Result<Bytes>;

    fn poll_next(mut self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        match self.chunks.pop_front() {
            Some(chunk) => Poll::Ready(Some(Ok(chunk))),
            None if self.hold_open => Poll::Pending,
            None => Poll::Ready(None),
        }
    }
}

impl Drop for ProbedBody {
    fn drop(&mut self) {
        self.released.fetch_add(1, Ordering::SeqCst);
    }
}

/// A running HTTP mock engine.
#[derive(Debug, Clone)]
pub struct MockServer {
    inner: Arc<Inner>,
}

#[derive(Debug)]
struct Inner {
    endpoint: Endpoint,
    requests: Arc<Mutex<Vec<String>>>,
    shutdown_tx: mpsc::Sender<()>,
    done_rx: tokio::sync::Mutex<Option<oneshot::Receiver<()>>>,
}

impl MockServer {
    /// Start a TCP mock server on 127.0.0.1:0 (ephemeral port).
    pub async fn start_tcp(script: MockScript) -> Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .map_err(Error::from)?;
        let addr = listener.local_addr().map_err(Error::from)?;
        let endpoint = Endpoint::tcp(addr.ip().to_string(), addr.port());

        let requests = Arc::new(Mutex::new(Vec::new()));
        let (shutdown_tx, mut shutdown_rx) = mpsc::channel::<()>(1);
        let (done_tx, done_rx) = oneshot::channel();

        let log = requests.clone();
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    accepted = listener.accept() => match accepted {
                        Ok((stream, _peer)) => {
                            tokio::spawn(serve(stream, script.clone(), log.clone()));
                        }
                        Err(_e) => break,
                    },
                    _ = shutdown_rx.recv() => break,
                }
            }
            let _ = done_tx.send(());
        });

        Ok(Self::from_parts(endpoint, requests, shutdown_tx, done_rx))
    }

    /// Start a Unix mock server at the given path.
    #[cfg(unix)]
    pub async fn start_unix(path: impl AsRef<Path>, script: MockScript) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        // Best effort cleanup.
        let _ = std::fs::remove_file(&path);

        let listener = UnixListener::bind(&path).map_err(Error::from)?;
        let endpoint = Endpoint::unix(path);

        let requests = Arc::new(Mutex::new(Vec::new()));
        let (shutdown_tx, mut shutdown_rx) = mpsc::channel::<()>(1);
        let (done_tx, done_rx) = oneshot::channel();

        let log = requests.clone();
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    accepted = listener.accept() => match accepted {
                        Ok((stream, _addr)) => {
                            tokio::spawn(serve(stream, script.clone(), log.clone()));
                        }
                        Err(_e) => break,
                    },
                    _ = shutdown_rx.recv() => break,
                }
            }
            let _ = done_tx.send(());
        });

        Ok(Self::from_parts(endpoint, requests, shutdown_tx, done_rx))
    }

    fn from_parts(
        endpoint: Endpoint,
        requests: Arc<Mutex<Vec<String>>>,
        shutdown_tx: mpsc::Sender<()>,
        done_rx: oneshot::Receiver<()>,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                endpoint,
                requests,
                shutdown_tx,
                done_rx: tokio::sync::Mutex::new(Some(done_rx)),
            }),
        }
    }

    /// Endpoint clients should connect to.
    #[must_use]
    pub fn endpoint(&self) -> Endpoint {
        self.inner.endpoint.clone()
    }

    /// `METHOD path?query` of every request served so far.
    #[must_use]
    pub fn requests(&self) -> Vec<String> {
        self.inner
            .requests
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Stop accepting connections and wait for the accept loop to exit.
    pub async fn shutdown(&self) {
        let _ = self.inner.shutdown_tx.send(()).await;
        let mut rx = self.inner.done_rx.lock().await;
        if let Some(done) = rx.take() {
            let _ = done.await;
        }
    }
}

async fn serve<S>(stream: S, script: MockScript, log: Arc<Mutex<Vec<String>>>)
where
    S: tokio::io::AsyncRead + tokio::io::AsyncWrite + Unpin + Send + 'static,
{
    let service = service_fn(move |req: http::Request<hyper::body::Incoming>| {
        let path_and_query = req
            .uri()
            .path_and_query()
            .map_or_else(|| req.uri().path().to_string(), |pq| pq.as_str().to_string());
        log.lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(format!("{} {path_and_query}", req.method()));

        let reply = script.reply_for(req.method(), &path_and_query);
        async move { Ok::<_, Infallible>(into_http(reply)) }
    });

    if let Err(_e) = http1::Builder::new()
        .serve_connection(TokioIo::new(stream), service)
        .await
    {
        #[cfg(feature = "tracing")]
        tracing::debug!(error = %_e, "mock connection ended");
    }
}

fn into_http(reply: MockReply) -> http::Response<BoxBody<Bytes, Infallible>> {
    let headers = reply.headers();
    let frames = tokio_stream::iter(
        reply
            .chunks
            .into_iter()
            .map(|c| Ok::<_, Infallible>(BodyFrame::data(c))),
    );

    let body = if reply.hold_open {
        use tokio_stream::StreamExt;
        StreamBody::new(frames.chain(tokio_stream::pending())).boxed()
    } else {
        StreamBody::new(frames).boxed()
    };

    let mut response = http::Response::new(body);
    *response.status_mut() = reply.status;
    *response.headers_mut() = headers;
    response
}
