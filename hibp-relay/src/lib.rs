//! HTTP relay for Have I Been Pwned range queries.
//!
//! Browsers cannot always reach the range API directly, so this relay accepts
//! `GET /range/{prefix}` (and the older `GET /api/breach/{prefix}`) and
//! forwards the 5-character prefix upstream. The body comes back verbatim.
//!
//! The relay only ever sees routing prefixes. There is no authentication, no
//! rate limiting and no caching: every request is a live passthrough.

pub mod error;

use std::convert::Infallible;
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use http::header::{
    ACCESS_CONTROL_ALLOW_METHODS, ACCESS_CONTROL_ALLOW_ORIGIN, ALLOW, CONTENT_TYPE,
};
use http::{HeaderValue, Method, Request, Response, StatusCode};
use http_body_util::Full;
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use tokio::net::{TcpListener, TcpStream};
use tracing::{debug, error, info, warn};

use hibp_range::{RangeQuery, RoutingPrefix};

pub use error::Error;

/// Environment variable name for the relay listen address.
pub const LISTEN_ADDR_ENV: &str = "HIBP_RELAY_ADDR";

/// Environment variable name for the upstream range API base URL.
pub const UPSTREAM_URL_ENV: &str = "HIBP_UPSTREAM_URL";

pub const DEFAULT_LISTEN_ADDR: &str = "127.0.0.1:5000";

/// Plain-text body of every upstream failure response.
pub const UPSTREAM_ERROR_MESSAGE: &str = "Error contacting HIBP API";

const ROUTES: [&str; 2] = ["/range/", "/api/breach/"];

/// Forwards range queries to an upstream [`RangeQuery`].
pub struct Relay<Q> {
    upstream: Q,
}

impl<Q: RangeQuery + Sync> Relay<Q> {
    pub fn new(upstream: Q) -> Self {
        Self { upstream }
    }

    /// Answers one request.
    pub async fn handle(&self, method: &Method, path: &str) -> Response<Full<Bytes>> {
        let Some(raw_prefix) = route(path) else {
            return text(StatusCode::NOT_FOUND, "Not Found");
        };

        if *method == Method::OPTIONS {
            return preflight();
        }
        if *method != Method::GET {
            let mut response = text(StatusCode::METHOD_NOT_ALLOWED, "Method Not Allowed");
            response.headers_mut().insert(ALLOW, HeaderValue::from_static("GET, OPTIONS"));
            return response;
        }

        let prefix = match RoutingPrefix::from_hex(raw_prefix) {
            Ok(prefix) => prefix,
            Err(err) => {
                debug!(error = %err, "rejected range prefix");
                return text(StatusCode::BAD_REQUEST, format!("Invalid prefix: {err}"));
            }
        };

        match self.upstream.range(prefix).await {
            Ok(body) => {
                info!(%prefix, bytes = body.len(), "relayed range");
                text(StatusCode::OK, body)
            }
            Err(err) => {
                error!(%prefix, error = %err, "upstream range query failed");
                text(StatusCode::INTERNAL_SERVER_ERROR, UPSTREAM_ERROR_MESSAGE)
            }
        }
    }
}

/// Pause after a failed accept, so running out of file descriptors does not
/// turn into a busy loop.
const ACCEPT_BACKOFF: Duration = Duration::from_millis(100);

/// Source of incoming connections for [`serve`].
pub trait Accept {
    fn accept(&mut self) -> impl Future<Output = io::Result<(TcpStream, SocketAddr)>> + Send;
}

impl Accept for TcpListener {
    fn accept(&mut self) -> impl Future<Output = io::Result<(TcpStream, SocketAddr)>> + Send {
        TcpListener::accept(self)
    }
}

/// Serves connections forever, one task per connection.
///
/// A failed accept is logged and retried; it never stops the relay.
pub async fn serve<A, Q>(mut listener: A, relay: Arc<Relay<Q>>)
where
    A: Accept,
    Q: RangeQuery + Send + Sync + 'static,
{
    loop {
        let (stream, peer) = match listener.accept().await {
            Ok(conn) => conn,
            Err(err) => {
                warn!(error = %err, "failed to accept connection");
                tokio::time::sleep(ACCEPT_BACKOFF).await;
                continue;
            }
        };
        let io = TokioIo::new(stream);
        let relay = Arc::clone(&relay);

        tokio::spawn(async move {
            let service = service_fn(move |req: Request<Incoming>| {
                let relay = Arc::clone(&relay);
                async move {
                    let response = relay.handle(req.method(), req.uri().path()).await;
                    Ok::<_, Infallible>(response)
                }
            });

            if let Err(err) = http1::Builder::new().serve_connection(io, service).await {
                debug!(%peer, error = %err, "connection closed with error");
            }
        });
    }
}

/// Extracts the raw prefix segment from a relay path.
fn route(path: &str) -> Option<&str> {
    ROUTES
        .iter()
        .find_map(|route| path.strip_prefix(route))
        .filter(|segment| !segment.is_empty() && !segment.contains('/'))
}

fn preflight() -> Response<Full<Bytes>> {
    let mut response = text(StatusCode::NO_CONTENT, Bytes::new());
    response
        .headers_mut()
        .insert(ACCESS_CONTROL_ALLOW_METHODS, HeaderValue::from_static("GET, OPTIONS"));
    response
}

fn text(status: StatusCode, body: impl Into<Bytes>) -> Response<Full<Bytes>> {
    let mut response = Response::new(Full::new(body.into()));
    *response.status_mut() = status;

    let headers = response.headers_mut();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("text/plain; charset=utf-8"));
    headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*"));
    response
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use hibp_range::{BreachMatcher, HttpRangeClient, TransportError};
    use http_body_util::BodyExt;

    use super::*;

    const PASSWORD_RANGE: &str = "1E4C9B93F3F0682250B6CF8331B7EE68FD8:3730471\r\n";

    async fn body_text(response: Response<Full<Bytes>>) -> String {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    fn ok_upstream(prefix: RoutingPrefix) -> impl Future<Output = Result<String, TransportError>> {
        async move {
            assert_eq!(prefix.as_str(), "5BAA6");
            Ok(PASSWORD_RANGE.to_owned())
        }
    }

    #[tokio::test]
    async fn test_relays_body() {
        let relay = Relay::new(ok_upstream);
        let response = relay.handle(&Method::GET, "/range/5BAA6").await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[ACCESS_CONTROL_ALLOW_ORIGIN], "*");
        assert_eq!(body_text(response).await, PASSWORD_RANGE);
    }

    #[tokio::test]
    async fn test_legacy_route_and_lowercase_prefix() {
        let seen = Mutex::new(Vec::new());
        let upstream = |prefix: RoutingPrefix| {
            seen.lock().unwrap().push(prefix);
            async { Ok::<_, TransportError>(String::new()) }
        };
        let relay = Relay::new(upstream);

        let response = relay.handle(&Method::GET, "/api/breach/5baa6").await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(seen.lock().unwrap()[0].as_str(), "5BAA6");
    }

    #[tokio::test]
    async fn test_invalid_prefix_is_bad_request() {
        let relay = Relay::new(ok_upstream);
        for path in ["/range/5BAA", "/range/5BAA61", "/range/XYZ12", "/range/5BAA6%20"] {
            let response = relay.handle(&Method::GET, path).await;
            assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{path}");
        }
    }

    #[tokio::test]
    async fn test_unknown_paths() {
        let relay = Relay::new(ok_upstream);
        for path in ["/", "/range/", "/range/5BAA6/extra", "/other/5BAA6"] {
            let response = relay.handle(&Method::GET, path).await;
            assert_eq!(response.status(), StatusCode::NOT_FOUND, "{path}");
        }
    }

    #[tokio::test]
    async fn test_methods() {
        let relay = Relay::new(ok_upstream);

        let response = relay.handle(&Method::POST, "/range/5BAA6").await;
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(response.headers()[ALLOW], "GET, OPTIONS");

        let response = relay.handle(&Method::OPTIONS, "/range/5BAA6").await;
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        assert_eq!(response.headers()[ACCESS_CONTROL_ALLOW_ORIGIN], "*");
    }

    #[tokio::test]
    async fn test_upstream_failure_is_500() {
        let upstream = |_: RoutingPrefix| async {
            Err::<String, _>(TransportError::Status { status: 503, message: "down".into() })
        };
        let relay = Relay::new(upstream);

        let response = relay.handle(&Method::GET, "/range/5BAA6").await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body_text(response).await, UPSTREAM_ERROR_MESSAGE);
    }

    #[tokio::test]
    async fn test_serve_end_to_end() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(serve(listener, Arc::new(Relay::new(ok_upstream))));

        let client = HttpRangeClient::new(format!("http://{addr}"), Duration::from_secs(5)).unwrap();
        let result = BreachMatcher::new(&client).check_password("password").await.unwrap();
        assert_eq!(result.count, 3730471);
    }

    /// Fails the first `failures` accepts before handing out connections.
    struct FailingAccept {
        listener: TcpListener,
        failures: Arc<AtomicUsize>,
    }

    impl Accept for FailingAccept {
        fn accept(
            &mut self,
        ) -> impl Future<Output = io::Result<(TcpStream, SocketAddr)>> + Send {
            let fail = self
                .failures
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok();
            let listener = &self.listener;
            async move {
                if fail {
                    return Err(io::Error::from_raw_os_error(24));
                }
                listener.accept().await
            }
        }
    }

    #[tokio::test]
    async fn test_serve_survives_accept_errors() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let failures = Arc::new(AtomicUsize::new(3));
        let acceptor = FailingAccept { listener, failures: Arc::clone(&failures) };
        let server = tokio::spawn(serve(acceptor, Arc::new(Relay::new(ok_upstream))));

        let client = HttpRangeClient::new(format!("http://{addr}"), Duration::from_secs(5)).unwrap();
        let result = BreachMatcher::new(&client).check_password("password").await.unwrap();
        assert_eq!(result.count, 3730471);
        assert_eq!(failures.load(Ordering::SeqCst), 0);
        assert!(!server.is_finished());
    }
}
