//! Blocking HTTP transport for the geocoding client.
//!
//! Every HTTP status, including 4xx/5xx, comes back as an `HttpResponse`.
//! Only failures below HTTP (connect, read timeout, broken stream) are errors.

use std::io;
use std::time::Duration;

/// A fully read HTTP response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    /// Final URL without its query string (which carries the API key).
    pub url: String,
    pub body: String,
}

/// Failures below the HTTP layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// DNS or TCP connect failed, or the connect timeout elapsed.
    Connect(String),
    /// The read timeout elapsed while waiting for headers or body.
    ReadTimeout,
    Other(String),
}

/// Issues a GET with query parameters.
pub trait Transport {
    fn get(&self, url: &str, params: &[(&str, String)]) -> Result<HttpResponse, TransportError>;
}

impl<T: Transport + ?Sized> Transport for &T {
    fn get(&self, url: &str, params: &[(&str, String)]) -> Result<HttpResponse, TransportError> {
        (**self).get(url, params)
    }
}

/// `ureq` agent with independent connect and read budgets.
pub struct UreqTransport {
    agent: ureq::Agent,
}

impl UreqTransport {
    pub fn new(connect_timeout: Duration, read_timeout: Duration) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout_connect(connect_timeout)
            .timeout_read(read_timeout)
            .user_agent(concat!("geoloc_util/", env!("CARGO_PKG_VERSION")))
            .build();
        Self { agent }
    }
}

impl Transport for UreqTransport {
    fn get(&self, url: &str, params: &[(&str, String)]) -> Result<HttpResponse, TransportError> {
        let mut request = self.agent.get(url);
        for (key, value) in params {
            request = request.query(key, value);
        }

        let response = match request.call() {
            Ok(response) => response,
            Err(ureq::Error::Status(_, response)) => response,
            Err(ureq::Error::Transport(transport)) => return Err(map_transport(&transport)),
        };

        let status = response.status();
        let url = strip_query(response.get_url()).to_string();
        let body = response.into_string().map_err(|e| map_io(&e))?;

        Ok(HttpResponse { status, url, body })
    }
}

fn map_transport(err: &ureq::Transport) -> TransportError {
    match err.kind() {
        ureq::ErrorKind::Dns | ureq::ErrorKind::ConnectionFailed => {
            TransportError::Connect(describe(err))
        }
        ureq::ErrorKind::Io => {
            let timed_out = std::error::Error::source(err)
                .and_then(|source| source.downcast_ref::<io::Error>())
                .is_some_and(is_timeout);
            if timed_out {
                TransportError::ReadTimeout
            } else {
                TransportError::Other(describe(err))
            }
        }
        _ => TransportError::Other(describe(err)),
    }
}

/// Error kind plus cause. `ureq`'s own `Display` carries the full request
/// URL, API key included, so it is never used.
fn describe(err: &ureq::Transport) -> String {
    let cause = std::error::Error::source(err)
        .map(|source| source.to_string())
        .or_else(|| err.message().map(str::to_string));
    match cause {
        Some(cause) => format!("{}: {}", err.kind(), cause),
        None => err.kind().to_string(),
    }
}

fn map_io(err: &io::Error) -> TransportError {
    if is_timeout(err) {
        TransportError::ReadTimeout
    } else {
        TransportError::Other(err.to_string())
    }
}

fn is_timeout(err: &io::Error) -> bool {
    matches!(err.kind(), io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock)
}

fn strip_query(url: &str) -> &str {
    url.split('?').next().unwrap_or(url)
}
