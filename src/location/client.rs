//! OpenWeather geocoding client: request construction, retry on read timeout,
//! and status-code to `Fault` translation.

use super::transport::{HttpResponse, Transport, TransportError, UreqTransport};
use super::types::{Fault, LocationResult, ParsedQuery};
use crate::config::Config;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};

const ZIP_PATH: &str = "zip";
const DIRECT_PATH: &str = "direct";
const COUNTRY_CODE: &str = "US";

/// Looks up one classified descriptor at a time.
pub struct GeocodeClient<T: Transport> {
    transport: T,
    base_url: String,
    api_key: String,
    connect_timeout: Duration,
    max_retries: u32,
}

impl GeocodeClient<UreqTransport> {
    /// Client over a real HTTP agent built from the configured timeouts.
    pub fn from_config(config: &Config) -> Self {
        let transport = UreqTransport::new(config.connect_timeout, config.read_timeout);
        Self::new(transport, config)
    }
}

impl<T: Transport> GeocodeClient<T> {
    pub fn new(transport: T, config: &Config) -> Self {
        Self {
            transport,
            base_url: config.base_url.clone(),
            api_key: config.api_key.clone(),
            connect_timeout: config.connect_timeout,
            max_retries: config.max_retries,
        }
    }

    /// Resolve a classified descriptor to a single place.
    ///
    /// `search_term` is the raw descriptor; it only appears in fault messages.
    pub fn resolve(
        &self,
        parsed: &ParsedQuery,
        search_term: &str,
    ) -> Result<LocationResult, Fault> {
        let (path, lookup) = match parsed {
            ParsedQuery::PostalCode(code) => {
                debug!("using ZIP for {}", code);
                (ZIP_PATH, ("zip", format!("{},{}", code, COUNTRY_CODE)))
            }
            ParsedQuery::CityState { city, state } => {
                debug!("using DIRECT for {}", search_term);
                (
                    DIRECT_PATH,
                    ("q", format!("{},{},{}", city, state, COUNTRY_CODE)),
                )
            }
            ParsedQuery::Invalid => {
                return Err(Fault::InvalidFormat {
                    query: search_term.to_string(),
                })
            }
        };

        let url = format!("{}{}", self.base_url, path);
        let params = [
            lookup,
            ("appid", self.api_key.clone()),
            ("limit", "1".to_string()),
        ];

        let response = self.send(&url, &params)?;
        handle_response(response, search_term)
    }

    /// Send the request, resubmitting immediately after each read timeout.
    fn send(&self, url: &str, params: &[(&str, String)]) -> Result<HttpResponse, Fault> {
        let mut retries_left = self.max_retries;
        loop {
            match self.transport.get(url, params) {
                Ok(response) => return Ok(response),
                Err(TransportError::ReadTimeout) if retries_left > 0 => {
                    warn!("Read timeout. Retrying {} more time(s)...", retries_left);
                    retries_left -= 1;
                }
                Err(TransportError::ReadTimeout) => {
                    return Err(Fault::Timeout {
                        attempts: self.max_retries + 1,
                    })
                }
                Err(TransportError::Connect(reason)) => {
                    debug!(%reason, "connect failed");
                    return Err(Fault::ConnectionFailure {
                        url: url.to_string(),
                        connect_timeout_secs: self.connect_timeout.as_secs(),
                    });
                }
                Err(TransportError::Other(message)) => {
                    return Err(Fault::Unhandled {
                        kind: "Transport",
                        message,
                    })
                }
            }
        }
    }
}

fn handle_response(response: HttpResponse, search_term: &str) -> Result<LocationResult, Fault> {
    match response.status {
        200 => decode_first(&response.body)?.ok_or_else(|| not_found(search_term)),
        404 => Err(not_found(search_term)),
        401 => Err(Fault::Unauthorized {
            status: response.status,
            message: error_message(&response.body),
        }),
        429 => Err(Fault::RateLimited {
            query: search_term.to_string(),
            status: response.status,
            message: error_message(&response.body),
        }),
        status => Err(Fault::Generic {
            status,
            message: error_message(&response.body),
            url: response.url,
            query: search_term.to_string(),
        }),
    }
}

fn not_found(search_term: &str) -> Fault {
    Fault::NotFound {
        query: search_term.to_string(),
    }
}

/// Decode the first place in a 200 body. The body may be a single object or a
/// list; empty text, `null`, `[]` and `{}` mean no result.
fn decode_first(body: &str) -> Result<Option<LocationResult>, Fault> {
    if body.trim().is_empty() {
        return Ok(None);
    }

    let value: Value = serde_json::from_str(body).map_err(decode_fault)?;
    let first = match value {
        Value::Null => return Ok(None),
        Value::Array(items) => match items.into_iter().next() {
            Some(item) => item,
            None => return Ok(None),
        },
        Value::Object(ref fields) if fields.is_empty() => return Ok(None),
        other => other,
    };

    serde_json::from_value(first).map(Some).map_err(decode_fault)
}

fn decode_fault(err: serde_json::Error) -> Fault {
    Fault::Unhandled {
        kind: "Decode",
        message: err.to_string(),
    }
}

/// The server's `message` field, the JSON text without one, or the raw body.
fn error_message(body: &str) -> String {
    match serde_json::from_str::<Value>(body) {
        Ok(Value::Object(fields)) => match fields.get("message") {
            Some(Value::String(message)) => message.clone(),
            Some(other) => other.to_string(),
            None => Value::Object(fields).to_string(),
        },
        Ok(other) => other.to_string(),
        Err(_) => body.to_string(),
    }
}
