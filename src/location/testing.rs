//! Scripted in-memory transport for unit tests.

use super::transport::{HttpResponse, Transport, TransportError};
use crate::config::Config;
use std::cell::RefCell;
use std::collections::VecDeque;
use std::time::Duration;

pub const TEST_BASE_URL: &str = "http://geo.test/geo/1.0/";

/// A request seen by `ScriptedTransport`.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub url: String,
    pub params: Vec<(String, String)>,
}

impl RecordedRequest {
    pub fn param(&self, key: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// Replays canned replies in order and records every request.
///
/// Panics if asked for more replies than were scripted, so tests also catch
/// requests that should never have been sent.
#[derive(Default)]
pub struct ScriptedTransport {
    replies: RefCell<VecDeque<Result<HttpResponse, TransportError>>>,
    requests: RefCell<Vec<RecordedRequest>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reply(self, status: u16, body: &str) -> Self {
        self.replies.borrow_mut().push_back(Ok(HttpResponse {
            status,
            url: "http://geo.test/geo/1.0/zip".to_string(),
            body: body.to_string(),
        }));
        self
    }

    pub fn fail(self, err: TransportError) -> Self {
        self.replies.borrow_mut().push_back(Err(err));
        self
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.borrow().clone()
    }
}

impl Transport for ScriptedTransport {
    fn get(&self, url: &str, params: &[(&str, String)]) -> Result<HttpResponse, TransportError> {
        self.requests.borrow_mut().push(RecordedRequest {
            url: url.to_string(),
            params: params
                .iter()
                .map(|(k, v)| (k.to_string(), v.clone()))
                .collect(),
        });
        self.replies
            .borrow_mut()
            .pop_front()
            .unwrap_or_else(|| panic!("unexpected request to {url}"))
    }
}

pub fn test_config() -> Config {
    Config {
        api_key: "test-key".to_string(),
        base_url: TEST_BASE_URL.to_string(),
        connect_timeout: Duration::from_secs(5),
        read_timeout: Duration::from_secs(15),
        max_retries: 3,
    }
}
