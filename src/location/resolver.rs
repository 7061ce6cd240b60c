//! Batch resolver: classify and look up each descriptor in order.
//!
//! Soft faults (bad format, not found, unexpected status) are recorded and the
//! batch moves on. Hard faults stop the batch and are returned to the caller;
//! entries resolved before the abort stay available through `entries()`.

use super::classify::classify;
use super::client::GeocodeClient;
use super::transport::Transport;
use super::types::{Fault, FaultRecord, ParsedQuery, ResolvedEntry, Severity};
use tracing::{debug, info, warn};

/// Everything one `resolve_all` call accumulates.
#[derive(Debug, Default)]
pub struct BatchState {
    entries: Vec<ResolvedEntry>,
    faults: Vec<FaultRecord>,
    current: Option<String>,
}

impl BatchState {
    /// Log a message; errors are also kept for the caller. Kept errors are
    /// soft faults and only log at warn.
    fn note(&mut self, severity: Severity, message: String) {
        match severity {
            Severity::Info => info!("{}", message),
            Severity::Warning => warn!("{}", message),
            Severity::Error => {
                warn!("{}", message);
                self.faults.push(FaultRecord { message, severity });
            }
        }
    }

    pub fn entries(&self) -> &[ResolvedEntry] {
        &self.entries
    }

    pub fn faults(&self) -> &[FaultRecord] {
        &self.faults
    }

    /// The descriptor being looked up. After an abort it names the
    /// descriptor that caused it; after a complete batch it is `None`.
    pub fn current(&self) -> Option<&str> {
        self.current.as_deref()
    }
}

/// Resolves batches of descriptors through one geocoding client.
pub struct BatchResolver<T: Transport> {
    client: GeocodeClient<T>,
    state: BatchState,
}

impl<T: Transport> BatchResolver<T> {
    pub fn new(client: GeocodeClient<T>) -> Self {
        Self {
            client,
            state: BatchState::default(),
        }
    }

    /// Resolve every descriptor in order.
    ///
    /// Returns the successful entries in input order. Soft faults are
    /// available from `faults()` afterwards. The first hard fault is returned
    /// as `Err` and no later descriptor is attempted.
    pub fn resolve_all<S: AsRef<str>>(&mut self, queries: &[S]) -> Result<Vec<ResolvedEntry>, Fault> {
        self.state = BatchState::default();
        debug!("processing {} location(s)", queries.len());

        for query in queries {
            let query = query.as_ref();
            self.state.current = Some(query.to_string());
            debug!("getting geoloc data for `{}`...", query);

            let outcome = match classify(query) {
                ParsedQuery::Invalid => Err(Fault::InvalidFormat {
                    query: query.to_string(),
                }),
                parsed => self.client.resolve(&parsed, query),
            };
            match outcome {
                Ok(result) => self.state.entries.push(ResolvedEntry::new(query, result)),
                Err(fault) if fault.is_fatal() => return Err(fault),
                Err(fault) => self.state.note(Severity::Error, fault.to_string()),
            }
        }

        self.state.current = None;
        if !self.state.faults.is_empty() {
            self.state.note(
                Severity::Info,
                format!(
                    "{} of {} location(s) skipped",
                    self.state.faults.len(),
                    queries.len()
                ),
            );
        }
        Ok(self.state.entries.clone())
    }

    /// Soft faults from the last batch, in arrival order.
    pub fn faults(&self) -> &[FaultRecord] {
        self.state.faults()
    }

    /// Entries from the last batch, including those resolved before an abort.
    pub fn entries(&self) -> &[ResolvedEntry] {
        self.state.entries()
    }

    /// Hand over the state of the last batch.
    pub fn into_state(self) -> BatchState {
        self.state
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::location::testing::{test_config, ScriptedTransport};
    use crate::location::transport::TransportError;
    use approx::assert_relative_eq;

    const NEW_YORK_10001: &str = r#"{"zip":"10001","name":"New York","lat":40.7484,"lon":-73.9967,"country":"US"}"#;
    const MADISON_WI: &str = r#"[{"name":"Madison","lat":43.074761,"lon":-89.3837613,"country":"US"}]"#;

    fn resolver(transport: &ScriptedTransport) -> BatchResolver<&ScriptedTransport> {
        BatchResolver::new(GeocodeClient::new(transport, &test_config()))
    }

    #[test]
    fn test_single_zip() {
        let transport = ScriptedTransport::new().reply(200, NEW_YORK_10001);
        let mut resolver = resolver(&transport);

        let entries = resolver.resolve_all(&["10001"]).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].search_term, "10001");
        assert_eq!(entries[0].name, "New York");
        assert_relative_eq!(entries[0].lat, 40.7484);
        assert_relative_eq!(entries[0].lon, -73.9967);
        assert!(resolver.faults().is_empty());
    }

    #[test]
    fn test_not_found_is_recorded() {
        let transport = ScriptedTransport::new().reply(404, "");
        let mut resolver = resolver(&transport);

        let entries = resolver.resolve_all(&["00033"]).unwrap();
        assert!(entries.is_empty());
        assert_eq!(resolver.faults().len(), 1);
        assert_eq!(resolver.faults()[0].severity, Severity::Error);
        assert!(resolver.faults()[0].message.contains("NOTFOUND"));
        assert!(resolver.faults()[0].message.contains("00033"));
    }

    #[test]
    fn test_failure_is_isolated() {
        let transport = ScriptedTransport::new()
            .reply(200, NEW_YORK_10001)
            .reply(200, "[]");
        let mut resolver = resolver(&transport);

        let entries = resolver.resolve_all(&["10001", "faketown, CA"]).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].search_term, "10001");
        assert_eq!(resolver.faults().len(), 1);
        assert!(resolver.faults()[0].message.contains("NOTFOUND"));
        assert!(resolver.faults()[0].message.contains("faketown, CA"));
    }

    #[test]
    fn test_invalid_format_skips_client() {
        let transport = ScriptedTransport::new().reply(200, MADISON_WI);
        let mut resolver = resolver(&transport);

        let entries = resolver.resolve_all(&["InvalidLocation", "Madison, WI"]).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].search_term, "Madison, WI");
        assert_eq!(resolver.faults().len(), 1);
        assert!(resolver.faults()[0].message.contains("INVALID FORMAT"));
        assert!(resolver.faults()[0].message.contains("InvalidLocation"));
        assert_eq!(transport.requests().len(), 1);
    }

    #[test]
    fn test_order_preserved_and_exclusive() {
        let transport = ScriptedTransport::new()
            .reply(200, MADISON_WI)
            .reply(404, "")
            .reply(200, NEW_YORK_10001)
            .reply(500, "Not JSON");
        let mut resolver = resolver(&transport);

        let queries = ["Madison WI", "00033", "faketown", "10001", "00000"];
        let entries = resolver.resolve_all(&queries).unwrap();

        let terms: Vec<&str> = entries.iter().map(|e| e.search_term.as_str()).collect();
        assert_eq!(terms, ["Madison WI", "10001"]);
        assert_eq!(resolver.faults().len(), 3);

        for query in queries {
            let resolved = terms.contains(&query);
            let faulted = resolver
                .faults()
                .iter()
                .any(|f| f.message.contains(query));
            assert!(resolved != faulted, "{query} must be resolved xor faulted");
        }
    }

    #[test]
    fn test_generic_fault_continues() {
        let transport = ScriptedTransport::new()
            .reply(503, r#"{"message":"Service unavailable"}"#)
            .reply(200, NEW_YORK_10001);
        let mut resolver = resolver(&transport);

        let entries = resolver.resolve_all(&["90210", "10001"]).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(resolver.faults().len(), 1);
        assert!(resolver.faults()[0].message.contains("503"));
        assert!(resolver.faults()[0].message.contains("90210"));
    }

    #[test]
    fn test_timeout_aborts_batch() {
        let transport = ScriptedTransport::new()
            .fail(TransportError::ReadTimeout)
            .fail(TransportError::ReadTimeout)
            .fail(TransportError::ReadTimeout)
            .fail(TransportError::ReadTimeout);
        let mut resolver = resolver(&transport);

        let err = resolver.resolve_all(&["90210", "10001"]).unwrap_err();
        assert!(matches!(err, Fault::Timeout { attempts: 4 }));
        // Only the first query's four attempts went out.
        assert_eq!(transport.requests().len(), 4);
        assert!(resolver.entries().is_empty());
        assert!(resolver.faults().is_empty());
    }

    #[test]
    fn test_rate_limit_aborts_batch() {
        let transport = ScriptedTransport::new()
            .reply(200, NEW_YORK_10001)
            .reply(429, r#"{"message":"Rate limit exceeded"}"#);
        let mut resolver = resolver(&transport);

        let err = resolver
            .resolve_all(&["10001", "Chicago, IL", "Madison, WI"])
            .unwrap_err();
        assert!(matches!(err, Fault::RateLimited { ref query, .. } if query == "Chicago, IL"));
        assert!(err.to_string().contains("Chicago, IL"));
        assert_eq!(transport.requests().len(), 2);
        assert_eq!(resolver.entries().len(), 1);
        assert_eq!(resolver.entries()[0].search_term, "10001");
        assert_eq!(resolver.into_state().current(), Some("Chicago, IL"));
    }

    #[test]
    fn test_unauthorized_aborts_batch() {
        let transport = ScriptedTransport::new().reply(401, r#"{"cod":401,"message":"Invalid API key"}"#);
        let mut resolver = resolver(&transport);

        let err = resolver.resolve_all(&["10001", "12345"]).unwrap_err();
        assert_eq!(err.to_string(), "[UNAUTHORIZED ERROR]: 401 - Invalid API key");
        assert_eq!(transport.requests().len(), 1);
    }

    #[test]
    fn test_connection_failure_aborts_batch() {
        let transport =
            ScriptedTransport::new().fail(TransportError::Connect("Connection refused".into()));
        let mut resolver = resolver(&transport);

        let err = resolver.resolve_all(&["faketown", "10001", "12345"]).unwrap_err();
        assert!(matches!(err, Fault::ConnectionFailure { .. }));
        // The invalid descriptor was recorded before the abort.
        assert_eq!(resolver.faults().len(), 1);
        assert_eq!(transport.requests().len(), 1);
    }

    #[test]
    fn test_state_resets_between_batches() {
        let transport = ScriptedTransport::new()
            .reply(404, "")
            .reply(200, NEW_YORK_10001);
        let mut resolver = resolver(&transport);

        resolver.resolve_all(&["00033"]).unwrap();
        assert_eq!(resolver.faults().len(), 1);

        let entries = resolver.resolve_all(&["10001"]).unwrap();
        assert_eq!(entries.len(), 1);
        assert!(resolver.faults().is_empty());
    }

    #[test]
    fn test_into_state() {
        let transport = ScriptedTransport::new().reply(200, NEW_YORK_10001);
        let mut resolver = resolver(&transport);
        resolver.resolve_all(&["10001", "nope"]).unwrap();

        let state = resolver.into_state();
        assert_eq!(state.entries().len(), 1);
        assert_eq!(state.faults().len(), 1);
        assert_eq!(state.current(), None);
    }

    #[test]
    fn test_empty_batch() {
        let transport = ScriptedTransport::new();
        let mut resolver = resolver(&transport);
        let entries = resolver.resolve_all::<&str>(&[]).unwrap();
        assert!(entries.is_empty());
        assert!(resolver.faults().is_empty());
    }
}
