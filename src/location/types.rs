//! Core types for the location subsystem.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A classified location descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedQuery {
    /// Five ASCII digits, e.g. "10001".
    PostalCode(String),
    /// "City, ST" or "City ST". The state is kept as written.
    CityState { city: String, state: String },
    Invalid,
}

/// A place returned by the geocoding service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationResult {
    pub name: String,
    pub lat: f64,
    pub lon: f64,
}

/// A successful lookup, paired with the descriptor that produced it.
///
/// Field order is the serialized order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedEntry {
    pub search_term: String,
    pub name: String,
    pub lat: f64,
    pub lon: f64,
}

impl ResolvedEntry {
    pub fn new(search_term: &str, result: LocationResult) -> Self {
        Self {
            search_term: search_term.to_string(),
            name: result.name,
            lat: result.lat,
            lon: result.lon,
        }
    }
}

/// How loudly a message is reported. Only `Error` messages are kept as faults.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Info,
    Warning,
    Error,
}

/// A human-readable fault message kept for the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FaultRecord {
    pub message: String,
    pub severity: Severity,
}

/// Everything that can go wrong while resolving one descriptor.
///
/// `InvalidFormat`, `NotFound` and `Generic` are soft: the batch records them
/// and moves on. Every other variant aborts the batch.
#[derive(Debug, Error)]
pub enum Fault {
    #[error("[SKIPPED] - INVALID FORMAT for `{query}`. Please use `City, ST` or `5 DIGIT ZIP` format.")]
    InvalidFormat { query: String },

    #[error("[NOTFOUND] - `{query}` is not valid or yields no results. Please double check the location and submit it as `City, ST` or `5 DIGIT ZIP` format.")]
    NotFound { query: String },

    #[error("[ERROR] - {status} - {url} - {message} {query}")]
    Generic {
        status: u16,
        url: String,
        message: String,
        query: String,
    },

    #[error("[CONNECTION ERROR] - Unable to connect to {url} within {connect_timeout_secs} second{}.", plural(.connect_timeout_secs))]
    ConnectionFailure { url: String, connect_timeout_secs: u64 },

    #[error("[TIMEOUT ERROR] - Read timeout after {attempts} attempts")]
    Timeout { attempts: u32 },

    #[error("[UNAUTHORIZED ERROR]: {status} - {message}")]
    Unauthorized { status: u16, message: String },

    #[error("[RATE LIMIT ERROR]: Unable to get {query} due to rate limit - {status} - {message}")]
    RateLimited {
        query: String,
        status: u16,
        message: String,
    },

    #[error("[UNHANDLED EXCEPTION] - ({kind}) - {message}")]
    Unhandled { kind: &'static str, message: String },
}

impl Fault {
    /// Whether this fault must abort the rest of the batch.
    pub fn is_fatal(&self) -> bool {
        match self {
            Self::InvalidFormat { .. } | Self::NotFound { .. } | Self::Generic { .. } => false,
            Self::ConnectionFailure { .. }
            | Self::Timeout { .. }
            | Self::Unauthorized { .. }
            | Self::RateLimited { .. }
            | Self::Unhandled { .. } => true,
        }
    }
}

fn plural(n: &u64) -> &'static str {
    if *n == 1 {
        ""
    } else {
        "s"
    }
}
