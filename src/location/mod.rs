//! Location resolution subsystem for geoloc_util.
//!
//! Classifies descriptors ("City, ST" or a 5-digit zip), looks them up with
//! the OpenWeather Geocoding API, and resolves whole batches with per-item
//! fault isolation.

pub mod classify;
pub mod client;
pub mod resolver;
pub mod transport;
pub mod types;

#[cfg(test)]
pub(crate) mod testing;

pub use classify::classify;
pub use client::GeocodeClient;
pub use resolver::{BatchResolver, BatchState};
pub use transport::{HttpResponse, Transport, TransportError, UreqTransport};
pub use types::{Fault, FaultRecord, LocationResult, ParsedQuery, ResolvedEntry, Severity};
