//! Descriptor classification: zip code, "City, ST", or neither.

use super::types::ParsedQuery;
use regex::Regex;
use std::sync::OnceLock;

fn city_state_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?i)^([a-z\s-]+),?\s+([a-z]{2})$").expect("city/state pattern is valid")
    })
}

/// Classify a raw descriptor.
///
/// Five ASCII digits are a zip code. Anything of the form `City, ST` or
/// `City ST` (letters, spaces and hyphens, then a two-letter state) is a
/// city/state pair. The state is not checked against a list of real states.
pub fn classify(query: &str) -> ParsedQuery {
    let q = query.trim();

    if q.len() == 5 && q.bytes().all(|b| b.is_ascii_digit()) {
        return ParsedQuery::PostalCode(q.to_string());
    }

    match city_state_pattern().captures(q) {
        Some(caps) => ParsedQuery::CityState {
            city: caps[1].trim().to_string(),
            state: caps[2].to_string(),
        },
        None => ParsedQuery::Invalid,
    }
}
