//! Resolve US city/state pairs and zip codes to coordinates.
//!
//! ```no_run
//! use geoloc_util::config::Config;
//! use geoloc_util::location::{BatchResolver, GeocodeClient};
//!
//! let config = Config::from_env()?;
//! let mut resolver = BatchResolver::new(GeocodeClient::from_config(&config));
//! let entries = resolver.resolve_all(&["Madison, WI", "10001"])?;
//! for fault in resolver.faults() {
//!     eprintln!("{}", fault.message);
//! }
//! println!("{}", geoloc_util::output::render_json(&entries, false)?);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod config;
pub mod location;
pub mod logging;
pub mod output;
