//! Statistics over GPX routes and tracks.
//!
//! A [`Route`] or [`Track`] is built once from GPX text (or a file path) with a
//! fixed granularity. Consecutive way-points closer than the granularity are
//! merged into a single stop while ingesting; every metric is then a read over
//! the resulting immutable sequence.

pub mod gpxxml;
pub mod ingest;
pub mod merge;
pub mod position;
pub mod route;
pub mod track;

pub use ingest::{LogEntry, Source};
pub use merge::Granularity;
pub use position::{EARTH_RADIUS, Position, distance_between};
pub use route::Route;
pub use track::Track;

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("error opening source file '{}': {source}", .path.display())]
    SourceUnavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("error at position {position}: {source}")]
    Xml {
        position: u64,
        #[source]
        source: quick_xml::Error,
    },

    #[error("malformed document: {0}")]
    MalformedDocument(String),

    #[error("invalid granularity: {0} (must be a finite, non-negative number of metres)")]
    InvalidGranularity(f64),

    #[error("not found: {0}")]
    NotFound(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub(crate) fn missing_element(name: &str) -> Self {
        Error::MalformedDocument(format!("no '{name}' element"))
    }

    pub(crate) fn missing_attribute(name: &str) -> Self {
        Error::MalformedDocument(format!("no '{name}' attribute"))
    }
}
