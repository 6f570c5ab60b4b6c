use crate::ingest::{DocumentKind, Ingested, LogEntry, Source, ingest, render_report};
use crate::merge::Granularity;
use crate::position::{Position, distance_between, gradient};
use crate::{Error, Result};
use std::ops::Index;
use std::path::Path;

/// A planned route: an immutable, non-empty sequence of named stops.
///
/// No two consecutive stops are the same location under the route's granularity.
/// Lengths are in metres, gradients in degrees.
#[derive(Debug, Clone)]
pub struct Route {
    kind: DocumentKind,
    name: Option<String>,
    positions: Vec<Position>,
    names: Vec<String>,
    length: f64,
    granularity: Granularity,
    log: Vec<LogEntry>,
}

impl Route {
    /// Reads the `<rte>` of a GPX document, merging consecutive points closer than
    /// `granularity` metres.
    pub fn new(source: Source<'_>, granularity: f64) -> Result<Self> {
        let granularity = Granularity::new(granularity)?;
        let ingested = ingest(source, DocumentKind::Route, granularity)?;
        Ok(Self::from_ingested(DocumentKind::Route, granularity, ingested))
    }

    pub fn from_text(gpx: &str, granularity: f64) -> Result<Self> {
        Self::new(Source::Text(gpx), granularity)
    }

    pub fn from_path(path: impl AsRef<Path>, granularity: f64) -> Result<Self> {
        Self::new(Source::Path(path.as_ref()), granularity)
    }

    pub(crate) fn from_ingested(
        kind: DocumentKind,
        granularity: Granularity,
        ingested: Ingested,
    ) -> Self {
        Self {
            kind,
            name: ingested.name,
            positions: ingested.positions,
            names: ingested.names,
            length: ingested.length,
            granularity,
            log: ingested.log,
        }
    }

    /// The document name, or a placeholder when the source has none.
    pub fn name(&self) -> &str {
        self.name.as_deref().unwrap_or(self.kind.unnamed())
    }

    pub fn num_positions(&self) -> usize {
        self.positions.len()
    }

    pub fn positions(&self) -> &[Position] {
        &self.positions
    }

    pub fn get(&self, index: usize) -> Option<&Position> {
        self.positions.get(index)
    }

    /// Name of the stop at `index`; empty when the source gave it none.
    pub fn name_at(&self, index: usize) -> Option<&str> {
        self.names.get(index).map(String::as_str)
    }

    pub fn granularity(&self) -> f64 {
        self.granularity.metres()
    }

    /// Sum of the 3-D segment lengths between consecutive stops. Computed once
    /// during ingestion.
    pub fn total_length(&self) -> f64 {
        self.length
    }

    /// Surface distance from the first stop to the last, or 0 when they are the
    /// same location.
    pub fn net_length(&self) -> f64 {
        let (first, last) = self.ends();
        if self.granularity.same_location(first, last) {
            return 0.0;
        }
        distance_between(first, last)
    }

    /// Sum of the climbs between consecutive stops; descents count for nothing.
    pub fn total_height_gain(&self) -> f64 {
        self.positions
            .windows(2)
            .map(|pair| (pair[1].elevation() - pair[0].elevation()).max(0.0))
            .sum()
    }

    pub fn net_height_gain(&self) -> f64 {
        let (first, last) = self.ends();
        (last.elevation() - first.elevation()).max(0.0)
    }

    pub fn min_latitude(&self) -> f64 {
        self.fold_positions(Position::latitude, f64::min)
    }

    pub fn max_latitude(&self) -> f64 {
        self.fold_positions(Position::latitude, f64::max)
    }

    pub fn min_longitude(&self) -> f64 {
        self.fold_positions(Position::longitude, f64::min)
    }

    pub fn max_longitude(&self) -> f64 {
        self.fold_positions(Position::longitude, f64::max)
    }

    pub fn min_elevation(&self) -> f64 {
        self.fold_positions(Position::elevation, f64::min)
    }

    pub fn max_elevation(&self) -> f64 {
        self.fold_positions(Position::elevation, f64::max)
    }

    /// Steepest climb between consecutive stops (signed), 0 for a single stop.
    pub fn max_gradient(&self) -> f64 {
        self.gradients().reduce(f64::max).unwrap_or(0.0)
    }

    /// Steepest descent between consecutive stops (signed, so usually negative),
    /// 0 for a single stop.
    pub fn min_gradient(&self) -> f64 {
        self.gradients().reduce(f64::min).unwrap_or(0.0)
    }

    /// Largest absolute gradient, whether up or down.
    pub fn steepest_gradient(&self) -> f64 {
        self.gradients().map(f64::abs).reduce(f64::max).unwrap_or(0.0)
    }

    /// First stop carrying exactly this name.
    pub fn find_position(&self, name: &str) -> Result<Position> {
        self.names
            .iter()
            .position(|n| n == name)
            .map(|index| self.positions[index])
            .ok_or_else(|| Error::NotFound(format!("no position named '{name}'")))
    }

    /// Name of the first stop that is the same location as `position`.
    pub fn find_name_of(&self, position: &Position) -> Result<&str> {
        self.positions
            .iter()
            .position(|p| self.granularity.same_location(p, position))
            .map(|index| self.names[index].as_str())
            .ok_or_else(|| Error::NotFound(format!("no position at {position}")))
    }

    /// Number of stops that are the same location as `position`.
    pub fn times_visited(&self, position: &Position) -> usize {
        self.positions
            .iter()
            .filter(|p| self.granularity.same_location(p, position))
            .count()
    }

    /// Number of stops at the location of the first stop named `name`; 0 when no
    /// stop has that name.
    pub fn times_visited_named(&self, name: &str) -> usize {
        match self.find_position(name) {
            Ok(position) => self.times_visited(&position),
            Err(_) => 0,
        }
    }

    pub fn log(&self) -> &[LogEntry] {
        &self.log
    }

    /// The ingestion log, one line per entry.
    pub fn build_report(&self) -> String {
        render_report(&self.log)
    }

    fn ends(&self) -> (&Position, &Position) {
        // Ingestion never produces an empty sequence.
        let first = &self.positions[0];
        let last = &self.positions[self.positions.len() - 1];
        (first, last)
    }

    fn fold_positions(&self, field: fn(&Position) -> f64, pick: fn(f64, f64) -> f64) -> f64 {
        self.positions
            .iter()
            .map(field)
            .reduce(pick)
            .unwrap_or_default()
    }

    fn gradients(&self) -> impl Iterator<Item = f64> + '_ {
        self.positions
            .windows(2)
            .map(|pair| gradient(&pair[0], &pair[1]))
    }
}

impl Index<usize> for Route {
    type Output = Position;

    fn index(&self, index: usize) -> &Position {
        &self.positions[index]
    }
}
