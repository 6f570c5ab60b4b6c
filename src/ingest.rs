//! Turning GPX text into a merged sequence of stops.
//!
//! Way-points are read in document order. Each one is compared with the last
//! point that was kept: if the two are the same location under the document's
//! granularity the new point is dropped (routes) or extends the dwell time of
//! the kept stop (tracks). Every decision is recorded as a [`LogEntry`].

use crate::gpxxml::{Element, parse_document};
use crate::merge::Granularity;
use crate::position::{Position, path_length};
use crate::{Error, Result};
use std::borrow::Cow;
use std::fmt;
use std::path::{Path, PathBuf};
use time::OffsetDateTime;
use tracing::{debug, info};

/// Where the GPX text comes from.
#[derive(Debug, Clone, Copy)]
pub enum Source<'a> {
    /// The GPX markup itself.
    Text(&'a str),
    /// A file to read in full before parsing.
    Path(&'a Path),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Route,
    Track,
}

impl DocumentKind {
    fn container(self) -> &'static str {
        match self {
            DocumentKind::Route => "rte",
            DocumentKind::Track => "trk",
        }
    }

    fn point(self) -> &'static str {
        match self {
            DocumentKind::Route => "rtept",
            DocumentKind::Track => "trkpt",
        }
    }

    pub(crate) fn unnamed(self) -> &'static str {
        match self {
            DocumentKind::Route => "Unnamed Route",
            DocumentKind::Track => "Unnamed Track",
        }
    }
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DocumentKind::Route => f.write_str("Route"),
            DocumentKind::Track => f.write_str("Track"),
        }
    }
}

/// One line of the ingestion log.
#[derive(Debug, Clone, PartialEq)]
pub enum LogEntry {
    SourceOpened { path: PathBuf },
    DocumentName { kind: DocumentKind, name: String },
    /// `elapsed` is the arrival time in seconds since the first timestamp (tracks only).
    PositionAdded { position: Position, elapsed: Option<i64> },
    PositionIgnored { position: Position },
    Summary { added: usize },
}

impl fmt::Display for LogEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogEntry::SourceOpened { path } => {
                write!(f, "Source file '{}' opened okay.", path.display())
            }
            LogEntry::DocumentName { kind, name } => write!(f, "{kind} name is: {name}"),
            LogEntry::PositionAdded {
                position,
                elapsed: Some(elapsed),
            } => write!(f, "Position added: {position} at time: {elapsed}s"),
            LogEntry::PositionAdded {
                position,
                elapsed: None,
            } => write!(f, "Position added: {position}"),
            LogEntry::PositionIgnored { position } => write!(f, "Position ignored: {position}"),
            LogEntry::Summary { added } => write!(f, "{added} positions added."),
        }
    }
}

/// Renders log entries one per line, each terminated by a newline.
pub fn render_report(log: &[LogEntry]) -> String {
    log.iter().map(|entry| format!("{entry}\n")).collect()
}

/// The result of ingesting one document. The per-stop vectors are parallel and
/// never empty.
#[derive(Debug)]
pub(crate) struct Ingested {
    pub name: Option<String>,
    pub positions: Vec<Position>,
    pub names: Vec<String>,
    pub arrived: Vec<i64>,
    pub departed: Vec<i64>,
    pub length: f64,
    pub log: Vec<LogEntry>,
}

pub(crate) fn ingest(
    source: Source<'_>,
    kind: DocumentKind,
    granularity: Granularity,
) -> Result<Ingested> {
    let mut log = Vec::new();

    let text = load(source, &mut log)?;
    let root = parse_document(text.as_bytes())?
        .filter(|root| root.name() == "gpx")
        .ok_or_else(|| Error::missing_element("gpx"))?;

    let container = root
        .child(kind.container())
        .ok_or_else(|| Error::missing_element(kind.container()))?;

    let name = container.child_text("name").map(str::to_string);
    if let Some(name) = &name {
        info!("{kind} name is: {name}");
        log.push(LogEntry::DocumentName {
            kind,
            name: name.clone(),
        });
    }

    // Segment names are dropped here: only the points of each segment are kept.
    let raw_points: Vec<&Element> = match kind {
        DocumentKind::Route => container.children_named("rtept").collect(),
        DocumentKind::Track => container
            .children_named("trkseg")
            .flat_map(|segment| segment.children_named("trkpt"))
            .collect(),
    };
    if raw_points.is_empty() {
        return Err(Error::missing_element(kind.point()));
    }

    let mut builder = StopBuilder::new(kind, granularity, log, raw_points.len());
    for point in raw_points {
        builder.push(point)?;
    }
    Ok(builder.finish(name))
}

fn load<'a>(source: Source<'a>, log: &mut Vec<LogEntry>) -> Result<Cow<'a, str>> {
    match source {
        Source::Text(text) => Ok(Cow::Borrowed(text)),
        Source::Path(path) => {
            let text =
                std::fs::read_to_string(path).map_err(|source| Error::SourceUnavailable {
                    path: path.to_path_buf(),
                    source,
                })?;
            debug!("Source file '{}' opened okay", path.display());
            log.push(LogEntry::SourceOpened {
                path: path.to_path_buf(),
            });
            Ok(Cow::Owned(text))
        }
    }
}

struct StopBuilder {
    kind: DocumentKind,
    granularity: Granularity,
    log: Vec<LogEntry>,
    positions: Vec<Position>,
    names: Vec<String>,
    arrived: Vec<i64>,
    departed: Vec<i64>,
    epoch: Option<i64>,
    last_elapsed: i64,
}

impl StopBuilder {
    fn new(
        kind: DocumentKind,
        granularity: Granularity,
        log: Vec<LogEntry>,
        capacity: usize,
    ) -> Self {
        Self {
            kind,
            granularity,
            log,
            positions: Vec::with_capacity(capacity),
            names: Vec::with_capacity(capacity),
            arrived: Vec::with_capacity(capacity),
            departed: Vec::with_capacity(capacity),
            epoch: None,
            last_elapsed: 0,
        }
    }

    fn push(&mut self, point: &Element) -> Result<()> {
        let position = read_position(point)?;

        let elapsed = match self.kind {
            DocumentKind::Route => None,
            DocumentKind::Track => Some(self.elapsed_since_epoch(point)?),
        };

        // Compare against the last kept stop, not the last raw point.
        let merged = self
            .positions
            .last()
            .is_some_and(|last| self.granularity.same_location(last, &position));

        if merged {
            if let (Some(elapsed), Some(departed)) = (elapsed, self.departed.last_mut()) {
                *departed = elapsed;
            }
            debug!("Position ignored: {position}");
            self.log.push(LogEntry::PositionIgnored { position });
            return Ok(());
        }

        let time = elapsed.unwrap_or(0);
        self.positions.push(position);
        self.names
            .push(point.child_text("name").unwrap_or_default().to_string());
        self.arrived.push(time);
        self.departed.push(time);

        debug!("Position added: {position}");
        self.log.push(LogEntry::PositionAdded { position, elapsed });
        Ok(())
    }

    fn elapsed_since_epoch(&mut self, point: &Element) -> Result<i64> {
        let text = point
            .child_text("time")
            .ok_or_else(|| Error::missing_element("time"))?;
        let timestamp = parse_time(text)?;

        let epoch = *self.epoch.get_or_insert(timestamp);
        let elapsed = timestamp.checked_sub(epoch).ok_or_else(|| {
            Error::MalformedDocument(format!("time '{text}' is out of range"))
        })?;
        if elapsed < self.last_elapsed {
            return Err(Error::MalformedDocument(format!(
                "time '{text}' is earlier than the previous point"
            )));
        }
        self.last_elapsed = elapsed;
        Ok(elapsed)
    }

    fn finish(mut self, name: Option<String>) -> Ingested {
        let added = self.positions.len();
        info!("{added} positions added");
        self.log.push(LogEntry::Summary { added });

        let length = self
            .positions
            .windows(2)
            .map(|pair| path_length(&pair[0], &pair[1]))
            .sum();

        Ingested {
            name,
            positions: self.positions,
            names: self.names,
            arrived: self.arrived,
            departed: self.departed,
            length,
            log: self.log,
        }
    }
}

fn read_position(point: &Element) -> Result<Position> {
    let lat = required_number(point, "lat")?;
    let lon = required_number(point, "lon")?;
    let ele = match point.child_text("ele") {
        Some(text) => parse_number("ele", text)?,
        None => 0.0,
    };
    Ok(Position::new(lat, lon, ele))
}

fn required_number(point: &Element, attribute: &str) -> Result<f64> {
    let text = point
        .attribute(attribute)
        .ok_or_else(|| Error::missing_attribute(attribute))?;
    parse_number(attribute, text.trim())
}

fn parse_number(field: &str, text: &str) -> Result<f64> {
    text.parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
        .ok_or_else(|| Error::MalformedDocument(format!("invalid '{field}' value '{text}'")))
}

/// Parses a point timestamp into absolute seconds.
///
/// An integer count of seconds is taken as-is; otherwise the text must be an
/// ISO 8601 date-time, which is converted to seconds since the Unix epoch.
pub fn parse_time(text: &str) -> Result<i64> {
    if let Ok(seconds) = text.parse::<i64>() {
        return Ok(seconds);
    }

    OffsetDateTime::parse(
        text,
        &time::format_description::well_known::Iso8601::DEFAULT,
    )
    .map(OffsetDateTime::unix_timestamp)
    .map_err(|_| Error::MalformedDocument(format!("invalid 'time' value '{text}'")))
}
