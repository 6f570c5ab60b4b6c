use crate::ingest::{DocumentKind, Source, ingest};
use crate::merge::Granularity;
use crate::position::{Position, path_length};
use crate::route::Route;
use crate::Result;
use std::ops::Deref;
use std::path::Path;
use tracing::warn;

/// A recorded track: a [`Route`] whose stops also carry arrival and departure
/// times, in seconds since the first timestamp of the recording.
///
/// Every route metric is available through `Deref`. Speeds are in metres per
/// second.
#[derive(Debug, Clone)]
pub struct Track {
    route: Route,
    arrived: Vec<i64>,
    departed: Vec<i64>,
}

impl Track {
    /// Reads every `<trkseg>` of the `<trk>` of a GPX document as one stream of
    /// points, merging consecutive points closer than `granularity` metres.
    pub fn new(source: Source<'_>, granularity: f64) -> Result<Self> {
        let granularity = Granularity::new(granularity)?;
        let mut ingested = ingest(source, DocumentKind::Track, granularity)?;
        let arrived = std::mem::take(&mut ingested.arrived);
        let departed = std::mem::take(&mut ingested.departed);
        Ok(Self {
            route: Route::from_ingested(DocumentKind::Track, granularity, ingested),
            arrived,
            departed,
        })
    }

    pub fn from_text(gpx: &str, granularity: f64) -> Result<Self> {
        Self::new(Source::Text(gpx), granularity)
    }

    pub fn from_path(path: impl AsRef<Path>, granularity: f64) -> Result<Self> {
        Self::new(Source::Path(path.as_ref()), granularity)
    }

    pub fn route(&self) -> &Route {
        &self.route
    }

    pub fn arrived(&self, index: usize) -> Option<i64> {
        self.arrived.get(index).copied()
    }

    pub fn departed(&self, index: usize) -> Option<i64> {
        self.departed.get(index).copied()
    }

    /// Seconds from the first timestamp to the last.
    pub fn total_time(&self) -> i64 {
        self.departed.last().copied().unwrap_or_default()
    }

    /// Seconds spent dwelling at stops.
    pub fn resting_time(&self) -> i64 {
        self.arrived
            .iter()
            .zip(&self.departed)
            .map(|(arrived, departed)| departed - arrived)
            .sum()
    }

    pub fn travelling_time(&self) -> i64 {
        self.total_time() - self.resting_time()
    }

    /// Fastest leg between consecutive stops, over the 3-D leg length.
    pub fn max_speed(&self) -> f64 {
        self.legs()
            .map(|(from, to, seconds)| path_length(from, to) / seconds)
            .fold(0.0, f64::max)
    }

    /// Total length over total time (`include_rests`) or over travelling time.
    /// 0 when no time has passed.
    pub fn average_speed(&self, include_rests: bool) -> f64 {
        let seconds = if include_rests {
            self.total_time()
        } else {
            self.travelling_time()
        };
        if seconds == 0 {
            return 0.0;
        }
        self.total_length() / seconds as f64
    }

    /// Fastest climb between consecutive stops in metres per second; legs that
    /// descend count as 0.
    pub fn max_rate_of_ascent(&self) -> f64 {
        self.legs()
            .map(|(from, to, seconds)| (to.elevation() - from.elevation()) / seconds)
            .fold(0.0, f64::max)
    }

    /// Fastest descent between consecutive stops in metres per second; legs that
    /// climb count as 0.
    pub fn max_rate_of_descent(&self) -> f64 {
        self.legs()
            .map(|(from, to, seconds)| (from.elevation() - to.elevation()) / seconds)
            .fold(0.0, f64::max)
    }

    /// Consecutive stops with the seconds spent moving between them. Legs with no
    /// elapsed time are skipped.
    fn legs(&self) -> impl Iterator<Item = (&Position, &Position, f64)> + '_ {
        let positions = self.route.positions();
        (1..positions.len()).filter_map(move |i| {
            let seconds = self.arrived[i] - self.departed[i - 1];
            if seconds <= 0 {
                warn!(
                    "No time elapsed between stops {} and {}, skipping leg",
                    i - 1,
                    i
                );
                return None;
            }
            Some((&positions[i - 1], &positions[i], seconds as f64))
        })
    }
}

impl Deref for Track {
    type Target = Route;

    fn deref(&self) -> &Route {
        &self.route
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;

    fn track(segments: &str, granularity: f64) -> Track {
        let gpx = format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<gpx version="1.1" creator="test"><trk>{segments}</trk></gpx>"#
        );
        Track::from_text(&gpx, granularity).unwrap()
    }

    /// A at t=0, A again at t=5 (merged), C 111km east at t=65.
    fn dwell_then_travel() -> Track {
        track(
            r#"<trkseg>
                 <trkpt lat="0" lon="0"><ele>0</ele><time>0</time></trkpt>
                 <trkpt lat="0" lon="0"><ele>0</ele><time>5</time></trkpt>
                 <trkpt lat="0" lon="1"><ele>0</ele><time>65</time></trkpt>
               </trkseg>"#,
            5.0,
        )
    }

    /// Up 60m in 60s, rest 30s, down 120m in 40s.
    fn climb_and_drop() -> Track {
        track(
            r#"<name>Hill Reps</name>
               <trkseg>
                 <trkpt lat="0" lon="0"><ele>100</ele><time>1000</time></trkpt>
                 <trkpt lat="0" lon="0.001"><ele>160</ele><time>1060</time></trkpt>
                 <trkpt lat="0" lon="0.001"><ele>160</ele><time>1090</time></trkpt>
                 <trkpt lat="0" lon="0.002"><ele>40</ele><time>1130</time></trkpt>
               </trkseg>"#,
            5.0,
        )
    }

    #[test]
    fn test_dwell_scenario_times() {
        let t = dwell_then_travel();
        assert_eq!(t.num_positions(), 2);
        assert_eq!(t.arrived(0), Some(0));
        assert_eq!(t.departed(0), Some(5));
        assert_eq!(t.arrived(1), Some(65));
        assert_eq!(t.total_time(), 65);
        assert_eq!(t.resting_time(), 5);
        assert_eq!(t.travelling_time(), 60);
    }

    #[test]
    fn test_total_time_is_resting_plus_travelling() {
        for t in [dwell_then_travel(), climb_and_drop()] {
            assert_eq!(t.total_time(), t.resting_time() + t.travelling_time());
        }
    }

    #[test]
    fn test_speeds() {
        let t = dwell_then_travel();
        let expected = t.total_length() / 60.0;
        assert!((t.max_speed() - expected).abs() < 1e-9);
        assert!((t.average_speed(false) - expected).abs() < 1e-9);
        assert!((t.average_speed(true) - t.total_length() / 65.0).abs() < 1e-9);
        assert!(t.average_speed(true) < t.average_speed(false));
    }

    #[test]
    fn test_rates_of_ascent_and_descent() {
        let t = climb_and_drop();
        assert_eq!(t.num_positions(), 3);
        assert_eq!(t.resting_time(), 30);
        assert!((t.max_rate_of_ascent() - 1.0).abs() < 1e-9);
        assert!((t.max_rate_of_descent() - 3.0).abs() < 1e-9);
    }

    /// Tests that a track that only descends has a zero rate of ascent.
    #[test]
    fn test_rate_of_ascent_floored_at_zero() {
        let t = track(
            r#"<trkseg>
                 <trkpt lat="0" lon="0"><ele>500</ele><time>0</time></trkpt>
                 <trkpt lat="0" lon="0.01"><ele>400</ele><time>100</time></trkpt>
               </trkseg>"#,
            5.0,
        );
        assert_eq!(t.max_rate_of_ascent(), 0.0);
        assert!((t.max_rate_of_descent() - 1.0).abs() < 1e-9);
    }

    /// Tests that every metric of a single-stop track is zero.
    #[test]
    fn test_single_stop() {
        let t = track(
            r#"<trkseg>
                 <trkpt lat="0" lon="0"><time>0</time><name>Bench</name></trkpt>
                 <trkpt lat="0" lon="0"><time>600</time></trkpt>
               </trkseg>"#,
            5.0,
        );
        assert_eq!(t.num_positions(), 1);
        assert_eq!(t.total_time(), 600);
        assert_eq!(t.resting_time(), 600);
        assert_eq!(t.travelling_time(), 0);
        assert_eq!(t.max_speed(), 0.0);
        assert_eq!(t.average_speed(true), 0.0);
        assert_eq!(t.average_speed(false), 0.0);
        assert_eq!(t.max_rate_of_ascent(), 0.0);
        assert_eq!(t.max_rate_of_descent(), 0.0);
        assert_eq!(t.max_gradient(), 0.0);
        assert_eq!(t.find_position("Bench").unwrap(), t[0]);
    }

    /// Tests that distinct stops with identical timestamps do not divide by zero.
    #[test]
    fn test_zero_elapsed_leg_is_skipped() {
        let t = track(
            r#"<trkseg>
                 <trkpt lat="0" lon="0"><time>0</time></trkpt>
                 <trkpt lat="0" lon="0.01"><time>0</time></trkpt>
                 <trkpt lat="0" lon="0.02"><time>100</time></trkpt>
               </trkseg>"#,
            5.0,
        );
        assert_eq!(t.num_positions(), 3);
        let speed = t.max_speed();
        assert!(speed.is_finite());
        assert!((speed - path_length(&t[1], &t[2]) / 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_track_name_and_route_metrics() {
        let t = climb_and_drop();
        assert_eq!(t.name(), "Hill Reps");
        assert_eq!(t.total_height_gain(), 60.0);
        assert_eq!(t.max_elevation(), 160.0);
        assert_eq!(t.route().num_positions(), 3);

        let unnamed = dwell_then_travel();
        assert_eq!(unnamed.name(), "Unnamed Track");
    }

    #[test]
    fn test_report_includes_arrival_times() {
        let report = dwell_then_travel().build_report();
        assert!(report.contains("Position ignored:"));
        assert!(report.contains("at time: 65s"));
        assert!(report.ends_with("2 positions added.\n"));
    }

    /// Tests that writing the kept stops back out, with a second point for each
    /// dwell, and reading them again gives the same stops and times.
    #[test]
    fn test_merging_is_idempotent() {
        let first = climb_and_drop();

        let mut points = String::new();
        for i in 0..first.num_positions() {
            let p = &first[i];
            let arrived = first.arrived(i).unwrap();
            let departed = first.departed(i).unwrap();
            let mut times = vec![arrived];
            if departed != arrived {
                times.push(departed);
            }
            for time in times {
                points.push_str(&format!(
                    r#"<trkpt lat="{}" lon="{}"><ele>{}</ele><time>{time}</time></trkpt>"#,
                    p.latitude(),
                    p.longitude(),
                    p.elevation()
                ));
            }
        }
        let second = track(&format!("<trkseg>{points}</trkseg>"), 5.0);

        assert_eq!(second.positions(), first.positions());
        for i in 0..first.num_positions() {
            assert_eq!(second.arrived(i), first.arrived(i));
            assert_eq!(second.departed(i), first.departed(i));
        }
    }

    #[test]
    fn test_missing_time_fails_construction() {
        let gpx = r#"<gpx><trk><trkseg>
            <trkpt lat="0" lon="0"><time>0</time></trkpt>
            <trkpt lat="0" lon="1"/>
        </trkseg></trk></gpx>"#;
        let result = Track::from_text(gpx, 5.0);
        assert!(matches!(result, Err(Error::MalformedDocument(_))));
    }
}
