use std::fmt;

/// Mean Earth radius in meters used for all surface distances (WGS84 mean: 6371008.8m).
pub const EARTH_RADIUS: f64 = 6371000.0;

/// A geodetic point: latitude and longitude in degrees, elevation in metres.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Position {
    lat: f64,
    lon: f64,
    ele: f64,
}

impl Position {
    pub fn new(lat: f64, lon: f64, ele: f64) -> Self {
        Self { lat, lon, ele }
    }

    /// A position at sea level, for sources that carry no elevation.
    pub fn at_sea_level(lat: f64, lon: f64) -> Self {
        Self::new(lat, lon, 0.0)
    }

    pub fn latitude(&self) -> f64 {
        self.lat
    }

    pub fn longitude(&self) -> f64 {
        self.lon
    }

    pub fn elevation(&self) -> f64 {
        self.ele
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "lat {:.6}, lon {:.6}, ele {:.1}m",
            self.lat, self.lon, self.ele
        )
    }
}

/// Calculates the great circle distance in metres between two positions using the
/// haversine formula. Elevation is ignored.
///
/// The result is symmetric, never negative and exactly zero when both coordinate
/// pairs are numerically equal. Near-antipodal inputs stay finite because `a` is
/// clamped into `[0, 1]` before the square roots, but their accuracy is not
/// guaranteed.
///
/// References:
/// - R.W. Sinnott, "Virtues of the Haversine", Sky and Telescope, vol. 68, no. 2, 1984, p. 159
/// - https://www.movable-type.co.uk/scripts/latlong.html
pub fn distance_between(p1: &Position, p2: &Position) -> f64 {
    let lat1_rad = p1.lat.to_radians();
    let lat2_rad = p2.lat.to_radians();
    let delta_lat = (p2.lat - p1.lat).to_radians();
    let delta_lon = (p2.lon - p1.lon).to_radians();

    // a = sin²(Δφ/2) + cos φ1 ⋅ cos φ2 ⋅ sin²(Δλ/2)
    let a = (delta_lat / 2.0).sin().powi(2)
        + lat1_rad.cos() * lat2_rad.cos() * (delta_lon / 2.0).sin().powi(2);
    let a = a.clamp(0.0, 1.0);

    // c = 2 ⋅ atan2(√a, √(1−a))
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS * c
}

/// Length of the straight 3-D segment between two positions: the surface distance
/// combined with the elevation difference.
pub fn path_length(p1: &Position, p2: &Position) -> f64 {
    let delta_h = distance_between(p1, p2);
    let delta_v = p2.ele - p1.ele;
    delta_h.hypot(delta_v)
}

/// Angle of ascent from `p1` to `p2` in degrees, negative for descents.
///
/// Two positions with no horizontal separation give +90° (up), -90° (down) or 0°
/// (identical elevation).
pub fn gradient(p1: &Position, p2: &Position) -> f64 {
    let delta_h = distance_between(p1, p2);
    let delta_v = p2.ele - p1.ele;
    delta_v.atan2(delta_h).to_degrees()
}
