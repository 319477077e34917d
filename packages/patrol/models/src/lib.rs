#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Selection policy, candidate, and route path types for patrol planning.
//!
//! Everything here is transient: a candidate set and its route path are
//! recomputed for every planning request and never persisted.

use crime_dashboard_crime_models::{Coordinate, Hotspot};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Default search radius around a station, in kilometers.
pub const DEFAULT_RADIUS_KM: f64 = 20.0;

/// How in-range hotspots are ordered into patrol stops.
///
/// Both orderings are stable: hotspots with equal keys keep the order
/// they were supplied in.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum SelectionPolicy {
    /// Highest severity first.
    #[default]
    SeverityFirst,
    /// Nearest to the station first.
    ProximityFirst,
}

/// Parameters for choosing which hotspots a patrol visits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectorConfig {
    /// Hotspots farther than this from the origin are skipped.
    pub radius_km: f64,
    /// Ordering applied to in-range hotspots.
    pub policy: SelectionPolicy,
    /// Maximum number of stops kept after ordering (`None` = all).
    pub max_stops: Option<usize>,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            radius_km: DEFAULT_RADIUS_KM,
            policy: SelectionPolicy::default(),
            max_stops: None,
        }
    }
}

/// A hotspot chosen as a patrol stop, with its distance from the origin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    /// The hotspot to visit.
    pub hotspot: Hotspot,
    /// Great-circle distance from the patrol origin.
    pub distance_km: f64,
}

/// An ordered, drivable sequence of positions returned by the routing
/// service, already converted to latitude-first coordinates.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoutePath {
    points: Vec<Coordinate>,
}

impl RoutePath {
    /// Wraps an ordered list of positions.
    #[must_use]
    pub const fn new(points: Vec<Coordinate>) -> Self {
        Self { points }
    }

    /// Number of positions in the path.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.points.len()
    }

    /// Whether the path has no positions.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Position at `index`, if any.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<Coordinate> {
        self.points.get(index).copied()
    }

    /// All positions in order.
    #[must_use]
    pub fn points(&self) -> &[Coordinate] {
        &self.points
    }

    /// The path as `[latitude, longitude]` pairs for the map layer.
    #[must_use]
    pub fn to_display(&self) -> Vec<[f64; 2]> {
        self.points.iter().map(|c| c.to_lat_lon()).collect()
    }
}

impl From<Vec<Coordinate>> for RoutePath {
    fn from(points: Vec<Coordinate>) -> Self {
        Self::new(points)
    }
}

/// One emitted step of a route playback.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaybackTick {
    /// Index into the route path.
    pub index: usize,
    /// Position at that index.
    pub position: Coordinate,
    /// Whether this is the final position of the path.
    pub last: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn policy_parses_from_snake_case() {
        assert_eq!(
            "proximity_first".parse::<SelectionPolicy>().unwrap(),
            SelectionPolicy::ProximityFirst
        );
        assert_eq!(SelectionPolicy::SeverityFirst.to_string(), "severity_first");
        assert!("random".parse::<SelectionPolicy>().is_err());
    }

    #[test]
    fn selector_config_fills_missing_fields() {
        let config: SelectorConfig = toml::from_str("policy = \"proximity_first\"").unwrap();
        assert_eq!(config.policy, SelectionPolicy::ProximityFirst);
        assert!((config.radius_km - DEFAULT_RADIUS_KM).abs() < f64::EPSILON);
        assert_eq!(config.max_stops, None);
    }

    #[test]
    fn route_path_display_is_latitude_first() {
        let path = RoutePath::new(vec![
            Coordinate::new(11.0, 77.0),
            Coordinate::new(11.1, 77.1),
        ]);
        assert_eq!(path.to_display(), vec![[11.0, 77.0], [11.1, 77.1]]);
        assert_eq!(path.len(), 2);
        assert_eq!(path.get(2), None);
    }
}
