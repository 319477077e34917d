#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Hotspot, patrol station, and severity types for the crime dashboard.
//!
//! These are the records loaded from the crime database and handed to the
//! patrol planner and the map layers. None of them are mutated after
//! loading; a planning request works on a snapshot.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// A WGS84 position in decimal degrees.
///
/// Internally and on the display side coordinates are always
/// latitude-first. The routing service speaks longitude-first, so use
/// [`Coordinate::to_lon_lat`] and [`Coordinate::from_lon_lat`] at that
/// boundary instead of indexing pairs by hand.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    /// Latitude in degrees.
    pub latitude: f64,
    /// Longitude in degrees.
    pub longitude: f64,
}

impl Coordinate {
    /// Creates a coordinate from a latitude and a longitude.
    #[must_use]
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Returns the `[latitude, longitude]` pair used by the map layers.
    #[must_use]
    pub const fn to_lat_lon(self) -> [f64; 2] {
        [self.latitude, self.longitude]
    }

    /// Returns the `[longitude, latitude]` pair used by `GeoJSON` and the
    /// routing service.
    #[must_use]
    pub const fn to_lon_lat(self) -> [f64; 2] {
        [self.longitude, self.latitude]
    }

    /// Builds a coordinate from a `[longitude, latitude]` pair.
    #[must_use]
    pub const fn from_lon_lat(pair: [f64; 2]) -> Self {
        Self::new(pair[1], pair[0])
    }
}

/// Lowest severity rating a hotspot can carry.
pub const MIN_SEVERITY: u8 = 1;

/// Highest severity rating a hotspot can carry.
pub const MAX_SEVERITY: u8 = 10;

/// Severity rating of a hotspot, from 1 (minor) to 10 (most serious).
///
/// Drives both the map colour of a hotspot and its priority when a
/// patrol route is planned severity-first.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(try_from = "u8", into = "u8")]
pub struct Severity(u8);

impl Severity {
    /// Creates a severity from a numeric rating.
    ///
    /// # Errors
    ///
    /// Returns an error if the value is outside 1-10.
    pub const fn from_value(value: u8) -> Result<Self, InvalidSeverityError> {
        if value >= MIN_SEVERITY && value <= MAX_SEVERITY {
            Ok(Self(value))
        } else {
            Err(InvalidSeverityError { value })
        }
    }

    /// Creates a severity, clamping out-of-range values into 1-10.
    #[must_use]
    pub const fn saturating(value: i64) -> Self {
        if value < MIN_SEVERITY as i64 {
            Self(MIN_SEVERITY)
        } else if value > MAX_SEVERITY as i64 {
            Self(MAX_SEVERITY)
        } else {
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            Self(value as u8)
        }
    }

    /// Returns the numeric rating.
    #[must_use]
    pub const fn value(self) -> u8 {
        self.0
    }

    /// Returns the colour band this rating falls into.
    #[must_use]
    pub const fn band(self) -> SeverityBand {
        match self.0 {
            8.. => SeverityBand::Severe,
            5..=7 => SeverityBand::High,
            3..=4 => SeverityBand::Elevated,
            1 => SeverityBand::Minimal,
            _ => SeverityBand::Low,
        }
    }
}

impl TryFrom<u8> for Severity {
    type Error = InvalidSeverityError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::from_value(value)
    }
}

impl From<Severity> for u8 {
    fn from(severity: Severity) -> Self {
        severity.0
    }
}

/// Error returned when a [`Severity`] is built from an out-of-range value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidSeverityError {
    /// The rejected value.
    pub value: u8,
}

impl std::fmt::Display for InvalidSeverityError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "invalid severity value {}: expected {MIN_SEVERITY}-{MAX_SEVERITY}",
            self.value
        )
    }
}

impl std::error::Error for InvalidSeverityError {}

/// Map colour band for a [`Severity`].
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum SeverityBand {
    /// Severity 1.
    Minimal,
    /// Severity 2.
    Low,
    /// Severity 3-4.
    Elevated,
    /// Severity 5-7.
    High,
    /// Severity 8 and above.
    Severe,
}

impl SeverityBand {
    /// Returns the marker fill colour used on the map.
    #[must_use]
    pub const fn color(self) -> &'static str {
        match self {
            Self::Severe => "darkred",
            Self::High => "red",
            Self::Elevated => "orange",
            Self::Minimal => "#D5006D",
            Self::Low => "blue",
        }
    }
}

/// Season a hotspot's incidents were recorded in.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[strum(ascii_case_insensitive)]
pub enum Season {
    /// December-February.
    Winter,
    /// March-May.
    Spring,
    /// June-August.
    Summer,
    /// Rainy season.
    Monsoon,
}

impl Season {
    /// Returns all variants of this enum.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[Self::Winter, Self::Spring, Self::Summer, Self::Monsoon]
    }
}

/// A recorded location with aggregated crime statistics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hotspot {
    /// Primary key.
    pub id: i64,
    /// Human-readable place name.
    pub hotspot_name: String,
    /// Where the hotspot is.
    #[serde(flatten)]
    pub coordinate: Coordinate,
    /// Dominant crime type at this location.
    pub crime_type: String,
    /// Seriousness rating.
    pub severity: Severity,
    /// Number of incidents reported here.
    pub reported_incidents: u32,
    /// Average incidents per period, when the source tracks it.
    pub average_incidents: Option<f64>,
    /// Date of the most recent incident.
    pub last_crime_date: NaiveDate,
    /// Season the incidents were recorded in.
    pub season: Option<Season>,
    /// Applicable legal section (e.g. `"IPC 379"`).
    pub legal_section: Option<String>,
    /// Free-text advice for patrol officers.
    pub patrol_recommendations: Option<String>,
}

/// A police station that patrols start from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatrolStation {
    /// Primary key.
    pub id: i64,
    /// Station name.
    pub name: String,
    /// Street address.
    pub address: String,
    /// Where the station is.
    #[serde(flatten)]
    pub coordinate: Coordinate,
}

/// A recorded road accident.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Accident {
    /// Primary key.
    pub id: i64,
    /// Place name.
    pub location_name: String,
    /// Where it happened.
    #[serde(flatten)]
    pub coordinate: Coordinate,
    /// Kind of accident (collision, pedestrian, ...).
    pub accident_type: String,
    /// Legal provision the accident was booked under.
    pub legal_reference: Option<String>,
    /// When it happened.
    pub date_occurred: NaiveDate,
    /// Severity label as recorded by the source.
    pub severity: String,
    /// Officer remarks.
    pub remarks: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn severity_rejects_out_of_range() {
        assert!(Severity::from_value(0).is_err());
        assert!(Severity::from_value(11).is_err());
        assert_eq!(Severity::from_value(10).unwrap().value(), 10);
    }

    #[test]
    fn severity_saturates() {
        assert_eq!(Severity::saturating(-4).value(), 1);
        assert_eq!(Severity::saturating(42).value(), 10);
        assert_eq!(Severity::saturating(6).value(), 6);
    }

    #[test]
    fn severity_bands_match_map_colours() {
        let color = |v| Severity::from_value(v).unwrap().band().color();
        assert_eq!(color(1), "#D5006D");
        assert_eq!(color(2), "blue");
        assert_eq!(color(3), "orange");
        assert_eq!(color(4), "orange");
        assert_eq!(color(5), "red");
        assert_eq!(color(7), "red");
        assert_eq!(color(8), "darkred");
        assert_eq!(color(10), "darkred");
    }

    #[test]
    fn axis_order_helpers_swap_pairs() {
        let c = Coordinate::new(11.0168, 76.9558);
        assert_eq!(c.to_lon_lat(), [76.9558, 11.0168]);
        assert_eq!(c.to_lat_lon(), [11.0168, 76.9558]);
        assert_eq!(Coordinate::from_lon_lat([76.9558, 11.0168]), c);
    }

    #[test]
    fn season_parses_case_insensitively() {
        assert_eq!("monsoon".parse::<Season>().unwrap(), Season::Monsoon);
        assert_eq!(Season::Winter.to_string(), "Winter");
        assert!("autumn".parse::<Season>().is_err());
    }

    #[test]
    fn hotspot_serializes_flat_coordinates() {
        let hotspot = Hotspot {
            id: 1,
            hotspot_name: "Gandhipuram".to_string(),
            coordinate: Coordinate::new(11.0168, 76.9558),
            crime_type: "Theft".to_string(),
            severity: Severity::from_value(5).unwrap(),
            reported_incidents: 12,
            average_incidents: None,
            last_crime_date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            season: Some(Season::Summer),
            legal_section: Some("IPC 379".to_string()),
            patrol_recommendations: None,
        };

        let json = serde_json::to_value(&hotspot).unwrap();
        assert_eq!(json["latitude"], 11.0168);
        assert_eq!(json["longitude"], 76.9558);
        assert_eq!(json["severity"], 5);
        assert_eq!(json["season"], "Summer");
        assert_eq!(json["last_crime_date"], "2024-03-01");
    }

    #[test]
    fn hotspot_rejects_invalid_severity() {
        let json = serde_json::json!({
            "id": 1,
            "hotspot_name": "x",
            "latitude": 1.0,
            "longitude": 2.0,
            "crime_type": "Theft",
            "severity": 0,
            "reported_incidents": 1,
            "average_incidents": null,
            "last_crime_date": "2024-01-01",
            "season": null,
            "legal_section": null,
            "patrol_recommendations": null
        });
        assert!(serde_json::from_value::<Hotspot>(json).is_err());
    }
}
