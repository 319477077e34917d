#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Aggregation result types and query filters for the crime dashboard
//! database.
//!
//! Row types for hotspots, stations, and accidents live in
//! `crime_dashboard_crime_models`; this crate only holds the shapes of the
//! grouped queries that back the dashboard charts.

use crime_dashboard_crime_models::{Coordinate, Season};
use serde::{Deserialize, Serialize};

/// Filter for hotspot listings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HotspotFilter {
    /// Only hotspots recorded in this season.
    pub season: Option<Season>,
}

/// Legal sections under which one crime type has been booked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LegalClassification {
    /// Crime type.
    pub crime_type: String,
    /// Distinct legal sections, sorted.
    pub legal_sections: Vec<String>,
}

/// Hotspot count for one crime type in one season.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeasonalTrend {
    /// Season name as stored.
    pub season: String,
    /// Crime type.
    pub crime_type: String,
    /// Number of hotspots.
    pub hotspot_count: i64,
    /// Sum of reported incidents across those hotspots.
    pub total_incidents: i64,
}

/// Reported incidents summed over one calendar year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncidentTotal {
    /// Calendar year of `last_crime_date`.
    pub year: i32,
    /// Total reported incidents.
    pub incidents: i64,
}

/// Patrol staffing suggested for one hotspot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceAllocation {
    /// Hotspot ID.
    pub hotspot_id: i64,
    /// Hotspot name.
    pub hotspot: String,
    /// Severity rating.
    pub severity: u8,
    /// Average incidents, or the reported count when no average is kept.
    pub average_incidents: f64,
    /// Suggested number of patrols.
    pub patrols_needed: u32,
    /// Weekday of the most recent incident (e.g. `"Friday"`).
    pub peak_day: String,
}

/// A hotspot's incidents and severity scaled by a forecast factor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HotspotForecast {
    /// Hotspot ID.
    pub id: i64,
    /// Hotspot name.
    pub hotspot_name: String,
    /// Where the hotspot is.
    #[serde(flatten)]
    pub coordinate: Coordinate,
    /// Crime type.
    pub crime_type: String,
    /// Scaled severity, kept within 1..=10.
    pub severity: u8,
    /// Scaled incident count.
    pub predicted_incidents: i64,
    /// Applicable legal section.
    pub legal_section: Option<String>,
    /// Free-text advice for patrol officers.
    pub patrol_recommendations: Option<String>,
}
