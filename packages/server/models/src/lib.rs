#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! API request and response types for the crime dashboard server.
//!
//! These types are serialized to JSON for the REST API. They are separate
//! from the database and planning types to allow independent evolution of
//! the API contract. Map-facing coordinates are always `[lat, lon]`.

use chrono::NaiveDate;
use crime_dashboard_crime_models::{Hotspot, PatrolStation, SeverityBand};
use crime_dashboard_database_models::{HotspotForecast, LegalClassification, ResourceAllocation};
use crime_dashboard_patrol_models::{Candidate, PlaybackTick};
use serde::{Deserialize, Serialize};

/// Health check response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiHealth {
    /// Whether the service is healthy.
    pub healthy: bool,
    /// Service version.
    pub version: String,
}

/// Error body returned by every failing endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    /// User-facing message.
    pub error: String,
}

impl ApiError {
    /// Creates an error body.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
        }
    }
}

/// Query parameters for the hotspot and trend endpoints.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeasonQueryParams {
    /// Season name (case-insensitive).
    pub season: Option<String>,
}

/// A hotspot as returned by the API, with its map colour.
#[derive(Debug, Clone, Serialize)]
pub struct ApiHotspot {
    /// The hotspot record.
    #[serde(flatten)]
    pub hotspot: Hotspot,
    /// Severity band.
    pub severity_band: SeverityBand,
    /// Marker fill colour.
    pub color: &'static str,
}

impl From<Hotspot> for ApiHotspot {
    fn from(hotspot: Hotspot) -> Self {
        let band = hotspot.severity.band();
        Self {
            hotspot,
            severity_band: band,
            color: band.color(),
        }
    }
}

/// Legal sections for one crime type, joined for display.
#[derive(Debug, Clone, Serialize)]
pub struct ApiLegalClassification {
    /// Crime type.
    pub crime_type: String,
    /// Comma-separated legal sections.
    pub legal_section: String,
}

impl From<LegalClassification> for ApiLegalClassification {
    fn from(row: LegalClassification) -> Self {
        Self {
            crime_type: row.crime_type,
            legal_section: row.legal_sections.join(", "),
        }
    }
}

/// Query parameters for the prediction endpoint.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PredictQueryParams {
    /// Year to predict.
    pub year: Option<i32>,
}

/// Prediction response, keyed like the prediction service's own body.
#[derive(Debug, Clone, Serialize)]
pub struct ApiPrediction {
    /// Year the prediction is for.
    pub year: i32,
    /// Predicted incident count.
    pub predicted_incidents: i64,
}

/// Patrol staffing row for the resource dashboard.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResourceAllocation {
    /// Hotspot ID.
    pub id: i64,
    /// Hotspot name.
    pub hotspot: String,
    /// Severity rating.
    pub severity: u8,
    /// Average incidents.
    pub average_incidents: f64,
    /// Suggested number of patrols.
    pub patrols_needed: u32,
    /// Weekday of the most recent incident.
    pub peak_day: String,
}

impl From<ResourceAllocation> for ApiResourceAllocation {
    fn from(row: ResourceAllocation) -> Self {
        Self {
            id: row.hotspot_id,
            hotspot: row.hotspot,
            severity: row.severity,
            average_incidents: row.average_incidents,
            patrols_needed: row.patrols_needed,
            peak_day: row.peak_day,
        }
    }
}

/// `GET /api/resource-allocation` response.
#[derive(Debug, Clone, Serialize)]
pub struct ApiResourceAllocations {
    /// One row per hotspot, highest need first.
    pub allocation: Vec<ApiResourceAllocation>,
}

/// Query parameters for the future crime trends endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FutureTrendsParams {
    /// `YYYY-MM-DD`; defaults to today.
    pub prediction_date: Option<String>,
}

/// `GET /api/future-crime-trends` response.
#[derive(Debug, Clone, Serialize)]
pub struct ApiFutureCrimeTrends {
    /// Date the forecast is for.
    pub prediction_date: NaiveDate,
    /// Factor applied to every hotspot.
    pub factor: f64,
    /// Scaled hotspots.
    pub predictions: Vec<HotspotForecast>,
}

/// Query parameters for patrol planning and playback.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatrolPlanParams {
    /// Station the patrol starts from.
    pub station_id: i64,
    /// Search radius override, in kilometers.
    pub radius_km: Option<f64>,
    /// Selection policy override (`severity_first` or `proximity_first`).
    pub policy: Option<String>,
    /// Stop cap override.
    pub max_stops: Option<usize>,
}

/// One stop of a planned patrol.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiPatrolStop {
    /// Hotspot ID.
    pub id: i64,
    /// Hotspot name.
    pub hotspot_name: String,
    /// Crime type at the hotspot.
    pub crime_type: String,
    /// Severity rating.
    pub severity: u8,
    /// `[lat, lon]`.
    pub position: [f64; 2],
    /// Distance from the station.
    pub distance_km: f64,
}

impl From<Candidate> for ApiPatrolStop {
    fn from(candidate: Candidate) -> Self {
        Self {
            id: candidate.hotspot.id,
            position: candidate.hotspot.coordinate.to_lat_lon(),
            hotspot_name: candidate.hotspot.hotspot_name,
            crime_type: candidate.hotspot.crime_type,
            severity: candidate.hotspot.severity.value(),
            distance_km: candidate.distance_km,
        }
    }
}

/// A planned patrol route.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiPatrolPlan {
    /// Origin station.
    pub station: PatrolStation,
    /// Stops in visiting order.
    pub stops: Vec<ApiPatrolStop>,
    /// Drivable path as `[lat, lon]` pairs.
    pub path: Vec<[f64; 2]>,
}

/// One server-sent playback event.
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiPlaybackEvent {
    /// Index into the path.
    pub index: usize,
    /// `[lat, lon]`.
    pub position: [f64; 2],
    /// Whether this is the final position.
    pub last: bool,
}

impl From<PlaybackTick> for ApiPlaybackEvent {
    fn from(tick: PlaybackTick) -> Self {
        Self {
            index: tick.index,
            position: tick.position.to_lat_lon(),
            last: tick.last,
        }
    }
}

#[cfg(test)]
mod tests {
    use crime_dashboard_crime_models::{Coordinate, Severity};

    use super::*;

    #[test]
    fn hotspot_carries_band_colour() {
        let hotspot = Hotspot {
            id: 3,
            hotspot_name: "Ukkadam".to_string(),
            coordinate: Coordinate::new(10.99, 76.96),
            crime_type: "Robbery".to_string(),
            severity: Severity::from_value(8).unwrap(),
            reported_incidents: 4,
            average_incidents: None,
            last_crime_date: NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
            season: None,
            legal_section: None,
            patrol_recommendations: None,
        };

        let json = serde_json::to_value(ApiHotspot::from(hotspot)).unwrap();
        assert_eq!(json["color"], "darkred");
        assert_eq!(json["severity_band"], "SEVERE");
        assert_eq!(json["hotspot_name"], "Ukkadam");
        assert_eq!(json["latitude"], 10.99);
    }

    #[test]
    fn legal_sections_are_joined() {
        let api = ApiLegalClassification::from(LegalClassification {
            crime_type: "Theft".to_string(),
            legal_sections: vec!["IPC 379".to_string(), "IPC 380".to_string()],
        });
        assert_eq!(api.legal_section, "IPC 379, IPC 380");
    }

    #[test]
    fn playback_event_is_latitude_first() {
        let event = ApiPlaybackEvent::from(PlaybackTick {
            index: 1,
            position: Coordinate::new(11.1, 77.1),
            last: true,
        });
        let json = serde_json::to_value(event).unwrap();
        assert_eq!(json, serde_json::json!({ "index": 1, "position": [11.1, 77.1], "last": true }));
    }

    #[test]
    fn plan_params_use_camel_case() {
        let params: PatrolPlanParams = serde_json::from_value(serde_json::json!({
            "stationId": 4,
            "radiusKm": 5.0,
            "policy": "proximity_first"
        }))
        .unwrap();
        assert_eq!(params.station_id, 4);
        assert_eq!(params.radius_km, Some(5.0));
        assert_eq!(params.max_stops, None);
    }

    #[test]
    fn prediction_keeps_service_field_names() {
        let json = serde_json::to_value(ApiPrediction {
            year: 2025,
            predicted_incidents: 412,
        })
        .unwrap();
        assert_eq!(json, serde_json::json!({ "year": 2025, "predicted_incidents": 412 }));
    }

    #[test]
    fn allocation_rows_use_dashboard_keys() {
        let response = ApiResourceAllocations {
            allocation: vec![ApiResourceAllocation::from(ResourceAllocation {
                hotspot_id: 7,
                hotspot: "Gandhipuram".to_string(),
                severity: 6,
                average_incidents: 3.5,
                patrols_needed: 3,
                peak_day: "Friday".to_string(),
            })],
        };

        let json = serde_json::to_value(response).unwrap();
        let row = &json["allocation"][0];
        assert_eq!(row["hotspot"], "Gandhipuram");
        assert_eq!(row["averageIncidents"], 3.5);
        assert_eq!(row["patrolsNeeded"], 3);
        assert_eq!(row["peakDay"], "Friday");
    }
}
