#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Patrol route planning for the crime dashboard.
//!
//! Planning a patrol from a station runs in four steps:
//!
//! 1. **Selection** ([`selector`]): keep the hotspots within a radius of
//!    the station and order them by the configured
//!    [`SelectionPolicy`](crime_dashboard_patrol_models::SelectionPolicy).
//! 2. **Request building** ([`route`]): turn the ordered stops into the
//!    routing service's `start`/`end`/`waypoints` parameters.
//! 3. **Routing** ([`route::RoutingService`]): one request to the
//!    external directions API, decoded into a latitude-first
//!    [`RoutePath`](crime_dashboard_patrol_models::RoutePath).
//! 4. **Playback** ([`playback`]): replay the path one position per tick
//!    for the moving patrol marker.
//!
//! [`planner::plan_patrol`] ties steps 1-3 together. Every failure is
//! terminal for the request that hit it: nothing is retried and no
//! partial route is returned.

pub mod distance;
pub mod planner;
pub mod playback;
pub mod route;
pub mod selector;

use thiserror::Error;

/// Errors from patrol planning.
#[derive(Debug, Error)]
pub enum PatrolError {
    /// No hotspot lies within the search radius; the routing service was
    /// not called.
    #[error("No hotspots in range")]
    NoCandidates,

    /// The routing service failed or returned no usable geometry.
    #[error("Route unavailable: {message}")]
    RouteUnavailable {
        /// Underlying failure description.
        message: String,
    },
}

impl From<reqwest::Error> for PatrolError {
    fn from(e: reqwest::Error) -> Self {
        Self::RouteUnavailable {
            message: e.to_string(),
        }
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use chrono::NaiveDate;
    use crime_dashboard_crime_models::{Coordinate, Hotspot, Severity};

    /// Builds a hotspot with only the fields planning looks at filled in.
    pub fn hotspot(id: i64, severity: u8, latitude: f64, longitude: f64) -> Hotspot {
        Hotspot {
            id,
            hotspot_name: format!("hotspot-{id}"),
            coordinate: Coordinate::new(latitude, longitude),
            crime_type: "Theft".to_string(),
            severity: Severity::from_value(severity).unwrap(),
            reported_incidents: 1,
            average_incidents: None,
            last_crime_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            season: None,
            legal_section: None,
            patrol_recommendations: None,
        }
    }
}
