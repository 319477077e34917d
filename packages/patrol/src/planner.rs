//! Patrol planning from a station: selection, request building, routing.

use crime_dashboard_crime_models::{Coordinate, Hotspot};
use crime_dashboard_patrol_models::{Candidate, RoutePath, SelectorConfig};

use crate::PatrolError;
use crate::route::{RouteRequest, RoutingService};
use crate::selector::select_candidates;

/// Result of a successful planning request.
#[derive(Debug, Clone, PartialEq)]
pub struct PatrolPlan {
    /// Stops in visiting order.
    pub candidates: Vec<Candidate>,
    /// Drivable path through the stops, latitude-first.
    pub path: RoutePath,
}

/// Plans a patrol from `origin` over `hotspots`.
///
/// The routing service is called at most once, and only when at least one
/// hotspot is in range.
///
/// # Errors
///
/// * [`PatrolError::NoCandidates`] if no hotspot lies within the radius.
/// * [`PatrolError::RouteUnavailable`] if the routing call fails or
///   returns an empty path.
pub async fn plan_patrol(
    routing: &dyn RoutingService,
    origin: Coordinate,
    hotspots: &[Hotspot],
    config: &SelectorConfig,
) -> Result<PatrolPlan, PatrolError> {
    let candidates = select_candidates(origin, hotspots, config);
    if candidates.is_empty() {
        log::info!(
            "No hotspots within {} km of ({}, {})",
            config.radius_km,
            origin.latitude,
            origin.longitude
        );
        return Err(PatrolError::NoCandidates);
    }

    let stops: Vec<Coordinate> = candidates.iter().map(|c| c.hotspot.coordinate).collect();
    let request = RouteRequest::from_stops(origin, &stops)?;

    let path = routing.route(&request).await.map_err(|e| {
        log::error!("Routing request failed: {e}");
        e
    })?;

    if path.is_empty() {
        return Err(PatrolError::RouteUnavailable {
            message: "routing service returned an empty path".to_string(),
        });
    }

    log::info!(
        "Planned patrol over {} stop(s) with {} path position(s)",
        candidates.len(),
        path.len()
    );

    Ok(PatrolPlan { candidates, path })
}
