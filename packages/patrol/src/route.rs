//! Routing service requests and response decoding.
//!
//! The directions API takes `start`, `end`, and `waypoints` query
//! parameters as longitude-first `"lon,lat"` strings (waypoints joined with
//! `|`) and answers with a `GeoJSON` feature collection whose first feature
//! carries the path as `[lon, lat]` pairs. [`RouteRequest`] and
//! [`decode_route`] own both axis-order conversions so that nothing else in
//! the workspace handles longitude-first data.

use std::time::Duration;

use crime_dashboard_crime_models::Coordinate;
use crime_dashboard_patrol_models::RoutePath;
use serde::Deserialize;

use crate::PatrolError;

/// Maximum length of the response body preview included in errors.
const BODY_PREVIEW_LEN: usize = 300;

/// A directions request from a patrol origin through an ordered list of
/// stops.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteRequest {
    /// Where the patrol starts.
    pub origin: Coordinate,
    /// Final stop (the last stop in order).
    pub destination: Coordinate,
    /// Every stop in visiting order, destination included.
    pub waypoints: Vec<Coordinate>,
}

impl RouteRequest {
    /// Builds a request visiting `stops` in order from `origin`.
    ///
    /// # Errors
    ///
    /// Returns [`PatrolError::NoCandidates`] if `stops` is empty.
    pub fn from_stops(origin: Coordinate, stops: &[Coordinate]) -> Result<Self, PatrolError> {
        let destination = *stops.last().ok_or(PatrolError::NoCandidates)?;

        Ok(Self {
            origin,
            destination,
            waypoints: stops.to_vec(),
        })
    }

    /// The `start` parameter.
    #[must_use]
    pub fn start_param(&self) -> String {
        lon_lat_param(self.origin)
    }

    /// The `end` parameter.
    #[must_use]
    pub fn end_param(&self) -> String {
        lon_lat_param(self.destination)
    }

    /// The `waypoints` parameter: every stop as `"lon,lat"`, joined by `|`.
    #[must_use]
    pub fn waypoints_param(&self) -> String {
        self.waypoints
            .iter()
            .map(|c| lon_lat_param(*c))
            .collect::<Vec<_>>()
            .join("|")
    }
}

fn lon_lat_param(c: Coordinate) -> String {
    let [lon, lat] = c.to_lon_lat();
    format!("{lon},{lat}")
}

/// A driving-directions provider.
#[async_trait::async_trait]
pub trait RoutingService: Send + Sync {
    /// Requests a drivable path for `request`.
    ///
    /// # Errors
    ///
    /// Returns [`PatrolError::RouteUnavailable`] if the service cannot be
    /// reached, answers with an error status, or returns no path geometry.
    async fn route(&self, request: &RouteRequest) -> Result<RoutePath, PatrolError>;
}

/// Connection settings for the directions API.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RoutingConfig {
    /// Directions endpoint without the profile segment.
    pub base_url: String,
    /// Routing profile appended to `base_url`.
    pub profile: String,
    /// API key sent as the `api_key` query parameter.
    pub api_key: String,
    /// Per-request timeout.
    pub timeout_secs: u64,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openrouteservice.org/v2/directions".to_string(),
            profile: "driving-car".to_string(),
            api_key: String::new(),
            timeout_secs: 15,
        }
    }
}

impl RoutingConfig {
    /// Full directions URL for the configured profile.
    #[must_use]
    pub fn endpoint(&self) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            self.profile.trim_start_matches('/')
        )
    }
}

/// [`RoutingService`] backed by the `OpenRouteService` directions API.
pub struct OpenRouteServiceClient {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
}

impl OpenRouteServiceClient {
    /// Creates a client from `config`.
    ///
    /// # Errors
    ///
    /// Returns [`PatrolError::RouteUnavailable`] if the HTTP client cannot
    /// be built.
    pub fn new(config: &RoutingConfig) -> Result<Self, PatrolError> {
        if config.api_key.is_empty() {
            log::warn!("Routing API key is empty; directions requests will be rejected");
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            endpoint: config.endpoint(),
            api_key: config.api_key.clone(),
        })
    }
}

#[async_trait::async_trait]
impl RoutingService for OpenRouteServiceClient {
    async fn route(&self, request: &RouteRequest) -> Result<RoutePath, PatrolError> {
        log::debug!(
            "Requesting route from {} through {} stop(s)",
            request.start_param(),
            request.waypoints.len()
        );

        let resp = self
            .client
            .get(&self.endpoint)
            .query(&[
                ("api_key", self.api_key.clone()),
                ("start", request.start_param()),
                ("end", request.end_param()),
                ("waypoints", request.waypoints_param()),
            ])
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            let preview: String = body.chars().take(BODY_PREVIEW_LEN).collect();
            return Err(PatrolError::RouteUnavailable {
                message: format!("routing service returned {status}: {preview}"),
            });
        }

        let body: serde_json::Value = resp.json().await?;
        decode_route(&body)
    }
}

/// Decodes `features[0].geometry.coordinates` into a latitude-first path.
///
/// A missing or empty geometry, or any pair that is not two numbers, fails
/// the whole response; no partial path is returned.
///
/// # Errors
///
/// Returns [`PatrolError::RouteUnavailable`] if the body has no usable
/// path geometry.
pub fn decode_route(body: &serde_json::Value) -> Result<RoutePath, PatrolError> {
    let malformed = |message: &str| PatrolError::RouteUnavailable {
        message: message.to_string(),
    };

    let coordinates = body["features"]
        .get(0)
        .and_then(|feature| feature["geometry"]["coordinates"].as_array())
        .ok_or_else(|| malformed("response has no path geometry"))?;

    if coordinates.is_empty() {
        return Err(malformed("response path geometry is empty"));
    }

    let points = coordinates
        .iter()
        .map(|pair| {
            let lon = pair.get(0).and_then(serde_json::Value::as_f64);
            let lat = pair.get(1).and_then(serde_json::Value::as_f64);
            match (lon, lat) {
                (Some(lon), Some(lat)) => Ok(Coordinate::from_lon_lat([lon, lat])),
                _ => Err(malformed("response path contains a malformed position")),
            }
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(RoutePath::new(points))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn waypoints_join_stops_longitude_first_in_order() {
        let origin = Coordinate::from_lon_lat([77.2, 11.2]);
        let stops = [
            Coordinate::from_lon_lat([77.0, 11.0]),
            Coordinate::from_lon_lat([77.1, 11.1]),
        ];
        let request = RouteRequest::from_stops(origin, &stops).unwrap();

        assert_eq!(request.waypoints_param(), "77,11|77.1,11.1");
        assert_eq!(request.destination, stops[1]);
        assert_eq!(request.end_param(), "77.1,11.1");
        assert_eq!(request.start_param(), "77.2,11.2");
    }

    #[test]
    fn single_stop_is_waypoint_and_destination() {
        let stop = Coordinate::new(11.03, 76.98);
        let request = RouteRequest::from_stops(Coordinate::new(11.0, 76.9), &[stop]).unwrap();
        assert_eq!(request.waypoints, vec![stop]);
        assert_eq!(request.destination, stop);
        assert_eq!(request.waypoints_param(), "76.98,11.03");
    }

    #[test]
    fn no_stops_is_no_candidates() {
        let err = RouteRequest::from_stops(Coordinate::new(11.0, 76.9), &[]).unwrap_err();
        assert!(matches!(err, PatrolError::NoCandidates));
    }

    #[test]
    fn decode_swaps_to_latitude_first() {
        let body = serde_json::json!({
            "type": "FeatureCollection",
            "features": [{
                "type": "Feature",
                "geometry": {
                    "type": "LineString",
                    "coordinates": [[77.0, 11.0], [77.1, 11.1]]
                },
                "properties": {}
            }]
        });
        let path = decode_route(&body).unwrap();
        assert_eq!(path.to_display(), vec![[11.0, 77.0], [11.1, 77.1]]);
        assert_eq!(path.get(0), Some(Coordinate::new(11.0, 77.0)));
    }

    #[test]
    fn decode_rejects_missing_geometry() {
        let body = serde_json::json!({ "features": [] });
        assert!(matches!(
            decode_route(&body),
            Err(PatrolError::RouteUnavailable { .. })
        ));

        let body = serde_json::json!({ "error": { "code": 2010 } });
        assert!(matches!(
            decode_route(&body),
            Err(PatrolError::RouteUnavailable { .. })
        ));
    }

    #[test]
    fn decode_rejects_empty_geometry() {
        let body = serde_json::json!({
            "features": [{ "geometry": { "coordinates": [] } }]
        });
        assert!(decode_route(&body).is_err());
    }

    #[test]
    fn decode_rejects_partial_positions() {
        let body = serde_json::json!({
            "features": [{ "geometry": { "coordinates": [[77.0, 11.0], [77.1]] } }]
        });
        assert!(decode_route(&body).is_err());
    }

    #[test]
    fn endpoint_joins_profile() {
        let config = RoutingConfig {
            base_url: "http://localhost:8082/ors/v2/directions/".to_string(),
            ..RoutingConfig::default()
        };
        assert_eq!(
            config.endpoint(),
            "http://localhost:8082/ors/v2/directions/driving-car"
        );
    }
}
