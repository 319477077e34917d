//! HTTP handler functions for the crime dashboard API.

use std::convert::Infallible;
use std::str::FromStr as _;

use actix_web::{HttpResponse, web};
use chrono::{Datelike as _, NaiveDate};
use crime_dashboard_crime_models::{PatrolStation, Season};
use crime_dashboard_database::queries;
use crime_dashboard_database_models::HotspotFilter;
use crime_dashboard_patrol::PatrolError;
use crime_dashboard_patrol::planner::{PatrolPlan, plan_patrol};
use crime_dashboard_patrol_models::{SelectionPolicy, SelectorConfig};
use crime_dashboard_server_models::{
    ApiError, ApiFutureCrimeTrends, ApiHealth, ApiHotspot, ApiLegalClassification, ApiPatrolPlan,
    ApiPatrolStop, ApiPlaybackEvent, ApiPrediction, ApiResourceAllocation, ApiResourceAllocations,
    FutureTrendsParams, PatrolPlanParams, PredictQueryParams, SeasonQueryParams,
};

use crate::AppState;

/// `GET /api/health`
pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(ApiHealth {
        healthy: true,
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// `GET /api/hotspots`
///
/// Lists hotspots with their severity colour, optionally for one season.
pub async fn hotspots(
    state: web::Data<AppState>,
    params: web::Query<SeasonQueryParams>,
) -> HttpResponse {
    let filter = match season_filter(&params) {
        Ok(filter) => filter,
        Err(resp) => return resp,
    };

    match queries::list_hotspots(state.db.as_ref(), &filter).await {
        Ok(rows) => {
            let api_hotspots: Vec<ApiHotspot> = rows.into_iter().map(ApiHotspot::from).collect();
            HttpResponse::Ok().json(api_hotspots)
        }
        Err(e) => {
            log::error!("Failed to query hotspots: {e}");
            HttpResponse::InternalServerError().json(ApiError::new("Failed to query hotspots"))
        }
    }
}

/// `GET /api/police_stations`
pub async fn police_stations(state: web::Data<AppState>) -> HttpResponse {
    match queries::list_police_stations(state.db.as_ref()).await {
        Ok(stations) => HttpResponse::Ok().json(stations),
        Err(e) => {
            log::error!("Failed to query police stations: {e}");
            HttpResponse::InternalServerError()
                .json(ApiError::new("Failed to query police stations"))
        }
    }
}

/// `GET /api/accident_data`
pub async fn accident_data(state: web::Data<AppState>) -> HttpResponse {
    match queries::list_accidents(state.db.as_ref()).await {
        Ok(accidents) => HttpResponse::Ok().json(accidents),
        Err(e) => {
            log::error!("Failed to query accidents: {e}");
            HttpResponse::InternalServerError().json(ApiError::new("Failed to query accidents"))
        }
    }
}

/// `GET /api/legal`
///
/// Legal sections grouped by crime type.
pub async fn legal(state: web::Data<AppState>) -> HttpResponse {
    match queries::legal_classification(state.db.as_ref()).await {
        Ok(rows) => {
            let api_rows: Vec<ApiLegalClassification> =
                rows.into_iter().map(ApiLegalClassification::from).collect();
            HttpResponse::Ok().json(api_rows)
        }
        Err(e) => {
            log::error!("Failed to query legal classification: {e}");
            HttpResponse::InternalServerError()
                .json(ApiError::new("Failed to query legal classification"))
        }
    }
}

/// `GET /api/crime_trends`
pub async fn crime_trends(
    state: web::Data<AppState>,
    params: web::Query<SeasonQueryParams>,
) -> HttpResponse {
    let filter = match season_filter(&params) {
        Ok(filter) => filter,
        Err(resp) => return resp,
    };

    match queries::seasonal_trends(state.db.as_ref(), &filter).await {
        Ok(trends) => HttpResponse::Ok().json(trends),
        Err(e) => {
            log::error!("Failed to query crime trends: {e}");
            HttpResponse::InternalServerError().json(ApiError::new("Failed to query crime trends"))
        }
    }
}

/// `GET /api/incident_totals`
pub async fn incident_totals(state: web::Data<AppState>) -> HttpResponse {
    match queries::incident_totals_by_year(state.db.as_ref()).await {
        Ok(totals) => HttpResponse::Ok().json(totals),
        Err(e) => {
            log::error!("Failed to query incident totals: {e}");
            HttpResponse::InternalServerError()
                .json(ApiError::new("Failed to query incident totals"))
        }
    }
}

/// `GET /api/predict-crime`
///
/// Defaults to next year when `year` is omitted.
pub async fn predict_crime(
    state: web::Data<AppState>,
    params: web::Query<PredictQueryParams>,
) -> HttpResponse {
    let year = params
        .year
        .unwrap_or_else(|| chrono::Utc::now().year() + 1);

    match state.prediction.predict_incidents(year).await {
        Ok(prediction) => HttpResponse::Ok().json(ApiPrediction {
            year: prediction.year,
            predicted_incidents: prediction.predicted_incidents,
        }),
        Err(e) => {
            log::error!("Prediction for {year} failed: {e}");
            HttpResponse::BadGateway().json(ApiError::new(format!("Prediction unavailable: {e}")))
        }
    }
}

/// `GET /api/resource-allocation`
///
/// Suggested patrol staffing per hotspot, highest need first.
pub async fn resource_allocation(state: web::Data<AppState>) -> HttpResponse {
    match queries::resource_allocation(state.db.as_ref()).await {
        Ok(rows) => HttpResponse::Ok().json(ApiResourceAllocations {
            allocation: rows.into_iter().map(ApiResourceAllocation::from).collect(),
        }),
        Err(e) => {
            log::error!("Failed to compute resource allocation: {e}");
            HttpResponse::InternalServerError()
                .json(ApiError::new("Failed to compute resource allocation"))
        }
    }
}

/// `GET /api/future-crime-trends`
///
/// Scales every hotspot by the predicted incident count for the year of
/// `prediction_date`. When the prediction service is unavailable the
/// default factor is used instead of failing the request.
pub async fn future_crime_trends(
    state: web::Data<AppState>,
    params: web::Query<FutureTrendsParams>,
) -> HttpResponse {
    let prediction_date = match params.prediction_date.as_deref().map(str::trim) {
        None | Some("") => chrono::Utc::now().date_naive(),
        Some(raw) => match NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
            Ok(date) => date,
            Err(_) => {
                return HttpResponse::BadRequest()
                    .json(ApiError::new(format!("Invalid prediction_date '{raw}'")));
            }
        },
    };

    let predicted = match state
        .prediction
        .predict_incidents(prediction_date.year())
        .await
    {
        Ok(prediction) => Some(prediction.predicted_incidents),
        Err(e) => {
            log::warn!(
                "Prediction for {} unavailable, using default factor: {e}",
                prediction_date.year()
            );
            None
        }
    };
    let factor = queries::forecast_factor(predicted);

    match queries::future_crime_trends(state.db.as_ref(), factor).await {
        Ok(predictions) => HttpResponse::Ok().json(ApiFutureCrimeTrends {
            prediction_date,
            factor,
            predictions,
        }),
        Err(e) => {
            log::error!("Failed to compute future crime trends: {e}");
            HttpResponse::InternalServerError()
                .json(ApiError::new("Failed to compute future crime trends"))
        }
    }
}

/// `GET /api/patrol/plan`
///
/// Selects in-range hotspots around a station and routes through them.
pub async fn patrol_plan(
    state: web::Data<AppState>,
    params: web::Query<PatrolPlanParams>,
) -> HttpResponse {
    match plan_for_station(&state, &params).await {
        Ok((station, plan)) => HttpResponse::Ok().json(ApiPatrolPlan {
            station,
            path: plan.path.to_display(),
            stops: plan.candidates.into_iter().map(ApiPatrolStop::from).collect(),
        }),
        Err(resp) => resp,
    }
}

/// `GET /api/patrol/playback`
///
/// Plans a patrol, then streams its path as server-sent events, one
/// position per tick.
///
/// The dashboard shows a single patrol marker, so the server runs a single
/// playback: a new playback request from any client ends the stream that
/// was running, which then closes with reason `superseded`.
pub async fn patrol_playback(
    state: web::Data<AppState>,
    params: web::Query<PatrolPlanParams>,
) -> HttpResponse {
    let plan = match plan_for_station(&state, &params).await {
        Ok((_, plan)) => plan,
        Err(resp) => return resp,
    };

    let mut playback = state.playback.start(plan.path);
    let id = playback.id();

    let stream = async_stream::stream! {
        while let Some(tick) = playback.next_tick().await {
            match serde_json::to_string(&ApiPlaybackEvent::from(tick)) {
                Ok(json) => yield Ok::<_, Infallible>(web::Bytes::from(format!("data: {json}\n\n"))),
                Err(e) => {
                    log::error!("Failed to encode playback event: {e}");
                    break;
                }
            }
        }

        let reason = if playback.is_current() { "finished" } else { "superseded" };
        log::debug!("Playback {id} {reason}");
        yield Ok(web::Bytes::from(format!(
            "event: end\ndata: {{\"reason\":\"{reason}\"}}\n\n"
        )));
    };

    HttpResponse::Ok()
        .content_type("text/event-stream")
        .insert_header(("Cache-Control", "no-cache"))
        .streaming(stream)
}

/// `DELETE /api/patrol/playback`
///
/// Stops the running playback, if any. Its stream closes with reason
/// `superseded`.
pub async fn stop_playback(state: web::Data<AppState>) -> HttpResponse {
    state.playback.stop();
    HttpResponse::NoContent().finish()
}

/// Loads the station and hotspots, then runs the planner. Any failure is
/// returned as the finished error response.
async fn plan_for_station(
    state: &AppState,
    params: &PatrolPlanParams,
) -> Result<(PatrolStation, PatrolPlan), HttpResponse> {
    let config = selector_config(&state.patrol, params)?;

    let station = match queries::get_police_station(state.db.as_ref(), params.station_id).await {
        Ok(Some(station)) => station,
        Ok(None) => {
            log::warn!("Patrol requested for unknown station {}", params.station_id);
            return Err(HttpResponse::NotFound().json(ApiError::new(format!(
                "Unknown station {}",
                params.station_id
            ))));
        }
        Err(e) => {
            log::error!("Failed to load station {}: {e}", params.station_id);
            return Err(
                HttpResponse::InternalServerError().json(ApiError::new("Failed to load station"))
            );
        }
    };

    let hotspots = match queries::list_hotspots(state.db.as_ref(), &HotspotFilter::default()).await
    {
        Ok(hotspots) => hotspots,
        Err(e) => {
            log::error!("Failed to load hotspots for patrol: {e}");
            return Err(
                HttpResponse::InternalServerError().json(ApiError::new("Failed to load hotspots"))
            );
        }
    };

    match plan_patrol(
        state.routing.as_ref(),
        station.coordinate,
        &hotspots,
        &config,
    )
    .await
    {
        Ok(plan) => Ok((station, plan)),
        Err(e) => Err(patrol_error_response(&e)),
    }
}

/// Applies request overrides on top of the configured selector defaults.
fn selector_config(
    defaults: &SelectorConfig,
    params: &PatrolPlanParams,
) -> Result<SelectorConfig, HttpResponse> {
    let policy = match params.policy.as_deref() {
        Some(policy) => SelectionPolicy::from_str(policy).map_err(|_| {
            HttpResponse::BadRequest().json(ApiError::new(format!("Unknown policy '{policy}'")))
        })?,
        None => defaults.policy,
    };

    Ok(SelectorConfig {
        radius_km: params.radius_km.unwrap_or(defaults.radius_km),
        policy,
        max_stops: params.max_stops.or(defaults.max_stops),
    })
}

fn season_filter(params: &SeasonQueryParams) -> Result<HotspotFilter, HttpResponse> {
    let season = match params.season.as_deref().map(str::trim) {
        None | Some("") => None,
        Some(name) => Some(Season::from_str(name).map_err(|_| {
            let expected: Vec<String> = Season::all().iter().map(ToString::to_string).collect();
            HttpResponse::BadRequest().json(ApiError::new(format!(
                "Unknown season '{name}', expected one of {}",
                expected.join(", ")
            )))
        })?),
    };
    Ok(HotspotFilter { season })
}

fn patrol_error_response(e: &PatrolError) -> HttpResponse {
    match e {
        PatrolError::NoCandidates => {
            log::warn!("Patrol planning: {e}");
            HttpResponse::NotFound().json(ApiError::new(e.to_string()))
        }
        PatrolError::RouteUnavailable { .. } => {
            log::error!("Patrol planning: {e}");
            HttpResponse::BadGateway().json(ApiError::new(e.to_string()))
        }
    }
}
