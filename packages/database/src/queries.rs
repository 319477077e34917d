//! Query functions for hotspots, police stations, and accidents.
//!
//! Listings are fetch-all. Rows that cannot be converted (bad dates and
//! the like) are logged and skipped so one broken record doesn't blank a
//! whole map layer.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use crime_dashboard_crime_models::{Accident, Coordinate, Hotspot, PatrolStation, Severity};
use crime_dashboard_database_models::{
    HotspotFilter, HotspotForecast, IncidentTotal, LegalClassification, ResourceAllocation,
    SeasonalTrend,
};
use moosicbox_json_utils::database::ToValue as _;
use switchy_database::{Database, DatabaseValue, Row};

use crate::DbError;

const DATE_FORMAT: &str = "%Y-%m-%d";

const HOTSPOT_COLUMNS: &str = "id, hotspot_name, latitude, longitude, crime_type, severity,
     reported_incidents, average_incidents, last_crime_date, season,
     legal_section, patrol_recommendations";

fn parse_date(value: &str) -> Result<NaiveDate, DbError> {
    NaiveDate::parse_from_str(value.trim(), DATE_FORMAT).map_err(|e| DbError::Conversion {
        message: format!("Invalid date '{value}': {e}"),
    })
}

fn optional_string(value: Option<&str>) -> DatabaseValue {
    value.map_or(DatabaseValue::Null, |s| DatabaseValue::String(s.to_string()))
}

fn hotspot_from_row(row: &Row) -> Result<Hotspot, DbError> {
    let id: i64 = row.to_value("id").map_err(|e| DbError::Conversion {
        message: format!("Failed to parse hotspot id: {e}"),
    })?;

    let raw_severity: i64 = row.to_value("severity").unwrap_or(0);
    let severity = Severity::saturating(raw_severity);
    if i64::from(severity.value()) != raw_severity {
        log::warn!("Hotspot {id} has out-of-range severity {raw_severity}, clamped to {severity:?}");
    }

    let reported: i64 = row.to_value("reported_incidents").unwrap_or(0);
    let last_crime_date: String = row.to_value("last_crime_date").unwrap_or_default();
    let season: Option<String> = row.to_value("season").unwrap_or(None);

    Ok(Hotspot {
        id,
        hotspot_name: row.to_value("hotspot_name").unwrap_or_default(),
        coordinate: Coordinate::new(
            row.to_value("latitude").unwrap_or_default(),
            row.to_value("longitude").unwrap_or_default(),
        ),
        crime_type: row.to_value("crime_type").unwrap_or_default(),
        severity,
        reported_incidents: u32::try_from(reported).unwrap_or(0),
        average_incidents: row.to_value("average_incidents").unwrap_or(None),
        last_crime_date: parse_date(&last_crime_date)?,
        season: season.and_then(|s| s.parse().ok()),
        legal_section: row.to_value("legal_section").unwrap_or(None),
        patrol_recommendations: row.to_value("patrol_recommendations").unwrap_or(None),
    })
}

fn station_from_row(row: &Row) -> PatrolStation {
    PatrolStation {
        id: row.to_value("id").unwrap_or_default(),
        name: row.to_value("name").unwrap_or_default(),
        address: row.to_value("address").unwrap_or_default(),
        coordinate: Coordinate::new(
            row.to_value("latitude").unwrap_or_default(),
            row.to_value("longitude").unwrap_or_default(),
        ),
    }
}

fn accident_from_row(row: &Row) -> Result<Accident, DbError> {
    let date_occurred: String = row.to_value("date_occurred").unwrap_or_default();

    Ok(Accident {
        id: row.to_value("id").unwrap_or_default(),
        location_name: row.to_value("location_name").unwrap_or_default(),
        coordinate: Coordinate::new(
            row.to_value("latitude").unwrap_or_default(),
            row.to_value("longitude").unwrap_or_default(),
        ),
        accident_type: row.to_value("accident_type").unwrap_or_default(),
        legal_reference: row.to_value("legal_reference").unwrap_or(None),
        date_occurred: parse_date(&date_occurred)?,
        severity: row.to_value("severity").unwrap_or_default(),
        remarks: row.to_value("remarks").unwrap_or(None),
    })
}

/// Converts every row with `convert`, logging and skipping failures.
fn convert_rows<T>(
    rows: &[Row],
    what: &str,
    convert: impl Fn(&Row) -> Result<T, DbError>,
) -> Vec<T> {
    rows.iter()
        .filter_map(|row| match convert(row) {
            Ok(value) => Some(value),
            Err(e) => {
                log::warn!("Skipping {what} row: {e}");
                None
            }
        })
        .collect()
}

/// Returns all hotspots, optionally restricted to one season.
///
/// # Errors
///
/// Returns [`DbError`] if the database query fails.
pub async fn list_hotspots(
    db: &dyn Database,
    filter: &HotspotFilter,
) -> Result<Vec<Hotspot>, DbError> {
    let rows = match filter.season {
        Some(season) => {
            db.query_raw_params(
                &format!(
                    "SELECT {HOTSPOT_COLUMNS} FROM hotspots
                     WHERE LOWER(season) = LOWER(?)
                     ORDER BY id"
                ),
                &[DatabaseValue::String(season.to_string())],
            )
            .await?
        }
        None => {
            db.query_raw_params(
                &format!("SELECT {HOTSPOT_COLUMNS} FROM hotspots ORDER BY id"),
                &[],
            )
            .await?
        }
    };

    Ok(convert_rows(&rows, "hotspot", hotspot_from_row))
}

/// Returns all police stations.
///
/// # Errors
///
/// Returns [`DbError`] if the database query fails.
pub async fn list_police_stations(db: &dyn Database) -> Result<Vec<PatrolStation>, DbError> {
    let rows = db
        .query_raw_params(
            "SELECT id, name, address, latitude, longitude FROM police_stations ORDER BY id",
            &[],
        )
        .await?;

    Ok(rows.iter().map(station_from_row).collect())
}

/// Looks up a single police station by ID.
///
/// # Errors
///
/// Returns [`DbError`] if the database query fails.
pub async fn get_police_station(
    db: &dyn Database,
    id: i64,
) -> Result<Option<PatrolStation>, DbError> {
    let rows = db
        .query_raw_params(
            "SELECT id, name, address, latitude, longitude FROM police_stations WHERE id = ?",
            &[DatabaseValue::Int64(id)],
        )
        .await?;

    Ok(rows.first().map(station_from_row))
}

/// Returns all recorded accidents.
///
/// # Errors
///
/// Returns [`DbError`] if the database query fails.
pub async fn list_accidents(db: &dyn Database) -> Result<Vec<Accident>, DbError> {
    let rows = db
        .query_raw_params(
            "SELECT id, location_name, latitude, longitude, accident_type,
                    legal_reference, date_occurred, severity, remarks
             FROM accident_data ORDER BY id",
            &[],
        )
        .await?;

    Ok(convert_rows(&rows, "accident", accident_from_row))
}

/// Groups the distinct legal sections recorded for each crime type.
///
/// # Errors
///
/// Returns [`DbError`] if the database query fails.
pub async fn legal_classification(
    db: &dyn Database,
) -> Result<Vec<LegalClassification>, DbError> {
    let rows = db
        .query_raw_params(
            "SELECT DISTINCT crime_type, legal_section FROM hotspots
             WHERE legal_section IS NOT NULL AND legal_section <> ''
             ORDER BY crime_type, legal_section",
            &[],
        )
        .await?;

    let mut grouped: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for row in &rows {
        let crime_type: String = row.to_value("crime_type").unwrap_or_default();
        let section: String = row.to_value("legal_section").unwrap_or_default();
        grouped.entry(crime_type).or_default().push(section);
    }

    Ok(grouped
        .into_iter()
        .map(|(crime_type, legal_sections)| LegalClassification {
            crime_type,
            legal_sections,
        })
        .collect())
}

/// Counts hotspots per season and crime type.
///
/// Ordered by season, then by descending hotspot count, then crime type.
///
/// # Errors
///
/// Returns [`DbError`] if the database query fails.
pub async fn seasonal_trends(
    db: &dyn Database,
    filter: &HotspotFilter,
) -> Result<Vec<SeasonalTrend>, DbError> {
    let (season_clause, params) = filter.season.map_or_else(
        || (String::new(), Vec::new()),
        |season| {
            (
                "AND LOWER(season) = LOWER(?)".to_string(),
                vec![DatabaseValue::String(season.to_string())],
            )
        },
    );

    let rows = db
        .query_raw_params(
            &format!(
                "SELECT season, crime_type,
                        COUNT(*) AS hotspot_count,
                        COALESCE(SUM(reported_incidents), 0) AS total_incidents
                 FROM hotspots
                 WHERE season IS NOT NULL {season_clause}
                 GROUP BY season, crime_type
                 ORDER BY season, hotspot_count DESC, crime_type"
            ),
            &params,
        )
        .await?;

    Ok(rows
        .iter()
        .map(|row| SeasonalTrend {
            season: row.to_value("season").unwrap_or_default(),
            crime_type: row.to_value("crime_type").unwrap_or_default(),
            hotspot_count: row.to_value("hotspot_count").unwrap_or(0),
            total_incidents: row.to_value("total_incidents").unwrap_or(0),
        })
        .collect())
}

/// Sums reported incidents per calendar year of the last crime date.
///
/// # Errors
///
/// Returns [`DbError`] if the database query fails.
pub async fn incident_totals_by_year(db: &dyn Database) -> Result<Vec<IncidentTotal>, DbError> {
    let rows = db
        .query_raw_params(
            "SELECT CAST(strftime('%Y', last_crime_date) AS INTEGER) AS year,
                    COALESCE(SUM(reported_incidents), 0) AS incidents
             FROM hotspots
             WHERE strftime('%Y', last_crime_date) IS NOT NULL
             GROUP BY year
             ORDER BY year",
            &[],
        )
        .await?;

    Ok(rows
        .iter()
        .map(|row| {
            let year: i64 = row.to_value("year").unwrap_or(0);
            IncidentTotal {
                year: i32::try_from(year).unwrap_or(0),
                incidents: row.to_value("incidents").unwrap_or(0),
            }
        })
        .collect())
}

/// Forecast factor used when no prediction is available.
pub const DEFAULT_FORECAST_FACTOR: f64 = 0.8;

/// Turns a predicted incident count into a forecast factor
/// (`predicted / 100`), falling back to [`DEFAULT_FORECAST_FACTOR`] when
/// there is no usable prediction.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn forecast_factor(predicted_incidents: Option<i64>) -> f64 {
    predicted_incidents
        .map(|p| p as f64 / 100.0)
        .filter(|f| f.is_finite() && *f >= 0.0)
        .unwrap_or(DEFAULT_FORECAST_FACTOR)
}

/// Suggests patrol staffing for `hotspot`.
///
/// Patrols needed is `ceil(severity * average / 10)`, at least one. The
/// peak day is the weekday of the most recent incident.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn allocate(hotspot: &Hotspot) -> ResourceAllocation {
    let average_incidents = hotspot
        .average_incidents
        .unwrap_or_else(|| f64::from(hotspot.reported_incidents));
    let load = f64::from(hotspot.severity.value()) * average_incidents.max(0.0) / 10.0;

    ResourceAllocation {
        hotspot_id: hotspot.id,
        hotspot: hotspot.hotspot_name.clone(),
        severity: hotspot.severity.value(),
        average_incidents,
        patrols_needed: (load.ceil() as u32).max(1),
        peak_day: hotspot.last_crime_date.format("%A").to_string(),
    }
}

/// Scales `hotspot` by `factor`: severity is rounded and kept within
/// 1..=10, incidents are rounded.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn forecast(hotspot: &Hotspot, factor: f64) -> HotspotForecast {
    let severity = (f64::from(hotspot.severity.value()) * factor).round() as i64;
    let predicted_incidents = (f64::from(hotspot.reported_incidents) * factor).round() as i64;

    HotspotForecast {
        id: hotspot.id,
        hotspot_name: hotspot.hotspot_name.clone(),
        coordinate: hotspot.coordinate,
        crime_type: hotspot.crime_type.clone(),
        severity: Severity::saturating(severity).value(),
        predicted_incidents,
        legal_section: hotspot.legal_section.clone(),
        patrol_recommendations: hotspot.patrol_recommendations.clone(),
    }
}

/// Patrol staffing for every hotspot, most patrols first, then by
/// severity.
///
/// # Errors
///
/// Returns [`DbError`] if the database query fails.
pub async fn resource_allocation(db: &dyn Database) -> Result<Vec<ResourceAllocation>, DbError> {
    let hotspots = list_hotspots(db, &HotspotFilter::default()).await?;

    let mut allocations: Vec<ResourceAllocation> = hotspots.iter().map(allocate).collect();
    allocations.sort_by(|a, b| {
        b.patrols_needed
            .cmp(&a.patrols_needed)
            .then_with(|| b.severity.cmp(&a.severity))
    });

    Ok(allocations)
}

/// Every hotspot scaled by `factor`, in ID order.
///
/// # Errors
///
/// Returns [`DbError`] if the database query fails.
pub async fn future_crime_trends(
    db: &dyn Database,
    factor: f64,
) -> Result<Vec<HotspotForecast>, DbError> {
    let hotspots = list_hotspots(db, &HotspotFilter::default()).await?;
    log::debug!("Forecasting {} hotspots with factor {factor}", hotspots.len());

    Ok(hotspots.iter().map(|h| forecast(h, factor)).collect())
}

/// Inserts a hotspot and returns its new ID. The `id` field of `hotspot`
/// is ignored.
///
/// # Errors
///
/// Returns [`DbError`] if the insert fails.
pub async fn insert_hotspot(db: &dyn Database, hotspot: &Hotspot) -> Result<i64, DbError> {
    let rows = db
        .query_raw_params(
            "INSERT INTO hotspots (
                hotspot_name, latitude, longitude, crime_type, severity,
                reported_incidents, average_incidents, last_crime_date, season,
                legal_section, patrol_recommendations
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            RETURNING id",
            &[
                DatabaseValue::String(hotspot.hotspot_name.clone()),
                DatabaseValue::Real64(hotspot.coordinate.latitude),
                DatabaseValue::Real64(hotspot.coordinate.longitude),
                DatabaseValue::String(hotspot.crime_type.clone()),
                DatabaseValue::Int64(i64::from(hotspot.severity.value())),
                DatabaseValue::Int64(i64::from(hotspot.reported_incidents)),
                hotspot
                    .average_incidents
                    .map_or(DatabaseValue::Null, DatabaseValue::Real64),
                DatabaseValue::String(hotspot.last_crime_date.format(DATE_FORMAT).to_string()),
                hotspot
                    .season
                    .map_or(DatabaseValue::Null, |s| DatabaseValue::String(s.to_string())),
                optional_string(hotspot.legal_section.as_deref()),
                optional_string(hotspot.patrol_recommendations.as_deref()),
            ],
        )
        .await?;

    returned_id(&rows, "hotspot")
}

/// Inserts a police station and returns its new ID. The `id` field of
/// `station` is ignored.
///
/// # Errors
///
/// Returns [`DbError`] if the insert fails.
pub async fn insert_police_station(
    db: &dyn Database,
    station: &PatrolStation,
) -> Result<i64, DbError> {
    let rows = db
        .query_raw_params(
            "INSERT INTO police_stations (name, address, latitude, longitude)
             VALUES (?, ?, ?, ?)
             RETURNING id",
            &[
                DatabaseValue::String(station.name.clone()),
                DatabaseValue::String(station.address.clone()),
                DatabaseValue::Real64(station.coordinate.latitude),
                DatabaseValue::Real64(station.coordinate.longitude),
            ],
        )
        .await?;

    returned_id(&rows, "police station")
}

/// Inserts an accident record and returns its new ID. The `id` field of
/// `accident` is ignored.
///
/// # Errors
///
/// Returns [`DbError`] if the insert fails.
pub async fn insert_accident(db: &dyn Database, accident: &Accident) -> Result<i64, DbError> {
    let rows = db
        .query_raw_params(
            "INSERT INTO accident_data (
                location_name, latitude, longitude, accident_type,
                legal_reference, date_occurred, severity, remarks
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            RETURNING id",
            &[
                DatabaseValue::String(accident.location_name.clone()),
                DatabaseValue::Real64(accident.coordinate.latitude),
                DatabaseValue::Real64(accident.coordinate.longitude),
                DatabaseValue::String(accident.accident_type.clone()),
                optional_string(accident.legal_reference.as_deref()),
                DatabaseValue::String(accident.date_occurred.format(DATE_FORMAT).to_string()),
                DatabaseValue::String(accident.severity.clone()),
                optional_string(accident.remarks.as_deref()),
            ],
        )
        .await?;

    returned_id(&rows, "accident")
}

fn returned_id(rows: &[Row], what: &str) -> Result<i64, DbError> {
    let row = rows.first().ok_or_else(|| DbError::Conversion {
        message: format!("Failed to get {what} id from insert"),
    })?;

    row.to_value("id").map_err(|e| DbError::Conversion {
        message: format!("Failed to parse {what} id: {e}"),
    })
}
