#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! `SQLite` storage for the crime dashboard.
//!
//! Uses `switchy_database` for all access. The schema is created on open
//! with `CREATE TABLE IF NOT EXISTS`, so a fresh file is usable straight
//! away and an existing one is left untouched.

pub mod queries;

use std::path::Path;

use switchy_database::Database;
use switchy_database_connection::init_sqlite_rusqlite;

/// Default path for the crime database.
pub const DEFAULT_DB_PATH: &str = "data/crime_data.db";

/// Errors that can occur during database operations.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    /// Database query error.
    #[error("Database error: {0}")]
    Database(#[from] switchy_database::DatabaseError),

    /// The database file could not be opened.
    #[error("Connection error: {0}")]
    Connection(String),

    /// An I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Data conversion error.
    #[error("Data conversion error: {message}")]
    Conversion {
        /// Description of what went wrong.
        message: String,
    },
}

/// Opens (or creates) the crime database at `path` and ensures the schema
/// exists.
///
/// # Errors
///
/// Returns [`DbError`] if the file cannot be opened or schema creation
/// fails.
pub async fn open_db(path: &Path) -> Result<Box<dyn Database>, DbError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    log::info!("Opening crime database at {}", path.display());
    let db = init_sqlite_rusqlite(Some(path)).map_err(|e| DbError::Connection(e.to_string()))?;

    ensure_schema(db.as_ref()).await?;

    Ok(db)
}

/// Creates all tables if they don't already exist.
async fn ensure_schema(db: &dyn Database) -> Result<(), DbError> {
    db.exec_raw(
        "CREATE TABLE IF NOT EXISTS hotspots (
            id                     INTEGER PRIMARY KEY AUTOINCREMENT,
            hotspot_name           TEXT NOT NULL,
            latitude               REAL NOT NULL,
            longitude              REAL NOT NULL,
            crime_type             TEXT NOT NULL,
            severity               INTEGER NOT NULL,
            reported_incidents     INTEGER NOT NULL DEFAULT 0,
            average_incidents      REAL,
            last_crime_date        TEXT NOT NULL,
            season                 TEXT,
            legal_section          TEXT,
            patrol_recommendations TEXT
        )",
    )
    .await?;

    db.exec_raw(
        "CREATE TABLE IF NOT EXISTS police_stations (
            id        INTEGER PRIMARY KEY AUTOINCREMENT,
            name      TEXT NOT NULL,
            address   TEXT NOT NULL,
            latitude  REAL NOT NULL,
            longitude REAL NOT NULL
        )",
    )
    .await?;

    db.exec_raw(
        "CREATE TABLE IF NOT EXISTS accident_data (
            id              INTEGER PRIMARY KEY AUTOINCREMENT,
            location_name   TEXT NOT NULL,
            latitude        REAL NOT NULL,
            longitude       REAL NOT NULL,
            accident_type   TEXT NOT NULL,
            legal_reference TEXT,
            date_occurred   TEXT NOT NULL,
            severity        TEXT NOT NULL,
            remarks         TEXT
        )",
    )
    .await?;

    db.exec_raw("CREATE INDEX IF NOT EXISTS idx_hotspots_season ON hotspots (season)")
        .await?;

    Ok(())
}
