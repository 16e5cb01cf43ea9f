//! SQLite-backed observation series.
//!
//! Instants are stored as UTC epoch milliseconds so range filters and the
//! `(location_name, record_timestamp DESC)` index compare integers.

use anyhow::Context;
use chrono::{DateTime, SubsecRound, TimeZone, Utc};
use parking_lot::Mutex;
use rusqlite::{Connection, OptionalExtension, params, types::Type};
use std::{fs, path::Path};
use tracing::debug;

use crate::{
    error::StoreError,
    model::{Observation, StoredObservation, WindDirection, normalize_location_name},
};

use super::{ObservationStore, prepare};

const SELECT_COLUMNS: &str = "id, location_name, region, country, latitude, longitude, \
     condition_text, condition_icon_url, temperature_c, feels_like_c, dewpoint_c, \
     wind_speed_kph, gust_speed_kph, wind_direction, pressure_mb, precipitation_mm, \
     humidity_pct, uv_index, visibility_km, record_timestamp, created_on";

pub struct SqliteObservationStore {
    conn: Mutex<Connection>,
}

impl SqliteObservationStore {
    /// Open (or create) the database file and its schema.
    pub fn open<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create database directory: {}", parent.display())
            })?;
        }

        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open observation database: {}", path.display()))?;
        Self::with_connection(conn)
    }

    pub fn in_memory() -> anyhow::Result<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> anyhow::Result<Self> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS observations (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                location_name TEXT NOT NULL,
                region TEXT NOT NULL,
                country TEXT NOT NULL,
                latitude REAL,
                longitude REAL,
                condition_text TEXT NOT NULL,
                condition_icon_url TEXT NOT NULL,
                temperature_c REAL NOT NULL,
                feels_like_c REAL NOT NULL,
                dewpoint_c REAL NOT NULL,
                wind_speed_kph REAL NOT NULL,
                gust_speed_kph REAL NOT NULL,
                wind_direction TEXT NOT NULL,
                pressure_mb REAL NOT NULL,
                precipitation_mm REAL NOT NULL,
                humidity_pct REAL NOT NULL,
                uv_index INTEGER NOT NULL,
                visibility_km REAL NOT NULL,
                record_timestamp INTEGER NOT NULL,
                created_on INTEGER NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_observations_location_time
                ON observations(location_name, record_timestamp DESC);
            "#,
        )
        .context("Failed to initialize observation schema")?;

        Ok(Self { conn: Mutex::new(conn) })
    }

    fn row_to_stored(row: &rusqlite::Row) -> rusqlite::Result<StoredObservation> {
        let wind: String = row.get(13)?;
        let wind_direction = wind
            .parse::<WindDirection>()
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(13, Type::Text, Box::new(e)))?;

        Ok(StoredObservation {
            id: row.get(0)?,
            observation: Observation {
                location_name: row.get(1)?,
                region: row.get(2)?,
                country: row.get(3)?,
                latitude: row.get(4)?,
                longitude: row.get(5)?,
                condition_text: row.get(6)?,
                condition_icon_url: row.get(7)?,
                temperature_c: row.get(8)?,
                feels_like_c: row.get(9)?,
                dewpoint_c: row.get(10)?,
                wind_speed_kph: row.get(11)?,
                gust_speed_kph: row.get(12)?,
                wind_direction,
                pressure_mb: row.get(14)?,
                precipitation_mm: row.get(15)?,
                humidity_pct: row.get(16)?,
                uv_index: row.get(17)?,
                visibility_km: row.get(18)?,
                record_timestamp: millis_column(row, 19)?,
            },
            created_on: millis_column(row, 20)?,
        })
    }
}

fn millis_column(row: &rusqlite::Row, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let ms: i64 = row.get(idx)?;
    Utc.timestamp_millis_opt(ms).single().ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            idx,
            Type::Integer,
            Box::new(rusqlite::types::FromSqlError::OutOfRange(ms)),
        )
    })
}

/// Lower bounds round up so a row just before a sub-millisecond `from`
/// stays excluded.
fn ceil_millis(instant: DateTime<Utc>) -> i64 {
    instant.timestamp_millis() + i64::from(instant.timestamp_subsec_nanos() % 1_000_000 != 0)
}

impl ObservationStore for SqliteObservationStore {
    fn append(&self, observation: Observation) -> Result<StoredObservation, StoreError> {
        let mut observation = prepare(observation)?;
        observation.record_timestamp = observation.record_timestamp.trunc_subsecs(3);
        let created_on = Utc::now().trunc_subsecs(3);
        let o = &observation;

        let conn = self.conn.lock();
        conn.execute(
            "INSERT INTO observations (
                location_name, region, country, latitude, longitude,
                condition_text, condition_icon_url, temperature_c, feels_like_c, dewpoint_c,
                wind_speed_kph, gust_speed_kph, wind_direction, pressure_mb, precipitation_mm,
                humidity_pct, uv_index, visibility_km, record_timestamp, created_on
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?19, ?20)",
            params![
                o.location_name,
                o.region,
                o.country,
                o.latitude,
                o.longitude,
                o.condition_text,
                o.condition_icon_url,
                o.temperature_c,
                o.feels_like_c,
                o.dewpoint_c,
                o.wind_speed_kph,
                o.gust_speed_kph,
                o.wind_direction.as_str(),
                o.pressure_mb,
                o.precipitation_mm,
                o.humidity_pct,
                o.uv_index,
                o.visibility_km,
                o.record_timestamp.timestamp_millis(),
                created_on.timestamp_millis(),
            ],
        )?;
        let id = conn.last_insert_rowid();

        debug!(id, location = %observation.location_name, "Stored observation");
        Ok(StoredObservation { id, observation, created_on })
    }

    fn latest(&self, location_name: &str) -> Result<Option<StoredObservation>, StoreError> {
        let key = normalize_location_name(location_name);
        let conn = self.conn.lock();

        let sql = format!(
            "SELECT {SELECT_COLUMNS} FROM observations
             WHERE location_name = ?1
             ORDER BY record_timestamp DESC
             LIMIT 1"
        );
        let latest = conn.query_row(&sql, params![key], Self::row_to_stored).optional()?;
        Ok(latest)
    }

    fn range(
        &self,
        location_name: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<StoredObservation>, StoreError> {
        let key = normalize_location_name(location_name);
        let conn = self.conn.lock();

        let sql = format!(
            "SELECT {SELECT_COLUMNS} FROM observations
             WHERE location_name = ?1 AND record_timestamp BETWEEN ?2 AND ?3
             ORDER BY record_timestamp ASC, id ASC"
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(
            params![key, ceil_millis(from), to.timestamp_millis()],
            Self::row_to_stored,
        )?;

        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }
}
