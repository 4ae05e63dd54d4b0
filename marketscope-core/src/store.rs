//! SQLite store — the persister stage.
//!
//! Two tables, `observations` and `entity_profiles`, written with a
//! replace-all policy: each run drops and recreates a table inside one
//! transaction, so the store always holds exactly the latest snapshot.
//! The two table writes are independently failable — a failure names the
//! table and leaves the other untouched.
//!
//! Reporters read through the query methods here and never mutate.

use chrono::NaiveDate;
use rusqlite::{params, Connection};
use std::path::Path;
use thiserror::Error;

use crate::domain::{EntityProfile, MetricRow};

/// Store failure, naming the table where applicable.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{table} write failed: {source}")]
    Table {
        table: &'static str,
        source: rusqlite::Error,
    },

    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("invalid date in store: {0}")]
    InvalidDate(String),
}

/// One row of the observation ⋈ profile join consumed by report views.
#[derive(Debug, Clone)]
pub struct JoinedRow {
    pub symbol: String,
    pub company: String,
    pub sector: String,
    pub market_cap: i64,
    pub date: NaiveDate,
    pub close: f64,
    pub volume: u64,
    pub daily_change: Option<f64>,
    pub volatility_30d: Option<f64>,
    pub ma_7: Option<f64>,
    pub ma_30: Option<f64>,
}

/// Canonical store for one collection run's data.
pub struct MarketStore {
    conn: Connection,
}

impl MarketStore {
    /// Open (or create) the database file.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        Ok(Self {
            conn: Connection::open(path)?,
        })
    }

    /// In-memory store for tests.
    pub fn open_in_memory() -> Result<Self, StoreError> {
        Ok(Self {
            conn: Connection::open_in_memory()?,
        })
    }

    /// Replace the observations table with this batch. Returns rows written.
    pub fn replace_observations(&mut self, rows: &[MetricRow]) -> Result<usize, StoreError> {
        let table_err = |source| StoreError::Table {
            table: "observations",
            source,
        };

        let tx = self.conn.transaction().map_err(table_err)?;
        tx.execute_batch(
            "DROP TABLE IF EXISTS observations;
             CREATE TABLE observations (
                 symbol           TEXT NOT NULL,
                 date             TEXT NOT NULL,
                 open             REAL NOT NULL,
                 high             REAL NOT NULL,
                 low              REAL NOT NULL,
                 close            REAL NOT NULL,
                 volume           INTEGER NOT NULL,
                 daily_change     REAL,
                 daily_change_abs REAL,
                 volatility_30d   REAL,
                 ma_7             REAL,
                 ma_30            REAL,
                 volume_ma_7      REAL,
                 volume_ratio     REAL,
                 daily_range      REAL
             );",
        )
        .map_err(table_err)?;

        {
            let mut stmt = tx
                .prepare(
                    "INSERT INTO observations (
                         symbol, date, open, high, low, close, volume,
                         daily_change, daily_change_abs, volatility_30d,
                         ma_7, ma_30, volume_ma_7, volume_ratio, daily_range
                     ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)",
                )
                .map_err(table_err)?;

            for row in rows {
                stmt.execute(params![
                    row.symbol,
                    row.date.to_string(),
                    row.open,
                    row.high,
                    row.low,
                    row.close,
                    row.volume as i64,
                    row.daily_change,
                    row.daily_change_abs,
                    row.volatility_30d,
                    row.ma_7,
                    row.ma_30,
                    row.volume_ma_7,
                    row.volume_ratio,
                    row.daily_range,
                ])
                .map_err(table_err)?;
            }
        }

        tx.commit().map_err(table_err)?;
        Ok(rows.len())
    }

    /// Replace the entity_profiles table with this batch. Returns rows written.
    pub fn replace_profiles(&mut self, profiles: &[EntityProfile]) -> Result<usize, StoreError> {
        let table_err = |source| StoreError::Table {
            table: "entity_profiles",
            source,
        };

        let tx = self.conn.transaction().map_err(table_err)?;
        tx.execute_batch(
            "DROP TABLE IF EXISTS entity_profiles;
             CREATE TABLE entity_profiles (
                 symbol       TEXT NOT NULL,
                 company      TEXT NOT NULL,
                 sector       TEXT NOT NULL,
                 industry     TEXT NOT NULL,
                 country      TEXT NOT NULL,
                 market_cap   INTEGER NOT NULL,
                 revenue      INTEGER NOT NULL,
                 employees    INTEGER NOT NULL,
                 collected_at TEXT NOT NULL
             );",
        )
        .map_err(table_err)?;

        {
            let mut stmt = tx
                .prepare(
                    "INSERT INTO entity_profiles (
                         symbol, company, sector, industry, country,
                         market_cap, revenue, employees, collected_at
                     ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                )
                .map_err(table_err)?;

            for profile in profiles {
                stmt.execute(params![
                    profile.symbol,
                    profile.company,
                    profile.sector,
                    profile.industry,
                    profile.country,
                    profile.market_cap,
                    profile.revenue,
                    profile.employees,
                    profile.collected_at.to_string(),
                ])
                .map_err(table_err)?;
            }
        }

        tx.commit().map_err(table_err)?;
        Ok(profiles.len())
    }

    /// Create non-unique secondary indexes for the reporter's range and
    /// group-by queries.
    pub fn create_indexes(&self) -> Result<(), StoreError> {
        self.conn.execute_batch(
            "CREATE INDEX IF NOT EXISTS idx_obs_symbol_date ON observations(symbol, date);
             CREATE INDEX IF NOT EXISTS idx_obs_date ON observations(date);
             CREATE INDEX IF NOT EXISTS idx_obs_symbol ON observations(symbol);
             CREATE INDEX IF NOT EXISTS idx_profiles_symbol ON entity_profiles(symbol);
             CREATE INDEX IF NOT EXISTS idx_profiles_sector ON entity_profiles(sector);",
        )?;
        Ok(())
    }

    pub fn observation_count(&self) -> Result<usize, StoreError> {
        let count: i64 =
            self.conn
                .query_row("SELECT COUNT(*) FROM observations", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    pub fn profile_count(&self) -> Result<usize, StoreError> {
        let count: i64 =
            self.conn
                .query_row("SELECT COUNT(*) FROM entity_profiles", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    pub fn symbol_count(&self) -> Result<usize, StoreError> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(DISTINCT symbol) FROM observations",
            [],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }

    /// Total market cap across all tracked profiles; zero when the table is
    /// empty.
    pub fn total_market_cap(&self) -> Result<i64, StoreError> {
        let total: Option<i64> = self.conn.query_row(
            "SELECT SUM(market_cap) FROM entity_profiles",
            [],
            |row| row.get(0),
        )?;
        Ok(total.unwrap_or(0))
    }

    /// Earliest and latest observation dates, or None if the table is empty.
    pub fn date_range(&self) -> Result<Option<(NaiveDate, NaiveDate)>, StoreError> {
        let (min, max): (Option<String>, Option<String>) = self.conn.query_row(
            "SELECT MIN(date), MAX(date) FROM observations",
            [],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;
        match (min, max) {
            (Some(min), Some(max)) => Ok(Some((parse_date(&min)?, parse_date(&max)?))),
            _ => Ok(None),
        }
    }

    /// Observation ⋈ profile join for rows on or after `since`, ordered by
    /// symbol then date. Observations without a profile are dropped by the
    /// inner join, matching the report queries' semantics.
    pub fn joined_rows(&self, since: NaiveDate) -> Result<Vec<JoinedRow>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT o.symbol, p.company, p.sector, p.market_cap,
                    o.date, o.close, o.volume,
                    o.daily_change, o.volatility_30d, o.ma_7, o.ma_30
             FROM observations o
             JOIN entity_profiles p ON o.symbol = p.symbol
             WHERE o.date >= ?1
             ORDER BY o.symbol, o.date",
        )?;

        let rows = stmt
            .query_map(params![since.to_string()], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, i64>(3)?,
                    row.get::<_, String>(4)?,
                    row.get::<_, f64>(5)?,
                    row.get::<_, i64>(6)?,
                    row.get::<_, Option<f64>>(7)?,
                    row.get::<_, Option<f64>>(8)?,
                    row.get::<_, Option<f64>>(9)?,
                    row.get::<_, Option<f64>>(10)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter()
            .map(
                |(
                    symbol,
                    company,
                    sector,
                    market_cap,
                    date,
                    close,
                    volume,
                    daily_change,
                    volatility_30d,
                    ma_7,
                    ma_30,
                )| {
                    Ok(JoinedRow {
                        symbol,
                        company,
                        sector,
                        market_cap,
                        date: parse_date(&date)?,
                        close,
                        volume: volume.max(0) as u64,
                        daily_change,
                        volatility_30d,
                        ma_7,
                        ma_30,
                    })
                },
            )
            .collect()
    }
}

fn parse_date(s: &str) -> Result<NaiveDate, StoreError> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|_| StoreError::InvalidDate(s.to_string()))
}
