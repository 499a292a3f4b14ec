//! SQLite record store.
//!
//! One table per collection (`donors`, `drives`, `blood_requests`,
//! `inventory`) plus `expiry_batches`, which holds the batches of each
//! inventory record in arrival order.
//!
//! Timestamps are stored as Unix milliseconds and enums as their labels.
//! Each collection's queries live in its own submodule as an `impl Storage`
//! block.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};
use sqlx::Row;
use uuid::Uuid;

use crate::error::{Error, Result};

mod donors;
mod drives;
mod inventory;
mod requests;

pub use inventory::Deduction;

/// Statements run on startup. All are idempotent.
const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS donors (
        id TEXT PRIMARY KEY,
        first_name TEXT NOT NULL,
        last_name TEXT NOT NULL,
        email TEXT,
        contact TEXT NOT NULL,
        address TEXT NOT NULL DEFAULT '',
        city TEXT NOT NULL DEFAULT '',
        dob TEXT,
        blood_type TEXT NOT NULL,
        weight REAL,
        gender TEXT,
        emergency_name TEXT NOT NULL DEFAULT '',
        emergency_phone TEXT NOT NULL DEFAULT '',
        availability TEXT NOT NULL,
        months_since_first_donation INTEGER NOT NULL DEFAULT 0,
        donation_count INTEGER NOT NULL DEFAULT 0,
        pints_donated REAL NOT NULL DEFAULT 0,
        medical_history TEXT NOT NULL DEFAULT '',
        status TEXT NOT NULL,
        created_at INTEGER NOT NULL,
        last_donation INTEGER
    )
    "#,
    "CREATE UNIQUE INDEX IF NOT EXISTS idx_donors_email ON donors(email) WHERE email IS NOT NULL",
    "CREATE INDEX IF NOT EXISTS idx_donors_blood_type ON donors(blood_type)",
    "CREATE INDEX IF NOT EXISTS idx_donors_created_at ON donors(created_at)",
    r#"
    CREATE TABLE IF NOT EXISTS drives (
        id TEXT PRIMARY KEY,
        name TEXT NOT NULL,
        location TEXT NOT NULL,
        date INTEGER NOT NULL,
        time TEXT NOT NULL,
        organizer TEXT NOT NULL,
        contact_number TEXT NOT NULL,
        expected_donors INTEGER NOT NULL DEFAULT 0,
        actual_donors INTEGER NOT NULL DEFAULT 0,
        status TEXT NOT NULL,
        description TEXT NOT NULL DEFAULT '',
        created_at INTEGER NOT NULL
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_drives_status_date ON drives(status, date)",
    r#"
    CREATE TABLE IF NOT EXISTS blood_requests (
        id TEXT PRIMARY KEY,
        patient TEXT NOT NULL,
        blood_type TEXT NOT NULL,
        units INTEGER NOT NULL CHECK (units > 0),
        hospital TEXT NOT NULL,
        contact_number TEXT NOT NULL,
        urgency TEXT NOT NULL,
        status TEXT NOT NULL,
        request_date INTEGER NOT NULL,
        fulfilled_date INTEGER,
        notes TEXT NOT NULL DEFAULT ''
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_blood_requests_status ON blood_requests(status, request_date)",
    r#"
    CREATE TABLE IF NOT EXISTS inventory (
        blood_type TEXT PRIMARY KEY,
        units INTEGER NOT NULL DEFAULT 0 CHECK (units >= 0),
        last_updated INTEGER NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS expiry_batches (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        blood_type TEXT NOT NULL REFERENCES inventory(blood_type),
        units INTEGER NOT NULL CHECK (units >= 0),
        expiry_date INTEGER NOT NULL,
        donation_date INTEGER NOT NULL
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_expiry_batches_blood_type ON expiry_batches(blood_type, id)",
    "CREATE INDEX IF NOT EXISTS idx_expiry_batches_expiry ON expiry_batches(expiry_date)",
];

/// Database connection pool wrapper.
///
/// Cheap to clone; every clone shares the same pool.
#[derive(Clone)]
pub struct Storage {
    pool: SqlitePool,
}

impl Storage {
    /// Create a new storage instance and initialize the schema.
    ///
    /// # Arguments
    ///
    /// * `database_url` - SQLite connection string (e.g., "sqlite:bloodbank.db?mode=rwc" or "sqlite::memory:")
    pub async fn new(database_url: &str) -> Result<Self> {
        // Every connection to an in-memory database opens a fresh, empty one,
        // so keep exactly one connection alive for the lifetime of the pool.
        let options = if database_url.contains(":memory:") || database_url.contains("mode=memory") {
            SqlitePoolOptions::new()
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            SqlitePoolOptions::new().max_connections(5)
        };

        let pool = options.connect(database_url).await?;

        let storage = Self { pool };
        storage.initialize_schema().await?;

        Ok(storage)
    }

    /// Create the database schema if it doesn't exist.
    async fn initialize_schema(&self) -> Result<()> {
        for statement in SCHEMA {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        Ok(())
    }

    /// Number of rows in `table`.
    pub(crate) async fn count(&self, table: Table) -> Result<i64> {
        let row = sqlx::query(&format!("SELECT COUNT(*) AS total FROM {}", table.name()))
            .fetch_one(&self.pool)
            .await?;

        Ok(row.try_get("total")?)
    }

    /// Row counts of `table` grouped by the label stored in `column`,
    /// ordered by label.
    pub(crate) async fn count_grouped(
        &self,
        table: Table,
        column: &'static str,
    ) -> Result<Vec<(String, i64)>> {
        let rows = sqlx::query(&format!(
            "SELECT {column} AS label, COUNT(*) AS total FROM {} GROUP BY {column} ORDER BY {column}",
            table.name()
        ))
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| -> Result<(String, i64)> {
                Ok((row.try_get("label")?, row.try_get("total")?))
            })
            .collect()
    }
}

/// The entity collections, for the generic count queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Table {
    Donors,
    Drives,
    Requests,
}

impl Table {
    fn name(self) -> &'static str {
        match self {
            Table::Donors => "donors",
            Table::Drives => "drives",
            Table::Requests => "blood_requests",
        }
    }
}

/// Fresh record identifier.
pub(crate) fn new_id() -> String {
    Uuid::new_v4().to_string()
}

pub(crate) fn to_millis(ts: DateTime<Utc>) -> i64 {
    ts.timestamp_millis()
}

pub(crate) fn from_millis(ms: i64) -> Result<DateTime<Utc>> {
    DateTime::from_timestamp_millis(ms)
        .ok_or_else(|| Error::Internal(format!("stored timestamp out of range: {ms}")))
}

/// Decode a stored enum label.
pub(crate) fn parse_label<T>(raw: &str) -> Result<T>
where
    T: FromStr<Err = Error>,
{
    raw.parse()
        .map_err(|e| Error::Internal(format!("corrupt stored value: {e}")))
}

/// Turn a unique-constraint failure into a validation error carrying `message`.
pub(crate) fn map_unique_violation(err: sqlx::Error, message: &str) -> Error {
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => Error::validation(message),
        _ => Error::Storage(err),
    }
}
