//! Inventory records and their expiry batches.
//!
//! Every write that touches the unit counter is a single conditional
//! statement, or a short transaction that writes before it reads, so two
//! concurrent callers can never both act on a stale count.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use sqlx::Row;
use sqlx::sqlite::{SqliteConnection, SqliteRow};

use super::{Storage, from_millis, parse_label, to_millis};
use crate::error::Result;
use crate::model::{BloodType, ExpiringBatch, ExpiryBatch, InventoryRecord};

/// Outcome of [`Storage::deduct_units`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Deduction {
    /// The units were taken; the record as it now stands.
    Applied(InventoryRecord),
    /// No record exists for the blood type.
    Missing,
    /// Nothing was taken; this many units were on hand.
    Insufficient { available: i64 },
}

impl Storage {
    /// All records with their batches, ordered by blood type label.
    pub async fn list_inventory(&self) -> Result<Vec<InventoryRecord>> {
        self.load_records(None).await
    }

    /// Records holding strictly fewer than `threshold` units.
    pub async fn list_inventory_below(&self, threshold: i64) -> Result<Vec<InventoryRecord>> {
        self.load_records(Some(threshold)).await
    }

    pub async fn get_inventory(&self, blood_type: BloodType) -> Result<Option<InventoryRecord>> {
        let mut conn = self.pool.acquire().await?;
        fetch_record(&mut *conn, blood_type).await
    }

    /// Create an empty record unless one already exists.
    ///
    /// Returns the new record, or `None` if the blood type was already stocked.
    pub async fn insert_inventory_if_absent(
        &self,
        blood_type: BloodType,
        now: DateTime<Utc>,
    ) -> Result<Option<InventoryRecord>> {
        let result = sqlx::query(
            r#"
            INSERT INTO inventory (blood_type, units, last_updated)
            VALUES (?, 0, ?)
            ON CONFLICT(blood_type) DO NOTHING
            "#,
        )
        .bind(blood_type.as_str())
        .bind(to_millis(now))
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }

        Ok(Some(InventoryRecord {
            blood_type,
            units: 0,
            last_updated: now,
            expiry_batches: Vec::new(),
        }))
    }

    /// Add `units` to the record, creating it if needed, and optionally
    /// append a batch `(expiry_date, donation_date)` of the same size.
    pub async fn add_units(
        &self,
        blood_type: BloodType,
        units: i64,
        batch: Option<(DateTime<Utc>, DateTime<Utc>)>,
        now: DateTime<Utc>,
    ) -> Result<InventoryRecord> {
        let mut tx = self.pool.begin().await?;

        // The WHERE guard skips the update if the sum would overflow INTEGER
        let result = sqlx::query(
            r#"
            INSERT INTO inventory (blood_type, units, last_updated)
            VALUES (?, ?, ?)
            ON CONFLICT(blood_type) DO UPDATE SET
                units = units + excluded.units,
                last_updated = excluded.last_updated
            WHERE inventory.units <= ?
            "#,
        )
        .bind(blood_type.as_str())
        .bind(units)
        .bind(to_millis(now))
        .bind(i64::MAX - units)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(crate::Error::InvalidQuantity(format!(
                "adding {units} unit(s) would overflow the {blood_type} stock count"
            )));
        }

        if let Some((expiry_date, donation_date)) = batch {
            sqlx::query(
                r#"
                INSERT INTO expiry_batches (blood_type, units, expiry_date, donation_date)
                VALUES (?, ?, ?, ?)
                "#,
            )
            .bind(blood_type.as_str())
            .bind(units)
            .bind(to_millis(expiry_date))
            .bind(to_millis(donation_date))
            .execute(&mut *tx)
            .await?;
        }

        let record = fetch_record(&mut *tx, blood_type).await?.ok_or_else(|| {
            crate::Error::Internal(format!("inventory record for {blood_type} vanished mid-write"))
        })?;
        tx.commit().await?;

        Ok(record)
    }

    /// Overwrite the unit counter. Batches are left as they are.
    ///
    /// Returns `None` if no record exists.
    pub async fn set_units(
        &self,
        blood_type: BloodType,
        units: i64,
        now: DateTime<Utc>,
    ) -> Result<Option<InventoryRecord>> {
        let mut tx = self.pool.begin().await?;

        let result =
            sqlx::query("UPDATE inventory SET units = ?, last_updated = ? WHERE blood_type = ?")
                .bind(units)
                .bind(to_millis(now))
                .bind(blood_type.as_str())
                .execute(&mut *tx)
                .await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }

        let record = fetch_record(&mut *tx, blood_type).await?;
        tx.commit().await?;

        Ok(record)
    }

    /// Take `units` off the counter only if at least that many are on hand.
    ///
    /// The check and the write are one statement, so the count can never go
    /// below zero and a refused deduction changes nothing.
    pub async fn deduct_units(
        &self,
        blood_type: BloodType,
        units: i64,
        now: DateTime<Utc>,
    ) -> Result<Deduction> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            r#"
            UPDATE inventory
            SET units = units - ?, last_updated = ?
            WHERE blood_type = ? AND units >= ?
            "#,
        )
        .bind(units)
        .bind(to_millis(now))
        .bind(blood_type.as_str())
        .bind(units)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 1 {
            let record = fetch_record(&mut *tx, blood_type).await?.ok_or_else(|| {
                crate::Error::Internal(format!("inventory record for {blood_type} vanished mid-write"))
            })?;
            tx.commit().await?;
            return Ok(Deduction::Applied(record));
        }

        let available: Option<i64> =
            sqlx::query_scalar("SELECT units FROM inventory WHERE blood_type = ?")
                .bind(blood_type.as_str())
                .fetch_optional(&mut *tx)
                .await?;

        Ok(match available {
            Some(available) => Deduction::Insufficient { available },
            None => Deduction::Missing,
        })
    }

    /// Every batch expiring at or before `cutoff`, grouped by blood type label
    /// and then in arrival order.
    pub async fn list_batches_expiring_by(
        &self,
        cutoff: DateTime<Utc>,
    ) -> Result<Vec<ExpiringBatch>> {
        let rows = sqlx::query(
            r#"
            SELECT blood_type, units, expiry_date
            FROM expiry_batches
            WHERE expiry_date <= ?
            ORDER BY blood_type, id
            "#,
        )
        .bind(to_millis(cutoff))
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| -> Result<ExpiringBatch> {
                Ok(ExpiringBatch {
                    blood_type: parse_label(row.try_get("blood_type")?)?,
                    units: row.try_get("units")?,
                    expiry_date: from_millis(row.try_get("expiry_date")?)?,
                })
            })
            .collect()
    }

    /// Sum of `units` across all records.
    pub async fn total_units(&self) -> Result<i64> {
        let total: i64 = sqlx::query_scalar("SELECT COALESCE(SUM(units), 0) FROM inventory")
            .fetch_one(&self.pool)
            .await?;

        Ok(total)
    }

    async fn load_records(&self, below: Option<i64>) -> Result<Vec<InventoryRecord>> {
        // One read transaction so records and batches come from the same snapshot
        let mut tx = self.pool.begin().await?;

        let rows = sqlx::query(
            r#"
            SELECT blood_type, units, last_updated
            FROM inventory
            WHERE ?1 IS NULL OR units < ?1
            ORDER BY blood_type
            "#,
        )
        .bind(below)
        .fetch_all(&mut *tx)
        .await?;

        let batch_rows = sqlx::query(
            r#"
            SELECT b.id, b.blood_type, b.units, b.expiry_date, b.donation_date
            FROM expiry_batches b
            JOIN inventory i ON i.blood_type = b.blood_type
            WHERE ?1 IS NULL OR i.units < ?1
            ORDER BY b.blood_type, b.id
            "#,
        )
        .bind(below)
        .fetch_all(&mut *tx)
        .await?;

        tx.commit().await?;

        let mut batches: HashMap<String, Vec<ExpiryBatch>> = HashMap::new();
        for row in &batch_rows {
            let blood_type: String = row.try_get("blood_type")?;
            batches.entry(blood_type).or_default().push(batch_from_row(row)?);
        }

        rows.iter()
            .map(|row| -> Result<InventoryRecord> {
                let label: String = row.try_get("blood_type")?;
                let expiry_batches = batches.remove(&label).unwrap_or_default();
                record_from_row(row, expiry_batches)
            })
            .collect()
    }
}

async fn fetch_record(
    conn: &mut SqliteConnection,
    blood_type: BloodType,
) -> Result<Option<InventoryRecord>> {
    let row = sqlx::query("SELECT blood_type, units, last_updated FROM inventory WHERE blood_type = ?")
        .bind(blood_type.as_str())
        .fetch_optional(&mut *conn)
        .await?;

    let Some(row) = row else {
        return Ok(None);
    };

    let batch_rows = sqlx::query(
        r#"
        SELECT id, units, expiry_date, donation_date
        FROM expiry_batches
        WHERE blood_type = ?
        ORDER BY id
        "#,
    )
    .bind(blood_type.as_str())
    .fetch_all(&mut *conn)
    .await?;

    let batches = batch_rows
        .iter()
        .map(batch_from_row)
        .collect::<Result<Vec<_>>>()?;

    record_from_row(&row, batches).map(Some)
}

fn record_from_row(row: &SqliteRow, expiry_batches: Vec<ExpiryBatch>) -> Result<InventoryRecord> {
    Ok(InventoryRecord {
        blood_type: parse_label(row.try_get("blood_type")?)?,
        units: row.try_get("units")?,
        last_updated: from_millis(row.try_get("last_updated")?)?,
        expiry_batches,
    })
}

fn batch_from_row(row: &SqliteRow) -> Result<ExpiryBatch> {
    Ok(ExpiryBatch {
        id: row.try_get("id")?,
        units: row.try_get("units")?,
        expiry_date: from_millis(row.try_get("expiry_date")?)?,
        donation_date: from_millis(row.try_get("donation_date")?)?,
    })
}
