use sqlx::Row;
use sqlx::sqlite::SqliteRow;

use super::{Storage, from_millis, parse_label, to_millis};
use crate::error::Result;
use crate::model::{BloodRequest, RequestStatus};

const SELECT_REQUEST: &str = r#"
    SELECT id, patient, blood_type, units, hospital, contact_number, urgency, status,
           request_date, fulfilled_date, notes
    FROM blood_requests
"#;

impl Storage {
    pub async fn insert_request(&self, request: &BloodRequest) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO blood_requests (
                id, patient, blood_type, units, hospital, contact_number, urgency, status,
                request_date, fulfilled_date, notes
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&request.id)
        .bind(&request.patient)
        .bind(request.blood_type.as_str())
        .bind(request.units)
        .bind(&request.hospital)
        .bind(&request.contact_number)
        .bind(request.urgency.as_str())
        .bind(request.status.as_str())
        .bind(to_millis(request.request_date))
        .bind(request.fulfilled_date.map(to_millis))
        .bind(&request.notes)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn get_request(&self, id: &str) -> Result<Option<BloodRequest>> {
        let row = sqlx::query(&format!("{SELECT_REQUEST} WHERE id = ?"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(request_from_row).transpose()
    }

    /// All requests, most recent first.
    pub async fn list_requests(&self) -> Result<Vec<BloodRequest>> {
        let rows = sqlx::query(&format!("{SELECT_REQUEST} ORDER BY request_date DESC, id"))
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(request_from_row).collect()
    }

    pub async fn list_requests_with_status(
        &self,
        status: RequestStatus,
    ) -> Result<Vec<BloodRequest>> {
        let rows = sqlx::query(&format!(
            "{SELECT_REQUEST} WHERE status = ? ORDER BY request_date DESC, id"
        ))
        .bind(status.as_str())
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(request_from_row).collect()
    }

    pub async fn update_request(&self, request: &BloodRequest) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE blood_requests SET
                patient = ?, blood_type = ?, units = ?, hospital = ?, contact_number = ?,
                urgency = ?, status = ?, fulfilled_date = ?, notes = ?
            WHERE id = ?
            "#,
        )
        .bind(&request.patient)
        .bind(request.blood_type.as_str())
        .bind(request.units)
        .bind(&request.hospital)
        .bind(&request.contact_number)
        .bind(request.urgency.as_str())
        .bind(request.status.as_str())
        .bind(request.fulfilled_date.map(to_millis))
        .bind(&request.notes)
        .bind(&request.id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    pub async fn delete_request(&self, id: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM blood_requests WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() == 1)
    }
}

fn request_from_row(row: &SqliteRow) -> Result<BloodRequest> {
    let fulfilled: Option<i64> = row.try_get("fulfilled_date")?;

    Ok(BloodRequest {
        id: row.try_get("id")?,
        patient: row.try_get("patient")?,
        blood_type: parse_label(row.try_get("blood_type")?)?,
        units: row.try_get("units")?,
        hospital: row.try_get("hospital")?,
        contact_number: row.try_get("contact_number")?,
        urgency: parse_label(row.try_get("urgency")?)?,
        status: parse_label(row.try_get("status")?)?,
        request_date: from_millis(row.try_get("request_date")?)?,
        fulfilled_date: fulfilled.map(from_millis).transpose()?,
        notes: row.try_get("notes")?,
    })
}
