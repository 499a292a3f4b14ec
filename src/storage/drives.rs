use sqlx::Row;
use sqlx::sqlite::SqliteRow;

use super::{Storage, from_millis, parse_label, to_millis};
use crate::error::Result;
use crate::model::{DonationDrive, DriveStatus};

const SELECT_DRIVE: &str = r#"
    SELECT id, name, location, date, time, organizer, contact_number, expected_donors,
           actual_donors, status, description, created_at
    FROM drives
"#;

impl Storage {
    pub async fn insert_drive(&self, drive: &DonationDrive) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO drives (
                id, name, location, date, time, organizer, contact_number, expected_donors,
                actual_donors, status, description, created_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&drive.id)
        .bind(&drive.name)
        .bind(&drive.location)
        .bind(to_millis(drive.date))
        .bind(&drive.time)
        .bind(&drive.organizer)
        .bind(&drive.contact_number)
        .bind(drive.expected_donors)
        .bind(drive.actual_donors)
        .bind(drive.status.as_str())
        .bind(&drive.description)
        .bind(to_millis(drive.created_at))
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn get_drive(&self, id: &str) -> Result<Option<DonationDrive>> {
        let row = sqlx::query(&format!("{SELECT_DRIVE} WHERE id = ?"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(drive_from_row).transpose()
    }

    /// All drives, latest event date first.
    pub async fn list_drives(&self) -> Result<Vec<DonationDrive>> {
        let rows = sqlx::query(&format!("{SELECT_DRIVE} ORDER BY date DESC, id"))
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(drive_from_row).collect()
    }

    /// Drives whose status is one of `statuses`, soonest first.
    pub async fn list_drives_with_status(
        &self,
        statuses: &[DriveStatus],
    ) -> Result<Vec<DonationDrive>> {
        if statuses.is_empty() {
            return Ok(Vec::new());
        }

        let placeholders = vec!["?"; statuses.len()].join(", ");
        let sql = format!("{SELECT_DRIVE} WHERE status IN ({placeholders}) ORDER BY date ASC, id");

        let mut query = sqlx::query(&sql);
        for status in statuses {
            query = query.bind(status.as_str());
        }
        let rows = query.fetch_all(&self.pool).await?;

        rows.iter().map(drive_from_row).collect()
    }

    pub async fn update_drive(&self, drive: &DonationDrive) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE drives SET
                name = ?, location = ?, date = ?, time = ?, organizer = ?, contact_number = ?,
                expected_donors = ?, actual_donors = ?, status = ?, description = ?
            WHERE id = ?
            "#,
        )
        .bind(&drive.name)
        .bind(&drive.location)
        .bind(to_millis(drive.date))
        .bind(&drive.time)
        .bind(&drive.organizer)
        .bind(&drive.contact_number)
        .bind(drive.expected_donors)
        .bind(drive.actual_donors)
        .bind(drive.status.as_str())
        .bind(&drive.description)
        .bind(&drive.id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    pub async fn delete_drive(&self, id: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM drives WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() == 1)
    }
}

fn drive_from_row(row: &SqliteRow) -> Result<DonationDrive> {
    Ok(DonationDrive {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        location: row.try_get("location")?,
        date: from_millis(row.try_get("date")?)?,
        time: row.try_get("time")?,
        organizer: row.try_get("organizer")?,
        contact_number: row.try_get("contact_number")?,
        expected_donors: row.try_get("expected_donors")?,
        actual_donors: row.try_get("actual_donors")?,
        status: parse_label(row.try_get("status")?)?,
        description: row.try_get("description")?,
        created_at: from_millis(row.try_get("created_at")?)?,
    })
}
