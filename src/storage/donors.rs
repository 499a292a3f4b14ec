use chrono::NaiveDate;
use sqlx::Row;
use sqlx::sqlite::SqliteRow;

use super::{Storage, from_millis, map_unique_violation, parse_label, to_millis};
use crate::error::{Error, Result};
use crate::model::{BloodType, Donor};

const DUPLICATE_EMAIL: &str = "A donor with this email is already registered";

const SELECT_DONOR: &str = r#"
    SELECT id, first_name, last_name, email, contact, address, city, dob, blood_type,
           weight, gender, emergency_name, emergency_phone, availability,
           months_since_first_donation, donation_count, pints_donated, medical_history,
           status, created_at, last_donation
    FROM donors
"#;

impl Storage {
    pub async fn insert_donor(&self, donor: &Donor) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO donors (
                id, first_name, last_name, email, contact, address, city, dob, blood_type,
                weight, gender, emergency_name, emergency_phone, availability,
                months_since_first_donation, donation_count, pints_donated, medical_history,
                status, created_at, last_donation
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&donor.id)
        .bind(&donor.first_name)
        .bind(&donor.last_name)
        .bind(&donor.email)
        .bind(&donor.contact)
        .bind(&donor.address)
        .bind(&donor.city)
        .bind(donor.date_of_birth.map(|d| d.to_string()))
        .bind(donor.blood_type.as_str())
        .bind(donor.weight)
        .bind(donor.gender.map(|g| g.as_str()))
        .bind(&donor.emergency_name)
        .bind(&donor.emergency_phone)
        .bind(donor.availability.as_str())
        .bind(donor.months_since_first_donation)
        .bind(donor.donation_count)
        .bind(donor.pints_donated)
        .bind(&donor.medical_history)
        .bind(donor.status.as_str())
        .bind(to_millis(donor.created_at))
        .bind(donor.last_donation.map(to_millis))
        .execute(&self.pool)
        .await
        .map_err(|e| map_unique_violation(e, DUPLICATE_EMAIL))?;

        Ok(())
    }

    pub async fn get_donor(&self, id: &str) -> Result<Option<Donor>> {
        let row = sqlx::query(&format!("{SELECT_DONOR} WHERE id = ?"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(donor_from_row).transpose()
    }

    /// All donors, newest registration first.
    pub async fn list_donors(&self) -> Result<Vec<Donor>> {
        let rows = sqlx::query(&format!("{SELECT_DONOR} ORDER BY created_at DESC, id"))
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(donor_from_row).collect()
    }

    pub async fn list_donors_by_blood_type(&self, blood_type: BloodType) -> Result<Vec<Donor>> {
        let rows = sqlx::query(&format!(
            "{SELECT_DONOR} WHERE blood_type = ? ORDER BY created_at DESC, id"
        ))
        .bind(blood_type.as_str())
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(donor_from_row).collect()
    }

    /// Overwrite every mutable column. Returns `false` if the donor is gone.
    pub async fn update_donor(&self, donor: &Donor) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE donors SET
                first_name = ?, last_name = ?, email = ?, contact = ?, address = ?, city = ?,
                dob = ?, blood_type = ?, weight = ?, gender = ?, emergency_name = ?,
                emergency_phone = ?, availability = ?, months_since_first_donation = ?,
                donation_count = ?, pints_donated = ?, medical_history = ?, status = ?,
                last_donation = ?
            WHERE id = ?
            "#,
        )
        .bind(&donor.first_name)
        .bind(&donor.last_name)
        .bind(&donor.email)
        .bind(&donor.contact)
        .bind(&donor.address)
        .bind(&donor.city)
        .bind(donor.date_of_birth.map(|d| d.to_string()))
        .bind(donor.blood_type.as_str())
        .bind(donor.weight)
        .bind(donor.gender.map(|g| g.as_str()))
        .bind(&donor.emergency_name)
        .bind(&donor.emergency_phone)
        .bind(donor.availability.as_str())
        .bind(donor.months_since_first_donation)
        .bind(donor.donation_count)
        .bind(donor.pints_donated)
        .bind(&donor.medical_history)
        .bind(donor.status.as_str())
        .bind(donor.last_donation.map(to_millis))
        .bind(&donor.id)
        .execute(&self.pool)
        .await
        .map_err(|e| map_unique_violation(e, DUPLICATE_EMAIL))?;

        Ok(result.rows_affected() == 1)
    }

    /// Returns `false` if there was nothing to delete.
    pub async fn delete_donor(&self, id: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM donors WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() == 1)
    }
}

fn donor_from_row(row: &SqliteRow) -> Result<Donor> {
    let dob: Option<String> = row.try_get("dob")?;
    let date_of_birth = dob
        .map(|raw| {
            NaiveDate::parse_from_str(&raw, "%Y-%m-%d")
                .map_err(|e| Error::Internal(format!("corrupt stored dob '{raw}': {e}")))
        })
        .transpose()?;

    let gender: Option<String> = row.try_get("gender")?;
    let last_donation: Option<i64> = row.try_get("last_donation")?;

    Ok(Donor {
        id: row.try_get("id")?,
        first_name: row.try_get("first_name")?,
        last_name: row.try_get("last_name")?,
        email: row.try_get("email")?,
        contact: row.try_get("contact")?,
        address: row.try_get("address")?,
        city: row.try_get("city")?,
        date_of_birth,
        blood_type: parse_label(row.try_get("blood_type")?)?,
        weight: row.try_get("weight")?,
        gender: gender.as_deref().map(parse_label).transpose()?,
        emergency_name: row.try_get("emergency_name")?,
        emergency_phone: row.try_get("emergency_phone")?,
        availability: parse_label(row.try_get("availability")?)?,
        months_since_first_donation: row.try_get("months_since_first_donation")?,
        donation_count: row.try_get("donation_count")?,
        pints_donated: row.try_get("pints_donated")?,
        medical_history: row.try_get("medical_history")?,
        status: parse_label(row.try_get("status")?)?,
        created_at: from_millis(row.try_get("created_at")?)?,
        last_donation: last_donation.map(from_millis).transpose()?,
    })
}
