//! MySQL-backed collaborators.
//!
//! Idempotency contract: the `attendance` table carries a unique
//! (employee_id, date) key, so concurrent duplicate submissions resolve to a
//! duplicate-key error (SQLSTATE 23000) or a zero-row guarded update rather
//! than a second record.

use chrono::{NaiveDate, NaiveDateTime};
use sqlx::MySqlPool;
use std::str::FromStr;

use super::{AttendanceLedger, CheckInFields, EmployeeDirectory, SettingsStore, StoreError};
use crate::model::attendance::{Attendance, AttendanceStatus, GeoPoint, MarkedBy};
use crate::model::employee::Employee;
use crate::model::settings::OrgSettings;

#[derive(Clone)]
pub struct MySqlEmployees {
    pool: MySqlPool,
}

impl MySqlEmployees {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

impl EmployeeDirectory for MySqlEmployees {
    async fn find_by_emp_id(&self, emp_id: &str) -> Result<Option<Employee>, StoreError> {
        let employee = sqlx::query_as::<_, Employee>(
            r#"
            SELECT id, emp_id, name, status, face_registered, face_photo_data, face_registered_at
            FROM employees
            WHERE emp_id = ?
            "#,
        )
        .bind(emp_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(employee)
    }

    async fn save_face(
        &self,
        emp_id: &str,
        photo: &str,
        registered_at: NaiveDateTime,
    ) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            UPDATE employees
            SET face_photo_data = ?, face_registered = 1, face_registered_at = ?
            WHERE emp_id = ?
            "#,
        )
        .bind(photo)
        .bind(registered_at)
        .bind(emp_id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

#[derive(sqlx::FromRow)]
struct AttendanceRow {
    id: u64,
    employee_id: u64,
    date: NaiveDate,
    check_in: Option<NaiveDateTime>,
    check_out: Option<NaiveDateTime>,
    status: String,
    work_hours: f64,
    marked_by: String,
    check_in_latitude: Option<f64>,
    check_in_longitude: Option<f64>,
}

impl From<AttendanceRow> for Attendance {
    fn from(row: AttendanceRow) -> Self {
        let check_in_location = match (row.check_in_latitude, row.check_in_longitude) {
            (Some(latitude), Some(longitude)) => Some(GeoPoint {
                latitude,
                longitude,
            }),
            _ => None,
        };

        Attendance {
            id: row.id,
            employee_id: row.employee_id,
            date: row.date,
            check_in: row.check_in,
            check_out: row.check_out,
            status: AttendanceStatus::from_str(&row.status).unwrap_or_default(),
            work_hours: row.work_hours,
            marked_by: MarkedBy::from_str(&row.marked_by).unwrap_or_default(),
            check_in_location,
        }
    }
}

#[derive(Clone)]
pub struct MySqlLedger {
    pool: MySqlPool,
}

impl MySqlLedger {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

impl AttendanceLedger for MySqlLedger {
    async fn find_for_day(
        &self,
        employee_id: u64,
        date: NaiveDate,
    ) -> Result<Option<Attendance>, StoreError> {
        let row = sqlx::query_as::<_, AttendanceRow>(
            r#"
            SELECT id, employee_id, date, check_in, check_out, status, work_hours,
                   marked_by, check_in_latitude, check_in_longitude
            FROM attendance
            WHERE employee_id = ? AND date = ?
            "#,
        )
        .bind(employee_id)
        .bind(date)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    async fn record_check_in(
        &self,
        employee_id: u64,
        date: NaiveDate,
        fields: CheckInFields,
    ) -> Result<bool, StoreError> {
        // A record may pre-exist without a check-in (admin/leave edits);
        // complete it in place first.
        let updated = sqlx::query(
            r#"
            UPDATE attendance
            SET check_in = ?, status = ?, marked_by = ?,
                check_in_latitude = ?, check_in_longitude = ?
            WHERE employee_id = ? AND date = ? AND check_in IS NULL
            "#,
        )
        .bind(fields.time)
        .bind(fields.status.to_string())
        .bind(fields.marked_by.to_string())
        .bind(fields.location.map(|l| l.latitude))
        .bind(fields.location.map(|l| l.longitude))
        .bind(employee_id)
        .bind(date)
        .execute(&self.pool)
        .await?;

        if updated.rows_affected() > 0 {
            return Ok(true);
        }

        let inserted = sqlx::query(
            r#"
            INSERT INTO attendance
            (employee_id, date, check_in, status, marked_by, check_in_latitude, check_in_longitude)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(employee_id)
        .bind(date)
        .bind(fields.time)
        .bind(fields.status.to_string())
        .bind(fields.marked_by.to_string())
        .bind(fields.location.map(|l| l.latitude))
        .bind(fields.location.map(|l| l.longitude))
        .execute(&self.pool)
        .await;

        match inserted {
            Ok(_) => Ok(true),
            Err(e) => {
                // Duplicate (employee_id, date): the record gained a check-in
                // between the read and this write.
                if let sqlx::Error::Database(db_err) = &e {
                    if db_err.code().as_deref() == Some("23000") {
                        return Ok(false);
                    }
                }
                Err(e.into())
            }
        }
    }

    async fn record_check_out(
        &self,
        employee_id: u64,
        date: NaiveDate,
        time: NaiveDateTime,
        work_hours: f64,
    ) -> Result<bool, StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE attendance
            SET check_out = ?, work_hours = ?
            WHERE employee_id = ? AND date = ?
            AND check_in IS NOT NULL
            AND check_out IS NULL
            "#,
        )
        .bind(time)
        .bind(work_hours)
        .bind(employee_id)
        .bind(date)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[derive(sqlx::FromRow)]
struct SettingsRow {
    office_start_time: String,
    late_grace_minutes: u32,
    office_ip: String,
}

#[derive(Clone)]
pub struct MySqlSettings {
    pool: MySqlPool,
}

impl MySqlSettings {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

impl SettingsStore for MySqlSettings {
    async fn current(&self) -> Result<Option<OrgSettings>, StoreError> {
        let row = sqlx::query_as::<_, SettingsRow>(
            r#"
            SELECT office_start_time, late_grace_minutes, office_ip
            FROM settings
            ORDER BY id
            LIMIT 1
            "#,
        )
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| OrgSettings {
            office_start_time: r.office_start_time,
            late_grace_minutes: r.late_grace_minutes,
            office_ip: r.office_ip,
        }))
    }
}
