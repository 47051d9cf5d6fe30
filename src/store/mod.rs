//! Collaborator contracts: the employee directory, the attendance ledger and
//! the settings store are owned elsewhere; this subsystem only consumes the
//! operations below.

pub mod memory;
pub mod mysql;

use chrono::{NaiveDate, NaiveDateTime};
use thiserror::Error;

use crate::model::attendance::{Attendance, AttendanceStatus, GeoPoint, MarkedBy};
use crate::model::employee::Employee;
use crate::model::settings::OrgSettings;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Fields written by the single allowed check-in upsert path.
#[derive(Debug, Clone)]
pub struct CheckInFields {
    pub time: NaiveDateTime,
    pub status: AttendanceStatus,
    pub marked_by: MarkedBy,
    pub location: Option<GeoPoint>,
}

#[allow(async_fn_in_trait)]
pub trait EmployeeDirectory {
    async fn find_by_emp_id(&self, emp_id: &str) -> Result<Option<Employee>, StoreError>;

    /// Replace the registered face wholesale: photo, flag and timestamp in
    /// one atomic write. Re-registration overwrites, never merges.
    async fn save_face(
        &self,
        emp_id: &str,
        photo: &str,
        registered_at: NaiveDateTime,
    ) -> Result<(), StoreError>;
}

#[allow(async_fn_in_trait)]
pub trait AttendanceLedger {
    async fn find_for_day(
        &self,
        employee_id: u64,
        date: NaiveDate,
    ) -> Result<Option<Attendance>, StoreError>;

    /// Upsert the day's record with a check-in. Returns `false` when the
    /// record already carries one: the per-day uniqueness guard fired, e.g.
    /// on the losing side of a duplicate-submission race.
    async fn record_check_in(
        &self,
        employee_id: u64,
        date: NaiveDate,
        fields: CheckInFields,
    ) -> Result<bool, StoreError>;

    /// Complete the day's record with a check-out and derived work hours.
    /// Returns `false` when there is nothing to complete: no check-in yet,
    /// or the check-out is already set.
    async fn record_check_out(
        &self,
        employee_id: u64,
        date: NaiveDate,
        time: NaiveDateTime,
        work_hours: f64,
    ) -> Result<bool, StoreError>;
}

#[allow(async_fn_in_trait)]
pub trait SettingsStore {
    /// The current settings document; `Ok(None)` when none exists yet, in
    /// which case callers apply the built-in defaults.
    async fn current(&self) -> Result<Option<OrgSettings>, StoreError>;
}

// Shared handles count as collaborators too, so the owner of a store can keep
// inspecting it after handing a clone to the service.

impl<T: EmployeeDirectory> EmployeeDirectory for std::sync::Arc<T> {
    async fn find_by_emp_id(&self, emp_id: &str) -> Result<Option<Employee>, StoreError> {
        (**self).find_by_emp_id(emp_id).await
    }

    async fn save_face(
        &self,
        emp_id: &str,
        photo: &str,
        registered_at: NaiveDateTime,
    ) -> Result<(), StoreError> {
        (**self).save_face(emp_id, photo, registered_at).await
    }
}

impl<T: AttendanceLedger> AttendanceLedger for std::sync::Arc<T> {
    async fn find_for_day(
        &self,
        employee_id: u64,
        date: NaiveDate,
    ) -> Result<Option<Attendance>, StoreError> {
        (**self).find_for_day(employee_id, date).await
    }

    async fn record_check_in(
        &self,
        employee_id: u64,
        date: NaiveDate,
        fields: CheckInFields,
    ) -> Result<bool, StoreError> {
        (**self).record_check_in(employee_id, date, fields).await
    }

    async fn record_check_out(
        &self,
        employee_id: u64,
        date: NaiveDate,
        time: NaiveDateTime,
        work_hours: f64,
    ) -> Result<bool, StoreError> {
        (**self)
            .record_check_out(employee_id, date, time, work_hours)
            .await
    }
}

impl<T: SettingsStore> SettingsStore for std::sync::Arc<T> {
    async fn current(&self) -> Result<Option<OrgSettings>, StoreError> {
        (**self).current().await
    }
}
