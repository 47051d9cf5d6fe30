//! In-memory collaborators for tests and local runs. Same contracts as the
//! MySQL implementations, including the idempotency guards.

use chrono::{NaiveDate, NaiveDateTime};
use std::collections::HashMap;
use std::sync::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};

use super::{AttendanceLedger, CheckInFields, EmployeeDirectory, SettingsStore, StoreError};
use crate::model::attendance::Attendance;
use crate::model::employee::Employee;
use crate::model::settings::OrgSettings;

#[derive(Default)]
pub struct MemoryEmployees {
    rows: RwLock<HashMap<String, Employee>>,
}

impl MemoryEmployees {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, employee: Employee) {
        self.rows
            .write()
            .expect("employee store poisoned")
            .insert(employee.emp_id.clone(), employee);
    }
}

impl EmployeeDirectory for MemoryEmployees {
    async fn find_by_emp_id(&self, emp_id: &str) -> Result<Option<Employee>, StoreError> {
        Ok(self
            .rows
            .read()
            .expect("employee store poisoned")
            .get(emp_id)
            .cloned())
    }

    async fn save_face(
        &self,
        emp_id: &str,
        photo: &str,
        registered_at: NaiveDateTime,
    ) -> Result<(), StoreError> {
        if let Some(employee) = self
            .rows
            .write()
            .expect("employee store poisoned")
            .get_mut(emp_id)
        {
            employee.face_photo_data = Some(photo.to_string());
            employee.face_registered = true;
            employee.face_registered_at = Some(registered_at);
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryLedger {
    rows: RwLock<HashMap<(u64, NaiveDate), Attendance>>,
    next_id: AtomicU64,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }
}

impl AttendanceLedger for MemoryLedger {
    async fn find_for_day(
        &self,
        employee_id: u64,
        date: NaiveDate,
    ) -> Result<Option<Attendance>, StoreError> {
        Ok(self
            .rows
            .read()
            .expect("attendance ledger poisoned")
            .get(&(employee_id, date))
            .cloned())
    }

    async fn record_check_in(
        &self,
        employee_id: u64,
        date: NaiveDate,
        fields: CheckInFields,
    ) -> Result<bool, StoreError> {
        let mut rows = self.rows.write().expect("attendance ledger poisoned");

        match rows.get_mut(&(employee_id, date)) {
            Some(record) => {
                if record.check_in.is_some() {
                    return Ok(false);
                }
                record.check_in = Some(fields.time);
                record.status = fields.status;
                record.marked_by = fields.marked_by;
                record.check_in_location = fields.location;
                Ok(true)
            }
            None => {
                let id = self.next_id.fetch_add(1, Ordering::Relaxed) + 1;
                rows.insert(
                    (employee_id, date),
                    Attendance {
                        id,
                        employee_id,
                        date,
                        check_in: Some(fields.time),
                        check_out: None,
                        status: fields.status,
                        work_hours: 0.0,
                        marked_by: fields.marked_by,
                        check_in_location: fields.location,
                    },
                );
                Ok(true)
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
        let mut rows = self.rows.write().expect("attendance ledger poisoned");

        match rows.get_mut(&(employee_id, date)) {
            Some(record) if record.check_in.is_some() && record.check_out.is_none() => {
                record.check_out = Some(time);
                record.work_hours = work_hours;
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

#[derive(Default)]
pub struct MemorySettings {
    value: RwLock<Option<OrgSettings>>,
}

impl MemorySettings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, settings: OrgSettings) {
        *self.value.write().expect("settings store poisoned") = Some(settings);
    }
}

impl SettingsStore for MemorySettings {
    async fn current(&self) -> Result<Option<OrgSettings>, StoreError> {
        Ok(self.value.read().expect("settings store poisoned").clone())
    }
}
