//! Check-in / check-out state machine.
//!
//! Per (employee, day) the record moves NoRecord -> CheckedIn -> CheckedOut
//! and never skips a state. Identity failures are fail-closed; network-gate
//! and settings failures are fail-open. The two defaults encode different
//! risk trade-offs and are deliberately not unified.

use chrono::{Local, NaiveDateTime, Timelike};
use tracing::{info, instrument, warn};

use crate::error::AttendanceError;
use crate::face::client::FaceServiceClient;
use crate::face::recognizer::{
    ExternalRecognizer, LocalRecognizer, ProviderWithFallback, RecognizeError, Recognizer,
};
use crate::face::{MatchResult, MatchSource};
use crate::model::attendance::{AttendanceStatus, GeoPoint, MarkedBy};
use crate::model::employee::Employee;
use crate::model::settings::OrgSettings;
use crate::netguard;
use crate::store::mysql::{MySqlEmployees, MySqlLedger, MySqlSettings};
use crate::store::{AttendanceLedger, CheckInFields, EmployeeDirectory, SettingsStore};

/// Cutoff hour applied when no attendance rules can be read: arrivals from
/// this hour on count as late.
const FALLBACK_LATE_HOUR: u32 = 10;

/// Decide present vs late for an arrival at `now`. The cutoff is office start
/// plus grace, and only arrivals strictly after it are late. Without usable
/// rules the fixed fallback hour applies.
pub fn lateness_status(now: NaiveDateTime, settings: Option<&OrgSettings>) -> AttendanceStatus {
    match settings.and_then(|s| s.arrival_cutoff(now)) {
        Some(cutoff) if now > cutoff => AttendanceStatus::Late,
        Some(_) => AttendanceStatus::Present,
        None => {
            if now.hour() >= FALLBACK_LATE_HOUR {
                AttendanceStatus::Late
            } else {
                AttendanceStatus::Present
            }
        }
    }
}

/// Hours between check-in and check-out, rounded to two decimals.
pub fn work_hours(check_in: NaiveDateTime, check_out: NaiveDateTime) -> f64 {
    let hours = (check_out - check_in).num_seconds() as f64 / 3600.0;
    (hours * 100.0).round() / 100.0
}

#[derive(Debug, Clone)]
pub struct CheckInOutcome {
    pub check_in: NaiveDateTime,
    pub status: AttendanceStatus,
    pub is_late: bool,
}

#[derive(Debug, Clone)]
pub struct CheckOutOutcome {
    pub check_in: NaiveDateTime,
    pub check_out: NaiveDateTime,
    pub work_hours: f64,
}

#[derive(Debug, Clone)]
pub struct RegistrationOutcome {
    pub registered_at: NaiveDateTime,
    /// Whether the external provider accepted the enrollment; storing the
    /// reference photo locally succeeds either way.
    pub provider_enrolled: bool,
}

#[derive(Debug, Clone)]
pub struct FaceStatusOutcome {
    pub registered: bool,
    pub registered_at: Option<NaiveDateTime>,
}

pub struct AttendanceService<D, L, S, R> {
    employees: D,
    ledger: L,
    settings: S,
    recognizer: R,
    /// Enrollment endpoint of the external provider; verification goes
    /// through `recognizer`. None disables provider enrollment entirely.
    provider: Option<FaceServiceClient>,
}

/// Concrete wiring used by `main`: MySQL collaborators and the external
/// provider with the local fallback.
pub type AppService = AttendanceService<
    MySqlEmployees,
    MySqlLedger,
    MySqlSettings,
    ProviderWithFallback<ExternalRecognizer, LocalRecognizer>,
>;

impl<D, L, S, R> AttendanceService<D, L, S, R>
where
    D: EmployeeDirectory,
    L: AttendanceLedger,
    S: SettingsStore,
    R: Recognizer,
{
    pub fn new(
        employees: D,
        ledger: L,
        settings: S,
        recognizer: R,
        provider: Option<FaceServiceClient>,
    ) -> Self {
        Self {
            employees,
            ledger,
            settings,
            recognizer,
            provider,
        }
    }

    /// One settings read per operation; the snapshot feeds both the network
    /// gate and the lateness rules. Unreadable settings degrade to None.
    async fn settings_snapshot(&self) -> Option<OrgSettings> {
        match self.settings.current().await {
            Ok(current) => current,
            Err(e) => {
                warn!(error = %e, "settings unreadable, continuing with defaults");
                None
            }
        }
    }

    /// Network admission. Absent settings fail open: attendance availability
    /// wins over this soft gate.
    fn admit(settings: Option<&OrgSettings>, request_ip: &str) -> Result<(), AttendanceError> {
        let Some(settings) = settings else {
            return Ok(());
        };

        let admission = netguard::check_network(request_ip, &settings.office_ip);
        if admission.allowed {
            Ok(())
        } else {
            Err(AttendanceError::AdmissionDenied {
                reason: admission
                    .reason
                    .unwrap_or_else(|| "office network mismatch".to_string()),
            })
        }
    }

    /// Look up the employee and run the identity check. A recognizer that
    /// cannot answer at all resolves to a non-match: fail-closed.
    async fn verified_employee(
        &self,
        emp_id: &str,
        photo: &str,
    ) -> Result<(Employee, MatchResult), AttendanceError> {
        let employee = self
            .employees
            .find_by_emp_id(emp_id)
            .await?
            .ok_or(AttendanceError::EmployeeNotFound)?;

        if !employee.face_registered {
            return Err(AttendanceError::FaceNotRegistered);
        }

        let result = match self.recognizer.verify(&employee, photo).await {
            Ok(result) => result,
            Err(RecognizeError::MissingReference) => return Err(AttendanceError::FaceDataMissing),
            Err(RecognizeError::Unavailable) => {
                warn!(emp_id, "no recognizer could answer, refusing match");
                MatchResult {
                    matched: false,
                    similarity: 0.0,
                    confidence: None,
                    source: MatchSource::Local,
                }
            }
        };

        if !result.matched {
            info!(
                emp_id,
                similarity = result.similarity as f64,
                source = ?result.source,
                "face mismatch"
            );
            return Err(AttendanceError::FaceMismatch {
                similarity: result.similarity,
                confidence: result.confidence,
            });
        }

        Ok((employee, result))
    }

    pub async fn register_face(
        &self,
        emp_id: &str,
        photo: &str,
    ) -> Result<RegistrationOutcome, AttendanceError> {
        self.register_face_at(emp_id, photo, Local::now().naive_local())
            .await
    }

    #[instrument(name = "face_register", skip(self, photo))]
    pub async fn register_face_at(
        &self,
        emp_id: &str,
        photo: &str,
        now: NaiveDateTime,
    ) -> Result<RegistrationOutcome, AttendanceError> {
        let employee = self
            .employees
            .find_by_emp_id(emp_id)
            .await?
            .ok_or(AttendanceError::EmployeeNotFound)?;

        let provider_enrolled = self.enroll_with_provider(emp_id, photo).await;

        // Local reference photo is the fallback matcher's input; stored
        // regardless of what the provider said.
        self.employees.save_face(emp_id, photo, now).await?;

        info!(emp_id, name = %employee.name, provider_enrolled, "face registered");
        Ok(RegistrationOutcome {
            registered_at: now,
            provider_enrolled,
        })
    }

    async fn enroll_with_provider(&self, emp_id: &str, photo: &str) -> bool {
        let Some(client) = &self.provider else {
            return false;
        };

        if !client.health().await {
            info!(emp_id, "provider unavailable, storing reference photo only");
            return false;
        }

        match client.register(emp_id, photo).await {
            Ok(resp) if resp.success => true,
            Ok(resp) => {
                warn!(emp_id, message = ?resp.message, "provider rejected enrollment");
                false
            }
            Err(e) => {
                warn!(emp_id, error = %e, "provider enrollment failed");
                false
            }
        }
    }

    pub async fn face_status(&self, emp_id: &str) -> Result<FaceStatusOutcome, AttendanceError> {
        let employee = self
            .employees
            .find_by_emp_id(emp_id)
            .await?
            .ok_or(AttendanceError::EmployeeNotFound)?;

        Ok(FaceStatusOutcome {
            registered: employee.face_registered,
            registered_at: employee.face_registered_at,
        })
    }

    pub async fn check_in(
        &self,
        emp_id: &str,
        photo: &str,
        location: Option<GeoPoint>,
        request_ip: &str,
    ) -> Result<CheckInOutcome, AttendanceError> {
        self.check_in_at(emp_id, photo, location, request_ip, Local::now().naive_local())
            .await
    }

    #[instrument(name = "face_check_in", skip(self, photo, location, now))]
    pub async fn check_in_at(
        &self,
        emp_id: &str,
        photo: &str,
        location: Option<GeoPoint>,
        request_ip: &str,
        now: NaiveDateTime,
    ) -> Result<CheckInOutcome, AttendanceError> {
        let settings = self.settings_snapshot().await;
        Self::admit(settings.as_ref(), request_ip)?;

        let (employee, matched) = self.verified_employee(emp_id, photo).await?;

        let today = now.date();
        if let Some(record) = self.ledger.find_for_day(employee.id, today).await? {
            if let Some(at) = record.check_in {
                return Err(AttendanceError::AlreadyCheckedIn { at: Some(at) });
            }
        }

        let status = lateness_status(now, settings.as_ref());
        let recorded = self
            .ledger
            .record_check_in(
                employee.id,
                today,
                CheckInFields {
                    time: now,
                    status,
                    marked_by: MarkedBy::App,
                    location,
                },
            )
            .await?;

        if !recorded {
            // Lost a duplicate-submission race after the read above.
            return Err(AttendanceError::AlreadyCheckedIn { at: None });
        }

        info!(emp_id, %status, source = ?matched.source, "check-in recorded");
        Ok(CheckInOutcome {
            check_in: now,
            status,
            is_late: status == AttendanceStatus::Late,
        })
    }

    pub async fn check_out(
        &self,
        emp_id: &str,
        photo: &str,
        location: Option<GeoPoint>,
        request_ip: &str,
    ) -> Result<CheckOutOutcome, AttendanceError> {
        self.check_out_at(emp_id, photo, location, request_ip, Local::now().naive_local())
            .await
    }

    #[instrument(name = "face_check_out", skip(self, photo, location, now))]
    pub async fn check_out_at(
        &self,
        emp_id: &str,
        photo: &str,
        location: Option<GeoPoint>,
        request_ip: &str,
        now: NaiveDateTime,
    ) -> Result<CheckOutOutcome, AttendanceError> {
        let settings = self.settings_snapshot().await;
        Self::admit(settings.as_ref(), request_ip)?;

        let (employee, matched) = self.verified_employee(emp_id, photo).await?;

        // Checkout location is accepted but not persisted; only the check-in
        // location is kept on the record.
        let _ = location;

        let today = now.date();
        let record = self
            .ledger
            .find_for_day(employee.id, today)
            .await?
            .ok_or(AttendanceError::NoCheckIn)?;

        let check_in = record.check_in.ok_or(AttendanceError::NoCheckIn)?;
        if let Some(at) = record.check_out {
            return Err(AttendanceError::AlreadyCheckedOut { at: Some(at) });
        }

        let hours = work_hours(check_in, now);
        let completed = self
            .ledger
            .record_check_out(employee.id, today, now, hours)
            .await?;

        if !completed {
            return Err(AttendanceError::AlreadyCheckedOut { at: None });
        }

        info!(emp_id, work_hours = hours, source = ?matched.source, "check-out recorded");
        Ok(CheckOutOutcome {
            check_in,
            check_out: now,
            work_hours: hours,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(h: u32, m: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 8, 6)
            .unwrap()
            .and_hms_opt(h, m, s)
            .unwrap()
    }

    fn rules(start: &str, grace: u32) -> OrgSettings {
        OrgSettings {
            office_start_time: start.to_string(),
            late_grace_minutes: grace,
            office_ip: String::new(),
        }
    }

    #[test]
    fn arrival_within_grace_is_present() {
        let settings = rules("09:30", 15);
        assert_eq!(
            lateness_status(at(9, 44, 59), Some(&settings)),
            AttendanceStatus::Present
        );
    }

    #[test]
    fn arrival_exactly_at_cutoff_is_present() {
        let settings = rules("09:30", 15);
        assert_eq!(
            lateness_status(at(9, 45, 0), Some(&settings)),
            AttendanceStatus::Present
        );
    }

    #[test]
    fn arrival_after_cutoff_is_late() {
        let settings = rules("09:30", 15);
        assert_eq!(
            lateness_status(at(9, 45, 1), Some(&settings)),
            AttendanceStatus::Late
        );
    }

    #[test]
    fn missing_rules_fall_back_to_ten_oclock() {
        assert_eq!(lateness_status(at(9, 59, 59), None), AttendanceStatus::Present);
        assert_eq!(lateness_status(at(10, 0, 0), None), AttendanceStatus::Late);
    }

    #[test]
    fn unparsable_start_time_also_falls_back() {
        let settings = rules("not a time", 15);
        assert_eq!(
            lateness_status(at(10, 30, 0), Some(&settings)),
            AttendanceStatus::Late
        );
    }

    #[test]
    fn work_hours_full_day() {
        assert_eq!(work_hours(at(9, 0, 0), at(17, 30, 0)), 8.5);
    }

    #[test]
    fn work_hours_rounds_to_two_decimals() {
        // 8h50m = 8.8333... hours
        assert_eq!(work_hours(at(9, 10, 0), at(18, 0, 0)), 8.83);
    }

    #[test]
    fn work_hours_zero_span() {
        assert_eq!(work_hours(at(9, 0, 0), at(9, 0, 0)), 0.0);
    }
}
