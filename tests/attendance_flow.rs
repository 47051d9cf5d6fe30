//! End-to-end state-machine scenarios over the in-memory collaborators.

use std::sync::Arc;

use chrono::{NaiveDate, NaiveDateTime};

use faceclock::attendance::AttendanceService;
use faceclock::error::AttendanceError;
use faceclock::face::recognizer::{
    LocalRecognizer, ProviderWithFallback, RecognizeError, Recognizer,
};
use faceclock::face::{MatchResult, MatchSource};
use faceclock::model::attendance::AttendanceStatus;
use faceclock::model::employee::Employee;
use faceclock::model::settings::OrgSettings;
use faceclock::store::memory::{MemoryEmployees, MemoryLedger, MemorySettings};
use faceclock::store::{AttendanceLedger, EmployeeDirectory};

const EMP: &str = "EMP-001";
const PHOTO: &str = "/9j/4AAQSkZJRgABAQEAYABgAAD/2wBDAAgGBgcGBQgHBwcJ";
const OFFICE_IP: &str = "192.168.1.9";

fn at(h: u32, m: u32, s: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2026, 8, 6)
        .unwrap()
        .and_hms_opt(h, m, s)
        .unwrap()
}

fn registered_employee() -> Employee {
    Employee {
        id: 1,
        emp_id: EMP.to_string(),
        name: "Asha Verma".to_string(),
        status: "active".to_string(),
        face_registered: true,
        face_photo_data: Some(PHOTO.to_string()),
        face_registered_at: Some(at(8, 0, 0)),
    }
}

fn office_settings() -> OrgSettings {
    OrgSettings {
        office_start_time: "09:30".to_string(),
        late_grace_minutes: 15,
        office_ip: OFFICE_IP.to_string(),
    }
}

/// Recognizer that always answers with a fixed external-style verdict.
struct Scripted {
    matched: bool,
    similarity: f32,
}

impl Recognizer for Scripted {
    async fn is_available(&self) -> bool {
        true
    }

    async fn verify(
        &self,
        _employee: &Employee,
        _captured: &str,
    ) -> Result<MatchResult, RecognizeError> {
        Ok(MatchResult {
            matched: self.matched,
            similarity: self.similarity,
            confidence: Some(self.similarity * 100.0),
            source: MatchSource::External,
        })
    }
}

/// Recognizer that never answers, like a provider that is down for good.
struct Down;

impl Recognizer for Down {
    async fn is_available(&self) -> bool {
        false
    }

    async fn verify(
        &self,
        _employee: &Employee,
        _captured: &str,
    ) -> Result<MatchResult, RecognizeError> {
        Err(RecognizeError::Unavailable)
    }
}

struct Fixture<R> {
    employees: Arc<MemoryEmployees>,
    ledger: Arc<MemoryLedger>,
    settings: Arc<MemorySettings>,
    service: AttendanceService<Arc<MemoryEmployees>, Arc<MemoryLedger>, Arc<MemorySettings>, R>,
}

fn fixture<R: Recognizer>(recognizer: R) -> Fixture<R> {
    let employees = Arc::new(MemoryEmployees::new());
    let ledger = Arc::new(MemoryLedger::new());
    let settings = Arc::new(MemorySettings::new());

    employees.insert(registered_employee());
    settings.set(office_settings());

    let service = AttendanceService::new(
        employees.clone(),
        ledger.clone(),
        settings.clone(),
        recognizer,
        None,
    );

    Fixture {
        employees,
        ledger,
        settings,
        service,
    }
}

#[actix_web::test]
async fn full_day_present_then_checkout() {
    let fx = fixture(Scripted {
        matched: true,
        similarity: 0.75,
    });

    let check_in = fx
        .service
        .check_in_at(EMP, PHOTO, None, "192.168.1.5", at(9, 10, 0))
        .await
        .unwrap();
    assert_eq!(check_in.status, AttendanceStatus::Present);
    assert!(!check_in.is_late);

    // Evening photo scores lower but still above threshold.
    let fx_out = AttendanceService::new(
        fx.employees.clone(),
        fx.ledger.clone(),
        fx.settings.clone(),
        Scripted {
            matched: true,
            similarity: 0.62,
        },
        None,
    );

    let check_out = fx_out
        .check_out_at(EMP, PHOTO, None, "192.168.1.5", at(18, 0, 0))
        .await
        .unwrap();
    assert_eq!(check_out.check_in, at(9, 10, 0));
    assert_eq!(check_out.work_hours, 8.83);

    let record = fx.ledger.find_for_day(1, at(9, 0, 0).date()).await.unwrap().unwrap();
    assert_eq!(record.check_in, Some(at(9, 10, 0)));
    assert_eq!(record.check_out, Some(at(18, 0, 0)));
    assert_eq!(record.work_hours, 8.83);
    assert_eq!(record.status, AttendanceStatus::Present);
}

#[actix_web::test]
async fn late_arrival_is_flagged() {
    let fx = fixture(Scripted {
        matched: true,
        similarity: 0.9,
    });

    let outcome = fx
        .service
        .check_in_at(EMP, PHOTO, None, OFFICE_IP, at(9, 45, 1))
        .await
        .unwrap();
    assert_eq!(outcome.status, AttendanceStatus::Late);
    assert!(outcome.is_late);
}

#[actix_web::test]
async fn second_check_in_is_rejected_and_keeps_the_first_timestamp() {
    let fx = fixture(Scripted {
        matched: true,
        similarity: 0.9,
    });

    fx.service
        .check_in_at(EMP, PHOTO, None, OFFICE_IP, at(9, 10, 0))
        .await
        .unwrap();

    let err = fx
        .service
        .check_in_at(EMP, PHOTO, None, OFFICE_IP, at(11, 0, 0))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        AttendanceError::AlreadyCheckedIn { at: Some(t) } if t == at(9, 10, 0)
    ));

    let record = fx.ledger.find_for_day(1, at(9, 0, 0).date()).await.unwrap().unwrap();
    assert_eq!(record.check_in, Some(at(9, 10, 0)));
}

#[actix_web::test]
async fn check_out_requires_a_check_in() {
    let fx = fixture(Scripted {
        matched: true,
        similarity: 0.9,
    });

    let err = fx
        .service
        .check_out_at(EMP, PHOTO, None, OFFICE_IP, at(18, 0, 0))
        .await
        .unwrap_err();
    assert!(matches!(err, AttendanceError::NoCheckIn));
}

#[actix_web::test]
async fn second_check_out_is_rejected_and_work_hours_stay_put() {
    let fx = fixture(Scripted {
        matched: true,
        similarity: 0.9,
    });

    fx.service
        .check_in_at(EMP, PHOTO, None, OFFICE_IP, at(9, 0, 0))
        .await
        .unwrap();
    fx.service
        .check_out_at(EMP, PHOTO, None, OFFICE_IP, at(17, 30, 0))
        .await
        .unwrap();

    let err = fx
        .service
        .check_out_at(EMP, PHOTO, None, OFFICE_IP, at(19, 0, 0))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        AttendanceError::AlreadyCheckedOut { at: Some(t) } if t == at(17, 30, 0)
    ));

    let record = fx.ledger.find_for_day(1, at(9, 0, 0).date()).await.unwrap().unwrap();
    assert_eq!(record.work_hours, 8.5);
    assert_eq!(record.check_out, Some(at(17, 30, 0)));
}

#[actix_web::test]
async fn wrong_network_is_rejected_before_any_state_change() {
    let fx = fixture(Scripted {
        matched: true,
        similarity: 0.9,
    });

    let err = fx
        .service
        .check_in_at(EMP, PHOTO, None, "10.0.0.1", at(9, 0, 0))
        .await
        .unwrap_err();
    assert!(matches!(err, AttendanceError::AdmissionDenied { .. }));

    assert!(
        fx.ledger
            .find_for_day(1, at(9, 0, 0).date())
            .await
            .unwrap()
            .is_none()
    );
}

#[actix_web::test]
async fn same_private_subnet_is_admitted() {
    let fx = fixture(Scripted {
        matched: true,
        similarity: 0.9,
    });

    fx.service
        .check_in_at(EMP, PHOTO, None, "::ffff:192.168.1.77", at(9, 0, 0))
        .await
        .unwrap();
}

#[actix_web::test]
async fn missing_settings_fail_open_with_fallback_cutoff() {
    let employees = Arc::new(MemoryEmployees::new());
    let ledger = Arc::new(MemoryLedger::new());
    employees.insert(registered_employee());

    // No settings document at all: any network admits, 10:00 cutoff applies.
    let service = AttendanceService::new(
        employees,
        ledger,
        Arc::new(MemorySettings::new()),
        Scripted {
            matched: true,
            similarity: 0.9,
        },
        None,
    );

    let outcome = service
        .check_in_at(EMP, PHOTO, None, "203.0.113.50", at(10, 5, 0))
        .await
        .unwrap();
    assert_eq!(outcome.status, AttendanceStatus::Late);
}

#[actix_web::test]
async fn face_mismatch_reports_the_score() {
    let fx = fixture(Scripted {
        matched: false,
        similarity: 0.41,
    });

    let err = fx
        .service
        .check_in_at(EMP, PHOTO, None, OFFICE_IP, at(9, 0, 0))
        .await
        .unwrap_err();
    match err {
        AttendanceError::FaceMismatch {
            similarity,
            confidence,
        } => {
            assert!((similarity - 0.41).abs() < 1e-6);
            assert_eq!(confidence, Some(41.0));
        }
        other => panic!("expected FaceMismatch, got {other:?}"),
    }
}

#[actix_web::test]
async fn unknown_employee_and_unregistered_face_are_rejected() {
    let fx = fixture(Scripted {
        matched: true,
        similarity: 0.9,
    });

    let err = fx
        .service
        .check_in_at("EMP-404", PHOTO, None, OFFICE_IP, at(9, 0, 0))
        .await
        .unwrap_err();
    assert!(matches!(err, AttendanceError::EmployeeNotFound));

    fx.employees.insert(Employee {
        id: 2,
        emp_id: "EMP-002".to_string(),
        name: "No Face Yet".to_string(),
        status: "active".to_string(),
        face_registered: false,
        face_photo_data: None,
        face_registered_at: None,
    });

    let err = fx
        .service
        .check_in_at("EMP-002", PHOTO, None, OFFICE_IP, at(9, 0, 0))
        .await
        .unwrap_err();
    assert!(matches!(err, AttendanceError::FaceNotRegistered));
}

#[actix_web::test]
async fn provider_outage_falls_back_to_the_local_matcher() {
    let fx = fixture(ProviderWithFallback::new(Down, LocalRecognizer));

    // The stored reference photo equals the submitted one, so the local
    // matcher scores 1.0 and the day proceeds without any caller-visible
    // provider error.
    let outcome = fx
        .service
        .check_in_at(EMP, PHOTO, None, OFFICE_IP, at(9, 12, 0))
        .await
        .unwrap();
    assert_eq!(outcome.status, AttendanceStatus::Present);

    let record = fx.ledger.find_for_day(1, at(9, 0, 0).date()).await.unwrap().unwrap();
    assert_eq!(record.check_in, Some(at(9, 12, 0)));
}

#[actix_web::test]
async fn registration_overwrites_the_reference_photo_wholesale() {
    let fx = fixture(Scripted {
        matched: true,
        similarity: 0.9,
    });

    fx.service
        .register_face_at(EMP, "new-reference-photo", at(8, 30, 0))
        .await
        .unwrap();

    let employee = fx.employees.find_by_emp_id(EMP).await.unwrap().unwrap();
    assert!(employee.face_registered);
    assert_eq!(
        employee.face_photo_data.as_deref(),
        Some("new-reference-photo")
    );
    assert_eq!(employee.face_registered_at, Some(at(8, 30, 0)));
}

#[actix_web::test]
async fn registration_without_provider_still_succeeds() {
    let fx = fixture(Scripted {
        matched: true,
        similarity: 0.9,
    });

    let outcome = fx
        .service
        .register_face_at(EMP, PHOTO, at(8, 30, 0))
        .await
        .unwrap();
    assert!(!outcome.provider_enrolled);
    assert_eq!(outcome.registered_at, at(8, 30, 0));
}
