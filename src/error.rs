use chrono::NaiveDateTime;
use thiserror::Error;

use crate::store::StoreError;

/// User-visible rejections from the attendance operations.
///
/// Provider outages and unreadable settings never show up here: the former
/// degrades to the local matcher, the latter fails open on the network gate
/// and falls back to the fixed lateness cutoff.
#[derive(Debug, Error)]
pub enum AttendanceError {
    /// Caller is outside the office network; retryable only after switching
    /// networks.
    #[error("attendance rejected: {reason}")]
    AdmissionDenied { reason: String },

    #[error("employee not found")]
    EmployeeNotFound,

    #[error("face not registered")]
    FaceNotRegistered,

    /// Registration flag is set but the reference photo is gone; the
    /// employee has to re-register.
    #[error("face data not found")]
    FaceDataMissing,

    /// Identity check failed; the score is returned for diagnostics.
    #[error("face does not match")]
    FaceMismatch {
        similarity: f32,
        confidence: Option<f32>,
    },

    /// Idempotency guard: today's record already has a check-in. `at` is
    /// absent when the guard fired inside the ledger on a lost race.
    #[error("already checked in today")]
    AlreadyCheckedIn { at: Option<NaiveDateTime> },

    #[error("no check-in found for today")]
    NoCheckIn,

    #[error("already checked out today")]
    AlreadyCheckedOut { at: Option<NaiveDateTime> },

    #[error(transparent)]
    Store(#[from] StoreError),
}
