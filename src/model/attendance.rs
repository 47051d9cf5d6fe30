use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};
use utoipa::ToSchema;

/// Day status label. `halfday`, `leave` and `holiday` are written by the
/// admin/leave modules; this subsystem only ever writes `present` or `late`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, Default, ToSchema,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum AttendanceStatus {
    Present,
    #[default]
    Absent,
    Late,
    Halfday,
    Leave,
    Holiday,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, Default, ToSchema,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum MarkedBy {
    #[default]
    App,
    Admin,
}

/// Device coordinates reported by the mobile app at check-in.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ToSchema)]
pub struct GeoPoint {
    #[schema(example = 22.5726)]
    pub latitude: f64,
    #[schema(example = 88.3639)]
    pub longitude: f64,
}

/// One record per employee per calendar day; uniqueness of
/// (employee_id, date) is enforced by the ledger.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Attendance {
    #[schema(example = 1)]
    pub id: u64,
    #[schema(example = 42)]
    pub employee_id: u64,
    #[schema(example = "2026-08-06", value_type = String, format = "date")]
    pub date: NaiveDate,
    #[schema(example = "2026-08-06T09:10:05", value_type = Option<String>, format = "date-time", nullable = true)]
    pub check_in: Option<NaiveDateTime>,
    #[schema(example = "2026-08-06T18:00:00", value_type = Option<String>, format = "date-time", nullable = true)]
    pub check_out: Option<NaiveDateTime>,
    #[schema(example = "present")]
    pub status: AttendanceStatus,
    /// Derived at check-out: (check_out - check_in) in hours, 2 decimals.
    #[schema(example = 8.83)]
    pub work_hours: f64,
    #[schema(example = "app")]
    pub marked_by: MarkedBy,
    pub check_in_location: Option<GeoPoint>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn status_label_round_trip() {
        for status in [
            AttendanceStatus::Present,
            AttendanceStatus::Absent,
            AttendanceStatus::Late,
            AttendanceStatus::Halfday,
            AttendanceStatus::Leave,
            AttendanceStatus::Holiday,
        ] {
            let label = status.to_string();
            assert_eq!(AttendanceStatus::from_str(&label).unwrap(), status);
        }
    }

    #[test]
    fn status_labels_are_lowercase() {
        assert_eq!(AttendanceStatus::Late.to_string(), "late");
        assert_eq!(MarkedBy::App.to_string(), "app");
    }
}
