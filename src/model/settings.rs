use chrono::{Duration, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

/// The slice of the organization settings document this subsystem consumes.
/// Read-only here; the settings admin screens own the rest.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrgSettings {
    /// "HH:MM", e.g. "09:30".
    pub office_start_time: String,
    pub late_grace_minutes: u32,
    /// Office network address; empty string means no restriction.
    pub office_ip: String,
}

impl Default for OrgSettings {
    fn default() -> Self {
        Self {
            office_start_time: "09:30".to_string(),
            late_grace_minutes: 15,
            office_ip: String::new(),
        }
    }
}

impl OrgSettings {
    /// Latest on-time arrival for the given day: office start plus grace.
    /// None when `office_start_time` does not parse as HH:MM.
    pub fn arrival_cutoff(&self, now: NaiveDateTime) -> Option<NaiveDateTime> {
        let start = NaiveTime::parse_from_str(&self.office_start_time, "%H:%M").ok()?;
        Some(now.date().and_time(start) + Duration::minutes(self.late_grace_minutes as i64))
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

    #[test]
    fn cutoff_adds_grace_to_start() {
        let settings = OrgSettings {
            office_start_time: "09:30".to_string(),
            late_grace_minutes: 15,
            office_ip: String::new(),
        };
        assert_eq!(settings.arrival_cutoff(at(8, 0, 0)), Some(at(9, 45, 0)));
    }

    #[test]
    fn grace_may_overflow_the_hour() {
        let settings = OrgSettings {
            office_start_time: "09:50".to_string(),
            late_grace_minutes: 20,
            office_ip: String::new(),
        };
        assert_eq!(settings.arrival_cutoff(at(8, 0, 0)), Some(at(10, 10, 0)));
    }

    #[test]
    fn unparsable_start_time_yields_none() {
        let settings = OrgSettings {
            office_start_time: "half past nine".to_string(),
            late_grace_minutes: 15,
            office_ip: String::new(),
        };
        assert!(settings.arrival_cutoff(at(9, 0, 0)).is_none());
    }
}
