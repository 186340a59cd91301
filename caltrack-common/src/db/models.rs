//! Database record types and update payloads

use serde::{Deserialize, Deserializer, Serialize};

/// A named item whose calibration checklist is tracked
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Component {
    pub id: i64,
    pub name: String,
}

/// One checklist row under a component
///
/// Each of the four sub-tasks (primary, secondary, resolution, DM) has a value
/// and an independent completion flag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Calibration {
    pub id: i64,
    pub component_id: i64,
    pub cal_number: String,
    pub description: Option<String>,
    pub pri: Option<String>,
    pub sec: Option<String>,
    pub reso: Option<String>,
    pub dm: Option<String>,
    pub pri_completed: bool,
    pub sec_completed: bool,
    pub reso_completed: bool,
    pub dm_completed: bool,
}

/// Partial update of a calibration entry's value fields
///
/// Outer `None` means the key was absent (keep the stored value);
/// `Some(None)` means an explicit `null` (clear it).
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct CalibrationUpdate {
    pub id: i64,
    #[serde(default, deserialize_with = "present")]
    pub description: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub pri: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub sec: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub reso: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub dm: Option<Option<String>>,
}

impl CalibrationUpdate {
    /// Overwrite the fields carried by this update; completion flags are untouched
    pub fn apply_to(&self, cal: &mut Calibration) {
        if let Some(description) = &self.description {
            cal.description = description.clone();
        }
        if let Some(pri) = &self.pri {
            cal.pri = pri.clone();
        }
        if let Some(sec) = &self.sec {
            cal.sec = sec.clone();
        }
        if let Some(reso) = &self.reso {
            cal.reso = reso.clone();
        }
        if let Some(dm) = &self.dm {
            cal.dm = dm.clone();
        }
    }
}

/// Completion flags to change; absent or `null` flags keep their stored value
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct StatusUpdate {
    pub pri_completed: Option<bool>,
    pub sec_completed: Option<bool>,
    pub reso_completed: Option<bool>,
    pub dm_completed: Option<bool>,
}

impl StatusUpdate {
    pub fn apply_to(&self, cal: &mut Calibration) {
        if let Some(done) = self.pri_completed {
            cal.pri_completed = done;
        }
        if let Some(done) = self.sec_completed {
            cal.sec_completed = done;
        }
        if let Some(done) = self.reso_completed {
            cal.reso_completed = done;
        }
        if let Some(done) = self.dm_completed {
            cal.dm_completed = done;
        }
    }
}

/// Result of a bulk value update
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BulkUpdateOutcome {
    /// Number of rows that existed and were written
    pub applied: usize,
    /// Ids in the batch that matched no row
    pub skipped: Vec<i64>,
}

/// Distinguish a present key (possibly `null`) from an absent one
fn present<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> Calibration {
        Calibration {
            id: 1,
            component_id: 7,
            cal_number: "A1".to_string(),
            description: Some("gain".to_string()),
            pri: Some("12".to_string()),
            sec: None,
            reso: None,
            dm: Some("x".to_string()),
            pri_completed: true,
            sec_completed: false,
            reso_completed: false,
            dm_completed: false,
        }
    }

    #[test]
    fn absent_keys_keep_values_and_null_clears() {
        let update: CalibrationUpdate =
            serde_json::from_value(json!({"id": 1, "pri": null, "sec": "3.5"})).unwrap();
        assert_eq!(update.pri, Some(None));
        assert_eq!(update.sec, Some(Some("3.5".to_string())));
        assert_eq!(update.description, None);

        let mut cal = sample();
        update.apply_to(&mut cal);
        assert_eq!(cal.pri, None);
        assert_eq!(cal.sec.as_deref(), Some("3.5"));
        assert_eq!(cal.description.as_deref(), Some("gain"));
        assert_eq!(cal.dm.as_deref(), Some("x"));
        assert!(cal.pri_completed, "value updates never touch completion flags");
    }

    #[test]
    fn update_requires_id() {
        let result: Result<CalibrationUpdate, _> = serde_json::from_value(json!({"pri": "1"}));
        assert!(result.is_err());
    }

    #[test]
    fn status_update_changes_only_present_flags() {
        let status: StatusUpdate =
            serde_json::from_value(json!({"id": 1, "pri_completed": false, "dm_completed": true}))
                .unwrap();

        let mut cal = sample();
        status.apply_to(&mut cal);
        assert!(!cal.pri_completed);
        assert!(cal.dm_completed);
        assert!(!cal.sec_completed);
        assert!(!cal.reso_completed);
    }

    #[test]
    fn null_flag_keeps_stored_value() {
        let status: StatusUpdate =
            serde_json::from_value(json!({"pri_completed": null, "sec_completed": true})).unwrap();
        assert_eq!(status.pri_completed, None);

        let mut cal = sample();
        status.apply_to(&mut cal);
        assert!(cal.pri_completed);
        assert!(cal.sec_completed);
    }
}
