use serde::{Deserialize, Serialize};

use crate::db::RecordStatus;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum DisplayStatus {
    Active,
    Inactive,
}

impl DisplayStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DisplayStatus::Active => "Active",
            DisplayStatus::Inactive => "Inactive",
        }
    }

    /// Maps the stored status text. Only `active` and `inactive` exist.
    pub fn from_stored(value: &str) -> Option<Self> {
        match value.trim() {
            "active" => Some(DisplayStatus::Active),
            "inactive" => Some(DisplayStatus::Inactive),
            _ => None,
        }
    }
}

impl Default for DisplayStatus {
    fn default() -> Self {
        DisplayStatus::Active
    }
}

impl From<RecordStatus> for DisplayStatus {
    fn from(status: RecordStatus) -> Self {
        match status {
            RecordStatus::Active => DisplayStatus::Active,
            RecordStatus::Inactive => DisplayStatus::Inactive,
        }
    }
}

impl From<DisplayStatus> for RecordStatus {
    fn from(status: DisplayStatus) -> Self {
        match status {
            DisplayStatus::Active => RecordStatus::Active,
            DisplayStatus::Inactive => RecordStatus::Inactive,
        }
    }
}

/// The mutable part of an overtime configuration.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OvertimeFields {
    pub rate: f64,
    pub min_duration_minutes: f64,
    pub max_duration_hours_per_day: f64,
    pub status: DisplayStatus,
}

/// One table row: an overtime record joined with its person.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DisplayRow {
    pub record_id: i64,
    pub person_id: i64,
    pub name: String,
    pub code: String,
    pub department: String,
    pub designation: String,
    pub rate: f64,
    pub min_duration_minutes: f64,
    pub max_duration_hours_per_day: f64,
    pub status: DisplayStatus,
}

impl DisplayRow {
    pub fn fields(&self) -> OvertimeFields {
        OvertimeFields {
            rate: self.rate,
            min_duration_minutes: self.min_duration_minutes,
            max_duration_hours_per_day: self.max_duration_hours_per_day,
            status: self.status,
        }
    }

    pub fn apply_fields(&mut self, fields: OvertimeFields) {
        self.rate = fields.rate;
        self.min_duration_minutes = fields.min_duration_minutes;
        self.max_duration_hours_per_day = fields.max_duration_hours_per_day;
        self.status = fields.status;
    }

    /// Case-insensitive substring match on name or code. An empty query
    /// matches everything.
    pub fn matches_filter(&self, query: &str) -> bool {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return true;
        }
        self.name.to_lowercase().contains(&needle) || self.code.to_lowercase().contains(&needle)
    }
}
