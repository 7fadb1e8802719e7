//! Overtime configuration records in their remote (wire) shape.
//!
//! The remote API serialises decimals as text (`"50.00"`) but older
//! payloads carry plain JSON numbers, and broken ones carry nothing at all.
//! Both are accepted here and kept verbatim; turning them into numbers is
//! the normalizer's job.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RecordStatus {
    Active,
    Inactive,
}

impl RecordStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordStatus::Active => "active",
            RecordStatus::Inactive => "inactive",
        }
    }
}

impl Default for RecordStatus {
    fn default() -> Self {
        RecordStatus::Active
    }
}

/// Person fields the remote may embed in a record.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct EmbeddedPerson {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub department: Option<String>,
    #[serde(default)]
    pub designation: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OvertimeRecord {
    pub id: i64,
    /// Person id.
    pub employee: i64,
    #[serde(default, deserialize_with = "lenient_decimal")]
    pub rate: String,
    #[serde(default, deserialize_with = "lenient_decimal")]
    pub min_duration_minutes: String,
    #[serde(default, deserialize_with = "lenient_decimal")]
    pub max_duration_hours_per_day: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub employee_details: Option<EmbeddedPerson>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Full mutable field set sent on create and update. Updates are never
/// partial patches.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OvertimeWrite {
    pub employee: i64,
    pub rate: f64,
    pub min_duration_minutes: f64,
    pub max_duration_hours_per_day: f64,
    pub status: RecordStatus,
}

fn lenient_decimal<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(text)) => text,
        Some(Value::Number(number)) => number.to_string(),
        _ => String::new(),
    })
}

/// Two-decimal text, the way the remote API renders its decimal columns.
pub fn format_decimal(value: f64) -> String {
    format!("{value:.2}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_text_and_numeric_decimals() {
        let record: OvertimeRecord = serde_json::from_str(
            r#"{"id":1,"employee":7,"rate":"50.00","min_duration_minutes":60,
                "max_duration_hours_per_day":null,"status":"active"}"#,
        )
        .unwrap();

        assert_eq!(record.rate, "50.00");
        assert_eq!(record.min_duration_minutes, "60");
        assert_eq!(record.max_duration_hours_per_day, "");
        assert!(record.employee_details.is_none());
    }

    #[test]
    fn missing_decimals_default_to_empty_text() {
        let record: OvertimeRecord =
            serde_json::from_str(r#"{"id":2,"employee":3}"#).unwrap();
        assert_eq!(record.rate, "");
        assert_eq!(record.status, "");
    }

    #[test]
    fn status_uses_lowercase_wire_names() {
        assert_eq!(
            serde_json::to_string(&RecordStatus::Inactive).unwrap(),
            "\"inactive\""
        );
        assert_eq!(RecordStatus::Active.as_str(), "active");
    }
}
