//! Raw remote records → display rows.
//!
//! Reads are tolerant: malformed numbers become `0`, missing person data
//! becomes [`PLACEHOLDER`], unknown statuses read as inactive. A bad record
//! degrades its own row and never the list.

use std::collections::HashMap;

use crate::db::{OvertimeRecord, Person};

use super::row::{DisplayRow, DisplayStatus};

const ENABLE_LOGS: bool = true;

use crate::log_warn;

pub const PLACEHOLDER: &str = "—";

/// Parses a decimal as delivered by the remote. Anything that is not a
/// finite number reads as `0`.
pub fn parse_decimal(raw: &str) -> f64 {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return 0.0;
    }
    match trimmed.parse::<f64>() {
        Ok(value) if value.is_finite() => value,
        _ => {
            log_warn!("unparsable decimal {raw:?} from remote, reading as 0");
            0.0
        }
    }
}

fn present(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}

fn resolve(embedded: Option<&str>, looked_up: Option<&str>) -> String {
    present(embedded)
        .or_else(|| present(looked_up))
        .unwrap_or(PLACEHOLDER)
        .to_string()
}

/// Builds the row for one record. Embedded employee fields win; the
/// person lookup fills whatever the embedding leaves out.
pub fn normalize_record(record: &OvertimeRecord, person: Option<&Person>) -> DisplayRow {
    let embedded = record.employee_details.as_ref();

    let status = DisplayStatus::from_stored(&record.status).unwrap_or_else(|| {
        log_warn!(
            "overtime record {} has unrecognized status {:?}, showing Inactive",
            record.id,
            record.status
        );
        DisplayStatus::Inactive
    });

    DisplayRow {
        record_id: record.id,
        person_id: record.employee,
        name: resolve(
            embedded.and_then(|e| e.name.as_deref()),
            person.map(|p| p.name.as_str()),
        ),
        code: resolve(
            embedded.and_then(|e| e.code.as_deref()),
            person.map(|p| p.code.as_str()),
        ),
        department: resolve(
            embedded.and_then(|e| e.department.as_deref()),
            person.and_then(|p| p.department.as_deref()),
        ),
        designation: resolve(
            embedded.and_then(|e| e.designation.as_deref()),
            person.and_then(|p| p.designation.as_deref()),
        ),
        rate: parse_decimal(&record.rate),
        min_duration_minutes: parse_decimal(&record.min_duration_minutes),
        max_duration_hours_per_day: parse_decimal(&record.max_duration_hours_per_day),
        status,
    }
}

/// Order-preserving map over the whole fetched collection; one row per
/// record.
pub fn normalize_all(records: &[OvertimeRecord], persons: &[Person]) -> Vec<DisplayRow> {
    let by_id: HashMap<i64, &Person> = persons.iter().map(|p| (p.id, p)).collect();
    records
        .iter()
        .map(|record| normalize_record(record, by_id.get(&record.employee).copied()))
        .collect()
}
