use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};

use crate::db::models::overtime::format_decimal;

pub fn parse_datetime(value: &str, field: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .with_context(|| format!("failed to parse {field}"))
}

/// Decimal column text for a write. The store refuses values the remote API
/// would reject instead of persisting `NaN` or negative rates.
pub fn decimal_column(value: f64, field: &str) -> Result<String> {
    if !value.is_finite() {
        bail!("{field} must be a finite number");
    }
    if value < 0.0 {
        bail!("{field} must be zero or greater, got {value}");
    }
    Ok(format_decimal(value))
}
