use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Per-field messages for the "add configuration" form.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FieldErrors {
    pub person: Option<String>,
    pub rate: Option<String>,
    pub min_duration_minutes: Option<String>,
    pub max_duration_hours_per_day: Option<String>,
}

#[derive(Debug, Error)]
pub enum DeskError {
    #[error("the overtime form has invalid fields")]
    Validation(FieldErrors),

    #[error("another row is already being edited")]
    EditInProgress,

    #[error("no row is being edited")]
    NotEditing,

    #[error("the current edit is already being saved")]
    CommitInFlight,

    #[error("row actions are disabled while a row is being edited")]
    RowActionsLocked,

    #[error("unknown draft field '{0}'")]
    UnknownField(String),

    #[error("overtime configuration {0} is not in the table")]
    UnknownRecord(i64),

    #[error(transparent)]
    Remote(#[from] anyhow::Error),
}
