use serde::Serialize;
use uuid::Uuid;

use super::{
    error::DeskError,
    normalizer::parse_decimal,
    row::{DisplayRow, DisplayStatus, OvertimeFields},
};

/// One editable field of the draft, already typed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DraftField {
    Rate(f64),
    MinDurationMinutes(f64),
    MaxDurationHoursPerDay(f64),
    Status(DisplayStatus),
}

impl DraftField {
    /// Reads a raw form input. Numbers follow the tolerant-read rule
    /// (garbage becomes `0`). The status must be `active` or `inactive` in
    /// any case. Returns `None` for field names the draft does not have and
    /// for any other status text.
    pub fn from_input(name: &str, value: &str) -> Option<Self> {
        let field = match name {
            "rate" => DraftField::Rate(parse_decimal(value)),
            "minDurationMinutes" | "min_duration_minutes" => {
                DraftField::MinDurationMinutes(parse_decimal(value))
            }
            "maxDurationHoursPerDay" | "max_duration_hours_per_day" => {
                DraftField::MaxDurationHoursPerDay(parse_decimal(value))
            }
            "status" => {
                let value = value.trim();
                if value.eq_ignore_ascii_case("active") {
                    DraftField::Status(DisplayStatus::Active)
                } else if value.eq_ignore_ascii_case("inactive") {
                    DraftField::Status(DisplayStatus::Inactive)
                } else {
                    return None;
                }
            }
            _ => return None,
        };
        Some(field)
    }
}

impl OvertimeFields {
    /// A new field set with one field replaced.
    pub fn with(self, field: DraftField) -> Self {
        match field {
            DraftField::Rate(rate) => Self { rate, ..self },
            DraftField::MinDurationMinutes(min_duration_minutes) => Self {
                min_duration_minutes,
                ..self
            },
            DraftField::MaxDurationHoursPerDay(max_duration_hours_per_day) => Self {
                max_duration_hours_per_day,
                ..self
            },
            DraftField::Status(status) => Self { status, ..self },
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EditSession {
    pub session_id: Uuid,
    pub record_id: i64,
    pub draft: OvertimeFields,
    /// Set once `commit` has handed the draft to the coordinator.
    pub committing: bool,
}

/// Inline edit state; at most one row is ever being edited.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "state", rename_all = "camelCase")]
pub enum EditState {
    Idle,
    Editing(EditSession),
}

impl Default for EditState {
    fn default() -> Self {
        EditState::Idle
    }
}

impl EditState {
    pub fn is_editing(&self) -> bool {
        matches!(self, EditState::Editing(_))
    }

    /// Begin-edit and delete stay disabled for every row while any row is
    /// being edited.
    pub fn row_actions_enabled(&self) -> bool {
        !self.is_editing()
    }

    pub fn session(&self) -> Option<&EditSession> {
        match self {
            EditState::Editing(session) => Some(session),
            EditState::Idle => None,
        }
    }

    pub fn begin(&mut self, row: &DisplayRow) -> Result<EditSession, DeskError> {
        if self.is_editing() {
            return Err(DeskError::EditInProgress);
        }

        let session = EditSession {
            session_id: Uuid::new_v4(),
            record_id: row.record_id,
            draft: row.fields(),
            committing: false,
        };
        *self = EditState::Editing(session.clone());
        Ok(session)
    }

    pub fn update_draft(&mut self, field: DraftField) -> Result<OvertimeFields, DeskError> {
        match self {
            EditState::Editing(session) => {
                session.draft = session.draft.with(field);
                Ok(session.draft)
            }
            EditState::Idle => Err(DeskError::NotEditing),
        }
    }

    /// Drops the draft. Allowed at any point while editing, including
    /// while a commit is in flight.
    pub fn cancel(&mut self) -> Result<(), DeskError> {
        if !self.is_editing() {
            return Err(DeskError::NotEditing);
        }
        *self = EditState::Idle;
        Ok(())
    }

    /// Marks the session as committing and hands out what to send.
    pub fn start_commit(&mut self) -> Result<EditSession, DeskError> {
        match self {
            EditState::Editing(session) if session.committing => Err(DeskError::CommitInFlight),
            EditState::Editing(session) => {
                session.committing = true;
                Ok(session.clone())
            }
            EditState::Idle => Err(DeskError::NotEditing),
        }
    }

    /// Returns to `Idle` after a commit resolved, unless the user already
    /// left that session (cancel, then a new edit).
    pub fn finish_commit(&mut self, session_id: Uuid) -> bool {
        let same_session = matches!(
            self,
            EditState::Editing(session) if session.session_id == session_id
        );
        if same_session {
            *self = EditState::Idle;
        }
        same_session
    }
}
