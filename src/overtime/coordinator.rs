//! Create / update / delete / save-all against the remote store.
//!
//! None of these insert or remove rows themselves: an acknowledged call
//! re-fetches the record collection and the table is rebuilt from the new
//! snapshot. The one local write is the optimistic overwrite in
//! [`OvertimeDesk::update`], which is never rolled back.

use std::sync::{Arc, Weak};

use serde::{Deserialize, Serialize};
use tokio::task::JoinSet;
use uuid::Uuid;

use crate::{
    db::{OvertimeRecord, OvertimeWrite},
    remote::OvertimeStore,
};

use super::{
    desk::{DeskInner, OvertimeDesk},
    error::{DeskError, FieldErrors},
    notify::{Notice, Notifier},
    row::{DisplayStatus, OvertimeFields},
};

const ENABLE_LOGS: bool = true;

use crate::{log_error, log_info, log_warn};

/// Raw "add configuration" form input.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOvertimeInput {
    pub person_id: Option<i64>,
    pub rate: String,
    pub min_duration_minutes: String,
    pub max_duration_hours_per_day: String,
    #[serde(default)]
    pub status: DisplayStatus,
}

fn check_amount(raw: &str, label: &str) -> Result<f64, String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(format!("{label} is required"));
    }
    let value: f64 = trimmed
        .parse()
        .map_err(|_| format!("{label} must be a number"))?;
    if !value.is_finite() {
        return Err(format!("{label} must be a number"));
    }
    if value < 0.0 {
        return Err(format!("{label} cannot be negative"));
    }
    Ok(value)
}

/// Tracks one optimistic write until its remote call resolves. Dropping
/// it unsettled (the `update` future was abandoned mid-flight) still
/// forgets the write, so a later rebuild shows the store's values again.
struct PendingGuard<S: OvertimeStore, N: Notifier> {
    inner: Weak<DeskInner<S, N>>,
    pending_id: Option<Uuid>,
}

impl<S: OvertimeStore, N: Notifier> PendingGuard<S, N> {
    fn new(inner: &Arc<DeskInner<S, N>>, pending_id: Uuid) -> Self {
        Self {
            inner: Arc::downgrade(inner),
            pending_id: Some(pending_id),
        }
    }

    async fn settle(mut self) {
        let Some(inner) = self.inner.upgrade() else {
            return;
        };
        let mut state = inner.state.lock().await;
        // Taken only once the lock is held; cancellation before that point
        // leaves the id for `drop`.
        if let Some(pending_id) = self.pending_id.take() {
            state.sync.settle(pending_id);
        }
    }
}

impl<S: OvertimeStore, N: Notifier> Drop for PendingGuard<S, N> {
    fn drop(&mut self) {
        let Some(pending_id) = self.pending_id.take() else {
            return;
        };
        let Some(inner) = self.inner.upgrade() else {
            return;
        };

        log_warn!("update abandoned before the store answered; dropping pending write {pending_id}");
        if let Ok(mut state) = inner.state.try_lock() {
            state.sync.settle(pending_id);
            return;
        }
        match tokio::runtime::Handle::try_current() {
            Ok(runtime) => {
                runtime.spawn(async move {
                    inner.state.lock().await.sync.settle(pending_id);
                });
            }
            Err(_) => log_error!("no runtime to settle pending write {pending_id}"),
        }
    }
}

/// Local validation for the create form. Every field is checked so the
/// form can show all problems at once.
pub fn validate_create(input: &CreateOvertimeInput) -> Result<OvertimeWrite, FieldErrors> {
    let person = input.person_id.ok_or_else(|| "Please select an employee".to_string());
    let rate = check_amount(&input.rate, "Rate");
    let min = check_amount(&input.min_duration_minutes, "Minimum duration");
    let max = check_amount(&input.max_duration_hours_per_day, "Maximum hours per day");

    match (person, rate, min, max) {
        (Ok(employee), Ok(rate), Ok(min), Ok(max)) => Ok(OvertimeWrite {
            employee,
            rate,
            min_duration_minutes: min,
            max_duration_hours_per_day: max,
            status: input.status.into(),
        }),
        (person, rate, min, max) => Err(FieldErrors {
            person: person.err(),
            rate: rate.err(),
            min_duration_minutes: min.err(),
            max_duration_hours_per_day: max.err(),
        }),
    }
}

impl<S: OvertimeStore, N: Notifier> OvertimeDesk<S, N> {
    /// Validates locally, then creates. Field errors are kept for the form
    /// and no remote call is made when validation fails.
    pub async fn create(&self, input: CreateOvertimeInput) -> Result<OvertimeRecord, DeskError> {
        let validated = validate_create(&input);
        let write = {
            let mut state = self.inner.state.lock().await;
            match validated {
                Ok(write) => {
                    state.create_errors = FieldErrors::default();
                    write
                }
                Err(errors) => {
                    state.create_errors = errors.clone();
                    return Err(DeskError::Validation(errors));
                }
            }
        };

        let employee = write.employee;
        match self.inner.store.create_overtime_record(write).await {
            Ok(record) => {
                log_info!("created overtime configuration {} for employee {}", record.id, employee);
                self.notify(Notice::success("Overtime configuration added"));
                self.reload_after_mutation().await;
                Ok(record)
            }
            Err(err) => {
                self.notify(Notice::error(format!(
                    "Failed to add overtime configuration: {err}"
                )));
                Err(err.into())
            }
        }
    }

    /// Sends the full field set for `record_id`, overwriting the row
    /// locally before the remote answers. A failure leaves the optimistic
    /// values on screen until the next rebuild.
    pub async fn update(
        &self,
        record_id: i64,
        fields: OvertimeFields,
    ) -> Result<OvertimeRecord, DeskError> {
        let (employee, pending) = {
            let mut state = self.inner.state.lock().await;
            let employee = state
                .sync
                .row(record_id)
                .map(|row| row.person_id)
                .ok_or(DeskError::UnknownRecord(record_id))?;
            let pending = state
                .sync
                .apply_optimistic(record_id, fields)
                .ok_or(DeskError::UnknownRecord(record_id))?;
            (employee, PendingGuard::new(&self.inner, pending.id))
        };

        let write = OvertimeWrite {
            employee,
            rate: fields.rate,
            min_duration_minutes: fields.min_duration_minutes,
            max_duration_hours_per_day: fields.max_duration_hours_per_day,
            status: fields.status.into(),
        };
        let result = self.inner.store.update_overtime_record(record_id, write).await;

        pending.settle().await;

        match result {
            Ok(record) => {
                self.notify(Notice::success("Overtime configuration updated"));
                self.reload_after_mutation().await;
                Ok(record)
            }
            Err(err) => {
                log_warn!("update of overtime configuration {record_id} failed; keeping optimistic values");
                self.notify(Notice::error(format!(
                    "Failed to update overtime configuration: {err}"
                )));
                Err(err.into())
            }
        }
    }

    /// Deletes remotely. The row stays until a rebuild from a snapshot
    /// without it. Refused while any row is being edited.
    pub async fn delete(&self, record_id: i64) -> Result<(), DeskError> {
        if !self.inner.state.lock().await.edit.row_actions_enabled() {
            return Err(DeskError::RowActionsLocked);
        }

        match self.inner.store.delete_overtime_record(record_id).await {
            Ok(()) => {
                log_info!("deleted overtime configuration {record_id}");
                self.notify(Notice::success("Overtime configuration deleted"));
                self.reload_after_mutation().await;
                Ok(())
            }
            Err(err) => {
                self.notify(Notice::error(format!(
                    "Failed to delete overtime configuration: {err}"
                )));
                Err(err.into())
            }
        }
    }

    /// One concurrent `update` per current row. Failures are reported by
    /// each update on its own and never stop the others. Returns how many
    /// updates were issued.
    pub async fn save_all(&self) -> usize {
        let rows = self.rows().await;
        let mut tasks = JoinSet::new();

        for row in rows {
            let desk = self.clone();
            tasks.spawn(async move { desk.update(row.record_id, row.fields()).await });
        }

        let issued = tasks.len();
        let mut failed = 0usize;
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(Ok(_)) => {}
                Ok(Err(_)) => failed += 1,
                Err(join_err) => {
                    failed += 1;
                    log_error!("save-all update task failed to join: {join_err}");
                }
            }
        }

        log_info!("save-all issued {issued} updates, {failed} failed");
        issued
    }

    async fn reload_after_mutation(&self) {
        // The mutation itself succeeded; a failed reload was already
        // reported and the next refresh catches up.
        if let Err(err) = self.refresh_records().await {
            log_warn!("reload after mutation failed: {err}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::RecordStatus;

    fn input(person_id: Option<i64>, rate: &str, min: &str, max: &str) -> CreateOvertimeInput {
        CreateOvertimeInput {
            person_id,
            rate: rate.into(),
            min_duration_minutes: min.into(),
            max_duration_hours_per_day: max.into(),
            status: DisplayStatus::Active,
        }
    }

    #[test]
    fn valid_input_becomes_a_write() {
        let write = validate_create(&input(Some(7), "50", " 60 ", "4.5")).unwrap();
        assert_eq!(
            write,
            OvertimeWrite {
                employee: 7,
                rate: 50.0,
                min_duration_minutes: 60.0,
                max_duration_hours_per_day: 4.5,
                status: RecordStatus::Active,
            }
        );
    }

    #[test]
    fn empty_rate_is_a_rate_error_only() {
        let errors = validate_create(&input(Some(7), "", "60", "4")).unwrap_err();
        assert_eq!(errors.rate.as_deref(), Some("Rate is required"));
        assert!(errors.person.is_none());
        assert!(errors.min_duration_minutes.is_none());
        assert!(errors.max_duration_hours_per_day.is_none());
    }

    #[test]
    fn all_problems_are_reported_together() {
        let errors = validate_create(&input(None, "abc", "-1", "inf")).unwrap_err();
        assert_eq!(errors.person.as_deref(), Some("Please select an employee"));
        assert_eq!(errors.rate.as_deref(), Some("Rate must be a number"));
        assert_eq!(
            errors.min_duration_minutes.as_deref(),
            Some("Minimum duration cannot be negative")
        );
        assert_eq!(
            errors.max_duration_hours_per_day.as_deref(),
            Some("Maximum hours per day must be a number")
        );
    }

    #[test]
    fn zero_is_allowed() {
        assert!(validate_create(&input(Some(1), "0", "0", "0")).is_ok());
    }
}
