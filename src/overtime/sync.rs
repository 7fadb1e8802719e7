use serde::Serialize;
use uuid::Uuid;

use super::{
    normalizer::normalize_all,
    row::{DisplayRow, OvertimeFields},
    snapshot::RemoteSnapshot,
};

const ENABLE_LOGS: bool = true;

use crate::log_debug;

/// An optimistic overwrite whose remote call has not resolved yet.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingWrite {
    pub id: Uuid,
    pub record_id: i64,
    pub fields: OvertimeFields,
}

/// Holds the rendered rows and rebuilds them from scratch whenever the
/// remote snapshot moves to a new version.
///
/// A rebuild discards every local divergence. With
/// `preserve_pending_writes` set, rows that still have an unresolved
/// optimistic write get it re-applied on top of the rebuilt row, so a stale
/// snapshot cannot visibly revert an edit in flight.
#[derive(Debug, Default)]
pub struct ViewSynchronizer {
    rows: Vec<DisplayRow>,
    seen_version: Option<u64>,
    pending: Vec<PendingWrite>,
    preserve_pending_writes: bool,
}

impl ViewSynchronizer {
    pub fn new(preserve_pending_writes: bool) -> Self {
        Self {
            preserve_pending_writes,
            ..Self::default()
        }
    }

    pub fn rows(&self) -> &[DisplayRow] {
        &self.rows
    }

    pub fn row(&self, record_id: i64) -> Option<&DisplayRow> {
        self.rows.iter().find(|row| row.record_id == record_id)
    }

    pub fn seen_version(&self) -> Option<u64> {
        self.seen_version
    }

    pub fn pending(&self) -> &[PendingWrite] {
        &self.pending
    }

    /// Rebuilds if `snapshot` is a version this synchronizer has not seen.
    pub fn sync(&mut self, snapshot: &RemoteSnapshot) -> bool {
        if self.seen_version == Some(snapshot.version) {
            return false;
        }
        self.rebuild(snapshot);
        true
    }

    pub fn rebuild(&mut self, snapshot: &RemoteSnapshot) {
        self.rows = normalize_all(&snapshot.records, &snapshot.persons);
        self.seen_version = Some(snapshot.version);

        if self.preserve_pending_writes {
            // Oldest first so the latest write to a row wins.
            for pending in &self.pending {
                if let Some(row) = self
                    .rows
                    .iter_mut()
                    .find(|row| row.record_id == pending.record_id)
                {
                    row.apply_fields(pending.fields);
                }
            }
        }

        log_debug!(
            "rebuilt {} overtime rows from snapshot v{}",
            self.rows.len(),
            snapshot.version
        );
    }

    /// Overwrites the row's mutable fields and records the pending write.
    /// Returns `None` when the row is not in the table.
    pub fn apply_optimistic(
        &mut self,
        record_id: i64,
        fields: OvertimeFields,
    ) -> Option<PendingWrite> {
        let row = self.rows.iter_mut().find(|row| row.record_id == record_id)?;
        row.apply_fields(fields);

        let pending = PendingWrite {
            id: Uuid::new_v4(),
            record_id,
            fields,
        };
        self.pending.push(pending.clone());
        log_debug!("optimistic write {} applied to record {}", pending.id, record_id);
        Some(pending)
    }

    /// Forgets a pending write once its remote call resolved, either way.
    /// The row keeps whatever it currently shows until the next rebuild.
    pub fn settle(&mut self, pending_id: Uuid) {
        self.pending.retain(|pending| pending.id != pending_id);
    }

    pub fn has_pending(&self, record_id: i64) -> bool {
        self.pending.iter().any(|pending| pending.record_id == record_id)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::db::{OvertimeRecord, Person};
    use crate::overtime::row::DisplayStatus;

    fn record(id: i64, employee: i64, rate: &str) -> OvertimeRecord {
        OvertimeRecord {
            id,
            employee,
            rate: rate.into(),
            min_duration_minutes: "60.00".into(),
            max_duration_hours_per_day: "4.00".into(),
            status: "active".into(),
            employee_details: None,
            updated_at: None,
        }
    }

    fn snapshot(version: u64, records: Vec<OvertimeRecord>) -> RemoteSnapshot {
        RemoteSnapshot {
            version,
            records: Arc::new(records),
            persons: Arc::new(vec![Person::new(7, "Jane Doe", "EMP-07")]),
        }
    }

    fn edited() -> OvertimeFields {
        OvertimeFields {
            rate: 80.0,
            min_duration_minutes: 15.0,
            max_duration_hours_per_day: 3.0,
            status: DisplayStatus::Inactive,
        }
    }

    #[test]
    fn same_version_does_not_rebuild() {
        let mut sync = ViewSynchronizer::new(false);
        assert!(sync.sync(&snapshot(1, vec![record(1, 7, "50")])));
        sync.apply_optimistic(1, edited()).unwrap();

        assert!(!sync.sync(&snapshot(1, vec![record(1, 7, "50")])));
        assert_eq!(sync.rows()[0].rate, 80.0);
    }

    #[test]
    fn stale_rebuild_reverts_optimistic_value_by_default() {
        let mut sync = ViewSynchronizer::new(false);
        sync.sync(&snapshot(1, vec![record(1, 7, "50")]));
        sync.apply_optimistic(1, edited()).unwrap();

        sync.sync(&snapshot(2, vec![record(1, 7, "50")]));
        assert_eq!(sync.rows()[0].rate, 50.0);
    }

    #[test]
    fn preserved_pending_write_survives_stale_rebuild() {
        let mut sync = ViewSynchronizer::new(true);
        sync.sync(&snapshot(1, vec![record(1, 7, "50"), record(2, 8, "10")]));
        let pending = sync.apply_optimistic(1, edited()).unwrap();

        sync.sync(&snapshot(2, vec![record(1, 7, "50"), record(2, 8, "10")]));
        assert_eq!(sync.row(1).unwrap().fields(), edited());
        assert_eq!(sync.row(2).unwrap().rate, 10.0);

        sync.settle(pending.id);
        assert!(!sync.has_pending(1));
        sync.sync(&snapshot(3, vec![record(1, 7, "50"), record(2, 8, "10")]));
        assert_eq!(sync.row(1).unwrap().rate, 50.0);
    }

    #[test]
    fn optimistic_write_on_unknown_row_is_refused() {
        let mut sync = ViewSynchronizer::new(false);
        sync.sync(&snapshot(1, vec![record(1, 7, "50")]));
        assert!(sync.apply_optimistic(42, edited()).is_none());
        assert!(sync.pending().is_empty());
    }
}
