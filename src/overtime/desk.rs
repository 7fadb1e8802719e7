use std::sync::{Arc, Weak};

use anyhow::Context;
use serde::Serialize;
use tokio::{
    sync::{watch, Mutex},
    task::JoinHandle,
};
use tokio_util::sync::CancellationToken;

use crate::{db::Person, remote::OvertimeStore};

use super::{
    edit::{DraftField, EditSession, EditState},
    eligibility::eligible_persons,
    error::{DeskError, FieldErrors},
    notify::{Notice, Notifier},
    row::{DisplayRow, OvertimeFields},
    snapshot::{RemoteSnapshot, SnapshotHub},
    sync::ViewSynchronizer,
};

const ENABLE_LOGS: bool = true;

use crate::{log_info, log_warn};

#[derive(Debug, Clone, Copy, Default)]
pub struct DeskOptions {
    /// Re-apply unresolved optimistic writes after every rebuild instead of
    /// letting a stale snapshot revert them.
    pub preserve_pending_writes: bool,
}

/// Everything the host view renders.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeskView {
    pub snapshot_version: u64,
    pub rows: Vec<DisplayRow>,
    pub visible_rows: Vec<DisplayRow>,
    pub filter: String,
    pub eligible_persons: Vec<Person>,
    pub edit: EditState,
    pub row_actions_enabled: bool,
    pub create_errors: FieldErrors,
}

pub(super) struct DeskState {
    pub(super) sync: ViewSynchronizer,
    pub(super) edit: EditState,
    pub(super) create_errors: FieldErrors,
    pub(super) filter: String,
}

struct WatcherHandle {
    handle: JoinHandle<()>,
    cancel_token: CancellationToken,
}

pub(super) struct DeskInner<S, N> {
    pub(super) store: S,
    pub(super) notifier: N,
    pub(super) hub: SnapshotHub,
    pub(super) state: Mutex<DeskState>,
    watcher: Mutex<Option<WatcherHandle>>,
}

/// Host-facing controller for the overtime table.
///
/// Cheap to clone; clones share one table. The state lock is never held
/// across a remote call, so in-flight calls resolve in whatever order the
/// network delivers them.
pub struct OvertimeDesk<S, N> {
    pub(super) inner: Arc<DeskInner<S, N>>,
}

impl<S, N> Clone for OvertimeDesk<S, N> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S: OvertimeStore, N: Notifier> OvertimeDesk<S, N> {
    pub fn new(store: S, notifier: N, options: DeskOptions) -> Self {
        Self {
            inner: Arc::new(DeskInner {
                store,
                notifier,
                hub: SnapshotHub::new(),
                state: Mutex::new(DeskState {
                    sync: ViewSynchronizer::new(options.preserve_pending_writes),
                    edit: EditState::Idle,
                    create_errors: FieldErrors::default(),
                    filter: String::new(),
                }),
                watcher: Mutex::new(None),
            }),
        }
    }

    pub fn store(&self) -> &S {
        &self.inner.store
    }

    pub fn snapshots(&self) -> watch::Receiver<RemoteSnapshot> {
        self.inner.hub.subscribe()
    }

    pub(super) fn notify(&self, notice: Notice) {
        self.inner.notifier.notify(notice);
    }

    /// Fetches persons and records concurrently, publishes whatever arrived
    /// and rebuilds the table.
    pub async fn refresh(&self) -> Result<(), DeskError> {
        let (persons, records) = tokio::join!(
            self.inner.store.fetch_persons(),
            self.inner.store.fetch_overtime_records()
        );

        let persons_result = match persons {
            Ok(persons) => {
                self.inner.hub.publish_persons(persons);
                Ok(())
            }
            Err(err) => {
                self.notify(Notice::error(format!("Failed to load employees: {err}")));
                Err(err)
            }
        };

        let records_result = match records {
            Ok(records) => {
                self.inner.hub.publish_records(records);
                Ok(())
            }
            Err(err) => {
                self.notify(Notice::error(format!(
                    "Failed to load overtime configurations: {err}"
                )));
                Err(err)
            }
        };

        self.resync().await;
        persons_result.and(records_result).map_err(DeskError::from)
    }

    /// Re-fetches the record collection only; what every acknowledged
    /// mutation does.
    pub async fn refresh_records(&self) -> Result<(), DeskError> {
        let records = match self.inner.store.fetch_overtime_records().await {
            Ok(records) => records,
            Err(err) => {
                self.notify(Notice::error(format!(
                    "Failed to reload overtime configurations: {err}"
                )));
                return Err(err.into());
            }
        };
        self.inner.hub.publish_records(records);
        self.resync().await;
        Ok(())
    }

    /// Rebuilds the rows if the snapshot changed since the last rebuild.
    pub async fn resync(&self) -> bool {
        let snapshot = self.inner.hub.current();
        self.inner.state.lock().await.sync.sync(&snapshot)
    }

    pub async fn rows(&self) -> Vec<DisplayRow> {
        self.inner.state.lock().await.sync.rows().to_vec()
    }

    pub async fn visible_rows(&self) -> Vec<DisplayRow> {
        let state = self.inner.state.lock().await;
        state
            .sync
            .rows()
            .iter()
            .filter(|row| row.matches_filter(&state.filter))
            .cloned()
            .collect()
    }

    pub async fn set_filter(&self, query: impl Into<String>) {
        self.inner.state.lock().await.filter = query.into();
    }

    pub async fn eligible_persons(&self) -> Vec<Person> {
        let persons = self.inner.hub.current().persons;
        let state = self.inner.state.lock().await;
        eligible_persons(&persons, state.sync.rows())
    }

    pub async fn edit_state(&self) -> EditState {
        self.inner.state.lock().await.edit.clone()
    }

    pub async fn create_errors(&self) -> FieldErrors {
        self.inner.state.lock().await.create_errors.clone()
    }

    pub async fn view(&self) -> DeskView {
        let snapshot = self.inner.hub.current();
        let state = self.inner.state.lock().await;
        let rows = state.sync.rows().to_vec();
        let visible_rows = rows
            .iter()
            .filter(|row| row.matches_filter(&state.filter))
            .cloned()
            .collect();

        DeskView {
            snapshot_version: snapshot.version,
            eligible_persons: eligible_persons(&snapshot.persons, &rows),
            rows,
            visible_rows,
            filter: state.filter.clone(),
            edit: state.edit.clone(),
            row_actions_enabled: state.edit.row_actions_enabled(),
            create_errors: state.create_errors.clone(),
        }
    }

    pub async fn begin_edit(&self, record_id: i64) -> Result<EditSession, DeskError> {
        let mut state = self.inner.state.lock().await;
        let DeskState { sync, edit, .. } = &mut *state;
        let row = sync.row(record_id).ok_or(DeskError::UnknownRecord(record_id))?;
        edit.begin(row)
    }

    pub async fn update_draft_field(&self, field: DraftField) -> Result<OvertimeFields, DeskError> {
        self.inner.state.lock().await.edit.update_draft(field)
    }

    /// Draft update straight from a form input name/value pair.
    pub async fn update_draft_input(
        &self,
        name: &str,
        value: &str,
    ) -> Result<OvertimeFields, DeskError> {
        let field = DraftField::from_input(name, value)
            .ok_or_else(|| DeskError::UnknownField(name.to_string()))?;
        self.update_draft_field(field).await
    }

    pub async fn cancel_edit(&self) -> Result<(), DeskError> {
        self.inner.state.lock().await.edit.cancel()
    }

    /// Sends the draft through [`OvertimeDesk::update`] and returns to
    /// `Idle` whatever the outcome. A failed draft is not kept for retry.
    pub async fn commit_edit(&self) -> Result<DisplayRow, DeskError> {
        let session = self.inner.state.lock().await.edit.start_commit()?;

        let result = self.update(session.record_id, session.draft).await;

        self.inner
            .state
            .lock()
            .await
            .edit
            .finish_commit(session.session_id);

        result?;
        let state = self.inner.state.lock().await;
        state
            .sync
            .row(session.record_id)
            .cloned()
            .ok_or(DeskError::UnknownRecord(session.record_id))
    }

    /// Starts rebuilding on every snapshot change in the background.
    pub async fn spawn_watcher(&self) {
        let mut guard = self.inner.watcher.lock().await;
        if guard.is_some() {
            return;
        }

        let cancel_token = CancellationToken::new();
        let token = cancel_token.clone();
        let mut rx = self.inner.hub.subscribe();
        let weak: Weak<DeskInner<S, N>> = Arc::downgrade(&self.inner);

        let handle = tokio::spawn(async move {
            loop {
                tokio::select! {
                    changed = rx.changed() => {
                        if changed.is_err() {
                            break;
                        }
                        let Some(inner) = weak.upgrade() else {
                            break;
                        };
                        let snapshot = rx.borrow_and_update().clone();
                        inner.state.lock().await.sync.sync(&snapshot);
                    }
                    _ = token.cancelled() => break,
                }
            }
        });

        log_info!("overtime snapshot watcher started");
        *guard = Some(WatcherHandle {
            handle,
            cancel_token,
        });
    }

    pub async fn stop_watcher(&self) -> anyhow::Result<()> {
        let Some(watcher) = self.inner.watcher.lock().await.take() else {
            return Ok(());
        };
        watcher.cancel_token.cancel();
        watcher
            .handle
            .await
            .context("snapshot watcher task failed to join")?;
        log_info!("overtime snapshot watcher stopped");
        Ok(())
    }
}

impl<S, N> Drop for DeskInner<S, N> {
    fn drop(&mut self) {
        if let Some(watcher) = self.watcher.get_mut().take() {
            log_warn!("overtime desk dropped with a running watcher; cancelling it");
            watcher.cancel_token.cancel();
        }
    }
}
