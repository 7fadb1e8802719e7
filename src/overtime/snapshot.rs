//! The observable remote snapshot.
//!
//! Every publish bumps `version`; observers compare versions instead of
//! contents, so republishing identical data still counts as a change.

use std::sync::Arc;

use tokio::sync::watch;

use crate::db::{OvertimeRecord, Person};

#[derive(Debug, Clone, Default)]
pub struct RemoteSnapshot {
    pub version: u64,
    pub records: Arc<Vec<OvertimeRecord>>,
    pub persons: Arc<Vec<Person>>,
}

pub struct SnapshotHub {
    tx: watch::Sender<RemoteSnapshot>,
}

impl SnapshotHub {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(RemoteSnapshot::default());
        Self { tx }
    }

    pub fn subscribe(&self) -> watch::Receiver<RemoteSnapshot> {
        self.tx.subscribe()
    }

    pub fn current(&self) -> RemoteSnapshot {
        self.tx.borrow().clone()
    }

    pub fn publish_records(&self, records: Vec<OvertimeRecord>) -> u64 {
        let records = Arc::new(records);
        self.publish(|snapshot| snapshot.records = records)
    }

    pub fn publish_persons(&self, persons: Vec<Person>) -> u64 {
        let persons = Arc::new(persons);
        self.publish(|snapshot| snapshot.persons = persons)
    }

    fn publish(&self, apply: impl FnOnce(&mut RemoteSnapshot)) -> u64 {
        let mut version = 0;
        self.tx.send_modify(|snapshot| {
            apply(snapshot);
            snapshot.version += 1;
            version = snapshot.version;
        });
        version
    }
}

impl Default for SnapshotHub {
    fn default() -> Self {
        Self::new()
    }
}
