#![allow(dead_code)]

use std::{
    collections::{HashMap, HashSet, VecDeque},
    path::PathBuf,
    sync::{Arc, Mutex},
    time::Duration,
};

use anyhow::{anyhow, Result};
use overtime_desk_lib::{
    db::{OvertimeRecord, OvertimeWrite, Person},
    overtime::{DeskOptions, Notice, NoticeLevel, Notifier, OvertimeDesk},
    remote::OvertimeStore,
};
use tokio::sync::Semaphore;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
    FetchRecords,
    FetchPersons,
    Create,
    Update,
    Delete,
}

#[derive(Default)]
struct StoreData {
    records: Vec<OvertimeRecord>,
    persons: Vec<Person>,
    next_id: i64,
    fail_next: HashMap<Op, VecDeque<String>>,
    failing_records: HashSet<i64>,
    calls: HashMap<Op, usize>,
    waiting: HashMap<Op, usize>,
    last_update: Option<(i64, OvertimeWrite)>,
}

/// In-memory remote store with failure injection and gated calls.
///
/// A held operation parks every call until `release` hands out permits;
/// the data change happens when the call resumes, like a slow server.
#[derive(Clone, Default)]
pub struct ScriptedStore {
    data: Arc<Mutex<StoreData>>,
    gates: Arc<Mutex<HashMap<Op, Arc<Semaphore>>>>,
}

pub fn decimal(value: f64) -> String {
    format!("{value:.2}")
}

impl ScriptedStore {
    pub fn new() -> Self {
        let store = Self::default();
        store.data.lock().unwrap().next_id = 1;
        store
    }

    pub fn with_persons(self, persons: Vec<Person>) -> Self {
        self.data.lock().unwrap().persons = persons;
        self
    }

    /// Seeds a record in wire format and returns its id.
    pub fn seed(&self, person_id: i64, rate: &str, min: &str, max: &str, status: &str) -> i64 {
        let mut data = self.data.lock().unwrap();
        let id = data.next_id;
        data.next_id += 1;
        data.records.push(OvertimeRecord {
            id,
            employee: person_id,
            rate: rate.into(),
            min_duration_minutes: min.into(),
            max_duration_hours_per_day: max.into(),
            status: status.into(),
            employee_details: None,
            updated_at: None,
        });
        id
    }

    /// Simulates another client editing a record behind our back.
    pub fn set_rate(&self, record_id: i64, rate: &str) {
        let mut data = self.data.lock().unwrap();
        if let Some(record) = data.records.iter_mut().find(|r| r.id == record_id) {
            record.rate = rate.into();
        }
    }

    pub fn fail_next(&self, op: Op, message: &str) {
        self.data
            .lock()
            .unwrap()
            .fail_next
            .entry(op)
            .or_default()
            .push_back(message.into());
    }

    pub fn fail_updates_for(&self, record_id: i64) {
        self.data.lock().unwrap().failing_records.insert(record_id);
    }

    pub fn hold(&self, op: Op) {
        self.gates
            .lock()
            .unwrap()
            .insert(op, Arc::new(Semaphore::new(0)));
    }

    pub fn release(&self, op: Op, permits: usize) {
        if let Some(gate) = self.gates.lock().unwrap().get(&op) {
            gate.add_permits(permits);
        }
    }

    pub fn calls(&self, op: Op) -> usize {
        self.data.lock().unwrap().calls.get(&op).copied().unwrap_or(0)
    }

    pub fn waiting(&self, op: Op) -> usize {
        self.data.lock().unwrap().waiting.get(&op).copied().unwrap_or(0)
    }

    pub fn records(&self) -> Vec<OvertimeRecord> {
        self.data.lock().unwrap().records.clone()
    }

    pub fn last_update(&self) -> Option<(i64, OvertimeWrite)> {
        self.data.lock().unwrap().last_update.clone()
    }

    /// Parks until `count` calls of `op` are waiting on the gate.
    pub async fn wait_for_waiting(&self, op: Op, count: usize) {
        tokio::time::timeout(Duration::from_secs(5), async {
            while self.waiting(op) < count {
                tokio::task::yield_now().await;
            }
        })
        .await
        .expect("calls never reached the gate");
    }

    async fn enter(&self, op: Op) -> Result<()> {
        let gate = {
            let mut data = self.data.lock().unwrap();
            *data.calls.entry(op).or_default() += 1;
            let gate = self.gates.lock().unwrap().get(&op).cloned();
            if gate.is_some() {
                *data.waiting.entry(op).or_default() += 1;
            }
            gate
        };

        if let Some(gate) = gate {
            gate.acquire()
                .await
                .map_err(|_| anyhow!("gate closed"))?
                .forget();
            *self.data.lock().unwrap().waiting.entry(op).or_default() -= 1;
        }

        let failure = self
            .data
            .lock()
            .unwrap()
            .fail_next
            .get_mut(&op)
            .and_then(|queue| queue.pop_front());
        match failure {
            Some(message) => Err(anyhow!(message)),
            None => Ok(()),
        }
    }
}

impl OvertimeStore for ScriptedStore {
    async fn fetch_overtime_records(&self) -> Result<Vec<OvertimeRecord>> {
        self.enter(Op::FetchRecords).await?;
        Ok(self.records())
    }

    async fn fetch_persons(&self) -> Result<Vec<Person>> {
        self.enter(Op::FetchPersons).await?;
        Ok(self.data.lock().unwrap().persons.clone())
    }

    async fn create_overtime_record(&self, write: OvertimeWrite) -> Result<OvertimeRecord> {
        self.enter(Op::Create).await?;
        let id = self.seed(
            write.employee,
            &decimal(write.rate),
            &decimal(write.min_duration_minutes),
            &decimal(write.max_duration_hours_per_day),
            write.status.as_str(),
        );
        self.records()
            .into_iter()
            .find(|record| record.id == id)
            .ok_or_else(|| anyhow!("record {id} vanished"))
    }

    async fn update_overtime_record(
        &self,
        record_id: i64,
        write: OvertimeWrite,
    ) -> Result<OvertimeRecord> {
        self.enter(Op::Update).await?;
        let mut data = self.data.lock().unwrap();
        if data.failing_records.contains(&record_id) {
            return Err(anyhow!("server rejected record {record_id}"));
        }
        data.last_update = Some((record_id, write.clone()));
        let record = data
            .records
            .iter_mut()
            .find(|record| record.id == record_id)
            .ok_or_else(|| anyhow!("record {record_id} not found"))?;
        record.employee = write.employee;
        record.rate = decimal(write.rate);
        record.min_duration_minutes = decimal(write.min_duration_minutes);
        record.max_duration_hours_per_day = decimal(write.max_duration_hours_per_day);
        record.status = write.status.as_str().into();
        Ok(record.clone())
    }

    async fn delete_overtime_record(&self, record_id: i64) -> Result<()> {
        self.enter(Op::Delete).await?;
        let mut data = self.data.lock().unwrap();
        let before = data.records.len();
        data.records.retain(|record| record.id != record_id);
        if data.records.len() == before {
            return Err(anyhow!("record {record_id} not found"));
        }
        Ok(())
    }
}

#[derive(Clone, Default)]
pub struct RecordingNotifier {
    notices: Arc<Mutex<Vec<Notice>>>,
}

impl RecordingNotifier {
    pub fn all(&self) -> Vec<Notice> {
        self.notices.lock().unwrap().clone()
    }

    pub fn errors(&self) -> Vec<String> {
        self.with_level(NoticeLevel::Error)
    }

    pub fn successes(&self) -> Vec<String> {
        self.with_level(NoticeLevel::Success)
    }

    fn with_level(&self, level: NoticeLevel) -> Vec<String> {
        self.notices
            .lock()
            .unwrap()
            .iter()
            .filter(|notice| notice.level == level)
            .map(|notice| notice.message.clone())
            .collect()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, notice: Notice) {
        self.notices.lock().unwrap().push(notice);
    }
}

pub type TestDesk = OvertimeDesk<ScriptedStore, RecordingNotifier>;

pub fn jane() -> Person {
    Person::new(7, "Jane Doe", "EMP-07")
}

pub fn staff() -> Vec<Person> {
    vec![
        jane(),
        Person::new(8, "John Smith", "EMP-08").with_department("Operations"),
        Person::new(9, "Ana Lima", "EMP-09").with_designation("Analyst"),
    ]
}

/// Store holding Jane's record (id 1) and two unconfigured colleagues.
pub fn seeded_store() -> ScriptedStore {
    let store = ScriptedStore::new().with_persons(staff());
    store.seed(7, "50.00", "60.00", "4.00", "active");
    store
}

pub fn desk_with(store: ScriptedStore, options: DeskOptions) -> (TestDesk, RecordingNotifier) {
    let notifier = RecordingNotifier::default();
    let desk = OvertimeDesk::new(store, notifier.clone(), options);
    (desk, notifier)
}

pub async fn loaded_desk(store: ScriptedStore) -> (TestDesk, RecordingNotifier) {
    let (desk, notifier) = desk_with(store, DeskOptions::default());
    desk.refresh().await.expect("initial refresh");
    (desk, notifier)
}

/// Fresh database file under the system temp dir; removed by the caller.
pub fn temp_db_path() -> PathBuf {
    std::env::temp_dir()
        .join("overtime-desk-tests")
        .join(format!("{}.sqlite3", uuid::Uuid::new_v4()))
}
