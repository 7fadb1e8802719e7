use std::{
    path::{Path, PathBuf},
    sync::{mpsc, Arc, Mutex},
    thread::{self, JoinHandle},
};

use anyhow::{anyhow, Context, Result};
use log::{error, info};
use rusqlite::Connection;
use tokio::sync::oneshot;

use super::migrations::run_migrations;

type Job = Box<dyn FnOnce(&mut Connection) + Send + 'static>;

enum StoreJob {
    Run(Job),
    Stop,
}

/// Owner of the store thread. Stopping it drains the jobs already queued.
struct StoreWorker {
    jobs: mpsc::Sender<StoreJob>,
    thread: Mutex<Option<JoinHandle<()>>>,
}

impl Drop for StoreWorker {
    fn drop(&mut self) {
        let handle = match self.thread.lock() {
            Ok(mut guard) => guard.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        };
        let Some(handle) = handle else {
            return;
        };

        if self.jobs.send(StoreJob::Stop).is_err() {
            error!("overtime store thread already gone at shutdown");
        }
        if let Err(join_err) = handle.join() {
            error!("overtime store thread panicked: {join_err:?}");
        }
    }
}

/// Opens the file and brings the schema up to date. Foreign keys must be on
/// for `persons` deletes to cascade into `overtime_configs`; WAL is
/// best-effort.
fn open_store(path: &Path) -> Result<Connection> {
    let mut conn = Connection::open(path)
        .with_context(|| format!("failed to open overtime store {}", path.display()))?;

    if let Err(err) = conn.pragma_update(None, "journal_mode", "WAL") {
        error!("overtime store stays in rollback-journal mode: {err}");
    }
    conn.pragma_update(None, "foreign_keys", "ON")
        .context("failed to enable foreign keys")?;
    run_migrations(&mut conn).context("failed to run overtime store migrations")?;

    Ok(conn)
}

fn serve(mut conn: Connection, jobs: mpsc::Receiver<StoreJob>) {
    while let Ok(StoreJob::Run(job)) = jobs.recv() {
        job(&mut conn);
    }
    info!("overtime store thread stopped");
}

/// Local overtime store: persons plus overtime configurations in one
/// SQLite file.
///
/// A single thread owns the connection. Repository methods
/// (`list_overtime_records`, `insert_overtime_record`, ...) ship closures to
/// it through [`Database::execute`] and await the answer, so the desk can
/// call the store from any tokio task without blocking the runtime.
/// Clones share the thread; it stops when the last clone drops.
#[derive(Clone)]
pub struct Database {
    worker: Arc<StoreWorker>,
}

impl Database {
    pub fn new(path: PathBuf) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }

        let (jobs_tx, jobs_rx) = mpsc::channel();
        let (ready_tx, ready_rx) = mpsc::channel::<Result<()>>();
        let thread_path = path.clone();

        let thread = thread::Builder::new()
            .name("overtime-desk-db".into())
            .spawn(move || match open_store(&thread_path) {
                Ok(conn) => {
                    if ready_tx.send(Ok(())).is_ok() {
                        serve(conn, jobs_rx);
                    }
                }
                Err(err) => {
                    let _ = ready_tx.send(Err(err));
                }
            })
            .context("failed to spawn overtime store thread")?;

        ready_rx
            .recv()
            .context("overtime store thread exited during startup")??;
        info!("overtime store ready at {}", path.display());

        Ok(Self {
            worker: Arc::new(StoreWorker {
                jobs: jobs_tx,
                thread: Mutex::new(Some(thread)),
            }),
        })
    }

    /// Runs `task` on the store thread and returns its result.
    pub async fn execute<F, T>(&self, task: F) -> Result<T>
    where
        F: FnOnce(&mut Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let (reply_tx, reply_rx) = oneshot::channel();
        let job: Job = Box::new(move |conn| {
            // The caller may have given up (timeout, dropped future).
            let _ = reply_tx.send(task(conn));
        });

        self.worker
            .jobs
            .send(StoreJob::Run(job))
            .map_err(|_| anyhow!("overtime store thread is not running"))?;

        reply_rx
            .await
            .map_err(|_| anyhow!("overtime store thread dropped the request"))?
    }
}
