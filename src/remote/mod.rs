//! The remote record store the desk synchronizes against.
//!
//! Every call may fail independently. Timeouts and retries are the
//! implementation's business; the desk never retries.

use std::future::Future;

use anyhow::Result;

use crate::db::{Database, OvertimeRecord, OvertimeWrite, Person};

pub trait OvertimeStore: Send + Sync + 'static {
    fn fetch_overtime_records(&self) -> impl Future<Output = Result<Vec<OvertimeRecord>>> + Send;

    fn fetch_persons(&self) -> impl Future<Output = Result<Vec<Person>>> + Send;

    fn create_overtime_record(
        &self,
        write: OvertimeWrite,
    ) -> impl Future<Output = Result<OvertimeRecord>> + Send;

    fn update_overtime_record(
        &self,
        record_id: i64,
        write: OvertimeWrite,
    ) -> impl Future<Output = Result<OvertimeRecord>> + Send;

    fn delete_overtime_record(&self, record_id: i64) -> impl Future<Output = Result<()>> + Send;
}

impl OvertimeStore for Database {
    async fn fetch_overtime_records(&self) -> Result<Vec<OvertimeRecord>> {
        self.list_overtime_records().await
    }

    async fn fetch_persons(&self) -> Result<Vec<Person>> {
        self.get_persons().await
    }

    async fn create_overtime_record(&self, write: OvertimeWrite) -> Result<OvertimeRecord> {
        self.insert_overtime_record(write).await
    }

    async fn update_overtime_record(
        &self,
        record_id: i64,
        write: OvertimeWrite,
    ) -> Result<OvertimeRecord> {
        self.replace_overtime_record(record_id, write).await
    }

    async fn delete_overtime_record(&self, record_id: i64) -> Result<()> {
        self.remove_overtime_record(record_id).await
    }
}
