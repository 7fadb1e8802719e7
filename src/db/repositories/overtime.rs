use anyhow::{anyhow, Context, Result};
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::db::{
    connection::Database,
    helpers::{decimal_column, parse_datetime},
    models::{EmbeddedPerson, OvertimeRecord, OvertimeWrite},
};

const SELECT_RECORDS: &str = "
    SELECT o.id, o.employee_id, o.rate, o.min_duration_minutes,
           o.max_duration_hours_per_day, o.status, o.updated_at,
           p.name, p.code, p.department, p.designation
    FROM overtime_configs o
    LEFT JOIN persons p ON p.id = o.employee_id";

fn row_to_record(row: &Row) -> Result<OvertimeRecord> {
    let updated_at: String = row.get("updated_at")?;
    let name: Option<String> = row.get("name")?;

    // A missing join leaves the embedding out entirely, like the API does
    // for dangling employee ids.
    let employee_details = match name {
        Some(name) => Some(EmbeddedPerson {
            name: Some(name),
            code: row.get("code")?,
            department: row.get("department")?,
            designation: row.get("designation")?,
        }),
        None => None,
    };

    Ok(OvertimeRecord {
        id: row.get("id")?,
        employee: row.get("employee_id")?,
        rate: row.get("rate")?,
        min_duration_minutes: row.get("min_duration_minutes")?,
        max_duration_hours_per_day: row.get("max_duration_hours_per_day")?,
        status: row.get("status")?,
        employee_details,
        updated_at: Some(parse_datetime(&updated_at, "updated_at")?),
    })
}

fn fetch_record(conn: &Connection, record_id: i64) -> Result<Option<OvertimeRecord>> {
    let mut stmt = conn.prepare(&format!("{SELECT_RECORDS} WHERE o.id = ?1"))?;
    let mut rows = stmt.query(params![record_id])?;
    match rows.next()? {
        Some(row) => Ok(Some(row_to_record(row)?)),
        None => Ok(None),
    }
}

struct WriteColumns {
    rate: String,
    min_duration_minutes: String,
    max_duration_hours_per_day: String,
}

fn write_columns(write: &OvertimeWrite) -> Result<WriteColumns> {
    Ok(WriteColumns {
        rate: decimal_column(write.rate, "rate")?,
        min_duration_minutes: decimal_column(write.min_duration_minutes, "min_duration_minutes")?,
        max_duration_hours_per_day: decimal_column(
            write.max_duration_hours_per_day,
            "max_duration_hours_per_day",
        )?,
    })
}

impl Database {
    /// All overtime configurations in insertion order, with person fields
    /// embedded when the employee exists.
    pub async fn list_overtime_records(&self) -> Result<Vec<OvertimeRecord>> {
        self.execute(|conn| {
            let mut stmt = conn.prepare(&format!("{SELECT_RECORDS} ORDER BY o.id ASC"))?;
            let mut rows = stmt.query([])?;
            let mut records = Vec::new();
            while let Some(row) = rows.next()? {
                records.push(row_to_record(row)?);
            }
            Ok(records)
        })
        .await
    }

    pub async fn insert_overtime_record(&self, write: OvertimeWrite) -> Result<OvertimeRecord> {
        let columns = write_columns(&write)?;
        self.execute(move |conn| {
            let now = Utc::now().to_rfc3339();

            let person_exists = conn
                .query_row(
                    "SELECT id FROM persons WHERE id = ?1",
                    params![write.employee],
                    |row| row.get::<_, i64>(0),
                )
                .optional()?
                .is_some();
            if !person_exists {
                return Err(anyhow!("employee {} does not exist", write.employee));
            }

            conn.execute(
                "INSERT INTO overtime_configs
                     (employee_id, rate, min_duration_minutes, max_duration_hours_per_day,
                      status, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    write.employee,
                    columns.rate,
                    columns.min_duration_minutes,
                    columns.max_duration_hours_per_day,
                    write.status.as_str(),
                    now,
                    now,
                ],
            )
            .with_context(|| "failed to insert overtime configuration")?;

            let record_id = conn.last_insert_rowid();
            fetch_record(conn, record_id)?
                .ok_or_else(|| anyhow!("overtime configuration {record_id} missing after insert"))
        })
        .await
    }

    pub async fn replace_overtime_record(
        &self,
        record_id: i64,
        write: OvertimeWrite,
    ) -> Result<OvertimeRecord> {
        let columns = write_columns(&write)?;
        self.execute(move |conn| {
            let rows_affected = conn
                .execute(
                    "UPDATE overtime_configs
                     SET employee_id = ?1,
                         rate = ?2,
                         min_duration_minutes = ?3,
                         max_duration_hours_per_day = ?4,
                         status = ?5,
                         updated_at = ?6
                     WHERE id = ?7",
                    params![
                        write.employee,
                        columns.rate,
                        columns.min_duration_minutes,
                        columns.max_duration_hours_per_day,
                        write.status.as_str(),
                        Utc::now().to_rfc3339(),
                        record_id,
                    ],
                )
                .with_context(|| format!("failed to update overtime configuration {record_id}"))?;

            if rows_affected == 0 {
                return Err(anyhow!("overtime configuration {record_id} not found"));
            }

            fetch_record(conn, record_id)?
                .ok_or_else(|| anyhow!("overtime configuration {record_id} missing after update"))
        })
        .await
    }

    pub async fn remove_overtime_record(&self, record_id: i64) -> Result<()> {
        self.execute(move |conn| {
            let rows_affected = conn.execute(
                "DELETE FROM overtime_configs WHERE id = ?1",
                params![record_id],
            )?;

            if rows_affected == 0 {
                return Err(anyhow!("overtime configuration {record_id} not found"));
            }
            Ok(())
        })
        .await
    }
}
