use anyhow::{bail, Result};
use rusqlite::{params, Row};

use crate::db::{connection::Database, models::Person};

fn row_to_person(row: &Row) -> Result<Person, rusqlite::Error> {
    Ok(Person {
        id: row.get("id")?,
        name: row.get("name")?,
        code: row.get("code")?,
        department: row.get("department")?,
        designation: row.get("designation")?,
    })
}

impl Database {
    /// All persons, ordered by id.
    pub async fn get_persons(&self) -> Result<Vec<Person>> {
        self.execute(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, name, code, department, designation
                 FROM persons
                 ORDER BY id ASC",
            )?;

            let persons = stmt
                .query_map([], row_to_person)?
                .collect::<Result<Vec<_>, _>>()?;

            Ok(persons)
        })
        .await
    }

    /// Insert a person or refresh the directory fields of an existing id.
    pub async fn upsert_person(&self, person: Person) -> Result<Person> {
        if person.code.trim().is_empty() {
            bail!("person code is required");
        }

        self.execute(move |conn| {
            conn.execute(
                "INSERT INTO persons (id, name, code, department, designation)
                 VALUES (?1, ?2, ?3, ?4, ?5)
                 ON CONFLICT(id) DO UPDATE SET
                     name = excluded.name,
                     code = excluded.code,
                     department = excluded.department,
                     designation = excluded.designation",
                params![
                    person.id,
                    person.name,
                    person.code,
                    person.department,
                    person.designation,
                ],
            )?;
            Ok(person)
        })
        .await
    }
}
