use std::collections::HashSet;

use crate::db::Person;

use super::row::DisplayRow;

/// Persons with no overtime configuration in `rows`, in directory order.
/// Feeds the "add configuration" picker.
pub fn eligible_persons(persons: &[Person], rows: &[DisplayRow]) -> Vec<Person> {
    let configured: HashSet<i64> = rows.iter().map(|row| row.person_id).collect();
    persons
        .iter()
        .filter(|person| !configured.contains(&person.id))
        .cloned()
        .collect()
}
