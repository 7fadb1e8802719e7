pub mod overtime;
pub mod person;

pub use overtime::{EmbeddedPerson, OvertimeRecord, OvertimeWrite, RecordStatus};
pub use person::Person;
