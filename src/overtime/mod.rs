pub mod coordinator;
pub mod desk;
pub mod edit;
pub mod eligibility;
pub mod error;
pub mod normalizer;
pub mod notify;
pub mod row;
pub mod snapshot;
pub mod sync;

pub use coordinator::{validate_create, CreateOvertimeInput};
pub use desk::{DeskOptions, DeskView, OvertimeDesk};
pub use edit::{DraftField, EditSession, EditState};
pub use eligibility::eligible_persons;
pub use error::{DeskError, FieldErrors};
pub use normalizer::{normalize_all, normalize_record, PLACEHOLDER};
pub use notify::{LogNotifier, Notice, NoticeLevel, Notifier};
pub use row::{DisplayRow, DisplayStatus, OvertimeFields};
pub use snapshot::{RemoteSnapshot, SnapshotHub};
pub use sync::{PendingWrite, ViewSynchronizer};
