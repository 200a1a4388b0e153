//! Training-course tracking: domain records, the eligibility & status
//! engine, roster import, store contracts, and the mutation service.
//!
//! The engine in [`engine`] is the single source of truth for audience
//! membership, pending/completed partitioning, status classification, and
//! progress math; everything else consumes its answers.

pub mod domain;
pub mod engine;
pub mod import;
pub mod repository;
pub mod router;
pub mod service;
pub mod views;

#[cfg(test)]
mod tests;

pub use domain::{
    Company, Completion, Course, CourseAudience, CourseDraft, CourseException, CourseId,
    CourseStatus, Notification, NotificationKind, Signature, User, UserId, UserRole, KNOWN_PARTS,
};
pub use engine::{GroupCount, GroupingKey};
pub use import::{company_for_id, parse_roster, RosterImport, RosterImportError};
pub use repository::{
    CourseRepository, NotificationError, NotificationSink, RepositoryError, RosterStore,
};
pub use router::course_router;
pub use service::{ServiceError, TrainingService};
pub use views::{CourseDetail, CourseOverview, NotificationView, PendingCourseEntry};
