use super::domain::{Course, CourseId, Notification, User, UserId};

/// Course-store abstraction so the service and engine can be exercised
/// against any backing technology. Implementations must treat each record
/// as a whole-document write; the service owns all mutation rules.
pub trait CourseRepository: Send + Sync {
    fn insert(&self, course: Course) -> Result<Course, RepositoryError>;
    fn update(&self, course: Course) -> Result<(), RepositoryError>;
    fn fetch(&self, id: &CourseId) -> Result<Option<Course>, RepositoryError>;
    fn list(&self) -> Result<Vec<Course>, RepositoryError>;
    /// Irreversible; discards every completion and exception on the course.
    fn delete(&self, id: &CourseId) -> Result<(), RepositoryError>;
}

/// Roster provider. Supplies the current user snapshot and accepts
/// registration/removal; user records are otherwise immutable.
pub trait RosterStore: Send + Sync {
    fn insert(&self, user: User) -> Result<(), RepositoryError>;
    fn fetch(&self, id: &UserId) -> Result<Option<User>, RepositoryError>;
    fn list(&self) -> Result<Vec<User>, RepositoryError>;
    fn remove(&self, id: &UserId) -> Result<(), RepositoryError>;
}

/// Error enumeration for store failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Fire-and-forget inbox hooks. `notify` appends; the inbox is append-only
/// apart from the bulk mark-all-read mutation.
pub trait NotificationSink: Send + Sync {
    fn notify(&self, user_id: &UserId, notification: Notification) -> Result<(), NotificationError>;
    fn inbox(&self, user_id: &UserId) -> Result<Vec<Notification>, NotificationError>;
    fn mark_all_read(&self, user_id: &UserId) -> Result<(), NotificationError>;
}

/// Notification dispatch error.
#[derive(Debug, thiserror::Error)]
pub enum NotificationError {
    #[error("notification transport unavailable: {0}")]
    Transport(String),
}
