use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use tracing::info;

use super::domain::{
    Company, Completion, Course, CourseAudience, CourseDraft, CourseException, CourseId,
    Notification, NotificationKind, Signature, User, UserId,
};
use super::engine;
use super::repository::{
    CourseRepository, NotificationError, NotificationSink, RepositoryError, RosterStore,
};

/// Service composing the course store, roster provider, and notification
/// sink. Every mutation rule lives here; the engine stays read-only.
pub struct TrainingService<C, S, N> {
    courses: Arc<C>,
    roster: Arc<S>,
    notifications: Arc<N>,
}

static COURSE_SEQUENCE: AtomicU64 = AtomicU64::new(1);
static NOTIFICATION_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_course_id() -> CourseId {
    let id = COURSE_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    CourseId(format!("course-{id:06}"))
}

fn next_notification_id() -> String {
    let id = NOTIFICATION_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    format!("note-{id:06}")
}

impl<C, S, N> TrainingService<C, S, N>
where
    C: CourseRepository + 'static,
    S: RosterStore + 'static,
    N: NotificationSink + 'static,
{
    pub fn new(courses: Arc<C>, roster: Arc<S>, notifications: Arc<N>) -> Self {
        Self {
            courses,
            roster,
            notifications,
        }
    }

    /// Create a course: assign an id, resolve the audience once from the
    /// current roster snapshot, and notify every initially-assigned user.
    pub fn create_course(&self, draft: CourseDraft) -> Result<Course, ServiceError> {
        if draft.start > draft.end {
            return Err(ServiceError::InvalidWindow {
                start: draft.start,
                end: draft.end,
            });
        }

        let assigned_user_ids = match draft.audience {
            CourseAudience::Selected => {
                let mut unique: Vec<UserId> = Vec::new();
                for user_id in &draft.selected_user_ids {
                    if self.roster.fetch(user_id)?.is_none() {
                        return Err(ServiceError::UnknownUser(user_id.clone()));
                    }
                    if !unique.contains(user_id) {
                        unique.push(user_id.clone());
                    }
                }
                unique
            }
            CourseAudience::Staff => {
                engine::company_members(&self.roster.list()?, Company::Staff)
                    .into_iter()
                    .collect()
            }
            CourseAudience::Vendor => {
                engine::company_members(&self.roster.list()?, Company::Vendor)
                    .into_iter()
                    .collect()
            }
        };

        let course = Course {
            id: next_course_id(),
            name: draft.name,
            start: draft.start,
            end: draft.end,
            content: draft.content,
            audience: draft.audience,
            assigned_user_ids,
            is_active: draft.is_active,
            completions: Vec::new(),
            exceptions: Vec::new(),
        };

        let stored = self.courses.insert(course)?;

        let message = format!(
            "New training course \"{}\" assigned, due {}",
            stored.name, stored.end
        );
        for user_id in &stored.assigned_user_ids {
            self.push_notification(user_id, &message, NotificationKind::NewCourse)?;
        }

        info!(
            course_id = %stored.id.as_str(),
            assigned = stored.assigned_user_ids.len(),
            "course created"
        );
        Ok(stored)
    }

    /// Record a sign-off. Idempotent per user: a repeated signature leaves
    /// the completions list unchanged. Signing clears any exception held by
    /// the user, keeping completions and exceptions disjoint.
    pub fn sign_course(
        &self,
        course_id: &CourseId,
        user_id: &UserId,
        signature: Signature,
        timestamp: DateTime<Utc>,
    ) -> Result<Course, ServiceError> {
        let mut course = self.fetch_course(course_id)?;
        if course.has_completion(user_id) {
            return Ok(course);
        }

        course
            .exceptions
            .retain(|exception| &exception.user_id != user_id);
        course.completions.push(Completion {
            user_id: user_id.clone(),
            timestamp,
            signature,
        });

        self.courses.update(course.clone())?;
        Ok(course)
    }

    /// Replace-or-insert an exception. Requests for users who already signed
    /// are ignored, never applied: a completed user is not demoted back to
    /// excepted.
    pub fn add_exception(
        &self,
        course_id: &CourseId,
        user_id: &UserId,
        reason: String,
    ) -> Result<Course, ServiceError> {
        let mut course = self.fetch_course(course_id)?;
        if course.has_completion(user_id) {
            return Ok(course);
        }

        match course
            .exceptions
            .iter_mut()
            .find(|exception| &exception.user_id == user_id)
        {
            Some(existing) => existing.reason = reason,
            None => course.exceptions.push(CourseException {
                user_id: user_id.clone(),
                reason,
            }),
        }

        self.courses.update(course.clone())?;
        Ok(course)
    }

    pub fn remove_exception(
        &self,
        course_id: &CourseId,
        user_id: &UserId,
    ) -> Result<Course, ServiceError> {
        let mut course = self.fetch_course(course_id)?;
        course
            .exceptions
            .retain(|exception| &exception.user_id != user_id);
        self.courses.update(course.clone())?;
        Ok(course)
    }

    pub fn set_active(&self, course_id: &CourseId, is_active: bool) -> Result<Course, ServiceError> {
        let mut course = self.fetch_course(course_id)?;
        course.is_active = is_active;
        self.courses.update(course.clone())?;
        Ok(course)
    }

    /// Irreversible: discards all collected signatures and exceptions.
    /// Callers confirm destructive intent before invoking this.
    pub fn delete_course(&self, course_id: &CourseId) -> Result<(), ServiceError> {
        self.fetch_course(course_id)?;
        self.courses.delete(course_id)?;
        info!(course_id = %course_id.as_str(), "course deleted");
        Ok(())
    }

    /// Notify every currently-pending user of the course. Returns how many
    /// reminders went out.
    pub fn send_reminders(
        &self,
        course_id: &CourseId,
        today: NaiveDate,
    ) -> Result<usize, ServiceError> {
        let course = self.fetch_course(course_id)?;
        let roster = self.roster.list()?;
        let pending = engine::pending_users(&course, &roster);

        let message = format!(
            "Reminder: training course \"{}\" is awaiting your signature (due {})",
            course.name, course.end
        );
        for user_id in &pending {
            self.push_notification(user_id, &message, NotificationKind::Reminder)?;
        }

        info!(
            course_id = %course_id.as_str(),
            reminded = pending.len(),
            status = engine::status(&course, &roster, today).label(),
            "reminders dispatched"
        );
        Ok(pending.len())
    }

    pub fn register_user(&self, user: User) -> Result<(), ServiceError> {
        self.roster.insert(user)?;
        Ok(())
    }

    /// Bulk roster registration. Users whose id is already registered are
    /// skipped; returns how many were added.
    pub fn import_roster(&self, users: Vec<User>) -> Result<usize, ServiceError> {
        let mut added = 0;
        for user in users {
            match self.roster.insert(user) {
                Ok(()) => added += 1,
                Err(RepositoryError::Conflict) => {}
                Err(other) => return Err(other.into()),
            }
        }
        Ok(added)
    }

    pub fn remove_user(&self, user_id: &UserId) -> Result<(), ServiceError> {
        self.roster.remove(user_id)?;
        Ok(())
    }

    pub fn course(&self, course_id: &CourseId) -> Result<Course, ServiceError> {
        self.fetch_course(course_id)
    }

    pub fn courses(&self) -> Result<Vec<Course>, ServiceError> {
        Ok(self.courses.list()?)
    }

    pub fn roster(&self) -> Result<Vec<User>, ServiceError> {
        Ok(self.roster.list()?)
    }

    pub fn user(&self, user_id: &UserId) -> Result<User, ServiceError> {
        self.roster
            .fetch(user_id)?
            .ok_or_else(|| ServiceError::UnknownUser(user_id.clone()))
    }

    pub fn inbox(&self, user_id: &UserId) -> Result<Vec<Notification>, ServiceError> {
        Ok(self.notifications.inbox(user_id)?)
    }

    pub fn mark_inbox_read(&self, user_id: &UserId) -> Result<(), ServiceError> {
        Ok(self.notifications.mark_all_read(user_id)?)
    }

    fn fetch_course(&self, course_id: &CourseId) -> Result<Course, ServiceError> {
        self.courses
            .fetch(course_id)?
            .ok_or_else(|| ServiceError::CourseNotFound(course_id.clone()))
    }

    fn push_notification(
        &self,
        user_id: &UserId,
        message: &str,
        kind: NotificationKind,
    ) -> Result<(), ServiceError> {
        self.notifications.notify(
            user_id,
            Notification {
                id: next_notification_id(),
                message: message.to_string(),
                timestamp: Utc::now(),
                is_read: false,
                kind,
            },
        )?;
        Ok(())
    }
}

/// Error raised by the training service.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("course window starts {start} after it ends {end}")]
    InvalidWindow { start: NaiveDate, end: NaiveDate },
    #[error("user {} is not registered", .0.as_str())]
    UnknownUser(UserId),
    #[error("course {} not found", .0.as_str())]
    CourseNotFound(CourseId),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error(transparent)]
    Notification(#[from] NotificationError),
}
