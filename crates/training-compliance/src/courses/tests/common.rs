use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::{NaiveDate, TimeZone, Utc};

use crate::courses::domain::{
    Company, Completion, Course, CourseAudience, CourseDraft, CourseException, CourseId,
    Notification, Signature, User, UserId, UserRole,
};
use crate::courses::repository::{
    CourseRepository, NotificationError, NotificationSink, RepositoryError, RosterStore,
};
use crate::courses::service::TrainingService;

pub(super) fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).expect("valid date")
}

pub(super) fn staff_user(id: &str, name: &str, part: &str) -> User {
    User {
        id: UserId(id.to_string()),
        name: name.to_string(),
        part: part.to_string(),
        group: "QA".to_string(),
        role: UserRole::Standard,
        company: Company::Staff,
    }
}

pub(super) fn vendor_user(id: &str, name: &str, group: &str) -> User {
    User {
        id: UserId(id.to_string()),
        name: name.to_string(),
        part: "N/A".to_string(),
        group: group.to_string(),
        role: UserRole::Standard,
        company: Company::Vendor,
    }
}

pub(super) fn admin_user(id: &str) -> User {
    User {
        id: UserId(id.to_string()),
        name: "Site Admin".to_string(),
        part: "QA G".to_string(),
        group: "ADMIN".to_string(),
        role: UserRole::Admin,
        company: Company::Staff,
    }
}

pub(super) fn completion(user_id: &str, year: i32, month: u32, day: u32) -> Completion {
    Completion {
        user_id: UserId(user_id.to_string()),
        timestamp: Utc
            .with_ymd_and_hms(year, month, day, 9, 30, 0)
            .single()
            .expect("valid timestamp"),
        signature: Signature(format!("sig-{user_id}")),
    }
}

pub(super) fn exception(user_id: &str, reason: &str) -> CourseException {
    CourseException {
        user_id: UserId(user_id.to_string()),
        reason: reason.to_string(),
    }
}

pub(super) fn staff_course(id: &str, start: NaiveDate, end: NaiveDate) -> Course {
    Course {
        id: CourseId(id.to_string()),
        name: "Quarterly Safety Refresher".to_string(),
        start,
        end,
        content: "Review the updated line-safety checklist.".to_string(),
        audience: CourseAudience::Staff,
        assigned_user_ids: Vec::new(),
        is_active: true,
        completions: Vec::new(),
        exceptions: Vec::new(),
    }
}

pub(super) fn selected_course(id: &str, start: NaiveDate, end: NaiveDate, ids: &[&str]) -> Course {
    Course {
        assigned_user_ids: ids.iter().map(|raw| UserId(raw.to_string())).collect(),
        audience: CourseAudience::Selected,
        ..staff_course(id, start, end)
    }
}

pub(super) fn draft(start: NaiveDate, end: NaiveDate, audience: CourseAudience) -> CourseDraft {
    CourseDraft {
        name: "ESD Handling Update".to_string(),
        start,
        end,
        content: "Grounding strap usage changed for line 2.".to_string(),
        audience,
        selected_user_ids: Vec::new(),
        is_active: true,
    }
}

pub(super) fn build_service() -> (
    TrainingService<MemoryCourses, MemoryRoster, MemoryInbox>,
    Arc<MemoryCourses>,
    Arc<MemoryRoster>,
    Arc<MemoryInbox>,
) {
    let courses = Arc::new(MemoryCourses::default());
    let roster = Arc::new(MemoryRoster::default());
    let inbox = Arc::new(MemoryInbox::default());
    let service = TrainingService::new(courses.clone(), roster.clone(), inbox.clone());
    (service, courses, roster, inbox)
}

pub(super) fn seeded_service(
    users: &[User],
) -> (
    TrainingService<MemoryCourses, MemoryRoster, MemoryInbox>,
    Arc<MemoryCourses>,
    Arc<MemoryRoster>,
    Arc<MemoryInbox>,
) {
    let (service, courses, roster, inbox) = build_service();
    for user in users {
        roster.insert(user.clone()).expect("seed user");
    }
    (service, courses, roster, inbox)
}

#[derive(Default, Clone)]
pub(super) struct MemoryCourses {
    records: Arc<Mutex<HashMap<CourseId, Course>>>,
}

impl CourseRepository for MemoryCourses {
    fn insert(&self, course: Course) -> Result<Course, RepositoryError> {
        let mut guard = self.records.lock().expect("course mutex poisoned");
        if guard.contains_key(&course.id) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(course.id.clone(), course.clone());
        Ok(course)
    }

    fn update(&self, course: Course) -> Result<(), RepositoryError> {
        let mut guard = self.records.lock().expect("course mutex poisoned");
        if guard.contains_key(&course.id) {
            guard.insert(course.id.clone(), course);
            Ok(())
        } else {
            Err(RepositoryError::NotFound)
        }
    }

    fn fetch(&self, id: &CourseId) -> Result<Option<Course>, RepositoryError> {
        let guard = self.records.lock().expect("course mutex poisoned");
        Ok(guard.get(id).cloned())
    }

    fn list(&self) -> Result<Vec<Course>, RepositoryError> {
        let guard = self.records.lock().expect("course mutex poisoned");
        let mut courses: Vec<Course> = guard.values().cloned().collect();
        courses.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(courses)
    }

    fn delete(&self, id: &CourseId) -> Result<(), RepositoryError> {
        let mut guard = self.records.lock().expect("course mutex poisoned");
        guard.remove(id).map(|_| ()).ok_or(RepositoryError::NotFound)
    }
}

#[derive(Default, Clone)]
pub(super) struct MemoryRoster {
    users: Arc<Mutex<Vec<User>>>,
}

impl RosterStore for MemoryRoster {
    fn insert(&self, user: User) -> Result<(), RepositoryError> {
        let mut guard = self.users.lock().expect("roster mutex poisoned");
        if guard.iter().any(|existing| existing.id == user.id) {
            return Err(RepositoryError::Conflict);
        }
        guard.push(user);
        Ok(())
    }

    fn fetch(&self, id: &UserId) -> Result<Option<User>, RepositoryError> {
        let guard = self.users.lock().expect("roster mutex poisoned");
        Ok(guard.iter().find(|user| &user.id == id).cloned())
    }

    fn list(&self) -> Result<Vec<User>, RepositoryError> {
        let guard = self.users.lock().expect("roster mutex poisoned");
        Ok(guard.clone())
    }

    fn remove(&self, id: &UserId) -> Result<(), RepositoryError> {
        let mut guard = self.users.lock().expect("roster mutex poisoned");
        let before = guard.len();
        guard.retain(|user| &user.id != id);
        if guard.len() == before {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}

#[derive(Default, Clone)]
pub(super) struct MemoryInbox {
    inboxes: Arc<Mutex<HashMap<UserId, Vec<Notification>>>>,
}

impl MemoryInbox {
    pub(super) fn messages_for(&self, user_id: &UserId) -> Vec<Notification> {
        self.inboxes
            .lock()
            .expect("inbox mutex poisoned")
            .get(user_id)
            .cloned()
            .unwrap_or_default()
    }
}

impl NotificationSink for MemoryInbox {
    fn notify(
        &self,
        user_id: &UserId,
        notification: Notification,
    ) -> Result<(), NotificationError> {
        self.inboxes
            .lock()
            .expect("inbox mutex poisoned")
            .entry(user_id.clone())
            .or_default()
            .push(notification);
        Ok(())
    }

    fn inbox(&self, user_id: &UserId) -> Result<Vec<Notification>, NotificationError> {
        Ok(self.messages_for(user_id))
    }

    fn mark_all_read(&self, user_id: &UserId) -> Result<(), NotificationError> {
        if let Some(inbox) = self
            .inboxes
            .lock()
            .expect("inbox mutex poisoned")
            .get_mut(user_id)
        {
            for notification in inbox.iter_mut() {
                notification.is_read = true;
            }
        }
        Ok(())
    }
}

/// Store double that refuses every write, for failure-path routing tests.
pub(super) struct UnavailableCourses;

impl CourseRepository for UnavailableCourses {
    fn insert(&self, _course: Course) -> Result<Course, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn update(&self, _course: Course) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn fetch(&self, _id: &CourseId) -> Result<Option<Course>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn list(&self) -> Result<Vec<Course>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn delete(&self, _id: &CourseId) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }
}
