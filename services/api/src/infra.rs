use chrono::NaiveDate;
use metrics_exporter_prometheus::PrometheusHandle;
use std::collections::HashMap;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};
use training_compliance::courses::{
    Course, CourseId, CourseRepository, Notification, NotificationError, NotificationSink,
    RepositoryError, RosterStore, User, UserId,
};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

#[derive(Default, Clone)]
pub(crate) struct InMemoryCourseRepository {
    records: Arc<Mutex<HashMap<CourseId, Course>>>,
}

impl CourseRepository for InMemoryCourseRepository {
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
pub(crate) struct InMemoryRosterStore {
    users: Arc<Mutex<Vec<User>>>,
}

impl RosterStore for InMemoryRosterStore {
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
        Ok(self.users.lock().expect("roster mutex poisoned").clone())
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
pub(crate) struct InMemoryNotificationSink {
    inboxes: Arc<Mutex<HashMap<UserId, Vec<Notification>>>>,
}

impl NotificationSink for InMemoryNotificationSink {
    fn notify(&self, user_id: &UserId, notification: Notification) -> Result<(), NotificationError> {
        let mut guard = self.inboxes.lock().expect("inbox mutex poisoned");
        guard.entry(user_id.clone()).or_default().push(notification);
        Ok(())
    }

    fn inbox(&self, user_id: &UserId) -> Result<Vec<Notification>, NotificationError> {
        let guard = self.inboxes.lock().expect("inbox mutex poisoned");
        Ok(guard.get(user_id).cloned().unwrap_or_default())
    }

    fn mark_all_read(&self, user_id: &UserId) -> Result<(), NotificationError> {
        let mut guard = self.inboxes.lock().expect("inbox mutex poisoned");
        if let Some(inbox) = guard.get_mut(user_id) {
            for notification in inbox.iter_mut() {
                notification.is_read = true;
            }
        }
        Ok(())
    }
}

pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}
