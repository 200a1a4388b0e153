use chrono::NaiveDate;
use serde::Serialize;

use super::domain::{
    Course, CourseAudience, CourseId, CourseStatus, Notification, NotificationKind, User, UserId,
};
use super::engine::{self, GroupCount, GroupingKey};

/// Admin-facing course card: status, progress, and the pending breakdown.
/// Thin formatting over engine output; no math is re-derived here.
#[derive(Debug, Clone, Serialize)]
pub struct CourseOverview {
    pub id: CourseId,
    pub name: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub audience: CourseAudience,
    pub audience_label: &'static str,
    pub is_active: bool,
    pub status: CourseStatus,
    pub status_label: &'static str,
    pub progress_percent: u8,
    pub pending_count: usize,
    pub grouped_pending: Vec<GroupCount>,
}

impl CourseOverview {
    pub fn build(course: &Course, roster: &[User], today: NaiveDate) -> Self {
        let status = engine::status(course, roster, today);
        // Vendor audiences break down by vendor company, everything else by
        // organizational part. Staff breakdowns keep cleared parts visible.
        let (key, include_empty) = match course.audience {
            CourseAudience::Vendor => (GroupingKey::Group, false),
            CourseAudience::Staff | CourseAudience::Selected => (GroupingKey::Part, true),
        };

        Self {
            id: course.id.clone(),
            name: course.name.clone(),
            start: course.start,
            end: course.end,
            audience: course.audience,
            audience_label: course.audience.label(),
            is_active: course.is_active,
            status,
            status_label: status.label(),
            progress_percent: engine::progress_percent(course, roster),
            pending_count: engine::pending_users(course, roster).len(),
            grouped_pending: engine::grouped_pending_counts(course, roster, key, include_empty),
        }
    }
}

/// Single-course drill-down with the outstanding user ids spelled out.
#[derive(Debug, Clone, Serialize)]
pub struct CourseDetail {
    #[serde(flatten)]
    pub overview: CourseOverview,
    pub content: String,
    pub assigned_count: usize,
    pub pending_user_ids: Vec<UserId>,
    pub excepted_user_ids: Vec<UserId>,
    pub completion_count: usize,
}

impl CourseDetail {
    pub fn build(course: &Course, roster: &[User], today: NaiveDate) -> Self {
        Self {
            overview: CourseOverview::build(course, roster, today),
            content: course.content.clone(),
            assigned_count: engine::resolve_audience(course, roster).len(),
            pending_user_ids: engine::pending_users(course, roster).into_iter().collect(),
            excepted_user_ids: course
                .exceptions
                .iter()
                .map(|exception| exception.user_id.clone())
                .collect(),
            completion_count: course.completions.len(),
        }
    }
}

/// Entry in the employee's actionable list.
#[derive(Debug, Clone, Serialize)]
pub struct PendingCourseEntry {
    pub id: CourseId,
    pub name: String,
    pub content: String,
    pub end: NaiveDate,
    pub overdue: bool,
}

impl PendingCourseEntry {
    pub fn build(course: &Course, today: NaiveDate) -> Self {
        Self {
            id: course.id.clone(),
            name: course.name.clone(),
            content: course.content.clone(),
            end: course.end,
            overdue: today > course.end,
        }
    }
}

/// The courses `user` must act on today, soonest deadline first.
pub fn pending_courses_for(
    courses: &[Course],
    user: &User,
    roster: &[User],
    today: NaiveDate,
) -> Vec<PendingCourseEntry> {
    let mut entries: Vec<PendingCourseEntry> = courses
        .iter()
        .filter(|course| engine::is_eligible_today(course, user, roster, today))
        .map(|course| PendingCourseEntry::build(course, today))
        .collect();
    entries.sort_by(|a, b| a.end.cmp(&b.end).then_with(|| a.id.cmp(&b.id)));
    entries
}

#[derive(Debug, Clone, Serialize)]
pub struct NotificationView {
    pub id: String,
    pub message: String,
    pub timestamp: String,
    pub is_read: bool,
    pub kind: NotificationKind,
    pub kind_label: &'static str,
}

impl NotificationView {
    pub fn build(notification: &Notification) -> Self {
        Self {
            id: notification.id.clone(),
            message: notification.message.clone(),
            timestamp: notification.timestamp.to_rfc3339(),
            is_read: notification.is_read,
            kind: notification.kind,
            kind_label: notification.kind.label(),
        }
    }
}
