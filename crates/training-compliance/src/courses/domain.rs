use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Employee identifier as assigned by HR. Staff badges carry 8 digits,
/// vendor personnel carry longer ids.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UserId(pub String);

impl UserId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for UserId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Generated course identifier, immutable once assigned.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CourseId(pub String);

impl CourseId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    Admin,
    Standard,
}

/// The two employment categories courses can address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Company {
    Staff,
    Vendor,
}

impl Company {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Staff => "Staff",
            Self::Vendor => "Vendor",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub name: String,
    /// Organizational sub-unit, e.g. "QA 1P".
    pub part: String,
    /// Team for staff, vendor-company name for vendor personnel.
    pub group: String,
    pub role: UserRole,
    pub company: Company,
}

/// Audience selector resolved once at course creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CourseAudience {
    Staff,
    Vendor,
    /// Explicit roster list imported by the admin; `assigned_user_ids`
    /// holds the materialized membership.
    Selected,
}

impl CourseAudience {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Staff => "Staff",
            Self::Vendor => "Vendor",
            Self::Selected => "Selected",
        }
    }
}

/// Opaque captured-signature payload (base64 image data in practice).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signature(pub String);

/// A recorded sign-off. Immutable once created; at most one per user per course.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Completion {
    pub user_id: UserId,
    pub timestamp: DateTime<Utc>,
    pub signature: Signature,
}

/// Declared, permanent exclusion of one user from one course's accounting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CourseException {
    pub user_id: UserId,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Course {
    pub id: CourseId,
    pub name: String,
    /// First day of the signing window, inclusive.
    pub start: NaiveDate,
    /// Last day of the signing window, inclusive.
    pub end: NaiveDate,
    /// Free text shown to the signer.
    pub content: String,
    pub audience: CourseAudience,
    /// Membership snapshot taken at creation time; no duplicates.
    pub assigned_user_ids: Vec<UserId>,
    /// Gate on whether signing is currently permitted.
    pub is_active: bool,
    pub completions: Vec<Completion>,
    pub exceptions: Vec<CourseException>,
}

impl Course {
    pub fn has_completion(&self, user_id: &UserId) -> bool {
        self.completions
            .iter()
            .any(|completion| &completion.user_id == user_id)
    }

    pub fn has_exception(&self, user_id: &UserId) -> bool {
        self.exceptions
            .iter()
            .any(|exception| &exception.user_id == user_id)
    }
}

/// Payload accepted by course creation, before the id is assigned and the
/// audience snapshot is taken.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CourseDraft {
    pub name: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub content: String,
    pub audience: CourseAudience,
    /// Explicit membership for `CourseAudience::Selected`; ignored otherwise.
    #[serde(default)]
    pub selected_user_ids: Vec<UserId>,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

const fn default_active() -> bool {
    true
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CourseStatus {
    /// Window not yet open.
    Plan,
    /// Within the window, people still outstanding.
    Opening,
    /// Window lapsed with people still outstanding.
    Pending,
    /// Every member of the effective audience has signed.
    Finished,
}

impl CourseStatus {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Plan => "Plan",
            Self::Opening => "Opening",
            Self::Pending => "Pending",
            Self::Finished => "Finished",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    NewCourse,
    Reminder,
}

impl NotificationKind {
    pub const fn label(self) -> &'static str {
        match self {
            Self::NewCourse => "New course assigned",
            Self::Reminder => "Reminder",
        }
    }
}

/// Inbox entry attached to a user. Append-only apart from the bulk
/// mark-all-read mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub id: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    pub is_read: bool,
    pub kind: NotificationKind,
}

/// Organizational parts in their fixed display order. Grouped pending counts
/// use this order to break ties so repeated renders stay stable.
pub const KNOWN_PARTS: [&str; 6] = [
    "QA G",
    "QA 1P",
    "QA 2P",
    "QA 3P",
    "Process Support T/F",
    "Other",
];
