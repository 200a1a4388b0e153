//! Eligibility & status engine.
//!
//! Pure functions over `(Course, roster, today)`. The engine owns the one
//! policy worth getting right in this system: who must act, what state a
//! course is in, and how far along it is. All callers format these answers;
//! none re-derive them.
//!
//! Date policy: every comparison here is calendar-day against calendar-day
//! (`NaiveDate`). Completion timestamps never take part in window math.
//! `today` is always an explicit parameter so any date can be replayed.

use std::collections::BTreeSet;

use chrono::NaiveDate;

use super::domain::{
    Company, Course, CourseAudience, CourseStatus, User, UserId, UserRole, KNOWN_PARTS,
};

/// The roster attribute grouped pending counts partition by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupingKey {
    /// Organizational part, used for staff audiences.
    Part,
    /// Team / vendor-company name, used for vendor audiences.
    Group,
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct GroupCount {
    pub label: String,
    pub count: usize,
}

/// The users a course applies to.
///
/// A `Selected` audience is returned exactly as materialized at creation
/// time; company audiences are the standard-role subset of the roster with
/// the matching company. Admins are never training audience.
pub fn resolve_audience(course: &Course, roster: &[User]) -> BTreeSet<UserId> {
    match course.audience {
        CourseAudience::Selected => course.assigned_user_ids.iter().cloned().collect(),
        CourseAudience::Staff => company_members(roster, Company::Staff),
        CourseAudience::Vendor => company_members(roster, Company::Vendor),
    }
}

/// Standard-role roster subset for one employment category; the membership
/// snapshot course creation materializes for company audiences.
pub(crate) fn company_members(roster: &[User], company: Company) -> BTreeSet<UserId> {
    roster
        .iter()
        .filter(|user| user.company == company && user.role == UserRole::Standard)
        .map(|user| user.id.clone())
        .collect()
}

/// Audience minus declared exceptions: the denominator for all completion
/// math. A user holding both a completion and an exception stays counted;
/// completion takes precedence over contradictory data the store let through.
pub fn effective_audience(course: &Course, roster: &[User]) -> BTreeSet<UserId> {
    let mut audience = resolve_audience(course, roster);
    for exception in &course.exceptions {
        if !course.has_completion(&exception.user_id) {
            audience.remove(&exception.user_id);
        }
    }
    audience
}

/// Effective audience members without a completion yet.
pub fn pending_users(course: &Course, roster: &[User]) -> BTreeSet<UserId> {
    let mut pending = effective_audience(course, roster);
    for completion in &course.completions {
        pending.remove(&completion.user_id);
    }
    pending
}

/// Completion rate in whole percent, 0..=100.
///
/// An empty effective audience reports 0, never a division error and never a
/// spurious 100. Completions from users outside the effective audience do not
/// count toward the numerator.
pub fn progress_percent(course: &Course, roster: &[User]) -> u8 {
    let audience = effective_audience(course, roster);
    if audience.is_empty() {
        return 0;
    }

    let completed = course
        .completions
        .iter()
        .filter(|completion| audience.contains(&completion.user_id))
        .map(|completion| &completion.user_id)
        .collect::<BTreeSet<_>>()
        .len();

    let percent = (completed as f64 / audience.len() as f64) * 100.0;
    percent.round() as u8
}

/// Status classification, first match wins:
///
/// 1. `Finished` — non-empty effective audience, everyone signed. Checked
///    before the date window so an early finish never shows as `Opening`,
///    and a finish at or past the end date never shows as `Pending`.
/// 2. `Plan` — today is before the window.
/// 3. `Pending` — the window lapsed with people outstanding.
/// 4. `Opening` — otherwise.
///
/// An empty audience is never `Finished`; "nobody to sign" is not the same
/// as "signed off", so such a course falls through to the date rules.
pub fn status(course: &Course, roster: &[User], today: NaiveDate) -> CourseStatus {
    let audience = effective_audience(course, roster);
    let finished = !audience.is_empty()
        && audience
            .iter()
            .all(|user_id| course.has_completion(user_id));

    if finished {
        CourseStatus::Finished
    } else if today < course.start {
        CourseStatus::Plan
    } else if today > course.end {
        CourseStatus::Pending
    } else {
        CourseStatus::Opening
    }
}

/// Whether `user` must be shown this course for signature today.
///
/// Assigned, active, window open or lapsed, and not yet signed. Overdue
/// courses stay visible and actionable until signed or excepted.
pub fn is_eligible_today(course: &Course, user: &User, roster: &[User], today: NaiveDate) -> bool {
    course.is_active
        && today >= course.start
        && !course.has_completion(&user.id)
        && effective_audience(course, roster).contains(&user.id)
}

/// Pending users partitioned by a roster attribute, sorted by descending
/// count. Ties break on the attribute's fixed display order (the known part
/// list for `Part`, lexicographic labels for `Group`), not discovery order,
/// so repeated renders are stable. With `include_empty`, fully cleared
/// partitions of the effective audience appear with a zero count.
///
/// A `Selected` snapshot can outlive registrations; pending ids with no
/// roster entry are bucketed under "Other" so the partitions always sum to
/// the pending count.
pub fn grouped_pending_counts(
    course: &Course,
    roster: &[User],
    key: GroupingKey,
    include_empty: bool,
) -> Vec<GroupCount> {
    let audience = effective_audience(course, roster);
    let pending = pending_users(course, roster);

    let mut labels: Vec<String> = Vec::new();
    let mut counts: Vec<usize> = Vec::new();
    for user in roster {
        if !audience.contains(&user.id) {
            continue;
        }
        let label = match key {
            GroupingKey::Part => &user.part,
            GroupingKey::Group => &user.group,
        };
        let slot = match labels.iter().position(|known| known == label) {
            Some(index) => index,
            None => {
                labels.push(label.clone());
                counts.push(0);
                labels.len() - 1
            }
        };
        if pending.contains(&user.id) {
            counts[slot] += 1;
        }
    }

    let off_roster = pending
        .iter()
        .filter(|user_id| !roster.iter().any(|user| user.id == **user_id))
        .count();
    if off_roster > 0 {
        let slot = match labels.iter().position(|known| known == "Other") {
            Some(index) => index,
            None => {
                labels.push("Other".to_string());
                counts.push(0);
                labels.len() - 1
            }
        };
        counts[slot] += off_roster;
    }

    let mut partitions: Vec<GroupCount> = labels
        .into_iter()
        .zip(counts)
        .filter(|(_, count)| include_empty || *count > 0)
        .map(|(label, count)| GroupCount { label, count })
        .collect();

    partitions.sort_by(|a, b| {
        b.count
            .cmp(&a.count)
            .then_with(|| display_rank(key, &a.label).cmp(&display_rank(key, &b.label)))
            .then_with(|| a.label.cmp(&b.label))
    });
    partitions
}

fn display_rank(key: GroupingKey, label: &str) -> usize {
    match key {
        // Unknown parts sort after the known list.
        GroupingKey::Part => KNOWN_PARTS
            .iter()
            .position(|known| *known == label)
            .unwrap_or(KNOWN_PARTS.len()),
        GroupingKey::Group => 0,
    }
}
