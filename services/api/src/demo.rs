use crate::infra::{InMemoryCourseRepository, InMemoryNotificationSink, InMemoryRosterStore};
use chrono::{Local, NaiveDate, Utc};
use clap::Args;
use std::sync::Arc;
use training_compliance::courses::views::pending_courses_for;
use training_compliance::courses::{
    Company, CourseAudience, CourseDraft, CourseOverview, Signature, TrainingService, User, UserId,
    UserRole,
};
use training_compliance::error::AppError;

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Course window start (YYYY-MM-DD). Defaults to today.
    #[arg(long, value_parser = crate::infra::parse_date)]
    pub(crate) start: Option<NaiveDate>,
    /// Course window end (YYYY-MM-DD). Defaults to start + 30 days.
    #[arg(long, value_parser = crate::infra::parse_date)]
    pub(crate) end: Option<NaiveDate>,
    /// Evaluation date for status and progress (defaults to today).
    #[arg(long, value_parser = crate::infra::parse_date)]
    pub(crate) today: Option<NaiveDate>,
}

fn staff(id: &str, name: &str, part: &str) -> User {
    User {
        id: UserId(id.to_string()),
        name: name.to_string(),
        part: part.to_string(),
        group: "QA".to_string(),
        role: UserRole::Standard,
        company: Company::Staff,
    }
}

fn vendor(id: &str, name: &str, group: &str) -> User {
    User {
        id: UserId(id.to_string()),
        name: name.to_string(),
        part: "N/A".to_string(),
        group: group.to_string(),
        role: UserRole::Standard,
        company: Company::Vendor,
    }
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let DemoArgs { start, end, today } = args;

    let start = start.unwrap_or_else(|| Local::now().date_naive());
    let end = end.unwrap_or(start + chrono::Duration::days(30));
    let today = today.unwrap_or_else(|| Local::now().date_naive());

    println!("Training compliance demo");
    println!("Course window: {} -> {} (evaluated {})", start, end, today);

    let service = Arc::new(TrainingService::new(
        Arc::new(InMemoryCourseRepository::default()),
        Arc::new(InMemoryRosterStore::default()),
        Arc::new(InMemoryNotificationSink::default()),
    ));

    for user in [
        staff("10000001", "An Nguyen", "QA 1P"),
        staff("10000002", "Binh Le", "QA 2P"),
        staff("10000003", "Cuong Pham", "QA 3P"),
        staff("10000004", "Dung Tran", "QA G"),
        vendor("100000000001", "Chi Vo", "Apex Molding"),
        vendor("100000000002", "Em Hoang", "Crown Tooling"),
    ] {
        service.register_user(user).map_err(AppError::from)?;
    }
    println!("Seeded roster: 4 staff members, 2 vendor operators");

    let staff_course = service
        .create_course(CourseDraft {
            name: "Quarterly Safety Refresher".to_string(),
            start,
            end,
            content: "Review the updated lockout/tagout procedure and countersign.".to_string(),
            audience: CourseAudience::Staff,
            selected_user_ids: Vec::new(),
            is_active: true,
        })
        .map_err(AppError::from)?;
    println!(
        "\nPublished \"{}\" to {} staff members",
        staff_course.name,
        staff_course.assigned_user_ids.len()
    );

    let signed_at = Utc::now();
    for id in ["10000001", "10000002"] {
        service
            .sign_course(
                &staff_course.id,
                &UserId(id.to_string()),
                Signature("data:image/png;base64,demo".to_string()),
                signed_at,
            )
            .map_err(AppError::from)?;
    }
    service
        .add_exception(
            &staff_course.id,
            &UserId("10000003".to_string()),
            "approved leave until next quarter".to_string(),
        )
        .map_err(AppError::from)?;
    println!("Recorded 2 signatures and 1 exception");

    let snapshot = service.course(&staff_course.id).map_err(AppError::from)?;
    let roster = service.roster().map_err(AppError::from)?;
    let overview = CourseOverview::build(&snapshot, &roster, today);
    println!(
        "\nStatus: {} | progress {}% | {} pending",
        overview.status_label, overview.progress_percent, overview.pending_count
    );
    println!("Pending by part:");
    for entry in &overview.grouped_pending {
        println!("  - {}: {}", entry.label, entry.count);
    }
    match serde_json::to_string_pretty(&overview) {
        Ok(json) => println!("\nAdmin overview payload:\n{}", json),
        Err(err) => println!("\nAdmin overview payload unavailable: {}", err),
    }

    let reminded = service
        .send_reminders(&staff_course.id, today)
        .map_err(AppError::from)?;
    println!("\nDispatched {} reminder(s) to unsigned assignees", reminded);

    let laggard = roster
        .iter()
        .find(|user| user.id == UserId("10000004".to_string()));
    if let Some(user) = laggard {
        let courses = service.courses().map_err(AppError::from)?;
        let pending = pending_courses_for(&courses, user, &roster, today);
        println!("\nDashboard for {} ({}):", user.name, user.part);
        for entry in &pending {
            let due = if entry.overdue { "OVERDUE" } else { "due" };
            println!("  - {} ({} {})", entry.name, due, entry.end);
        }
        for notification in service.inbox(&user.id).map_err(AppError::from)? {
            println!("  inbox: {}", notification.message);
        }
    }

    Ok(())
}
