use std::io::Cursor;
use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, post, put},
    Router,
};
use chrono::{DateTime, Local, NaiveDate, Utc};
use serde::Deserialize;
use serde_json::json;

use super::domain::{CourseDraft, CourseId, Signature, User, UserId, UserRole};
use super::import::{company_for_id, parse_roster};
use super::repository::{CourseRepository, NotificationSink, RepositoryError, RosterStore};
use super::service::{ServiceError, TrainingService};
use super::views::{pending_courses_for, CourseDetail, CourseOverview, NotificationView};

/// Router builder exposing the course, roster, and inbox endpoints.
pub fn course_router<C, S, N>(service: Arc<TrainingService<C, S, N>>) -> Router
where
    C: CourseRepository + 'static,
    S: RosterStore + 'static,
    N: NotificationSink + 'static,
{
    Router::new()
        .route(
            "/api/v1/courses",
            post(create_course_handler::<C, S, N>).get(list_courses_handler::<C, S, N>),
        )
        .route(
            "/api/v1/courses/:course_id",
            get(course_detail_handler::<C, S, N>).delete(delete_course_handler::<C, S, N>),
        )
        .route(
            "/api/v1/courses/:course_id/completions",
            post(sign_handler::<C, S, N>),
        )
        .route(
            "/api/v1/courses/:course_id/exceptions",
            put(upsert_exception_handler::<C, S, N>),
        )
        .route(
            "/api/v1/courses/:course_id/exceptions/:user_id",
            delete(remove_exception_handler::<C, S, N>),
        )
        .route(
            "/api/v1/courses/:course_id/active",
            post(set_active_handler::<C, S, N>),
        )
        .route(
            "/api/v1/courses/:course_id/reminders",
            post(reminders_handler::<C, S, N>),
        )
        .route(
            "/api/v1/users/:user_id/courses",
            get(user_pending_handler::<C, S, N>),
        )
        .route(
            "/api/v1/users/:user_id/notifications",
            get(inbox_handler::<C, S, N>),
        )
        .route(
            "/api/v1/users/:user_id/notifications/read",
            post(mark_read_handler::<C, S, N>),
        )
        .route("/api/v1/roster", post(register_user_handler::<C, S, N>))
        .route(
            "/api/v1/roster/import",
            post(import_roster_handler::<C, S, N>),
        )
        .with_state(service)
}

/// Optional evaluation-date override so any calendar day can be replayed.
#[derive(Debug, Deserialize)]
pub(crate) struct TodayQuery {
    today: Option<NaiveDate>,
}

impl TodayQuery {
    fn resolve(&self) -> NaiveDate {
        self.today.unwrap_or_else(|| Local::now().date_naive())
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct SignRequest {
    user_id: UserId,
    signature: String,
    /// Moment of signing; defaults to the server clock.
    timestamp: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ExceptionRequest {
    user_id: UserId,
    reason: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SetActiveRequest {
    is_active: bool,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RegisterUserRequest {
    name: String,
    id: UserId,
    part: String,
    group: String,
}

pub(crate) async fn create_course_handler<C, S, N>(
    State(service): State<Arc<TrainingService<C, S, N>>>,
    axum::Json(draft): axum::Json<CourseDraft>,
) -> Response
where
    C: CourseRepository + 'static,
    S: RosterStore + 'static,
    N: NotificationSink + 'static,
{
    match service.create_course(draft) {
        Ok(course) => (StatusCode::CREATED, axum::Json(course)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn list_courses_handler<C, S, N>(
    State(service): State<Arc<TrainingService<C, S, N>>>,
    Query(query): Query<TodayQuery>,
) -> Response
where
    C: CourseRepository + 'static,
    S: RosterStore + 'static,
    N: NotificationSink + 'static,
{
    let today = query.resolve();
    let overview = service.courses().and_then(|courses| {
        let roster = service.roster()?;
        Ok(courses
            .iter()
            .map(|course| CourseOverview::build(course, &roster, today))
            .collect::<Vec<_>>())
    });

    match overview {
        Ok(entries) => (StatusCode::OK, axum::Json(entries)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn course_detail_handler<C, S, N>(
    State(service): State<Arc<TrainingService<C, S, N>>>,
    Path(course_id): Path<String>,
    Query(query): Query<TodayQuery>,
) -> Response
where
    C: CourseRepository + 'static,
    S: RosterStore + 'static,
    N: NotificationSink + 'static,
{
    let today = query.resolve();
    let detail = service.course(&CourseId(course_id)).and_then(|course| {
        let roster = service.roster()?;
        Ok(CourseDetail::build(&course, &roster, today))
    });

    match detail {
        Ok(view) => (StatusCode::OK, axum::Json(view)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn delete_course_handler<C, S, N>(
    State(service): State<Arc<TrainingService<C, S, N>>>,
    Path(course_id): Path<String>,
) -> Response
where
    C: CourseRepository + 'static,
    S: RosterStore + 'static,
    N: NotificationSink + 'static,
{
    match service.delete_course(&CourseId(course_id)) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn sign_handler<C, S, N>(
    State(service): State<Arc<TrainingService<C, S, N>>>,
    Path(course_id): Path<String>,
    axum::Json(request): axum::Json<SignRequest>,
) -> Response
where
    C: CourseRepository + 'static,
    S: RosterStore + 'static,
    N: NotificationSink + 'static,
{
    let timestamp = request.timestamp.unwrap_or_else(Utc::now);
    match service.sign_course(
        &CourseId(course_id),
        &request.user_id,
        Signature(request.signature),
        timestamp,
    ) {
        Ok(course) => (StatusCode::OK, axum::Json(course)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn upsert_exception_handler<C, S, N>(
    State(service): State<Arc<TrainingService<C, S, N>>>,
    Path(course_id): Path<String>,
    axum::Json(request): axum::Json<ExceptionRequest>,
) -> Response
where
    C: CourseRepository + 'static,
    S: RosterStore + 'static,
    N: NotificationSink + 'static,
{
    match service.add_exception(&CourseId(course_id), &request.user_id, request.reason) {
        Ok(course) => (StatusCode::OK, axum::Json(course)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn remove_exception_handler<C, S, N>(
    State(service): State<Arc<TrainingService<C, S, N>>>,
    Path((course_id, user_id)): Path<(String, String)>,
) -> Response
where
    C: CourseRepository + 'static,
    S: RosterStore + 'static,
    N: NotificationSink + 'static,
{
    match service.remove_exception(&CourseId(course_id), &UserId(user_id)) {
        Ok(course) => (StatusCode::OK, axum::Json(course)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn set_active_handler<C, S, N>(
    State(service): State<Arc<TrainingService<C, S, N>>>,
    Path(course_id): Path<String>,
    axum::Json(request): axum::Json<SetActiveRequest>,
) -> Response
where
    C: CourseRepository + 'static,
    S: RosterStore + 'static,
    N: NotificationSink + 'static,
{
    match service.set_active(&CourseId(course_id), request.is_active) {
        Ok(course) => (StatusCode::OK, axum::Json(course)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn reminders_handler<C, S, N>(
    State(service): State<Arc<TrainingService<C, S, N>>>,
    Path(course_id): Path<String>,
    Query(query): Query<TodayQuery>,
) -> Response
where
    C: CourseRepository + 'static,
    S: RosterStore + 'static,
    N: NotificationSink + 'static,
{
    match service.send_reminders(&CourseId(course_id), query.resolve()) {
        Ok(reminded) => (StatusCode::OK, axum::Json(json!({ "reminded": reminded }))).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn user_pending_handler<C, S, N>(
    State(service): State<Arc<TrainingService<C, S, N>>>,
    Path(user_id): Path<String>,
    Query(query): Query<TodayQuery>,
) -> Response
where
    C: CourseRepository + 'static,
    S: RosterStore + 'static,
    N: NotificationSink + 'static,
{
    let today = query.resolve();
    let pending = service.user(&UserId(user_id)).and_then(|user| {
        let roster = service.roster()?;
        let courses = service.courses()?;
        Ok(pending_courses_for(&courses, &user, &roster, today))
    });

    match pending {
        Ok(entries) => (StatusCode::OK, axum::Json(entries)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn inbox_handler<C, S, N>(
    State(service): State<Arc<TrainingService<C, S, N>>>,
    Path(user_id): Path<String>,
) -> Response
where
    C: CourseRepository + 'static,
    S: RosterStore + 'static,
    N: NotificationSink + 'static,
{
    match service.inbox(&UserId(user_id)) {
        Ok(notifications) => {
            let views: Vec<NotificationView> =
                notifications.iter().map(NotificationView::build).collect();
            (StatusCode::OK, axum::Json(views)).into_response()
        }
        Err(error) => error_response(error),
    }
}

pub(crate) async fn mark_read_handler<C, S, N>(
    State(service): State<Arc<TrainingService<C, S, N>>>,
    Path(user_id): Path<String>,
) -> Response
where
    C: CourseRepository + 'static,
    S: RosterStore + 'static,
    N: NotificationSink + 'static,
{
    match service.mark_inbox_read(&UserId(user_id)) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn register_user_handler<C, S, N>(
    State(service): State<Arc<TrainingService<C, S, N>>>,
    axum::Json(request): axum::Json<RegisterUserRequest>,
) -> Response
where
    C: CourseRepository + 'static,
    S: RosterStore + 'static,
    N: NotificationSink + 'static,
{
    let user = User {
        company: company_for_id(&request.id),
        id: request.id,
        name: request.name,
        part: request.part,
        group: request.group,
        role: UserRole::Standard,
    };

    match service.register_user(user.clone()) {
        Ok(()) => (StatusCode::CREATED, axum::Json(user)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn import_roster_handler<C, S, N>(
    State(service): State<Arc<TrainingService<C, S, N>>>,
    body: String,
) -> Response
where
    C: CourseRepository + 'static,
    S: RosterStore + 'static,
    N: NotificationSink + 'static,
{
    let import = match parse_roster(Cursor::new(body.into_bytes())) {
        Ok(import) => import,
        Err(error) => {
            let payload = json!({ "error": error.to_string() });
            return (StatusCode::UNPROCESSABLE_ENTITY, axum::Json(payload)).into_response();
        }
    };

    let parsed = import.users.len();
    let skipped = import.skipped_rows;
    match service.import_roster(import.users) {
        Ok(added) => (
            StatusCode::OK,
            axum::Json(json!({
                "added": added,
                "parsed": parsed,
                "skipped_rows": skipped,
            })),
        )
            .into_response(),
        Err(error) => error_response(error),
    }
}

fn error_response(error: ServiceError) -> Response {
    let status = match &error {
        ServiceError::InvalidWindow { .. } | ServiceError::UnknownUser(_) => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
        ServiceError::CourseNotFound(_) => StatusCode::NOT_FOUND,
        ServiceError::Repository(RepositoryError::Conflict) => StatusCode::CONFLICT,
        ServiceError::Repository(RepositoryError::NotFound) => StatusCode::NOT_FOUND,
        ServiceError::Repository(RepositoryError::Unavailable(_))
        | ServiceError::Notification(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };

    let payload = json!({ "error": error.to_string() });
    (status, axum::Json(payload)).into_response()
}
