use std::sync::Arc;

use axum::body::Body;
use axum::extract::{Path, Query, State};
use axum::http::{header, Request, StatusCode};
use axum::response::Response;
use serde_json::{json, Value};
use tower::ServiceExt;

use super::common::*;
use crate::courses::domain::{CourseAudience, UserId};
use crate::courses::router::course_router;
use crate::courses::service::TrainingService;

async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}

fn request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(serde_json::to_vec(&body).expect("serialize")))
        .expect("request")
}

fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .expect("request")
}

fn seeded_router() -> (
    axum::Router,
    Arc<TrainingService<MemoryCourses, MemoryRoster, MemoryInbox>>,
) {
    let (service, _, _, _) = seeded_service(&[
        staff_user("10000001", "An", "QA 1P"),
        staff_user("10000002", "Binh", "QA 2P"),
    ]);
    let service = Arc::new(service);
    (course_router(service.clone()), service)
}

#[tokio::test]
async fn create_course_route_returns_created() {
    let (router, _) = seeded_router();

    let response = router
        .oneshot(request(
            "POST",
            "/api/v1/courses",
            json!({
                "name": "Chemical Handling Refresher",
                "start": "2024-01-01",
                "end": "2024-01-31",
                "content": "Updated MSDS locations.",
                "audience": "staff"
            }),
        ))
        .await
        .expect("router response");

    assert_eq!(response.status(), StatusCode::CREATED);
    let body = read_json_body(response).await;
    assert_eq!(body["audience"], "staff");
    assert_eq!(body["assigned_user_ids"].as_array().expect("array").len(), 2);
}

#[tokio::test]
async fn create_course_route_rejects_inverted_window() {
    let (router, _) = seeded_router();

    let response = router
        .oneshot(request(
            "POST",
            "/api/v1/courses",
            json!({
                "name": "Backwards",
                "start": "2024-02-01",
                "end": "2024-01-01",
                "content": "",
                "audience": "staff"
            }),
        ))
        .await
        .expect("router response");

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn overview_route_reports_engine_output_for_replayed_date() {
    let (router, service) = seeded_router();
    let course = service
        .create_course(draft(date(2024, 1, 1), date(2024, 1, 31), CourseAudience::Staff))
        .expect("course created");
    service
        .sign_course(
            &course.id,
            &UserId("10000001".to_string()),
            crate::courses::domain::Signature("sig".to_string()),
            chrono::Utc::now(),
        )
        .expect("signature recorded");

    let response = router
        .oneshot(get("/api/v1/courses?today=2024-02-10"))
        .await
        .expect("router response");

    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json_body(response).await;
    let entry = &body.as_array().expect("array")[0];
    assert_eq!(entry["status"], "pending");
    assert_eq!(entry["status_label"], "Pending");
    assert_eq!(entry["progress_percent"], 50);
    assert_eq!(entry["pending_count"], 1);
}

#[tokio::test]
async fn detail_route_lists_pending_users() {
    let (router, service) = seeded_router();
    let course = service
        .create_course(draft(date(2024, 1, 1), date(2024, 1, 31), CourseAudience::Staff))
        .expect("course created");

    let uri = format!("/api/v1/courses/{}?today=2024-01-15", course.id.as_str());
    let response = router.oneshot(get(&uri)).await.expect("router response");

    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json_body(response).await;
    assert_eq!(body["status"], "opening");
    assert_eq!(body["pending_user_ids"].as_array().expect("array").len(), 2);
}

#[tokio::test]
async fn detail_route_returns_not_found_for_unknown_course() {
    let (router, _) = seeded_router();

    let response = router
        .oneshot(get("/api/v1/courses/course-zzz"))
        .await
        .expect("router response");

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn sign_route_is_idempotent() {
    let (router, service) = seeded_router();
    let course = service
        .create_course(draft(date(2024, 1, 1), date(2024, 1, 31), CourseAudience::Staff))
        .expect("course created");

    let uri = format!("/api/v1/courses/{}/completions", course.id.as_str());
    let payload = json!({ "user_id": "10000001", "signature": "data:image/png;base64,AA" });

    let first = router
        .clone()
        .oneshot(request("POST", &uri, payload.clone()))
        .await
        .expect("router response");
    assert_eq!(first.status(), StatusCode::OK);

    let second = router
        .oneshot(request("POST", &uri, payload))
        .await
        .expect("router response");
    assert_eq!(second.status(), StatusCode::OK);
    let body = read_json_body(second).await;
    assert_eq!(body["completions"].as_array().expect("array").len(), 1);
}

#[tokio::test]
async fn user_courses_route_shows_overdue_items() {
    let (router, service) = seeded_router();
    service
        .create_course(draft(date(2024, 1, 1), date(2024, 1, 31), CourseAudience::Staff))
        .expect("course created");

    let response = router
        .oneshot(get("/api/v1/users/10000001/courses?today=2024-02-10"))
        .await
        .expect("router response");

    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json_body(response).await;
    let entries = body.as_array().expect("array");
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["overdue"], true);
}

#[tokio::test]
async fn roster_import_route_reports_added_and_skipped() {
    let (router, _) = seeded_router();

    let csv = "name,id,part,group\nCuong,10000003,QA 3P,QA\n,,QA G,QA\nAn,10000001,QA 1P,QA\n";
    let response = router
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/v1/roster/import")
                .header(header::CONTENT_TYPE, "text/csv")
                .body(Body::from(csv.to_string()))
                .expect("request"),
        )
        .await
        .expect("router response");

    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json_body(response).await;
    assert_eq!(body["parsed"], 2);
    assert_eq!(body["added"], 1, "already-registered id is skipped");
    assert_eq!(body["skipped_rows"], 1);
}

#[tokio::test]
async fn register_route_derives_company_from_id_shape() {
    let (router, _) = seeded_router();

    let response = router
        .oneshot(request(
            "POST",
            "/api/v1/roster",
            json!({
                "name": "Chi",
                "id": "100000000001",
                "part": "N/A",
                "group": "Apex Molding"
            }),
        ))
        .await
        .expect("router response");

    assert_eq!(response.status(), StatusCode::CREATED);
    let body = read_json_body(response).await;
    assert_eq!(body["company"], "vendor");
}

#[tokio::test]
async fn register_route_conflicts_on_duplicate_id() {
    let (router, _) = seeded_router();

    let response = router
        .oneshot(request(
            "POST",
            "/api/v1/roster",
            json!({
                "name": "An Again",
                "id": "10000001",
                "part": "QA 1P",
                "group": "QA"
            }),
        ))
        .await
        .expect("router response");

    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn notifications_routes_list_and_mark_read() {
    let (router, service) = seeded_router();
    service
        .create_course(draft(date(2024, 1, 1), date(2024, 1, 31), CourseAudience::Staff))
        .expect("course created");

    let listed = router
        .clone()
        .oneshot(get("/api/v1/users/10000001/notifications"))
        .await
        .expect("router response");
    assert_eq!(listed.status(), StatusCode::OK);
    let body = read_json_body(listed).await;
    assert_eq!(body.as_array().expect("array").len(), 1);
    assert_eq!(body[0]["kind"], "new_course");
    assert_eq!(body[0]["is_read"], false);

    let marked = router
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/v1/users/10000001/notifications/read")
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("router response");
    assert_eq!(marked.status(), StatusCode::NO_CONTENT);

    let relisted = router
        .oneshot(get("/api/v1/users/10000001/notifications"))
        .await
        .expect("router response");
    let body = read_json_body(relisted).await;
    assert_eq!(body[0]["is_read"], true);
}

#[tokio::test]
async fn list_handler_returns_internal_error_when_store_is_down() {
    let service = Arc::new(TrainingService::new(
        Arc::new(UnavailableCourses),
        Arc::new(MemoryRoster::default()),
        Arc::new(MemoryInbox::default()),
    ));

    let response = crate::courses::router::list_courses_handler::<
        UnavailableCourses,
        MemoryRoster,
        MemoryInbox,
    >(State(service), Query(empty_today_query()))
    .await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn delete_handler_maps_missing_course_to_not_found() {
    let (service, _, _, _) = seeded_service(&[staff_user("10000001", "An", "QA 1P")]);
    let service = Arc::new(service);

    let response = crate::courses::router::delete_course_handler::<
        MemoryCourses,
        MemoryRoster,
        MemoryInbox,
    >(State(service), Path("course-none".to_string()))
    .await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

fn empty_today_query() -> crate::courses::router::TodayQuery {
    serde_json::from_value(json!({})).expect("query")
}
