//! List views end to end: paging plus reference columns.

mod helpers;

use helpers::mock_backend::{MockBackend, MockResponse};
use helpers::{CountingLookup, MemorySource, student};
use roster::api::ApiClient;
use roster::models::{EntityKind, Student};
use roster::paging::FetchOutcome;
use roster::session::Session;
use roster::view::ListView;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

fn roster_rows() -> Vec<Student> {
    vec![
        student(1, "张三", Some(1), Some(10)),
        student(2, "李四", Some(1), Some(10)),
        student(3, "王五", Some(2), Some(20)),
        student(4, "赵六", None, Some(9)),
    ]
}

#[tokio::test]
async fn rows_show_resolved_names() {
    let lookup = Arc::new(CountingLookup::school().failing(EntityKind::Major, 9));
    let view: ListView<Student, _, _> = ListView::new(
        MemorySource::students(roster_rows()),
        Arc::clone(&lookup),
        10,
    );

    assert_eq!(view.load().await, FetchOutcome::Applied);

    assert_eq!(
        view.headers(),
        ["ID", "No.", "Name", "Gender", "Class", "Major", "Academy"]
    );
    let rows = view.rows();
    assert_eq!(
        rows[0],
        ["1", "20240001", "张三", "-", "SE 2024-1", "Software Engineering", "School of Computing"]
    );
    assert_eq!(rows[2][4], "AC 2024-1");
    assert_eq!(rows[2][6], "School of Business");
    // Failed major: raw ID in both the major and the chained academy column.
    assert_eq!(rows[3][4], "-");
    assert_eq!(rows[3][5], "9");
    assert_eq!(rows[3][6], "9");

    // Lookup failures never reach the page-level error.
    assert!(view.error_banner().is_none());

    // Major 10 is shared by the Major and Academy columns: one lookup.
    assert_eq!(lookup.calls_for(EntityKind::Major, 10), 1);
    assert_eq!(lookup.calls_for(EntityKind::Academy, 1), 1);
}

#[tokio::test]
async fn next_page_reuses_resolved_references() {
    let mut rows = roster_rows();
    rows.extend((5..=8).map(|id| student(id, "x", Some(1), Some(10))));
    let lookup = Arc::new(CountingLookup::school());
    let view: ListView<Student, _, _> = ListView::new(
        MemorySource::students(rows),
        Arc::clone(&lookup),
        4,
    );

    view.load().await;
    let before = lookup.calls().len();
    assert_eq!(view.set_page(1).await, FetchOutcome::Applied);
    assert_eq!(lookup.calls().len(), before);
    assert_eq!(view.rows()[0][5], "Software Engineering");

    // A full reload looks everything up again.
    view.reload().await;
    assert_eq!(lookup.calls_for(EntityKind::Major, 10), 2);
}

#[tokio::test]
async fn failed_fetch_shows_banner_over_last_rows() {
    let source = MemorySource::students(roster_rows());
    let view: ListView<Student, _, _> = ListView::new(
        source,
        Arc::new(CountingLookup::school()),
        10,
    );
    view.load().await;

    view.controller().source().fail_with(Some("服务器繁忙"));
    assert_eq!(view.refresh().await, FetchOutcome::Failed);
    assert_eq!(view.error_banner().as_deref(), Some("服务器繁忙"));
    assert_eq!(view.rows().len(), 4);

    view.controller().source().fail_with(None);
    view.refresh().await;
    assert!(view.error_banner().is_none());
}

#[tokio::test]
async fn status_line_describes_query() {
    let view: ListView<Student, _, _> = ListView::new(
        MemorySource::students(helpers::students(47)),
        Arc::new(CountingLookup::school()),
        10,
    );
    view.load().await;
    view.set_sort("name").await;
    view.set_filter("majorId", Some("10")).await;
    assert_eq!(
        view.status_line(),
        "student page 1/5 · 47 rows · sorted by name asc · majorId=10"
    );
}

#[tokio::test]
async fn teardown_stops_updates() {
    let view: ListView<Student, _, _> = ListView::new(
        MemorySource::students(roster_rows()),
        Arc::new(CountingLookup::school()),
        10,
    );
    view.teardown();
    assert_eq!(view.load().await, FetchOutcome::Cancelled);
    assert!(view.rows().is_empty());
    assert!(view.resolver().cache().is_empty());
}

#[tokio::test]
async fn end_to_end_against_backend() {
    let backend = MockBackend::start().await;
    backend
        .respond(
            "/api/students",
            MockResponse::page(
                json!([
                    {"id": 1, "name": "张三", "classId": 1, "majorId": 10},
                    {"id": 2, "name": "李四", "classId": 1, "majorId": 10},
                ]),
                1,
                2,
            ),
        )
        .await;
    backend
        .respond(
            "/api/classes/1",
            MockResponse::ok(json!({"id": 1, "name": "SE 2024-1", "majorId": 10})),
        )
        .await;
    backend
        .respond(
            "/api/majors/10",
            MockResponse::ok(json!({"id": 10, "name": "Software Engineering", "academyId": 1}))
                .with_delay(Duration::from_millis(20)),
        )
        .await;
    backend
        .respond(
            "/api/academies/1",
            MockResponse::ok(json!({"id": 1, "name": "School of Computing"})),
        )
        .await;

    let api = ApiClient::new(
        &backend.api_url(),
        Duration::from_secs(5),
        Duration::from_secs(1),
        Session::with_token("tok"),
    )
    .unwrap();
    let view: ListView<Student, _, _> = ListView::new(
        api.resource::<Student>(EntityKind::Student),
        Arc::new(api.clone()),
        10,
    );

    assert_eq!(view.load().await, FetchOutcome::Applied);
    let rows = view.rows();
    assert_eq!(rows[1][4], "SE 2024-1");
    assert_eq!(rows[1][5], "Software Engineering");
    assert_eq!(rows[1][6], "School of Computing");

    // Two rows and two columns share major 10; the backend sees it once.
    assert_eq!(backend.requests_to("/api/majors/10").await.len(), 1);
    assert_eq!(backend.requests_to("/api/classes/1").await.len(), 1);
    assert!(
        backend
            .requests()
            .await
            .iter()
            .all(|r| r.header("authorization") == Some("Bearer tok"))
    );
}
