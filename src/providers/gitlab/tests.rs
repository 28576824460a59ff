use mockito::{Matcher, Mock, Server, ServerGuard};
use serde_json::{json, Value};
use tokio_test::assert_ok;

use super::*;
use crate::auth::Token;
use crate::error::PipemonError;
use crate::model::CanonicalStatus;

const REPO_URL: &str = "https://gitlab.example.com/group/app.git";
const TOKEN: &str = "glpat-secret";

fn provider(server: &ServerGuard, settings: FetchSettings) -> GitLabProvider {
    let api_url = format!("{}/api/v4", server.url());
    GitLabProvider::new(REPO_URL, Token::from(TOKEN), Some(&api_url), settings).unwrap()
}

fn path(suffix: &str) -> Matcher {
    Matcher::Regex(format!(r"{suffix}(\?.*)?$"))
}

async fn mock_json(server: &mut ServerGuard, suffix: &str, body: Value) -> Mock {
    server
        .mock("GET", path(suffix))
        .match_query(Matcher::Any)
        .match_header("private-token", TOKEN)
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(body.to_string())
        .create_async()
        .await
}

fn list_entry(id: u64, status: &str) -> Value {
    json!({ "id": id, "sha": format!("sha{id}"), "ref": "main", "status": status })
}

fn detail(id: u64, status: &str, duration: Option<u64>) -> Value {
    json!({
        "id": id,
        "sha": format!("sha{id}"),
        "ref": "v5.2.1",
        "tag": true,
        "status": status,
        "created_at": "2024-05-01T10:00:00.000Z",
        "finished_at": duration.map(|_| "2024-05-01T10:05:00.000Z"),
        "duration": duration,
    })
}

fn commit(id: u64) -> Value {
    json!({
        "id": format!("sha{id}"),
        "message": format!("Commit for pipeline {id}\n\nDetails"),
        "author_name": "Robin",
        "author_email": "robin@example.com",
    })
}

async fn mock_pipeline(server: &mut ServerGuard, id: u64, status: &str, jobs: Value) -> Vec<Mock> {
    vec![
        mock_json(server, &format!("/pipelines/{id}"), detail(id, status, Some(65))).await,
        mock_json(server, &format!("/repository/commits/sha{id}"), commit(id)).await,
        mock_json(server, &format!("/pipelines/{id}/jobs"), jobs).await,
    ]
}

#[tokio::test]
async fn test_collect_pipelines_normalizes_and_drops_skipped() {
    let mut server = Server::new_async().await;

    let list = mock_json(
        &mut server,
        "/pipelines",
        json!([
            list_entry(101, "success"),
            list_entry(102, "skipped"),
            list_entry(103, "failed"),
        ]),
    )
    .await;

    let mut mocks = mock_pipeline(
        &mut server,
        101,
        "success",
        json!([
            { "name": "compile", "stage": "build", "status": "success" },
            { "name": "unit", "stage": "test", "status": "success" },
        ]),
    )
    .await;
    mocks.extend(
        mock_pipeline(
            &mut server,
            103,
            "failed",
            json!([
                { "name": "compile", "stage": "build", "status": "success" },
                { "name": "unit", "stage": "test", "status": "success" },
                { "name": "lint", "stage": "test", "status": "failed", "failure_reason": "script_failure" },
                { "name": "ship", "stage": "deploy", "status": "skipped" },
            ]),
        )
        .await,
    );

    let pipelines = assert_ok!(
        provider(&server, FetchSettings::default())
            .collect_pipelines(&DateWindow::default())
            .await
    );

    list.assert_async().await;
    for mock in &mocks {
        mock.assert_async().await;
    }

    let ids: Vec<u64> = pipelines.iter().map(|p| p.id).collect();
    assert_eq!(ids, [101, 103]);

    let failed = &pipelines[1];
    assert_eq!(failed.name, "app #103");
    assert_eq!(failed.repository, "group/app");
    assert_eq!(failed.status, CanonicalStatus::Error);
    assert_eq!(failed.duration, "1m 5s");
    assert_eq!(failed.commit.author, "Robin");
    assert_eq!(failed.commit.email.as_deref(), Some("robin@example.com"));
    assert_eq!(failed.version_tag.as_deref(), Some("v5.2.1"));
    assert_eq!(failed.failure_summary.as_deref(), Some("script_failure"));
    assert_eq!(
        failed.url.as_deref(),
        Some("https://gitlab.example.com/group/app/-/pipelines/103")
    );

    let stages: Vec<(&str, CanonicalStatus)> = failed
        .stages
        .iter()
        .map(|stage| (stage.name.as_str(), stage.status))
        .collect();
    assert_eq!(
        stages,
        [
            ("build", CanonicalStatus::Success),
            ("test", CanonicalStatus::Error),
            ("deploy", CanonicalStatus::Skipped),
        ]
    );
}

#[tokio::test]
async fn test_invalid_repository_url_fails_before_any_request() {
    let result = GitLabProvider::new(
        "https://gitlab.example.com/app",
        Token::from(TOKEN),
        None,
        FetchSettings::default(),
    );

    assert!(matches!(result, Err(PipemonError::InvalidRepositoryUrl(_))));
}

#[tokio::test]
async fn test_non_success_response_aborts_whole_batch() {
    let mut server = Server::new_async().await;

    let _list = mock_json(
        &mut server,
        "/pipelines",
        json!([list_entry(201, "success"), list_entry(202, "success")]),
    )
    .await;
    let _first = mock_pipeline(&mut server, 201, "success", json!([])).await;
    let _detail = mock_json(&mut server, "/pipelines/202", detail(202, "success", Some(3))).await;
    let _commit = server
        .mock("GET", path("/repository/commits/sha202"))
        .match_query(Matcher::Any)
        .with_status(404)
        .with_body(r#"{"message":"404 Commit Not Found"}"#)
        .create_async()
        .await;

    let result = provider(&server, FetchSettings::default())
        .collect_pipelines(&DateWindow::default())
        .await;

    match result {
        Err(PipemonError::UpstreamRequestFailed { status, body }) => {
            assert_eq!(status, 404);
            assert!(body.contains("404 Commit Not Found"));
        }
        other => panic!("expected UpstreamRequestFailed, got {other:?}"),
    }
}

#[tokio::test]
async fn test_list_failure_carries_status_and_body() {
    let mut server = Server::new_async().await;
    let _list = server
        .mock("GET", path("/pipelines"))
        .match_query(Matcher::Any)
        .with_status(401)
        .with_body(r#"{"message":"401 Unauthorized"}"#)
        .create_async()
        .await;

    let err = provider(&server, FetchSettings::default())
        .collect_pipelines(&DateWindow::default())
        .await
        .unwrap_err();

    assert!(matches!(err, PipemonError::UpstreamRequestFailed { status: 401, .. }));
    assert!(err.to_string().contains("401 Unauthorized"));
}

#[tokio::test]
async fn test_date_window_and_page_size_are_sent_upstream() {
    use chrono::{TimeZone, Utc};

    let mut server = Server::new_async().await;
    let list = server
        .mock("GET", path("/pipelines"))
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("per_page".into(), "20".into()),
            Matcher::UrlEncoded("updated_after".into(), "2024-05-01T00:00:00Z".into()),
            Matcher::UrlEncoded("updated_before".into(), "2024-05-31T23:59:59Z".into()),
        ]))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body("[]")
        .create_async()
        .await;

    let window = DateWindow {
        from: Some(Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap()),
        to: Some(Utc.with_ymd_and_hms(2024, 5, 31, 23, 59, 59).unwrap()),
    };
    let settings = FetchSettings {
        per_page: 20,
        ..FetchSettings::default()
    };

    let pipelines = assert_ok!(provider(&server, settings).collect_pipelines(&window).await);

    list.assert_async().await;
    assert!(pipelines.is_empty());
}

#[tokio::test]
async fn test_limit_and_concurrency_keep_upstream_order() {
    let mut server = Server::new_async().await;

    let _list = mock_json(
        &mut server,
        "/pipelines",
        json!([
            list_entry(301, "running"),
            list_entry(302, "skipped"),
            list_entry(303, "success"),
            list_entry(304, "canceled"),
            list_entry(305, "success"),
        ]),
    )
    .await;
    let mut mocks = Vec::new();
    for (id, status) in [(301, "running"), (303, "success"), (304, "canceled")] {
        mocks.extend(mock_pipeline(&mut server, id, status, json!([])).await);
    }

    let settings = FetchSettings {
        per_page: 10,
        limit: 3,
        concurrency: 4,
    };
    let pipelines = assert_ok!(
        provider(&server, settings)
            .collect_pipelines(&DateWindow::default())
            .await
    );

    let summary: Vec<(u64, CanonicalStatus)> =
        pipelines.iter().map(|p| (p.id, p.status)).collect();
    assert_eq!(
        summary,
        [
            (301, CanonicalStatus::Running),
            (303, CanonicalStatus::Success),
            (304, CanonicalStatus::Warning),
        ]
    );
}

#[tokio::test]
async fn test_jobs_are_followed_across_pages() {
    let mut server = Server::new_async().await;

    let _list = mock_json(&mut server, "/pipelines", json!([list_entry(401, "failed")])).await;
    let _detail = mock_json(&mut server, "/pipelines/401", detail(401, "failed", Some(90))).await;
    let _commit = mock_json(&mut server, "/repository/commits/sha401", commit(401)).await;

    let first_page: Vec<Value> = (0..100)
        .map(|i| json!({ "name": format!("compile-{i}"), "stage": "build", "status": "success" }))
        .collect();
    let page_one = server
        .mock("GET", path("/pipelines/401/jobs"))
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("per_page".into(), "100".into()),
            Matcher::UrlEncoded("page".into(), "1".into()),
        ]))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(Value::Array(first_page).to_string())
        .create_async()
        .await;
    let page_two = server
        .mock("GET", path("/pipelines/401/jobs"))
        .match_query(Matcher::UrlEncoded("page".into(), "2".into()))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(json!([{ "name": "unit", "stage": "test", "status": "failed" }]).to_string())
        .create_async()
        .await;

    let pipelines = assert_ok!(
        provider(&server, FetchSettings::default())
            .collect_pipelines(&DateWindow::default())
            .await
    );

    page_one.assert_async().await;
    page_two.assert_async().await;

    let stages = &pipelines[0].stages;
    assert_eq!(stages.len(), 2);
    assert_eq!(stages[0].name, "build");
    assert_eq!(stages[0].status, CanonicalStatus::Success);
    assert_eq!(stages[1].name, "test");
    assert_eq!(stages[1].status, CanonicalStatus::Error);
    assert_eq!(stages[1].failure_reason.as_deref(), Some("Unknown failure"));
    assert_eq!(pipelines[0].failure_summary.as_deref(), Some("Unknown failure"));
}
