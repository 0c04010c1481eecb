//! HTTP API tests driven through the router with `oneshot`.

mod common;

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, HeaderMap, Method, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use common::{draft, test_db, StubSource};
use layoffwatch::discovery::ArticleSource;
use layoffwatch::server::{create_router, AppState};
use layoffwatch::Settings;

const PASSWORD: &str = "editor-password";
const CRON_SECRET: &str = "cron-secret";

struct TestApp {
    router: Router,
    _dir: tempfile::TempDir,
}

async fn test_app(source: Arc<dyn ArticleSource>) -> TestApp {
    let (db, dir) = test_db().await;
    let settings = Settings {
        admin_password: Some(PASSWORD.to_string()),
        cron_secret: Some(CRON_SECRET.to_string()),
        secure_cookies: false,
        ..Default::default()
    };
    let state = AppState::from_parts(db, source, &settings);
    TestApp {
        router: create_router(state),
        _dir: dir,
    }
}

impl TestApp {
    async fn send(&self, request: Request<Body>) -> (StatusCode, HeaderMap, Value) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, headers, body)
    }

    async fn login(&self) -> String {
        let (status, headers, _) = self
            .send(json_request(Method::POST, "/api/login", None, json!({ "password": PASSWORD })))
            .await;
        assert_eq!(status, StatusCode::OK);
        let set_cookie = headers
            .get(header::SET_COOKIE)
            .unwrap()
            .to_str()
            .unwrap();
        assert!(set_cookie.contains("HttpOnly"));
        set_cookie.split(';').next().unwrap().to_string()
    }
}

fn request(method: Method, uri: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::empty()).unwrap()
}

fn json_request(method: Method, uri: &str, cookie: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

#[tokio::test]
async fn test_public_feed_headers() {
    let app = test_app(StubSource::new(vec![])).await;

    let (status, headers, body) = app.send(request(Method::GET, "/api/reports", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));
    assert_eq!(headers[header::CACHE_CONTROL], "public, max-age=300");
    assert_eq!(headers[header::X_CONTENT_TYPE_OPTIONS], "nosniff");
    assert_eq!(headers[header::X_FRAME_OPTIONS], "DENY");
    assert!(headers.contains_key(header::CONTENT_SECURITY_POLICY));
}

#[tokio::test]
async fn test_admin_routes_require_session() {
    let app = test_app(StubSource::new(vec![])).await;

    for (method, uri) in [
        (Method::GET, "/api/admin/reports"),
        (Method::GET, "/api/admin/candidates"),
        (Method::POST, "/api/admin/candidates/scan"),
        (Method::POST, "/api/admin/reports/1/toggle"),
    ] {
        let (status, _, body) = app.send(request(method, uri, None)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{}", uri);
        assert_eq!(body, json!({ "error": "not authenticated" }));
    }

    let (status, _, _) = app
        .send(request(Method::GET, "/api/admin/reports", Some("lw_session=forged")))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _, _) = app
        .send(json_request(Method::POST, "/api/login", None, json!({ "password": "wrong" })))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_session_lifecycle() {
    let app = test_app(StubSource::new(vec![])).await;

    let (_, _, body) = app.send(request(Method::GET, "/api/session", None)).await;
    assert_eq!(body, json!({ "authenticated": false }));

    let cookie = app.login().await;
    let (_, _, body) = app.send(request(Method::GET, "/api/session", Some(&cookie))).await;
    assert_eq!(body, json!({ "authenticated": true }));

    let (status, headers, _) = app.send(request(Method::POST, "/api/logout", Some(&cookie))).await;
    assert_eq!(status, StatusCode::OK);
    assert!(headers[header::SET_COOKIE].to_str().unwrap().contains("Max-Age=0"));

    let (status, _, _) = app
        .send(request(Method::GET, "/api/admin/reports", Some(&cookie)))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_report_crud_and_publishing() {
    let app = test_app(StubSource::new(vec![])).await;
    let cookie = app.login().await;

    let (status, _, created) = app
        .send(json_request(
            Method::POST,
            "/api/admin/reports",
            Some(&cookie),
            json!({
                "date": "2025-02-01",
                "company": "Initech",
                "jobs_lost": "250",
                "region": "eu",
                "loss_type": "restated"
            }),
        ))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["region"], "EU");
    assert_eq!(created["loss_type"], "RESTATED");
    assert_eq!(created["jobs_lost"], 250);
    assert_eq!(created["include"], false);
    let id = created["id"].as_i64().unwrap();

    let (status, _, body) = app
        .send(json_request(
            Method::POST,
            "/api/admin/reports",
            Some(&cookie),
            json!({ "date": "2025-02-01", "jobs_lost": 3 }),
        ))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("company"));

    let (status, _, toggled) = app
        .send(request(
            Method::POST,
            &format!("/api/admin/reports/{}/toggle", id),
            Some(&cookie),
        ))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(toggled["include"], true);

    let (_, _, public) = app.send(request(Method::GET, "/api/reports", None)).await;
    assert_eq!(public.as_array().unwrap().len(), 1);

    let (_, _, stats) = app
        .send(request(Method::GET, "/api/admin/reports/stats", Some(&cookie)))
        .await;
    assert_eq!(stats, json!({ "published": 1, "draft": 0, "total": 1 }));

    let (status, _, updated) = app
        .send(json_request(
            Method::PUT,
            &format!("/api/admin/reports/{}", id),
            Some(&cookie),
            json!({ "date": "2025-02-02", "company": "Initech", "jobs_lost": 300 }),
        ))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["jobs_lost"], 300);
    assert_eq!(updated["include"], true);

    let uri = format!("/api/admin/reports/{}", id);
    let (status, _, _) = app.send(request(Method::DELETE, &uri, Some(&cookie))).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _, body) = app.send(request(Method::GET, &uri, Some(&cookie))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_candidate_review_over_http() {
    let app = test_app(StubSource::new(vec![vec![draft("a1"), draft("a2")]])).await;
    let cookie = app.login().await;

    let (status, _, scan) = app
        .send(json_request(
            Method::POST,
            "/api/admin/candidates/scan",
            Some(&cookie),
            json!({ "days": 2 }),
        ))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(scan, json!({ "added": 2, "skipped": 0, "errors": 0 }));

    let (_, _, pending) = app
        .send(request(Method::GET, "/api/admin/candidates?status=pending", Some(&cookie)))
        .await;
    let pending = pending.as_array().unwrap().clone();
    assert_eq!(pending.len(), 2);
    let first = pending[0]["id"].as_i64().unwrap();
    let second = pending[1]["id"].as_i64().unwrap();

    let approve_uri = format!("/api/admin/candidates/{}/approve", first);
    let (status, _, report) = app
        .send(json_request(
            Method::POST,
            &approve_uri,
            Some(&cookie),
            json!({ "company": "Acme", "jobs_lost": 40 }),
        ))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(report["include"], false);
    assert_eq!(report["source_label"], "Example Times");

    let (status, _, _) = app
        .send(json_request(
            Method::POST,
            &approve_uri,
            Some(&cookie),
            json!({ "company": "Acme", "jobs_lost": 40 }),
        ))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _, rejected) = app
        .send(request(
            Method::POST,
            &format!("/api/admin/candidates/{}/reject", second),
            Some(&cookie),
        ))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(rejected["status"], "REJECTED");

    let (status, _, _) = app
        .send(request(Method::POST, "/api/admin/candidates/999/reject", Some(&cookie)))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, _, stats) = app
        .send(request(Method::GET, "/api/admin/candidates/stats", Some(&cookie)))
        .await;
    assert_eq!(
        stats,
        json!({ "pending": 0, "approved": 1, "rejected": 1, "total": 2 })
    );

    let (status, _, _) = app
        .send(request(Method::GET, "/api/admin/candidates?status=bogus", Some(&cookie)))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _, cleanup) = app
        .send(request(Method::POST, "/api/admin/candidates/cleanup", Some(&cookie)))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(cleanup, json!({ "removed": 0 }));
}

#[tokio::test]
async fn test_cleanup_days_out_of_range() {
    let app = test_app(StubSource::new(vec![])).await;
    let cookie = app.login().await;

    for days in [json!(1_000_000_000), json!(i64::MAX)] {
        let (status, _, body) = app
            .send(json_request(
                Method::POST,
                "/api/admin/candidates/cleanup",
                Some(&cookie),
                json!({ "days": days }),
            ))
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "removed": 0 }));
    }

    let (status, _, body) = app
        .send(json_request(
            Method::POST,
            "/api/admin/candidates/cleanup",
            Some(&cookie),
            json!({ "days": -1 }),
        ))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("negative"));
}

#[tokio::test]
async fn test_scan_without_discovery_key() {
    let app = test_app(StubSource::unconfigured()).await;
    let cookie = app.login().await;

    let (status, _, body) = app
        .send(request(Method::POST, "/api/admin/candidates/scan", Some(&cookie)))
        .await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert!(body["error"].as_str().unwrap().contains("not configured"));
}

#[tokio::test]
async fn test_cron_requires_bearer_secret() {
    let app = test_app(StubSource::new(vec![vec![draft("c1")]])).await;

    let (status, _, _) = app.send(request(Method::GET, "/api/cron", None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let wrong = Request::builder()
        .uri("/api/cron")
        .header(header::AUTHORIZATION, "Bearer nope")
        .body(Body::empty())
        .unwrap();
    let (status, _, _) = app.send(wrong).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let authorized = Request::builder()
        .uri("/api/cron")
        .header(header::AUTHORIZATION, format!("Bearer {}", CRON_SECRET))
        .body(Body::empty())
        .unwrap();
    let (status, _, body) = app.send(authorized).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["scan"], json!({ "added": 1, "skipped": 0, "errors": 0 }));
    assert_eq!(body["removed"], 0);
}
