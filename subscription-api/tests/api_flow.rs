//! End-to-end HTTP flows against in-memory storage

use std::time::Duration;

use axum::Router;
use axum::body::Body;
use axum::routing::get;
use http::{Request, StatusCode, header};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use subscription_api::api::with_middleware;
use subscription_api::{AppState, create_router};
use tower::ServiceExt;

const SECRET: &str = "integration-test-secret";

fn app() -> Router {
    create_router(AppState::in_memory(SECRET), Duration::from_secs(30))
}

async fn call(
    app: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

/// Register then log in; returns (user id, token)
async fn signup(app: &Router, name: &str, email: &str) -> (String, String) {
    let (status, body) = call(
        app,
        "POST",
        "/api/v1/auth/register",
        None,
        Some(json!({ "name": name, "email": email, "password": "secret123" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    let id = body["data"]["id"].as_str().unwrap().to_string();

    let (status, body) = call(
        app,
        "POST",
        "/api/v1/auth/login",
        None,
        Some(json!({ "email": email, "password": "secret123" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    (id, body["data"]["token"].as_str().unwrap().to_string())
}

async fn create_plan(app: &Router, token: &str, name: &str, price: f64) -> String {
    let (status, body) = call(
        app,
        "POST",
        "/api/v1/plans",
        Some(token),
        Some(json!({
            "name": name,
            "description": format!("{name} tier for testing"),
            "price": price,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    body["data"]["id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_health() {
    let app = app();
    let (status, body) = call(&app, "GET", "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["service"], "subscription-api");
}

#[tokio::test]
async fn test_register_login_and_profile() {
    let app = app();
    let (id, token) = signup(&app, "Ana", "Ana@Example.com").await;

    let (status, body) = call(&app, "GET", "/api/v1/profile", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["id"], id.as_str());
    assert_eq!(body["data"]["email"], "ana@example.com");
    assert!(body["data"].get("password_hash").is_none());

    let (status, body) = call(
        &app,
        "POST",
        "/api/v1/auth/register",
        None,
        Some(json!({ "name": "Other", "email": "ana@example.com", "password": "secret123" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["success"], false);
    assert_eq!(body["code"], 3002);

    let (status, body) = call(
        &app,
        "POST",
        "/api/v1/auth/login",
        None,
        Some(json!({ "email": "ana@example.com", "password": "wrong-password" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], 1002);
}

#[tokio::test]
async fn test_register_validation() {
    let app = app();
    let (status, body) = call(
        &app,
        "POST",
        "/api/v1/auth/register",
        None,
        Some(json!({ "name": "A", "email": "a@x.com", "password": "secret123" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["details"]["field"], "name");

    let (status, body) = call(
        &app,
        "POST",
        "/api/v1/auth/register",
        None,
        Some(json!({ "name": "Ana" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn test_protected_routes_need_token() {
    let app = app();
    let (status, body) = call(&app, "GET", "/api/v1/profile", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], 1001);

    let (status, _) = call(&app, "GET", "/api/v1/subscriptions", Some("not-a-jwt"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // Reads stay public on paths that also carry protected methods
    let (status, _) = call(&app, "GET", "/api/v1/plans", None, None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = call(
        &app,
        "POST",
        "/api/v1/plans",
        None,
        Some(json!({ "name": "Basic", "description": "Entry level plan", "price": 9.99 })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_plan_pagination() {
    let app = app();
    let (_, token) = signup(&app, "Admin", "admin@example.com").await;
    for i in 0..25 {
        create_plan(&app, &token, &format!("Plan {i:02}"), 1.0 + i as f64).await;
    }

    let (status, body) = call(&app, "GET", "/api/v1/plans?page=1&limit=10", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().unwrap().len(), 10);
    assert_eq!(body["meta"]["total"], 25);
    assert_eq!(body["meta"]["total_pages"], 3);
    assert_eq!(body["meta"]["has_next"], true);
    assert_eq!(body["meta"]["has_previous"], false);
    assert_eq!(body["data"][0]["name"], "Plan 00");

    let (_, body) = call(&app, "GET", "/api/v1/plans?page=3&limit=10", None, None).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 5);
    assert_eq!(body["meta"]["has_next"], false);

    // Garbage paging falls back to defaults
    let (status, body) = call(&app, "GET", "/api/v1/plans?page=abc&limit=-3", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["meta"]["page"], 1);
    assert_eq!(body["meta"]["limit"], 10);
}

#[tokio::test]
async fn test_subscription_lifecycle() {
    let app = app();
    let (user_id, token) = signup(&app, "Ana", "ana@example.com").await;
    let plan_id = create_plan(&app, &token, "Basic", 9.99).await;

    let (status, body) = call(
        &app,
        "POST",
        "/api/v1/subscriptions",
        Some(&token),
        Some(json!({ "user_id": user_id, "plan_id": plan_id, "start_date": "2026-01-31" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    let sub_id = body["data"]["id"].as_str().unwrap().to_string();
    assert_eq!(body["data"]["state"], "active");
    assert_eq!(body["data"]["start_date"], "2026-01-31T00:00:00Z");
    assert_eq!(body["data"]["end_date"], "2026-03-03T00:00:00Z");
    assert_eq!(body["data"]["plan"]["name"], "Basic");

    let (status, body) = call(
        &app,
        "POST",
        "/api/v1/subscriptions",
        Some(&token),
        Some(json!({ "user_id": user_id, "plan_id": plan_id })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], 5002);

    // Plan with an active subscription cannot be deleted
    let (status, body) = call(
        &app,
        "DELETE",
        &format!("/api/v1/plans/{plan_id}"),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], 4003);

    let (status, body) = call(&app, "GET", "/api/v1/my-subscriptions", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["meta"]["total"], 1);
    assert_eq!(body["data"][0]["id"], sub_id.as_str());

    let (status, body) = call(
        &app,
        "GET",
        "/api/v1/subscriptions/details",
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"][0]["user"]["email"], "ana@example.com");
    assert_eq!(body["data"][0]["plan"]["id"], plan_id.as_str());

    let uri = format!("/api/v1/subscriptions/{sub_id}");
    let (status, body) = call(&app, "DELETE", &uri, Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["state"], "cancelled");
    assert_eq!(body["data"]["is_current"], false);

    // Cancelling again is accepted and leaves the record cancelled
    let (status, body) = call(&app, "DELETE", &uri, Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["state"], "cancelled");

    // Cancelled records cannot change state
    let (status, body) = call(
        &app,
        "PUT",
        &uri,
        Some(&token),
        Some(json!({ "state": "active" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], 5005);

    // Nothing active any more: the plan can go
    let (status, _) = call(
        &app,
        "DELETE",
        &format!("/api/v1/plans/{plan_id}"),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let (_, body) = call(&app, "GET", "/api/v1/plans/active", None, None).await;
    assert_eq!(body["meta"]["total"], 0);
}

#[tokio::test]
async fn test_invalid_ids() {
    let app = app();
    let (_, token) = signup(&app, "Ana", "ana@example.com").await;

    let (status, body) = call(&app, "GET", "/api/v1/users/not-a-uuid", None, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], 7);

    let (status, body) = call(
        &app,
        "GET",
        "/api/v1/subscriptions/00000000-0000-0000-0000-000000000000",
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], 5001);
}

#[tokio::test]
async fn test_user_search_and_soft_delete() {
    let app = app();
    let (ana_id, token) = signup(&app, "Ana Lopez", "ana@example.com").await;
    signup(&app, "Bruno", "bruno@example.com").await;

    let (status, body) = call(&app, "GET", "/api/v1/users/search?q=LOPEZ", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["meta"]["total"], 1);
    assert_eq!(body["data"][0]["id"], ana_id.as_str());

    let (status, _) = call(
        &app,
        "DELETE",
        &format!("/api/v1/users/{ana_id}"),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = call(&app, "GET", &format!("/api/v1/users/{ana_id}"), None, None).await;
    assert_eq!(body["data"]["active"], false);

    let (status, body) = call(
        &app,
        "POST",
        "/api/v1/auth/login",
        None,
        Some(json!({ "email": "ana@example.com", "password": "secret123" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], 1005);
}

#[tokio::test]
async fn test_subscription_end_before_start_rejected() {
    let app = app();
    let (user_id, token) = signup(&app, "Ana", "ana@example.com").await;
    let plan_id = create_plan(&app, &token, "Basic", 9.99).await;

    let (status, body) = call(
        &app,
        "POST",
        "/api/v1/subscriptions",
        Some(&token),
        Some(json!({
            "user_id": user_id,
            "plan_id": plan_id,
            "start_date": "2030-01-01",
            "end_date": "2020-01-01",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], 2);
    assert_eq!(body["details"]["field"], "end_date");

    let (_, body) = call(&app, "GET", "/api/v1/my-subscriptions", Some(&token), None).await;
    assert_eq!(body["meta"]["total"], 0);
}

#[tokio::test]
async fn test_unknown_route_uses_envelope() {
    let app = app();
    for uri in ["/api/v1/nope", "/nowhere"] {
        let (status, body) = call(&app, "GET", uri, None, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["success"], false);
        assert_eq!(body["code"], 3);
        assert_eq!(body["error"], "not_found");
    }
}

#[tokio::test]
async fn test_slow_request_times_out_with_envelope() {
    let slow = Router::new().route(
        "/slow",
        get(|| async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            "late"
        }),
    );
    let app = with_middleware(slow, Duration::from_millis(20))
        .with_state(AppState::in_memory(SECRET));

    let (status, body) = call(&app, "GET", "/slow", None, None).await;
    assert_eq!(status, StatusCode::REQUEST_TIMEOUT);
    assert_eq!(body["success"], false);
    assert_eq!(body["code"], 9004);
    assert_eq!(body["error"], "timeout");
}

#[tokio::test]
async fn test_plan_price_must_fit_two_decimals() {
    let app = app();
    let (_, token) = signup(&app, "Admin", "admin@example.com").await;

    let (status, body) = call(
        &app,
        "POST",
        "/api/v1/plans",
        Some(&token),
        Some(json!({ "name": "Odd", "description": "Sub-cent pricing tier", "price": 9.999 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["details"]["field"], "price");
}
