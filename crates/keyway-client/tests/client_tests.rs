//! Integration tests for the Keyway API client.
//!
//! Each test binds an axum mock backend on an ephemeral local port and drives
//! the real client against it.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use keyway_client::{ApiClient, ApiError, Credentials, KeywayClient, Method, Payload};
use keyway_core::models::{NewSecret, Permission, Plan, SecretUpdate};
use keyway_core::{derived, ConsoleConfig};
use serde_json::{json, Value};
use tokio::net::TcpListener;

/// Serve `router` on `127.0.0.1:0` and return its base URL.
async fn spawn_backend(router: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{addr}")
}

fn client_for(base_url: &str, credentials: Credentials) -> KeywayClient {
    let config = ConsoleConfig::new(base_url).unwrap();
    KeywayClient::with_timeout(&config, credentials, Duration::from_secs(5)).unwrap()
}

fn envelope(data: Value) -> Json<Value> {
    Json(json!({ "data": data, "meta": { "requestId": "req_test" } }))
}

async fn list_vaults() -> Json<Value> {
    envelope(json!([
        {
            "id": "v1",
            "repoFullName": "acme/api",
            "repoAvatar": "https://avatars.example/acme",
            "permission": "admin",
            "environments": ["development", "production"],
            "secretCount": 5,
            "isPrivate": true,
            "isReadOnly": true,
            "readonlyReason": "plan_limit_exceeded",
            "updatedAt": "2025-06-01T12:00:00Z",
            "billingInternal": { "ignored": true }
        },
        {
            "id": "v2",
            "repoFullName": "ACME/web",
            "permission": "read",
            "updatedAt": "2025-06-02T12:00:00Z",
            "createdAt": "2025-01-01T00:00:00Z"
        },
        {
            "id": "v3",
            "repoFullName": "zeta/tools",
            "permission": "write",
            "syncs": [{ "provider": "vercel", "projectId": "prj_1", "lastSyncedAt": null }],
            "updatedAt": "2025-06-03T12:00:00Z"
        }
    ]))
}

#[tokio::test]
async fn vault_list_is_translated_and_groupable() {
    let base = spawn_backend(Router::new().route("/v1/vaults", get(list_vaults))).await;
    let client = client_for(&base, Credentials::Anonymous);

    let vaults = client.vaults().list().await.unwrap();
    assert_eq!(vaults.len(), 3);

    let first = &vaults[0];
    assert_eq!(first.repository.full_name(), "acme/api");
    assert_eq!(first.created_at, first.updated_at);
    assert!(first.is_plan_limited());
    assert_eq!(vaults[1].permission, Permission::Read);
    assert_ne!(vaults[1].created_at, vaults[1].updated_at);

    assert_eq!(derived::count_plan_limited(&vaults), 1);
    assert!(derived::has_stale_sync(&vaults[2]));

    let groups = derived::group_vaults(vaults, "Acme");
    assert_eq!(groups.len(), 2);
    assert_eq!(groups[0].owner, "acme");
    assert_eq!(groups[0].vaults.len(), 2);
    assert_eq!(groups[1].owner_key, "zeta");
}

#[tokio::test]
async fn not_found_detail_becomes_error_message() {
    let router = Router::new().route(
        "/v1/vaults/acme/missing",
        get(|| async { (StatusCode::NOT_FOUND, Json(json!({ "detail": "Not found" }))) }),
    );
    let base = spawn_backend(router).await;
    let client = client_for(&base, Credentials::Anonymous);

    let err = client.vaults().get("acme", "missing").await.unwrap_err();
    assert_eq!(err.to_string(), "Not found");
    assert_eq!(err.status(), Some(404));
    assert!(!err.is_retryable());
}

#[tokio::test]
async fn message_field_and_synthesized_fallback() {
    let router = Router::new()
        .route(
            "/v1/orgs",
            get(|| async {
                (StatusCode::FORBIDDEN, Json(json!({ "message": "Organization access revoked" })))
            }),
        )
        .route(
            "/v1/users/me",
            get(|| async { (StatusCode::BAD_GATEWAY, "<html>upstream down</html>") }),
        );
    let base = spawn_backend(router).await;
    let client = client_for(&base, Credentials::Anonymous);

    let err = client.orgs().list().await.unwrap_err();
    assert_eq!(err.to_string(), "Organization access revoked");

    let err = client.users().me().await.unwrap_err();
    assert_eq!(err.to_string(), "Request failed: 502");
    assert!(err.is_retryable());
}

#[tokio::test]
async fn no_content_resolves_to_explicit_no_value() {
    let router = Router::new().route(
        "/v1/vaults/acme/api",
        axum::routing::delete(|| async { StatusCode::NO_CONTENT }),
    );
    let base = spawn_backend(router).await;
    let client = client_for(&base, Credentials::Anonymous);

    let payload = client
        .transport()
        .send(Method::DELETE, "/v1/vaults/acme/api")
        .await
        .unwrap();
    assert_eq!(payload, Payload::NoContent);

    client.vaults().delete("acme", "api").await.unwrap();
}

#[tokio::test]
async fn json_null_body_is_not_no_content() {
    let router = Router::new().route("/v1/null", get(|| async { Json(Value::Null) }));
    let base = spawn_backend(router).await;
    let api = ApiClient::new(&base, Credentials::Anonymous, Duration::from_secs(5)).unwrap();

    let payload = api.send(Method::GET, "/v1/null").await.unwrap();
    assert_eq!(payload, Payload::Json(Value::Null));
}

async fn echo_content_type(headers: HeaderMap) -> Json<Value> {
    let content_type = headers
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned);
    Json(json!({ "contentType": content_type }))
}

#[tokio::test]
async fn content_type_only_sent_with_body() {
    let router = Router::new().route(
        "/v1/echo",
        get(echo_content_type)
            .post(echo_content_type)
            .delete(echo_content_type),
    );
    let base = spawn_backend(router).await;
    let api = ApiClient::new(&base, Credentials::Anonymous, Duration::from_secs(5)).unwrap();

    for method in [Method::GET, Method::DELETE] {
        let payload = api.send(method, "/v1/echo").await.unwrap();
        assert_eq!(payload, Payload::Json(json!({ "contentType": null })));
    }

    let payload = api
        .send_json(Method::POST, "/v1/echo", &json!({ "name": "x" }))
        .await
        .unwrap();
    assert_eq!(
        payload,
        Payload::Json(json!({ "contentType": "application/json" }))
    );
}

#[tokio::test]
async fn bearer_credentials_are_attached() {
    let router = Router::new().route(
        "/v1/users/me",
        get(|headers: HeaderMap| async move {
            let authorized = headers
                .get("authorization")
                .and_then(|v| v.to_str().ok())
                == Some("Bearer kw_test");
            if authorized {
                envelope(json!({
                    "id": "u1",
                    "githubLogin": "octocat",
                    "avatarUrl": "https://avatars.example/octocat",
                    "plan": "pro"
                }))
                .into_response()
            } else {
                (StatusCode::UNAUTHORIZED, Json(json!({ "detail": "Session expired" })))
                    .into_response()
            }
        }),
    );
    let base = spawn_backend(router).await;

    let me = client_for(&base, Credentials::Bearer("kw_test".to_owned()))
        .users()
        .me()
        .await
        .unwrap();
    assert_eq!(me.login, "octocat");
    assert_eq!(me.plan, Plan::Pro);

    let err = client_for(&base, Credentials::Anonymous)
        .users()
        .me()
        .await
        .unwrap_err();
    assert!(err.is_unauthorized());
    assert_eq!(err.to_string(), "Session expired");
}

#[tokio::test]
async fn wire_shape_mismatch_is_a_translation_error() {
    let router = Router::new()
        .route(
            "/v1/vaults/acme/api",
            get(|| async {
                envelope(json!({
                    "id": "v1",
                    "repoFullName": "acme/api",
                    "permission": "owner",
                    "updatedAt": "2025-06-01T12:00:00Z"
                }))
            }),
        )
        .route(
            "/v1/vaults/acme/bare",
            get(|| async { Json(json!({ "id": "v1" })) }),
        );
    let base = spawn_backend(router).await;
    let client = client_for(&base, Credentials::Anonymous);

    let err = client.vaults().get("acme", "api").await.unwrap_err();
    assert!(matches!(err, ApiError::Translation { .. }), "{err:?}");

    let err = client.vaults().get("acme", "bare").await.unwrap_err();
    assert!(matches!(err, ApiError::Translation { .. }), "{err:?}");
}

#[tokio::test]
async fn secret_create_sends_body_and_translates_response() {
    let router = Router::new().route(
        "/v1/vaults/acme/api/secrets",
        post(|Json(body): Json<Value>| async move {
            (
                StatusCode::CREATED,
                envelope(json!({
                    "id": "s1",
                    "name": body["name"],
                    "environment": body["environment"],
                    "updatedAt": "2025-06-01T12:00:00Z"
                })),
            )
        }),
    );
    let base = spawn_backend(router).await;
    let client = client_for(&base, Credentials::Anonymous);

    let secret = client
        .secrets("acme", "api")
        .create(&NewSecret {
            name: "DATABASE_URL".to_owned(),
            value: "postgres://localhost/app".to_owned(),
            environment: "production".to_owned(),
        })
        .await
        .unwrap();

    assert_eq!(secret.name, "DATABASE_URL");
    assert_eq!(secret.environment, "production");
    assert_eq!(secret.created_at, secret.updated_at);
}

#[tokio::test]
async fn unreachable_backend_is_transport_failure() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let client = client_for(&format!("http://{addr}"), Credentials::Anonymous);
    let err = client.vaults().list().await.unwrap_err();
    assert!(matches!(err, ApiError::Transport(_)), "{err:?}");
    assert!(err.is_retryable());
    assert!(!err.to_string().contains(&addr.to_string()));
}

#[tokio::test]
async fn collaborators_are_sorted_by_contributions() {
    let router = Router::new().route(
        "/v1/vaults/acme/api/contributors",
        get(|| async {
            envelope(json!([
                { "login": "casual", "contributions": 2 },
                { "login": "core", "avatarUrl": "https://avatars.example/core",
                  "htmlUrl": "https://github.com/core", "contributions": 120 },
                { "login": "regular", "htmlUrl": "", "contributions": 17 }
            ]))
        }),
    );
    let base = spawn_backend(router).await;
    let client = client_for(&base, Credentials::Anonymous);

    let collaborators = client.collaborators().list("acme", "api").await.unwrap();
    let logins: Vec<&str> = collaborators.iter().map(|c| c.login.as_str()).collect();
    assert_eq!(logins, ["core", "regular", "casual"]);
    assert_eq!(
        collaborators[0].profile_url.as_deref(),
        Some("https://github.com/core")
    );
    assert_eq!(collaborators[1].profile_url, None);
}

#[tokio::test]
async fn org_connect_posts_login() {
    let router = Router::new().route(
        "/v1/orgs/connect",
        post(|Json(body): Json<Value>| async move {
            envelope(json!({
                "id": "o1",
                "login": body["orgLogin"],
                "plan": "free",
                "role": "owner",
                "vaultCount": 0,
                "memberCount": 4
            }))
        }),
    );
    let base = spawn_backend(router).await;
    let client = client_for(&base, Credentials::Anonymous);

    let org = client.orgs().connect("acme").await.unwrap();
    assert_eq!(org.login, "acme");
    assert_eq!(org.display_name, "acme");
    assert_eq!(org.member_count, 4);
}

#[tokio::test]
async fn empty_secret_update_is_rejected_before_sending() {
    let hits = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&hits);
    let router = Router::new().route(
        "/v1/vaults/acme/api/secrets/s1",
        axum::routing::patch(move || {
            counter.fetch_add(1, Ordering::SeqCst);
            async { StatusCode::NO_CONTENT }
        }),
    );
    let base = spawn_backend(router).await;
    let client = client_for(&base, Credentials::Anonymous);

    let err = client
        .secrets("acme", "api")
        .update("s1", &SecretUpdate::default())
        .await
        .unwrap_err();

    assert!(matches!(err, ApiError::InvalidInput(_)), "{err:?}");
    assert_eq!(err.to_string(), "secret update has no changes");
    assert!(!err.is_retryable());
    assert_eq!(hits.load(Ordering::SeqCst), 0);
}
