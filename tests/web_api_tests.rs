//! HTTP API tests through the full router, backed by the in-memory store

mod common;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

use common::*;
use shigu_core::config::{ShiguConfig, StorageBackend};
use shigu_core::store::MemoryStore;
use shigu_core::web::{create_app, state::AppState};
use shigu_core::SequenceScope;

struct TestServer {
    router: axum::Router,
    store: MemoryStore,
}

impl TestServer {
    fn new() -> Self {
        let mut config = ShiguConfig::default();
        config.database.backend = StorageBackend::Memory;
        config.sequencing.retry_backoff_ms = 1;

        let store = MemoryStore::default();
        let router = create_app(AppState::with_memory(store.clone(), config));
        Self { router, store }
    }
}

async fn json_request(
    router: &axum::Router,
    method: &str,
    uri: &str,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);

    let body = match body {
        Some(v) => {
            builder = builder.header("Content-Type", "application/json");
            Body::from(serde_json::to_vec(&v).unwrap())
        }
        None => Body::empty(),
    };

    let request = builder.body(body).unwrap();
    let response = router.clone().oneshot(request).await.unwrap();

    let status = response.status();
    let body_bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();

    let json: Value = if body_bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body_bytes).unwrap_or(Value::Null)
    };

    (status, json)
}

async fn create_goods(server: &TestServer, name: &str) -> Uuid {
    let (status, body) = json_request(
        &server.router,
        "POST",
        "/api/goods",
        Some(json!({ "name": name })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    body["id"].as_str().unwrap().parse().unwrap()
}

async fn create_showcase(server: &TestServer, name: &str) -> Uuid {
    let (status, body) = json_request(
        &server.router,
        "POST",
        "/api/showcases",
        Some(json!({ "name": name, "is_public": true })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    body["id"].as_str().unwrap().parse().unwrap()
}

fn ids_of(items: &Value, field: &str) -> Vec<String> {
    items
        .as_array()
        .unwrap()
        .iter()
        .map(|item| item[field].as_str().unwrap().to_string())
        .collect()
}

#[tokio::test]
async fn test_health_check() {
    let server = TestServer::new();

    let (status, body) = json_request(&server.router, "GET", "/health", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["backend"], "memory");
    assert_eq!(body["moves"]["requested"], 0);
}

#[tokio::test]
async fn test_new_goods_are_listed_first() {
    let server = TestServer::new();
    let first = create_goods(&server, "acrylic stand").await;
    let second = create_goods(&server, "can badge").await;

    let (status, body) = json_request(&server.router, "GET", "/api/goods", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        ids_of(&body["items"], "id"),
        vec![second.to_string(), first.to_string()]
    );
    assert_eq!(body["pagination"]["total_count"], 2);
    assert_eq!(body["pagination"]["has_next"], false);
}

#[tokio::test]
async fn test_goods_pagination() {
    let server = TestServer::new();
    for i in 0..5 {
        create_goods(&server, &format!("goods-{i}")).await;
    }

    let (status, body) =
        json_request(&server.router, "GET", "/api/goods?page=2&per_page=2", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["items"].as_array().unwrap().len(), 2);
    assert_eq!(body["pagination"]["total_pages"], 3);
    assert_eq!(body["pagination"]["has_next"], true);
    assert_eq!(body["pagination"]["has_previous"], true);
}

#[tokio::test]
async fn test_create_goods_validation() {
    let server = TestServer::new();

    let (status, body) = json_request(
        &server.router,
        "POST",
        "/api/goods",
        Some(json!({ "name": "  " })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "BAD_REQUEST");
}

#[tokio::test]
async fn test_move_goods_endpoint() {
    let server = TestServer::new();
    let rows = seed_goods(&server.store, &[("A", 0), ("B", 1000), ("C", 2000), ("D", -1000)]).await;
    let (a, d) = (&rows[0], &rows[3]);

    let (status, body) = json_request(
        &server.router,
        "POST",
        &format!("/api/goods/{}/move", d.id),
        Some(json!({ "anchor_id": a.id, "position": "after" })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], d.id.to_string());
    assert_eq!(body["new_order"], 500);
    assert_eq!(body["moved"], true);

    let (_, listing) = json_request(&server.router, "GET", "/api/goods", None).await;
    assert_eq!(
        ids_of(&listing["items"], "id"),
        vec![
            rows[0].id.to_string(),
            rows[3].id.to_string(),
            rows[1].id.to_string(),
            rows[2].id.to_string()
        ]
    );
}

#[tokio::test]
async fn test_move_onto_itself_reports_not_moved() {
    let server = TestServer::new();
    let id = create_goods(&server, "solo").await;

    let (status, body) = json_request(
        &server.router,
        "POST",
        &format!("/api/goods/{id}/move"),
        Some(json!({ "anchor_id": id, "position": "before" })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["moved"], false);
    assert_eq!(body["new_order"], -1000);
}

#[tokio::test]
async fn test_move_unknown_goods_is_not_found() {
    let server = TestServer::new();
    let anchor = create_goods(&server, "anchor").await;

    let (status, body) = json_request(
        &server.router,
        "POST",
        &format!("/api/goods/{}/move", Uuid::new_v4()),
        Some(json!({ "anchor_id": anchor, "position": "after" })),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "NOT_FOUND");
}

#[tokio::test]
async fn test_malformed_id_is_bad_request() {
    let server = TestServer::new();

    let (status, body) = json_request(&server.router, "GET", "/api/goods/not-a-uuid", None).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "INVALID_UUID");
}

#[tokio::test]
async fn test_showcase_membership_flow() {
    let server = TestServer::new();
    let showcase = create_showcase(&server, "summer event").await;
    let first = create_goods(&server, "keychain").await;
    let second = create_goods(&server, "poster").await;

    for goods_id in [first, second] {
        let (status, _) = json_request(
            &server.router,
            "POST",
            &format!("/api/showcases/{showcase}/add-goods"),
            Some(json!({ "goods_id": goods_id })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (status, body) = json_request(
        &server.router,
        "POST",
        &format!("/api/showcases/{showcase}/add-goods"),
        Some(json!({ "goods_id": first })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["retryable"], false);

    let (status, _) = json_request(
        &server.router,
        "POST",
        &format!("/api/showcases/{showcase}/add-goods"),
        Some(json!({ "goods_id": Uuid::new_v4() })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // newest member first
    let (status, body) = json_request(
        &server.router,
        "GET",
        &format!("/api/showcases/{showcase}/goods"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        ids_of(&body["items"], "goods_id"),
        vec![second.to_string(), first.to_string()]
    );

    let (status, body) = json_request(
        &server.router,
        "POST",
        &format!("/api/showcases/{showcase}/move-goods"),
        Some(json!({ "goods_id": second, "anchor_goods_id": first, "position": "after" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], second.to_string());
    assert_eq!(body["moved"], true);

    let (_, body) = json_request(
        &server.router,
        "GET",
        &format!("/api/showcases/{showcase}/goods"),
        None,
    )
    .await;
    assert_eq!(
        ids_of(&body["items"], "goods_id"),
        vec![first.to_string(), second.to_string()]
    );

    // the global goods order did not change
    let (_, listing) = json_request(&server.router, "GET", "/api/goods", None).await;
    assert_eq!(
        ids_of(&listing["items"], "id"),
        vec![second.to_string(), first.to_string()]
    );

    let (status, body) = json_request(
        &server.router,
        "POST",
        &format!("/api/showcases/{showcase}/remove-goods"),
        Some(json!({ "goods_id": first })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["removed"], true);

    let (status, _) = json_request(
        &server.router,
        "POST",
        &format!("/api/showcases/{showcase}/remove-goods"),
        Some(json!({ "goods_id": first })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_showcase_move_requires_membership() {
    let server = TestServer::new();
    let showcase = Uuid::new_v4();
    let goods = seed_goods(&server.store, &[("a", 0), ("b", 1000)]).await;
    let (status, _) = json_request(
        &server.router,
        "POST",
        &format!("/api/showcases/{showcase}/move-goods"),
        Some(json!({ "goods_id": goods[0].id, "anchor_goods_id": goods[1].id, "position": "after" })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let real = create_showcase(&server, "shelf").await;
    seed_membership(&server.store, real, &[(&goods[0], 0)]).await;

    let (status, body) = json_request(
        &server.router,
        "POST",
        &format!("/api/showcases/{real}/move-goods"),
        Some(json!({ "goods_id": goods[0].id, "anchor_goods_id": goods[1].id, "position": "after" })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "NOT_FOUND");
    assert_eq!(
        sequence_ids(&server.store, SequenceScope::Showcase(real)).await,
        vec![goods[0].id]
    );
}

#[tokio::test]
async fn test_delete_showcase_and_goods() {
    let server = TestServer::new();
    let showcase = create_showcase(&server, "temporary").await;
    let goods = create_goods(&server, "sticker").await;

    let (status, _) = json_request(
        &server.router,
        "DELETE",
        &format!("/api/goods/{goods}"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) =
        json_request(&server.router, "GET", &format!("/api/goods/{goods}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = json_request(
        &server.router,
        "DELETE",
        &format!("/api/showcases/{showcase}"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = json_request(
        &server.router,
        "GET",
        &format!("/api/showcases/{showcase}/goods"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
