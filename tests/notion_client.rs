use std::{
    net::SocketAddr,
    sync::{Arc, Mutex},
    time::Duration,
};

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use quire::{
    application::{
        content::{ContentSource, SourceError},
        mapper::PropertyNames,
    },
    config::NotionSettings,
    domain::{blocks::BlockKind, types::StatusPropertyKind},
    infra::notion::NotionClient,
};
use serde::Deserialize;
use serde_json::{Value, json};
use url::Url;

#[derive(Clone, Default)]
struct Recorded {
    query_bodies: Arc<Mutex<Vec<Value>>>,
    block_cursors: Arc<Mutex<Vec<Option<String>>>>,
}

fn authorized(headers: &HeaderMap) -> bool {
    headers
        .get("authorization")
        .is_some_and(|value| value == "Bearer test-token")
        && headers
            .get("notion-version")
            .is_some_and(|value| value == "2022-06-28")
}

async fn query_database(
    State(recorded): State<Recorded>,
    Path(database_id): Path<String>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    if !authorized(&headers) || database_id != "db-1" {
        return (StatusCode::UNAUTHORIZED, "unauthorized").into_response();
    }
    recorded
        .query_bodies
        .lock()
        .expect("lock")
        .push(body.clone());

    if let Some(clauses) = body["filter"]["and"].as_array() {
        let slug = clauses[1]["rich_text"]["equals"].as_str().unwrap_or_default();
        if slug == "needs-fallback" {
            return (StatusCode::BAD_REQUEST, "no such property").into_response();
        }
        let results = if slug == "hello" {
            vec![json!({ "id": "page-hello" })]
        } else {
            Vec::new()
        };
        return Json(json!({ "results": results, "has_more": false, "next_cursor": null }))
            .into_response();
    }

    let response = match body["start_cursor"].as_str() {
        None => json!({
            "results": [{ "id": "page-1" }, { "id": "page-archived", "archived": true }],
            "has_more": true,
            "next_cursor": "cursor-2"
        }),
        Some("cursor-2") => json!({
            "results": [{ "id": "page-2" }],
            "has_more": false,
            "next_cursor": null
        }),
        Some(_) => return (StatusCode::BAD_REQUEST, "bad cursor").into_response(),
    };
    Json(response).into_response()
}

#[derive(Deserialize)]
struct BlockQuery {
    start_cursor: Option<String>,
    page_size: Option<u32>,
}

async fn block_children(
    State(recorded): State<Recorded>,
    Path(page_id): Path<String>,
    Query(query): Query<BlockQuery>,
) -> Response {
    if page_id == "broken" {
        return (StatusCode::INTERNAL_SERVER_ERROR, "boom").into_response();
    }
    assert_eq!(query.page_size, Some(100));
    recorded
        .block_cursors
        .lock()
        .expect("lock")
        .push(query.start_cursor.clone());

    let response = match query.start_cursor.as_deref() {
        None => json!({
            "results": [{
                "id": "b1",
                "type": "heading_1",
                "heading_1": { "rich_text": [{ "plain_text": "Intro" }] }
            }],
            "has_more": true,
            "next_cursor": "blocks-2"
        }),
        _ => json!({
            "results": [{
                "id": "b2",
                "type": "paragraph",
                "paragraph": { "rich_text": [{ "plain_text": "Hello" }, { "plain_text": "world" }] }
            }],
            "has_more": false,
            "next_cursor": null
        }),
    };
    Json(response).into_response()
}

async fn spawn_stub() -> (SocketAddr, Recorded) {
    let recorded = Recorded::default();
    let app = Router::new()
        .route("/v1/databases/{id}/query", post(query_database))
        .route("/v1/blocks/{id}/children", get(block_children))
        .with_state(recorded.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind stub");
    let addr = listener.local_addr().expect("stub addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("stub server");
    });
    (addr, recorded)
}

fn settings(addr: SocketAddr) -> NotionSettings {
    NotionSettings {
        api_base: Url::parse(&format!("http://{addr}/")).expect("base url"),
        token: Some("test-token".to_string()),
        database_id: Some("db-1".to_string()),
        version: "2022-06-28".to_string(),
        timeout: Duration::from_secs(5),
        status_kind: StatusPropertyKind::Select,
        published_status: "Published".to_string(),
        properties: PropertyNames::default(),
    }
}

#[tokio::test]
async fn published_pages_follow_cursors_and_skip_archived() {
    let (addr, recorded) = spawn_stub().await;
    let client = NotionClient::new(&settings(addr)).expect("client");

    let pages = client.query_published_pages().await.expect("pages");
    let ids: Vec<&str> = pages.iter().map(|page| page.id.as_str()).collect();
    assert_eq!(ids, vec!["page-1", "page-2"]);

    let bodies = recorded.query_bodies.lock().expect("lock").clone();
    assert_eq!(bodies.len(), 2);
    assert_eq!(
        bodies[0]["filter"],
        json!({ "property": "Status", "select": { "equals": "Published" } })
    );
    assert_eq!(bodies[0]["page_size"], 100);
    assert_eq!(bodies[1]["start_cursor"], "cursor-2");
}

#[tokio::test]
async fn blocks_are_fetched_across_pages() {
    let (addr, recorded) = spawn_stub().await;
    let client = NotionClient::new(&settings(addr)).expect("client");

    let blocks = client.fetch_page_blocks("page-1").await.expect("blocks");

    assert_eq!(blocks.len(), 2);
    assert_eq!(blocks[0].kind, BlockKind::Heading1);
    assert_eq!(blocks[1].plain_text(), "Hello world");
    assert_eq!(
        recorded.block_cursors.lock().expect("lock").clone(),
        vec![None, Some("blocks-2".to_string())]
    );
}

#[tokio::test]
async fn slug_lookup_returns_match_or_none() {
    let (addr, _) = spawn_stub().await;
    let client = NotionClient::new(&settings(addr)).expect("client");

    let found = client.fetch_page_by_slug("hello").await.expect("lookup");
    assert_eq!(found.map(|page| page.id), Some("page-hello".to_string()));

    assert!(client.fetch_page_by_slug("absent").await.expect("lookup").is_none());
    assert!(
        client
            .fetch_page_by_slug("needs-fallback")
            .await
            .expect("rejected filter falls back")
            .is_none()
    );
}

#[tokio::test]
async fn upstream_errors_keep_status_and_body() {
    let (addr, _) = spawn_stub().await;
    let client = NotionClient::new(&settings(addr)).expect("client");

    let err = client.fetch_page_blocks("broken").await.expect_err("failure");
    match err {
        SourceError::Status { status, body } => {
            assert_eq!(status, 500);
            assert_eq!(body, "boom");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn missing_credentials_are_rejected() {
    let mut settings = settings("127.0.0.1:9".parse().expect("addr"));
    settings.token = None;
    assert!(NotionClient::new(&settings).is_err());
}
