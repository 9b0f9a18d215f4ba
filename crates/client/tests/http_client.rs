use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, patch};
use axum::{Json, Router};
use serde_json::{Value, json};
use shopcart_client::{ApiError, ClientConfig, HttpShopClient, ShopApi};
use shopcart_core::{CartItem, InventoryItem, ItemId, NewCartItem};

/// Minimal json-server style backend: two collections, integer ids.
#[derive(Default)]
struct Db {
    inventory: Vec<InventoryItem>,
    cart: Vec<CartItem>,
    next_cart_id: u64,
    /// Number of upcoming `GET /inventory` calls answered with 503.
    inventory_outages: u32,
    inventory_gets: u32,
    /// Number of upcoming writes (PATCH, POST or DELETE) answered with 503.
    write_outages: u32,
    writes: Vec<String>,
}

impl Db {
    /// Record a write attempt; true when it should fail with 503.
    fn attempt(&mut self, write: String) -> bool {
        self.writes.push(write);
        if self.write_outages > 0 {
            self.write_outages -= 1;
            return true;
        }
        false
    }
}

type Shared = Arc<Mutex<Db>>;

fn backend(db: Shared) -> Router {
    Router::new()
        .route("/cart", get(list_cart).post(create_cart))
        .route("/cart/:id", patch(patch_cart).delete(delete_cart))
        .route("/inventory", get(list_inventory))
        .route("/inventory/:id", patch(patch_inventory))
        .with_state(db)
}

async fn list_cart(
    State(db): State<Shared>,
    Query(params): Query<HashMap<String, String>>,
) -> Json<Vec<CartItem>> {
    let db = db.lock().unwrap();
    let lines = db
        .cart
        .iter()
        .filter(|line| params.get("content").is_none_or(|c| *c == line.content))
        .cloned()
        .collect();
    Json(lines)
}

async fn create_cart(State(db): State<Shared>, Json(item): Json<NewCartItem>) -> impl IntoResponse {
    let mut db = db.lock().unwrap();
    if db.attempt(format!("POST /cart {}", item.content)) {
        return (StatusCode::SERVICE_UNAVAILABLE, Json(json!({ "error": "unavailable" })));
    }
    db.next_cart_id += 1;
    let line = CartItem::new(db.next_cart_id, item.content, item.amount);
    db.cart.push(line.clone());
    (StatusCode::CREATED, Json(json!(line)))
}

async fn patch_cart(
    State(db): State<Shared>,
    Path(id): Path<u64>,
    Json(body): Json<Value>,
) -> impl IntoResponse {
    let mut db = db.lock().unwrap();
    if db.attempt(format!("PATCH /cart/{id} {body}")) {
        return (StatusCode::SERVICE_UNAVAILABLE, Json(json!({ "error": "unavailable" })));
    }
    let amount = body["amount"].as_u64().unwrap_or_default();
    match db.cart.iter_mut().find(|line| line.id == ItemId::new(id)) {
        Some(line) => {
            line.amount = amount;
            (StatusCode::OK, Json(json!(line)))
        }
        None => (StatusCode::NOT_FOUND, Json(json!({}))),
    }
}

async fn delete_cart(State(db): State<Shared>, Path(id): Path<u64>) -> impl IntoResponse {
    let mut db = db.lock().unwrap();
    if db.attempt(format!("DELETE /cart/{id}")) {
        return (StatusCode::SERVICE_UNAVAILABLE, Json(json!({ "error": "unavailable" })));
    }
    db.cart.retain(|line| line.id != ItemId::new(id));
    (StatusCode::OK, Json(json!({})))
}

async fn list_inventory(State(db): State<Shared>) -> impl IntoResponse {
    let mut db = db.lock().unwrap();
    db.inventory_gets += 1;
    if db.inventory_outages > 0 {
        db.inventory_outages -= 1;
        return (StatusCode::SERVICE_UNAVAILABLE, Json(json!({ "error": "unavailable" })));
    }
    (StatusCode::OK, Json(json!(db.inventory)))
}

async fn patch_inventory(
    State(db): State<Shared>,
    Path(id): Path<u64>,
    Json(body): Json<Value>,
) -> impl IntoResponse {
    let mut db = db.lock().unwrap();
    if db.attempt(format!("PATCH /inventory/{id} {body}")) {
        return (StatusCode::SERVICE_UNAVAILABLE, Json(json!({ "error": "unavailable" })));
    }
    let amount = body["amount"].as_u64().unwrap_or_default();
    match db.inventory.iter_mut().find(|item| item.id == ItemId::new(id)) {
        Some(item) => {
            item.amount = amount;
            (StatusCode::OK, Json(json!(item)))
        }
        None => (StatusCode::NOT_FOUND, Json(json!({}))),
    }
}

struct TestServer {
    base_url: String,
    db: Shared,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn spawn(inventory: Vec<InventoryItem>) -> Self {
        let db: Shared = Arc::new(Mutex::new(Db {
            inventory,
            ..Db::default()
        }));
        Self::serve(backend(db.clone()), db).await
    }

    async fn serve(app: Router, db: Shared) -> Self {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}", addr);

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { base_url, db, handle }
    }

    fn client(&self) -> HttpShopClient {
        let config = ClientConfig::new(&self.base_url).with_retries(2, Duration::from_millis(5));
        HttpShopClient::new(config).unwrap()
    }

    fn writes(&self) -> Vec<String> {
        self.db.lock().unwrap().writes.clone()
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

fn stock() -> Vec<InventoryItem> {
    vec![
        InventoryItem::new(1, "apple", 5),
        InventoryItem::new(2, "green apple", 2),
    ]
}

#[tokio::test]
async fn reads_both_collections() {
    let server = TestServer::spawn(stock()).await;
    let client = server.client();

    assert_eq!(client.get_inventory().await.unwrap(), stock());
    assert!(client.get_cart().await.unwrap().is_empty());
    assert_eq!(client.get_inventory().await.unwrap(), client.get_inventory().await.unwrap());
}

#[tokio::test]
async fn add_to_cart_posts_then_patches_with_merged_amount() {
    let server = TestServer::spawn(stock()).await;
    let client = server.client();

    let created = client.add_to_cart(&NewCartItem::new("apple", 2).unwrap()).await.unwrap();
    let merged = client.add_to_cart(&NewCartItem::new("apple", 3).unwrap()).await.unwrap();

    assert_eq!(created.id, merged.id);
    assert_eq!(merged.amount, 5);
    assert_eq!(
        server.writes(),
        vec![
            "POST /cart apple".to_string(),
            format!("PATCH /cart/{} {{\"amount\":5}}", created.id),
        ]
    );
    assert_eq!(client.get_cart().await.unwrap(), vec![CartItem::new(created.id, "apple", 5)]);
}

#[tokio::test]
async fn content_filter_is_query_encoded() {
    let server = TestServer::spawn(stock()).await;
    let client = server.client();

    client.add_to_cart(&NewCartItem::new("green apple", 1).unwrap()).await.unwrap();
    let found = client.find_cart_by_content("green apple").await.unwrap();

    assert_eq!(found.len(), 1);
    assert_eq!(found[0].content, "green apple");
}

#[tokio::test]
async fn add_to_cart_merges_into_first_line_the_backend_matched() {
    // A backend whose content filter ignores case.
    let db: Shared = Arc::new(Mutex::new(Db {
        cart: vec![CartItem::new(7, "Apple", 1), CartItem::new(8, "APPLE", 9)],
        ..Db::default()
    }));
    let app = Router::new()
        .route(
            "/cart",
            get(|State(db): State<Shared>, Query(params): Query<HashMap<String, String>>| async move {
                let wanted = params.get("content").map(|c| c.to_lowercase());
                let db = db.lock().unwrap();
                let lines: Vec<CartItem> = db
                    .cart
                    .iter()
                    .filter(|line| wanted.as_ref().is_none_or(|c| *c == line.content.to_lowercase()))
                    .cloned()
                    .collect();
                Json(lines)
            })
            .post(create_cart),
        )
        .route("/cart/:id", patch(patch_cart))
        .with_state(db.clone());
    let server = TestServer::serve(app, db).await;

    let merged = server.client().add_to_cart(&NewCartItem::new("apple", 2).unwrap()).await.unwrap();

    assert_eq!(merged, CartItem::new(7, "Apple", 3));
    assert_eq!(server.writes(), vec!["PATCH /cart/7 {\"amount\":3}".to_string()]);
}

#[tokio::test]
async fn update_inventory_patches_amount() {
    let server = TestServer::spawn(stock()).await;
    let client = server.client();

    let updated = client.update_inventory(ItemId::new(1), 0).await.unwrap();

    assert_eq!(updated, InventoryItem::new(1, "apple", 0));
    assert_eq!(server.writes(), vec!["PATCH /inventory/1 {\"amount\":0}".to_string()]);
}

#[tokio::test]
async fn checkout_deletes_every_line() {
    let server = TestServer::spawn(stock()).await;
    let client = server.client();
    client.add_to_cart(&NewCartItem::new("apple", 1).unwrap()).await.unwrap();
    client.add_to_cart(&NewCartItem::new("pear", 1).unwrap()).await.unwrap();

    assert_eq!(client.checkout().await.unwrap(), 2);
    assert!(client.get_cart().await.unwrap().is_empty());
    assert_eq!(client.get_inventory().await.unwrap(), stock());
}

#[tokio::test]
async fn non_2xx_is_a_server_error() {
    let server = TestServer::spawn(stock()).await;
    let client = server.client();

    match client.update_inventory(ItemId::new(99), 1).await {
        Err(ApiError::Server { status: 404, .. }) => {}
        other => panic!("expected 404 server error, got {other:?}"),
    }
}

#[tokio::test]
async fn gets_are_retried_through_transient_outages() {
    let server = TestServer::spawn(stock()).await;
    server.db.lock().unwrap().inventory_outages = 2;

    assert_eq!(server.client().get_inventory().await.unwrap(), stock());
    assert_eq!(server.db.lock().unwrap().inventory_gets, 3);
}

#[tokio::test]
async fn gets_give_up_after_configured_retries() {
    let server = TestServer::spawn(stock()).await;
    server.db.lock().unwrap().inventory_outages = 10;

    match server.client().get_inventory().await {
        Err(ApiError::Server { status: 503, .. }) => {}
        other => panic!("expected 503, got {other:?}"),
    }
    assert_eq!(server.db.lock().unwrap().inventory_gets, 3);
}

#[tokio::test]
async fn inventory_patch_is_not_retried() {
    let server = TestServer::spawn(stock()).await;
    server.db.lock().unwrap().write_outages = 1;

    match server.client().update_inventory(ItemId::new(1), 4).await {
        Err(ApiError::Server { status: 503, .. }) => {}
        other => panic!("expected 503, got {other:?}"),
    }
    assert_eq!(server.writes(), vec!["PATCH /inventory/1 {\"amount\":4}".to_string()]);
    assert_eq!(server.db.lock().unwrap().inventory[0].amount, 5);
}

#[tokio::test]
async fn cart_post_is_not_retried() {
    let server = TestServer::spawn(stock()).await;
    server.db.lock().unwrap().write_outages = 1;
    let client = server.client();

    match client.add_to_cart(&NewCartItem::new("apple", 2).unwrap()).await {
        Err(ApiError::Server { status: 503, .. }) => {}
        other => panic!("expected 503, got {other:?}"),
    }
    assert_eq!(server.writes(), vec!["POST /cart apple".to_string()]);
    assert!(client.get_cart().await.unwrap().is_empty());
}

#[tokio::test]
async fn cart_delete_is_not_retried() {
    let server = TestServer::spawn(stock()).await;
    let client = server.client();
    let line = client.add_to_cart(&NewCartItem::new("apple", 2).unwrap()).await.unwrap();
    server.db.lock().unwrap().write_outages = 1;

    match client.delete_from_cart(line.id).await {
        Err(ApiError::Server { status: 503, .. }) => {}
        other => panic!("expected 503, got {other:?}"),
    }
    let deletes = server.writes().iter().filter(|w| w.starts_with("DELETE")).count();
    assert_eq!(deletes, 1);
    assert_eq!(client.get_cart().await.unwrap(), vec![line]);
}

#[tokio::test]
async fn malformed_json_is_a_decode_error() {
    let app = Router::new().route("/cart", get(|| async { "definitely not json" }));
    let server = TestServer::serve(app, Arc::default()).await;

    match server.client().get_cart().await {
        Err(ApiError::Decode(_)) => {}
        other => panic!("expected decode error, got {other:?}"),
    }
}

#[tokio::test]
async fn unreachable_host_is_a_network_error() {
    // Reserve a port, then close it so nothing is listening there.
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let config = ClientConfig::new(format!("http://{addr}")).with_retries(0, Duration::ZERO);
    let client = HttpShopClient::new(config).unwrap();

    match client.get_cart().await {
        Err(ApiError::Network(_)) => {}
        other => panic!("expected network error, got {other:?}"),
    }
}
