//! `HttpStorefront` against an in-process axum server.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    routing::{get, patch, post},
    Json, Router,
};
use serde_json::{json, Value};

use sokoni::api::{fetch_banners, HttpStorefront, StorefrontApi};
use sokoni::auth::AuthContext;
use sokoni::customers::{CustomerStatusRepository, HttpCustomerStatusRepository};
use sokoni::net::ApiError;

#[derive(Clone, Default)]
struct Seen {
    auth: Arc<Mutex<Vec<String>>>,
    hits: Arc<Mutex<Vec<String>>>,
}

async fn categories(State(seen): State<Seen>, headers: HeaderMap) -> Json<Value> {
    if let Some(v) = headers.get("authorization").and_then(|v| v.to_str().ok()) {
        seen.auth.lock().unwrap().push(v.to_string());
    }
    // paginated envelope
    Json(json!({
        "data": [
            {"id": 1, "slug": "fruits", "name": "Fruits"},
            {"id": 2, "slug": "dairy", "name": "Dairy", "products_count": 7}
        ],
        "current_page": 1,
        "last_page": 1,
        "total": 2
    }))
}

async fn products(Query(q): Query<HashMap<String, String>>) -> Result<Json<Value>, StatusCode> {
    match q.get("category_id").map(String::as_str) {
        Some("1") => Ok(Json(json!([
            {"id": 10, "name": "Mango", "price": "120.50", "sale_price": 99, "unit": "kg"}
        ]))),
        Some("2") => Err(StatusCode::TOO_MANY_REQUESTS),
        _ => Err(StatusCode::NOT_FOUND),
    }
}

async fn banners() -> StatusCode {
    StatusCode::INTERNAL_SERVER_ERROR
}

async fn impression(State(seen): State<Seen>, Path(id): Path<u64>) -> StatusCode {
    seen.hits.lock().unwrap().push(format!("impression:{id}"));
    StatusCode::NO_CONTENT
}

async fn customer_status(Path(id): Path<u64>, Json(body): Json<Value>) -> Result<Json<Value>, StatusCode> {
    if id == 404 {
        return Err(StatusCode::NOT_FOUND);
    }
    let active = body.get("is_active").and_then(Value::as_bool).ok_or(StatusCode::UNPROCESSABLE_ENTITY)?;
    Ok(Json(json!({"data": {"id": id, "name": "Wanjiru", "is_active": if active { 1 } else { 0 }}})))
}

async fn serve(seen: Seen) -> String {
    let app = Router::new()
        .route("/api/categories", get(categories))
        .route("/api/products", get(products))
        .route("/api/banners/homepage", get(banners))
        .route("/api/banners/:id/impression", post(impression))
        .route("/api/admin/customers/:id/status", patch(customer_status))
        .with_state(seen);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}/api/")
}

#[tokio::test]
async fn listing_envelopes_and_prices_decode() {
    let base = serve(Seen::default()).await;
    let api = HttpStorefront::new(&base, 5000, AuthContext::anonymous()).unwrap();

    let cats = api.categories().await.unwrap();
    assert_eq!(cats.len(), 2);
    assert_eq!(cats[1].products_count, Some(7));

    let items = api.products(1, 24).await.unwrap();
    assert_eq!(items[0].price, 120.5);
    assert_eq!(items[0].effective_price(), 99.0);
}

#[tokio::test]
async fn statuses_are_classified() {
    let base = serve(Seen::default()).await;
    let api = HttpStorefront::new(&base, 5000, AuthContext::anonymous()).unwrap();

    assert_eq!(api.products(2, 24).await.unwrap_err(), ApiError::RateLimited);
    assert_eq!(api.products(3, 24).await.unwrap_err(), ApiError::NotFound);
    assert_eq!(api.homepage_banners().await.unwrap_err(), ApiError::Status(500));
    assert!(fetch_banners(&api).await.is_err());
}

#[tokio::test]
async fn bearer_token_and_telemetry_posts() {
    let seen = Seen::default();
    let base = serve(seen.clone()).await;
    let api = HttpStorefront::new(&base, 5000, AuthContext::with_token("tok-1")).unwrap();

    api.categories().await.unwrap();
    api.record_impression(7).await.unwrap();

    assert_eq!(*seen.auth.lock().unwrap(), vec!["Bearer tok-1".to_string()]);
    assert_eq!(*seen.hits.lock().unwrap(), vec!["impression:7".to_string()]);
    // unknown route
    assert_eq!(api.record_click(7).await.unwrap_err().kind(), sokoni::net::ErrorKind::NotFound);
}

#[tokio::test]
async fn customer_status_patch() {
    let base = serve(Seen::default()).await;
    let api = HttpStorefront::new(&base, 5000, AuthContext::with_token("admin")).unwrap();
    let repo = HttpCustomerStatusRepository::new(api);

    let c = repo.set_active(12, false).await.unwrap();
    assert_eq!(c.id, 12);
    assert!(!c.is_active);
    assert!(repo.set_active(12, true).await.unwrap().is_active);
    assert_eq!(repo.set_active(404, true).await.unwrap_err(), ApiError::NotFound);
}

#[tokio::test]
async fn unreachable_server_is_a_transport_error() {
    // bind then drop to get a port nobody listens on
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let api = HttpStorefront::new(&format!("http://{addr}/api"), 2000, AuthContext::anonymous()).unwrap();
    let err = api.categories().await.unwrap_err();
    assert!(matches!(err, ApiError::Transport(_)), "got {err:?}");
    assert!(err.is_retryable());
}
