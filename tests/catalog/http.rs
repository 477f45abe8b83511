//! HTTP transport against an axum mock of the product service.
//!
//! Starts an axum server on an ephemeral port and drives it through
//! `Catalog::connect`.

use std::sync::atomic::{AtomicU16, Ordering};
use std::sync::{Arc, Mutex};

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use catalog_sync::{
    Catalog, CatalogConfig, HttpTransport, InMemorySessionStore, Resolution, SessionSignal,
    SessionSignals, SessionStore, ViewContent, TRANSIENT_MESSAGE,
};
use serde_json::{json, Value};

#[derive(Debug, Clone)]
struct Seen {
    method: &'static str,
    auth: Option<String>,
    body: Value,
}

/// Mock product service. `status` overrides every response when non-zero.
#[derive(Clone, Default)]
struct Backend {
    seen: Arc<Mutex<Vec<Seen>>>,
    status: Arc<AtomicU16>,
}

impl Backend {
    fn record(&self, method: &'static str, headers: &HeaderMap, body: Value) -> Option<Response> {
        let auth = headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        self.seen.lock().unwrap().push(Seen { method, auth, body });

        match self.status.load(Ordering::SeqCst) {
            0 => None,
            code => Some(StatusCode::from_u16(code).unwrap().into_response()),
        }
    }

    fn seen(&self) -> Vec<Seen> {
        self.seen.lock().unwrap().clone()
    }
}

fn catalog_rows() -> Vec<Value> {
    vec![
        json!({ "codigo": "100", "nome": "caneta azul", "preco": "3.50" }),
        json!({ "codigo": "200", "nome": "lapis", "preco": "1.20" }),
        json!({ "codigo": "300", "nome": "caderno", "preco": "25" }),
    ]
}

async fn list(State(backend): State<Backend>, headers: HeaderMap) -> Response {
    if let Some(rejected) = backend.record("GET", &headers, Value::Null) {
        return rejected;
    }
    Json(json!({ "data": catalog_rows() })).into_response()
}

async fn search(
    State(backend): State<Backend>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    if let Some(rejected) = backend.record("POST", &headers, body.clone()) {
        return rejected;
    }
    let rows = catalog_rows();
    if let Some(code) = body["productCode"].as_str() {
        let items: Vec<_> = rows.into_iter().filter(|r| r["codigo"] == code).collect();
        return Json(json!({ "items": items })).into_response();
    }
    let name = body["productName"].as_str().unwrap_or_default().to_string();
    let items: Vec<_> = rows
        .into_iter()
        .filter(|r| r["nome"].as_str().unwrap_or_default().contains(&name))
        .collect();
    Json(Value::Array(items)).into_response()
}

/// Bind to port 0 and return the actual address.
async fn start_server(backend: Backend) -> String {
    let app = Router::new()
        .route("/products/list", get(list).post(search))
        .with_state(backend);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

struct Client {
    catalog: Catalog<HttpTransport<Arc<dyn SessionStore>>>,
    session: Arc<InMemorySessionStore>,
    signals: SessionSignals,
}

async fn connect(backend: Backend) -> Client {
    let base = start_server(backend).await;
    let session = Arc::new(InMemorySessionStore::with_token("secret"));
    let signals = SessionSignals::new();
    let store: Arc<dyn SessionStore> = session.clone();
    let catalog = Catalog::connect(
        CatalogConfig::default().with_api_base(base),
        store,
        signals.clone(),
    )
    .unwrap();
    Client {
        catalog,
        session,
        signals,
    }
}

#[tokio::test]
async fn lists_with_bearer_token() {
    let backend = Backend::default();
    let client = connect(backend.clone()).await;

    let resolution = client.catalog.load_initial().await;
    assert_eq!(resolution, Resolution::Applied { count: 3 });

    let seen = backend.seen();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].method, "GET");
    assert_eq!(seen[0].auth.as_deref(), Some("Bearer secret"));

    let view = client.catalog.view();
    assert_eq!(view.items[0].code, "100");
    assert_eq!(view.items[0].formatted_price(), "R$\u{a0}3,50");
}

#[tokio::test]
async fn code_query_posts_product_code() {
    let backend = Backend::default();
    let client = connect(backend.clone()).await;

    client.catalog.submit_query(" 200 ").await;

    assert_eq!(backend.seen()[0].body, json!({ "productCode": "200" }));
    let view = client.catalog.view();
    assert_eq!(view.items.len(), 1);
    assert_eq!(view.items[0].name, "lapis");
}

#[tokio::test]
async fn name_query_posts_product_name() {
    let backend = Backend::default();
    let client = connect(backend.clone()).await;

    client.catalog.submit_query("CANETA").await;

    assert_eq!(backend.seen()[0].body, json!({ "productName": "caneta" }));
    assert_eq!(client.catalog.view().items[0].code, "100");
}

#[tokio::test]
async fn rejected_credentials_end_the_session() {
    let backend = Backend::default();
    backend.status.store(401, Ordering::SeqCst);
    let client = connect(backend.clone()).await;
    let mut signals = client.signals.subscribe();

    assert_eq!(client.catalog.load_initial().await, Resolution::Unauthorized);

    assert_eq!(client.session.token(), None);
    assert_eq!(signals.recv().await.unwrap(), SessionSignal::Invalidated);
    assert_eq!(signals.recv().await.unwrap(), SessionSignal::LoginRequired);
    assert!(client.catalog.require_session().is_err());
}

#[tokio::test]
async fn server_errors_are_transient() {
    let backend = Backend::default();
    backend.status.store(503, Ordering::SeqCst);
    let client = connect(backend.clone()).await;

    assert!(matches!(
        client.catalog.load_initial().await,
        Resolution::Failed(_)
    ));
    let view = client.catalog.view();
    assert_eq!(view.content, ViewContent::Error);
    assert_eq!(view.error_message.as_deref(), Some(TRANSIENT_MESSAGE));

    backend.status.store(0, Ordering::SeqCst);
    assert_eq!(client.catalog.retry().await, Resolution::Applied { count: 3 });
    assert_eq!(client.catalog.view().content, ViewContent::Items);
}
