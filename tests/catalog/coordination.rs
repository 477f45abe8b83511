//! Request shapes, latest-wins supersession and failure handling.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use catalog_sync::{
    ProductRequest, Resolution, SessionSignal, SessionStore, TransportError, ViewContent,
    LIST_PATH, TRANSIENT_MESSAGE,
};
use serde_json::json;

use crate::support::{harness, post_field, products, Reply, ScriptedTransport};

#[tokio::test]
async fn first_display_lists_everything() {
    let h = harness(ScriptedTransport::fixed(products(3)));

    let resolution = h.catalog.load_initial().await;
    assert!(matches!(resolution, Resolution::Applied { count: 3 }));

    assert_eq!(
        h.transport.requests(),
        vec![ProductRequest::Get { path: LIST_PATH.to_string() }]
    );
    let view = h.catalog.view();
    assert_eq!(view.content, ViewContent::Items);
    assert_eq!(view.items[0].code, "p0");
    assert_eq!(view.items[0].name, "Product 0");
}

#[tokio::test]
async fn queries_pick_their_request_shape() {
    let h = harness(ScriptedTransport::fixed(products(1)));

    h.catalog.submit_query("  12345 ").await;
    h.catalog.submit_query("ABC123").await;
    h.catalog.submit_query("Canéta   Azul").await;
    h.catalog.submit_query("12 34").await;
    h.catalog.submit_query("   ").await;

    let requests = h.transport.requests();
    assert_eq!(post_field(&requests[0]), Some(("productCode", "12345")));
    assert_eq!(post_field(&requests[1]), Some(("productCode", "abc123")));
    assert_eq!(post_field(&requests[2]), Some(("productName", "caneta azul")));
    assert_eq!(post_field(&requests[3]), Some(("productName", "12 34")));
    assert!(matches!(requests[4], ProductRequest::Get { .. }));
}

#[tokio::test(start_paused = true)]
async fn latest_query_wins_when_responses_arrive_out_of_order() {
    let transport = ScriptedTransport::new(|request| match post_field(request) {
        Some((_, "caneta")) => Reply::ok(products(5)).after(Duration::from_millis(300)),
        _ => Reply::ok(products(2)).after(Duration::from_millis(10)),
    });
    let h = harness(transport);

    let first = {
        let catalog = h.catalog.clone();
        tokio::spawn(async move { catalog.submit_query("caneta").await })
    };
    tokio::task::yield_now().await;
    let second = {
        let catalog = h.catalog.clone();
        tokio::spawn(async move { catalog.submit_query("lapis").await })
    };

    let second = second.await.unwrap();
    let first = first.await.unwrap();

    assert!(matches!(second, Resolution::Applied { count: 2 }));
    assert_eq!(first, Resolution::Superseded);
    assert_eq!(h.catalog.view().items.len(), 2);
    assert_eq!(h.catalog.coordinator().generation(), 1);
    assert!(!h.catalog.coordinator().is_loading());
}

#[tokio::test]
async fn transient_failure_keeps_previous_list() {
    let transport = ScriptedTransport::new(|request| match request {
        ProductRequest::Get { .. } => Reply::ok(products(3)),
        ProductRequest::Post { .. } => Reply::err(TransportError::Status(500)),
    });
    let h = harness(transport);

    h.catalog.load_initial().await;
    let resolution = h.catalog.submit_query("caneta").await;
    assert!(matches!(resolution, Resolution::Failed(_)));

    let view = h.catalog.view();
    assert_eq!(view.items.len(), 3);
    assert_eq!(view.content, ViewContent::Items);
    assert_eq!(view.error_message.as_deref(), Some(TRANSIENT_MESSAGE));

    h.catalog.dismiss_error();
    assert_eq!(h.catalog.view().error_message, None);
    assert_eq!(h.catalog.view().items.len(), 3);
}

#[tokio::test]
async fn retry_recovers_after_failure() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();
    let transport = ScriptedTransport::new(move |_| {
        if counter.fetch_add(1, Ordering::SeqCst) == 0 {
            Reply::err(TransportError::Network("connection refused".into()))
        } else {
            Reply::ok(products(4))
        }
    });
    let h = harness(transport);

    assert!(matches!(h.catalog.load_initial().await, Resolution::Failed(_)));
    let view = h.catalog.view();
    assert_eq!(view.content, ViewContent::Error);
    assert!(view.items.is_empty());

    assert!(matches!(h.catalog.retry().await, Resolution::Applied { count: 4 }));
    let view = h.catalog.view();
    assert_eq!(view.content, ViewContent::Items);
    assert_eq!(view.error_message, None);

    let requests = h.transport.requests();
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[0], requests[1]);
}

#[tokio::test]
async fn unauthorized_clears_session_and_requests_login() {
    let h = harness(ScriptedTransport::new(|_| {
        Reply::err(TransportError::Unauthorized)
    }));
    let mut signals = h.signals.subscribe();

    assert_eq!(h.catalog.load_initial().await, Resolution::Unauthorized);

    assert_eq!(h.session.token(), None);
    assert_eq!(signals.recv().await.unwrap(), SessionSignal::LoginRequired);
    assert!(h.catalog.require_session().is_err());
    assert_eq!(h.catalog.view().error_message, None);
}

#[tokio::test(start_paused = true)]
async fn stop_cancels_the_request_in_flight() {
    let h = harness(ScriptedTransport::new(|_| {
        Reply::ok(products(3)).after(Duration::from_secs(1))
    }));

    let pending = {
        let catalog = h.catalog.clone();
        tokio::spawn(async move { catalog.load_initial().await })
    };
    tokio::task::yield_now().await;
    assert!(h.catalog.coordinator().is_loading());

    h.catalog.stop();
    let resolution = pending.await.unwrap();

    assert!(!matches!(resolution, Resolution::Applied { .. }));
    assert!(!h.catalog.coordinator().is_loading());
    assert!(h.catalog.view().items.is_empty());
}

#[tokio::test]
async fn envelopes_are_unwrapped() {
    let h = harness(ScriptedTransport::fixed(json!({
        "resultado": [{ "codigo": 7, "nome": "Caderno", "preco": 12.5 }]
    })));

    h.catalog.load_initial().await;
    let view = h.catalog.view();
    assert_eq!(view.items.len(), 1);
    assert_eq!(view.items[0].code, "7");
    assert_eq!(view.items[0].price, "12.5");
}

#[tokio::test(start_paused = true)]
async fn error_message_clears_while_the_next_fetch_loads() {
    let transport = ScriptedTransport::new(|request| match request {
        ProductRequest::Get { .. } => Reply::err(TransportError::Status(500)),
        ProductRequest::Post { .. } => {
            Reply::ok(products(2)).after(Duration::from_millis(200))
        }
    });
    let h = harness(transport);

    h.catalog.load_initial().await;
    assert_eq!(h.catalog.view().error_message.as_deref(), Some(TRANSIENT_MESSAGE));

    let pending = {
        let catalog = h.catalog.clone();
        tokio::spawn(async move { catalog.submit_query("caneta").await })
    };
    tokio::task::yield_now().await;
    let view = h.catalog.view();
    assert_eq!(view.content, ViewContent::Loading);
    assert_eq!(view.error_message, None);

    assert!(matches!(pending.await.unwrap(), Resolution::Applied { count: 2 }));
    assert_eq!(h.catalog.view().error_message, None);
}

#[tokio::test]
async fn unauthorized_after_transient_failure_leaves_no_message() {
    let transport = ScriptedTransport::new(|request| match request {
        ProductRequest::Get { .. } => Reply::err(TransportError::Status(500)),
        ProductRequest::Post { .. } => Reply::err(TransportError::Unauthorized),
    });
    let h = harness(transport);

    h.catalog.load_initial().await;
    assert!(h.catalog.view().error_message.is_some());

    assert_eq!(h.catalog.submit_query("x").await, Resolution::Unauthorized);
    let view = h.catalog.view();
    assert_eq!(view.error_message, None);
    assert_ne!(view.content, ViewContent::Error);
}

#[tokio::test]
async fn retry_after_failure_then_new_query_keeps_latest() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();
    let transport = ScriptedTransport::new(move |request| match request {
        ProductRequest::Get { .. } if counter.fetch_add(1, Ordering::SeqCst) == 0 => {
            Reply::err(TransportError::Status(502))
        }
        ProductRequest::Get { .. } => Reply::ok(products(6)),
        ProductRequest::Post { .. } => Reply::ok(products(1)),
    });
    let h = harness(transport);

    h.catalog.load_initial().await;
    assert!(matches!(h.catalog.retry().await, Resolution::Applied { count: 6 }));
    h.catalog.submit_query("caneta").await;

    let view = h.catalog.view();
    assert_eq!(view.items.len(), 1);
    assert_eq!(view.error_message, None);
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}
