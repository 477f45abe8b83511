//! Client-side pagination, the scroll trigger and sorting.

use std::time::Duration;

use catalog_sync::{CatalogConfig, Extent, ProductRequest, SortKey};
use serde_json::json;

use crate::support::{harness, harness_with, products, Reply, ScriptedTransport};

#[tokio::test]
async fn thirty_items_reveal_in_three_pages() {
    let h = harness(ScriptedTransport::fixed(products(30)));
    h.catalog.load_initial().await;

    let view = h.catalog.view();
    assert_eq!(view.items.len(), 12);
    assert!(view.has_more);

    assert!(h.catalog.sentinel_visibility(true));
    assert!(!h.catalog.sentinel_visibility(true));
    h.catalog.complete_growth();
    assert_eq!(h.catalog.view().items.len(), 24);

    h.catalog.sentinel_visibility(false);
    assert!(h.catalog.sentinel_visibility(true));
    h.catalog.complete_growth();

    let view = h.catalog.view();
    assert_eq!(view.items.len(), 30);
    assert!(!view.has_more);
    assert!(view.at_end());
    assert!(!h.catalog.sentinel_visibility(true));
    assert!(!h.catalog.load_more());
}

#[tokio::test]
async fn sentinel_geometry_uses_the_margin() {
    let h = harness(ScriptedTransport::fixed(products(30)));
    h.catalog.load_initial().await;
    let viewport = Extent::new(0.0, 800.0);

    assert!(!h.catalog.sentinel_geometry(viewport, Extent::new(1100.0, 40.0)));
    assert!(h.catalog.sentinel_geometry(viewport, Extent::new(950.0, 40.0)));
    assert_eq!(h.catalog.visible_count(), 24);
}

#[tokio::test]
async fn page_size_comes_from_config() {
    let h = harness_with(
        ScriptedTransport::fixed(products(30)),
        CatalogConfig::default().with_page_size(5),
    );
    h.catalog.load_initial().await;
    assert_eq!(h.catalog.view().items.len(), 5);
    assert!(h.catalog.load_more());
    assert_eq!(h.catalog.view().items.len(), 10);
}

#[tokio::test]
async fn changing_sort_resets_to_one_page() {
    let h = harness(ScriptedTransport::fixed(products(30)));
    h.catalog.load_initial().await;
    h.catalog.load_more();
    assert_eq!(h.catalog.view().items.len(), 24);

    h.catalog.set_sort(SortKey::PriceDesc);
    let view = h.catalog.view();
    assert_eq!(view.items.len(), 12);
    assert_eq!(view.items[0].code, "p29");
    assert_eq!(view.sort_key, SortKey::PriceDesc);

    h.catalog.set_sort(SortKey::None);
    assert_eq!(h.catalog.view().items[0].code, "p0");
}

#[tokio::test]
async fn name_sort_ignores_accents_and_case() {
    let h = harness(ScriptedTransport::fixed(json!([
        { "codigo": "1", "nome": "banana" },
        { "codigo": "2", "nome": "Água" },
        { "codigo": "3", "nome": "abacaxi" },
    ])));
    h.catalog.load_initial().await;

    h.catalog.set_sort(SortKey::NameAsc);
    let names: Vec<_> = h.catalog.view().items.iter().map(|p| p.name.clone()).collect();
    assert_eq!(names, vec!["abacaxi", "Água", "banana"]);

    h.catalog.set_sort(SortKey::NameDesc);
    let names: Vec<_> = h.catalog.view().items.iter().map(|p| p.name.clone()).collect();
    assert_eq!(names, vec!["banana", "Água", "abacaxi"]);
}

#[tokio::test]
async fn unparseable_prices_sort_last() {
    let h = harness(ScriptedTransport::fixed(json!([
        { "codigo": "a", "preco": "sob consulta" },
        { "codigo": "b", "preco": "10" },
        { "codigo": "c", "preco": "2.50" },
    ])));
    h.catalog.load_initial().await;

    h.catalog.set_sort(SortKey::PriceAsc);
    let codes: Vec<_> = h.catalog.view().items.iter().map(|p| p.code.clone()).collect();
    assert_eq!(codes.last().map(String::as_str), Some("a"));

    h.catalog.set_sort(SortKey::PriceDesc);
    let codes: Vec<_> = h.catalog.view().items.iter().map(|p| p.code.clone()).collect();
    assert_eq!(codes.last().map(String::as_str), Some("a"));
}

#[tokio::test(start_paused = true)]
async fn no_growth_while_a_fetch_is_loading() {
    let h = harness(ScriptedTransport::new(|request| match request {
        ProductRequest::Get { .. } => Reply::ok(products(30)),
        ProductRequest::Post { .. } => {
            Reply::ok(products(30)).after(Duration::from_millis(500))
        }
    }));
    h.catalog.load_initial().await;

    let pending = {
        let catalog = h.catalog.clone();
        tokio::spawn(async move { catalog.submit_query("caneta").await })
    };
    tokio::task::yield_now().await;
    assert!(h.catalog.view().is_loading_initial);
    assert!(!h.catalog.sentinel_visibility(true));

    pending.await.unwrap();
    assert_eq!(h.catalog.visible_count(), 12);
    assert!(h.catalog.sentinel_visibility(true));
}
