mod catalog;
mod config;
mod coordinator;
mod debounce;
mod detail;
mod error;
mod favorites;
mod normalize;
mod pager;
mod pipeline;
mod product;
mod query;
mod scroll;
mod session;
mod view;

pub mod transport;

pub use catalog::Catalog;
pub use config::{
    CatalogConfig, DEFAULT_API_BASE, DEFAULT_DEBOUNCE, DEFAULT_PAGE_SIZE, DEFAULT_SCROLL_MARGIN_PX,
};
pub use coordinator::{
    FetchCoordinator, FetchSnapshot, FetchState, FetchStatus, ProductList, Resolution,
};
pub use debounce::{spawn_debouncer, DebounceInput, Debouncer};
pub use detail::{ProductDetail, NO_DESCRIPTION};
pub use error::{ConfigError, FetchError, SessionRequired, TransportError, TRANSIENT_MESSAGE};
pub use favorites::{FavoriteRecord, FavoritesStore, SnapshotError, STORAGE_KEY};
pub use normalize::{normalize_payload, ENVELOPE_KEYS};
pub use pager::Pager;
pub use pipeline::{compare_names, filter_favorites, sort_products, SortKey, UnknownSortKey};
pub use product::{format_brl, parse_price, ProductRecord};
pub use query::{is_code_query, normalize_query, ProductQuery, ProductRequest, LIST_PATH};
pub use scroll::{sentinel_in_view, Extent, ScrollTrigger};
pub use session::{InMemorySessionStore, SessionSignal, SessionSignals, SessionStore};
pub use transport::Transport;
#[cfg(feature = "http")]
pub use transport::HttpTransport;
pub use view::{derive_view, CatalogView, ViewComposer, ViewContent, ViewInputs};

// Re-export the cancellation primitive used by `Transport`
pub use tokio_util::sync::CancellationToken;
