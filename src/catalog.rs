//! Catalog: the page-session controller.
//!
//! Owns the user-facing inputs (raw query, sort key, favorites-only flag,
//! selection), the pager and the scroll trigger, and wires them to the
//! fetch coordinator and the view composer. Every input change is a
//! discrete method call; [`Catalog::view`] always derives from the current
//! inputs.
//!
//! ## Example
//!
//! ```ignore
//! let catalog = Arc::new(Catalog::new(config, transport, session, signals));
//! catalog.spawn_query_loop();      // debounced query loop
//! catalog.load_initial().await;    // list-all
//!
//! catalog.set_query("caneta");     // fetch after the quiet interval
//! catalog.set_sort(SortKey::PriceAsc);
//! catalog.sentinel_visibility(true);
//!
//! let view = catalog.view();
//! for (key, product) in view.keyed_items() { /* render */ }
//! ```

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::config::CatalogConfig;
use crate::coordinator::{FetchCoordinator, FetchSnapshot, FetchStatus, Resolution};
use crate::debounce::{spawn_debouncer, DebounceInput};
use crate::detail::ProductDetail;
use crate::error::SessionRequired;
use crate::favorites::FavoritesStore;
use crate::pager::Pager;
use crate::pipeline::SortKey;
use crate::product::ProductRecord;
use crate::query::normalize_query;
use crate::scroll::{sentinel_in_view, Extent, ScrollTrigger};
use crate::session::{SessionSignals, SessionStore};
use crate::transport::Transport;
use crate::view::{CatalogView, ViewComposer, ViewInputs};

/// Inputs that reset the pager when any of them changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct PagerEpoch {
    generation: u64,
    favorites_only: bool,
    sort_key: SortKey,
}

struct UiState {
    raw_query: String,
    debounced_query: String,
    sort_key: SortKey,
    favorites_only: bool,
    pager: Pager,
    epoch: PagerEpoch,
    scroll: ScrollTrigger,
    selected: Option<ProductRecord>,
    favorite_codes: (u64, Arc<HashSet<String>>),
    composer: ViewComposer,
}

/// Catalog page session over a [`Transport`].
pub struct Catalog<T> {
    config: CatalogConfig,
    coordinator: FetchCoordinator<T>,
    session: Arc<dyn SessionStore>,
    signals: SessionSignals,
    favorites: FavoritesStore,
    query_input: Mutex<Option<DebounceInput<String>>>,
    ui: Mutex<UiState>,
}

impl<T: Transport + 'static> Catalog<T> {
    pub fn new(
        config: CatalogConfig,
        transport: T,
        session: Arc<dyn SessionStore>,
        signals: SessionSignals,
    ) -> Self {
        let coordinator = FetchCoordinator::new(
            transport,
            session.clone(),
            signals.clone(),
            config.list_path.clone(),
        );
        let ui = UiState {
            raw_query: String::new(),
            debounced_query: String::new(),
            sort_key: SortKey::None,
            favorites_only: false,
            pager: Pager::new(config.page_size),
            epoch: PagerEpoch {
                generation: 0,
                favorites_only: false,
                sort_key: SortKey::None,
            },
            scroll: ScrollTrigger::new(),
            selected: None,
            favorite_codes: (u64::MAX, Arc::new(HashSet::new())),
            composer: ViewComposer::new(),
        };
        Self {
            config,
            coordinator,
            session,
            signals,
            favorites: FavoritesStore::new(),
            query_input: Mutex::new(None),
            ui: Mutex::new(ui),
        }
    }

    /// Use an existing favorites store instead of a fresh one.
    pub fn with_favorites(mut self, favorites: FavoritesStore) -> Self {
        self.favorites = favorites;
        self
    }

    fn ui(&self) -> MutexGuard<'_, UiState> {
        self.ui.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn config(&self) -> &CatalogConfig {
        &self.config
    }

    pub fn coordinator(&self) -> &FetchCoordinator<T> {
        &self.coordinator
    }

    pub fn favorites(&self) -> &FavoritesStore {
        &self.favorites
    }

    pub fn signals(&self) -> &SessionSignals {
        &self.signals
    }

    /// Route guard: the catalog is only usable with a session token.
    pub fn require_session(&self) -> Result<(), SessionRequired> {
        if self.session.has_token() {
            Ok(())
        } else {
            Err(SessionRequired)
        }
    }

    // =========================================================================
    // Query
    // =========================================================================

    /// Start the debounced query loop. Settled queries are resolved on
    /// their own tasks so that a newer query can supersede an older one.
    pub fn spawn_query_loop(self: &Arc<Self>) {
        let (input, mut settled) = spawn_debouncer::<String>(self.config.debounce);
        *self
            .query_input
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(input);

        let weak = Arc::downgrade(self);
        tokio::spawn(async move {
            while let Some(query) = settled.recv().await {
                let Some(catalog) = weak.upgrade() else {
                    break;
                };
                tokio::spawn(async move {
                    catalog.fetch(&query).await;
                });
            }
        });
    }

    /// Stop the query loop and cancel whatever is in flight.
    pub fn stop(&self) {
        self.query_input
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        self.coordinator.cancel_inflight();
    }

    /// Record a keystroke. Returns the normalized form that will be fetched
    /// once input settles (if the loop is running).
    pub fn set_query(&self, raw: &str) -> String {
        let normalized = normalize_query(raw);
        self.ui().raw_query = raw.to_string();
        if let Some(input) = self
            .query_input
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
        {
            input.send(normalized.clone());
        }
        normalized
    }

    /// Record and resolve a query immediately, bypassing the debounce.
    pub async fn submit_query(&self, raw: &str) -> Resolution {
        let normalized = normalize_query(raw);
        self.ui().raw_query = raw.to_string();
        if let Some(input) = self
            .query_input
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
        {
            input.mark_emitted(normalized.clone());
        }
        self.fetch(&normalized).await
    }

    /// Fetch the unfiltered list, as on first display.
    pub async fn load_initial(&self) -> Resolution {
        self.submit_query("").await
    }

    async fn fetch(&self, normalized: &str) -> Resolution {
        self.ui().debounced_query = normalized.to_string();
        self.coordinator.resolve(normalized).await
    }

    /// Re-issue the last effective query.
    pub async fn retry(&self) -> Resolution {
        self.coordinator.retry().await
    }

    pub fn dismiss_error(&self) {
        self.coordinator.dismiss_error();
    }

    pub fn raw_query(&self) -> String {
        self.ui().raw_query.clone()
    }

    pub fn debounced_query(&self) -> String {
        self.ui().debounced_query.clone()
    }

    // =========================================================================
    // Sort and favorites
    // =========================================================================

    pub fn set_sort(&self, sort_key: SortKey) {
        self.ui().sort_key = sort_key;
    }

    pub fn sort_key(&self) -> SortKey {
        self.ui().sort_key
    }

    pub fn set_favorites_only(&self, enabled: bool) {
        self.ui().favorites_only = enabled;
    }

    /// Flip favorites-only mode; returns the new value.
    pub fn toggle_favorites_only(&self) -> bool {
        let mut ui = self.ui();
        ui.favorites_only = !ui.favorites_only;
        ui.favorites_only
    }

    pub fn favorites_only(&self) -> bool {
        self.ui().favorites_only
    }

    /// Toggle a product in the favorites store; returns whether it is now a
    /// favorite.
    pub fn toggle_favorite(&self, product: &ProductRecord) -> bool {
        self.favorites.toggle(product)
    }

    pub fn is_favorite(&self, code: &str) -> bool {
        self.favorites.is_favorite(code)
    }

    // =========================================================================
    // Pagination
    // =========================================================================

    /// Feed sentinel visibility. Returns `true` when a page was added.
    pub fn sentinel_visibility(&self, visible: bool) -> bool {
        let snapshot = self.coordinator.snapshot();
        let busy = snapshot.state.status() == FetchStatus::Loading;
        let mut ui = self.ui();
        self.sync_pager(&mut ui, &snapshot);
        ui.scroll.set_visible(visible);

        let view = self.compose(&mut ui, snapshot);
        if !ui.scroll.poll(view.has_more, busy) {
            return false;
        }
        ui.pager.grow_by_one_page(view.total)
    }

    /// Feed sentinel geometry instead of a precomputed visibility.
    pub fn sentinel_geometry(&self, viewport: Extent, sentinel: Extent) -> bool {
        self.sentinel_visibility(sentinel_in_view(
            viewport,
            sentinel,
            self.config.scroll_margin_px,
        ))
    }

    /// The page added by the scroll trigger has been rendered. Needed only
    /// when the sentinel stays in view after the growth; the sentinel
    /// leaving view releases the trigger on its own.
    pub fn complete_growth(&self) {
        self.ui().scroll.complete();
    }

    /// Manual "load more". Returns `true` when a page was added.
    pub fn load_more(&self) -> bool {
        let snapshot = self.coordinator.snapshot();
        let mut ui = self.ui();
        let view = self.compose(&mut ui, snapshot);
        if !view.has_more {
            return false;
        }
        ui.pager.grow_by_one_page(view.total)
    }

    pub fn visible_count(&self) -> usize {
        let snapshot = self.coordinator.snapshot();
        let mut ui = self.ui();
        self.sync_pager(&mut ui, &snapshot);
        ui.pager.visible_count()
    }

    // =========================================================================
    // Selection
    // =========================================================================

    pub fn select(&self, product: &ProductRecord) {
        self.ui().selected = Some(product.clone());
    }

    pub fn close_detail(&self) {
        self.ui().selected = None;
    }

    pub fn selected(&self) -> Option<ProductRecord> {
        self.ui().selected.clone()
    }

    pub fn detail(&self) -> Option<ProductDetail> {
        self.ui().selected.as_ref().map(ProductDetail::from)
    }

    // =========================================================================
    // View
    // =========================================================================

    /// The derived catalog page for the current inputs.
    pub fn view(&self) -> Arc<CatalogView> {
        let snapshot = self.coordinator.snapshot();
        let mut ui = self.ui();
        self.compose(&mut ui, snapshot)
    }

    fn sync_pager(&self, ui: &mut UiState, snapshot: &FetchSnapshot) {
        let epoch = PagerEpoch {
            generation: snapshot.generation,
            favorites_only: ui.favorites_only,
            sort_key: ui.sort_key,
        };
        if epoch != ui.epoch {
            ui.pager.reset();
            ui.scroll.reset();
            ui.epoch = epoch;
        }
    }

    fn compose(&self, ui: &mut UiState, snapshot: FetchSnapshot) -> Arc<CatalogView> {
        self.sync_pager(ui, &snapshot);

        let revision = self.favorites.revision();
        if ui.favorite_codes.0 != revision {
            ui.favorite_codes = (revision, Arc::new(self.favorites.codes()));
        }

        let inputs = ViewInputs {
            query: ui.debounced_query.clone(),
            sort_key: ui.sort_key,
            favorites_only: ui.favorites_only,
            favorite_codes: ui.favorite_codes.1.clone(),
            favorites_revision: revision,
            fetch: snapshot,
            pager: ui.pager,
            loading_more: ui.scroll.is_pending(),
        };
        ui.composer.compose(&inputs)
    }
}

#[cfg(feature = "http")]
impl Catalog<crate::transport::HttpTransport<Arc<dyn SessionStore>>> {
    /// Catalog talking HTTP to `config.api_base`.
    pub fn connect(
        config: CatalogConfig,
        session: Arc<dyn SessionStore>,
        signals: SessionSignals,
    ) -> Result<Self, crate::error::TransportError> {
        let transport =
            crate::transport::HttpTransport::from_config(&config, session.clone(), signals.clone())?;
        Ok(Self::new(config, transport, session, signals))
    }
}
