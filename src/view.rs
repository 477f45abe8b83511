//! View composer: derives the rendered catalog from its inputs.
//!
//! Nothing here is stored independently of its inputs. [`derive_view`] is
//! the pure derivation; [`ViewComposer`] memoizes it on an input
//! fingerprint so that recomposing with unchanged inputs hands back the
//! very same `Arc`.

use std::collections::HashSet;
use std::sync::Arc;

use crate::coordinator::{FetchSnapshot, FetchStatus, ProductList};
use crate::error::FetchError;
use crate::pager::Pager;
use crate::pipeline::{filter_favorites, sort_products, SortKey};
use crate::product::ProductRecord;

/// Everything the derived view depends on.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewInputs {
    /// Debounced, normalized query the list was fetched for.
    pub query: String,
    pub sort_key: SortKey,
    pub favorites_only: bool,
    pub favorite_codes: Arc<HashSet<String>>,
    /// Change counter of `favorite_codes`.
    pub favorites_revision: u64,
    pub fetch: FetchSnapshot,
    pub pager: Pager,
    /// A scroll-triggered growth is in progress.
    pub loading_more: bool,
}

/// Which of the mutually exclusive page states to render.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ViewContent {
    /// A fetch is in flight.
    Loading,
    /// The last fetch failed and there is nothing to show.
    Error,
    /// Zero results. Not an error.
    Empty,
    /// At least one item is visible.
    Items,
}

/// The derived catalog page.
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogView {
    pub items: Vec<ProductRecord>,
    /// Length of the filtered, sorted list before pagination.
    pub total: usize,
    pub visible_count: usize,
    pub has_more: bool,
    pub is_loading_initial: bool,
    pub is_loading_more: bool,
    pub error_message: Option<String>,
    pub content: ViewContent,
    pub query: String,
    pub sort_key: SortKey,
    pub favorites_only: bool,
}

impl CatalogView {
    /// Visible items paired with their rendering keys.
    pub fn keyed_items(&self) -> impl Iterator<Item = (String, &ProductRecord)> {
        self.items
            .iter()
            .enumerate()
            .map(|(i, p)| (p.render_key(i), p))
    }

    /// The list is exhausted and non-empty ("end of list" marker).
    pub fn at_end(&self) -> bool {
        !self.favorites_only && !self.has_more && self.total > 0
    }
}

/// Derive the view from `inputs`.
pub fn derive_view(inputs: &ViewInputs) -> CatalogView {
    let canonical: &ProductList = &inputs.fetch.canonical;
    let filtered = filter_favorites(canonical, &inputs.favorite_codes, inputs.favorites_only);
    let sorted = sort_products(&filtered, inputs.sort_key);

    let total = sorted.len();
    let visible_len = if inputs.favorites_only {
        total
    } else {
        inputs.pager.visible_len(total)
    };
    let items: Vec<ProductRecord> = sorted[..visible_len].iter().copied().cloned().collect();
    let has_more = inputs.pager.has_more(total, inputs.favorites_only);

    let loading = inputs.fetch.state.status() == FetchStatus::Loading;
    let error_message = inputs
        .fetch
        .error
        .as_ref()
        .and_then(FetchError::user_message)
        .map(str::to_string);

    let content = if loading {
        ViewContent::Loading
    } else if items.is_empty() && error_message.is_some() {
        ViewContent::Error
    } else if items.is_empty() {
        ViewContent::Empty
    } else {
        ViewContent::Items
    };

    CatalogView {
        items,
        total,
        visible_count: if inputs.favorites_only {
            visible_len
        } else {
            inputs.pager.visible_count()
        },
        has_more,
        is_loading_initial: loading,
        is_loading_more: inputs.loading_more,
        error_message,
        content,
        query: inputs.query.clone(),
        sort_key: inputs.sort_key,
        favorites_only: inputs.favorites_only,
    }
}

/// Cheap identity of a [`ViewInputs`]: list and favorites are represented
/// by their change counters instead of their contents.
#[derive(Debug, Clone, PartialEq)]
struct Fingerprint {
    query: String,
    sort_key: SortKey,
    favorites_only: bool,
    favorites_revision: u64,
    generation: u64,
    status: FetchStatus,
    error: Option<FetchError>,
    pager: Pager,
    loading_more: bool,
}

impl Fingerprint {
    fn of(inputs: &ViewInputs) -> Self {
        Self {
            query: inputs.query.clone(),
            sort_key: inputs.sort_key,
            favorites_only: inputs.favorites_only,
            favorites_revision: inputs.favorites_revision,
            generation: inputs.fetch.generation,
            status: inputs.fetch.state.status(),
            error: inputs.fetch.error.clone(),
            pager: inputs.pager,
            loading_more: inputs.loading_more,
        }
    }
}

/// Memoizing wrapper around [`derive_view`].
#[derive(Debug, Default)]
pub struct ViewComposer {
    last: Option<(Fingerprint, Arc<CatalogView>)>,
    recomputations: u64,
}

impl ViewComposer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Derive the view, reusing the previous one when nothing changed.
    pub fn compose(&mut self, inputs: &ViewInputs) -> Arc<CatalogView> {
        let fingerprint = Fingerprint::of(inputs);
        if let Some((last, view)) = &self.last {
            if *last == fingerprint {
                return view.clone();
            }
        }
        let view = Arc::new(derive_view(inputs));
        self.recomputations += 1;
        self.last = Some((fingerprint, view.clone()));
        view
    }

    /// How many times the view was actually derived.
    pub fn recomputations(&self) -> u64 {
        self.recomputations
    }

}
