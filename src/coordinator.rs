//! Fetch coordinator: owns the request lifecycle for product queries.
//!
//! Every call to [`FetchCoordinator::resolve`] allocates a request id and a
//! cancellation token, records them in the in-flight table and moves the
//! "current" pointer to the new id, cancelling whatever was current before.
//! When a request settles, its result is applied only if its id is still
//! current; anything else is discarded without touching state. That check,
//! not the transport honouring cancellation, is what keeps at most one
//! request effective.
//!
//! ## Example
//!
//! ```ignore
//! let coordinator = FetchCoordinator::new(transport, session, signals, "/products/list");
//! match coordinator.resolve("caneta").await {
//!     Resolution::Applied { count } => println!("{} products", count),
//!     Resolution::Failed(err) => eprintln!("{}", err),
//!     _ => {}
//! }
//! ```

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::{FetchError, TransportError};
use crate::normalize::normalize_payload;
use crate::product::ProductRecord;
use crate::query::ProductQuery;
use crate::session::{SessionSignal, SessionSignals, SessionStore};
use crate::transport::Transport;

/// The canonical product list, shared between snapshots.
pub type ProductList = Arc<Vec<ProductRecord>>;

/// Lifecycle of the current effective query.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchState {
    Idle,
    Loading,
    Ready(ProductList),
    Failed(String),
}

impl FetchState {
    pub fn status(&self) -> FetchStatus {
        match self {
            FetchState::Idle => FetchStatus::Idle,
            FetchState::Loading => FetchStatus::Loading,
            FetchState::Ready(_) => FetchStatus::Ready,
            FetchState::Failed(_) => FetchStatus::Failed,
        }
    }
}

/// Discriminant of [`FetchState`], cheap to copy and compare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FetchStatus {
    Idle,
    Loading,
    Ready,
    Failed,
}

/// What happened to a single `resolve` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// The result replaced the canonical list.
    Applied { count: usize },
    /// A newer request took over; the result was discarded.
    Superseded,
    /// The request was cancelled while still current.
    Cancelled,
    /// The session was rejected; the token was cleared and login requested.
    Unauthorized,
    /// Transient failure, surfaced inline. The canonical list is unchanged.
    Failed(FetchError),
}

/// Consistent view of coordinator state taken under a single lock.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchSnapshot {
    pub state: FetchState,
    pub canonical: ProductList,
    /// Bumped every time the canonical list is replaced.
    pub generation: u64,
    /// Inline error, present only for transient failures not yet dismissed.
    pub error: Option<FetchError>,
    /// Whether any request has ever been applied.
    pub loaded: bool,
}

struct Inner {
    next_id: u64,
    current: Option<u64>,
    tokens: HashMap<u64, CancellationToken>,
    state: FetchState,
    canonical: ProductList,
    generation: u64,
    error: Option<FetchError>,
    last_query: Option<ProductQuery>,
    loaded: bool,
}

impl Inner {
    fn settled_state(&self) -> FetchState {
        if self.loaded {
            FetchState::Ready(self.canonical.clone())
        } else {
            FetchState::Idle
        }
    }
}

/// Coordinates product requests over a [`Transport`].
pub struct FetchCoordinator<T> {
    transport: T,
    session: Arc<dyn SessionStore>,
    signals: SessionSignals,
    list_path: String,
    inner: Mutex<Inner>,
}

impl<T: Transport> FetchCoordinator<T> {
    pub fn new(
        transport: T,
        session: Arc<dyn SessionStore>,
        signals: SessionSignals,
        list_path: impl Into<String>,
    ) -> Self {
        Self {
            transport,
            session,
            signals,
            list_path: list_path.into(),
            inner: Mutex::new(Inner {
                next_id: 1,
                current: None,
                tokens: HashMap::new(),
                state: FetchState::Idle,
                canonical: Arc::new(Vec::new()),
                generation: 0,
                error: None,
                last_query: None,
                loaded: false,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Resolve an already-normalized query.
    pub async fn resolve(&self, normalized_query: &str) -> Resolution {
        self.resolve_query(ProductQuery::classify(normalized_query)).await
    }

    /// Re-issue the last effective query (list-all if there was none).
    pub async fn retry(&self) -> Resolution {
        let query = self.lock().last_query.clone().unwrap_or(ProductQuery::ListAll);
        self.resolve_query(query).await
    }

    /// Resolve a classified query, superseding any request in flight.
    pub async fn resolve_query(&self, query: ProductQuery) -> Resolution {
        let (request_id, token) = self.begin(&query);
        debug!(request_id, query = %query.text(), "issuing product request");

        let request = query.request(&self.list_path);
        let outcome = self.transport.send(&request, &token).await;

        self.settle(request_id, outcome)
    }

    fn begin(&self, query: &ProductQuery) -> (u64, CancellationToken) {
        let mut inner = self.lock();

        if let Some(previous) = inner.current.take() {
            if let Some(token) = inner.tokens.remove(&previous) {
                token.cancel();
                debug!(request_id = previous, "superseded in-flight request");
            }
        }

        let request_id = inner.next_id;
        inner.next_id += 1;
        let token = CancellationToken::new();
        inner.tokens.insert(request_id, token.clone());
        inner.current = Some(request_id);
        inner.state = FetchState::Loading;
        inner.error = None;
        inner.last_query = Some(query.clone());

        (request_id, token)
    }

    fn settle(
        &self,
        request_id: u64,
        outcome: Result<serde_json::Value, TransportError>,
    ) -> Resolution {
        let mut inner = self.lock();
        inner.tokens.remove(&request_id);

        if inner.current != Some(request_id) {
            debug!(request_id, "discarding superseded result");
            return Resolution::Superseded;
        }
        inner.current = None;

        let payload = match outcome {
            Ok(payload) => payload,
            Err(err) => return self.fail(&mut inner, request_id, FetchError::from(err)),
        };

        let list = normalize_payload(&payload);
        let count = list.len();
        inner.canonical = Arc::new(list);
        inner.generation += 1;
        inner.loaded = true;
        inner.error = None;
        inner.state = FetchState::Ready(inner.canonical.clone());
        info!(request_id, count, generation = inner.generation, "applied product list");

        Resolution::Applied { count }
    }

    fn fail(&self, inner: &mut Inner, request_id: u64, err: FetchError) -> Resolution {
        match err {
            FetchError::Cancelled => {
                debug!(request_id, "request cancelled");
                inner.state = inner.settled_state();
                Resolution::Cancelled
            }
            FetchError::Unauthorized => {
                warn!(request_id, "session rejected, requesting login");
                self.session.clear_token();
                inner.error = None;
                inner.state = FetchState::Failed(FetchError::Unauthorized.to_string());
                self.signals.notify(SessionSignal::LoginRequired);
                Resolution::Unauthorized
            }
            FetchError::Transient(detail) => {
                warn!(request_id, %detail, "product request failed");
                let err = FetchError::Transient(detail);
                inner.state = FetchState::Failed(err.to_string());
                inner.error = Some(err.clone());
                Resolution::Failed(err)
            }
        }
    }

    /// Cancel the current request, if any. Its eventual result is discarded.
    pub fn cancel_inflight(&self) {
        let mut inner = self.lock();
        if let Some(current) = inner.current.take() {
            if let Some(token) = inner.tokens.remove(&current) {
                token.cancel();
            }
            inner.state = inner.settled_state();
            debug!(request_id = current, "cancelled in-flight request");
        }
    }

    /// Hide the inline error without touching the list.
    pub fn dismiss_error(&self) {
        let mut inner = self.lock();
        inner.error = None;
        if matches!(inner.state, FetchState::Failed(_)) {
            inner.state = inner.settled_state();
        }
    }

    pub fn state(&self) -> FetchState {
        self.lock().state.clone()
    }

    pub fn status(&self) -> FetchStatus {
        self.lock().state.status()
    }

    pub fn is_loading(&self) -> bool {
        self.status() == FetchStatus::Loading
    }

    pub fn canonical(&self) -> ProductList {
        self.lock().canonical.clone()
    }

    pub fn generation(&self) -> u64 {
        self.lock().generation
    }

    pub fn error(&self) -> Option<FetchError> {
        self.lock().error.clone()
    }

    pub fn last_query(&self) -> Option<ProductQuery> {
        self.lock().last_query.clone()
    }

    /// Number of requests whose tokens are still tracked.
    pub fn inflight(&self) -> usize {
        self.lock().tokens.len()
    }

    pub fn snapshot(&self) -> FetchSnapshot {
        let inner = self.lock();
        FetchSnapshot {
            state: inner.state.clone(),
            canonical: inner.canonical.clone(),
            generation: inner.generation,
            error: inner.error.clone(),
            loaded: inner.loaded,
        }
    }
}
