//! Transport boundary: how the coordinator reaches the product service.
//!
//! A transport issues one call per request and honours the cancellation
//! token it is handed: once the token is cancelled the call should resolve
//! to [`TransportError::Cancelled`] as soon as it can. The coordinator never
//! relies on that for correctness, only for not wasting the connection.
//!
//! ## Implementations
//!
//! - [`HttpTransport`]: reqwest-backed. Attaches the bearer token and
//!   turns HTTP 401 into a session invalidation (requires the `http`
//!   feature, on by default).
//!
//! ## Example
//!
//! ```ignore
//! use catalog_sync::{HttpTransport, InMemorySessionStore, SessionSignals};
//!
//! let transport = HttpTransport::new(
//!     "http://localhost:3000",
//!     InMemorySessionStore::with_token("secret"),
//!     SessionSignals::new(),
//! );
//! ```

use std::future::Future;
use std::sync::Arc;

use serde_json::Value;
use tokio_util::sync::CancellationToken;

use crate::error::TransportError;
use crate::query::ProductRequest;

/// An asynchronous JSON request/response channel.
pub trait Transport: Send + Sync {
    /// `GET path`.
    fn get(
        &self,
        path: &str,
        cancel: &CancellationToken,
    ) -> impl Future<Output = Result<Value, TransportError>> + Send;

    /// `POST path` with a JSON body.
    fn post(
        &self,
        path: &str,
        body: &Value,
        cancel: &CancellationToken,
    ) -> impl Future<Output = Result<Value, TransportError>> + Send;

    /// Issue a [`ProductRequest`] through `get` or `post`.
    fn send(
        &self,
        request: &ProductRequest,
        cancel: &CancellationToken,
    ) -> impl Future<Output = Result<Value, TransportError>> + Send {
        async move {
            match request {
                ProductRequest::Get { path } => self.get(path, cancel).await,
                ProductRequest::Post { path, body } => self.post(path, body, cancel).await,
            }
        }
    }
}

impl<T: Transport> Transport for Arc<T> {
    fn get(
        &self,
        path: &str,
        cancel: &CancellationToken,
    ) -> impl Future<Output = Result<Value, TransportError>> + Send {
        (**self).get(path, cancel)
    }

    fn post(
        &self,
        path: &str,
        body: &Value,
        cancel: &CancellationToken,
    ) -> impl Future<Output = Result<Value, TransportError>> + Send {
        (**self).post(path, body, cancel)
    }
}

#[cfg(feature = "http")]
mod http;
#[cfg(feature = "http")]
pub use http::HttpTransport;
