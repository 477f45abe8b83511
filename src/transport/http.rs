//! HTTP transport backed by reqwest.
//!
//! Requires the `http` feature.
//!
//! Every request carries `Authorization: Bearer <token>` when the session
//! store holds one. A 401 response clears the token and broadcasts
//! [`SessionSignal::Invalidated`] before the error is returned.

use reqwest::{RequestBuilder, StatusCode};
use serde_json::Value;
use tokio_util::sync::CancellationToken;

use super::Transport;
use crate::config::CatalogConfig;
use crate::error::TransportError;
use crate::session::{SessionSignal, SessionSignals, SessionStore};

/// reqwest-based [`Transport`].
#[derive(Debug, Clone)]
pub struct HttpTransport<S> {
    client: reqwest::Client,
    base_url: String,
    session: S,
    signals: SessionSignals,
}

impl<S: SessionStore> HttpTransport<S> {
    /// Transport with a default reqwest client.
    pub fn new(base_url: impl Into<String>, session: S, signals: SessionSignals) -> Self {
        Self::with_client(reqwest::Client::new(), base_url, session, signals)
    }

    /// Transport with a caller-provided client.
    pub fn with_client(
        client: reqwest::Client,
        base_url: impl Into<String>,
        session: S,
        signals: SessionSignals,
    ) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            session,
            signals,
        }
    }

    /// Transport configured from `config` (API base and request timeout).
    pub fn from_config(
        config: &CatalogConfig,
        session: S,
        signals: SessionSignals,
    ) -> Result<Self, TransportError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| TransportError::Network(e.to_string()))?;
        Ok(Self::with_client(client, config.api_base.clone(), session, signals))
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn session(&self) -> &S {
        &self.session
    }

    fn url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    async fn execute(
        &self,
        request: RequestBuilder,
        cancel: &CancellationToken,
    ) -> Result<Value, TransportError> {
        let request = match self.session.token() {
            Some(token) => request.bearer_auth(token),
            None => request,
        };

        let response = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(TransportError::Cancelled),
            sent = request.send() => sent.map_err(|e| TransportError::Network(e.to_string()))?,
        };

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            tracing::warn!(url = %response.url(), "credential rejected, clearing session");
            self.session.clear_token();
            self.signals.notify(SessionSignal::Invalidated);
            return Err(TransportError::Unauthorized);
        }
        if !status.is_success() {
            return Err(TransportError::Status(status.as_u16()));
        }

        let body = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(TransportError::Cancelled),
            body = response.bytes() => body.map_err(|e| TransportError::Network(e.to_string()))?,
        };
        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_slice(&body)?)
    }
}

impl<S: SessionStore> Transport for HttpTransport<S> {
    async fn get(&self, path: &str, cancel: &CancellationToken) -> Result<Value, TransportError> {
        let request = self.client.get(self.url(path));
        self.execute(request, cancel).await
    }

    async fn post(
        &self,
        path: &str,
        body: &Value,
        cancel: &CancellationToken,
    ) -> Result<Value, TransportError> {
        let request = self.client.post(self.url(path)).json(body);
        self.execute(request, cancel).await
    }
}
