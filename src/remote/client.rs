//! Shared REST plumbing for both facades

use reqwest::{header, Client, RequestBuilder, Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use super::error::RemoteError;
use crate::auth::TokenProvider;

/// Authenticated JSON client bound to one service.
#[derive(Clone)]
pub struct ApiClient {
    service: &'static str,
    base_url: Url,
    scope: String,
    http: Client,
    tokens: Arc<dyn TokenProvider>,
}

impl ApiClient {
    pub fn new(
        service: &'static str,
        base_url: &str,
        scope: impl Into<String>,
        tokens: Arc<dyn TokenProvider>,
        timeout: Option<Duration>,
    ) -> Result<Self, RemoteError> {
        let base_url = Url::parse(base_url).map_err(|e| {
            RemoteError::Internal(format!(
                "invalid {} base url '{}': {}",
                service, base_url, e
            ))
        })?;
        if base_url.cannot_be_a_base() {
            return Err(RemoteError::Internal(format!(
                "invalid {} base url '{}'",
                service, base_url
            )));
        }

        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder.build().map_err(|e| RemoteError::Transport {
            service,
            message: e.to_string(),
        })?;

        Ok(Self {
            service,
            base_url,
            scope: scope.into(),
            http,
            tokens,
        })
    }

    /// Base URL with `segments` appended (each one percent-encoded) and `query` pairs.
    pub fn url(&self, segments: &[&str], query: &[(&str, &str)]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query);
        }
        url
    }

    pub async fn get(&self, url: Url) -> Result<Response, RemoteError> {
        self.execute(self.http.get(url)).await
    }

    pub async fn post<B: Serialize + ?Sized>(
        &self,
        url: Url,
        body: &B,
    ) -> Result<Response, RemoteError> {
        self.execute(self.http.post(url).json(body)).await
    }

    /// Decode a JSON body; any failure is a `Decode` error.
    pub async fn decode<T: DeserializeOwned>(&self, response: Response) -> Result<T, RemoteError> {
        response.json::<T>().await.map_err(|e| RemoteError::Decode {
            service: self.service,
            message: e.to_string(),
        })
    }

    /// Fetch a token, send, and turn any status >= 400 into `RemoteError::Status`.
    async fn execute(&self, request: RequestBuilder) -> Result<Response, RemoteError> {
        let token = self
            .tokens
            .token(&[self.scope.as_str()])
            .await
            .map_err(|e| RemoteError::Auth {
                service: self.service,
                message: e.to_string(),
            })?;

        let response = request
            .bearer_auth(&token.token)
            .header(header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| RemoteError::Transport {
                service: self.service,
                message: e.to_string(),
            })?;

        let status = response.status();
        let url = response.url().clone();
        if status.is_client_error() || status.is_server_error() {
            let body = response.text().await.unwrap_or_default();
            warn!(service = self.service, status = status.as_u16(), url = %url, "Request failed");
            return Err(RemoteError::Status {
                service: self.service,
                status: status.as_u16(),
                body,
            });
        }

        debug!(service = self.service, status = status.as_u16(), url = %url, "Request ok");
        Ok(response)
    }
}

/// 202/204 carry no body worth decoding.
pub fn has_body(response: &Response) -> bool {
    !matches!(
        response.status(),
        StatusCode::ACCEPTED | StatusCode::NO_CONTENT
    )
}
