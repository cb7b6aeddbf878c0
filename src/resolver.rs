// SPDX-License-Identifier: Apache-2.0
use std::time::Duration;

use actix_web::http::header;
use serde_json::Value;
use tracing::{debug, error, instrument};

use crate::bindings::EndpointBindings;
use crate::error::FetchError;
use crate::token::{TokenSource, TokenState};

/// Caller-supplied policy for a single resolved fetch.
#[derive(Debug, Clone, Default)]
pub struct FetchPolicy {
    protected: bool,
    headers: Vec<(String, String)>,
}

impl FetchPolicy {
    /// No bearer token is attached.
    pub fn public() -> Self {
        Self::default()
    }

    /// A bearer token is obtained from the token source and attached as
    /// the `Authorization` header.
    pub fn protected() -> Self {
        Self {
            protected: true,
            headers: Vec::new(),
        }
    }

    /// Merge an extra header into the outbound request, e.g. for
    /// user-identity propagation.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn is_protected(&self) -> bool {
        self.protected
    }
}

/// Resolve a logical service route and fetch it as JSON.
///
/// For a protected policy the token source is consulted first and the
/// call suspends there; no network request is issued before a token is
/// available. A terminal no-session answer fails the request with
/// [`FetchError::NoSession`].
///
/// One GET, no retries, no response caching. Transport failures and
/// non-2xx statuses surface as [`FetchError::UpstreamUnavailable`]; a
/// 2xx response whose body is not valid JSON surfaces as
/// [`FetchError::MalformedResponse`].
#[instrument(skip(bindings, tokens, policy), fields(service = %service_key, path = %path_suffix))]
pub async fn fetch_resolved(
    bindings: &EndpointBindings,
    tokens: &impl TokenSource,
    service_key: &str,
    path_suffix: &str,
    policy: &FetchPolicy,
) -> Result<Value, FetchError> {
    let bearer = if policy.protected {
        match tokens.access_token().await {
            TokenState::Ready(token) => Some(token),
            TokenState::NoSession => return Err(FetchError::NoSession),
        }
    } else {
        None
    };

    let url = bindings.resolve(service_key, path_suffix)?;
    debug!(url = %url, protected = policy.protected, "fetching resolved endpoint");

    // Fresh client per call; use ClientBuilder for custom timeouts
    let connector = awc::Connector::new()
        .timeout(Duration::from_secs(10))
        .conn_keep_alive(Duration::from_secs(15))
        .disconnect_timeout(Duration::from_secs(2));

    let client = awc::ClientBuilder::new()
        .timeout(Duration::from_secs(30))
        .connector(connector)
        .finish();

    let mut request = client.get(url.as_str());
    if let Some(token) = &bearer {
        request = request.insert_header((header::AUTHORIZATION, format!("Bearer {token}")));
    }
    for (name, value) in &policy.headers {
        request = request.insert_header((name.as_str(), value.as_str()));
    }

    let mut response = request.send().await.map_err(|e| {
        error!(error = %e, url = %url, "upstream request failed");
        FetchError::UpstreamUnavailable(e.to_string())
    })?;

    let status = response.status();
    if !status.is_success() {
        debug!(status = %status, url = %url, "upstream answered with non-success status");
        return Err(FetchError::UpstreamUnavailable(format!(
            "upstream answered {status}"
        )));
    }

    let body = response
        .body()
        .await
        .map_err(|e| FetchError::UpstreamUnavailable(e.to_string()))?;

    Ok(serde_json::from_slice(&body)?)
}
