// SPDX-License-Identifier: Apache-2.0
use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use serde_json::json;
use thiserror::Error;

/// Failure to map a logical service key to a network address.
#[derive(Debug, Error)]
pub enum ResolveError {
    /// No binding exists for the requested service key. This is a
    /// configuration problem and is never worth retrying.
    #[error("no endpoint binding for service '{0}'")]
    UnknownService(String),
}

/// Failure to fetch a resolved endpoint.
///
/// None of these are retried; each request either succeeds or fails
/// once and the outcome is handed back to the caller.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error(transparent)]
    Resolve(#[from] ResolveError),
    /// The identity collaborator signalled that no session exists and
    /// no token will arrive.
    #[error("no active session, cannot obtain a bearer token")]
    NoSession,
    /// The upstream could not be reached or answered with a non-2xx
    /// status.
    #[error("upstream unavailable: {0}")]
    UpstreamUnavailable(String),
    /// The upstream answered 2xx but the body was not valid JSON.
    #[error("upstream body is not valid JSON: {0}")]
    MalformedResponse(#[from] serde_json::Error),
}

impl ResponseError for FetchError {
    fn status_code(&self) -> StatusCode {
        match self {
            FetchError::Resolve(_) => StatusCode::INTERNAL_SERVER_ERROR,
            FetchError::NoSession => StatusCode::UNAUTHORIZED,
            FetchError::UpstreamUnavailable(_) | FetchError::MalformedResponse(_) => {
                StatusCode::BAD_GATEWAY
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        let error = match self {
            FetchError::Resolve(_) => "unknown service",
            FetchError::NoSession => "not authenticated",
            FetchError::UpstreamUnavailable(_) | FetchError::MalformedResponse(_) => {
                "unable to fetch"
            }
        };
        HttpResponse::build(self.status_code()).json(json!({
            "error": error,
            "description": self.to_string(),
        }))
    }
}
