// SPDX-License-Identifier: Apache-2.0
use actix_session::Session;
use actix_web::{HttpResponse, Responder, http::header, web};
use serde::Deserialize;
use serde_json::json;
use tracing::{info, instrument};

use crate::bindings::EndpointBindings;
use crate::config::AppConfig;
use crate::error::FetchError;
use crate::resolver::{FetchPolicy, fetch_resolved};
use crate::token::SessionToken;

/// Session entry holding the opaque bearer token
pub const TOKEN_SESSION_KEY: &str = "access_token";
/// Session entry holding the authenticated user identifier, if any
pub const USER_SESSION_KEY: &str = "user";
/// Header used to propagate the session user to upstream services
pub const USER_HEADER: &str = "X-Waypost-User";

/// Health check endpoint
async fn health_check() -> impl Responder {
    HttpResponse::Ok().json("Waypost is running")
}

/// The full binding table, as seen at startup
async fn list_endpoints(bindings: web::Data<EndpointBindings>) -> impl Responder {
    HttpResponse::Ok().json(bindings.entries())
}

#[derive(Debug, Deserialize)]
struct ResolveQuery {
    service: String,
    #[serde(default = "root_path")]
    path: String,
}

fn root_path() -> String {
    "/".to_string()
}

/// Resolve a logical service route into a URL without fetching it
async fn resolve_endpoint(
    query: web::Query<ResolveQuery>,
    bindings: web::Data<EndpointBindings>,
) -> impl Responder {
    match bindings.resolve(&query.service, &query.path) {
        Ok(url) => HttpResponse::Ok().json(json!({ "url": url })),
        Err(e) => HttpResponse::NotFound().json(json!({
            "error": "unknown service",
            "description": e.to_string(),
        })),
    }
}

/// Fetch the configured public route; no token is ever attached
async fn public_api(
    bindings: web::Data<EndpointBindings>,
    config: web::Data<AppConfig>,
) -> Result<HttpResponse, FetchError> {
    let target = &config.public_target;
    let tokens = SessionToken::new(None);
    let data = fetch_resolved(
        &bindings,
        &tokens,
        &target.service,
        &target.path,
        &FetchPolicy::public(),
    )
    .await?;
    Ok(HttpResponse::Ok().json(data))
}

/// Fetch the configured protected route with the session's bearer token
async fn protected_api(
    session: Session,
    bindings: web::Data<EndpointBindings>,
    config: web::Data<AppConfig>,
) -> Result<HttpResponse, FetchError> {
    let tokens = SessionToken::new(session_token(&session));

    let mut policy = FetchPolicy::protected();
    if let Ok(Some(user)) = session.get::<String>(USER_SESSION_KEY) {
        policy = policy.with_header(USER_HEADER, user);
    }

    let target = &config.protected_target;
    let data = fetch_resolved(&bindings, &tokens, &target.service, &target.path, &policy).await?;
    Ok(HttpResponse::Ok().json(data))
}

/// Hand the session's token back to the caller, as the identity
/// collaborator surface does
async fn access_token(session: Session) -> impl Responder {
    match session_token(&session) {
        Some(token) => HttpResponse::Ok().json(json!({ "data": token })),
        None => HttpResponse::Unauthorized().json(json!({ "error": "not authenticated" })),
    }
}

#[derive(Debug, Deserialize)]
struct AuthCallback {
    token: String,
    user: Option<String>,
}

/// Landing point of the identity provider's redirect surface. Stores
/// the opaque token in the cookie session; the token itself is never
/// inspected.
#[instrument(skip(query, session))]
async fn auth(query: web::Query<AuthCallback>, session: Session) -> impl Responder {
    session.insert(TOKEN_SESSION_KEY, query.token.clone()).ok();
    if let Some(user) = &query.user {
        info!(user = %user, "session established");
        session.insert(USER_SESSION_KEY, user.clone()).ok();
    }

    HttpResponse::Found()
        .append_header((header::LOCATION, "/"))
        .finish()
}

/// Drop the session and its token
async fn logout(session: Session) -> impl Responder {
    session.purge();
    HttpResponse::Found()
        .append_header((header::LOCATION, "/"))
        .finish()
}

fn session_token(session: &Session) -> Option<String> {
    session.get::<String>(TOKEN_SESSION_KEY).unwrap_or(None)
}

/// Register all gateway routes on an actix app
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/health").route(web::get().to(health_check)))
        .service(web::resource("/endpoints").route(web::get().to(list_endpoints)))
        .service(web::resource("/resolve").route(web::get().to(resolve_endpoint)))
        .service(web::resource("/auth").route(web::get().to(auth)))
        .service(web::resource("/logout").route(web::get().to(logout)))
        .service(web::resource("/api/access-token").route(web::get().to(access_token)))
        .service(web::resource("/api/protected").route(web::get().to(protected_api)))
        .service(web::resource("/api/public").route(web::get().to(public_api)));
}
