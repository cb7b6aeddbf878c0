use std::time::Duration;

use actix_session::{SessionMiddleware, storage::CookieSessionStore};
use actix_web::cookie::{Key, SameSite};
use actix_web::{App, HttpServer, web};
use tracing_actix_web::TracingLogger;

use waypost::bindings::EndpointBindings;
use waypost::config::AppConfig;
use waypost::gateway;
use waypost::logging::{init_console_tracing, init_tracing};

// Application configuration constants
const SESSION_KEY_ENV: &str = "WAYPOST_SESSION_KEY";
const LOG_FORMAT_ENV: &str = "WAYPOST_LOG_FORMAT";
// Ensure the key is at least 64 bytes for proper security
const DEFAULT_SESSION_KEY: &[u8] =
    b"waypost_development_session_key_please_change_this_is_not_secure_enough_for_production_use";

/// Get session key from environment or use default
fn get_session_key() -> Key {
    match std::env::var(SESSION_KEY_ENV) {
        Ok(key) => Key::from(key.as_bytes()),
        Err(_) => Key::from(DEFAULT_SESSION_KEY),
    }
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    match std::env::var(LOG_FORMAT_ENV).as_deref() {
        Ok("json") => init_tracing("waypost", std::io::stdout),
        _ => init_console_tracing(),
    }

    tracing::info!("🧭 Starting Waypost endpoint gateway...");
    if std::env::var(SESSION_KEY_ENV).is_err() {
        tracing::warn!("No session key set in environment. Using development default.");
    }

    let config = AppConfig::from_env();
    let bindings = EndpointBindings::from_env();
    if bindings.is_empty() {
        tracing::warn!(
            "No endpoint bindings found in environment. \
             All resolutions will fail until WAYPOST_ENDPOINT__* variables are set."
        );
    } else {
        tracing::info!(count = bindings.len(), "Loaded endpoint bindings");
    }

    let session_key = get_session_key();
    let listen_addr = config.listen_addr.clone();

    let bindings = web::Data::new(bindings);
    let config = web::Data::new(config);

    HttpServer::new(move || {
        App::new()
            .wrap(TracingLogger::default())
            .wrap(
                SessionMiddleware::builder(CookieSessionStore::default(), session_key.clone())
                    .cookie_secure(false) // Set to true in production with HTTPS
                    .cookie_http_only(true)
                    .cookie_same_site(SameSite::Lax)
                    .build(),
            )
            .app_data(bindings.clone())
            .app_data(config.clone())
            .configure(gateway::configure)
    })
    .bind(listen_addr)?
    .client_request_timeout(Duration::from_secs(60))
    .workers(4)
    .run()
    .await
}
