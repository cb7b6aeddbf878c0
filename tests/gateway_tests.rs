// SPDX-License-Identifier: Apache-2.0
use std::net::TcpListener;
use std::sync::atomic::{AtomicUsize, Ordering};

use actix_session::{SessionMiddleware, storage::CookieSessionStore};
use actix_web::cookie::Key;
use actix_web::{App, HttpRequest, HttpResponse, HttpServer, http::header, test, web};
use serde_json::{Value, json};

use waypost::bindings::EndpointBindings;
use waypost::config::{AppConfig, RouteTarget};
use waypost::gateway;

async fn echo(req: HttpRequest, hits: web::Data<AtomicUsize>) -> HttpResponse {
    hits.fetch_add(1, Ordering::SeqCst);
    let auth = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok());
    let user = req
        .headers()
        .get("X-Waypost-User")
        .and_then(|v| v.to_str().ok());
    HttpResponse::Ok().json(json!({ "auth": auth, "user": user }))
}

async fn boom() -> HttpResponse {
    HttpResponse::InternalServerError().json(json!({ "error": "kaboom" }))
}

fn spawn_upstream() -> String {
    let hits = web::Data::new(AtomicUsize::new(0));
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind upstream listener");
    let addr = listener.local_addr().expect("upstream local addr");

    let server = HttpServer::new(move || {
        App::new()
            .app_data(hits.clone())
            .route("/echo", web::get().to(echo))
            .route("/boom", web::get().to(boom))
    })
    .listen(listener)
    .expect("listen upstream")
    .workers(1)
    .disable_signals()
    .run();
    actix_web::rt::spawn(server);

    format!("http://{addr}")
}

fn test_config(path: &str) -> AppConfig {
    AppConfig {
        listen_addr: "127.0.0.1:0".to_string(),
        protected_target: RouteTarget {
            service: "test/upstream".to_string(),
            path: path.to_string(),
        },
        public_target: RouteTarget {
            service: "test/upstream".to_string(),
            path: path.to_string(),
        },
    }
}

fn session_middleware() -> SessionMiddleware<CookieSessionStore> {
    SessionMiddleware::builder(CookieSessionStore::default(), Key::from(&[7u8; 64]))
        .cookie_secure(false)
        .build()
}

macro_rules! gateway_app {
    ($bindings:expr, $config:expr) => {
        test::init_service(
            App::new()
                .wrap(session_middleware())
                .app_data(web::Data::new($bindings))
                .app_data(web::Data::new($config))
                .configure(gateway::configure),
        )
        .await
    };
}

fn bindings_for(base_url: String) -> EndpointBindings {
    EndpointBindings::from_vars([("WAYPOST_ENDPOINT__TEST__UPSTREAM____REST", base_url)])
}

#[actix_web::test]
async fn health_endpoint_is_ok() {
    let app = gateway_app!(EndpointBindings::default(), AppConfig::default());
    let res = test::call_service(&app, test::TestRequest::get().uri("/health").to_request()).await;
    assert!(res.status().is_success());
}

#[actix_web::test]
async fn endpoints_route_lists_the_binding_table() {
    let bindings = EndpointBindings::from_vars([
        ("WAYPOST_ENDPOINT__IAM__PEOPLE____REST", "http://localhost:11408"),
        ("WAYPOST_ENDPOINT__API__GATEWAY____REST", "http://localhost:11485"),
    ]);
    let app = gateway_app!(bindings, AppConfig::default());

    let res =
        test::call_service(&app, test::TestRequest::get().uri("/endpoints").to_request()).await;
    assert!(res.status().is_success());
    let body: Value = test::read_body_json(res).await;
    assert_eq!(body["IAM__PEOPLE"], json!("http://localhost:11408"));
    assert_eq!(body["API__GATEWAY"], json!("http://localhost:11485"));
}

#[actix_web::test]
async fn resolve_route_returns_the_resolved_url() {
    let bindings = bindings_for("http://localhost:11408".to_string());
    let app = gateway_app!(bindings, AppConfig::default());

    let req = test::TestRequest::get()
        .uri("/resolve?service=test/upstream&path=/version")
        .to_request();
    let res = test::call_service(&app, req).await;
    assert!(res.status().is_success());
    let body: Value = test::read_body_json(res).await;
    assert_eq!(body["url"], json!("http://localhost:11408/version"));
}

#[actix_web::test]
async fn resolve_route_reports_unknown_services() {
    let app = gateway_app!(EndpointBindings::default(), AppConfig::default());

    let req = test::TestRequest::get()
        .uri("/resolve?service=app/missing&path=/x")
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status().as_u16(), 404);
    let body: Value = test::read_body_json(res).await;
    assert_eq!(body["error"], json!("unknown service"));
}

#[actix_web::test]
async fn access_token_requires_a_session() {
    let app = gateway_app!(EndpointBindings::default(), AppConfig::default());
    let res = test::call_service(
        &app,
        test::TestRequest::get().uri("/api/access-token").to_request(),
    )
    .await;
    assert_eq!(res.status().as_u16(), 401);
}

#[actix_web::test]
async fn auth_establishes_a_session_holding_the_token() {
    let app = gateway_app!(EndpointBindings::default(), AppConfig::default());

    let res = test::call_service(
        &app,
        test::TestRequest::get()
            .uri("/auth?token=abc123&user=ada")
            .to_request(),
    )
    .await;
    assert_eq!(res.status().as_u16(), 302);
    let cookie = res
        .response()
        .cookies()
        .next()
        .expect("auth should set a session cookie")
        .into_owned();

    let req = test::TestRequest::get()
        .uri("/api/access-token")
        .cookie(cookie)
        .to_request();
    let res = test::call_service(&app, req).await;
    assert!(res.status().is_success());
    let body: Value = test::read_body_json(res).await;
    assert_eq!(body["data"], json!("abc123"));
}

#[actix_web::test]
async fn logout_clears_the_session() {
    let app = gateway_app!(EndpointBindings::default(), AppConfig::default());

    let res = test::call_service(
        &app,
        test::TestRequest::get().uri("/auth?token=abc123").to_request(),
    )
    .await;
    let cookie = res.response().cookies().next().unwrap().into_owned();

    let res = test::call_service(
        &app,
        test::TestRequest::get()
            .uri("/logout")
            .cookie(cookie)
            .to_request(),
    )
    .await;
    assert_eq!(res.status().as_u16(), 302);
    // The purged session cookie comes back emptied.
    let cleared = res.response().cookies().next().unwrap().into_owned();
    assert!(cleared.value().is_empty());
}

#[actix_web::test]
async fn protected_api_without_session_is_unauthorized() {
    let app = gateway_app!(EndpointBindings::default(), test_config("/echo"));
    let res = test::call_service(
        &app,
        test::TestRequest::get().uri("/api/protected").to_request(),
    )
    .await;
    assert_eq!(res.status().as_u16(), 401);
}

#[actix_web::test]
async fn public_api_relays_upstream_json_without_a_token() {
    let base = spawn_upstream();
    let app = gateway_app!(bindings_for(base), test_config("/echo"));

    let res = test::call_service(
        &app,
        test::TestRequest::get().uri("/api/public").to_request(),
    )
    .await;
    assert!(res.status().is_success());
    let body: Value = test::read_body_json(res).await;
    assert_eq!(body["auth"], json!(null));
}

#[actix_web::test]
async fn protected_api_forwards_token_and_user_identity() {
    let base = spawn_upstream();
    let app = gateway_app!(bindings_for(base), test_config("/echo"));

    let res = test::call_service(
        &app,
        test::TestRequest::get()
            .uri("/auth?token=abc123&user=ada")
            .to_request(),
    )
    .await;
    let cookie = res.response().cookies().next().unwrap().into_owned();

    let req = test::TestRequest::get()
        .uri("/api/protected")
        .cookie(cookie)
        .to_request();
    let res = test::call_service(&app, req).await;
    assert!(res.status().is_success());
    let body: Value = test::read_body_json(res).await;
    assert_eq!(body["auth"], json!("Bearer abc123"));
    assert_eq!(body["user"], json!("ada"));
}

#[actix_web::test]
async fn upstream_failure_surfaces_as_bad_gateway() {
    let base = spawn_upstream();
    let app = gateway_app!(bindings_for(base), test_config("/boom"));

    let res = test::call_service(
        &app,
        test::TestRequest::get().uri("/api/public").to_request(),
    )
    .await;
    assert_eq!(res.status().as_u16(), 502);
    let body: Value = test::read_body_json(res).await;
    assert_eq!(body["error"], json!("unable to fetch"));
}
