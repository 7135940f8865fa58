//! HTTP behaviour of the storefront router.

mod common;

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::response::Response;
use axum::Router;
use common::{collections_json, products_json, FailingStore, FakeClient};
use edge_data::QueryError;
use edge_executor::OrderingStrategy;
use edge_kv::{KeyValueStore, MemoryStore};
use edge_observability::{LogCapture, LogEntry, LogLevel};
use http_body_util::BodyExt;
use serde_json::json;
use storefront_catalog::{ALL_COLLECTIONS, RECOMMENDED_PRODUCTS};
use storefront_home::{router, AppState, StorefrontConfig};
use tower::ServiceExt;

fn config(ordering: OrderingStrategy) -> StorefrontConfig {
    let mut config = StorefrontConfig::default();
    config.storefront.domain = "wicked-works.myshopify.com".into();
    config.loader.ordering = ordering;
    config
}

fn healthy_client() -> FakeClient {
    FakeClient::new()
        .respond(ALL_COLLECTIONS, collections_json(3))
        .respond(RECOMMENDED_PRODUCTS, products_json(4))
}

fn app_with_store(
    client: Arc<FakeClient>,
    ordering: OrderingStrategy,
    store: Arc<dyn KeyValueStore>,
) -> (Router, AppState, LogCapture) {
    let capture = LogCapture::new();
    let state = AppState::new(&config(ordering), client, store)
        .unwrap()
        .with_log_capture(capture.clone());
    (router(state.clone()), state, capture)
}

fn app_with(client: Arc<FakeClient>, ordering: OrderingStrategy) -> (Router, AppState, LogCapture) {
    app_with_store(client, ordering, Arc::new(MemoryStore::new()))
}

fn with_cookie(uri: &str, cookie: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header(header::COOKIE, cookie)
        .body(Body::empty())
        .unwrap()
}

fn app(client: FakeClient) -> Router {
    app_with(Arc::new(client), OrderingStrategy::OutOfOrder).0
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn form(uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn body_text(response: Response) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

fn session_cookie(response: &Response) -> String {
    let set_cookie = response.headers()[header::SET_COOKIE].to_str().unwrap();
    set_cookie.split(';').next().unwrap().to_string()
}

/// Read frames until the footer has arrived.
async fn read_through_footer(body: &mut Body) -> String {
    let mut html = String::new();
    while !html.contains(r#"data-section="footer""#) {
        let frame = body.frame().await.unwrap().unwrap();
        if let Ok(data) = frame.into_data() {
            html.push_str(std::str::from_utf8(&data).unwrap());
        }
    }
    html
}

/// Wait for the page task to log its completion entry.
async fn completion(capture: &LogCapture) -> LogEntry {
    tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            let found = capture
                .entries()
                .into_iter()
                .find(|e| e.message == "Request complete");
            if let Some(entry) = found {
                return entry;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .unwrap()
}

// === Home Page Tests ===

#[tokio::test]
async fn test_home_streams_full_page() {
    let response = app(healthy_client()).oneshot(get("/")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_TYPE],
        "text/html; charset=utf-8"
    );
    assert_eq!(response.headers()["x-request-id"].len(), 32);
    assert!(response.headers().contains_key("traceparent"));
    assert!(session_cookie(&response).starts_with("ww_session=sess_"));

    let html = body_text(response).await;
    assert!(html.starts_with("<!DOCTYPE html>"));
    assert!(html.contains("<title>Wicked Works | Designed with Intention</title>"));
    assert!(html.contains(r#"data-section="preloader""#));
    assert!(html.contains("Designed with Intention"));
    assert!(html.contains("Shop by Category"));
    assert_eq!(html.matches(r#"class="category-card""#).count(), 3);
    assert_eq!(html.matches(r#"class="product-card""#).count(), 4);
    assert!(html.contains("Join the Movement"));
    assert!(html.contains("All systems normal"));
    assert!(html.ends_with("</html>\n"));
}

#[tokio::test]
async fn test_returning_visitor_skips_preloader() {
    let app = app(healthy_client());

    let first = app.clone().oneshot(get("/")).await.unwrap();
    let cookie = session_cookie(&first);
    body_text(first).await;

    let second = app.oneshot(with_cookie("/", &cookie)).await.unwrap();
    assert!(!second.headers().contains_key(header::SET_COOKIE));

    let html = body_text(second).await;
    assert!(!html.contains(r#"data-section="preloader""#));
    assert!(html.contains("Shop by Category"));
}

#[tokio::test]
async fn test_locale_from_query() {
    let client = Arc::new(healthy_client());
    let (app, _, _) = app_with(client.clone(), OrderingStrategy::OutOfOrder);

    let response = app.oneshot(get("/?country=ca&language=fr")).await.unwrap();
    body_text(response).await;

    let calls = client.calls();
    assert_eq!(calls.len(), 2);
    for (_, variables) in calls {
        assert_eq!(variables, json!({ "country": "CA", "language": "FR" }));
    }
}

#[tokio::test]
async fn test_locale_from_accept_language() {
    let client = Arc::new(healthy_client());
    let (app, _, _) = app_with(client.clone(), OrderingStrategy::OutOfOrder);

    let request = Request::builder()
        .uri("/")
        .header(header::ACCEPT_LANGUAGE, "en-GB,en;q=0.9")
        .body(Body::empty())
        .unwrap();
    body_text(app.oneshot(request).await.unwrap()).await;

    let (_, variables) = &client.calls()[0];
    assert_eq!(variables, &json!({ "country": "GB", "language": "EN" }));
}

#[tokio::test]
async fn test_traceparent_continued() {
    let request = Request::builder()
        .uri("/")
        .header(
            "traceparent",
            "00-0af7651916cd43dd8448eb211c80319c-b7ad6b7169203331-01",
        )
        .body(Body::empty())
        .unwrap();
    let response = app(healthy_client()).oneshot(request).await.unwrap();

    assert_eq!(
        response.headers()["x-request-id"],
        "0af7651916cd43dd8448eb211c80319c"
    );
    let traceparent = response.headers()["traceparent"].to_str().unwrap();
    assert!(traceparent.starts_with("00-0af7651916cd43dd8448eb211c80319c-"));
    assert!(!traceparent.contains("b7ad6b7169203331"));
}

#[tokio::test]
async fn test_system_theme_follows_client_hint() {
    let request = Request::builder()
        .uri("/")
        .header("sec-ch-prefers-color-scheme", "light")
        .body(Body::empty())
        .unwrap();
    let html = body_text(app(healthy_client()).oneshot(request).await.unwrap()).await;
    assert!(html.contains(r#"data-theme="light""#));

    let html = body_text(app(healthy_client()).oneshot(get("/")).await.unwrap()).await;
    assert!(html.contains(r#"data-theme="dark""#));
}

// === Critical Failure Tests ===

#[tokio::test]
async fn test_critical_transport_failure_is_500() {
    let client = Arc::new(
        FakeClient::new()
            .fail(ALL_COLLECTIONS, QueryError::Timeout("2s".into()))
            .respond(RECOMMENDED_PRODUCTS, products_json(4)),
    );
    let (app, _, capture) = app_with(client, OrderingStrategy::OutOfOrder);

    let response = app.oneshot(get("/")).await.unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(response.headers().contains_key("x-request-id"));

    let html = body_text(response).await;
    assert!(html.contains("<h1>500</h1>"));
    assert!(!html.contains("Shop by Category"));

    let errors = capture.at_level(LogLevel::Error);
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].message, "Critical fetch failed");
}

#[tokio::test]
async fn test_critical_graphql_error_is_400() {
    let client = FakeClient::new()
        .fail(
            ALL_COLLECTIONS,
            QueryError::GraphQl(vec!["Invalid country code".into()]),
        )
        .respond(RECOMMENDED_PRODUCTS, products_json(4));

    let response = app(client).oneshot(get("/")).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(body_text(response).await.contains("<h1>400</h1>"));
}

// === Deferred Failure Tests ===

#[tokio::test]
async fn test_deferred_failure_still_renders_page() {
    for ordering in [OrderingStrategy::Strict, OrderingStrategy::OutOfOrder] {
        let client = Arc::new(
            FakeClient::new()
                .respond(ALL_COLLECTIONS, collections_json(2))
                .fail(RECOMMENDED_PRODUCTS, QueryError::Connection("reset".into())),
        );
        let (app, _, capture) = app_with(client, ordering);

        let response = app.oneshot(get("/")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let html = body_text(response).await;
        assert!(html.contains("Shop by Category"));
        assert!(!html.contains("Featured Products"));
        assert!(html.contains("Join the Movement"));
        assert!(html.ends_with("</html>\n"));

        assert_eq!(capture.at_level(LogLevel::Warn).len(), 1);
        assert!(capture.at_level(LogLevel::Error).is_empty());
    }
}

#[tokio::test]
async fn test_out_of_order_swaps_in_late_products() {
    let client = Arc::new(healthy_client());
    let release = client.gate(RECOMMENDED_PRODUCTS);
    let (app, _, _) = app_with(client, OrderingStrategy::OutOfOrder);

    let response = app.oneshot(get("/")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // Headers and everything up to the footer arrive while recommendations
    // are still held back.
    let mut body = response.into_body();
    let mut html = read_through_footer(&mut body).await;
    assert!(!html.contains("<template"));

    release.send(()).unwrap();
    let rest = body.collect().await.unwrap().to_bytes();
    html.push_str(std::str::from_utf8(&rest).unwrap());

    let placeholder = html.find(r#"id="slot-featured_products""#).unwrap();
    let footer = html.find(r#"data-section="footer""#).unwrap();
    let template = html.find(r#"<template data-slot="slot-featured_products">"#).unwrap();
    assert!(placeholder < footer && footer < template);
    assert!(html.contains("Loading products..."));
    assert_eq!(html[template..].matches(r#"class="product-card""#).count(), 4);
}

#[tokio::test]
async fn test_completion_log_reports_timings() {
    let (app, _, capture) = app_with(Arc::new(healthy_client()), OrderingStrategy::OutOfOrder);
    body_text(app.oneshot(get("/")).await.unwrap()).await;

    let complete = completion(&capture).await;
    assert_eq!(complete.field("streamed").as_deref(), Some("true"));
    assert_eq!(complete.field("deferred").as_deref(), Some("resolved"));
    for key in ["time_to_critical_ms", "time_to_shell_ms", "time_to_first_section_ms"] {
        assert!(complete.field(key).is_some(), "missing {}", key);
    }
}

#[tokio::test]
async fn test_client_disconnect_abandons_deferred() {
    let client = Arc::new(healthy_client());
    let release = client.gate(RECOMMENDED_PRODUCTS);
    let (app, _, capture) = app_with(client, OrderingStrategy::OutOfOrder);

    let response = app.oneshot(get("/")).await.unwrap();
    let mut body = response.into_body();
    read_through_footer(&mut body).await;

    drop(body);
    let _ = release.send(());

    let complete = completion(&capture).await;
    assert_eq!(complete.field("streamed").as_deref(), Some("false"));
    assert_eq!(complete.field("deferred").as_deref(), Some("abandoned"));
    assert!(complete.field("time_to_critical_ms").is_some());
    assert!(capture
        .entries()
        .iter()
        .any(|e| e.message == "Client went away mid-stream"));
    assert!(capture.at_level(LogLevel::Error).is_empty());
}

#[tokio::test]
async fn test_strict_ordering_renders_inline() {
    let (app, _, _) = app_with(Arc::new(healthy_client()), OrderingStrategy::Strict);
    let html = body_text(app.oneshot(get("/")).await.unwrap()).await;

    assert!(!html.contains("<template"));
    let featured = html.find("Featured Products").unwrap();
    let newsletter = html.find("Join the Movement").unwrap();
    assert!(featured < newsletter);
}

// === Theme Tests ===

#[tokio::test]
async fn test_theme_preference_persists() {
    let app = app(healthy_client());

    let response = app
        .clone()
        .oneshot(form("/theme", "theme=light"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers()[header::LOCATION], "/");
    let cookie = session_cookie(&response);

    let html = body_text(app.oneshot(with_cookie("/", &cookie)).await.unwrap()).await;
    assert!(html.contains(r#"data-theme="light""#));
    assert!(html.contains(r#"value="light" class="theme-button active""#));
}

#[tokio::test]
async fn test_invalid_theme_is_400() {
    let response = app(healthy_client())
        .oneshot(form("/theme", "theme=sepia"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

// === Newsletter Tests ===

#[tokio::test]
async fn test_newsletter_signup() {
    let store = Arc::new(MemoryStore::new());
    let (app, state, _) = app_with_store(
        Arc::new(healthy_client()),
        OrderingStrategy::OutOfOrder,
        store.clone(),
    );

    let response = app
        .oneshot(form("/newsletter", "email=Ada%40Example.com"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    // Sign-up writes no visitor session, so there is no cookie to issue.
    assert!(!response.headers().contains_key(header::SET_COOKIE));
    assert_eq!(store.len(), 1);
    let html = body_text(response).await;
    assert!(html.contains("Thanks for joining! Check your inbox."));

    let subscriber = state.newsletter.get("ada@example.com").unwrap().unwrap();
    assert_eq!(subscriber.email, "ada@example.com");
}

#[tokio::test]
async fn test_newsletter_rejects_bad_email() {
    let (app, state, _) = app_with(Arc::new(healthy_client()), OrderingStrategy::OutOfOrder);

    let response = app
        .oneshot(form("/newsletter", "email=not-an-email"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let html = body_text(response).await;
    assert!(html.contains("Something went wrong. Please try again."));
    assert!(html.contains(r#"value="not-an-email""#));
    assert_eq!(state.newsletter.count().unwrap(), 0);
}

// === Visitor Store Tests ===

const KNOWN_SESSION: &str = "ww_session=sess_AAAAAAAAAAAAAAAAAAAAAAAA";

fn failing_app() -> (Router, LogCapture) {
    let (app, _, capture) = app_with_store(
        Arc::new(healthy_client()),
        OrderingStrategy::OutOfOrder,
        Arc::new(FailingStore),
    );
    (app, capture)
}

#[tokio::test]
async fn test_cookieless_visits_keep_store_bounded() {
    let store = Arc::new(MemoryStore::new().with_expiring_capacity(50));
    let (app, state, _) = app_with_store(
        Arc::new(healthy_client()),
        OrderingStrategy::OutOfOrder,
        store.clone(),
    );

    let response = app
        .clone()
        .oneshot(form("/newsletter", "email=ada%40example.com"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    for _ in 0..200 {
        let response = app.clone().oneshot(get("/")).await.unwrap();
        assert!(response.headers().contains_key(header::SET_COOKIE));
        body_text(response).await;
    }

    // Fifty live sessions plus the subscriber.
    assert_eq!(store.len(), 51);
    assert!(state.newsletter.get("ada@example.com").unwrap().is_some());
}

#[tokio::test]
async fn test_home_falls_back_when_store_fails() {
    let (app, capture) = failing_app();

    let response = app.oneshot(with_cookie("/", KNOWN_SESSION)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    // Nothing was persisted, so no session is handed out.
    assert!(!response.headers().contains_key(header::SET_COOKIE));

    let html = body_text(response).await;
    assert!(html.contains(r#"data-section="preloader""#));
    assert!(html.contains(r#"data-theme="dark""#));
    assert!(html.contains("Shop by Category"));
    assert!(html.ends_with("</html>\n"));

    let warnings: Vec<String> = capture
        .at_level(LogLevel::Warn)
        .into_iter()
        .map(|e| e.message)
        .collect();
    assert!(warnings.contains(&"Visitor state unavailable, using defaults".to_string()));
    assert!(warnings.contains(&"Could not record intro".to_string()));
}

#[tokio::test]
async fn test_theme_store_failure_is_500() {
    let (app, _) = failing_app();

    let response = app.oneshot(form("/theme", "theme=light")).await.unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(!response.headers().contains_key(header::SET_COOKIE));
    assert!(body_text(response).await.contains("<h1>500</h1>"));
}

#[tokio::test]
async fn test_newsletter_store_failure_is_500() {
    let (app, capture) = failing_app();

    let response = app
        .oneshot(form("/newsletter", "email=ada%40example.com"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(response.headers().contains_key("x-request-id"));
    assert!(body_text(response).await.contains("<h1>500</h1>"));
    assert!(!capture
        .entries()
        .iter()
        .any(|e| e.message == "Newsletter sign-up"));
}

// === Health Tests ===

#[tokio::test]
async fn test_healthz() {
    let response = app(FakeClient::new()).oneshot(get("/healthz")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_text(response).await, "ok");
}
