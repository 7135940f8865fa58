//! HTTP surface: router, shared state and handlers.

use std::collections::HashMap;
use std::convert::Infallible;
use std::sync::Arc;
use std::time::Instant;

use axum::body::Body;
use axum::extract::{Query, Request, State};
use axum::http::header::{self, HeaderMap, HeaderName, HeaderValue};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::routing::{get, post};
use axum::{Form, Router};
use edge_core::{LifecyclePhase, Locale, Method, RequestContext};
use edge_data::{DependencyTag, StorefrontClient};
use edge_executor::{load_page, OrderingStrategy, PageRequest};
use edge_kv::{Cache, KeyValueStore, SessionId};
use edge_observability::{
    DeferredOutcome, DependencyMetrics, LogCapture, MetricsCollector, StructuredLogger,
    TraceContext,
};
use edge_streaming::StreamingSink;
use futures::channel::mpsc;
use futures::StreamExt;
use serde::Deserialize;

use crate::config::{ConfigError, StorefrontConfig};
use crate::error::{PageError, PageFailure};
use crate::loader::HomeLoader;
use crate::newsletter::{validate_email, NewsletterList, NewsletterStatus};
use crate::page::{render_newsletter_page, stream_home_page, HomeView};
use crate::state::{ThemePreference, Visitor, VisitorStore, COLOR_SCHEME_HINT};

pub const WORKLOAD: &str = "storefront-home";

/// Chunks buffered between the page task and the response body.
const BODY_BUFFER: usize = 16;

/// State shared by all handlers.
#[derive(Clone)]
pub struct AppState {
    pub client: Arc<dyn StorefrontClient>,
    pub visitors: VisitorStore,
    pub newsletter: NewsletterList,
    pub default_locale: Locale,
    pub ordering: OrderingStrategy,
    pub intro_duration_ms: u64,
    capture: Option<LogCapture>,
}

impl AppState {
    /// Build state from config with an injected client and store.
    pub fn new(
        config: &StorefrontConfig,
        client: Arc<dyn StorefrontClient>,
        store: Arc<dyn KeyValueStore>,
    ) -> Result<Self, ConfigError> {
        let cache = Cache::new(store);
        Ok(Self {
            client,
            visitors: VisitorStore::new(
                cache.clone(),
                config.visitor.session_cookie.clone(),
                config.visitor.session_ttl(),
            ),
            newsletter: NewsletterList::new(cache),
            default_locale: config.locale.resolve()?,
            ordering: config.loader.ordering,
            intro_duration_ms: config.visitor.intro_duration_ms,
            capture: None,
        })
    }

    /// Mirror every request log entry into `capture`.
    pub fn with_log_capture(mut self, capture: LogCapture) -> Self {
        self.capture = Some(capture);
        self
    }

    fn logger(&self, ctx: &RequestContext) -> StructuredLogger {
        let logger = StructuredLogger::new(ctx.request_id.clone())
            .with_workload(WORKLOAD)
            .with_route(ctx.path.clone());
        match &self.capture {
            Some(capture) => logger.with_capture(capture.clone()),
            None => logger,
        }
    }

    /// Load the visitor, starting a fresh session if storage fails.
    fn visitor(&self, ctx: &RequestContext, logger: &StructuredLogger) -> Visitor {
        match self.visitors.load(ctx) {
            Ok(visitor) => visitor,
            Err(e) => {
                logger
                    .warn_builder("Visitor state unavailable, using defaults")
                    .field("error", e.to_string())
                    .emit();
                Visitor {
                    id: SessionId::generate(),
                    state: Default::default(),
                    is_new: true,
                }
            }
        }
    }
}

/// Build the application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(home))
        .route("/theme", post(set_theme))
        .route("/newsletter", post(subscribe))
        .route("/healthz", get(healthz))
        .with_state(state)
}

async fn healthz() -> &'static str {
    "ok"
}

/// Adopt the incoming trace, if any, as the request identity.
fn traced(ctx: RequestContext) -> (RequestContext, TraceContext) {
    let trace = TraceContext::from_header(ctx.header("traceparent"));
    (ctx.with_request_id(trace.request_id()), trace)
}

/// Context for a form post, where the body has already been extracted.
fn form_context(path: &str, headers: &HeaderMap) -> (RequestContext, TraceContext) {
    let ctx = headers
        .iter()
        .fold(RequestContext::new(Method::Post, path), |ctx, (name, value)| {
            match value.to_str() {
                Ok(value) => ctx.with_header(name.as_str(), value),
                Err(_) => ctx,
            }
        });
    traced(ctx)
}

fn insert_header(headers: &mut HeaderMap, name: HeaderName, value: &str) {
    if let Ok(value) = HeaderValue::from_str(value) {
        headers.insert(name, value);
    }
}

/// Headers common to every page response.
fn page_headers(ctx: &RequestContext, trace: &TraceContext, cookie: Option<String>) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("text/html; charset=utf-8"),
    );
    insert_header(
        &mut headers,
        HeaderName::from_static("x-request-id"),
        ctx.request_id.as_str(),
    );
    insert_header(
        &mut headers,
        HeaderName::from_static("traceparent"),
        &trace.to_traceparent(),
    );
    if let Some(cookie) = cookie {
        insert_header(&mut headers, header::SET_COOKIE, &cookie);
    }
    headers
}

async fn home(State(state): State<AppState>, request: Request) -> Result<Response, PageFailure> {
    let (parts, _body) = request.into_parts();
    let query: HashMap<String, String> = Query::try_from_uri(&parts.uri)
        .map(|Query(query)| query)
        .unwrap_or_default();
    let (ctx, trace) = traced(RequestContext::from_parts(&parts));
    let ctx = ctx.with_query(query);
    let locale = Locale::resolve(
        ctx.query_param("country"),
        ctx.query_param("language"),
        ctx.header("accept-language"),
        &state.default_locale,
    );
    let mut ctx = ctx.with_locale(locale);

    let logger = state.logger(&ctx);
    let mut metrics = MetricsCollector::new(ctx.request_id.clone());
    metrics.set_route(ctx.path.clone());

    logger
        .info_builder("Request started")
        .field("locale", ctx.locale.tag())
        .field("trace_id", trace.trace_id.clone())
        .emit();

    let page_request = PageRequest::new(
        ctx.request_id.clone(),
        ctx.locale.clone(),
        state.client.clone(),
        logger.clone(),
    );
    let started = Instant::now();
    let page = match load_page(&HomeLoader, &page_request).await {
        Ok(page) => page,
        Err(e) => {
            metrics.record_dependency(DependencyMetrics::failed(
                e.dependency.name(),
                started.elapsed(),
                e.source.to_string(),
            ));
            let failure = PageFailure::new(ctx.request_id.clone(), e);
            let summary = metrics.finalize(Some(failure.error.status().as_u16()));
            logger
                .debug_builder("Request complete")
                .field("metrics", summary.to_json())
                .emit();
            return Err(failure);
        }
    };
    metrics.record_dependency(DependencyMetrics::ok(
        DependencyTag::Catalog.name(),
        started.elapsed(),
    ));
    metrics.record_critical_resolved();
    ctx.timing.mark_phase(&LifecyclePhase::CriticalResolved);

    let visitor = state.visitor(&ctx, &logger);
    let show_preloader = !visitor.state.shown_intro;
    let mut persisted = !visitor.is_new;
    if show_preloader {
        match state.visitors.mark_intro_shown(&visitor.id) {
            Ok(_) => persisted = true,
            Err(e) => logger
                .warn_builder("Could not record intro")
                .field("error", e.to_string())
                .emit(),
        }
    }
    let cookie = (visitor.is_new && persisted).then(|| state.visitors.set_cookie(&visitor.id));

    let view = HomeView {
        theme: visitor.state.theme,
        resolved_theme: visitor.state.theme.resolve(ctx.header(COLOR_SCHEME_HINT)),
        show_preloader,
        intro_duration_ms: state.intro_duration_ms,
        ordering: state.ordering,
    };

    let headers = page_headers(&ctx, &trace, cookie);
    let (tx, rx) = mpsc::channel::<Vec<u8>>(BODY_BUFFER);
    let timing = ctx.timing;

    tokio::spawn(async move {
        let mut sink = StreamingSink::new(tx, timing);
        let result = stream_home_page(&mut sink, &view, page, &mut metrics, &logger).await;
        if let Err(e) = &result {
            if metrics.deferred().is_none() {
                metrics.record_deferred(DeferredOutcome::Abandoned);
            }
            if e.is_disconnect() {
                logger
                    .debug_builder("Client went away mid-stream")
                    .field("error", e.to_string())
                    .emit();
            } else {
                logger
                    .error_builder("Streaming failed")
                    .field("error", e.to_string())
                    .emit();
            }
        }
        let summary = metrics.finalize(Some(StatusCode::OK.as_u16()));
        let mut complete = logger
            .info_builder("Request complete")
            .field_bool("streamed", result.is_ok())
            .field_i64("duration_us", summary.total_duration_us as i64);
        if let Some(deferred) = summary.deferred {
            complete = complete.field("deferred", deferred.as_str());
        }
        if let Some(critical) = sink.timing().time_to_critical() {
            complete = complete.duration_ms("time_to_critical_ms", critical);
        }
        if let Some(shell) = sink.timing().time_to_shell() {
            complete = complete.duration_ms("time_to_shell_ms", shell);
        }
        if let Some(first) = sink.timing().time_to_first_section() {
            complete = complete.duration_ms("time_to_first_section_ms", first);
        }
        complete.emit();
        logger
            .debug_builder("Request metrics")
            .field("summary", summary.to_summary())
            .emit();
    });

    let body = Body::from_stream(rx.map(Ok::<_, Infallible>));
    Ok((StatusCode::OK, headers, body).into_response())
}

#[derive(Debug, Deserialize)]
struct ThemeForm {
    #[serde(default)]
    theme: String,
}

async fn set_theme(
    State(state): State<AppState>,
    headers: HeaderMap,
    Form(form): Form<ThemeForm>,
) -> Result<Response, PageFailure> {
    let (ctx, _) = form_context("/theme", &headers);
    let logger = state.logger(&ctx);

    let theme = form
        .theme
        .parse::<ThemePreference>()
        .map_err(|raw| PageFailure::new(ctx.request_id.clone(), PageError::InvalidTheme(raw)))?;

    let visitor = state.visitor(&ctx, &logger);
    state
        .visitors
        .set_theme(&visitor.id, theme)
        .map_err(|e| PageFailure::new(ctx.request_id.clone(), e))?;

    logger
        .info_builder("Theme updated")
        .field("theme", theme.as_str())
        .emit();

    let mut response = Redirect::to("/").into_response();
    if visitor.is_new {
        insert_header(
            response.headers_mut(),
            header::SET_COOKIE,
            &state.visitors.set_cookie(&visitor.id),
        );
    }
    Ok(response)
}

#[derive(Debug, Deserialize)]
struct NewsletterForm {
    #[serde(default)]
    email: String,
}

/// Newsletter sign-up. Only the subscriber list is written, so no visitor
/// session is created and no cookie is issued; a new visitor gets the
/// system theme on the result page.
async fn subscribe(
    State(state): State<AppState>,
    headers: HeaderMap,
    Form(form): Form<NewsletterForm>,
) -> Result<Response, PageFailure> {
    let (ctx, trace) = form_context("/newsletter", &headers);
    let logger = state.logger(&ctx);
    let visitor = state.visitor(&ctx, &logger);
    let theme = visitor.state.theme;
    let resolved = theme.resolve(ctx.header(COLOR_SCHEME_HINT));

    let (status, newsletter) = match validate_email(&form.email) {
        Ok(email) => {
            let added = state
                .newsletter
                .subscribe(&email)
                .map_err(|e| PageFailure::new(ctx.request_id.clone(), e))?;
            logger
                .info_builder("Newsletter sign-up")
                .field_bool("new_subscriber", added)
                .emit();
            (StatusCode::OK, NewsletterStatus::Success)
        }
        Err(e) => {
            logger
                .debug_builder("Newsletter sign-up rejected")
                .field("reason", e.to_string())
                .emit();
            (StatusCode::UNPROCESSABLE_ENTITY, NewsletterStatus::Error)
        }
    };

    let html = render_newsletter_page(theme, resolved, newsletter, &form.email);
    Ok((status, page_headers(&ctx, &trace, None), Html(html)).into_response())
}
