//! HTTP server setup and request dispatch.
//!
//! # Responsibilities
//! - Create the Axum router with the single catch-all handler
//! - Wire up middleware (request id, tracing, body limit, timeout)
//! - Redirect plain-HTTP requests before anything else runs
//! - Dispatch to preflight, purge, or the storage proxy
//! - Record per-request metrics

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    body::Body,
    extract::State,
    http::{header, request::Parts, Request},
    response::{IntoResponse, Response},
    routing::any,
    Json, Router,
};
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{
    limit::RequestBodyLimitLayer,
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use url::Url;

use crate::config::{ConfigError, OriginConfig, ProxyConfig};
use crate::cors::{self, AllowedOriginSet};
use crate::error::ProxyResult;
use crate::http::request::{
    read_incoming, reconstruct_url, request_id, upgraded_url, MakeRequestUuidV4, X_REQUEST_ID,
};
use crate::http::response::{https_redirect, into_client_response, preflight_response};
use crate::lifecycle::shutdown::recv_shutdown;
use crate::lifecycle::signals::shutdown_signal;
use crate::observability::metrics;
use crate::policy::ResponsePolicy;
use crate::purge::PurgeOrchestrator;
use crate::routing::{classify, Route};
use crate::storage::StorageClient;

/// Errors that prevent the server from starting or serving.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Application state injected into handlers. Read-only after startup.
#[derive(Clone)]
pub struct AppState {
    pub storage: StorageClient,
    pub purge: Arc<PurgeOrchestrator>,
    pub allowed_origins: Arc<AllowedOriginSet>,
    pub disable_https_redirect: bool,
    pub max_body_size: usize,
}

/// HTTP server for the edge proxy.
pub struct HttpServer {
    router: Router,
    config: ProxyConfig,
}

impl HttpServer {
    /// Create a server from a loaded configuration.
    ///
    /// Fails when the storage settings are incomplete or a client cannot be
    /// built. Missing CDN settings only disable purge.
    pub fn new(config: ProxyConfig) -> Result<Self, ServerError> {
        let origin = OriginConfig::from_storage(&config.storage).map_err(ConfigError::Validation)?;
        let storage = StorageClient::new(Arc::new(origin), &config.timeouts)?;
        let purge = PurgeOrchestrator::new(config.cdn.clone(), &config.timeouts)?;
        let allowed_origins = AllowedOriginSet::parse(&config.cors.allowed_origins);

        tracing::info!(
            bucket = %storage.origin().bucket,
            endpoint = %storage.origin().endpoint,
            allowed_origins = allowed_origins.patterns().len(),
            purge_configured = config.cdn.zone_id.is_some() && config.cdn.api_token.is_some(),
            "Edge proxy initialized"
        );

        let state = AppState {
            storage,
            purge: Arc::new(purge),
            allowed_origins: Arc::new(allowed_origins),
            disable_https_redirect: config.security.disable_https_redirect,
            max_body_size: config.listener.max_body_size,
        };

        let router = Self::build_router(&config, state);
        Ok(Self { router, config })
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &ProxyConfig, state: AppState) -> Router {
        Router::new()
            .route("/{*path}", any(edge_handler))
            .route("/", any(edge_handler))
            .with_state(state)
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
            .layer(RequestBodyLimitLayer::new(config.listener.max_body_size))
            .layer(PropagateRequestIdLayer::new(X_REQUEST_ID))
            .layer(TraceLayer::new_for_http())
            .layer(SetRequestIdLayer::new(X_REQUEST_ID, MakeRequestUuidV4))
    }

    /// The configured router, for serving on a custom transport.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Serve on `listener` until `shutdown` fires or the process is signalled.
    pub async fn run(
        self,
        listener: TcpListener,
        shutdown: broadcast::Receiver<()>,
    ) -> Result<(), ServerError> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                tokio::select! {
                    _ = recv_shutdown(shutdown) => {},
                    _ = shutdown_signal() => {},
                }
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    pub fn config(&self) -> &ProxyConfig {
        &self.config
    }
}

/// Catch-all handler: redirect, classify, dispatch, record.
async fn edge_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let start_time = Instant::now();
    let (parts, body) = request.into_parts();
    let request_id = request_id(&parts.headers);
    let method = parts.method.clone();

    tracing::debug!(
        request_id = %request_id,
        method = %method,
        path = %parts.uri.path(),
        "Handling request"
    );

    let (route, result) = dispatch(&state, parts, body, &request_id).await;
    let response = result.unwrap_or_else(|e| e.into_response());

    metrics::record_request(method.as_str(), response.status().as_u16(), route, start_time);
    response
}

async fn dispatch(
    state: &AppState,
    parts: Parts,
    body: Body,
    request_id: &str,
) -> (&'static str, ProxyResult<Response>) {
    let url = match reconstruct_url(&parts.uri, &parts.headers) {
        Ok(url) => url,
        Err(e) => return ("invalid", Err(e)),
    };

    if url.scheme() == "http" && !state.disable_https_redirect {
        let target = upgraded_url(&url);
        tracing::debug!(request_id = %request_id, location = %target, "Redirecting to HTTPS");
        return ("redirect", https_redirect(&target));
    }

    let route = classify(&parts.method, url.path());
    let result = match route {
        Route::Preflight => Ok(preflight(state, &parts, &url, request_id)),
        Route::Purge => purge(state, parts, url, body).await,
        Route::Proxy => proxy(state, parts, url, body, request_id).await,
    };
    (route.as_str(), result)
}

fn preflight(state: &AppState, parts: &Parts, url: &Url, request_id: &str) -> Response {
    let grant = cors::decide(
        &parts.method,
        url.path(),
        parts.headers.get(header::ORIGIN),
        &state.allowed_origins,
    );
    tracing::debug!(request_id = %request_id, granted = grant.is_some(), "Preflight");
    preflight_response(grant.as_ref())
}

async fn purge(state: &AppState, parts: Parts, url: Url, body: Body) -> ProxyResult<Response> {
    let incoming = read_incoming(parts.method, url, parts.headers, body, state.max_body_size).await?;
    let (status, reply) = state
        .purge
        .handle(&incoming.method, &incoming.headers, &incoming.body)
        .await?;
    Ok((status, Json(reply)).into_response())
}

async fn proxy(
    state: &AppState,
    parts: Parts,
    url: Url,
    body: Body,
    request_id: &str,
) -> ProxyResult<Response> {
    let incoming = read_incoming(parts.method, url, parts.headers, body, state.max_body_size).await?;
    let upstream = state.storage.fetch(&incoming).await?;

    let policy = ResponsePolicy::derive(
        &incoming.method,
        incoming.path(),
        incoming.origin(),
        upstream.status(),
        &state.allowed_origins,
    );

    tracing::debug!(
        request_id = %request_id,
        status = upstream.status().as_u16(),
        cors = policy.cors.is_some(),
        content_type = policy.content_type.unwrap_or("-"),
        "Storage responded"
    );

    Ok(into_client_response(upstream, &policy, &incoming.method))
}
