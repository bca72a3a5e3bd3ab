//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with all handlers
//! - Throttle the search routes, leave auxiliary routes open
//! - Wire up middleware (tracing, limits, request ID, security headers)
//! - Serve plain HTTP or TLS until shutdown

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    http::Request,
    middleware,
    routing::{get, post},
    Router,
};
use axum_server::tls_rustls::RustlsConfig;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{
    limit::RequestBodyLimitLayer,
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::{LimitsConfig, ServiceConfig};
use crate::http::handlers;
use crate::http::request::{UuidRequestId, X_REQUEST_ID};
use crate::security::headers::with_security_headers;
use crate::security::rate_limit::{rate_limit_middleware, FixedWindowLimiter, RateLimiter};
use crate::store::CredentialStore;

/// How long in-flight TLS connections get to finish after shutdown.
const TLS_DRAIN_TIMEOUT: Duration = Duration::from_secs(10);

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub store: CredentialStore,
    pub limits: LimitsConfig,
}

/// HTTP server for the breach lookup API.
pub struct HttpServer {
    router: Router,
    config: ServiceConfig,
    limiter: Option<Arc<FixedWindowLimiter>>,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: ServiceConfig, store: CredentialStore) -> Self {
        let limiter = config
            .rate_limit
            .enabled
            .then(|| Arc::new(FixedWindowLimiter::from_config(&config.rate_limit)));

        let state = AppState {
            store,
            limits: config.limits.clone(),
        };

        let router = Self::build_router(
            &config,
            state,
            limiter.clone().map(|l| l as Arc<dyn RateLimiter>),
        );
        Self {
            router,
            config,
            limiter,
        }
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(
        config: &ServiceConfig,
        state: AppState,
        limiter: Option<Arc<dyn RateLimiter>>,
    ) -> Router {
        let mut searches = Router::new()
            .route("/password", post(handlers::check_password))
            .route("/username", post(handlers::check_username));
        if let Some(limiter) = limiter {
            searches = searches.route_layer(middleware::from_fn_with_state(
                limiter,
                rate_limit_middleware,
            ));
        }

        let router = Router::new()
            .route("/", get(handlers::index))
            .route("/app.js", get(handlers::app_js))
            .route("/health", get(handlers::health))
            .route("/stats", get(handlers::stats))
            .merge(searches)
            .with_state(state)
            .layer(RequestBodyLimitLayer::new(config.limits.max_body_bytes));

        #[allow(deprecated)]
        let router = router
            .layer(TimeoutLayer::new(Duration::from_secs(
                config.limits.request_timeout_secs,
            )))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
                let request_id = request
                    .headers()
                    .get(X_REQUEST_ID)
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or("unknown");
                tracing::info_span!(
                    "request",
                    method = %request.method(),
                    path = %request.uri().path(),
                    request_id = %request_id,
                )
            }))
            .layer(SetRequestIdLayer::x_request_id(UuidRequestId));

        with_security_headers(router)
    }

    /// A copy of the router, without connection info.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    fn spawn_sweeper(&self, shutdown: &broadcast::Receiver<()>) {
        if let Some(limiter) = &self.limiter {
            tokio::spawn(limiter.clone().run_sweeper(shutdown.resubscribe()));
        }
    }

    /// Serve plain HTTP on `listener` until `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, tls = false, "HTTP server starting");

        self.spawn_sweeper(&shutdown);
        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Serve HTTPS on `addr` until `shutdown` fires.
    pub async fn run_tls(
        self,
        addr: SocketAddr,
        tls: RustlsConfig,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        tracing::info!(address = %addr, tls = true, "HTTP server starting");

        self.spawn_sweeper(&shutdown);
        let handle = axum_server::Handle::new();
        let drain = handle.clone();
        tokio::spawn(async move {
            let _ = shutdown.recv().await;
            drain.graceful_shutdown(Some(TLS_DRAIN_TIMEOUT));
        });

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();
        axum_server::bind_rustls(addr, tls)
            .handle(handle)
            .serve(app)
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}
