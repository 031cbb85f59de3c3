//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with all handlers
//! - Wire up middleware (request ID, tracing, timeout) and the body limit
//! - Serve the static form page and assets
//! - Bind server to listener and shut down gracefully

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower::ServiceBuilder;
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    services::ServeDir,
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::admission::{AdmissionGate, ADMISSION_TIMEOUT};
use crate::codec::{self, JpegTarget, SourceDecoder};
use crate::config::ServiceConfig;
use crate::convert::Converter;
use crate::http::handlers;
use crate::http::request::{self, MakeRequestUuidV4, X_REQUEST_ID};
use crate::observability::RequestCounter;

/// Room for multipart framing, `outname` and `submit` on top of the file.
const FORM_OVERHEAD_BYTES: u64 = 64 * 1024;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub gate: Arc<AdmissionGate>,
    pub counter: Arc<RequestCounter>,
    pub converter: Arc<Converter>,
    pub max_upload_bytes: u64,
    pub admission_timeout: Duration,
    /// Parent of every per-request cancellation token.
    pub shutdown: CancellationToken,
}

/// HTTP server for the conversion service.
pub struct HttpServer {
    config: ServiceConfig,
    state: AppState,
}

impl HttpServer {
    /// Create a server using the source decoder compiled into this build.
    pub fn new(config: ServiceConfig) -> Self {
        Self::with_source(config, codec::default_source())
    }

    /// Create a server with an explicit source decoder.
    pub fn with_source(config: ServiceConfig, source: Arc<dyn SourceDecoder>) -> Self {
        let converter = Converter::new(source, JpegTarget::new(config.conversion.jpeg_quality));

        let state = AppState {
            gate: Arc::new(AdmissionGate::new(config.limits.max_concurrent)),
            counter: Arc::new(RequestCounter::new()),
            converter: Arc::new(converter),
            max_upload_bytes: config.limits.max_upload_bytes(),
            admission_timeout: ADMISSION_TIMEOUT,
            shutdown: CancellationToken::new(),
        };

        Self { config, state }
    }

    /// Override how long requests wait for a conversion slot.
    pub fn with_admission_timeout(mut self, timeout: Duration) -> Self {
        self.state.admission_timeout = timeout;
        self
    }

    pub fn gate(&self) -> Arc<AdmissionGate> {
        self.state.gate.clone()
    }

    pub fn counter(&self) -> Arc<RequestCounter> {
        self.state.counter.clone()
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    /// The full router, detached from any shutdown signal.
    pub fn router(&self) -> Router {
        Self::build_router(&self.config, self.state.clone())
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &ServiceConfig, state: AppState) -> Router {
        let serve_path = PathBuf::from(&config.static_files.serve_path);
        let body_limit = usize::try_from(state.max_upload_bytes + FORM_OVERHEAD_BYTES).unwrap_or(usize::MAX);

        // Overflow surfaces inside the multipart stream, so it is reported
        // like an oversized `infile`.
        let convert = post(handlers::post_convert).layer(DefaultBodyLimit::max(body_limit));

        Router::new()
            .route("/convert", convert)
            .route("/check", get(handlers::get_check))
            .route("/count", get(handlers::get_count))
            .route_service("/", ServeDir::new(&serve_path))
            .nest_service("/css", ServeDir::new(serve_path.join("css")))
            .nest_service("/fonts", ServeDir::new(serve_path.join("fonts")))
            .with_state(state)
            .layer(
                ServiceBuilder::new()
                    .layer(SetRequestIdLayer::new(X_REQUEST_ID, MakeRequestUuidV4))
                    .layer(TraceLayer::new_for_http().make_span_with(request::make_span))
                    .layer(PropagateRequestIdLayer::new(X_REQUEST_ID))
                    .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs))),
            )
    }

    /// Run the server, accepting connections on the given listener until
    /// `shutdown` fires.
    pub async fn run(self, listener: TcpListener, shutdown: CancellationToken) -> Result<(), std::io::Error> {
        let addr: SocketAddr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            source = self.state.converter.source_name(),
            max_concurrent = self.state.gate.capacity(),
            max_upload_bytes = self.state.max_upload_bytes,
            "HTTP server starting"
        );

        let mut state = self.state;
        state.shutdown = shutdown.clone();
        let app = Self::build_router(&self.config, state);

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                shutdown.cancelled().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}
