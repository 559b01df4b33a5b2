//! Admission Webhook Server
//!
//! This module implements the HTTP(S) endpoint the API server calls for
//! every object matched by the MutatingWebhookConfiguration, plus the
//! liveness and readiness probes.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::body::Bytes;
use axum::http::{HeaderMap, HeaderName, HeaderValue};
use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use axum_server::Handle;
use kube::core::admission::{AdmissionRequest, AdmissionResponse, AdmissionReview};
use kube::core::DynamicObject;
use opentelemetry::{global, propagation::Extractor};
use tokio::sync::watch;
use tracing::{error, info, instrument};
use tracing_opentelemetry::OpenTelemetrySpanExt;

use super::mutation::apply_mutations;
use super::tls::TlsConfig;
use crate::error::{Error, Result};
use crate::injector::Injector;

struct HeaderExtractor<'a>(&'a HeaderMap);

impl<'a> Extractor for HeaderExtractor<'a> {
    fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(|v: &HeaderValue| v.to_str().ok())
    }
    fn keys(&self) -> Vec<&str> {
        self.0.keys().map(|k: &HeaderName| k.as_str()).collect()
    }
}

async fn extract_trace_context(request: Request, next: Next) -> Response {
    let parent_cx = global::get_text_map_propagator(|propagator| {
        propagator.extract(&HeaderExtractor(request.headers()))
    });
    tracing::Span::current().set_parent(parent_cx);
    next.run(request).await
}

/// Webhook server state
pub struct WebhookServer {
    injector: Arc<Injector>,

    /// Serve HTTPS when set, plain HTTP otherwise
    tls_config: Option<TlsConfig>,
}

impl WebhookServer {
    pub fn new(injector: Injector) -> Self {
        Self {
            injector: Arc::new(injector),
            tls_config: None,
        }
    }

    pub fn with_tls(mut self, tls_config: TlsConfig) -> Self {
        self.tls_config = Some(tls_config);
        self
    }

    /// Routes served on the webhook listener.
    pub fn router(&self) -> Router {
        Router::new()
            .route("/mutate", post(mutate_handler))
            .layer(middleware::from_fn(extract_trace_context))
            .layer(tower_http::trace::TraceLayer::new_for_http())
            .with_state(self.injector.clone())
            .merge(probe_router())
    }

    /// Start the webhook server and run until `shutdown` flips to `true`.
    pub async fn start(self, addr: SocketAddr, shutdown: watch::Receiver<bool>) -> Result<()> {
        let app = self.router();

        match &self.tls_config {
            Some(tls_config) => {
                let rustls_config = tls_config.load().await?;
                let handle = Handle::new();

                tokio::spawn({
                    let handle = handle.clone();
                    async move {
                        wait_for_shutdown(shutdown).await;
                        handle.graceful_shutdown(None);
                    }
                });

                info!("Starting webhook server on {} (TLS)", addr);
                axum_server::bind_rustls(addr, rustls_config)
                    .handle(handle)
                    .serve(app.into_make_service())
                    .await
                    .map_err(|e| Error::ServerError(format!("Webhook server error: {e}")))?;
            }
            None => {
                info!("Starting webhook server on {} (insecure)", addr);
                serve_plain(addr, app, shutdown).await?;
            }
        }

        info!("Webhook server stopped");
        Ok(())
    }
}

/// Liveness and readiness routes. Both answer `ok` once the process serves.
pub fn probe_router() -> Router {
    Router::new()
        .route("/healthz", get(health_handler))
        .route("/readyz", get(health_handler))
}

/// Serve the probe routes over plain HTTP until `shutdown` flips to `true`.
pub async fn serve_probes(addr: SocketAddr, shutdown: watch::Receiver<bool>) -> Result<()> {
    info!("Starting health probe server on {}", addr);
    serve_plain(addr, probe_router(), shutdown).await
}

async fn serve_plain(addr: SocketAddr, app: Router, shutdown: watch::Receiver<bool>) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| Error::ServerError(format!("Failed to bind to {addr}: {e}")))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(wait_for_shutdown(shutdown))
        .await
        .map_err(|e| Error::ServerError(format!("Server error: {e}")))
}

async fn wait_for_shutdown(mut shutdown: watch::Receiver<bool>) {
    // A dropped sender also means shut down.
    let _ = shutdown.wait_for(|stop| *stop).await;
}

// HTTP Handlers

async fn health_handler() -> &'static str {
    "ok"
}

#[instrument(skip(injector, body))]
async fn mutate_handler(State(injector): State<Arc<Injector>>, body: Bytes) -> impl IntoResponse {
    let review: AdmissionReview<DynamicObject> = match serde_json::from_slice(&body) {
        Ok(review) => review,
        Err(e) => return invalid_review(format!("Invalid admission review: {e}")),
    };

    let req: AdmissionRequest<DynamicObject> = match review.try_into() {
        Ok(req) => req,
        Err(e) => return invalid_review(format!("Invalid admission request: {e}")),
    };

    info!(
        kind = %req.kind.kind,
        operation = ?req.operation,
        name = %req.name,
        namespace = ?req.namespace,
        "Admission request received"
    );

    let response = apply_mutations(&injector, &req).await;
    (StatusCode::OK, Json(response.into_review()))
}

/// Answered with 200 so the API server reads the denial instead of treating
/// the call as failed under the webhook's `failurePolicy`.
fn invalid_review(message: String) -> (StatusCode, Json<AdmissionReview<DynamicObject>>) {
    error!("Failed to parse admission request: {}", message);
    (
        StatusCode::OK,
        Json(AdmissionResponse::invalid(message).into_review()),
    )
}
