//! HTTP host: wraps module routers in the shared middleware stack and serves
//! them until cancelled.

use std::net::SocketAddr;
use std::time::Duration;

use anyhow::{Context, Result};
use axum::{middleware::from_fn, routing::get, Router};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower::ServiceBuilder;
use tower_http::{
    cors::CorsLayer,
    limit::RequestBodyLimitLayer,
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
};

mod config;
pub mod request_id;
mod web;

pub use config::ApiIngressConfig;

const DEFAULT_HANDLER_TIMEOUT: Duration = Duration::from_secs(30);

pub struct ApiIngress {
    config: ApiIngressConfig,
    handler_timeout: Duration,
}

impl ApiIngress {
    /// `timeout_sec` of 0 selects the 30 second default.
    pub fn new(config: ApiIngressConfig, timeout_sec: u64) -> Self {
        let handler_timeout = if timeout_sec == 0 {
            DEFAULT_HANDLER_TIMEOUT
        } else {
            Duration::from_secs(timeout_sec)
        };
        Self {
            config,
            handler_timeout,
        }
    }

    pub fn config(&self) -> &ApiIngressConfig {
        &self.config
    }

    /// Add `/health` to `api` and wrap everything in the middleware stack.
    ///
    /// Outermost first: SetRequestId -> PropagateRequestId -> Trace ->
    /// push_req_id_to_extensions -> Timeout -> CORS -> BodyLimit.
    pub fn build_router(&self, api: Router) -> Router {
        let x_request_id = request_id::header();

        let mut router = api
            .route("/health", get(web::health_check))
            .layer(RequestBodyLimitLayer::new(self.config.body_limit_bytes));

        if self.config.cors_enabled {
            router = router.layer(CorsLayer::permissive());
        }

        router.layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::new(
                    x_request_id.clone(),
                    request_id::MakeReqId,
                ))
                .layer(PropagateRequestIdLayer::new(x_request_id))
                .layer(request_id::create_trace_layer())
                .layer(from_fn(request_id::push_req_id_to_extensions))
                .layer(TimeoutLayer::new(self.handler_timeout)),
        )
    }

    pub async fn bind(addr: SocketAddr) -> Result<TcpListener> {
        let listener = TcpListener::bind(addr)
            .await
            .with_context(|| format!("failed to bind {addr}"))?;
        tracing::info!("HTTP server bound on {}", addr);
        Ok(listener)
    }

    /// Serve until `cancel` fires, then finish in-flight requests.
    pub async fn serve(
        &self,
        listener: TcpListener,
        router: Router,
        cancel: CancellationToken,
    ) -> Result<()> {
        let shutdown = async move {
            cancel.cancelled().await;
            tracing::info!("HTTP server shutting down gracefully (cancellation)");
        };

        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown)
            .await
            .context("HTTP server failed")
    }
}
