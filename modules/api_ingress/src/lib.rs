//! HTTP host: owns the listener and the cross-cutting middleware stack, and
//! serves whatever module routers are injected into it.

use anyhow::Result;
use axum::{
    http::{header::CONTENT_TYPE, HeaderValue},
    middleware::from_fn,
    Router,
};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::{
    catch_panic::CatchPanicLayer,
    cors::CorsLayer,
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    set_header::SetResponseHeaderLayer,
};

mod config;
pub mod error;
pub mod request_id;

pub use config::ApiIngressConfig;
pub use error::{AppError, ErrorResponse};
pub use request_id::RequestId;

/// Main API Ingress object, constructed once at process start.
pub struct ApiIngress {
    config: ApiIngressConfig,
    routes: Router,
}

impl ApiIngress {
    /// Create a new ApiIngress instance with the given configuration
    pub fn new(config: ApiIngressConfig) -> Self {
        Self {
            config,
            routes: Router::new(),
        }
    }

    /// Inject a module router; paths must not overlap with routes already added.
    pub fn with_routes(mut self, routes: Router) -> Self {
        self.routes = self.routes.merge(routes);
        self
    }

    pub fn config(&self) -> &ApiIngressConfig {
        &self.config
    }

    /// Build the HTTP router from the injected routes plus the middleware stack.
    pub fn build_router(&self) -> Router {
        tracing::debug!("Building router");
        let mut router = self.routes.clone().fallback(error::path_not_found);

        // Layers are added innermost first:
        // ContentType -> CatchPanic -> CORS -> capture_request_id -> Trace -> PropagateRequestId -> SetRequestId

        // 1. Every response is JSON unless a handler said otherwise
        router = router.layer(SetResponseHeaderLayer::if_not_present(
            CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        ));

        // 2. Panics become a generic 500
        router = router.layer(CatchPanicLayer::custom(error::panic_response));

        // 3. CORS layer (if enabled)
        if self.config.cors_enabled {
            router = router.layer(CorsLayer::permissive());
        }

        // 4. Put request_id into extensions and span
        router = router.layer(from_fn(request_id::capture_request_id));

        // 5. One span per request
        router = router.layer(request_id::http_trace_layer());

        if self.config.request_id_header {
            let x_request_id = request_id::header();
            // 6. Echo x-request-id on the response
            router = router.layer(PropagateRequestIdLayer::new(x_request_id.clone()));
            // 7. Generate x-request-id when missing
            router = router.layer(SetRequestIdLayer::new(x_request_id, request_id::MakeNanoId));
        }

        router
    }

    /// Serve on an already-bound listener until `cancel` fires.
    pub async fn serve(self, listener: TcpListener, cancel: CancellationToken) -> Result<()> {
        let router = self.build_router();
        let addr = listener.local_addr()?;
        tracing::info!("HTTP server bound on {}", addr);

        let shutdown = async move {
            cancel.cancelled().await;
            tracing::info!("HTTP server shutting down gracefully (cancellation)");
        };

        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown)
            .await
            .map_err(|e| anyhow::anyhow!(e))
    }
}
