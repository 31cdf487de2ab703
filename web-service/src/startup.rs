use crate::handlers;
use crate::middleware::static_cache_middleware;
use crate::AppState;
use service_core::axum::{
    body::Body,
    handler::HandlerWithoutStateExt,
    http::{header, HeaderName, HeaderValue, Method, Request, StatusCode},
    middleware::{from_fn, from_fn_with_state},
    response::{IntoResponse, Response},
    routing::get,
    serve, Router,
};
use service_core::error::AppError;
use service_core::json_api::JsonApi;
use service_core::middleware::{
    error_detail::{error_detail_middleware, ExposeErrorDetails},
    metrics::metrics_middleware, rate_limit::ip_rate_limit_middleware,
    security_headers::security_headers_middleware,
    tracing::{make_request_span, request_id_middleware},
};
use service_core::tower::ServiceBuilder;
use std::any::Any;
use std::future::Future;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tower_http::{
    catch_panic::CatchPanicLayer,
    compression::CompressionLayer,
    cors::{Any as AnyOrigin, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};

pub fn build_router(state: AppState) -> Router {
    let powered_by = HeaderValue::from_str(&state.config.app.tag).unwrap_or_else(|e| {
        tracing::warn!(tag = %state.config.app.tag, error = %e, "App tag is not a valid header value");
        HeaderValue::from_static("web-service")
    });

    let static_files = ServiceBuilder::new()
        .layer(from_fn(static_cache_middleware))
        .service(
            ServeDir::new(&state.config.static_path)
                .append_index_html_on_directories(false)
                .not_found_service(handlers::not_found.into_service()),
        );

    let ip_limiter = state.ip_rate_limiter.clone();
    // Developer environments see error details in `meta.data`.
    let expose_errors = ExposeErrorDetails(!state.config.environment.is_public());

    Router::new()
        .route("/", get(handlers::home))
        .route("/health", get(handlers::health_check))
        .route("/ready", get(handlers::readiness_check))
        .route("/metrics", get(handlers::metrics))
        .route(
            "/cache",
            get(handlers::cache_index).post(handlers::store_cached),
        )
        .route("/cache/:key", get(handlers::get_cached))
        .fallback_service(static_files)
        .with_state(state)
        // Global IP rate limiting
        .layer(from_fn_with_state(ip_limiter, ip_rate_limit_middleware))
        .layer(from_fn(metrics_middleware))
        .layer(from_fn_with_state(expose_errors, error_detail_middleware))
        .layer(from_fn_with_state(powered_by, security_headers_middleware))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &Request<Body>| make_request_span(request)),
        )
        .layer(from_fn(request_id_middleware))
        .layer(CompressionLayer::new())
        .layer(
            CorsLayer::new()
                .allow_origin(AnyOrigin)
                .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
                .allow_headers([
                    header::ORIGIN,
                    HeaderName::from_static("x-requested-with"),
                    header::CONTENT_TYPE,
                    header::ACCEPT,
                ]),
        )
        .layer(CatchPanicLayer::custom(handle_panic))
}

fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = err
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| err.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic");
    tracing::error!(panic = %detail, "Handler panicked");

    JsonApi::error(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error").into_response()
}

/// Bound listener plus router; the server starts on `run_until_stopped`.
pub struct Application {
    port: u16,
    listener: TcpListener,
    router: Router,
}

impl Application {
    pub async fn build(state: AppState) -> Result<Self, AppError> {
        let address = state.config.common.address();
        let listener = TcpListener::bind(&address).await.map_err(|e| {
            tracing::error!("Failed to bind TCP listener to {}: {}", address, e);
            AppError::from(e)
        })?;
        let port = listener.local_addr()?.port();

        Ok(Self {
            port,
            listener,
            router: build_router(state),
        })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub async fn run_until_stopped(
        self,
        shutdown: impl Future<Output = ()> + Send + 'static,
    ) -> Result<(), AppError> {
        serve(
            self.listener,
            self.router
                .into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|e| {
            tracing::error!("Server error: {}", e);
            AppError::from(e)
        })
    }
}
