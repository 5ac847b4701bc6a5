pub mod recommendations;

use crate::config::CorsOrigin;
use crate::middleware::{request_id_middleware, REQUEST_ID_HEADER};
use crate::state::SharedState;
use axum::{
    body::Body,
    http::{header, Method, Request},
    routing::get,
    Json, Router,
};
use serde_json::{json, Value};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

async fn health() -> Json<Value> {
    Json(json!({ "ok": true }))
}

pub fn routes(state: SharedState) -> Router {
    Router::new()
        .route("/health", get(health))
        .merge(recommendations::router(state))
}

/// Routes plus the request-id, tracing and optional CORS layers.
pub fn app(state: SharedState) -> Router {
    let cors = state.config.cors_origin.clone();

    let router = routes(state)
        .layer(axum::middleware::from_fn(request_id_middleware))
        .layer(TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
            tracing::info_span!(
                "http_request",
                method = %request.method(),
                uri = %request.uri(),
                request_id = tracing::field::Empty
            )
        }));

    match cors {
        Some(origin) => router.layer(cors_layer(origin)),
        None => router,
    }
}

fn cors_layer(origin: CorsOrigin) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE, header::HeaderName::from_static(REQUEST_ID_HEADER)]);

    match origin {
        CorsOrigin::Any => layer.allow_origin(Any),
        CorsOrigin::Exact(value) => layer.allow_origin(value),
    }
}
