//! HTTP surface: mounts the proxy handler on an axum router.

use crate::error::ProxyError;
use crate::proxy::ProxyHandler;
use axum::{
    body::Bytes,
    extract::{rejection::BytesRejection, DefaultBodyLimit, State},
    http::{header, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{any, get},
    Json, Router,
};
use serde_json::json;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;
use tracing::Instrument;
use uuid::Uuid;

pub const PROXY_PATH: &str = "/gemini-proxy";
pub const NETLIFY_PROXY_PATH: &str = "/.netlify/functions/gemini-proxy";

#[derive(Clone)]
pub struct AppState {
    pub handler: ProxyHandler,
}

pub fn router(handler: ProxyHandler) -> Router {
    let max_body_bytes = handler.config().max_body_bytes;

    Router::new()
        .route(PROXY_PATH, any(proxy))
        .route(NETLIFY_PROXY_PATH, any(proxy))
        .route("/health", get(health_check))
        .layer(DefaultBodyLimit::max(max_body_bytes))
        .layer(SetResponseHeaderLayer::overriding(
            header::ACCESS_CONTROL_ALLOW_ORIGIN,
            HeaderValue::from_static("*"),
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(AppState { handler })
}

/// Map a failed body read (usually the size cap) to a JSON error.
fn body_rejection(rejection: BytesRejection) -> ProxyError {
    let status = rejection.status();
    let message = if status == StatusCode::PAYLOAD_TOO_LARGE {
        "Request body too large"
    } else {
        "Request body could not be read"
    };
    ProxyError::InvalidRequest {
        message: message.to_string(),
        details: Some(rejection.body_text()),
        status,
    }
}

async fn proxy(
    State(state): State<AppState>,
    method: Method,
    body: Result<Bytes, BytesRejection>,
) -> Response {
    let request_id = Uuid::new_v4();
    let span = tracing::info_span!("proxy", %request_id, %method);

    async move {
        let result = match body {
            Ok(body) => state.handler.handle(&method, &body).await,
            Err(rejection) if method == Method::POST => Err(body_rejection(rejection)),
            Err(_) => state.handler.handle(&method, &[]).await,
        };

        let mut response = match result {
            Ok(relayed) => {
                tracing::info!(chars = relayed.response.len(), "Relaying Gemini response");
                Json(relayed).into_response()
            }
            Err(e) => {
                tracing::warn!(status = %e.status(), "Request failed: {}", e);
                e.into_response()
            }
        };

        if let Ok(value) = HeaderValue::from_str(&request_id.to_string()) {
            response.headers_mut().insert("x-request-id", value);
        }
        response
    }
    .instrument(span)
    .await
}

async fn health_check() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "service": "gemini-proxy",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Bind `addr` and serve until Ctrl+C or SIGTERM.
pub async fn serve(addr: SocketAddr, handler: ProxyHandler) -> crate::Result<()> {
    let listener = TcpListener::bind(addr).await.map_err(|e| {
        tracing::error!("Failed to bind listener to {}: {}", addr, e);
        e
    })?;
    tracing::info!("Listening on {}", listener.local_addr()?);

    axum::serve(listener, router(handler))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
