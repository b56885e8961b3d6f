//! HTTP route handling for one world.
//!
//! The wire contract is deliberately strict and small: only `POST` is
//! accepted (any other method gets a bare 404), bodies are JSON read under a
//! timeout, and every fault raised while handling a request is converted at
//! this boundary into the uniform
//! `{"success": false, "message": "Exception occured during request processing: ..."}`
//! shape with HTTP 200. The peer's `ip:port` is always used as the client
//! identity, overriding anything the body may claim.

use crate::registry::{ConnectError, SessionRegistry};
use crate::wire::{ConnectRequest, ConnectResponse, ErrorBody, MoveRequest, MoveResponse, UNKNOWN_REQUEST};
use axum::body::{to_bytes, Bytes};
use axum::extract::{ConnectInfo, Request, State};
use axum::http::{Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::any;
use axum::{Json, Router};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_http::trace::TraceLayer;
use wayfarer_event_system::{ClientId, SessionId, Vector};

/// Builds the router for one world.
pub fn router(registry: Arc<SessionRegistry>) -> Router {
    Router::new()
        .route("/connect", any(connect))
        .route("/move", any(handle_move))
        .fallback(unknown_route)
        .layer(TraceLayer::new_for_http())
        .with_state(registry)
}

/// `POST /connect` - admit a new session for the calling client.
async fn connect(
    State(registry): State<Arc<SessionRegistry>>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    request: Request,
) -> Response {
    if request.method() != Method::POST {
        return StatusCode::NOT_FOUND.into_response();
    }

    let body = match read_body(
        request,
        registry.config().body_read_timeout(),
        registry.config().max_body_bytes,
    )
    .await
    {
        Ok(body) => body,
        Err(detail) => return exception(detail),
    };
    let parsed: ConnectRequest = match serde_json::from_slice(&body) {
        Ok(parsed) => parsed,
        Err(e) => return exception(e),
    };

    let client_id = ClientId::from(peer);
    match registry.connect(client_id, parsed.vsid, &parsed.username).await {
        Ok(sid) => Json(ConnectResponse::granted(sid)).into_response(),
        Err(ConnectError::Invalid(detail)) => exception(detail),
        Err(rejection) => Json(ConnectResponse::rejected(rejection.to_string())).into_response(),
    }
}

/// `POST /move` - step the agent bound to the supplied session.
///
/// Known sessions are served through their action queue (serialized, with
/// the post-action cooldown); unknown or unparsable sids are answered inline
/// with neither.
async fn handle_move(
    State(registry): State<Arc<SessionRegistry>>,
    request: Request,
) -> Response {
    if request.method() != Method::POST {
        return StatusCode::NOT_FOUND.into_response();
    }

    let body = match read_body(
        request,
        registry.config().body_read_timeout(),
        registry.config().max_body_bytes,
    )
    .await
    {
        Ok(body) => body,
        Err(detail) => return exception(detail),
    };
    let parsed: MoveRequest = match serde_json::from_slice(&body) {
        Ok(parsed) => parsed,
        Err(e) => return exception(e),
    };

    let Ok(sid) = SessionId::from_str(&parsed.sid) else {
        return Json(MoveResponse::no_living_agent()).into_response();
    };

    match registry
        .enqueue_move(sid, Vector::new(parsed.dx, parsed.dy))
        .await
    {
        None => Json(MoveResponse::no_living_agent()).into_response(),
        Some(receiver) => match receiver.await {
            Ok(response) => Json(response).into_response(),
            // The queue worker dropped the job during shutdown; close the
            // connection without a success or failure body.
            Err(_) => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
        },
    }
}

/// Fallback for unrecognized paths.
async fn unknown_route(request: Request) -> Response {
    if request.method() != Method::POST {
        return StatusCode::NOT_FOUND.into_response();
    }
    Json(ErrorBody::new(UNKNOWN_REQUEST)).into_response()
}

/// Reads the request body within the configured time and size bounds.
async fn read_body(request: Request, timeout: Duration, limit: usize) -> Result<Bytes, String> {
    match tokio::time::timeout(timeout, to_bytes(request.into_body(), limit)).await {
        Err(_) => Err("Timed out reading the request body".to_string()),
        Ok(Err(e)) => Err(format!("Failed to read the request body: {e}")),
        Ok(Ok(bytes)) => Ok(bytes),
    }
}

/// Converts a handler fault into the uniform exception response (HTTP 200).
fn exception(detail: impl std::fmt::Display) -> Response {
    Json(ErrorBody::exception(detail)).into_response()
}
