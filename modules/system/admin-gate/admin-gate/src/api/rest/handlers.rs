use axum::Extension;
use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use gate_security::PeerCertificate;

use crate::domain::dispatch::DispatchOutcome;
use crate::domain::request::AdminRequest;

use super::error::encode_failure;
use super::routes::AdminState;

/// Peer certificate chain, inserted as a request extension by the TLS front
/// after it validated the chain.
#[derive(Debug, Clone)]
pub struct PeerChain(pub Vec<PeerCertificate>);

/// Serve one administrative operation.
///
/// Rebuilds the ordered parameter list from the form body, runs the
/// facility's table dispatch, and replies with the binary wire frame. An
/// authentication failure is an HTTP-level 401; everything else is a 200
/// whose embedded status code the admin client parses.
#[tracing::instrument(skip_all, fields(facility = %facility))]
pub async fn handle_admin_op(
    State(state): State<AdminState>,
    Path(facility): Path<String>,
    headers: HeaderMap,
    peer: Option<Extension<PeerChain>>,
    body: Bytes,
) -> Response {
    let Some(table) = state.tables.get(&facility) else {
        return StatusCode::NOT_FOUND.into_response();
    };

    let req = build_request(&headers, peer, &body);
    let outcome = table.dispatch(&state.gate, &req).await;

    let (status, result) = match outcome {
        DispatchOutcome::Unauthenticated(result) => (StatusCode::UNAUTHORIZED, result),
        DispatchOutcome::Completed(result) => (StatusCode::OK, result),
    };

    let Ok(frame) = result.encode() else {
        return encode_failure();
    };
    (
        status,
        [(header::CONTENT_TYPE, "application/octet-stream")],
        frame,
    )
        .into_response()
}

fn build_request(headers: &HeaderMap, peer: Option<Extension<PeerChain>>, body: &[u8]) -> AdminRequest {
    let mut req = AdminRequest::new();

    // Order-preserving form parse: handlers and audit snapshots see the
    // parameters exactly as the client sent them.
    for (name, value) in url::form_urlencoded::parse(body) {
        req.push_param(name.into_owned(), value.into_owned());
    }

    if let Some(auth) = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
    {
        req = req.with_authorization(auth);
    }
    if let Some(lang) = headers
        .get(header::ACCEPT_LANGUAGE)
        .and_then(|v| v.to_str().ok())
    {
        req = req.with_accept_language(lang);
    }
    if let Some(Extension(PeerChain(chain))) = peer {
        req = req.with_peer_chain(chain);
    }
    req
}
