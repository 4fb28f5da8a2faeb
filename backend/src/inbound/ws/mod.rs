//! WebSocket inbound adapter for the change notification feed.
//!
//! The upgrade handler enforces the configured origin allow-list and then
//! hands the connection to the per-session handler in [`session`]; nothing
//! WebSocket-specific leaks past this module.

use actix_web::web::{self, Payload};
use actix_web::{
    get,
    http::header::{HeaderValue, ORIGIN},
    HttpRequest, HttpResponse,
};
use tracing::{error, warn};
use url::Url;

mod session;

pub mod messages;
pub mod state;

/// Handle WebSocket upgrade for the `/ws` endpoint.
#[get("/ws")]
pub async fn ws_entry(
    state: web::Data<state::WsState>,
    req: HttpRequest,
    stream: Payload,
) -> actix_web::Result<HttpResponse> {
    let mut origins = req.headers().get_all(ORIGIN);
    let origin = origins.next().ok_or_else(|| {
        error!("websocket upgrade without an Origin header");
        actix_web::error::ErrorForbidden("Origin not allowed")
    })?;
    if origins.next().is_some() {
        error!("websocket upgrade with multiple Origin headers");
        return Err(actix_web::error::ErrorBadRequest("Invalid Origin header"));
    }

    check_origin(&state.allowed_origins, origin)?;

    let (response, session, message_stream) = actix_ws::handle(&req, stream)?;
    actix_web::rt::spawn(session::handle_ws_session(
        state.get_ref().clone(),
        session,
        message_stream,
    ));
    Ok(response)
}

fn check_origin(allowed: &[Url], header: &HeaderValue) -> actix_web::Result<()> {
    let raw = header.to_str().map_err(|error| {
        error!(%error, "Origin header is not valid UTF-8");
        actix_web::error::ErrorBadRequest("Invalid Origin header")
    })?;
    let origin = Url::parse(raw).map_err(|error| {
        error!(%error, "Origin header is not a URL");
        actix_web::error::ErrorBadRequest("Invalid Origin header")
    })?;

    if allowed.iter().any(|candidate| same_origin(candidate, &origin)) {
        Ok(())
    } else {
        warn!(origin = raw, "websocket upgrade from a disallowed origin");
        Err(actix_web::error::ErrorForbidden("Origin not allowed"))
    }
}

/// Scheme, host, and effective port must all match.
fn same_origin(a: &Url, b: &Url) -> bool {
    a.scheme() == b.scheme()
        && a.host_str() == b.host_str()
        && a.port_or_known_default() == b.port_or_known_default()
}
