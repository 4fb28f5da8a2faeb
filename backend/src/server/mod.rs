//! Assembles the Actix application: adapters, middleware, and routes.
//!
//! [`create_server`] is the only entry point; `main` hands it a
//! [`ServerConfig`] and a health state and awaits the returned server.

mod config;
mod state_builders;

pub use config::ServerConfig;

use state_builders::build_states;

use actix_web::dev::{Server, ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::{web, App, HttpServer};
#[cfg(debug_assertions)]
use utoipa::OpenApi;
#[cfg(debug_assertions)]
use utoipa_swagger_ui::SwaggerUi;

#[cfg(debug_assertions)]
use crate::doc::ApiDoc;
use crate::inbound::http;
use crate::inbound::http::health::HealthState;
use crate::inbound::http::state::HttpState;
use crate::inbound::ws;
use crate::inbound::ws::state::WsState;
use crate::middleware::Trace;

/// Shared state cloned into every worker's app instance.
#[derive(Clone)]
struct AppStates {
    health: web::Data<HealthState>,
    http: web::Data<HttpState>,
    ws: web::Data<WsState>,
}

fn build_app(
    states: AppStates,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    let app = App::new()
        .app_data(states.health)
        .app_data(states.http)
        .app_data(states.ws)
        .wrap(Trace)
        .configure(http::configure)
        .service(ws::ws_entry);

    #[cfg(debug_assertions)]
    let app = app.service(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()));
    #[cfg(not(debug_assertions))]
    let app = app;

    app
}

/// Bind the listener and return the running server.
///
/// Readiness flips once the adapters are built and the address is bound, so
/// the readiness probe only reports healthy when requests can be served.
///
/// # Errors
/// Returns [`std::io::Error`] when adapter construction or binding fails.
pub fn create_server(
    health_state: web::Data<HealthState>,
    config: ServerConfig,
) -> std::io::Result<Server> {
    let (http_state, ws_state) = build_states(&config)?;
    let http_state = web::Data::new(http_state);
    let ws_state = web::Data::new(ws_state);
    let health = health_state.clone();

    let server = HttpServer::new(move || {
        build_app(AppStates {
            health: health.clone(),
            http: http_state.clone(),
            ws: ws_state.clone(),
        })
    })
    .bind(config.bind_addr)?
    .run();

    health_state.mark_ready();
    Ok(server)
}
