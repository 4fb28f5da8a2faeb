//! HTTP inbound adapter.
//!
//! Handlers depend only on driving ports via [`state::HttpState`]; all
//! domain failures flow through the [`error`] mapping. Routes live under
//! `/api/v1`, with the health probes at the root.

pub mod auth;
pub mod complaints;
pub mod error;
pub mod health;
pub mod messages;
pub mod profiles;
pub mod ratings;
pub mod rides;
pub mod state;
pub mod validation;

use actix_web::web;

pub use error::ApiResult;

/// Mount every versioned API route.
///
/// Literal segments (`pending`, `mine`) register before the `{ride_id}`
/// routes so they are not captured as identifiers.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1")
            .app_data(error::json_config())
            .service(rides::browse_pending)
            .service(rides::my_rides)
            .service(rides::create_ride)
            .service(rides::get_ride)
            .service(rides::delete_ride)
            .service(rides::accept_ride)
            .service(rides::complete_ride)
            .service(rides::cancel_ride)
            .service(rides::report_position)
            .service(rides::simulate_position)
            .service(messages::post_message)
            .service(messages::list_messages)
            .service(ratings::rate_ride)
            .service(complaints::file_complaint)
            .service(complaints::my_complaints)
            .service(complaints::review_queue)
            .service(complaints::review_complaint)
            .service(profiles::my_profile)
            .service(profiles::update_my_profile)
            .service(profiles::set_account_status),
    );
    health::configure(cfg);
}
