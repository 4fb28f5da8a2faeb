//! OpenAPI documentation configuration.
//!
//! This module defines the [`ApiDoc`] struct which generates the OpenAPI
//! specification for the REST API. It registers:
//!
//! - **Paths**: All HTTP endpoints from the inbound layer
//! - **Schemas**: Request bodies, view types, and the shared error envelope
//! - **Security**: The bearer token scheme verified against the identity
//!   provider
//!
//! The generated specification backs Swagger UI in debug builds.

use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::domain::ports::{
    ComplaintView, MessageView, ParticipantView, ProfileView, RatingView, RideView,
};
use crate::domain::{
    AccountStatus, ComplaintStatus, Error, ErrorCode, GeoPoint, Location, Page, RideStatus, Role,
    Vehicle,
};
use crate::inbound::http::complaints::{FileComplaintBody, ReviewComplaintBody};
use crate::inbound::http::messages::PostMessageBody;
use crate::inbound::http::profiles::{SetAccountStatusBody, UpdateProfileBody, VehicleBody};
use crate::inbound::http::ratings::RateRideBody;
use crate::inbound::http::rides::{CancelRideBody, CreateRideBody, LocationBody, PositionBody};

/// Enrich the generated document with the bearer token security scheme.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi
            .components
            .get_or_insert_with(utoipa::openapi::Components::default);

        components.add_security_scheme(
            "BearerToken",
            SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
        );
    }
}

/// OpenAPI document for the REST API.
/// Swagger UI is enabled in debug builds only.
#[derive(OpenApi)]
#[openapi(
    modifiers(&SecurityAddon),
    info(
        title = "Ride matching backend API",
        description = "HTTP interface for ride requests, matching, messaging, \
                       ratings, complaints, and health probes."
    ),
    servers(
        (url = "/", description = "Relative to the deployment base URL")
    ),
    security(("BearerToken" = [])),
    paths(
        crate::inbound::http::rides::create_ride,
        crate::inbound::http::rides::browse_pending,
        crate::inbound::http::rides::my_rides,
        crate::inbound::http::rides::get_ride,
        crate::inbound::http::rides::delete_ride,
        crate::inbound::http::rides::accept_ride,
        crate::inbound::http::rides::complete_ride,
        crate::inbound::http::rides::cancel_ride,
        crate::inbound::http::rides::report_position,
        crate::inbound::http::rides::simulate_position,
        crate::inbound::http::messages::post_message,
        crate::inbound::http::messages::list_messages,
        crate::inbound::http::ratings::rate_ride,
        crate::inbound::http::complaints::file_complaint,
        crate::inbound::http::complaints::my_complaints,
        crate::inbound::http::complaints::review_queue,
        crate::inbound::http::complaints::review_complaint,
        crate::inbound::http::profiles::my_profile,
        crate::inbound::http::profiles::update_my_profile,
        crate::inbound::http::profiles::set_account_status,
        crate::inbound::http::health::ready,
        crate::inbound::http::health::live,
    ),
    components(schemas(
        Error,
        ErrorCode,
        GeoPoint,
        Location,
        RideStatus,
        Role,
        AccountStatus,
        Vehicle,
        ComplaintStatus,
        RideView,
        ParticipantView,
        Page<RideView>,
        MessageView,
        RatingView,
        ComplaintView,
        ProfileView,
        LocationBody,
        CreateRideBody,
        CancelRideBody,
        PositionBody,
        PostMessageBody,
        RateRideBody,
        FileComplaintBody,
        ReviewComplaintBody,
        UpdateProfileBody,
        VehicleBody,
        SetAccountStatusBody,
    )),
    tags(
        (name = "rides", description = "Ride lifecycle and matching"),
        (name = "messages", description = "Per-ride participant chat"),
        (name = "ratings", description = "Post-ride star ratings"),
        (name = "complaints", description = "Complaints and their review"),
        (name = "profiles", description = "User profiles and account status"),
        (name = "health", description = "Endpoints for health checks")
    )
)]
pub struct ApiDoc;
