//! Ride lifecycle HTTP handlers.
//!
//! ```text
//! POST   /api/v1/rides
//! GET    /api/v1/rides/pending
//! GET    /api/v1/rides/mine
//! GET    /api/v1/rides/{rideId}
//! DELETE /api/v1/rides/{rideId}
//! POST   /api/v1/rides/{rideId}/accept
//! POST   /api/v1/rides/{rideId}/complete
//! POST   /api/v1/rides/{rideId}/cancel
//! PUT    /api/v1/rides/{rideId}/position
//! POST   /api/v1/rides/{rideId}/position/simulate
//! ```

use actix_web::{delete, get, post, put, web, HttpResponse};
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::domain::ports::{
    BrowsePendingRequest, CancelRideRequest, ReportPositionRequest, RequestRideRequest, RideView,
};
use crate::domain::{Error, Page};
use crate::inbound::http::auth::Authenticated;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{parse_optional_point, parse_uuid, FieldName};
use crate::inbound::http::ApiResult;

/// A route endpoint in request payloads.
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LocationBody {
    /// Free-text label, must be non-blank.
    pub text: String,
    /// Geocoded latitude, when the client resolved one.
    pub lat: Option<f64>,
    /// Geocoded longitude, when the client resolved one.
    pub lng: Option<f64>,
}

/// Request payload for creating a ride.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateRideBody {
    /// The passenger the ride is for; must match the token subject unless
    /// the caller is an administrator.
    #[schema(format = "uuid")]
    pub passenger_id: String,
    pub pickup: LocationBody,
    pub destination: LocationBody,
    pub passengers_count: i32,
}

/// Request payload for cancelling a ride.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CancelRideBody {
    /// `change_of_plans`, `waited_too_long`, `requested_by_mistake`, or
    /// `custom`.
    pub reason_code: String,
    /// Free text accompanying the `custom` code.
    pub custom_text: Option<String>,
}

/// Request payload for a driver position update.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PositionBody {
    pub lat: f64,
    pub lng: f64,
}

/// Query parameters for browsing pending rides.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BrowseQuery {
    /// Case-insensitive substring match on the pickup label.
    pub pickup: Option<String>,
    /// Case-insensitive substring match on the destination label.
    pub destination: Option<String>,
    /// Exact match on the passenger count.
    pub passengers: Option<i32>,
    /// Zero-based page index.
    pub page: Option<i64>,
}

fn ride_path_id(path: web::Path<String>) -> Result<Uuid, Error> {
    parse_uuid(path.into_inner(), FieldName::new("rideId"))
}

fn parse_create_body(body: CreateRideBody) -> Result<RequestRideRequest, Error> {
    Ok(RequestRideRequest {
        passenger_id: parse_uuid(body.passenger_id, FieldName::new("passengerId"))?,
        pickup_point: parse_optional_point(
            body.pickup.lat,
            body.pickup.lng,
            FieldName::new("pickup"),
        )?,
        pickup_text: body.pickup.text,
        destination_point: parse_optional_point(
            body.destination.lat,
            body.destination.lng,
            FieldName::new("destination"),
        )?,
        destination_text: body.destination.text,
        passengers_count: body.passengers_count,
    })
}

/// Create a new pending ride.
#[utoipa::path(
    post,
    path = "/api/v1/rides",
    tag = "rides",
    request_body = CreateRideBody,
    responses(
        (status = 201, description = "Ride created", body = RideView),
        (status = 400, description = "Malformed payload", body = Error),
        (status = 401, description = "Missing or invalid token", body = Error),
        (status = 403, description = "Not allowed for this passenger", body = Error),
        (status = 409, description = "An active ride already exists", body = Error),
        (status = 500, description = "Internal error", body = Error),
    ),
)]
#[post("/rides")]
pub async fn create_ride(
    state: web::Data<HttpState>,
    auth: Authenticated,
    body: web::Json<CreateRideBody>,
) -> ApiResult<HttpResponse> {
    let request = parse_create_body(body.into_inner())?;
    let view = state.ride_commands.request_ride(auth.0, request).await?;
    Ok(HttpResponse::Created().json(view))
}

/// Browse pending rides the acting driver could accept.
#[utoipa::path(
    get,
    path = "/api/v1/rides/pending",
    tag = "rides",
    responses(
        (status = 200, description = "One page of candidates", body = Page<RideView>),
        (status = 401, description = "Missing or invalid token", body = Error),
    ),
)]
#[get("/rides/pending")]
pub async fn browse_pending(
    state: web::Data<HttpState>,
    auth: Authenticated,
    query: web::Query<BrowseQuery>,
) -> ApiResult<web::Json<Page<RideView>>> {
    let query = query.into_inner();
    let page = state
        .ride_queries
        .browse_pending(
            auth.0,
            BrowsePendingRequest {
                pickup: query.pickup,
                destination: query.destination,
                passengers_count: query.passengers,
                page: query.page.unwrap_or(0),
            },
        )
        .await?;
    Ok(web::Json(page))
}

/// List the acting user's rides, as passenger or driver.
#[utoipa::path(
    get,
    path = "/api/v1/rides/mine",
    tag = "rides",
    responses(
        (status = 200, description = "The user's rides, newest first", body = [RideView]),
        (status = 401, description = "Missing or invalid token", body = Error),
    ),
)]
#[get("/rides/mine")]
pub async fn my_rides(
    state: web::Data<HttpState>,
    auth: Authenticated,
) -> ApiResult<web::Json<Vec<RideView>>> {
    Ok(web::Json(state.ride_queries.my_rides(auth.0).await?))
}

/// Fetch a single ride.
#[utoipa::path(
    get,
    path = "/api/v1/rides/{rideId}",
    tag = "rides",
    params(("rideId" = Uuid, Path, description = "Ride identifier")),
    responses(
        (status = 200, description = "The ride", body = RideView),
        (status = 403, description = "Not a participant", body = Error),
        (status = 404, description = "No such ride", body = Error),
    ),
)]
#[get("/rides/{ride_id}")]
pub async fn get_ride(
    state: web::Data<HttpState>,
    auth: Authenticated,
    path: web::Path<String>,
) -> ApiResult<web::Json<RideView>> {
    let ride_id = ride_path_id(path)?;
    Ok(web::Json(state.ride_queries.ride(auth.0, ride_id).await?))
}

/// Remove a terminal ride from the user's history.
#[utoipa::path(
    delete,
    path = "/api/v1/rides/{rideId}",
    tag = "rides",
    params(("rideId" = Uuid, Path, description = "Ride identifier")),
    responses(
        (status = 204, description = "Ride deleted"),
        (status = 409, description = "Ride is still active", body = Error),
    ),
)]
#[delete("/rides/{ride_id}")]
pub async fn delete_ride(
    state: web::Data<HttpState>,
    auth: Authenticated,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let ride_id = ride_path_id(path)?;
    state.ride_commands.delete_ride(auth.0, ride_id).await?;
    Ok(HttpResponse::NoContent().finish())
}

/// Claim a pending ride for the acting driver.
#[utoipa::path(
    post,
    path = "/api/v1/rides/{rideId}/accept",
    tag = "rides",
    params(("rideId" = Uuid, Path, description = "Ride identifier")),
    responses(
        (status = 200, description = "Ride accepted", body = RideView),
        (status = 409, description = "Ride was just taken; details carry the fresh state", body = Error),
    ),
)]
#[post("/rides/{ride_id}/accept")]
pub async fn accept_ride(
    state: web::Data<HttpState>,
    auth: Authenticated,
    path: web::Path<String>,
) -> ApiResult<web::Json<RideView>> {
    let ride_id = ride_path_id(path)?;
    Ok(web::Json(
        state.ride_commands.accept_ride(auth.0, ride_id).await?,
    ))
}

/// Mark an accepted ride as completed.
#[utoipa::path(
    post,
    path = "/api/v1/rides/{rideId}/complete",
    tag = "rides",
    params(("rideId" = Uuid, Path, description = "Ride identifier")),
    responses(
        (status = 200, description = "Ride completed", body = RideView),
        (status = 403, description = "Only the assigned driver may complete", body = Error),
        (status = 409, description = "Ride is not in an acceptable state", body = Error),
    ),
)]
#[post("/rides/{ride_id}/complete")]
pub async fn complete_ride(
    state: web::Data<HttpState>,
    auth: Authenticated,
    path: web::Path<String>,
) -> ApiResult<web::Json<RideView>> {
    let ride_id = ride_path_id(path)?;
    Ok(web::Json(
        state.ride_commands.complete_ride(auth.0, ride_id).await?,
    ))
}

/// Cancel a pending or accepted ride with a reason.
#[utoipa::path(
    post,
    path = "/api/v1/rides/{rideId}/cancel",
    tag = "rides",
    params(("rideId" = Uuid, Path, description = "Ride identifier")),
    request_body = CancelRideBody,
    responses(
        (status = 200, description = "Ride cancelled", body = RideView),
        (status = 400, description = "Invalid cancellation reason", body = Error),
        (status = 409, description = "Ride is not in an acceptable state", body = Error),
    ),
)]
#[post("/rides/{ride_id}/cancel")]
pub async fn cancel_ride(
    state: web::Data<HttpState>,
    auth: Authenticated,
    path: web::Path<String>,
    body: web::Json<CancelRideBody>,
) -> ApiResult<web::Json<RideView>> {
    let ride_id = ride_path_id(path)?;
    let body = body.into_inner();
    Ok(web::Json(
        state
            .ride_commands
            .cancel_ride(
                auth.0,
                CancelRideRequest {
                    ride_id,
                    reason_code: body.reason_code,
                    custom_text: body.custom_text,
                },
            )
            .await?,
    ))
}

/// Record the driver's current position on an accepted ride.
#[utoipa::path(
    put,
    path = "/api/v1/rides/{rideId}/position",
    tag = "rides",
    params(("rideId" = Uuid, Path, description = "Ride identifier")),
    request_body = PositionBody,
    responses(
        (status = 200, description = "Position recorded", body = RideView),
        (status = 403, description = "Only the assigned driver reports positions", body = Error),
    ),
)]
#[put("/rides/{ride_id}/position")]
pub async fn report_position(
    state: web::Data<HttpState>,
    auth: Authenticated,
    path: web::Path<String>,
    body: web::Json<PositionBody>,
) -> ApiResult<web::Json<RideView>> {
    let ride_id = ride_path_id(path)?;
    let point = parse_optional_point(Some(body.lat), Some(body.lng), FieldName::new("position"))?
        .ok_or_else(|| Error::invalid_request("position requires lat and lng"))?;
    Ok(web::Json(
        state
            .ride_commands
            .report_position(auth.0, ReportPositionRequest { ride_id, point })
            .await?,
    ))
}

/// Advance the simulated driver position one step toward the destination.
///
/// Available only when position simulation is enabled in configuration.
#[utoipa::path(
    post,
    path = "/api/v1/rides/{rideId}/position/simulate",
    tag = "rides",
    params(("rideId" = Uuid, Path, description = "Ride identifier")),
    responses(
        (status = 200, description = "Position advanced", body = RideView),
        (status = 403, description = "Simulation is disabled", body = Error),
    ),
)]
#[post("/rides/{ride_id}/position/simulate")]
pub async fn simulate_position(
    state: web::Data<HttpState>,
    auth: Authenticated,
    path: web::Path<String>,
) -> ApiResult<web::Json<RideView>> {
    let ride_id = ride_path_id(path)?;
    Ok(web::Json(
        state
            .ride_commands
            .simulate_position_step(auth.0, ride_id)
            .await?,
    ))
}
