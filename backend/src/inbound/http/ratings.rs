//! Post-ride rating HTTP handlers.
//!
//! ```text
//! POST /api/v1/rides/{rideId}/rating
//! ```

use actix_web::{post, web, HttpResponse};
use serde::Deserialize;
use utoipa::ToSchema;

use crate::domain::ports::{RateRideRequest, RatingView};
use crate::domain::Error;
use crate::inbound::http::auth::Authenticated;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{parse_uuid, FieldName};
use crate::inbound::http::ApiResult;

/// Request payload for rating the other party of a completed ride.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RateRideBody {
    /// Stars awarded, within [1, 5].
    pub stars: i32,
    /// Optional free-text comment.
    pub comment: Option<String>,
}

/// Rate the other party of a completed ride.
#[utoipa::path(
    post,
    path = "/api/v1/rides/{rideId}/rating",
    tag = "ratings",
    params(("rideId" = Uuid, Path, description = "Ride identifier")),
    request_body = RateRideBody,
    responses(
        (status = 201, description = "Rating recorded", body = RatingView),
        (status = 400, description = "Stars out of range", body = Error),
        (status = 409, description = "Ride not completed or already rated", body = Error),
    ),
)]
#[post("/rides/{ride_id}/rating")]
pub async fn rate_ride(
    state: web::Data<HttpState>,
    auth: Authenticated,
    path: web::Path<String>,
    body: web::Json<RateRideBody>,
) -> ApiResult<HttpResponse> {
    let ride_id = parse_uuid(path.into_inner(), FieldName::new("rideId"))?;
    let body = body.into_inner();
    let view = state
        .engagement_commands
        .rate_ride(
            auth.0,
            RateRideRequest {
                ride_id,
                stars: body.stars,
                comment: body.comment,
            },
        )
        .await?;
    Ok(HttpResponse::Created().json(view))
}
