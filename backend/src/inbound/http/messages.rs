//! Ride chat HTTP handlers.
//!
//! ```text
//! POST /api/v1/rides/{rideId}/messages
//! GET  /api/v1/rides/{rideId}/messages
//! ```

use actix_web::{get, post, web, HttpResponse};
use serde::Deserialize;
use utoipa::ToSchema;

use crate::domain::ports::{MessageView, PostMessageRequest};
use crate::domain::Error;
use crate::inbound::http::auth::Authenticated;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{parse_uuid, FieldName};
use crate::inbound::http::ApiResult;

/// Request payload for posting a chat message.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PostMessageBody {
    /// Message text, must be non-blank.
    pub body: String,
}

/// Post a chat message on an accepted ride.
#[utoipa::path(
    post,
    path = "/api/v1/rides/{rideId}/messages",
    tag = "messages",
    params(("rideId" = Uuid, Path, description = "Ride identifier")),
    request_body = PostMessageBody,
    responses(
        (status = 201, description = "Message posted", body = MessageView),
        (status = 403, description = "Not a ride participant", body = Error),
        (status = 409, description = "Chat is closed in this ride state", body = Error),
    ),
)]
#[post("/rides/{ride_id}/messages")]
pub async fn post_message(
    state: web::Data<HttpState>,
    auth: Authenticated,
    path: web::Path<String>,
    body: web::Json<PostMessageBody>,
) -> ApiResult<HttpResponse> {
    let ride_id = parse_uuid(path.into_inner(), FieldName::new("rideId"))?;
    let view = state
        .engagement_commands
        .post_message(
            auth.0,
            PostMessageRequest {
                ride_id,
                body: body.into_inner().body,
            },
        )
        .await?;
    Ok(HttpResponse::Created().json(view))
}

/// Read the chat on a ride, oldest first.
#[utoipa::path(
    get,
    path = "/api/v1/rides/{rideId}/messages",
    tag = "messages",
    params(("rideId" = Uuid, Path, description = "Ride identifier")),
    responses(
        (status = 200, description = "Messages on the ride", body = [MessageView]),
        (status = 403, description = "Not a ride participant", body = Error),
    ),
)]
#[get("/rides/{ride_id}/messages")]
pub async fn list_messages(
    state: web::Data<HttpState>,
    auth: Authenticated,
    path: web::Path<String>,
) -> ApiResult<web::Json<Vec<MessageView>>> {
    let ride_id = parse_uuid(path.into_inner(), FieldName::new("rideId"))?;
    Ok(web::Json(
        state
            .engagement_queries
            .messages_for_ride(auth.0, ride_id)
            .await?,
    ))
}
