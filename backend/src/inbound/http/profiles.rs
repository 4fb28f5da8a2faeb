//! Profile HTTP handlers.
//!
//! ```text
//! GET /api/v1/profiles/me
//! PUT /api/v1/profiles/me
//! PUT /api/v1/admin/profiles/{userId}/status
//! ```

use actix_web::{get, put, web};
use serde::Deserialize;
use serde_json::json;
use utoipa::ToSchema;

use crate::domain::ports::{
    ProfileView, SetAccountStatusRequest, UpdateProfileRequest, VehicleUpdate,
};
use crate::domain::{AccountStatus, Error};
use crate::inbound::http::auth::Authenticated;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{parse_uuid, FieldName};
use crate::inbound::http::ApiResult;

/// Request payload for editing the acting user's profile.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileBody {
    /// New display name, must be non-blank.
    pub display_name: String,
    /// New contact phone; omit to clear.
    pub phone: Option<String>,
    /// New vehicle descriptors; drivers only, omit to clear.
    pub vehicle: Option<VehicleBody>,
}

/// Vehicle descriptor fields as submitted by a driver.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VehicleBody {
    /// Manufacturer, must be non-blank.
    pub make: String,
    /// Model name, must be non-blank.
    pub model: String,
    /// Licence plate, must be non-blank.
    pub plate: String,
}

/// Request payload for changing an account status.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SetAccountStatusBody {
    /// `active`, `suspended`, or `banned`.
    pub status: String,
}

/// The acting user's own profile.
#[utoipa::path(
    get,
    path = "/api/v1/profiles/me",
    tag = "profiles",
    responses(
        (status = 200, description = "The profile", body = ProfileView),
        (status = 401, description = "Missing or invalid token", body = Error),
    ),
)]
#[get("/profiles/me")]
pub async fn my_profile(
    state: web::Data<HttpState>,
    auth: Authenticated,
) -> ApiResult<web::Json<ProfileView>> {
    Ok(web::Json(state.profile_queries.my_profile(auth.0).await?))
}

/// Edit the acting user's display name, phone, and vehicle.
#[utoipa::path(
    put,
    path = "/api/v1/profiles/me",
    tag = "profiles",
    request_body = UpdateProfileBody,
    responses(
        (status = 200, description = "Updated profile", body = ProfileView),
        (status = 400, description = "Blank display name or invalid vehicle", body = Error),
    ),
)]
#[put("/profiles/me")]
pub async fn update_my_profile(
    state: web::Data<HttpState>,
    auth: Authenticated,
    body: web::Json<UpdateProfileBody>,
) -> ApiResult<web::Json<ProfileView>> {
    let body = body.into_inner();
    Ok(web::Json(
        state
            .profile_commands
            .update_my_profile(
                auth.0,
                UpdateProfileRequest {
                    display_name: body.display_name,
                    phone: body.phone,
                    vehicle: body.vehicle.map(|v| VehicleUpdate {
                        make: v.make,
                        model: v.model,
                        plate: v.plate,
                    }),
                },
            )
            .await?,
    ))
}

/// Suspend, ban, or reactivate an account.
#[utoipa::path(
    put,
    path = "/api/v1/admin/profiles/{userId}/status",
    tag = "profiles",
    params(("userId" = Uuid, Path, description = "Account identifier")),
    request_body = SetAccountStatusBody,
    responses(
        (status = 200, description = "Updated profile", body = ProfileView),
        (status = 403, description = "Administrators only", body = Error),
        (status = 404, description = "No such account", body = Error),
    ),
)]
#[put("/admin/profiles/{user_id}/status")]
pub async fn set_account_status(
    state: web::Data<HttpState>,
    auth: Authenticated,
    path: web::Path<String>,
    body: web::Json<SetAccountStatusBody>,
) -> ApiResult<web::Json<ProfileView>> {
    let user_id = parse_uuid(path.into_inner(), FieldName::new("userId"))?;
    let status: AccountStatus = body.into_inner().status.parse().map_err(|_| {
        Error::invalid_request("status must be active, suspended, or banned").with_details(json!({
            "field": "status",
            "code": "invalid_status",
        }))
    })?;
    Ok(web::Json(
        state
            .profile_commands
            .set_account_status(auth.0, SetAccountStatusRequest { user_id, status })
            .await?,
    ))
}
