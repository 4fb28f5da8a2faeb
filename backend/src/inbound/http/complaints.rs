//! Complaint HTTP handlers, including the administrator review queue.
//!
//! ```text
//! POST /api/v1/complaints
//! GET  /api/v1/complaints/mine
//! GET  /api/v1/admin/complaints
//! POST /api/v1/admin/complaints/{complaintId}/review
//! ```

use actix_web::{get, post, web, HttpResponse};
use serde::Deserialize;
use serde_json::json;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::domain::ports::{ComplaintView, FileComplaintRequest, ReviewComplaintRequest};
use crate::domain::{ComplaintStatus, Error};
use crate::inbound::http::auth::Authenticated;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{parse_uuid, FieldName};
use crate::inbound::http::ApiResult;

/// Request payload for filing a complaint.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FileComplaintBody {
    /// The driver complained about.
    pub respondent_id: Uuid,
    /// A completed ride the complaint concerns; omit when none applies.
    pub ride_id: Option<Uuid>,
    /// One-line summary, must be non-blank.
    pub subject: String,
    /// What happened, must be non-blank.
    pub description: String,
}

/// Request payload for an administrator verdict.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReviewComplaintBody {
    /// `reviewed`, `resolved`, or `rejected`.
    pub verdict: String,
    /// The administrator's note, must be non-blank.
    pub resolution_note: String,
}

fn parse_verdict(raw: &str) -> Result<ComplaintStatus, Error> {
    match raw.parse() {
        Ok(ComplaintStatus::Pending) | Err(_) => Err(Error::invalid_request(
            "verdict must be reviewed, resolved, or rejected",
        )
        .with_details(json!({
            "field": "verdict",
            "code": "invalid_verdict",
            "value": raw,
        }))),
        Ok(verdict) => Ok(verdict),
    }
}

/// File a complaint against a driver.
#[utoipa::path(
    post,
    path = "/api/v1/complaints",
    tag = "complaints",
    request_body = FileComplaintBody,
    responses(
        (status = 201, description = "Complaint filed", body = ComplaintView),
        (status = 403, description = "Not a passenger account", body = Error),
        (status = 404, description = "No such driver or ride", body = Error),
        (status = 409, description = "Referenced ride is not completed", body = Error),
    ),
)]
#[post("/complaints")]
pub async fn file_complaint(
    state: web::Data<HttpState>,
    auth: Authenticated,
    body: web::Json<FileComplaintBody>,
) -> ApiResult<HttpResponse> {
    let body = body.into_inner();
    let view = state
        .engagement_commands
        .file_complaint(
            auth.0,
            FileComplaintRequest {
                respondent_id: body.respondent_id,
                ride_id: body.ride_id,
                subject: body.subject,
                description: body.description,
            },
        )
        .await?;
    Ok(HttpResponse::Created().json(view))
}

/// List complaints filed by the acting user, newest first.
#[utoipa::path(
    get,
    path = "/api/v1/complaints/mine",
    tag = "complaints",
    responses(
        (status = 200, description = "The user's complaints", body = [ComplaintView]),
        (status = 401, description = "Missing or invalid token", body = Error),
    ),
)]
#[get("/complaints/mine")]
pub async fn my_complaints(
    state: web::Data<HttpState>,
    auth: Authenticated,
) -> ApiResult<web::Json<Vec<ComplaintView>>> {
    Ok(web::Json(
        state.engagement_queries.my_complaints(auth.0).await?,
    ))
}

/// Complaints still awaiting a final verdict, oldest first.
#[utoipa::path(
    get,
    path = "/api/v1/admin/complaints",
    tag = "complaints",
    responses(
        (status = 200, description = "Unresolved complaints", body = [ComplaintView]),
        (status = 403, description = "Administrators only", body = Error),
    ),
)]
#[get("/admin/complaints")]
pub async fn review_queue(
    state: web::Data<HttpState>,
    auth: Authenticated,
) -> ApiResult<web::Json<Vec<ComplaintView>>> {
    Ok(web::Json(
        state.engagement_queries.review_queue(auth.0).await?,
    ))
}

/// Record a verdict on a complaint.
#[utoipa::path(
    post,
    path = "/api/v1/admin/complaints/{complaintId}/review",
    tag = "complaints",
    params(("complaintId" = Uuid, Path, description = "Complaint identifier")),
    request_body = ReviewComplaintBody,
    responses(
        (status = 200, description = "Verdict recorded", body = ComplaintView),
        (status = 403, description = "Administrators only", body = Error),
        (status = 409, description = "Complaint already closed", body = Error),
    ),
)]
#[post("/admin/complaints/{complaint_id}/review")]
pub async fn review_complaint(
    state: web::Data<HttpState>,
    auth: Authenticated,
    path: web::Path<String>,
    body: web::Json<ReviewComplaintBody>,
) -> ApiResult<web::Json<ComplaintView>> {
    let complaint_id = parse_uuid(path.into_inner(), FieldName::new("complaintId"))?;
    let body = body.into_inner();
    let verdict = parse_verdict(&body.verdict)?;
    Ok(web::Json(
        state
            .engagement_commands
            .review_complaint(
                auth.0,
                ReviewComplaintRequest {
                    complaint_id,
                    verdict,
                    resolution_note: body.resolution_note,
                },
            )
            .await?,
    ))
}
