//! Driving ports for ride engagement: chat, ratings, and complaints.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::domain::engagement::{Complaint, ComplaintStatus, Message, Rating};
use crate::domain::profile::Actor;
use crate::domain::Error;

/// A chat message as returned to clients.
#[derive(Debug, Clone, PartialEq, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MessageView {
    /// Message identity.
    pub id: Uuid,
    /// The ride this message belongs to.
    pub ride_id: Uuid,
    /// The participant who sent the message.
    pub sender_id: Uuid,
    /// The participant the message is addressed to.
    pub receiver_id: Uuid,
    /// Message text.
    pub body: String,
    /// Send timestamp.
    pub sent_at: DateTime<Utc>,
}

impl From<&Message> for MessageView {
    fn from(message: &Message) -> Self {
        Self {
            id: message.id(),
            ride_id: message.ride_id(),
            sender_id: message.sender_id(),
            receiver_id: message.receiver_id(),
            body: message.body().to_owned(),
            sent_at: message.sent_at(),
        }
    }
}

/// A rating as returned to clients.
#[derive(Debug, Clone, PartialEq, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RatingView {
    /// Rating identity.
    pub id: Uuid,
    /// The completed ride being rated.
    pub ride_id: Uuid,
    /// The participant leaving the rating.
    pub rater_id: Uuid,
    /// The participant being rated.
    pub ratee_id: Uuid,
    /// Stars awarded, within [1, 5].
    pub stars: i32,
    /// Optional free-text comment.
    pub comment: Option<String>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl From<&Rating> for RatingView {
    fn from(rating: &Rating) -> Self {
        Self {
            id: rating.id(),
            ride_id: rating.ride_id(),
            rater_id: rating.rater_id(),
            ratee_id: rating.ratee_id(),
            stars: rating.stars(),
            comment: rating.comment().map(str::to_owned),
            created_at: rating.created_at(),
        }
    }
}

/// A complaint as returned to clients.
#[derive(Debug, Clone, PartialEq, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ComplaintView {
    /// Complaint identity.
    pub id: Uuid,
    /// The completed ride the complaint concerns, when one was named.
    pub ride_id: Option<Uuid>,
    /// The passenger filing the complaint.
    pub complainant_id: Uuid,
    /// The driver complained about.
    pub respondent_id: Uuid,
    /// One-line summary of the grievance.
    pub subject: String,
    /// What happened, in the complainant's words.
    pub description: String,
    /// Current review state.
    pub status: ComplaintStatus,
    /// The administrator's note, once a verdict is recorded.
    pub resolution_note: Option<String>,
    /// Filing timestamp.
    pub created_at: DateTime<Utc>,
}

impl From<&Complaint> for ComplaintView {
    fn from(complaint: &Complaint) -> Self {
        Self {
            id: complaint.id(),
            ride_id: complaint.ride_id(),
            complainant_id: complaint.complainant_id(),
            respondent_id: complaint.respondent_id(),
            subject: complaint.subject().to_owned(),
            description: complaint.description().to_owned(),
            status: complaint.status(),
            resolution_note: complaint.resolution_note().map(str::to_owned),
            created_at: complaint.created_at(),
        }
    }
}

/// Payload for posting a chat message.
#[derive(Debug, Clone, PartialEq)]
pub struct PostMessageRequest {
    /// The ride the message belongs to.
    pub ride_id: Uuid,
    /// Message text.
    pub body: String,
}

/// Payload for rating the other party after a completed ride.
#[derive(Debug, Clone, PartialEq)]
pub struct RateRideRequest {
    /// The completed ride being rated.
    pub ride_id: Uuid,
    /// Stars awarded, within [1, 5].
    pub stars: i32,
    /// Optional free-text comment.
    pub comment: Option<String>,
}

/// Payload for a passenger filing a complaint against a driver.
#[derive(Debug, Clone, PartialEq)]
pub struct FileComplaintRequest {
    /// The driver complained about.
    pub respondent_id: Uuid,
    /// A completed ride the complaint concerns, when there is one.
    pub ride_id: Option<Uuid>,
    /// One-line summary of the grievance.
    pub subject: String,
    /// What happened, in the complainant's words.
    pub description: String,
}

/// Payload for an administrator verdict on a complaint.
#[derive(Debug, Clone, PartialEq)]
pub struct ReviewComplaintRequest {
    /// The complaint under review.
    pub complaint_id: Uuid,
    /// `reviewed`, `resolved`, or `rejected`.
    pub verdict: ComplaintStatus,
    /// The administrator's note.
    pub resolution_note: String,
}

/// Mutating engagement operations.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EngagementCommands: Send + Sync {
    /// Post a chat message on an accepted ride; participants only.
    async fn post_message(
        &self,
        actor: Actor,
        request: PostMessageRequest,
    ) -> Result<MessageView, Error>;

    /// Rate the other party of a completed ride, once.
    async fn rate_ride(
        &self,
        actor: Actor,
        request: RateRideRequest,
    ) -> Result<RatingView, Error>;

    /// File a complaint against a driver; passengers only.
    async fn file_complaint(
        &self,
        actor: Actor,
        request: FileComplaintRequest,
    ) -> Result<ComplaintView, Error>;

    /// Record a verdict on a complaint; administrators only.
    async fn review_complaint(
        &self,
        actor: Actor,
        request: ReviewComplaintRequest,
    ) -> Result<ComplaintView, Error>;
}

/// Read operations over engagement records.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EngagementQueries: Send + Sync {
    /// All messages on a ride, oldest first; participants and
    /// administrators only.
    async fn messages_for_ride(
        &self,
        actor: Actor,
        ride_id: Uuid,
    ) -> Result<Vec<MessageView>, Error>;

    /// Complaints awaiting a final verdict, oldest first; administrators
    /// only.
    async fn review_queue(&self, actor: Actor) -> Result<Vec<ComplaintView>, Error>;

    /// Complaints the actor has filed, newest first.
    async fn my_complaints(&self, actor: Actor) -> Result<Vec<ComplaintView>, Error>;
}
