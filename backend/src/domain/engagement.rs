//! Ride engagement records: chat messages, ratings, and complaints.
//!
//! These attach to rides after acceptance and carry their own validation;
//! participation and status checks against the parent ride live in the
//! engagement service.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Validation errors for engagement records.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EngagementValidationError {
    /// Message body must be non-blank.
    #[error("message body must not be blank")]
    BlankMessageBody,
    /// Stars must lie within [1, 5].
    #[error("rating must be within [1, 5] stars, got {stars}")]
    StarsOutOfRange {
        /// The rejected star count.
        stars: i32,
    },
    /// Complaint subject must be non-blank.
    #[error("complaint subject must not be blank")]
    BlankComplaintSubject,
    /// Complaint description must be non-blank.
    #[error("complaint description must not be blank")]
    BlankComplaintDescription,
    /// A review verdict requires a resolution note.
    #[error("a complaint review requires a resolution note")]
    BlankResolutionNote,
    /// The complaint already reached a final verdict.
    #[error("complaint is already {status}")]
    AlreadyReviewed {
        /// The verdict already recorded.
        status: ComplaintStatus,
    },
    /// Stored complaint status did not match any known status.
    #[error("unknown complaint status: {status}")]
    UnknownComplaintStatus {
        /// The rejected status string.
        status: String,
    },
}

/// A chat message between the participants of a ride.
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    id: Uuid,
    ride_id: Uuid,
    sender_id: Uuid,
    receiver_id: Uuid,
    body: String,
    sent_at: DateTime<Utc>,
}

impl Message {
    /// Create a message with a non-blank body.
    ///
    /// # Errors
    /// Returns [`EngagementValidationError::BlankMessageBody`] for blank
    /// bodies.
    pub fn new(
        id: Uuid,
        ride_id: Uuid,
        sender_id: Uuid,
        receiver_id: Uuid,
        body: impl Into<String>,
        sent_at: DateTime<Utc>,
    ) -> Result<Self, EngagementValidationError> {
        let body = body.into();
        if body.trim().is_empty() {
            return Err(EngagementValidationError::BlankMessageBody);
        }
        Ok(Self {
            id,
            ride_id,
            sender_id,
            receiver_id,
            body,
            sent_at,
        })
    }

    /// Message identity.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// The ride this message belongs to.
    pub fn ride_id(&self) -> Uuid {
        self.ride_id
    }

    /// The participant who sent the message.
    pub fn sender_id(&self) -> Uuid {
        self.sender_id
    }

    /// The participant the message is addressed to.
    pub fn receiver_id(&self) -> Uuid {
        self.receiver_id
    }

    /// Message text.
    pub fn body(&self) -> &str {
        self.body.as_str()
    }

    /// Send timestamp.
    pub fn sent_at(&self) -> DateTime<Utc> {
        self.sent_at
    }
}

/// A star rating one party leaves for the other after a completed ride.
#[derive(Debug, Clone, PartialEq)]
pub struct Rating {
    id: Uuid,
    ride_id: Uuid,
    rater_id: Uuid,
    ratee_id: Uuid,
    stars: i32,
    comment: Option<String>,
    created_at: DateTime<Utc>,
}

impl Rating {
    /// Create a rating with stars within [1, 5].
    ///
    /// # Errors
    /// Returns [`EngagementValidationError::StarsOutOfRange`] otherwise.
    pub fn new(
        id: Uuid,
        ride_id: Uuid,
        rater_id: Uuid,
        ratee_id: Uuid,
        stars: i32,
        comment: Option<String>,
        created_at: DateTime<Utc>,
    ) -> Result<Self, EngagementValidationError> {
        if !(1..=5).contains(&stars) {
            return Err(EngagementValidationError::StarsOutOfRange { stars });
        }
        let comment = comment.filter(|c| !c.trim().is_empty());
        Ok(Self {
            id,
            ride_id,
            rater_id,
            ratee_id,
            stars,
            comment,
            created_at,
        })
    }

    /// Rating identity.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// The completed ride being rated.
    pub fn ride_id(&self) -> Uuid {
        self.ride_id
    }

    /// The participant leaving the rating.
    pub fn rater_id(&self) -> Uuid {
        self.rater_id
    }

    /// The participant being rated.
    pub fn ratee_id(&self) -> Uuid {
        self.ratee_id
    }

    /// Stars awarded, within [1, 5].
    pub fn stars(&self) -> i32 {
        self.stars
    }

    /// Optional free-text comment.
    pub fn comment(&self) -> Option<&str> {
        self.comment.as_deref()
    }

    /// Creation timestamp.
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

/// Review state of a complaint.
///
/// A complaint starts `pending`, may be marked `reviewed` while an
/// administrator investigates, and ends `resolved` or `rejected`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ComplaintStatus {
    /// Filed, not yet looked at.
    Pending,
    /// Under investigation; a final verdict is still outstanding.
    Reviewed,
    /// Upheld and closed.
    Resolved,
    /// Rejected and closed.
    Rejected,
}

impl ComplaintStatus {
    /// Stable lowercase identifier used in the database.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Reviewed => "reviewed",
            Self::Resolved => "resolved",
            Self::Rejected => "rejected",
        }
    }

    /// Whether this status closes the complaint.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Resolved | Self::Rejected)
    }
}

impl std::fmt::Display for ComplaintStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ComplaintStatus {
    type Err = EngagementValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "reviewed" => Ok(Self::Reviewed),
            "resolved" => Ok(Self::Resolved),
            "rejected" => Ok(Self::Rejected),
            other => Err(EngagementValidationError::UnknownComplaintStatus {
                status: other.to_owned(),
            }),
        }
    }
}

/// A grievance a passenger files against a driver, optionally tied to one
/// of their completed rides.
#[derive(Debug, Clone, PartialEq)]
pub struct Complaint {
    id: Uuid,
    ride_id: Option<Uuid>,
    complainant_id: Uuid,
    respondent_id: Uuid,
    subject: String,
    description: String,
    status: ComplaintStatus,
    resolution_note: Option<String>,
    created_at: DateTime<Utc>,
}

impl Complaint {
    /// File a new pending complaint.
    ///
    /// # Errors
    /// - [`EngagementValidationError::BlankComplaintSubject`] for blank
    ///   subjects.
    /// - [`EngagementValidationError::BlankComplaintDescription`] for blank
    ///   descriptions.
    pub fn file(
        id: Uuid,
        ride_id: Option<Uuid>,
        complainant_id: Uuid,
        respondent_id: Uuid,
        subject: impl Into<String>,
        description: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Result<Self, EngagementValidationError> {
        let subject = subject.into();
        if subject.trim().is_empty() {
            return Err(EngagementValidationError::BlankComplaintSubject);
        }
        let description = description.into();
        if description.trim().is_empty() {
            return Err(EngagementValidationError::BlankComplaintDescription);
        }
        Ok(Self {
            id,
            ride_id,
            complainant_id,
            respondent_id,
            subject,
            description,
            status: ComplaintStatus::Pending,
            resolution_note: None,
            created_at,
        })
    }

    /// Rebuild a complaint from persistence.
    #[allow(clippy::too_many_arguments)]
    pub fn restore(
        id: Uuid,
        ride_id: Option<Uuid>,
        complainant_id: Uuid,
        respondent_id: Uuid,
        subject: String,
        description: String,
        status: ComplaintStatus,
        resolution_note: Option<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            ride_id,
            complainant_id,
            respondent_id,
            subject,
            description,
            status,
            resolution_note,
            created_at,
        }
    }

    /// Complaint identity.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// The completed ride the complaint concerns, when one was named.
    pub fn ride_id(&self) -> Option<Uuid> {
        self.ride_id
    }

    /// The passenger filing the complaint.
    pub fn complainant_id(&self) -> Uuid {
        self.complainant_id
    }

    /// The driver complained about.
    pub fn respondent_id(&self) -> Uuid {
        self.respondent_id
    }

    /// One-line summary of the grievance.
    pub fn subject(&self) -> &str {
        self.subject.as_str()
    }

    /// What happened, in the complainant's words.
    pub fn description(&self) -> &str {
        self.description.as_str()
    }

    /// Current review state.
    pub fn status(&self) -> ComplaintStatus {
        self.status
    }

    /// The administrator's note, once a verdict is recorded.
    pub fn resolution_note(&self) -> Option<&str> {
        self.resolution_note.as_deref()
    }

    /// Filing timestamp.
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Record an administrator verdict.
    ///
    /// Pending complaints accept any verdict; reviewed complaints only move
    /// forward to a terminal one. The note replaces any earlier note.
    ///
    /// # Errors
    /// - [`EngagementValidationError::AlreadyReviewed`] when the complaint
    ///   is closed, or when re-marking a reviewed complaint as reviewed.
    /// - [`EngagementValidationError::BlankResolutionNote`] for blank notes.
    pub fn review(
        mut self,
        verdict: ComplaintStatus,
        note: impl Into<String>,
    ) -> Result<Self, EngagementValidationError> {
        debug_assert!(verdict != ComplaintStatus::Pending);
        if self.status.is_terminal() || (self.status == verdict) {
            return Err(EngagementValidationError::AlreadyReviewed {
                status: self.status,
            });
        }
        let note = note.into();
        if note.trim().is_empty() {
            return Err(EngagementValidationError::BlankResolutionNote);
        }
        self.status = verdict;
        self.resolution_note = Some(note);
        Ok(self)
    }
}
