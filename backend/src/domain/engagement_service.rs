//! Domain service for ride engagement: chat, ratings, and complaints.
//!
//! Participation and ride status checks happen here against the ride
//! repository; the engagement entities validate their own payloads.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use serde_json::json;
use tracing::{info, instrument};
use uuid::Uuid;

use super::engagement::{
    Complaint, ComplaintStatus, EngagementValidationError, Message, Rating,
};
use super::events::{RideEvent, RideEventKind};
use super::ports::{
    ComplaintRepository, ComplaintView, EngagementCommands, EngagementQueries,
    FileComplaintRequest, MessageRepository, MessageView, PostMessageRequest, ProfileRepository,
    RateRideRequest, RatingRepository, RatingView, RepositoryError, ReviewComplaintRequest,
    RideEvents, RideRepository,
};
use super::profile::{Actor, Profile, Role};
use super::ride::{Ride, RideStatus};
use super::ride_service::map_repository_error;
use super::Error;

/// Engagement service; see [`EngagementCommands`] and [`EngagementQueries`].
pub struct EngagementService<R, P, M, T, C, E> {
    rides: Arc<R>,
    profiles: Arc<P>,
    messages: Arc<M>,
    ratings: Arc<T>,
    complaints: Arc<C>,
    events: Arc<E>,
}

impl<R, P, M, T, C, E> EngagementService<R, P, M, T, C, E>
where
    R: RideRepository,
    P: ProfileRepository,
    M: MessageRepository,
    T: RatingRepository,
    C: ComplaintRepository,
    E: RideEvents,
{
    /// Create a service over the given adapters.
    pub fn new(
        rides: Arc<R>,
        profiles: Arc<P>,
        messages: Arc<M>,
        ratings: Arc<T>,
        complaints: Arc<C>,
        events: Arc<E>,
    ) -> Self {
        Self {
            rides,
            profiles,
            messages,
            ratings,
            complaints,
            events,
        }
    }

    async fn require_active_account(&self, actor: Actor) -> Result<Profile, Error> {
        let profile = self
            .profiles
            .find(actor.id)
            .await
            .map_err(map_repository_error)?
            .ok_or_else(|| Error::unauthorized("no profile exists for this account"))?;
        if profile.is_blocked() {
            return Err(Error::forbidden(format!(
                "this account is {}",
                profile.account_status().as_str()
            )));
        }
        Ok(profile)
    }

    async fn require_ride_for_participant(
        &self,
        actor: Actor,
        ride_id: Uuid,
    ) -> Result<Ride, Error> {
        let ride = self
            .rides
            .find(ride_id)
            .await
            .map_err(map_repository_error)?
            .ok_or_else(|| Error::not_found("ride does not exist"))?;
        if !ride.is_participant(actor.id) {
            return Err(Error::forbidden("only ride participants may do this"));
        }
        Ok(ride)
    }

    fn other_party(ride: &Ride, actor_id: Uuid) -> Result<Uuid, Error> {
        let driver = ride.driver_id().ok_or_else(|| {
            Error::conflict("ride has no other party yet")
                .with_details(json!({ "code": "no_counterparty" }))
        })?;
        if actor_id == ride.passenger_id() {
            Ok(driver)
        } else {
            Ok(ride.passenger_id())
        }
    }
}

fn map_validation(error: impl std::fmt::Display, field: &str) -> Error {
    Error::invalid_request(error.to_string()).with_details(json!({ "field": field }))
}

#[async_trait]
impl<R, P, M, T, C, E> EngagementCommands for EngagementService<R, P, M, T, C, E>
where
    R: RideRepository,
    P: ProfileRepository,
    M: MessageRepository,
    T: RatingRepository,
    C: ComplaintRepository,
    E: RideEvents,
{
    #[instrument(skip(self, request), fields(sender_id = %actor.id, ride_id = %request.ride_id))]
    async fn post_message(
        &self,
        actor: Actor,
        request: PostMessageRequest,
    ) -> Result<MessageView, Error> {
        self.require_active_account(actor).await?;
        let ride = self
            .require_ride_for_participant(actor, request.ride_id)
            .await?;
        if ride.status() != RideStatus::Accepted {
            return Err(Error::conflict("chat is only open while the ride is underway")
                .with_details(json!({ "code": "chat_closed", "status": ride.status().as_str() })));
        }
        let receiver_id = Self::other_party(&ride, actor.id)?;
        let message = Message::new(
            Uuid::new_v4(),
            ride.id(),
            actor.id,
            receiver_id,
            request.body,
            Utc::now(),
        )
        .map_err(|e| map_validation(e, "body"))?;
        self.messages
            .insert(&message)
            .await
            .map_err(map_repository_error)?;
        self.events.publish(RideEvent {
            kind: RideEventKind::MessagePosted,
            ride_id: ride.id(),
            passenger_id: ride.passenger_id(),
            driver_id: ride.driver_id(),
            status: ride.status(),
        });
        Ok(MessageView::from(&message))
    }

    #[instrument(skip(self, request), fields(rater_id = %actor.id, ride_id = %request.ride_id))]
    async fn rate_ride(
        &self,
        actor: Actor,
        request: RateRideRequest,
    ) -> Result<RatingView, Error> {
        self.require_active_account(actor).await?;
        let ride = self
            .require_ride_for_participant(actor, request.ride_id)
            .await?;
        if ride.status() != RideStatus::Completed {
            return Err(Error::conflict("only completed rides can be rated")
                .with_details(json!({ "code": "ride_not_completed", "status": ride.status().as_str() })));
        }
        let ratee_id = Self::other_party(&ride, actor.id)?;
        let rating = Rating::new(
            Uuid::new_v4(),
            ride.id(),
            actor.id,
            ratee_id,
            request.stars,
            request.comment,
            Utc::now(),
        )
        .map_err(|e| map_validation(e, "stars"))?;
        self.ratings.insert(&rating).await.map_err(|e| match e {
            RepositoryError::Duplicate(_) => Error::conflict("you already rated this ride")
                .with_details(json!({ "code": "already_rated" })),
            other => map_repository_error(other),
        })?;
        info!("ride rated");
        Ok(RatingView::from(&rating))
    }

    #[instrument(skip(self, request), fields(complainant_id = %actor.id, respondent_id = %request.respondent_id))]
    async fn file_complaint(
        &self,
        actor: Actor,
        request: FileComplaintRequest,
    ) -> Result<ComplaintView, Error> {
        let complainant = self.require_active_account(actor).await?;
        if complainant.role() != Role::Passenger {
            return Err(Error::forbidden("only passengers file complaints"));
        }
        let respondent = self
            .profiles
            .find(request.respondent_id)
            .await
            .map_err(map_repository_error)?
            .ok_or_else(|| Error::not_found("respondent does not exist"))?;
        if respondent.role() != Role::Driver {
            return Err(
                Error::invalid_request("complaints can only be filed against drivers")
                    .with_details(json!({ "field": "respondentId" })),
            );
        }
        if let Some(ride_id) = request.ride_id {
            let ride = self
                .rides
                .find(ride_id)
                .await
                .map_err(map_repository_error)?
                .ok_or_else(|| Error::not_found("ride does not exist"))?;
            if ride.passenger_id() != actor.id {
                return Err(Error::forbidden(
                    "only the ride's passenger may reference it in a complaint",
                ));
            }
            if ride.driver_id() != Some(request.respondent_id) {
                return Err(
                    Error::invalid_request("the respondent did not drive this ride")
                        .with_details(json!({ "field": "rideId" })),
                );
            }
            if ride.status() != RideStatus::Completed {
                return Err(Error::conflict("only completed rides can be referenced")
                    .with_details(
                        json!({ "code": "ride_not_completed", "status": ride.status().as_str() }),
                    ));
            }
        }
        let complaint = Complaint::file(
            Uuid::new_v4(),
            request.ride_id,
            actor.id,
            request.respondent_id,
            request.subject,
            request.description,
            Utc::now(),
        )
        .map_err(|e| {
            let field = match e {
                EngagementValidationError::BlankComplaintSubject => "subject",
                _ => "description",
            };
            map_validation(e, field)
        })?;
        self.complaints
            .insert(&complaint)
            .await
            .map_err(map_repository_error)?;
        info!(complaint_id = %complaint.id(), "complaint filed");
        Ok(ComplaintView::from(&complaint))
    }

    #[instrument(skip(self, request), fields(admin_id = %actor.id, complaint_id = %request.complaint_id))]
    async fn review_complaint(
        &self,
        actor: Actor,
        request: ReviewComplaintRequest,
    ) -> Result<ComplaintView, Error> {
        if !actor.is_admin() {
            return Err(Error::forbidden("only administrators review complaints"));
        }
        if request.verdict == ComplaintStatus::Pending {
            return Err(Error::invalid_request(
                "a verdict must be reviewed, resolved, or rejected",
            )
            .with_details(json!({ "field": "verdict" })));
        }
        let complaint = self
            .complaints
            .find(request.complaint_id)
            .await
            .map_err(map_repository_error)?
            .ok_or_else(|| Error::not_found("complaint does not exist"))?;
        let reviewed = complaint
            .review(request.verdict, request.resolution_note)
            .map_err(|e| match e {
                EngagementValidationError::BlankResolutionNote => {
                    map_validation(e, "resolutionNote")
                }
                other => Error::conflict(other.to_string())
                    .with_details(json!({ "code": "already_reviewed" })),
            })?;
        self.complaints
            .save(&reviewed)
            .await
            .map_err(map_repository_error)?;
        info!(verdict = %reviewed.status(), "complaint reviewed");
        Ok(ComplaintView::from(&reviewed))
    }
}

#[async_trait]
impl<R, P, M, T, C, E> EngagementQueries for EngagementService<R, P, M, T, C, E>
where
    R: RideRepository,
    P: ProfileRepository,
    M: MessageRepository,
    T: RatingRepository,
    C: ComplaintRepository,
    E: RideEvents,
{
    async fn messages_for_ride(
        &self,
        actor: Actor,
        ride_id: Uuid,
    ) -> Result<Vec<MessageView>, Error> {
        let ride = self
            .rides
            .find(ride_id)
            .await
            .map_err(map_repository_error)?
            .ok_or_else(|| Error::not_found("ride does not exist"))?;
        if !actor.is_admin() && !ride.is_participant(actor.id) {
            return Err(Error::forbidden("only ride participants may read the chat"));
        }
        let messages = self
            .messages
            .list_for_ride(ride_id)
            .await
            .map_err(map_repository_error)?;
        Ok(messages.iter().map(MessageView::from).collect())
    }

    async fn review_queue(&self, actor: Actor) -> Result<Vec<ComplaintView>, Error> {
        if !actor.is_admin() {
            return Err(Error::forbidden("only administrators see the review queue"));
        }
        let complaints = self
            .complaints
            .list_unresolved()
            .await
            .map_err(map_repository_error)?;
        Ok(complaints.iter().map(ComplaintView::from).collect())
    }

    async fn my_complaints(&self, actor: Actor) -> Result<Vec<ComplaintView>, Error> {
        let complaints = self
            .complaints
            .list_for_complainant(actor.id)
            .await
            .map_err(map_repository_error)?;
        Ok(complaints.iter().map(ComplaintView::from).collect())
    }
}

#[cfg(test)]
#[path = "engagement_service_tests.rs"]
mod tests;
