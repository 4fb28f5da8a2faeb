//! Internal Diesel row structs for database operations.
//!
//! These types are implementation details of the persistence layer and
//! must never be exposed to the domain. They exist solely to satisfy
//! Diesel's type requirements for queries and mutations.

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use super::schema::{complaints, messages, profiles, ratings, rides};

/// Row struct for reading from the profiles table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = profiles)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct ProfileRow {
    pub id: Uuid,
    pub display_name: String,
    pub phone: Option<String>,
    pub role: String,
    pub account_status: String,
    pub vehicle_make: Option<String>,
    pub vehicle_model: Option<String>,
    pub vehicle_plate: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Insertable struct for creating profile records.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = profiles)]
pub(crate) struct NewProfileRow<'a> {
    pub id: Uuid,
    pub display_name: &'a str,
    pub phone: Option<&'a str>,
    pub role: &'a str,
    pub account_status: &'a str,
    pub vehicle_make: Option<&'a str>,
    pub vehicle_model: Option<&'a str>,
    pub vehicle_plate: Option<&'a str>,
    pub created_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Ride models
// ---------------------------------------------------------------------------

/// Row struct for reading from the rides table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = rides)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct RideRow {
    pub id: Uuid,
    pub passenger_id: Uuid,
    pub driver_id: Option<Uuid>,
    pub pickup_text: String,
    pub pickup_lat: Option<f64>,
    pub pickup_lng: Option<f64>,
    pub destination_text: String,
    pub destination_lat: Option<f64>,
    pub destination_lng: Option<f64>,
    pub passengers_count: i32,
    pub status: String,
    pub cancellation_reason: Option<String>,
    pub driver_lat: Option<f64>,
    pub driver_lng: Option<f64>,
    pub requested_at: DateTime<Utc>,
}

/// Insertable struct for creating ride records.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = rides)]
pub(crate) struct NewRideRow<'a> {
    pub id: Uuid,
    pub passenger_id: Uuid,
    pub driver_id: Option<Uuid>,
    pub pickup_text: &'a str,
    pub pickup_lat: Option<f64>,
    pub pickup_lng: Option<f64>,
    pub destination_text: &'a str,
    pub destination_lat: Option<f64>,
    pub destination_lng: Option<f64>,
    pub passengers_count: i32,
    pub status: &'a str,
    pub cancellation_reason: Option<&'a str>,
    pub driver_lat: Option<f64>,
    pub driver_lng: Option<f64>,
    pub requested_at: DateTime<Utc>,
}

/// Changeset struct for guarded lifecycle writes.
///
/// Endpoints and the passenger are immutable after creation, so only the
/// lifecycle fields appear here.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = rides)]
#[diesel(treat_none_as_null = true)]
pub(crate) struct RideLifecycleUpdate<'a> {
    pub driver_id: Option<Uuid>,
    pub status: &'a str,
    pub cancellation_reason: Option<&'a str>,
    pub driver_lat: Option<f64>,
    pub driver_lng: Option<f64>,
}

// ---------------------------------------------------------------------------
// Message models
// ---------------------------------------------------------------------------

/// Row struct for reading from the messages table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = messages)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct MessageRow {
    pub id: Uuid,
    pub ride_id: Uuid,
    pub sender_id: Uuid,
    pub receiver_id: Uuid,
    pub body: String,
    pub sent_at: DateTime<Utc>,
}

/// Insertable struct for creating message records.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = messages)]
pub(crate) struct NewMessageRow<'a> {
    pub id: Uuid,
    pub ride_id: Uuid,
    pub sender_id: Uuid,
    pub receiver_id: Uuid,
    pub body: &'a str,
    pub sent_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Rating models
// ---------------------------------------------------------------------------

/// Row struct for reading from the ratings table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = ratings)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct RatingRow {
    pub id: Uuid,
    pub ride_id: Uuid,
    pub rater_id: Uuid,
    pub ratee_id: Uuid,
    pub stars: i32,
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Insertable struct for creating rating records.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = ratings)]
pub(crate) struct NewRatingRow<'a> {
    pub id: Uuid,
    pub ride_id: Uuid,
    pub rater_id: Uuid,
    pub ratee_id: Uuid,
    pub stars: i32,
    pub comment: Option<&'a str>,
    pub created_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Complaint models
// ---------------------------------------------------------------------------

/// Row struct for reading from the complaints table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = complaints)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct ComplaintRow {
    pub id: Uuid,
    pub ride_id: Option<Uuid>,
    pub complainant_id: Uuid,
    pub respondent_id: Uuid,
    pub subject: String,
    pub description: String,
    pub status: String,
    pub resolution_note: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Insertable struct for creating complaint records.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = complaints)]
pub(crate) struct NewComplaintRow<'a> {
    pub id: Uuid,
    pub ride_id: Option<Uuid>,
    pub complainant_id: Uuid,
    pub respondent_id: Uuid,
    pub subject: &'a str,
    pub description: &'a str,
    pub status: &'a str,
    pub resolution_note: Option<&'a str>,
    pub created_at: DateTime<Utc>,
}

/// Changeset struct for recording a review verdict.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = complaints)]
pub(crate) struct ComplaintReviewUpdate<'a> {
    pub status: &'a str,
    pub resolution_note: Option<&'a str>,
}
