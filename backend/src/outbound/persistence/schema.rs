//! Diesel table definitions for the PostgreSQL schema.
//!
//! These definitions must match the database migrations exactly. They are
//! used by Diesel for compile-time query validation and type-safe SQL
//! generation. When migrations change the schema, update this file to
//! match (`diesel print-schema` can regenerate it from a live database).

diesel::table! {
    /// User accounts mirrored from the identity provider.
    profiles (id) {
        /// Primary key; equals the token subject for the same user.
        id -> Uuid,
        /// Name shown to other ride participants.
        display_name -> Varchar,
        /// Optional contact phone number.
        phone -> Nullable<Varchar>,
        /// `passenger`, `driver`, or `admin`.
        role -> Varchar,
        /// `active`, `suspended`, or `banned`.
        account_status -> Varchar,
        /// Vehicle manufacturer; drivers only.
        vehicle_make -> Nullable<Varchar>,
        /// Vehicle model; drivers only.
        vehicle_model -> Nullable<Varchar>,
        /// Vehicle licence plate; drivers only.
        vehicle_plate -> Nullable<Varchar>,
        /// Account creation timestamp.
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// Ride requests and their lifecycle state.
    ///
    /// Lifecycle writes are conditional updates whose predicate includes
    /// the expected current status; see the ride repository adapter.
    rides (id) {
        /// Primary key: UUID v4 identifier.
        id -> Uuid,
        /// The requesting passenger.
        passenger_id -> Uuid,
        /// The assigned driver; null while pending.
        driver_id -> Nullable<Uuid>,
        /// Pickup label as entered by the passenger.
        pickup_text -> Varchar,
        /// Geocoded pickup latitude, when resolved.
        pickup_lat -> Nullable<Float8>,
        /// Geocoded pickup longitude, when resolved.
        pickup_lng -> Nullable<Float8>,
        /// Destination label as entered by the passenger.
        destination_text -> Varchar,
        /// Geocoded destination latitude, when resolved.
        destination_lat -> Nullable<Float8>,
        /// Geocoded destination longitude, when resolved.
        destination_lng -> Nullable<Float8>,
        /// Number of passengers travelling, within [1, 10].
        passengers_count -> Int4,
        /// `pending`, `accepted`, `completed`, or `cancelled`.
        status -> Varchar,
        /// Reason recorded on cancellation; null otherwise.
        cancellation_reason -> Nullable<Text>,
        /// Last reported driver latitude.
        driver_lat -> Nullable<Float8>,
        /// Last reported driver longitude.
        driver_lng -> Nullable<Float8>,
        /// Creation timestamp, immutable once set.
        requested_at -> Timestamptz,
    }
}

diesel::table! {
    /// Chat messages between the participants of a ride.
    messages (id) {
        /// Primary key: UUID v4 identifier.
        id -> Uuid,
        /// The ride the message belongs to.
        ride_id -> Uuid,
        /// The participant who sent the message.
        sender_id -> Uuid,
        /// The participant the message is addressed to.
        receiver_id -> Uuid,
        /// Message text, non-blank.
        body -> Text,
        /// Send timestamp.
        sent_at -> Timestamptz,
    }
}

diesel::table! {
    /// Post-ride star ratings; unique per (ride, rater).
    ratings (id) {
        /// Primary key: UUID v4 identifier.
        id -> Uuid,
        /// The completed ride being rated.
        ride_id -> Uuid,
        /// The participant leaving the rating.
        rater_id -> Uuid,
        /// The participant being rated.
        ratee_id -> Uuid,
        /// Stars awarded, within [1, 5].
        stars -> Int4,
        /// Optional free-text comment.
        comment -> Nullable<Text>,
        /// Creation timestamp.
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// Complaints passengers file against drivers.
    complaints (id) {
        /// Primary key: UUID v4 identifier.
        id -> Uuid,
        /// The completed ride the complaint concerns, when one was named.
        ride_id -> Nullable<Uuid>,
        /// The passenger filing the complaint.
        complainant_id -> Uuid,
        /// The driver complained about.
        respondent_id -> Uuid,
        /// One-line summary of the grievance.
        subject -> Text,
        /// What happened, in the complainant's words.
        description -> Text,
        /// `pending`, `reviewed`, `resolved`, or `rejected`.
        status -> Varchar,
        /// The administrator's note, once a verdict is recorded.
        resolution_note -> Nullable<Text>,
        /// Filing timestamp.
        created_at -> Timestamptz,
    }
}

diesel::allow_tables_to_appear_in_same_query!(profiles, rides, messages, ratings, complaints);
