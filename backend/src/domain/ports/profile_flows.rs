//! Driving ports for profile reads and edits.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::domain::profile::{AccountStatus, Actor, Profile, Role, Vehicle};
use crate::domain::Error;

/// A profile as returned to its owner or an administrator.
#[derive(Debug, Clone, PartialEq, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProfileView {
    /// User identity.
    pub id: Uuid,
    /// Name shown to other ride participants.
    pub display_name: String,
    /// Contact phone number, when provided.
    pub phone: Option<String>,
    /// Role granted by the identity provider.
    pub role: Role,
    /// Whether the account may use the service.
    pub account_status: AccountStatus,
    /// The driver's vehicle descriptors, when recorded.
    pub vehicle: Option<Vehicle>,
    /// Account creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl From<&Profile> for ProfileView {
    fn from(profile: &Profile) -> Self {
        Self {
            id: profile.id(),
            display_name: profile.display_name().to_owned(),
            phone: profile.phone().map(str::to_owned),
            role: profile.role(),
            account_status: profile.account_status(),
            vehicle: profile.vehicle().cloned(),
            created_at: profile.created_at(),
        }
    }
}

/// Raw vehicle descriptor fields as submitted by a driver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VehicleUpdate {
    /// Manufacturer, e.g. "Toyota".
    pub make: String,
    /// Model name, e.g. "Prius".
    pub model: String,
    /// Licence plate shown to passengers.
    pub plate: String,
}

/// Payload for editing the acting user's profile.
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateProfileRequest {
    /// New display name; must be non-blank.
    pub display_name: String,
    /// New contact phone, or `None` to clear it.
    pub phone: Option<String>,
    /// New vehicle descriptors, or `None` to clear them. Only driver
    /// accounts may carry a vehicle.
    pub vehicle: Option<VehicleUpdate>,
}

/// Payload for an administrator changing an account status.
#[derive(Debug, Clone, PartialEq)]
pub struct SetAccountStatusRequest {
    /// The account to change.
    pub user_id: Uuid,
    /// The new status.
    pub status: AccountStatus,
}

/// Read operations over profiles.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProfileQueries: Send + Sync {
    /// The acting user's own profile.
    async fn my_profile(&self, actor: Actor) -> Result<ProfileView, Error>;
}

/// Mutating profile operations.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProfileCommands: Send + Sync {
    /// Edit the acting user's display name, phone, and vehicle.
    async fn update_my_profile(
        &self,
        actor: Actor,
        request: UpdateProfileRequest,
    ) -> Result<ProfileView, Error>;

    /// Suspend, ban, or reactivate an account; administrators only.
    async fn set_account_status(
        &self,
        actor: Actor,
        request: SetAccountStatusRequest,
    ) -> Result<ProfileView, Error>;
}
